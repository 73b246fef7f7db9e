use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Analysis Errors
/// - [`Error::UnknownLocation`] - An instruction carries no usable debug location. The
///   statement detector recovers locally by dropping the instruction, so this variant only
///   surfaces through the location-resolution API itself.
/// - [`Error::MalformedAccess`] - A composite access without a resolvable base. Recovered
///   by omitting the access from the statement.
///
/// ## Artifact Errors
/// - [`Error::Malformed`] - Corrupted or truncated artifact data.
/// - [`Error::UnsupportedVersion`] - The artifact declares a format version this build
///   does not understand.
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors while writing or reading artifacts.
#[derive(Error, Debug)]
pub enum Error {
    /// The instruction has no debug location, or its location has no scope.
    ///
    /// Compiler-synthesized instructions with no source counterpart trigger this; the
    /// statement detector treats it as "not a statement" rather than a failure.
    #[error("Instruction has no usable source location")]
    UnknownLocation,

    /// A composite access could not be resolved to a well-formed access chain.
    ///
    /// Typically the base pointer of an element access has no single data-flow root.
    /// The access is dropped; the statement is kept.
    #[error("Composite access has no resolvable base")]
    MalformedAccess,

    /// Artifact data is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The artifact declares a format version that this build cannot read.
    #[error("Unsupported artifact format version '{0}'")]
    UnsupportedVersion(u8),

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during artifact operations
    /// such as writing to disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

/// Specialized `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
