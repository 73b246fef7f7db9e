//! Statement records produced by the detector.

use bitflags::bitflags;

use crate::analysis::Access;
use crate::ir::ValueRef;

bitflags! {
    /// Metadata flags carried by a statement into the static artifact.
    ///
    /// The values are the wire encoding; they are combined bitwise into the
    /// single metadata byte of a serialized statement record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatementFlags: u8 {
        /// The statement initializes a local from a formal argument.
        const ARG = 0x61;
        /// The statement is a function return.
        const RET = 0x62;
        /// The statement is a function call.
        const CALL = 0x64;
    }
}

/// A line/column pair, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl LineCol {
    /// Creates a line/column pair.
    #[must_use]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Source range of a statement.
///
/// Debug info frequently records only a point (e.g. the position of an
/// assignment operator); in that case `begin == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path of the source file.
    pub file: String,
    /// Start of the range.
    pub begin: LineCol,
    /// End of the range.
    pub end: LineCol,
}

impl Location {
    /// Creates a location spanning `begin..end` in `file`.
    #[must_use]
    pub fn new(file: String, begin: LineCol, end: LineCol) -> Self {
        Self { file, begin, end }
    }

    /// Creates a point location (`begin == end`).
    #[must_use]
    pub fn point(file: String, line: u32, col: u32) -> Self {
        let at = LineCol::new(line, col);
        Self {
            file,
            begin: at,
            end: at,
        }
    }
}

/// A source-level statement recovered from the IR.
///
/// The instruction handle uniquely identifies the statement within its
/// module. `uses` is kept in discovery order and deduplicated, so iterating
/// it is deterministic; `def` is present exactly when the instruction writes
/// a user-visible value (a store, or a call with a return value).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The instruction this statement was recovered from.
    pub instr: ValueRef,
    /// Variables the statement reads.
    pub uses: Vec<Access>,
    /// The variable the statement writes, if any.
    pub def: Option<Access>,
    /// Where the statement lives in the source.
    pub loc: Location,
    /// Role metadata for the localization engine.
    pub flags: StatementFlags,
}

impl Statement {
    /// `true` when the statement initializes a local from an argument.
    #[must_use]
    pub fn is_arg(&self) -> bool {
        self.flags.contains(StatementFlags::ARG)
    }

    /// `true` when the statement is a return.
    #[must_use]
    pub fn is_ret(&self) -> bool {
        self.flags.contains(StatementFlags::RET)
    }

    /// `true` when the statement is a call.
    #[must_use]
    pub fn is_call(&self) -> bool {
        self.flags.contains(StatementFlags::CALL)
    }
}
