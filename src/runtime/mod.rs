//! The execution-trace runtime linked into instrumented programs.
//!
//! # Architecture
//!
//! [`TraceSink`] is the format layer: it turns trace events into the binary
//! token stream over any [`std::io::Write`] target and flushes after every
//! record so a crash loses at most the record being written. The process-wide
//! state — one lazily-opened trace file shared by every hook — is crate
//! internal; the `extern "C"` entry points in [`abi`] are thin shims over it.
//!
//! The runtime is single-threaded by contract: it adds no synchronization of
//! its own beyond what a global in Rust minimally requires, and programs
//! tracing from multiple threads must serialize the hook calls themselves.
//!
//! # Failure policy
//!
//! Tracing is best-effort. Individual write errors are swallowed so the
//! traced program is never perturbed; the single fatal path is failing to
//! open the output file, which prints a diagnostic and aborts (a silently
//! missing trace would be worse than a crash during test runs).

pub mod abi;
mod sink;

pub use sink::TraceSink;

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// File name of the trace artifact. The leading exclamation mark keeps it
/// from colliding with per-module static artifacts named after source files.
pub const TRACE_FILENAME: &str = "!execution-trace.aard";

static TRACE: OnceLock<Mutex<TraceSink<File>>> = OnceLock::new();

/// The destination directory for the trace: `AARDWOLF_DATA_DEST` when set,
/// the working directory otherwise.
fn trace_path() -> PathBuf {
    std::env::var_os("AARDWOLF_DATA_DEST")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(TRACE_FILENAME)
}

/// The process-wide trace file, opened (and its header written) on first
/// use.
///
/// Aborts the process when the file cannot be created.
fn trace_file() -> &'static Mutex<TraceSink<File>> {
    TRACE.get_or_init(|| {
        let path = trace_path();
        let file = match File::create(&path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!(
                    "aardwolf: cannot open execution trace '{}': {}",
                    path.display(),
                    err
                );
                std::process::abort();
            }
        };
        let mut sink = TraceSink::new(file);
        let _ = sink.write_header();
        Mutex::new(sink)
    })
}

/// Runs `op` against the process-wide trace sink, ignoring trace errors.
pub(crate) fn with_trace<F>(op: F)
where
    F: FnOnce(&mut TraceSink<File>) -> crate::Result<()>,
{
    if let Ok(mut sink) = trace_file().lock() {
        let _ = op(&mut sink);
    }
}
