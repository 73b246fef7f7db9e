//! Statement-level program analysis.
//!
//! # Architecture
//!
//! The analysis recovers a source-statement model from the IR in three
//! layers:
//!
//! - [`Access`] - The data-flow footprint of a single read or write: which
//!   variable, and through which fields/indices.
//! - [`Statement`] / [`StatementRepository`] - Statement records and the
//!   registry that assigns the stable `(file, stmt)` and value identifiers
//!   shared by the static artifact and the instrumented binary.
//! - [`StatementDetection`] - The pass that classifies instructions,
//!   recovers uses and defs, and reconstructs the statement-level control
//!   flow graph (empty basic blocks are transparent in it).
//!
//! # Usage
//!
//! ```rust,ignore
//! use aardwolf::analysis::StatementDetection;
//!
//! let repo = StatementDetection::run(&module);
//! for &instr in repo.statements_of(func) {
//!     let stmt = repo.statement(instr).unwrap();
//!     println!("{:?} uses {} values", repo.statement_id(instr), stmt.uses.len());
//! }
//! ```

mod access;
mod detection;
mod repository;
mod statement;

pub use access::Access;
pub use detection::{find_inputs, resolve_access, statement_location, StatementDetection};
pub use repository::{StatementId, StatementRepository};
pub use statement::{LineCol, Location, Statement, StatementFlags};
