// Copyright 2025-2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
//#![deny(unsafe_code)]
// - 'runtime/abi.rs' dereferences C strings handed in by instrumented code

//! # aardwolf
//!
//! The static-analysis core of a fault-localization toolchain. Given a
//! program in an SSA-style intermediate representation with debug
//! information, this crate recovers the *source-level statements* hiding in
//! the instruction stream, derives each statement's data-flow footprint (the
//! variables it reads and the one it writes), rebuilds a statement-level
//! control flow graph, and serializes the model to a binary artifact. The
//! same pipeline rewrites the IR with calls into a trace runtime, so that
//! running the program produces an execution trace the downstream
//! localization engine can join against the static model.
//!
//! # Architecture
//!
//! The library is organized into modules that mirror the pipeline:
//!
//! - **IR Layer**: [`ir`] - The consumed intermediate representation: value
//!   arena, functions, blocks, typed instructions, debug locations
//! - **Analysis Layer**: [`analysis`] - Access model, statement detection,
//!   statement repository and successor graph
//! - **Artifact Layer**: [`artifact`] - Binary serialization of the static
//!   model and readers for both artifact formats
//! - **Instrumentation Layer**: [`instrument`] - IR rewriting that injects
//!   the trace hooks
//! - **Runtime Layer**: [`runtime`] - The trace writer linked into
//!   instrumented programs, with its C ABI
//!
//! ## Key Components
//!
//! - [`analysis::StatementDetection`] - Main entry point of the analysis
//! - [`analysis::StatementRepository`] - The shared identifier space
//! - [`artifact::StaticData`] - Static artifact writer
//! - [`instrument::Instrumenter`] - Trace-call injection
//! - [`runtime::TraceSink`] - The trace stream writer
//! - [`crate::prelude`] - Convenient re-exports of commonly used types
//! - [`crate::Error`] and [`crate::Result`] - Error handling
//!
//! # Usage Examples
//!
//! ## Analyzing and serializing a module
//!
//! ```rust,no_run
//! use aardwolf::analysis::StatementDetection;
//! use aardwolf::artifact::StaticData;
//! use aardwolf::instrument::Instrumenter;
//! # let mut module = aardwolf::ir::Module::new("main.c");
//!
//! // Detect statements and build the statement-level CFG.
//! let repo = StatementDetection::run(&module);
//!
//! // Write the static artifact next to the module.
//! StaticData::new(&module, &repo).save(None)?;
//!
//! // Rewrite the IR to emit the execution trace.
//! Instrumenter::run(&mut module, &repo);
//! # Ok::<(), aardwolf::Error>(())
//! ```
//!
//! ## Reading artifacts back
//!
//! ```rust,no_run
//! use aardwolf::artifact::reader;
//!
//! let mut file = std::fs::File::open("main.c.aard")?;
//! let data = reader::read_static(&mut file)?;
//! for function in &data.functions {
//!     println!("{}: {} statements", function.name, function.statements.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
mod error;

pub mod analysis;
pub mod artifact;
pub mod instrument;
pub mod ir;
pub mod prelude;
pub mod runtime;

pub use error::{Error, Result};
