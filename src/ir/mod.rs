//! The intermediate representation consumed by the analysis.
//!
//! # Architecture
//!
//! This module defines the SSA-style IR the rest of the crate operates on:
//! a [`Module`] owning a value arena, [`Function`]s made of [`BasicBlock`]s,
//! typed instructions with operand edges, and per-instruction [`DebugLoc`]
//! metadata pointing into a source file table.
//!
//! The representation is intentionally the *consumer's* view of a compiler
//! IR: it models exactly the surface the statement detector, instrumenter and
//! serializers need — value identity, operand traversal, block edges, debug
//! locations, and call insertion — and nothing else.
//!
//! # Key Components
//!
//! - [`Module`] - Compilation unit and value arena
//! - [`ValueRef`] / [`FuncRef`] / [`BlockRef`] / [`ScopeRef`] - Cheap handles
//! - [`InstrKind`] - Operations with embedded operands
//! - [`FunctionBuilder`] - Cursor-style body construction
//! - [`DebugLoc`] / [`SourceFile`] - Debug metadata

mod builder;
mod debug;
mod module;
mod types;

pub use builder::FunctionBuilder;
pub use debug::{DebugLoc, ScopeRef, SourceFile};
pub use module::{
    BasicBlock, BinOp, BlockRef, CmpOp, FuncRef, Function, GlobalData, InstrData, InstrKind,
    Module, ValueData, ValueRef,
};
pub use types::Type;
