//! # aardwolf Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! from the aardwolf library. Import this module to get quick access to the
//! essential types for statement analysis and instrumentation.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all aardwolf operations
pub use crate::Error;

/// The result type used throughout aardwolf
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The statement detection pass
pub use crate::analysis::StatementDetection;

/// Static artifact writer
pub use crate::artifact::StaticData;

/// Trace-call injection pass
pub use crate::instrument::Instrumenter;

// ================================================================================================
// Analysis Types
// ================================================================================================

/// The statement model and the shared identifier space
pub use crate::analysis::{
    Access, LineCol, Location, Statement, StatementFlags, StatementId, StatementRepository,
};

// ================================================================================================
// IR Types
// ================================================================================================

/// The consumed intermediate representation
pub use crate::ir::{
    BasicBlock, BinOp, BlockRef, CmpOp, DebugLoc, FuncRef, Function, FunctionBuilder, InstrData,
    InstrKind, Module, ScopeRef, SourceFile, Type, ValueData, ValueRef,
};

// ================================================================================================
// Artifact Readers and Runtime
// ================================================================================================

/// Typed records parsed back from artifacts
pub use crate::artifact::reader::{
    AccessRecord, FunctionRecord, StaticArtifact, StatementRecord, TraceEvent, TraceValue,
};

/// The trace stream writer
pub use crate::runtime::TraceSink;
