//! Statement detection: from IR instructions to source-level statements.
//!
//! # Architecture
//!
//! Detection runs in two passes per function:
//!
//! 1. **Classification** walks every instruction in program order. Returns,
//!    conditional branches, switches, invokes, stores and non-intrinsic calls
//!    with a resolvable source location become [`Statement`]s; everything
//!    else is control-flow or data-flow plumbing. Each statement's uses are
//!    recovered by a breadth-first backward walk over operand edges, and its
//!    def by resolving the written target to an [`Access`]. Statements are
//!    registered as they are found, so identifiers follow source order, and
//!    statements within one block are chained as successors immediately.
//!
//! 2. **Cross-block chaining** connects the last statement of every
//!    predecessor block to the first statement of each non-empty block.
//!    Blocks that produced no statements are transparent: the walk recurses
//!    into *their* predecessors until it finds non-empty ones, with a visited
//!    set guarding against predecessor cycles.
//!
//! # Failure semantics
//!
//! An instruction without a usable debug location is skipped entirely; a
//! composite access without a resolvable base is dropped from the statement
//! while the statement itself survives. Neither aborts the analysis.

use std::collections::VecDeque;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::analysis::{
    Access, Location, Statement, StatementFlags, StatementRepository,
};
use crate::ir::{BlockRef, FuncRef, InstrKind, Module, Type, ValueData, ValueRef};
use crate::{Error, Result};

/// The statement detection pass.
///
/// Stateless; [`StatementDetection::run`] consumes a module reference and
/// produces the populated [`StatementRepository`].
pub struct StatementDetection;

impl StatementDetection {
    /// Detects statements in every defined function of `module`.
    #[must_use]
    pub fn run(module: &Module) -> StatementRepository {
        let mut repo = StatementRepository::new();

        for (func_ref, func) in module.functions() {
            if func.is_declaration() {
                continue;
            }

            // First and last statement of every non-empty basic block, for
            // chaining across block boundaries afterwards.
            let mut bounds: FxHashMap<BlockRef, (ValueRef, ValueRef)> = FxHashMap::default();

            for (block_ref, block) in func.blocks() {
                let mut first: Option<ValueRef> = None;
                let mut prev: Option<ValueRef> = None;

                for &instr in block.instructions() {
                    let Some(stmt) = classify(module, func_ref, instr) else {
                        continue;
                    };

                    // Register immediately so identifiers follow the order of
                    // occurrence in the source.
                    repo.register(func_ref, stmt);

                    match prev {
                        Some(prev) => repo.add_successor(prev, instr),
                        None => first = Some(instr),
                    }
                    prev = Some(instr);
                }

                if let (Some(first), Some(last)) = (first, prev) {
                    bounds.insert(block_ref, (first, last));
                }
            }

            let preds = module.block_predecessors(func_ref);

            for (block_ref, _) in func.blocks() {
                let Some(&(first, _)) = bounds.get(&block_ref) else {
                    continue;
                };

                // Find all nearest non-empty predecessors, looking through
                // empty blocks transitively.
                let mut queue: VecDeque<BlockRef> =
                    preds[block_ref.index()].iter().copied().collect();
                let mut visited: FxHashSet<BlockRef> = FxHashSet::default();

                while let Some(pred) = queue.pop_front() {
                    if !visited.insert(pred) {
                        continue;
                    }
                    match bounds.get(&pred) {
                        Some(&(_, last)) => repo.add_successor(last, first),
                        None => queue.extend(preds[pred.index()].iter().copied()),
                    }
                }
            }
        }

        log::info!(
            "detected {} statements in module '{}'",
            repo.statement_count(),
            module.name()
        );
        repo
    }
}

/// Classifies one instruction, producing its statement record if it is one.
fn classify(module: &Module, func: FuncRef, instr_ref: ValueRef) -> Option<Statement> {
    let instr = module.instr(instr_ref)?;

    let (uses, def, flags) = match &instr.kind {
        InstrKind::Ret { .. } => (
            find_inputs(module, instr_ref),
            None,
            StatementFlags::RET,
        ),
        InstrKind::CondBr { .. } | InstrKind::Switch { .. } | InstrKind::Invoke { .. } => (
            find_inputs(module, instr_ref),
            None,
            StatementFlags::empty(),
        ),
        InstrKind::Store { value, target } => {
            let def = resolve_access(module, *target);
            if def.is_none() {
                debug!("store destination {instr_ref:?} has no resolvable access");
            }
            let flags = if module.is_argument(*value) {
                StatementFlags::ARG
            } else {
                StatementFlags::empty()
            };
            (find_inputs(module, instr_ref), def, flags)
        }
        InstrKind::Call { callee, .. } => {
            if module.function(*callee).is_intrinsic() {
                return None;
            }
            let def = (!instr.ty.is_void()).then(|| Access::scalar(instr_ref));
            (find_inputs(module, instr_ref), def, StatementFlags::CALL)
        }
        // Unconditional branches and the remaining instruction kinds are
        // plumbing, not statements.
        _ => return None,
    };

    let loc = match statement_location(module, func, instr_ref) {
        Ok(loc) => loc,
        Err(_) => {
            // No source counterpart (compiler-synthesized); drop it.
            debug!("skipping {instr_ref:?}: no usable source location");
            return None;
        }
    };

    Some(Statement {
        instr: instr_ref,
        uses,
        def,
        loc,
        flags,
    })
}

/// Resolves the source location of a statement instruction.
///
/// Uses the instruction's own debug location when it has one with a scope.
/// A store that spills a formal argument into its stack slot carries no
/// location of its own; the declare intrinsic attached to the destination
/// allocation does, and is used as a fallback.
///
/// # Errors
///
/// [`Error::UnknownLocation`] when neither source yields a location.
pub fn statement_location(module: &Module, func: FuncRef, instr_ref: ValueRef) -> Result<Location> {
    let instr = module.instr(instr_ref).ok_or(Error::UnknownLocation)?;

    if let Some(loc) = instr.loc {
        if let Some(scope) = loc.scope {
            return Ok(Location::point(
                module.file(scope).path(),
                loc.line,
                loc.col,
            ));
        }
    }

    if let InstrKind::Store { value, target } = &instr.kind {
        if module.is_argument(*value) {
            if let Some(loc) = declare_location(module, func, *target) {
                return Ok(loc);
            }
        }
    }

    Err(Error::UnknownLocation)
}

/// Location of the declare intrinsic describing `target`, if one exists.
fn declare_location(module: &Module, func: FuncRef, target: ValueRef) -> Option<Location> {
    for (_, block) in module.function(func).blocks() {
        for &handle in block.instructions() {
            let Some(instr) = module.instr(handle) else {
                continue;
            };
            let InstrKind::DbgDeclare { target: declared } = instr.kind else {
                continue;
            };
            if declared != target {
                continue;
            }
            if let Some(loc) = instr.loc {
                if let Some(scope) = loc.scope {
                    return Some(Location::point(
                        module.file(scope).path(),
                        loc.line,
                        loc.col,
                    ));
                }
            }
        }
    }
    None
}

/// Discovers the variables an instruction reads.
///
/// Breadth-first backward walk over operand edges. Operands that resolve to
/// an [`Access`] are collected and not descended into; stores contribute only
/// their value operand (the destination is a write, never a use); everything
/// else is transparent and its own operands are enqueued. A visited set
/// bounds the walk on operand graphs with sharing.
pub fn find_inputs(module: &Module, start: ValueRef) -> Vec<Access> {
    let mut result: Vec<Access> = Vec::new();
    let mut visited: FxHashSet<ValueRef> = FxHashSet::default();
    let mut queue: VecDeque<ValueRef> = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }

        if current != start {
            if let Some(access) = resolve_access(module, current) {
                if !result.contains(&access) {
                    result.push(access);
                }
                continue;
            }
        }

        if let Some(InstrKind::Store { value, .. }) = module.instr(current).map(|i| &i.kind) {
            // The destination is written, not read; only the stored value
            // feeds the statement.
            if is_walkable(module, *value) {
                queue.push_back(*value);
            }
            continue;
        }

        for operand in walk_operands(module, current) {
            if is_walkable(module, operand) {
                queue.push_back(operand);
            }
        }
    }

    result
}

/// `true` for values the backward walk may continue through: instructions,
/// globals and constant address expressions. Plain constants and formal
/// arguments terminate the walk.
fn is_walkable(module: &Module, value: ValueRef) -> bool {
    matches!(
        module.value(value),
        ValueData::Instr(_) | ValueData::Global(_) | ValueData::ConstGep { .. }
    )
}

fn walk_operands(module: &Module, value: ValueRef) -> Vec<ValueRef> {
    match module.value(value) {
        ValueData::Instr(instr) => instr.kind.operands(),
        ValueData::ConstGep { base, .. } => vec![*base],
        _ => Vec::new(),
    }
}

/// Resolves a value to the access it represents, if it represents one.
///
/// - local allocations, call results and non-constant globals are scalars;
/// - element-address computations become structural or array-like accesses;
/// - in-bounds constant address expressions and pointer-typed loads become
///   degenerate array-like accesses (a dereference with no index
///   information);
/// - constant globals are literals, not variables, and resolve to nothing.
pub fn resolve_access(module: &Module, value: ValueRef) -> Option<Access> {
    match module.value(value) {
        ValueData::Instr(instr) => match &instr.kind {
            InstrKind::Alloca { .. } | InstrKind::Call { .. } => Some(Access::scalar(value)),
            InstrKind::Gep {
                base,
                indices,
                source,
            } => resolve_element_access(module, value, *base, indices, source),
            InstrKind::Load { source } => {
                if instr.ty.is_pointer() {
                    // Dereferencing a pointer: array[0] without the constant
                    // index, since no index information exists.
                    let base = resolve_access(module, *source)?;
                    Some(Access::array_like(base, Vec::new()))
                } else {
                    None
                }
            }
            _ => None,
        },
        ValueData::Global(global) => (!global.constant).then(|| Access::scalar(value)),
        ValueData::ConstGep { base, in_bounds } => {
            if *in_bounds {
                let base = resolve_access(module, *base)?;
                Some(Access::array_like(base, Vec::new()))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn resolve_element_access(
    module: &Module,
    gep: ValueRef,
    base: ValueRef,
    indices: &[ValueRef],
    source: &Type,
) -> Option<Access> {
    let is_struct = source.is_struct();

    let Some(base) = element_base(module, base) else {
        debug!("element access {gep:?} has no resolvable base; dropping access");
        return None;
    };

    let accessors = element_accessors(module, indices, is_struct);

    if is_struct {
        // A field selection needs the field; without it the access carries
        // no information.
        let field = accessors.into_iter().next()?;
        Some(Access::structural(base, field))
    } else {
        Some(Access::array_like(base, accessors))
    }
}

/// The access standing for the aggregate itself (the array or structure an
/// element is selected from).
fn element_base(module: &Module, base: ValueRef) -> Option<Access> {
    match module.value(base) {
        ValueData::Instr(instr) => match &instr.kind {
            // Chained element accesses recurse: p->a[i] selects from the
            // access of p->a.
            InstrKind::Gep { .. } => resolve_access(module, base),
            InstrKind::Alloca { .. } => Some(Access::scalar(base)),
            _ => {
                // Find the allocation transitively. A unique data-flow root
                // is the aggregate; anything else is unresolvable.
                let inputs = find_inputs(module, base);
                if inputs.len() == 1 {
                    inputs.into_iter().next()
                } else {
                    None
                }
            }
        },
        ValueData::Global(_) => Some(Access::scalar(base)),
        _ => None,
    }
}

/// The accesses that drive an element selection (index, field, ...).
fn element_accessors(module: &Module, indices: &[ValueRef], is_struct: bool) -> Vec<Access> {
    let Some(&last) = indices.last() else {
        return Vec::new();
    };

    // The accessor may be a valid access on its own.
    if let Some(access) = resolve_access(module, last) {
        return vec![access];
    }

    match module.value(last) {
        // Structure fields are encoded as constant indices and the constant
        // is meaningful; constant offsets into arrays and pointers are not
        // carried.
        ValueData::ConstInt { .. } | ValueData::ConstFloat { .. } => {
            if is_struct {
                vec![Access::scalar(last)]
            } else {
                Vec::new()
            }
        }
        ValueData::Instr(_) => find_inputs(module, last),
        _ => Vec::new(),
    }
}
