//! Execution-trace instrumentation.
//!
//! # Architecture
//!
//! For every registered statement the instrumenter splices calls to the
//! runtime hooks into the IR:
//!
//! - a **marker** call `aardwolf_write_statement(file, stmt)` *before* the
//!   statement's instruction, with the identifiers as compile-time
//!   constants — placed before so the marker is observable even when the
//!   instruction unwinds or diverges, keeping the trace a prefix of the
//!   execution;
//! - for statements that produce a value (stores and non-void calls), a
//!   **data** call `aardwolf_write_data_<T>(value)` *after* the instruction,
//!   because a call's result only exists once the call completes. If the
//!   instruction terminates its block, the data call is placed immediately
//!   before it instead, keeping the block structure legal.
//!
//! Type dispatch follows the trace format: integer widths map to the signed
//! writers (the IR has no signedness; the trace reader decides), `i1` maps
//! to the boolean writer, floats to `f32`/`f64`, and any other type to the
//! argument-less `aardwolf_write_data_unsupported`.
//!
//! The hooks are declared in the module on first use; repeated
//! instrumentation reuses the existing declarations.

use log::info;
use rustc_hash::FxHashMap;

use crate::analysis::StatementRepository;
use crate::ir::{BlockRef, FuncRef, InstrData, InstrKind, Module, Type, ValueRef};

/// Symbol of the statement-marker hook.
const HOOK_STATEMENT: &str = "aardwolf_write_statement";

/// Maps a produced value's type to the runtime hook that records it. The
/// second component is the hook's parameter type, absent for the
/// unsupported-type hook which takes no value.
fn data_hook(ty: &Type) -> (&'static str, Option<Type>) {
    match ty {
        Type::Int(1) => ("aardwolf_write_data_bool", Some(Type::Int(1))),
        Type::Int(8) => ("aardwolf_write_data_i8", Some(Type::Int(8))),
        Type::Int(16) => ("aardwolf_write_data_i16", Some(Type::Int(16))),
        Type::Int(32) => ("aardwolf_write_data_i32", Some(Type::Int(32))),
        Type::Int(64) => ("aardwolf_write_data_i64", Some(Type::Int(64))),
        Type::Float => ("aardwolf_write_data_f32", Some(Type::Float)),
        Type::Double => ("aardwolf_write_data_f64", Some(Type::Double)),
        _ => ("aardwolf_write_data_unsupported", None),
    }
}

/// A planned pair of trace calls around one statement instruction.
struct Injection {
    block: BlockRef,
    index: usize,
    file: u64,
    stmt: u64,
    data: Option<(FuncRef, Option<ValueRef>)>,
    at_terminator: bool,
}

/// The instrumentation pass.
pub struct Instrumenter;

impl Instrumenter {
    /// Rewrites `module` to emit the execution trace for every statement in
    /// `repo`. Returns the number of instrumented statements.
    pub fn run(module: &mut Module, repo: &StatementRepository) -> usize {
        let marker = module.ensure_declaration(
            HOOK_STATEMENT,
            Type::Void,
            &[Type::Int(64), Type::Int(64)],
        );

        let mut instrumented = 0;
        let funcs: Vec<FuncRef> = module.functions().map(|(func, _)| func).collect();

        for func in funcs {
            let mut planned = Vec::new();

            for &instr_ref in repo.statements_of(func) {
                let Some(id) = repo.statement_id(instr_ref) else {
                    continue;
                };
                let Some((block, index)) = module.position(func, instr_ref) else {
                    continue;
                };
                let Some(instr) = module.instr(instr_ref) else {
                    continue;
                };

                let traced = traced_value(&instr.kind, instr_ref, &instr.ty);
                let at_terminator = instr.kind.is_terminator();

                let data = traced.map(|value| {
                    let (hook, param) = data_hook(module.type_of(value));
                    let takes_value = param.is_some();
                    let params: Vec<Type> = param.into_iter().collect();
                    let callee = module.ensure_declaration(hook, Type::Void, &params);
                    (callee, takes_value.then_some(value))
                });

                planned.push(Injection {
                    block,
                    index,
                    file: id.file,
                    stmt: id.stmt,
                    data,
                    at_terminator,
                });
            }

            instrumented += planned.len();
            apply(module, func, marker, planned);
        }

        info!("instrumented {instrumented} statements");
        instrumented
    }
}

/// The value a statement makes observable: the stored operand for stores,
/// the result for calls that return one.
fn traced_value(kind: &InstrKind, instr_ref: ValueRef, ty: &Type) -> Option<ValueRef> {
    match kind {
        InstrKind::Store { value, .. } => Some(*value),
        InstrKind::Call { .. } if !ty.is_void() => Some(instr_ref),
        _ => None,
    }
}

/// Splices the planned calls into the function. Within each block the
/// insertions run back-to-front so earlier indices stay valid.
fn apply(module: &mut Module, func: FuncRef, marker: FuncRef, mut planned: Vec<Injection>) {
    // Group per block, descending index within the block.
    planned.sort_by(|a, b| (b.block, b.index).cmp(&(a.block, a.index)));

    let mut grouped: FxHashMap<BlockRef, Vec<Injection>> = FxHashMap::default();
    for injection in planned {
        grouped.entry(injection.block).or_default().push(injection);
    }

    for (block, injections) in grouped {
        for injection in injections {
            if let Some((callee, arg)) = injection.data {
                let args: Vec<ValueRef> = arg.into_iter().collect();
                let data_index = if injection.at_terminator {
                    injection.index
                } else {
                    injection.index + 1
                };
                module.insert_instr(
                    func,
                    block,
                    data_index,
                    InstrData::new(InstrKind::Call { callee, args }, Type::Void),
                );
            }

            let file = module.const_int(64, injection.file as i64);
            let stmt = module.const_int(64, injection.stmt as i64);
            module.insert_instr(
                func,
                block,
                injection.index,
                InstrData::new(
                    InstrKind::Call {
                        callee: marker,
                        args: vec![file, stmt],
                    },
                    Type::Void,
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StatementDetection;
    use crate::ir::{FunctionBuilder, ValueData};

    fn call_target<'m>(module: &'m Module, instr: ValueRef) -> Option<&'m str> {
        match &module.instr(instr)?.kind {
            InstrKind::Call { callee, .. } => Some(module.function(*callee).name()),
            _ => None,
        }
    }

    fn build_assignment_module() -> (Module, ValueRef, ValueRef) {
        let mut module = Module::new("demo/main.c");
        let file = module.add_file("demo", "main.c");
        let func = module.add_function("main", Type::Int(32), &[]);

        let mut b = FunctionBuilder::new(&mut module, func);
        b.set_loc(file, 2, 9);
        let x = b.alloca("x", Type::Int(32));
        let zero = b.const_int(32, 0);
        let store = b.store(zero, x);
        b.set_loc(file, 3, 3);
        let loaded = b.load(x, Type::Int(32));
        let ret = b.ret(Some(loaded));
        (module, store, ret)
    }

    #[test]
    fn test_marker_precedes_and_data_follows() {
        let (mut module, store, ret) = build_assignment_module();
        let repo = StatementDetection::run(&module);
        let count = Instrumenter::run(&mut module, &repo);
        assert_eq!(count, 2);

        let func = module.function_by_name("main").unwrap();
        let (block, store_pos) = module.position(func, store).unwrap();
        let instrs = module.function(func).block(block).instructions().to_vec();

        // Marker directly before the store, data call directly after it.
        let before = instrs[store_pos - 1];
        let after = instrs[store_pos + 1];
        assert_eq!(call_target(&module, before), Some(HOOK_STATEMENT));
        assert_eq!(call_target(&module, after), Some("aardwolf_write_data_i32"));

        // Marker directly before the return, and nothing traced after it.
        let (_, ret_pos) = module.position(func, ret).unwrap();
        let before_ret = instrs[ret_pos - 1];
        assert_eq!(call_target(&module, before_ret), Some(HOOK_STATEMENT));
        assert_eq!(instrs.last(), Some(&ret));
    }

    #[test]
    fn test_marker_arguments_are_statement_ids() {
        let (mut module, store, _) = build_assignment_module();
        let repo = StatementDetection::run(&module);
        Instrumenter::run(&mut module, &repo);

        let id = repo.statement_id(store).unwrap();
        let func = module.function_by_name("main").unwrap();
        let (block, store_pos) = module.position(func, store).unwrap();
        let marker = module.function(func).block(block).instructions()[store_pos - 1];

        let InstrKind::Call { args, .. } = &module.instr(marker).unwrap().kind else {
            panic!("marker is not a call");
        };
        let file_arg = module.value(args[0]).clone();
        let stmt_arg = module.value(args[1]).clone();
        assert!(
            matches!(file_arg, ValueData::ConstInt { value, .. } if value == id.file as i64)
        );
        assert!(matches!(stmt_arg, ValueData::ConstInt { value, .. } if value == id.stmt as i64));
    }

    #[test]
    fn test_data_call_for_stored_value_type() {
        let mut module = Module::new("demo/main.c");
        let file = module.add_file("demo", "main.c");
        let func = module.add_function("f", Type::Void, &[]);

        let mut b = FunctionBuilder::new(&mut module, func);
        b.set_loc(file, 1, 9);
        let d = b.alloca("d", Type::Double);
        let flag = b.alloca("flag", Type::Int(1));
        let half = b.const_float(Type::Double, 0.5);
        let store_d = b.store(half, d);
        let truth = b.const_int(1, 1);
        let store_flag = b.store(truth, flag);
        b.ret(None);

        let repo = StatementDetection::run(&module);
        Instrumenter::run(&mut module, &repo);

        let (block, d_pos) = module.position(func, store_d).unwrap();
        let instrs = module.function(func).block(block).instructions().to_vec();
        assert_eq!(
            call_target(&module, instrs[d_pos + 1]),
            Some("aardwolf_write_data_f64")
        );

        let (_, flag_pos) = module.position(func, store_flag).unwrap();
        assert_eq!(
            call_target(&module, instrs[flag_pos + 1]),
            Some("aardwolf_write_data_bool")
        );
    }

    #[test]
    fn test_void_call_gets_no_data_call() {
        let mut module = Module::new("demo/main.c");
        let file = module.add_file("demo", "main.c");
        let callee = module.declare_function("emit", Type::Void, &[]);
        let func = module.add_function("f", Type::Void, &[]);

        let mut b = FunctionBuilder::new(&mut module, func);
        b.set_loc(file, 1, 3);
        let call = b.call(callee, &[]);
        let ret = b.ret(None);

        let repo = StatementDetection::run(&module);
        Instrumenter::run(&mut module, &repo);

        let (block, call_pos) = module.position(func, call).unwrap();
        let instrs = module.function(func).block(block).instructions().to_vec();
        assert_eq!(call_target(&module, instrs[call_pos - 1]), Some(HOOK_STATEMENT));
        // The instruction after the void call is the return's marker, not a
        // data call.
        let (_, ret_pos) = module.position(func, ret).unwrap();
        assert_eq!(ret_pos, call_pos + 2);
        assert_eq!(call_target(&module, instrs[call_pos + 1]), Some(HOOK_STATEMENT));
    }

    #[test]
    fn test_nonvoid_call_traces_its_result() {
        let mut module = Module::new("demo/main.c");
        let file = module.add_file("demo", "main.c");
        let callee = module.declare_function("get", Type::Int(64), &[]);
        let func = module.add_function("f", Type::Void, &[]);

        let mut b = FunctionBuilder::new(&mut module, func);
        b.set_loc(file, 1, 3);
        let call = b.call(callee, &[]);
        b.ret(None);

        let repo = StatementDetection::run(&module);
        Instrumenter::run(&mut module, &repo);

        let (block, call_pos) = module.position(func, call).unwrap();
        let instrs = module.function(func).block(block).instructions().to_vec();
        let data = instrs[call_pos + 1];
        assert_eq!(call_target(&module, data), Some("aardwolf_write_data_i64"));

        let InstrKind::Call { args, .. } = &module.instr(data).unwrap().kind else {
            panic!("data hook is not a call");
        };
        assert_eq!(args.as_slice(), &[call]);
    }

    #[test]
    fn test_unsupported_type_uses_argless_hook() {
        let mut module = Module::new("demo/main.c");
        let file = module.add_file("demo", "main.c");
        let int_ptr = Type::Int(32).pointer_to();
        let func = module.add_function("f", Type::Void, &[("p", int_ptr.clone())]);

        let mut b = FunctionBuilder::new(&mut module, func);
        b.set_loc(file, 1, 11);
        let slot = b.alloca("p", int_ptr);
        let arg = b.arg(0);
        let store = b.store(arg, slot);
        b.ret(None);

        let repo = StatementDetection::run(&module);
        Instrumenter::run(&mut module, &repo);

        let (block, store_pos) = module.position(func, store).unwrap();
        let instrs = module.function(func).block(block).instructions().to_vec();
        let data = instrs[store_pos + 1];
        assert_eq!(
            call_target(&module, data),
            Some("aardwolf_write_data_unsupported")
        );
        let InstrKind::Call { args, .. } = &module.instr(data).unwrap().kind else {
            panic!("data hook is not a call");
        };
        assert!(args.is_empty());
    }
}
