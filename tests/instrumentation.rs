//! Instrumentation tests: the identifiers baked into the rewritten IR must
//! be exactly the identifiers written into the static artifact.

use aardwolf::analysis::StatementDetection;
use aardwolf::artifact::{reader, StaticData};
use aardwolf::instrument::Instrumenter;
use aardwolf::ir::{CmpOp, FunctionBuilder, InstrKind, Module, Type, ValueData, ValueRef};

/// `int main() { int x = 0; if (x) x = 1; return x; }`
fn branchy_module() -> Module {
    let mut module = Module::new("demo/main.c");
    let file = module.add_file("demo", "main.c");
    let func = module.add_function("main", Type::Int(32), &[]);

    let mut b = FunctionBuilder::new(&mut module, func);
    b.set_loc(file, 1, 9);
    let x = b.alloca("x", Type::Int(32));
    let zero = b.const_int(32, 0);
    b.store(zero, x);
    let then_block = b.add_block("then");
    let merge = b.add_block("merge");
    b.set_loc(file, 2, 7);
    let loaded = b.load(x, Type::Int(32));
    let cond = b.cmp(CmpOp::Ne, loaded, zero);
    b.cond_br(cond, then_block, merge);

    b.switch_to(then_block);
    b.set_loc(file, 2, 12);
    let one = b.const_int(32, 1);
    b.store(one, x);
    b.br(merge);

    b.switch_to(merge);
    b.set_loc(file, 3, 3);
    let result = b.load(x, Type::Int(32));
    b.ret(Some(result));
    module
}

/// Collects `(file, stmt)` pairs from every marker call, in program order.
fn marker_ids(module: &Module) -> Vec<(u64, u64)> {
    let mut ids = Vec::new();
    for (_, func) in module.functions() {
        for (_, block) in func.blocks() {
            for &instr in block.instructions() {
                let Some(data) = module.instr(instr) else {
                    continue;
                };
                let InstrKind::Call { callee, args } = &data.kind else {
                    continue;
                };
                if module.function(*callee).name() != "aardwolf_write_statement" {
                    continue;
                }
                let file = const_value(module, args[0]);
                let stmt = const_value(module, args[1]);
                ids.push((file, stmt));
            }
        }
    }
    ids
}

fn const_value(module: &Module, value: ValueRef) -> u64 {
    match module.value(value) {
        ValueData::ConstInt { value, .. } => *value as u64,
        other => panic!("marker argument is not a constant: {other:?}"),
    }
}

#[test]
fn marker_ids_match_static_artifact() {
    let mut module = branchy_module();
    let repo = StatementDetection::run(&module);

    let mut buf = Vec::new();
    StaticData::new(&module, &repo).write_to(&mut buf).unwrap();
    let artifact = reader::read_static(&mut buf.as_slice()).unwrap();

    let instrumented = Instrumenter::run(&mut module, &repo);

    let serialized: Vec<(u64, u64)> = artifact.functions[0]
        .statements
        .iter()
        .map(|stmt| (stmt.id.file, stmt.id.stmt))
        .collect();

    assert_eq!(instrumented, serialized.len());
    assert_eq!(marker_ids(&module), serialized);
}

#[test]
fn every_statement_gets_exactly_one_marker() {
    let mut module = branchy_module();
    let repo = StatementDetection::run(&module);
    let count = Instrumenter::run(&mut module, &repo);

    assert_eq!(count, repo.statement_count());
    assert_eq!(marker_ids(&module).len(), count);
}

#[test]
fn instrumentation_declares_hooks_once() {
    let mut module = branchy_module();
    let repo = StatementDetection::run(&module);
    Instrumenter::run(&mut module, &repo);

    let hooks: Vec<&str> = module
        .functions()
        .map(|(_, func)| func.name())
        .filter(|name| name.starts_with("aardwolf_write_"))
        .collect();

    let mut deduped = hooks.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(hooks.len(), deduped.len(), "hook declared more than once");
    assert!(hooks.contains(&"aardwolf_write_statement"));
    assert!(hooks.contains(&"aardwolf_write_data_i32"));
}

#[test]
fn uninstrumented_declarations_stay_untouched() {
    let mut module = Module::new("demo/main.c");
    module.declare_function("external", Type::Void, &[]);
    let repo = StatementDetection::run(&module);

    let count = Instrumenter::run(&mut module, &repo);
    assert_eq!(count, 0);
    assert!(module.function_by_name("external").is_some());
}
