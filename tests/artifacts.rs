//! Static artifact serialization tests: golden bytes for a known module and
//! the write/read round trip.

use std::path::Path;

use aardwolf::analysis::{StatementDetection, StatementFlags, StatementRepository};
use aardwolf::artifact::reader::{self, AccessRecord};
use aardwolf::artifact::StaticData;
use aardwolf::ir::{FunctionBuilder, Module, Type, ValueRef};

/// Lowers `int main() { int x = 0; x = 1; return x; }` against a real source
/// file on disk, so the file identity is the actual inode.
fn assignment_module(source: &Path) -> (Module, ValueRef) {
    let dir = source
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut module = Module::new(source.to_string_lossy().into_owned());
    let file = module.add_file(dir, name);
    let func = module.add_function("main", Type::Int(32), &[]);

    let mut b = FunctionBuilder::new(&mut module, func);
    b.set_loc(file, 1, 9);
    let x = b.alloca("x", Type::Int(32));
    let zero = b.const_int(32, 0);
    b.store(zero, x);
    b.set_loc(file, 2, 5);
    let one = b.const_int(32, 1);
    b.store(one, x);
    b.set_loc(file, 3, 3);
    let loaded = b.load(x, Type::Int(32));
    b.ret(Some(loaded));

    (module, x)
}

fn expected_bytes(file_id: u64, path: &str) -> Vec<u8> {
    let mut expected = Vec::new();
    expected.extend_from_slice(b"AARD/S1");

    expected.push(0xfe);
    expected.extend_from_slice(b"main\0");

    // Statement #1: `int x = 0;` - one successor, defines x (value %1).
    expected.push(0xff);
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.push(1);
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&2u64.to_le_bytes());
    expected.push(1);
    expected.push(0xe0);
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.push(0);
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.extend_from_slice(&9u32.to_le_bytes());
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.extend_from_slice(&9u32.to_le_bytes());
    expected.push(0x00);

    // Statement #2: `x = 1;`
    expected.push(0xff);
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&2u64.to_le_bytes());
    expected.push(1);
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&3u64.to_le_bytes());
    expected.push(1);
    expected.push(0xe0);
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.push(0);
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&2u32.to_le_bytes());
    expected.extend_from_slice(&5u32.to_le_bytes());
    expected.extend_from_slice(&2u32.to_le_bytes());
    expected.extend_from_slice(&5u32.to_le_bytes());
    expected.push(0x00);

    // Statement #3: `return x;` - no successors, uses x, RET metadata.
    expected.push(0xff);
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&3u64.to_le_bytes());
    expected.push(0);
    expected.push(0);
    expected.push(1);
    expected.push(0xe0);
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(&3u32.to_le_bytes());
    expected.extend_from_slice(&3u32.to_le_bytes());
    expected.extend_from_slice(&3u32.to_le_bytes());
    expected.extend_from_slice(&3u32.to_le_bytes());
    expected.push(0x62);

    // Filenames trailer.
    expected.push(0xfd);
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.extend_from_slice(&file_id.to_le_bytes());
    expected.extend_from_slice(path.as_bytes());
    expected.push(0);

    expected
}

#[test]
fn golden_bytes_for_straight_line_module() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("main.c");
    std::fs::write(&source, "int main() { int x = 0; x = 1; return x; }\n").unwrap();

    let (module, _) = assignment_module(&source);
    let repo = StatementDetection::run(&module);

    let path = source.to_string_lossy().into_owned();
    let file_id = repo.file_id_of(&path).expect("source file registered");

    let mut buf = Vec::new();
    StaticData::new(&module, &repo).write_to(&mut buf).unwrap();

    assert_eq!(buf, expected_bytes(file_id, &path));
}

#[test]
fn artifact_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("main.c");
    std::fs::write(&source, "int main() { int x = 0; x = 1; return x; }\n").unwrap();

    let (module, _) = assignment_module(&source);
    let repo = StatementDetection::run(&module);

    let mut buf = Vec::new();
    StaticData::new(&module, &repo).write_to(&mut buf).unwrap();
    let parsed = reader::read_static(&mut buf.as_slice()).unwrap();

    assert_eq!(parsed.functions.len(), 1);
    let main = &parsed.functions[0];
    assert_eq!(main.name, "main");
    assert_eq!(main.statements.len(), 3);

    let path = source.to_string_lossy().into_owned();
    let file_id = repo.file_id_of(&path).unwrap();
    assert_eq!(parsed.file_path(file_id), Some(path.as_str()));

    // Successor edges survive the round trip.
    assert_eq!(main.statements[0].successors, vec![main.statements[1].id]);
    assert_eq!(main.statements[1].successors, vec![main.statements[2].id]);
    assert!(main.statements[2].successors.is_empty());

    // Defs, uses and metadata survive it too.
    assert_eq!(main.statements[0].def, Some(AccessRecord::Scalar(1)));
    assert!(main.statements[0].uses.is_empty());
    assert!(main.statements[2].def.is_none());
    assert_eq!(main.statements[2].uses, vec![AccessRecord::Scalar(1)]);
    assert!(main.statements[2].metadata.contains(StatementFlags::RET));

    // Locations are preserved exactly.
    assert_eq!(main.statements[1].loc.begin_line, 2);
    assert_eq!(main.statements[1].loc.begin_col, 5);
    assert_eq!(main.statements[1].loc.end_line, 2);
}

#[test]
fn composite_accesses_round_trip() {
    let mut module = Module::new("demo/main.c");
    let file = module.add_file("demo", "main.c");
    let func = module.add_function("f", Type::Void, &[]);
    let array = Type::Array(Box::new(Type::Int(32)), 4);

    let mut b = FunctionBuilder::new(&mut module, func);
    b.set_loc(file, 1, 9);
    let a = b.alloca("a", array.clone());
    let i = b.alloca("i", Type::Int(32));
    b.set_loc(file, 2, 8);
    let idx = b.load(i, Type::Int(32));
    let dst = b.gep(a, &[idx], array);
    let zero = b.const_int(32, 0);
    b.store(zero, dst);
    b.ret(None);

    let repo = StatementDetection::run(&module);
    let mut buf = Vec::new();
    StaticData::new(&module, &repo).write_to(&mut buf).unwrap();
    let parsed = reader::read_static(&mut buf.as_slice()).unwrap();

    let store = &parsed.functions[0].statements[0];
    let a_id = repo.value_id(a).unwrap();
    let i_id = repo.value_id(i).unwrap();
    assert_eq!(
        store.def,
        Some(AccessRecord::ArrayLike(
            Box::new(AccessRecord::Scalar(a_id)),
            vec![AccessRecord::Scalar(i_id)]
        ))
    );
}

#[test]
fn save_writes_to_explicit_destination() {
    let dir = tempfile::tempdir().unwrap();
    let (module, _) = assignment_module(Path::new("demo/main.c"));
    let repo = StatementDetection::run(&module);

    let path = StaticData::new(&module, &repo)
        .save(Some(dir.path()))
        .unwrap();
    assert_eq!(path, dir.path().join("main.c.aard"));
    assert!(path.exists());
}

#[test]
fn value_ids_are_dense_and_shared() {
    let mut module = Module::new("demo/main.c");
    let file = module.add_file("demo", "main.c");
    let func = module.add_function("f", Type::Void, &[]);

    let mut b = FunctionBuilder::new(&mut module, func);
    b.set_loc(file, 1, 9);
    let x = b.alloca("x", Type::Int(32));
    let y = b.alloca("y", Type::Int(32));
    b.set_loc(file, 2, 5);
    let loaded_y = b.load(y, Type::Int(32));
    b.store(loaded_y, x);
    b.set_loc(file, 3, 5);
    let loaded_x = b.load(x, Type::Int(32));
    b.store(loaded_x, y);
    b.ret(None);

    let repo: StatementRepository = StatementDetection::run(&module);

    // First statement assigns x (def) then y (use); both IDs are reused by
    // the second statement.
    assert_eq!(repo.value_id(x), Some(1));
    assert_eq!(repo.value_id(y), Some(2));
    assert_eq!(repo.value_count(), 2);
}
