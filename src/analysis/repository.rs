//! Registry of detected statements and the identifier spaces they share.
//!
//! The repository is the coupling point of the pipeline: the detector
//! populates it, and both the static serializer and the instrumenter read it
//! afterwards. Whatever identifiers the serializer writes into the static
//! artifact, the instrumenter bakes into the rewritten IR — the two sides
//! only line up because this registry is the single source of both.
//!
//! # Identifier spaces
//!
//! - **File IDs** derive from a platform-stable identity of the source file
//!   (the inode where available, a stable hash of the canonical path
//!   otherwise), so the same file gets the same ID across modules of a
//!   project.
//! - **Statement IDs** are dense per file, starting at 1, assigned in
//!   registration order.
//! - **Value IDs** are dense per module, starting at 1, assigned when the
//!   first statement touching the value is registered.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::analysis::Statement;
use crate::ir::{FuncRef, ValueRef};

/// Identity of a statement: the owning file and the dense index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementId {
    /// Platform-stable identifier of the source file.
    pub file: u64,
    /// 1-based dense index within the file.
    pub stmt: u64,
}

impl StatementId {
    /// Creates a statement identity.
    #[must_use]
    pub fn new(file: u64, stmt: u64) -> Self {
        Self { file, stmt }
    }
}

/// Derives the stable identifier for a source file path.
///
/// Uses the filesystem inode when the file exists (identical across differing
/// paths to the same file); otherwise hashes the canonicalized path — or the
/// raw path when canonicalization fails — with a fixed-seed hasher so the
/// result is reproducible across runs.
fn file_identity(path: &str) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let Ok(meta) = std::fs::metadata(path) {
            return meta.ino();
        }
    }

    let canonical = std::fs::canonicalize(path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_owned());
    let mut hasher = FxHasher::default();
    canonical.hash(&mut hasher);
    hasher.finish()
}

/// Per-module registry of statements, successor edges and identifiers.
///
/// Created per module, populated by the detector, then read-only for the
/// serializer and the instrumenter.
#[derive(Debug, Default)]
pub struct StatementRepository {
    stmts: FxHashMap<ValueRef, Statement>,
    ids: FxHashMap<ValueRef, StatementId>,
    successors: FxHashMap<ValueRef, Vec<ValueRef>>,
    func_stmts: FxHashMap<FuncRef, Vec<ValueRef>>,
    value_ids: FxHashMap<ValueRef, u64>,
    file_ids: FxHashMap<String, u64>,
    // Registration order, for the serialized filenames trailer.
    files: Vec<(u64, String)>,
    stmt_counts: FxHashMap<u64, u64>,
}

impl StatementRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a statement and assigns its identifiers.
    ///
    /// Assigns `(file, stmt)` identity (dense per file), value IDs for every
    /// scalar appearing in the statement's def and uses (def first, then uses
    /// in order, root before accessors), and appends the instruction to the
    /// function's ordered statement list. Re-registering the same instruction
    /// returns the previously assigned identity without any other effect.
    pub fn register(&mut self, func: FuncRef, stmt: Statement) -> StatementId {
        if let Some(&existing) = self.ids.get(&stmt.instr) {
            return existing;
        }

        let file = self.file_id(&stmt.loc.file);
        let count = self.stmt_counts.entry(file).or_insert(0);
        *count += 1;
        let id = StatementId::new(file, *count);

        if let Some(def) = &stmt.def {
            self.assign_value_ids(def.scalar_leaves());
        }
        for access in &stmt.uses {
            self.assign_value_ids(access.scalar_leaves());
        }

        self.ids.insert(stmt.instr, id);
        self.func_stmts.entry(func).or_default().push(stmt.instr);
        self.stmts.insert(stmt.instr, stmt);
        id
    }

    fn assign_value_ids(&mut self, leaves: Vec<ValueRef>) {
        for leaf in leaves {
            let next = self.value_ids.len() as u64 + 1;
            self.value_ids.entry(leaf).or_insert(next);
        }
    }

    /// Appends `succ` to the successor list of `stmt`.
    ///
    /// Both instructions are expected to be registered; the repository
    /// tolerates edges to unregistered instructions (the serializer drops
    /// them when it cannot resolve an identity).
    pub fn add_successor(&mut self, stmt: ValueRef, succ: ValueRef) {
        self.successors.entry(stmt).or_default().push(succ);
    }

    /// The statement detected for an instruction, if any.
    #[must_use]
    pub fn statement(&self, instr: ValueRef) -> Option<&Statement> {
        self.stmts.get(&instr)
    }

    /// The identity assigned to an instruction's statement.
    #[must_use]
    pub fn statement_id(&self, instr: ValueRef) -> Option<StatementId> {
        self.ids.get(&instr).copied()
    }

    /// The dense ID of an IR value, if any registered statement touches it.
    #[must_use]
    pub fn value_id(&self, value: ValueRef) -> Option<u64> {
        self.value_ids.get(&value).copied()
    }

    /// Looks up the stable ID of a file path, assigning one on first sight.
    pub fn file_id(&mut self, path: &str) -> u64 {
        if let Some(&id) = self.file_ids.get(path) {
            return id;
        }
        let id = file_identity(path);
        self.file_ids.insert(path.to_owned(), id);
        self.files.push((id, path.to_owned()));
        id
    }

    /// The stable ID of a file path, without assigning.
    #[must_use]
    pub fn file_id_of(&self, path: &str) -> Option<u64> {
        self.file_ids.get(path).copied()
    }

    /// Registered statements of a function, in registration order.
    #[must_use]
    pub fn statements_of(&self, func: FuncRef) -> &[ValueRef] {
        self.func_stmts
            .get(&func)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Successor statements of an instruction.
    #[must_use]
    pub fn successors_of(&self, instr: ValueRef) -> &[ValueRef] {
        self.successors
            .get(&instr)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `(file ID, path)` pairs in registration order.
    #[must_use]
    pub fn files(&self) -> &[(u64, String)] {
        &self.files
    }

    /// Number of registered statements.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.stmts.len()
    }

    /// Number of values with assigned IDs.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.value_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Access, LineCol, Location, StatementFlags};

    fn statement(instr: u32, file: &str, def: Option<Access>, uses: Vec<Access>) -> Statement {
        Statement {
            instr: ValueRef(instr),
            uses,
            def,
            loc: Location::new(file.into(), LineCol::new(1, 1), LineCol::new(1, 1)),
            flags: StatementFlags::empty(),
        }
    }

    #[test]
    fn test_statement_ids_are_dense_per_file() {
        let mut repo = StatementRepository::new();
        let func = FuncRef(0);

        let a = repo.register(func, statement(0, "a.c", None, vec![]));
        let b = repo.register(func, statement(1, "a.c", None, vec![]));
        let c = repo.register(func, statement(2, "b.c", None, vec![]));

        assert_eq!(a.stmt, 1);
        assert_eq!(b.stmt, 2);
        assert_eq!(c.stmt, 1);
        assert_eq!(a.file, b.file);
        assert_ne!(a.file, c.file);
    }

    #[test]
    fn test_reregistration_returns_same_id() {
        let mut repo = StatementRepository::new();
        let func = FuncRef(0);

        let first = repo.register(func, statement(0, "a.c", None, vec![]));
        let again = repo.register(func, statement(0, "a.c", None, vec![]));

        assert_eq!(first, again);
        assert_eq!(repo.statement_count(), 1);
        assert_eq!(repo.statements_of(func).len(), 1);
    }

    #[test]
    fn test_value_ids_cover_all_scalar_leaves() {
        let mut repo = StatementRepository::new();
        let func = FuncRef(0);

        let base = ValueRef(10);
        let index = ValueRef(11);
        let def = Access::array_like(Access::scalar(base), vec![Access::scalar(index)]);
        repo.register(func, statement(0, "a.c", Some(def), vec![]));

        assert_eq!(repo.value_id(base), Some(1));
        assert_eq!(repo.value_id(index), Some(2));
        assert_eq!(repo.value_count(), 2);
    }

    #[test]
    fn test_value_ids_are_stable_across_statements() {
        let mut repo = StatementRepository::new();
        let func = FuncRef(0);

        let shared = Access::scalar(ValueRef(10));
        repo.register(func, statement(0, "a.c", Some(shared.clone()), vec![]));
        repo.register(func, statement(1, "a.c", None, vec![shared]));

        assert_eq!(repo.value_id(ValueRef(10)), Some(1));
        assert_eq!(repo.value_count(), 1);
    }

    #[test]
    fn test_file_id_is_reproducible() {
        let mut first = StatementRepository::new();
        let mut second = StatementRepository::new();
        assert_eq!(
            first.file_id("does/not/exist.c"),
            second.file_id("does/not/exist.c")
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_file_id_uses_inode_for_real_files() {
        use std::os::unix::fs::MetadataExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.c");
        std::fs::write(&path, "int main() { return 0; }\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let mut repo = StatementRepository::new();
        let expected = std::fs::metadata(&path).unwrap().ino();
        assert_eq!(repo.file_id(&path), expected);
    }

    #[test]
    fn test_successors_append() {
        let mut repo = StatementRepository::new();
        repo.add_successor(ValueRef(0), ValueRef(1));
        repo.add_successor(ValueRef(0), ValueRef(2));
        assert_eq!(repo.successors_of(ValueRef(0)), &[ValueRef(1), ValueRef(2)]);
        assert!(repo.successors_of(ValueRef(9)).is_empty());
    }
}
