//! Static artifact serialization.
//!
//! Writes one `.aard` file per module: a token stream of function names and
//! statement records, closed by the filename table. The identifiers baked
//! into the records come straight from the [`StatementRepository`], which is
//! the same source the instrumenter reads — the static artifact and the
//! runtime trace only correlate because of that shared assignment.
//!
//! # Format
//!
//! ```text
//! "AARD/S1"
//! ( 0xFE <function name, zero-terminated>
//!   ( 0xFF <statement record> )* )*
//! 0xFD <u32 file count> ( <u64 file id> <path, zero-terminated> )*
//! ```
//!
//! Statement records hold the statement identity, successor identities, the
//! optional def access, the use accesses, the source range and the metadata
//! byte; access trees are encoded recursively. All integers little-endian.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::analysis::{Access, StatementRepository};
use crate::artifact::consts;
use crate::artifact::io::WriteExt;
use crate::ir::Module;
use crate::Result;

/// Serializer for the static statement data of one module.
pub struct StaticData<'a> {
    module: &'a Module,
    repo: &'a StatementRepository,
}

impl<'a> StaticData<'a> {
    /// Creates a serializer over a detected module.
    #[must_use]
    pub fn new(module: &'a Module, repo: &'a StatementRepository) -> Self {
        Self { module, repo }
    }

    /// The artifact file name for this module: `<module basename>.aard`.
    #[must_use]
    pub fn artifact_name(&self) -> String {
        let basename = Path::new(self.module.name())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.module.name().to_owned());
        format!("{basename}.aard")
    }

    /// Writes the artifact into `dest_dir` (or, when `None`, the directory
    /// named by `AARDWOLF_DATA_DEST`, falling back to the current directory)
    /// and returns the written path.
    ///
    /// # Errors
    ///
    /// Fails fast on any I/O error; no partial artifact is kept meaningful.
    pub fn save(&self, dest_dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match dest_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::var_os("AARDWOLF_DATA_DEST")
                .map(PathBuf::from)
                .unwrap_or_default(),
        };
        let path = dir.join(self.artifact_name());

        let mut file = std::fs::File::create(&path)?;
        self.write_to(&mut file)?;
        file.sync_all()?;

        info!(
            "wrote static data for module '{}' to {}",
            self.module.name(),
            path.display()
        );
        Ok(path)
    }

    /// Writes the artifact to an arbitrary sink.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the sink and fails on statements whose
    /// identifiers are missing from the repository (which would desynchronize
    /// the artifact from the instrumented binary).
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(consts::STATIC_MAGIC)?;

        for (func_ref, func) in self.module.functions() {
            if func.is_declaration() {
                continue;
            }

            writer.write_u8(consts::TOKEN_FUNCTION)?;
            writer.write_cstr(func.name())?;

            // Emit in program order, not registration order; the two agree
            // for intra-block sequences but program order also fixes the
            // relative order of blocks.
            for (_, block) in func.blocks() {
                for &instr in block.instructions() {
                    if self.repo.statement(instr).is_some() {
                        self.write_statement(writer, instr)?;
                    }
                }
            }
        }

        writer.write_u8(consts::TOKEN_FILENAMES)?;
        let files = self.repo.files();
        writer.write_u32(files.len() as u32)?;
        for (id, path) in files {
            writer.write_u64(*id)?;
            writer.write_cstr(path)?;
        }

        Ok(())
    }

    fn write_statement<W: Write>(&self, writer: &mut W, instr: crate::ir::ValueRef) -> Result<()> {
        let stmt = self
            .repo
            .statement(instr)
            .ok_or_else(|| malformed_error!("statement for {:?} not registered", instr))?;
        let id = self
            .repo
            .statement_id(instr)
            .ok_or_else(|| malformed_error!("statement {:?} has no identity", instr))?;

        writer.write_u8(consts::TOKEN_STATEMENT)?;
        writer.write_u64(id.file)?;
        writer.write_u64(id.stmt)?;

        // Successor identities; edges to unregistered instructions cannot be
        // expressed and would indicate a detector bug.
        let successors = self.repo.successors_of(instr);
        let count = u8::try_from(successors.len())
            .map_err(|_| malformed_error!("statement has {} successors", successors.len()))?;
        writer.write_u8(count)?;
        for &succ in successors {
            let succ_id = self
                .repo
                .statement_id(succ)
                .ok_or_else(|| malformed_error!("successor {:?} has no identity", succ))?;
            writer.write_u64(succ_id.file)?;
            writer.write_u64(succ_id.stmt)?;
        }

        match &stmt.def {
            Some(def) => {
                writer.write_u8(1)?;
                self.write_access(writer, def)?;
            }
            None => writer.write_u8(0)?,
        }

        let uses = u8::try_from(stmt.uses.len())
            .map_err(|_| malformed_error!("statement has {} uses", stmt.uses.len()))?;
        writer.write_u8(uses)?;
        for access in &stmt.uses {
            self.write_access(writer, access)?;
        }

        let file_id = self
            .repo
            .file_id_of(&stmt.loc.file)
            .ok_or_else(|| malformed_error!("file '{}' has no identity", stmt.loc.file))?;
        writer.write_u64(file_id)?;
        writer.write_u32(stmt.loc.begin.line)?;
        writer.write_u32(stmt.loc.begin.col)?;
        writer.write_u32(stmt.loc.end.line)?;
        writer.write_u32(stmt.loc.end.col)?;

        writer.write_u8(stmt.flags.bits())?;
        Ok(())
    }

    fn write_access<W: Write>(&self, writer: &mut W, access: &Access) -> Result<()> {
        match access {
            Access::Scalar(value) => {
                let id = self
                    .repo
                    .value_id(*value)
                    .ok_or_else(|| malformed_error!("value {:?} has no identity", value))?;
                writer.write_u8(consts::TOKEN_VALUE_SCALAR)?;
                writer.write_u64(id)?;
            }
            Access::Structural { base, field } => {
                writer.write_u8(consts::TOKEN_VALUE_STRUCTURAL)?;
                self.write_access(writer, base)?;
                self.write_access(writer, field)?;
            }
            Access::ArrayLike { base, indices } => {
                writer.write_u8(consts::TOKEN_VALUE_ARRAY_LIKE)?;
                self.write_access(writer, base)?;
                writer.write_u32(indices.len() as u32)?;
                for index in indices {
                    self.write_access(writer, index)?;
                }
            }
        }
        Ok(())
    }
}
