//! Readers for both binary artifact formats.
//!
//! These parsers are the inverse of the static serializer and the trace
//! runtime. They exist for three consumers: the artifact viewer CLI, tests
//! that check the write/read round trip, and any downstream tooling that
//! wants typed records instead of raw bytes.
//!
//! The trace reader optionally runs in a lenient mode that resynchronizes on
//! unknown tokens, because a crashed program may leave a torn final record.

use std::io::Read;

use crate::analysis::{StatementFlags, StatementId};
use crate::artifact::consts;
use crate::artifact::io::ReadExt;
use crate::{Error, Result};

/// An access tree as stored in the static artifact: scalar leaves carry
/// value IDs instead of IR handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRecord {
    /// A whole variable, by value ID.
    Scalar(u64),
    /// Field selection.
    Structural(Box<AccessRecord>, Box<AccessRecord>),
    /// Subscript; the index list may be empty.
    ArrayLike(Box<AccessRecord>, Vec<AccessRecord>),
}

/// Source range of a serialized statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocRecord {
    /// File identity.
    pub file: u64,
    /// 1-based begin line.
    pub begin_line: u32,
    /// 1-based begin column.
    pub begin_col: u32,
    /// 1-based end line.
    pub end_line: u32,
    /// 1-based end column.
    pub end_col: u32,
}

/// One statement record from the static artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRecord {
    /// Statement identity.
    pub id: StatementId,
    /// Identities of successor statements.
    pub successors: Vec<StatementId>,
    /// The written access, if the statement defines one.
    pub def: Option<AccessRecord>,
    /// The read accesses.
    pub uses: Vec<AccessRecord>,
    /// Source range.
    pub loc: LocRecord,
    /// Role metadata.
    pub metadata: StatementFlags,
}

/// A function and its statements, in artifact order.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    /// The function symbol name.
    pub name: String,
    /// Statement records in emission order.
    pub statements: Vec<StatementRecord>,
}

/// The parsed static artifact of one module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaticArtifact {
    /// Functions in emission order.
    pub functions: Vec<FunctionRecord>,
    /// `(file ID, path)` pairs from the filename trailer.
    pub files: Vec<(u64, String)>,
}

impl StaticArtifact {
    /// Looks up the path registered for a file ID.
    #[must_use]
    pub fn file_path(&self, id: u64) -> Option<&str> {
        self.files
            .iter()
            .find(|(file, _)| *file == id)
            .map(|(_, path)| path.as_str())
    }
}

/// Parses a static artifact stream.
///
/// # Errors
///
/// [`Error::Malformed`] on magic/token mismatches or truncation,
/// [`Error::UnsupportedVersion`] when the version digit is not `1`.
pub fn read_static<R: Read>(reader: &mut R) -> Result<StaticArtifact> {
    let mut magic = [0u8; 7];
    reader
        .read_exact(&mut magic)
        .map_err(|_| malformed_error!("static artifact shorter than its magic"))?;
    if magic[..6] != consts::STATIC_MAGIC[..6] {
        return Err(malformed_error!("not a static artifact: bad magic"));
    }
    if magic[6] != consts::STATIC_MAGIC[6] {
        return Err(Error::UnsupportedVersion(magic[6].wrapping_sub(b'0')));
    }

    let mut artifact = StaticArtifact::default();

    loop {
        let token = match reader.read_u8() {
            Ok(token) => token,
            // Clean EOF between records ends the stream.
            Err(_) => break,
        };

        match token {
            consts::TOKEN_FUNCTION => {
                let name = reader.read_cstr()?;
                artifact.functions.push(FunctionRecord {
                    name,
                    statements: Vec::new(),
                });
            }
            consts::TOKEN_STATEMENT => {
                let record = read_statement(reader)?;
                let function = artifact
                    .functions
                    .last_mut()
                    .ok_or_else(|| malformed_error!("statement before any function record"))?;
                function.statements.push(record);
            }
            consts::TOKEN_FILENAMES => {
                let count = reader.read_u32()?;
                for _ in 0..count {
                    let id = reader.read_u64()?;
                    let path = reader.read_cstr()?;
                    artifact.files.push((id, path));
                }
            }
            byte => {
                return Err(malformed_error!(
                    "unexpected token 0x{:02x} in static artifact",
                    byte
                ))
            }
        }
    }

    Ok(artifact)
}

fn read_statement<R: Read>(reader: &mut R) -> Result<StatementRecord> {
    let id = read_statement_id(reader)?;

    let succ_count = reader.read_u8()?;
    let mut successors = Vec::with_capacity(succ_count as usize);
    for _ in 0..succ_count {
        successors.push(read_statement_id(reader)?);
    }

    let has_def = reader.read_u8()?;
    let def = match has_def {
        0 => None,
        1 => Some(read_access(reader)?),
        byte => return Err(malformed_error!("invalid def marker 0x{:02x}", byte)),
    };

    let use_count = reader.read_u8()?;
    let mut uses = Vec::with_capacity(use_count as usize);
    for _ in 0..use_count {
        uses.push(read_access(reader)?);
    }

    let loc = LocRecord {
        file: reader.read_u64()?,
        begin_line: reader.read_u32()?,
        begin_col: reader.read_u32()?,
        end_line: reader.read_u32()?,
        end_col: reader.read_u32()?,
    };

    let metadata = StatementFlags::from_bits_retain(reader.read_u8()?);

    Ok(StatementRecord {
        id,
        successors,
        def,
        uses,
        loc,
        metadata,
    })
}

fn read_statement_id<R: Read>(reader: &mut R) -> Result<StatementId> {
    let file = reader.read_u64()?;
    let stmt = reader.read_u64()?;
    Ok(StatementId::new(file, stmt))
}

fn read_access<R: Read>(reader: &mut R) -> Result<AccessRecord> {
    match reader.read_u8()? {
        consts::TOKEN_VALUE_SCALAR => Ok(AccessRecord::Scalar(reader.read_u64()?)),
        consts::TOKEN_VALUE_STRUCTURAL => Ok(AccessRecord::Structural(
            Box::new(read_access(reader)?),
            Box::new(read_access(reader)?),
        )),
        consts::TOKEN_VALUE_ARRAY_LIKE => {
            let base = Box::new(read_access(reader)?);
            let count = reader.read_u32()?;
            let mut indices = Vec::with_capacity(count.min(1024) as usize);
            for _ in 0..count {
                indices.push(read_access(reader)?);
            }
            Ok(AccessRecord::ArrayLike(base, indices))
        }
        byte => Err(malformed_error!("invalid access tag 0x{:02x}", byte)),
    }
}

/// A value recorded in the execution trace.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceValue {
    /// The instrumenter could not encode the value's type.
    Unsupported,
    /// Signed 8-bit.
    I8(i8),
    /// Signed 16-bit.
    I16(i16),
    /// Signed 32-bit.
    I32(i32),
    /// Signed 64-bit.
    I64(i64),
    /// Unsigned 8-bit.
    U8(u8),
    /// Unsigned 16-bit.
    U16(u16),
    /// Unsigned 32-bit.
    U32(u32),
    /// Unsigned 64-bit.
    U64(u64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// Boolean.
    Bool(bool),
    /// Symbolic value of a dynamically-typed frontend.
    Named(String),
    /// Null/none value of a dynamically-typed frontend.
    Null,
}

/// One event from the execution trace.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// A statement was reached.
    Statement(StatementId),
    /// A test-case boundary.
    External(String),
    /// The value produced by the preceding statement.
    Data(TraceValue),
}

/// Parses an execution trace stream.
///
/// With `lenient` set, unknown tokens are skipped byte-by-byte and a torn
/// final record is dropped instead of failing, which matches what a trace
/// cut short by a crash looks like.
///
/// # Errors
///
/// [`Error::Malformed`] on bad magic, unknown tokens (strict mode) or
/// truncation mid-record (strict mode); [`Error::UnsupportedVersion`] for
/// version digits other than `1`.
pub fn read_trace<R: Read>(reader: &mut R, lenient: bool) -> Result<Vec<TraceEvent>> {
    let mut magic = [0u8; 7];
    reader
        .read_exact(&mut magic)
        .map_err(|_| malformed_error!("trace shorter than its magic"))?;
    if magic[..6] != consts::DYNAMIC_MAGIC[..] {
        return Err(malformed_error!("not an execution trace: bad magic"));
    }
    if magic[6] != consts::DYNAMIC_VERSION {
        return Err(Error::UnsupportedVersion(magic[6].wrapping_sub(b'0')));
    }

    let mut events = Vec::new();

    loop {
        let token = match reader.read_u8() {
            Ok(token) => token,
            Err(_) => break,
        };

        let event = match read_trace_event(reader, token) {
            Ok(Some(event)) => event,
            Ok(None) => {
                if lenient {
                    continue;
                }
                return Err(malformed_error!("unexpected trace token 0x{:02x}", token));
            }
            Err(err) => {
                if lenient {
                    // Torn record at the end of a crashed run.
                    break;
                }
                return Err(err);
            }
        };
        events.push(event);
    }

    Ok(events)
}

fn read_trace_event<R: Read>(reader: &mut R, token: u8) -> Result<Option<TraceEvent>> {
    let event = match token {
        consts::TOKEN_STATEMENT => TraceEvent::Statement(read_statement_id(reader)?),
        consts::TOKEN_EXTERNAL => TraceEvent::External(reader.read_cstr()?),
        consts::TOKEN_DATA_UNSUPPORTED => TraceEvent::Data(TraceValue::Unsupported),
        consts::TOKEN_DATA_I8 => TraceEvent::Data(TraceValue::I8(reader.read_i8()?)),
        consts::TOKEN_DATA_I16 => TraceEvent::Data(TraceValue::I16(reader.read_i16()?)),
        consts::TOKEN_DATA_I32 => TraceEvent::Data(TraceValue::I32(reader.read_i32()?)),
        consts::TOKEN_DATA_I64 => TraceEvent::Data(TraceValue::I64(reader.read_i64()?)),
        consts::TOKEN_DATA_U8 => TraceEvent::Data(TraceValue::U8(reader.read_u8()?)),
        consts::TOKEN_DATA_U16 => TraceEvent::Data(TraceValue::U16(reader.read_u16()?)),
        consts::TOKEN_DATA_U32 => TraceEvent::Data(TraceValue::U32(reader.read_u32()?)),
        consts::TOKEN_DATA_U64 => TraceEvent::Data(TraceValue::U64(reader.read_u64()?)),
        consts::TOKEN_DATA_F32 => TraceEvent::Data(TraceValue::F32(reader.read_f32()?)),
        consts::TOKEN_DATA_F64 => TraceEvent::Data(TraceValue::F64(reader.read_f64()?)),
        consts::TOKEN_DATA_BOOL => TraceEvent::Data(TraceValue::Bool(reader.read_u8()? > 0)),
        consts::TOKEN_DATA_NAMED => TraceEvent::Data(TraceValue::Named(reader.read_cstr()?)),
        consts::TOKEN_DATA_NULL => TraceEvent::Data(TraceValue::Null),
        _ => return Ok(None),
    };
    Ok(Some(event))
}
