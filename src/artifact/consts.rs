//! Binary format constants shared by the writers and readers.
//!
//! Both artifacts open with a 7-byte magic: the format tag (`AARD/S` for the
//! static statement data, `AARD/D` for the runtime trace) followed by an
//! ASCII version digit. All integer payloads are little-endian.

/// Magic prefix of the static artifact, version included.
pub const STATIC_MAGIC: &[u8; 7] = b"AARD/S1";

/// Magic prefix of the dynamic trace, without the version digit.
pub const DYNAMIC_MAGIC: &[u8; 6] = b"AARD/D";

/// Version digit written after [`DYNAMIC_MAGIC`].
pub const DYNAMIC_VERSION: u8 = b'1';

/// Statement record marker (both formats).
pub const TOKEN_STATEMENT: u8 = 0xff;
/// Function-name record marker (static format).
pub const TOKEN_FUNCTION: u8 = 0xfe;
/// Test-boundary marker (dynamic format; same byte as [`TOKEN_FUNCTION`],
/// disambiguated by the stream kind).
pub const TOKEN_EXTERNAL: u8 = 0xfe;
/// Filename-table trailer marker (static format).
pub const TOKEN_FILENAMES: u8 = 0xfd;

/// Scalar access node.
pub const TOKEN_VALUE_SCALAR: u8 = 0xe0;
/// Structural (field selection) access node.
pub const TOKEN_VALUE_STRUCTURAL: u8 = 0xe1;
/// Array-like (subscript) access node.
pub const TOKEN_VALUE_ARRAY_LIKE: u8 = 0xe2;

/// Traced value of a type the instrumenter cannot encode.
pub const TOKEN_DATA_UNSUPPORTED: u8 = 0x10;
/// Traced `i8` value.
pub const TOKEN_DATA_I8: u8 = 0x11;
/// Traced `i16` value.
pub const TOKEN_DATA_I16: u8 = 0x12;
/// Traced `i32` value.
pub const TOKEN_DATA_I32: u8 = 0x13;
/// Traced `i64` value.
pub const TOKEN_DATA_I64: u8 = 0x14;
/// Traced `u8` value.
pub const TOKEN_DATA_U8: u8 = 0x15;
/// Traced `u16` value.
pub const TOKEN_DATA_U16: u8 = 0x16;
/// Traced `u32` value.
pub const TOKEN_DATA_U32: u8 = 0x17;
/// Traced `u64` value.
pub const TOKEN_DATA_U64: u8 = 0x18;
/// Traced `f32` value.
pub const TOKEN_DATA_F32: u8 = 0x19;
/// Traced `f64` value.
pub const TOKEN_DATA_F64: u8 = 0x20;
/// Traced boolean value.
pub const TOKEN_DATA_BOOL: u8 = 0x21;
/// Traced named (symbolic) value, for dynamically-typed frontends.
pub const TOKEN_DATA_NAMED: u8 = 0x28;
/// Traced null/none value, for dynamically-typed frontends.
pub const TOKEN_DATA_NULL: u8 = 0x29;
