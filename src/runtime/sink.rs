//! The trace token stream writer.

use std::io::Write;

use crate::artifact::consts;
use crate::artifact::WriteExt;
use crate::Result;

/// Writes execution-trace records to any sink.
///
/// Every record is `<token byte><payload>`; integers are little-endian. Each
/// record is flushed immediately so the stream stays usable after a crash.
/// The header is not written implicitly — the process-wide runtime emits it
/// when it opens the file, and bare consumers can call
/// [`TraceSink::write_header`] themselves.
#[derive(Debug)]
pub struct TraceSink<W: Write> {
    inner: W,
}

impl<W: Write> TraceSink<W> {
    /// Wraps a sink. No bytes are written.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Consumes the sink, returning the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes the stream header: the format magic and version digit.
    pub fn write_header(&mut self) -> Result<()> {
        self.inner.write_all(consts::DYNAMIC_MAGIC)?;
        self.inner.write_u8(consts::DYNAMIC_VERSION)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records that the statement `(file, stmt)` was reached.
    pub fn statement(&mut self, file: u64, stmt: u64) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_STATEMENT)?;
        self.inner.write_u64(file)?;
        self.inner.write_u64(stmt)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a test-case boundary.
    pub fn external(&mut self, name: &str) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_EXTERNAL)?;
        self.inner.write_cstr(name)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced value of a type the instrumenter cannot encode.
    pub fn data_unsupported(&mut self) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_UNSUPPORTED)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `i8`.
    pub fn data_i8(&mut self, value: i8) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_I8)?;
        self.inner.write_i8(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `i16`.
    pub fn data_i16(&mut self, value: i16) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_I16)?;
        self.inner.write_i16(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `i32`.
    pub fn data_i32(&mut self, value: i32) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_I32)?;
        self.inner.write_i32(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `i64`.
    pub fn data_i64(&mut self, value: i64) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_I64)?;
        self.inner.write_i64(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `u8`.
    pub fn data_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_U8)?;
        self.inner.write_u8(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `u16`.
    pub fn data_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_U16)?;
        self.inner.write_u16(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `u32`.
    pub fn data_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_U32)?;
        self.inner.write_u32(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `u64`.
    pub fn data_u64(&mut self, value: u64) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_U64)?;
        self.inner.write_u64(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `f32`.
    pub fn data_f32(&mut self, value: f32) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_F32)?;
        self.inner.write_f32(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced `f64`.
    pub fn data_f64(&mut self, value: f64) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_F64)?;
        self.inner.write_f64(value)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced boolean.
    pub fn data_bool(&mut self, value: bool) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_BOOL)?;
        self.inner.write_u8(u8::from(value))?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced symbolic value.
    pub fn data_named(&mut self, name: &str) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_NAMED)?;
        self.inner.write_cstr(name)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Records a produced null value.
    pub fn data_null(&mut self) -> Result<()> {
        self.inner.write_u8(consts::TOKEN_DATA_NULL)?;
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_byte_stream() {
        let mut sink = TraceSink::new(Vec::new());
        sink.write_header().unwrap();
        sink.external("t1").unwrap();
        sink.statement(7, 3).unwrap();
        sink.data_i32(42).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"AARD/D");
        expected.push(0x31);
        expected.push(0xfe);
        expected.extend_from_slice(b"t1\0");
        expected.push(0xff);
        expected.extend_from_slice(&7u64.to_le_bytes());
        expected.extend_from_slice(&3u64.to_le_bytes());
        expected.push(0x13);
        expected.extend_from_slice(&42i32.to_le_bytes());

        assert_eq!(sink.into_inner(), expected);
    }

    #[test]
    fn test_value_tokens() {
        let mut sink = TraceSink::new(Vec::new());
        sink.write_header().unwrap();
        sink.data_bool(true).unwrap();
        sink.data_u16(0x0102).unwrap();
        sink.data_f64(1.5).unwrap();
        sink.data_named("obj").unwrap();
        sink.data_null().unwrap();
        sink.data_unsupported().unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"AARD/D1");
        expected.extend_from_slice(&[0x21, 0x01]);
        expected.extend_from_slice(&[0x16, 0x02, 0x01]);
        expected.push(0x20);
        expected.extend_from_slice(&1.5f64.to_le_bytes());
        expected.push(0x28);
        expected.extend_from_slice(b"obj\0");
        expected.push(0x29);
        expected.push(0x10);

        assert_eq!(sink.into_inner(), expected);
    }
}
