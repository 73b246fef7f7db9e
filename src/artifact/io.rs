//! Little-endian primitives shared by the artifact writers and readers.

use std::io::{Read, Write};

use crate::Result;

macro_rules! write_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a little-endian `", stringify!($ty), "`.")]
            fn $name(&mut self, value: $ty) -> Result<()> {
                self.write_all(&value.to_le_bytes())?;
                Ok(())
            }
        )*
    };
}

macro_rules! read_le {
    ($($name:ident: $ty:ty = $n:expr),* $(,)?) => {
        $(
            #[doc = concat!("Reads a little-endian `", stringify!($ty), "`.")]
            fn $name(&mut self) -> Result<$ty> {
                let mut buf = [0u8; $n];
                self.read_exact(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        )*
    };
}

/// Little-endian write helpers for artifact emission.
pub(crate) trait WriteExt: Write {
    write_le! {
        write_u8: u8,
        write_u32: u32,
        write_u64: u64,
        write_i8: i8,
        write_i16: i16,
        write_i32: i32,
        write_i64: i64,
        write_u16: u16,
        write_f32: f32,
        write_f64: f64,
    }

    /// Writes a zero-terminated string.
    fn write_cstr(&mut self, value: &str) -> Result<()> {
        self.write_all(value.as_bytes())?;
        self.write_all(&[0])?;
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteExt for W {}

/// Little-endian read helpers for artifact parsing.
pub(crate) trait ReadExt: Read {
    read_le! {
        read_u8: u8 = 1,
        read_u16: u16 = 2,
        read_u32: u32 = 4,
        read_u64: u64 = 8,
        read_i8: i8 = 1,
        read_i16: i16 = 2,
        read_i32: i32 = 4,
        read_i64: i64 = 8,
        read_f32: f32 = 4,
        read_f64: f64 = 8,
    }

    /// Reads bytes up to (and consuming) a zero terminator.
    fn read_cstr(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        String::from_utf8(bytes).map_err(|err| malformed_error!("invalid utf-8 string: {}", err))
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_integers() {
        let mut buf = Vec::new();
        buf.write_u64(0x1122_3344_5566_7788).unwrap();
        buf.write_u32(7).unwrap();
        assert_eq!(&buf[..8], &[0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);

        let mut cursor = buf.as_slice();
        assert_eq!(cursor.read_u64().unwrap(), 0x1122_3344_5566_7788);
        assert_eq!(cursor.read_u32().unwrap(), 7);
    }

    #[test]
    fn test_cstr() {
        let mut buf = Vec::new();
        buf.write_cstr("t1").unwrap();
        assert_eq!(buf, b"t1\0");

        let mut cursor = buf.as_slice();
        assert_eq!(cursor.read_cstr().unwrap(), "t1");
    }

    #[test]
    fn test_cstr_missing_terminator() {
        let mut cursor: &[u8] = b"abc";
        assert!(cursor.read_cstr().is_err());
    }
}
