//! Binary reader/writer primitives shared by the schema and value codecs.
//!
//! Reads are absolute-offset re-slices of the whole input rather than a
//! mutable cursor: every read function re-derives its starting slice from
//! `(input, at)` instead of mutating a shared position. There is no prefetch
//! buffer to invalidate on "seek", because the whole file is resident and a
//! seek is just a different offset passed to the next read.

use nom::bytes::complete::take;
use nom::number::complete::{le_f32, le_f64, le_i16, le_i32, le_i64, le_i8, le_u16, le_u32, le_u64, le_u8};
use nom::IResult;

use crate::error::{Error, Result};

/// The sub-slice of `input` starting at absolute offset `at`.
pub fn slice_at(input: &[u8], at: usize) -> Result<&[u8]> {
    input.get(at..).ok_or_else(|| {
        Error::TruncatedValue(format!("offset {} past end of input ({} bytes)", at, input.len()))
    })
}

/// Runs a nom parser at an absolute offset, returning the parsed value and
/// the offset of the first byte after it.
fn read_with<'a, O>(
    input: &'a [u8],
    at: usize,
    parser: impl FnOnce(&'a [u8]) -> IResult<&'a [u8], O>,
    what: &str,
) -> Result<(O, usize)> {
    let data = slice_at(input, at)?;
    let (rest, value) = parser(data).map_err(|_| Error::TruncatedValue(what.to_string()))?;
    Ok((value, at + (data.len() - rest.len())))
}

macro_rules! scalar_reader {
    ($name:ident, $parser:path, $ty:ty) => {
        pub fn $name(input: &[u8], at: usize) -> Result<($ty, usize)> {
            read_with(input, at, $parser, stringify!($name))
        }
    };
}

scalar_reader!(read_u8, le_u8, u8);
scalar_reader!(read_u16, le_u16, u16);
scalar_reader!(read_u32, le_u32, u32);
scalar_reader!(read_u64, le_u64, u64);
scalar_reader!(read_s8, le_i8, i8);
scalar_reader!(read_s16, le_i16, i16);
scalar_reader!(read_s32, le_i32, i32);
scalar_reader!(read_s64, le_i64, i64);
scalar_reader!(read_f32, le_f32, f32);
scalar_reader!(read_f64, le_f64, f64);

pub fn read_bool(input: &[u8], at: usize) -> Result<(bool, usize)> {
    let (value, next) = read_u8(input, at)?;
    Ok((value != 0, next))
}

pub fn read_bytes(input: &[u8], at: usize, n: usize) -> Result<(&[u8], usize)> {
    read_with(input, at, take(n), "fixed-size byte block")
}

/// Reads a NUL-terminated string, never inspecting more than `max` bytes
/// (including the terminator). Fails if no terminator is found in bounds —
/// never writing past a caller-supplied bound.
pub fn read_cstring(input: &[u8], at: usize, max: usize) -> Result<(String, usize)> {
    let data = slice_at(input, at)?;
    let bound = data.len().min(max);
    match data[..bound].iter().position(|&b| b == 0) {
        Some(nul) => Ok((String::from_utf8_lossy(&data[..nul]).into_owned(), at + nul + 1)),
        None => Err(Error::TruncatedValue(format!(
            "string exceeded {}-byte bound with no NUL terminator",
            max
        ))),
    }
}

/// A growable output buffer supporting back-patching of already-written
/// bytes at an earlier absolute offset — the in-memory equivalent of
/// `binary_writer_set_u32`/`binary_writer_write_at`.
/// `pos` is the logical write cursor, distinct from `buf.len()`: a sequential
/// write at `pos == buf.len()` grows the buffer (the common case, building a
/// document up as it is encoded); a sequential write at `pos < buf.len()`
/// overwrites in place. This lets the same type serve both the top-level
/// document writer (grows as it goes) and a schema block writer pre-sized to
/// its final `def_size` up front — allocate the whole arena, then fill it —
/// without a second writer implementation.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
    pos: usize,
}

impl Writer {
    pub fn new() -> Self {
        Writer { buf: Vec::new(), pos: 0 }
    }

    /// Pre-sizes the buffer to `n` zero bytes; the write cursor still starts at 0.
    pub fn with_capacity_zeroed(n: usize) -> Self {
        Writer { buf: vec![0u8; n], pos: 0 }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.put(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_cstring(&mut self, value: &str) {
        self.put(value.as_bytes());
        self.put(&[0]);
    }

    /// Appends `n` zero bytes and returns the offset of the first one —
    /// used for size and offset-table placeholders that are back-patched
    /// once their real value is known.
    pub fn write_zeros(&mut self, n: usize) -> usize {
        let at = self.tell();
        self.put(&vec![0u8; n]);
        at
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_u64(&mut self, offset: usize, value: u64) {
        self.buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Writes `bytes` at an absolute offset, growing the buffer if `offset`
    /// is beyond any position reached so far — used for the schema encoder's
    /// out-of-band string-pool writes, which always target an offset ahead
    /// of the current sequential cursor.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[offset..end].copy_from_slice(bytes);
    }
}

macro_rules! scalar_writer {
    ($name:ident, $ty:ty) => {
        impl Writer {
            pub fn $name(&mut self, value: $ty) {
                self.put(&value.to_le_bytes());
            }
        }
    };
}

scalar_writer!(write_u16, u16);
scalar_writer!(write_u32, u32);
scalar_writer!(write_u64, u64);
scalar_writer!(write_s8, i8);
scalar_writer!(write_s16, i16);
scalar_writer!(write_s32, i32);
scalar_writer!(write_s64, i64);
scalar_writer!(write_f32, f32);
scalar_writer!(write_f64, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_le() {
        let (value, next) = read_u32(&[0x78, 0x56, 0x34, 0x12, 0xFF], 0).unwrap();
        assert_eq!(value, 0x1234_5678);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_read_cstring_stops_at_nul() {
        let (value, next) = read_cstring(b"hello\0world", 0, 512).unwrap();
        assert_eq!(value, "hello");
        assert_eq!(next, 6);
    }

    #[test]
    fn test_read_cstring_overrun_errors() {
        let data = vec![b'a'; 8];
        assert!(read_cstring(&data, 0, 8).is_err());
    }

    #[test]
    fn test_writer_back_patch() {
        let mut w = Writer::new();
        let placeholder = w.write_zeros(4);
        w.write_cstring("hi");
        w.set_u32(placeholder, w.tell() as u32);
        let bytes = w.into_bytes();
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 7);
    }
}
