//! # Schema block codec.
//!
//! The schema block immediately follows the header and holds the offset
//! table, the definition records, and the property-name string pool.
//! Two bit-exact on-disk layouts exist, selected by `major_version`: version
//! 15 with 64-bit offsets and version 16 with 32-bit offsets. Both share the
//! [`SchemaLayout`] interface so a third `(version, width)` pair could be
//! added without touching the value codec.

mod v15;
mod v16;

pub use v15::V15;
pub use v16::V16;

use crate::error::{Error, Result};
use crate::model::Definition;

/// Decode/encode the definition block for one `(major_version, pointer-width)` pair.
pub trait SchemaLayout {
    /// Bytes per offset-table entry: 8 for v15, 4 for v16.
    const OFFSET_WIDTH: usize;
    /// Bytes in a definition's fixed header: 16 for v15, 8 for v16.
    const HEADER_BYTES: usize;
    /// Bytes in one property record: 80 for v15, 40 for v16.
    const PROP_RECORD_BYTES: usize;

    /// Decodes `def_count` definitions from a schema block of exactly `def_size` bytes.
    fn decode(block: &[u8], def_count: usize) -> Result<Vec<Definition>>;

    /// Encodes `defs` into a freshly built schema block.
    fn encode(defs: &[Definition]) -> Vec<u8>;

    /// The schema block's exact byte length; `include_strings = false` gives
    /// the offset at which the string pool begins.
    fn encoded_size(defs: &[Definition], include_strings: bool) -> usize {
        let mut size = Self::OFFSET_WIDTH * defs.len();
        for def in defs {
            size += Self::HEADER_BYTES + Self::PROP_RECORD_BYTES * def.props.len();
        }
        if !include_strings {
            return size;
        }
        let string_bytes: usize = defs
            .iter()
            .flat_map(|d| d.props.iter())
            .map(|p| p.name.len() + 1)
            .sum();
        (size + string_bytes + 3) & !3
    }
}

/// Selects the schema layout for a decoded or constructed document's major version.
pub fn decode_schema(major_version: u16, block: &[u8], def_count: usize) -> Result<Vec<Definition>> {
    match major_version {
        15 => V15::decode(block, def_count),
        16 => V16::decode(block, def_count),
        other => Err(Error::UnsupportedVersion(other)),
    }
}

pub fn encode_schema(major_version: u16, defs: &[Definition]) -> Result<Vec<u8>> {
    match major_version {
        15 => Ok(V15::encode(defs)),
        16 => Ok(V16::encode(defs)),
        other => Err(Error::UnsupportedVersion(other)),
    }
}

pub fn encoded_schema_size(major_version: u16, defs: &[Definition], include_strings: bool) -> Result<usize> {
    match major_version {
        15 => Ok(V15::encoded_size(defs, include_strings)),
        16 => Ok(V16::encoded_size(defs, include_strings)),
        other => Err(Error::UnsupportedVersion(other)),
    }
}
