//! Version 15, 64-bit offset schema layout.
//!
//! Def header (16 bytes): `dti_hash:u32 | pad0:u32 | prop_count:15 | init:1 |
//! _:16 | pad1:u32`. Property record (80 bytes): `name_offset:u64 | type:u8 |
//! attr:u8 | bytes:15 | disable:1 | pad0:u32 | unknown:u64×8`.
//!
//! Matches the MT Framework engine's `arch_64` struct layout.

use std::convert::TryInto;
use std::rc::Rc;

use super::SchemaLayout;
use crate::cursor::{read_cstring, read_u16, read_u32, read_u64, read_u8, Writer};
use crate::document::PropType;
use crate::error::{Error, Result};
use crate::model::{Definition, PropertyDef};

pub struct V15;

impl SchemaLayout for V15 {
    const OFFSET_WIDTH: usize = 8;
    const HEADER_BYTES: usize = 16;
    const PROP_RECORD_BYTES: usize = 80;

    fn decode(block: &[u8], def_count: usize) -> Result<Vec<Definition>> {
        if block.len() < 8 * def_count {
            return Err(Error::SchemaOverflow(format!(
                "def_size {} too small for {} v15 offset-table entries",
                block.len(),
                def_count
            )));
        }

        let mut defs = Vec::with_capacity(def_count);
        for i in 0..def_count {
            let (offset, _) = read_u64(block, i * 8)?;
            if offset == 0 {
                defs.push(Definition {
                    dti_hash: 0,
                    init: false,
                    raw_header: Some(vec![0u8; Self::HEADER_BYTES]),
                    props: Vec::new(),
                });
                continue;
            }

            let offset = offset as usize;
            if offset + Self::HEADER_BYTES > block.len() {
                return Err(Error::SchemaOverflow(format!(
                    "v15 definition header at {} overruns {}-byte schema block",
                    offset,
                    block.len()
                )));
            }

            let (dti_hash, _) = read_u32(block, offset)?;
            let (prop_count_init, _) = read_u32(block, offset + 8)?;
            let prop_count = (prop_count_init & 0x7FFF) as usize;
            let init = (prop_count_init >> 15) & 1 != 0;
            let raw_header = block[offset..offset + Self::HEADER_BYTES].to_vec();

            let mut props = Vec::with_capacity(prop_count);
            for j in 0..prop_count {
                let prop_offset = offset + Self::HEADER_BYTES + j * Self::PROP_RECORD_BYTES;
                if prop_offset + Self::PROP_RECORD_BYTES > block.len() {
                    return Err(Error::SchemaOverflow(format!(
                        "v15 property record {} of definition at {} overruns schema block",
                        j, offset
                    )));
                }

                let (name_offset, _) = read_u64(block, prop_offset)?;
                let (name, _) = read_cstring(block, name_offset as usize, block.len().saturating_sub(name_offset as usize))?;
                let (tag, _) = read_u8(block, prop_offset + 8)?;
                let (attr, _) = read_u8(block, prop_offset + 9)?;
                let (bytes_disable, _) = read_u16(block, prop_offset + 10)?;

                let prop_type = PropType::from_u32(tag as u32).ok_or(Error::UnsupportedType(tag as u32))?;
                props.push(PropertyDef {
                    name: Rc::from(name.as_str()),
                    prop_type,
                    attr,
                    bytes: bytes_disable & 0x7FFF,
                    disable: (bytes_disable >> 15) & 1 != 0,
                });
            }

            defs.push(Definition { dti_hash, init, raw_header: Some(raw_header), props });
        }

        Ok(defs)
    }

    fn encode(defs: &[Definition]) -> Vec<u8> {
        let total = Self::encoded_size(defs, true);
        let mut w = Writer::with_capacity_zeroed(total);

        let offset_slots: Vec<usize> = (0..defs.len()).map(|_| w.write_zeros(8)).collect();
        let mut string_offset = Self::encoded_size(defs, false);

        for (i, def) in defs.iter().enumerate() {
            w.set_u64(offset_slots[i], w.tell() as u64);
            w.write_bytes(&header_bytes(def));

            for prop in &def.props {
                let name_bytes = prop.name.as_bytes();
                let length = name_bytes.len() + 1;

                w.write_u64(string_offset as u64);
                w.write_at(string_offset, name_bytes);
                w.write_at(string_offset + name_bytes.len(), &[0]);
                string_offset += length;

                w.write_u8(prop.prop_type as u8);
                w.write_u8(prop.attr);
                let bytes_disable = (prop.bytes & 0x7FFF) | ((prop.disable as u16) << 15);
                w.write_u16(bytes_disable);
                w.write_u32(0);
                for _ in 0..8 {
                    w.write_u64(0);
                }
            }
        }

        w.into_bytes()
    }
}

/// Builds the 16-byte header blob, preserving decoded padding bits while
/// keeping `dti_hash`/`prop_count`/`init` authoritative from the `Definition`.
fn header_bytes(def: &Definition) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    if let Some(raw) = &def.raw_header {
        let n = raw.len().min(16);
        bytes[..n].copy_from_slice(&raw[..n]);
    }
    bytes[0..4].copy_from_slice(&def.dti_hash.to_le_bytes());
    let existing_word = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    let padding = existing_word & !0x_FFFF;
    let packed = (def.props.len() as u32 & 0x7FFF) | ((def.init as u32) << 15) | padding;
    bytes[8..12].copy_from_slice(&packed.to_le_bytes());
    bytes
}
