//! Version 16, 32-bit offset schema layout.
//!
//! Def header (8 bytes): `dti_hash:u32 | prop_count:15 | _:17` — no `init`
//! bit in this layout. Property record (40 bytes): `name_offset:u32 | type:u8
//! | attr:u8 | bytes:15 | disable:1 | pad:u64×4`.
//!
//! Matches the MT Framework engine's `arch_32` struct layout.

use std::convert::TryInto;
use std::rc::Rc;

use super::SchemaLayout;
use crate::cursor::{read_cstring, read_u16, read_u32, read_u8, Writer};
use crate::document::PropType;
use crate::error::{Error, Result};
use crate::model::{Definition, PropertyDef};

pub struct V16;

impl SchemaLayout for V16 {
    const OFFSET_WIDTH: usize = 4;
    const HEADER_BYTES: usize = 8;
    const PROP_RECORD_BYTES: usize = 40;

    fn decode(block: &[u8], def_count: usize) -> Result<Vec<Definition>> {
        if block.len() < 4 * def_count {
            return Err(Error::SchemaOverflow(format!(
                "def_size {} too small for {} v16 offset-table entries",
                block.len(),
                def_count
            )));
        }

        let mut defs = Vec::with_capacity(def_count);
        for i in 0..def_count {
            let (offset, _) = read_u32(block, i * 4)?;
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
                    "v16 definition header at {} overruns {}-byte schema block",
                    offset,
                    block.len()
                )));
            }

            let (dti_hash, _) = read_u32(block, offset)?;
            let (prop_count_with_padding, _) = read_u32(block, offset + 4)?;
            let prop_count = (prop_count_with_padding & 0x7FFF) as usize;
            let raw_header = block[offset..offset + Self::HEADER_BYTES].to_vec();

            let mut props = Vec::with_capacity(prop_count);
            for j in 0..prop_count {
                let prop_offset = offset + Self::HEADER_BYTES + j * Self::PROP_RECORD_BYTES;
                if prop_offset + Self::PROP_RECORD_BYTES > block.len() {
                    return Err(Error::SchemaOverflow(format!(
                        "v16 property record {} of definition at {} overruns schema block",
                        j, offset
                    )));
                }

                let (name_offset, _) = read_u32(block, prop_offset)?;
                let (name, _) = read_cstring(block, name_offset as usize, block.len().saturating_sub(name_offset as usize))?;
                let (tag, _) = read_u8(block, prop_offset + 4)?;
                let (attr, _) = read_u8(block, prop_offset + 5)?;
                let (bytes_disable, _) = read_u16(block, prop_offset + 6)?;

                let prop_type = PropType::from_u32(tag as u32).ok_or(Error::UnsupportedType(tag as u32))?;
                props.push(PropertyDef {
                    name: Rc::from(name.as_str()),
                    prop_type,
                    attr,
                    bytes: bytes_disable & 0x7FFF,
                    disable: (bytes_disable >> 15) & 1 != 0,
                });
            }

            defs.push(Definition { dti_hash, init: false, raw_header: Some(raw_header), props });
        }

        Ok(defs)
    }

    fn encode(defs: &[Definition]) -> Vec<u8> {
        let total = Self::encoded_size(defs, true);
        let mut w = Writer::with_capacity_zeroed(total);

        let offset_slots: Vec<usize> = (0..defs.len()).map(|_| w.write_zeros(4)).collect();
        let mut string_offset = Self::encoded_size(defs, false);

        for (i, def) in defs.iter().enumerate() {
            w.set_u32(offset_slots[i], w.tell() as u32);
            w.write_bytes(&header_bytes(def));

            for prop in &def.props {
                let name_bytes = prop.name.as_bytes();
                let length = name_bytes.len() + 1;

                w.write_u32(string_offset as u32);
                w.write_at(string_offset, name_bytes);
                w.write_at(string_offset + name_bytes.len(), &[0]);
                string_offset += length;

                w.write_u8(prop.prop_type as u8);
                w.write_u8(prop.attr);
                let bytes_disable = (prop.bytes & 0x7FFF) | ((prop.disable as u16) << 15);
                w.write_u16(bytes_disable);
                w.write_u64(0);
                w.write_u64(0);
                w.write_u64(0);
                w.write_u64(0);
            }
        }

        w.into_bytes()
    }
}

/// Builds the 8-byte header blob, preserving decoded padding bits while
/// keeping `dti_hash`/`prop_count` authoritative from the `Definition`.
fn header_bytes(def: &Definition) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    if let Some(raw) = &def.raw_header {
        let n = raw.len().min(8);
        bytes[..n].copy_from_slice(&raw[..n]);
    }
    bytes[0..4].copy_from_slice(&def.dti_hash.to_le_bytes());
    let existing_word = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let padding = existing_word & !0x7FFF;
    let packed = (def.props.len() as u32 & 0x7FFF) | padding;
    bytes[4..8].copy_from_slice(&packed.to_le_bytes());
    bytes
}
