//! # XFS ⇄ JSON codec
//!
//! Encodes and decodes MT Framework `XFS` binary containers and projects them
//! losslessly to and from a self-describing JSON document. See
//! [`codec::decode`]/[`codec::encode`] for the binary direction and
//! [`json::to_json`]/[`json::from_json`] for the JSON direction;
//! [`orchestrator`] drives both from a CLI-facing `(input, output)` pair.

mod codec;
mod cursor;
mod document;
mod error;
mod json;
mod model;
mod orchestrator;
mod schema;

pub use codec::{decode, encode};
pub use document::{PropType, HEADER_MAGIC, HEADER_SIZE};
pub use error::{Error, Result};
pub use json::{from_json, to_json};
pub use model::{Data, Definition, Document, Field, FieldValue, Object, PropertyDef};
pub use orchestrator::{convert_path, Direction};
