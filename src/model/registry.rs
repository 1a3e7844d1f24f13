//! Object-type registry
//!
//! Maps a wire tag to the descriptor that knows how to read that payload
//! from structured text and from the binary stream. Registering a payload
//! variant means adding a row here; call sites only go through
//! [`resolve`] and [`descriptor`].

use serde_json::Value;

use super::collaboration::Collaboration;
use super::{ObjectData, ObjectType};
use crate::error::Result;
use crate::stream::{StreamInput, StreamResult};

pub type TextParser = fn(&Value) -> Result<ObjectData>;
pub type BinaryReader = fn(&mut StreamInput) -> StreamResult<ObjectData>;

/// Parsing entry points for one payload variant
#[derive(Debug)]
pub struct TypeDescriptor {
    pub object_type: ObjectType,
    pub tag: &'static str,
    pub parse: TextParser,
    pub read: BinaryReader,
}

// Rows are ordered by ordinal.
static REGISTRY: &[TypeDescriptor] = &[TypeDescriptor {
    object_type: ObjectType::Collaboration,
    tag: "collaboration",
    parse: Collaboration::parse_object_data,
    read: Collaboration::read_object_data,
}];

/// Descriptor for a wire tag; unknown tags are not payloads
pub fn resolve(tag: &str) -> Option<&'static TypeDescriptor> {
    REGISTRY.iter().find(|d| d.tag == tag)
}

pub fn descriptor(object_type: ObjectType) -> &'static TypeDescriptor {
    &REGISTRY[object_type.ordinal() as usize]
}

pub(crate) fn by_ordinal(ordinal: u32) -> Option<&'static TypeDescriptor> {
    REGISTRY.get(ordinal as usize)
}
