//! Collaboration document model
//!
//! A stored document is a [`CollaborationObjectDoc`] envelope wrapping one
//! payload variant of [`ObjectData`]. The payload's wire key is its type tag,
//! resolved through the [`registry`].

pub mod collaboration;
pub mod envelope;
pub(crate) mod fields;
pub mod registry;

pub use collaboration::{Collaboration, CollaborationDataType};
pub use envelope::{CollaborationObjectDoc, TextOptions};
pub use registry::{resolve, TypeDescriptor};

use serde_json::Value;

use crate::stream::{StreamError, StreamInput, StreamOutput, StreamResult, Writeable};

/// Wire field names shared by envelopes, requests and responses
pub mod tag {
    pub const COLLABORATION_ID_FIELD: &str = "collaborationId";
    pub const UPDATED_TIME_FIELD: &str = "lastUpdatedTimeMs";
    pub const CREATED_TIME_FIELD: &str = "createdTimeMs";
    pub const TENANT_FIELD: &str = "tenant";
    pub const ACCESS_LIST_FIELD: &str = "access";
    pub const COLLABORATION_OBJECT_ID_FIELD: &str = "collaborationObjectId";
    /// Reported when no registered payload key is present
    pub const OBJECT_DATA_FIELD: &str = "objectData";
}

/// Discriminator selecting the payload schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Collaboration = 0,
}

impl ObjectType {
    /// Wire tag the payload is keyed under
    pub fn tag(self) -> &'static str {
        registry::descriptor(self).tag
    }

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn from_ordinal(ordinal: u32) -> StreamResult<Self> {
        registry::by_ordinal(ordinal)
            .map(|d| d.object_type)
            .ok_or(StreamError::UnknownOrdinal {
                kind: "object type",
                ordinal,
            })
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        registry::resolve(tag).map(|d| d.object_type)
    }

    /// Read the optional payload that follows a type ordinal on the wire
    pub fn read_optional_object_data(self, input: &mut StreamInput) -> StreamResult<Option<ObjectData>> {
        if input.read_bool()? {
            (registry::descriptor(self).read)(input).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Polymorphic payload of a collaboration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectData {
    Collaboration(Collaboration),
}

impl ObjectData {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Collaboration(_) => ObjectType::Collaboration,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Collaboration(c) => c.to_value(),
        }
    }
}

impl Writeable for ObjectData {
    fn write_to(&self, out: &mut StreamOutput) {
        match self {
            Self::Collaboration(c) => c.write_to(out),
        }
    }
}

impl From<Collaboration> for ObjectData {
    fn from(c: Collaboration) -> Self {
        Self::Collaboration(c)
    }
}

/// Write the type ordinal twice followed by the optional payload.
///
/// The duplicated ordinal is part of the transport format: readers consume
/// both and pick the payload reader from the second.
pub(crate) fn write_typed_object_data(out: &mut StreamOutput, object_data: &ObjectData) {
    let ordinal = object_data.object_type().ordinal();
    out.write_enum(ordinal);
    out.write_enum(ordinal);
    out.write_optional_writeable(Some(object_data));
}

/// Counterpart of [`write_typed_object_data`]
pub(crate) fn read_typed_object_data(input: &mut StreamInput) -> StreamResult<ObjectData> {
    let first = input.read_enum()?;
    let second = input.read_enum()?;
    if first != second {
        return Err(StreamError::TypeMismatch { first, second });
    }
    ObjectType::from_ordinal(second)?
        .read_optional_object_data(input)?
        .ok_or(StreamError::MissingPayload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_and_ordinal() {
        assert_eq!(ObjectType::Collaboration.tag(), "collaboration");
        assert_eq!(ObjectType::from_tag("collaboration"), Some(ObjectType::Collaboration));
        assert_eq!(ObjectType::from_tag("notebook"), None);
        assert_eq!(ObjectType::from_ordinal(0).unwrap(), ObjectType::Collaboration);
        assert!(ObjectType::from_ordinal(7).is_err());
    }

    #[test]
    fn test_typed_payload_disagreeing_ordinals() {
        let mut out = StreamOutput::new();
        out.write_enum(0);
        out.write_enum(1);
        let mut input = StreamInput::new(out.freeze());
        assert_eq!(
            read_typed_object_data(&mut input),
            Err(StreamError::TypeMismatch { first: 0, second: 1 })
        );
    }

    #[test]
    fn test_typed_payload_absent() {
        let mut out = StreamOutput::new();
        out.write_enum(0);
        out.write_enum(0);
        out.write_bool(false);
        let mut input = StreamInput::new(out.freeze());
        assert_eq!(read_typed_object_data(&mut input), Err(StreamError::MissingPayload));
    }
}
