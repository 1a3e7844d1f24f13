//! Versioned document envelope stored in the collaborations index

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::info;

use super::tag::*;
use super::{fields, read_typed_object_data, registry, write_typed_object_data, ObjectData, ObjectType};
use crate::access::DEFAULT_TENANT;
use crate::error::{Error, Result};
use crate::stream::{StreamInput, StreamOutput, StreamResult, Writeable};

/// Which optional fields to emit when serializing to structured text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    /// Emit the collaboration id; hidden by default because the store keys
    /// documents by it already
    pub include_id: bool,
    /// Emit the access list (only when non-empty)
    pub include_access: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            include_id: false,
            include_access: true,
        }
    }
}

impl TextOptions {
    pub fn full() -> Self {
        Self {
            include_id: true,
            include_access: true,
        }
    }
}

/// A collaboration document with its tenant, access list and timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaborationObjectDoc {
    pub collaboration_id: String,
    pub updated_time: DateTime<Utc>,
    pub created_time: DateTime<Utc>,
    pub tenant: String,
    /// "User:<name>", "Role:<name>", "BERole:<name>"
    pub access: Vec<String>,
    pub object_data: ObjectData,
}

impl CollaborationObjectDoc {
    pub fn object_type(&self) -> ObjectType {
        self.object_data.object_type()
    }

    /// Parse a stored or transported document.
    ///
    /// `use_id` supplies the id when the caller already knows it (for
    /// example from a store hit); an explicit `collaborationId` field
    /// still wins.
    pub fn parse(value: &Value, use_id: Option<&str>) -> Result<Self> {
        let object = fields::expect_object(value, "document")?;

        let mut collaboration_id = use_id.map(str::to_string);
        let mut updated_time = None;
        let mut created_time = None;
        let mut tenant = None;
        let mut access = Vec::new();
        let mut object_data = None;

        for (name, field) in object {
            match name.as_str() {
                COLLABORATION_ID_FIELD => {
                    if let Some(id) = fields::string(name, field)? {
                        collaboration_id = Some(id);
                    }
                }
                UPDATED_TIME_FIELD => updated_time = fields::epoch_millis(name, field)?,
                CREATED_TIME_FIELD => created_time = fields::epoch_millis(name, field)?,
                TENANT_FIELD => tenant = fields::string(name, field)?,
                ACCESS_LIST_FIELD => access = fields::string_list(name, field)?.unwrap_or_default(),
                _ => match registry::resolve(name) {
                    Some(descriptor) if object_data.is_none() => {
                        object_data = Some((descriptor.parse)(field)?);
                    }
                    _ => info!("Unexpected field: {}, while parsing CollaborationObjectDoc", name),
                },
            }
        }

        Ok(Self {
            collaboration_id: collaboration_id.ok_or_else(|| Error::missing(COLLABORATION_ID_FIELD))?,
            updated_time: updated_time.ok_or_else(|| Error::missing(UPDATED_TIME_FIELD))?,
            created_time: created_time.ok_or_else(|| Error::missing(CREATED_TIME_FIELD))?,
            tenant: tenant.unwrap_or_else(|| DEFAULT_TENANT.to_string()),
            access,
            object_data: object_data.ok_or_else(|| Error::missing(OBJECT_DATA_FIELD))?,
        })
    }

    pub fn to_value(&self, options: TextOptions) -> Value {
        let mut object = Map::new();
        if options.include_id {
            object.insert(
                COLLABORATION_ID_FIELD.into(),
                Value::from(self.collaboration_id.as_str()),
            );
        }
        object.insert(
            UPDATED_TIME_FIELD.into(),
            Value::from(self.updated_time.timestamp_millis()),
        );
        object.insert(
            CREATED_TIME_FIELD.into(),
            Value::from(self.created_time.timestamp_millis()),
        );
        object.insert(TENANT_FIELD.into(), Value::from(self.tenant.as_str()));
        if options.include_access && !self.access.is_empty() {
            object.insert(ACCESS_LIST_FIELD.into(), Value::from(self.access.clone()));
        }
        object.insert(self.object_type().tag().into(), self.object_data.to_value());
        Value::Object(object)
    }

    pub fn read_from(input: &mut StreamInput) -> StreamResult<Self> {
        Ok(Self {
            collaboration_id: input.read_string()?,
            updated_time: input.read_instant()?,
            created_time: input.read_instant()?,
            tenant: input.read_string()?,
            access: input.read_string_list()?,
            object_data: read_typed_object_data(input)?,
        })
    }
}

impl Writeable for CollaborationObjectDoc {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.collaboration_id);
        out.write_instant(&self.updated_time);
        out.write_instant(&self.created_time);
        out.write_string(&self.tenant);
        out.write_string_list(&self.access);
        write_typed_object_data(out, &self.object_data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Collaboration, CollaborationDataType};
    use serde_json::json;

    fn sample() -> CollaborationObjectDoc {
        let t = DateTime::from_timestamp_millis(1_650_000_000_123).unwrap();
        CollaborationObjectDoc {
            collaboration_id: "c-1".into(),
            updated_time: t,
            created_time: t,
            tenant: "ops".into(),
            access: vec!["User:admin".into(), "Role:all_access".into()],
            object_data: Collaboration::text("p1", "par1", "l1").with_tags("prod").into(),
        }
    }

    #[test]
    fn test_text_round_trip() {
        let doc = sample();
        let value = doc.to_value(TextOptions::full());
        assert_eq!(CollaborationObjectDoc::parse(&value, None).unwrap(), doc);
    }

    #[test]
    fn test_text_round_trip_empty_access_default_tenant() {
        let mut doc = sample();
        doc.access.clear();
        doc.tenant = DEFAULT_TENANT.to_string();
        let value = doc.to_value(TextOptions::full());
        assert!(value.get(ACCESS_LIST_FIELD).is_none());
        assert_eq!(CollaborationObjectDoc::parse(&value, None).unwrap(), doc);
    }

    #[test]
    fn test_binary_round_trip() {
        let doc = sample();
        let mut out = StreamOutput::new();
        doc.write_to(&mut out);
        let mut input = StreamInput::new(out.freeze());
        assert_eq!(CollaborationObjectDoc::read_from(&mut input).unwrap(), doc);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_binary_field_order() {
        let doc = sample();
        let mut out = StreamOutput::new();
        doc.write_to(&mut out);
        let mut input = StreamInput::new(out.freeze());
        assert_eq!(input.read_string().unwrap(), "c-1");
        assert_eq!(input.read_instant().unwrap(), doc.updated_time);
        assert_eq!(input.read_instant().unwrap(), doc.created_time);
        assert_eq!(input.read_string().unwrap(), "ops");
        assert_eq!(input.read_string_list().unwrap(), doc.access);
        assert_eq!(input.read_enum().unwrap(), 0);
        assert_eq!(input.read_enum().unwrap(), 0);
        assert!(input.read_bool().unwrap());
    }

    #[test]
    fn test_default_serialization_hides_id() {
        let value = sample().to_value(TextOptions::default());
        assert!(value.get(COLLABORATION_ID_FIELD).is_none());
        assert_eq!(value["collaboration"]["type"], json!("TEXT"));
        assert_eq!(value[CREATED_TIME_FIELD], json!(1_650_000_000_123i64));
    }

    #[test]
    fn test_parse_uses_id_override() {
        let value = sample().to_value(TextOptions::default());
        let doc = CollaborationObjectDoc::parse(&value, Some("from-hit")).unwrap();
        assert_eq!(doc.collaboration_id, "from-hit");
    }

    #[test]
    fn test_parse_missing_mandatory_fields() {
        let full = sample().to_value(TextOptions::full());
        for field in [
            COLLABORATION_ID_FIELD,
            UPDATED_TIME_FIELD,
            CREATED_TIME_FIELD,
            "collaboration",
        ] {
            let mut value = full.clone();
            value.as_object_mut().unwrap().remove(field);
            let err = CollaborationObjectDoc::parse(&value, None).unwrap_err();
            assert!(matches!(err, Error::MissingField(_)), "{field}: {err}");
        }
    }

    #[test]
    fn test_parse_skips_unknown_fields() {
        let mut value = sample().to_value(TextOptions::full());
        value["notebook"] = json!({"name": "x"});
        value["extra"] = json!(42);
        let doc = CollaborationObjectDoc::parse(&value, None).unwrap();
        assert_eq!(doc, sample());
    }

    #[test]
    fn test_parse_defaults() {
        let value = json!({
            "collaborationId": "id",
            "lastUpdatedTimeMs": 1,
            "createdTimeMs": 1,
            "collaboration": {"type": "TEXT"}
        });
        let doc = CollaborationObjectDoc::parse(&value, None).unwrap();
        assert_eq!(doc.tenant, DEFAULT_TENANT);
        assert!(doc.access.is_empty());
        let ObjectData::Collaboration(c) = &doc.object_data;
        assert_eq!(c.data_type, Some(CollaborationDataType::Text));
        assert!(!c.resolved);
    }
}
