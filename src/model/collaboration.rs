//! Collaboration payload: the anchor a comment thread is attached to

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::fields;
use super::ObjectData;
use crate::error::Result;
use crate::stream::{StreamError, StreamInput, StreamOutput, StreamResult, Writeable};

const TYPE_TAG: &str = "type";
const PAGE_TAG: &str = "pageId";
const PARAGRAPH_TAG: &str = "paragraphId";
const LINE_TAG: &str = "lineId";
const TAGS_TAG: &str = "tags";
const RESOLVED_TAG: &str = "resolved";

/// Kind of anchor a collaboration refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaborationDataType {
    Text = 0,
}

impl CollaborationDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
        }
    }

    fn from_ordinal(ordinal: u32) -> StreamResult<Self> {
        match ordinal {
            0 => Ok(Self::Text),
            _ => Err(StreamError::UnknownOrdinal {
                kind: "collaboration data type",
                ordinal,
            }),
        }
    }
}

/// Comment thread anchor on a page/paragraph/line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Collaboration {
    pub data_type: Option<CollaborationDataType>,
    /// Notebook id for notebooks
    pub page_id: Option<String>,
    /// Notebook paragraph id
    pub paragraph_id: Option<String>,
    pub line_id: Option<String>,
    /// Single free-text tag string
    pub tags: Option<String>,
    pub resolved: bool,
}

impl Collaboration {
    /// Text anchor at the given location
    pub fn text(
        page_id: impl Into<String>,
        paragraph_id: impl Into<String>,
        line_id: impl Into<String>,
    ) -> Self {
        Self {
            data_type: Some(CollaborationDataType::Text),
            page_id: Some(page_id.into()),
            paragraph_id: Some(paragraph_id.into()),
            line_id: Some(line_id.into()),
            tags: None,
            resolved: false,
        }
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn parse(value: &Value) -> Result<Self> {
        let object = fields::expect_object(value, "collaboration")?;
        let mut collaboration = Self::default();
        for (name, field) in object {
            match name.as_str() {
                // only one data type exists; any value selects it
                TYPE_TAG => {
                    if !field.is_null() {
                        collaboration.data_type = Some(CollaborationDataType::Text);
                    }
                }
                PAGE_TAG => collaboration.page_id = fields::string(name, field)?,
                PARAGRAPH_TAG => collaboration.paragraph_id = fields::string(name, field)?,
                LINE_TAG => collaboration.line_id = fields::string(name, field)?,
                TAGS_TAG => collaboration.tags = fields::string(name, field)?,
                RESOLVED_TAG => {
                    collaboration.resolved = fields::boolean(name, field)?.unwrap_or(false)
                }
                _ => info!("Collaboration: skipping unknown field {}", name),
            }
        }
        debug!(
            "Parsed collaboration: type={:?} page={:?} paragraph={:?} line={:?} tags={:?} resolved={}",
            collaboration.data_type,
            collaboration.page_id,
            collaboration.paragraph_id,
            collaboration.line_id,
            collaboration.tags,
            collaboration.resolved
        );
        Ok(collaboration)
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        if let Some(data_type) = self.data_type {
            object.insert(TYPE_TAG.into(), Value::from(data_type.as_str()));
        }
        let optional = [
            (PAGE_TAG, &self.page_id),
            (PARAGRAPH_TAG, &self.paragraph_id),
            (LINE_TAG, &self.line_id),
            (TAGS_TAG, &self.tags),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                object.insert(key.into(), Value::from(v.as_str()));
            }
        }
        object.insert(RESOLVED_TAG.into(), Value::Bool(self.resolved));
        Value::Object(object)
    }

    pub fn read_from(input: &mut StreamInput) -> StreamResult<Self> {
        let data_type = if input.read_bool()? {
            Some(CollaborationDataType::from_ordinal(input.read_enum()?)?)
        } else {
            None
        };
        Ok(Self {
            data_type,
            page_id: input.read_optional_string()?,
            paragraph_id: input.read_optional_string()?,
            line_id: input.read_optional_string()?,
            tags: input.read_optional_string()?,
            resolved: input.read_bool()?,
        })
    }

    pub(crate) fn parse_object_data(value: &Value) -> Result<ObjectData> {
        Self::parse(value).map(ObjectData::Collaboration)
    }

    pub(crate) fn read_object_data(input: &mut StreamInput) -> StreamResult<ObjectData> {
        Self::read_from(input).map(ObjectData::Collaboration)
    }
}

impl Writeable for Collaboration {
    fn write_to(&self, out: &mut StreamOutput) {
        match self.data_type {
            Some(t) => {
                out.write_bool(true);
                out.write_enum(t as u32);
            }
            None => out.write_bool(false),
        }
        out.write_optional_string(self.page_id.as_deref());
        out.write_optional_string(self.paragraph_id.as_deref());
        out.write_optional_string(self.line_id.as_deref());
        out.write_optional_string(self.tags.as_deref());
        out.write_bool(self.resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full() {
        let c = Collaboration::parse(&json!({
            "type": "TEXT",
            "pageId": "p1",
            "paragraphId": "par1",
            "lineId": "l1",
            "tags": "prod",
            "resolved": true
        }))
        .unwrap();
        assert_eq!(c.data_type, Some(CollaborationDataType::Text));
        assert_eq!(c.page_id.as_deref(), Some("p1"));
        assert_eq!(c.tags.as_deref(), Some("prod"));
        assert!(c.resolved);
    }

    #[test]
    fn test_any_type_value_resolves_to_text() {
        let c = Collaboration::parse(&json!({"type": "VIZ"})).unwrap();
        assert_eq!(c.data_type, Some(CollaborationDataType::Text));
    }

    #[test]
    fn test_resolved_defaults_false_and_unknown_skipped() {
        let c = Collaboration::parse(&json!({"pageId": "p", "color": "red"})).unwrap();
        assert!(!c.resolved);
        assert_eq!(c.data_type, None);
    }

    #[test]
    fn test_list_tags_rejected() {
        let err = Collaboration::parse(&json!({"tags": ["prod", "dashboard"]})).unwrap_err();
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn test_to_value_omits_absent_fields() {
        let c = Collaboration {
            page_id: Some("p".into()),
            ..Default::default()
        };
        assert_eq!(c.to_value(), json!({"pageId": "p", "resolved": false}));
    }

    #[test]
    fn test_binary_with_absent_fields() {
        let c = Collaboration {
            line_id: Some("l9".into()),
            resolved: true,
            ..Default::default()
        };
        let mut out = StreamOutput::new();
        c.write_to(&mut out);
        let mut input = StreamInput::new(out.freeze());
        assert_eq!(Collaboration::read_from(&mut input).unwrap(), c);
        assert_eq!(input.remaining(), 0);
    }
}
