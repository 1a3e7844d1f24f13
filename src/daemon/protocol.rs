//! Request/response models for the collaboration actions
//!
//! Requests arrive as structured text over REST and travel between nodes in
//! the binary stream form; both forms are defined here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::tag::{COLLABORATION_ID_FIELD, OBJECT_DATA_FIELD};
use crate::model::{fields, read_typed_object_data, registry, write_typed_object_data};
use crate::model::{ObjectData, ObjectType};
use crate::stream::{StreamInput, StreamOutput, StreamResult, Writeable};

/// Request to create a collaboration object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCollaborationRequest {
    /// Explicit id to store under; the store assigns one when absent
    pub collaboration_id: Option<String>,
    pub object_data: ObjectData,
}

impl CreateCollaborationRequest {
    pub fn new(collaboration_id: Option<String>, object_data: impl Into<ObjectData>) -> Self {
        Self {
            collaboration_id,
            object_data: object_data.into(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_data.object_type()
    }

    /// Parse a REST body; `use_id` is used when the body carries no id
    pub fn parse(value: &Value, use_id: Option<&str>) -> Result<Self> {
        let object = fields::expect_object(value, "request body")?;

        let mut collaboration_id = use_id.map(str::to_string);
        let mut object_data = None;

        for (name, field) in object {
            if name == COLLABORATION_ID_FIELD {
                if let Some(id) = fields::string(name, field)? {
                    collaboration_id = Some(id);
                }
                continue;
            }
            match registry::resolve(name) {
                Some(descriptor) if object_data.is_none() => {
                    object_data = Some((descriptor.parse)(field)?);
                }
                _ => info!(
                    "Unexpected field: {}, while parsing CreateCollaborationRequest",
                    name
                ),
            }
        }

        Ok(Self {
            collaboration_id,
            object_data: object_data.ok_or_else(|| Error::missing(OBJECT_DATA_FIELD))?,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        if let Some(id) = &self.collaboration_id {
            object.insert(COLLABORATION_ID_FIELD.into(), Value::from(id.as_str()));
        }
        object.insert(self.object_type().tag().into(), self.object_data.to_value());
        Value::Object(object)
    }

    pub fn read_from(input: &mut StreamInput) -> StreamResult<Self> {
        Ok(Self {
            collaboration_id: input.read_optional_string()?,
            object_data: read_typed_object_data(input)?,
        })
    }
}

impl Writeable for CreateCollaborationRequest {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_optional_string(self.collaboration_id.as_deref());
        write_typed_object_data(out, &self.object_data);
    }
}

/// Id of a newly created collaboration object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCollaborationResponse {
    #[serde(rename = "collaborationObjectId")]
    pub collaboration_object_id: String,
}

impl CreateCollaborationResponse {
    pub fn new(collaboration_object_id: impl Into<String>) -> Self {
        Self {
            collaboration_object_id: collaboration_object_id.into(),
        }
    }

    pub fn read_from(input: &mut StreamInput) -> StreamResult<Self> {
        Ok(Self::new(input.read_string()?))
    }
}

impl Writeable for CreateCollaborationResponse {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.collaboration_object_id);
    }
}
