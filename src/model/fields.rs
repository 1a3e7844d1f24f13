//! Typed field accessors over parsed JSON
//!
//! JSON `null` is treated the same as an absent field throughout.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub(crate) fn expect_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| Error::invalid(what, "an object"))
}

pub(crate) fn string(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(Error::invalid(field, "a string")),
    }
}

pub(crate) fn boolean(field: &str, value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        _ => Err(Error::invalid(field, "a boolean")),
    }
}

pub(crate) fn epoch_millis(field: &str, value: &Value) -> Result<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| Error::invalid(field, "epoch milliseconds")),
        _ => Err(Error::invalid(field, "epoch milliseconds")),
    }
}

pub(crate) fn string_list(field: &str, value: &Value) -> Result<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid(field, "an array of strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        _ => Err(Error::invalid(field, "an array of strings")),
    }
}
