//! Tabular result model shared by the client channel and the HTTP facade.
//! A response is an ordered list of frames; a frame is an ordered list of
//! named fields; a field is an ordered sequence of values. Column order and
//! value order are significant and must survive serialization untouched.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cell value inside a field's value sequence.
///
/// Deserialization is untagged; RFC 3339 strings become timestamps, any other
/// string stays a string. A `Str` therefore never holds date-shaped text: a
/// backend value like `"2023-05-01T12:30:00Z"` decodes as `Timestamp` and
/// renders back through its RFC 3339 form (`…+00:00`), not the original
/// literal. Nulls are carried, never dropped, so that a field's value count
/// always equals its row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Str(String),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            FieldValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// A named column holding an ordered value sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub values: Vec<FieldValue>,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, values: Vec<FieldValue>) -> Self {
        Field { name: name.into(), values }
    }
}

/// An ordered, tabular result. `ref_id` ties the frame back to the request
/// target that produced it; the facade fills it in, ad-hoc producers may not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub name: String,
    #[serde(rename = "refId", default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    pub fields: Vec<Field>,
}

impl Frame {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Frame { name: name.into(), ref_id: None, fields: Vec::new() }
    }

    pub fn with_fields<S: Into<String>>(name: S, fields: Vec<Field>) -> Self {
        Frame { name: name.into(), ref_id: None, fields }
    }

    /// First field, if the frame has any. Discovery only ever looks here.
    pub fn first_field(&self) -> Option<&Field> {
        self.fields.first()
    }
}
