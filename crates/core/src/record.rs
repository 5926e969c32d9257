//! Audit records: one decoded line of newline-delimited JSON.
//!
//! Fields are dynamic, so access goes through typed getters that report
//! absence or a type mismatch as a [`FieldError`] instead of panicking.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::FieldError;

/// Field names of the eCAR record and of the output schema predicates.
pub mod fields {
    pub const ID: &str = "id";
    pub const ACTION: &str = "action";
    pub const ACTOR_ID: &str = "actorID";
    pub const OBJECT_ID: &str = "objectID";
    pub const OBJECT: &str = "object";
    pub const HOSTNAME: &str = "hostname";
    pub const PID: &str = "pid";
    pub const PPID: &str = "ppid";
    pub const TIMESTAMP: &str = "timestamp";
}

/// A single audit event, keyed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    fields: Map<String, Value>,
}

impl AuditRecord {
    /// Decode one line. Anything other than a JSON object is rejected.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(line)?;
        Ok(Self { fields })
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The field as a JSON string, with no coercion.
    pub fn str_field(&self, field: &str) -> Result<&str, FieldError> {
        match self.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(FieldError::WrongType {
                field: field.into(),
                expected: "string",
                found: kind_of(other),
            }),
            None => Err(FieldError::Missing {
                field: field.into(),
            }),
        }
    }

    /// The field rendered as text. Strings, numbers and booleans are
    /// accepted; `null`, arrays and objects are not.
    pub fn text_field(&self, field: &str) -> Result<Cow<'_, str>, FieldError> {
        match self.get(field) {
            Some(Value::String(s)) => Ok(Cow::Borrowed(s)),
            Some(Value::Number(n)) => Ok(Cow::Owned(n.to_string())),
            Some(Value::Bool(b)) => Ok(Cow::Owned(b.to_string())),
            Some(other) => Err(FieldError::WrongType {
                field: field.into(),
                expected: "string or number",
                found: kind_of(other),
            }),
            None => Err(FieldError::Missing {
                field: field.into(),
            }),
        }
    }

    /// An identity field: a non-empty JSON string.
    pub fn identity_field(&self, field: &str) -> Result<&str, FieldError> {
        let value = self.str_field(field)?;
        if value.is_empty() {
            return Err(FieldError::Empty {
                field: field.into(),
            });
        }
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
