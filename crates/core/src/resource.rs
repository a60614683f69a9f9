//! Outbound resource model and the standard error envelope.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::CoreError;
use crate::validation::ValidationError;

/// Content-type identifiers with built-in response builders.
pub mod content_type {
    pub const JSON: &str = "application/json";
    pub const JSONP: &str = "application/javascript";
    pub const XML: &str = "application/xml";
    pub const QUERY: &str = "application/x-www-form-urlencoded";
    pub const DATA_URL: &str = "application/x-data-url";
    pub const FILE: &str = "application/octet-stream";
    pub const NULL: &str = "null";
}

/// A domain payload on its way out, tagged with the content type it should
/// be rendered as.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    content_type: String,
    data: Map<String, Value>,
}

impl Default for Resource {
    fn default() -> Self {
        Self::new(content_type::JSON)
    }
}

impl Resource {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            data: Map::new(),
        }
    }

    /// Normalize any serializable value into resource data.
    ///
    /// Objects become the data map directly; any other value is placed under
    /// a `data` key. `null` yields an empty resource.
    pub fn from_serialize<T: Serialize>(
        content_type: impl Into<String>,
        value: &T,
    ) -> Result<Self, CoreError> {
        let value = serde_json::to_value(value).map_err(|e| CoreError::Mapping(e.to_string()))?;
        let data = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".into(), other);
                map
            }
        };
        Ok(Self {
            content_type: content_type.into(),
            data,
        })
    }

    /// Build the resource sent for a failed request.
    pub fn from_envelope(envelope: ErrorEnvelope, content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            data: envelope.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Wire shape of every failure: `{code, status: "error", message, errors?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

impl ErrorEnvelope {
    pub const STATUS: &'static str = "error";

    /// `code` is the status carried by the failure, if any; see
    /// [`envelope_code`] for how it is normalized.
    pub fn new(code: Option<i64>, message: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            code: envelope_code(code),
            status: Self::STATUS,
            message: message.into(),
            errors,
        }
    }
}

impl From<ErrorEnvelope> for Map<String, Value> {
    fn from(envelope: ErrorEnvelope) -> Self {
        let mut map = Map::new();
        map.insert("code".into(), json!(envelope.code));
        map.insert("status".into(), json!(envelope.status));
        map.insert("message".into(), json!(envelope.message));
        if !envelope.errors.is_empty() {
            let errors = envelope
                .errors
                .into_iter()
                .map(|e| json!({"field": e.field, "rule": e.rule.token(), "message": e.message}))
                .collect();
            map.insert("errors".into(), Value::Array(errors));
        }
        map
    }
}

/// Missing or zero codes become 500; codes outside `100..=599` become 400.
pub fn envelope_code(code: Option<i64>) -> u16 {
    match code {
        None | Some(0) => 500,
        Some(c) if (100..=599).contains(&c) => c as u16,
        Some(_) => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RuleKind;

    #[test]
    fn envelope_code_normalization() {
        assert_eq!(envelope_code(None), 500);
        assert_eq!(envelope_code(Some(0)), 500);
        assert_eq!(envelope_code(Some(422)), 422);
        assert_eq!(envelope_code(Some(100)), 100);
        assert_eq!(envelope_code(Some(599)), 599);
        assert_eq!(envelope_code(Some(99)), 400);
        assert_eq!(envelope_code(Some(600)), 400);
        assert_eq!(envelope_code(Some(-1)), 400);
    }

    #[test]
    fn envelope_omits_empty_errors() {
        let resource =
            Resource::from_envelope(ErrorEnvelope::new(Some(403), "Forbidden", vec![]), "application/json");
        assert_eq!(
            Value::Object(resource.data().clone()),
            json!({"code": 403, "status": "error", "message": "Forbidden"})
        );
    }

    #[test]
    fn envelope_includes_structured_errors() {
        let errors = vec![ValidationError::new(RuleKind::Email, "bad").with_field("email")];
        let envelope = ErrorEnvelope::new(Some(422), "Validation Failed: bad", errors);
        let map: Map<String, Value> = envelope.clone().into();

        assert_eq!(
            map["errors"],
            json!([{"field": "email", "rule": "email", "message": "bad"}])
        );
        assert_eq!(Value::Object(map), serde_json::to_value(&envelope).unwrap());
    }

    #[test]
    fn from_serialize_normalizes_values() {
        #[derive(Serialize)]
        struct Contact {
            name: &'static str,
        }

        let resource = Resource::from_serialize(content_type::JSON, &Contact { name: "Jane" }).unwrap();
        assert_eq!(resource.get("name"), Some(&json!("Jane")));

        let resource = Resource::from_serialize(content_type::JSON, &vec![1, 2]).unwrap();
        assert_eq!(resource.get("data"), Some(&json!([1, 2])));

        let resource = Resource::from_serialize(content_type::JSON, &()).unwrap();
        assert!(resource.is_empty());
    }
}
