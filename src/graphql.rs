//! GraphQL response envelope.
//!
//! Every status code is kept as data; whether a response is acceptable is a
//! decision for [`crate::assertions`], never for the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// The `{ data, errors }` body every GraphQL server answers with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl Envelope {
    fn lenient(mut map: serde_json::Map<String, Value>) -> Self {
        let errors = match map.remove("errors") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items.into_iter().map(GraphQlError::lenient).collect()),
            Some(other) => Some(vec![GraphQlError::lenient(other)]),
        };
        Self {
            data: map.remove("data"),
            errors,
        }
    }
}

impl GraphQlError {
    fn lenient(value: Value) -> Self {
        match value {
            Value::String(message) => Self {
                message,
                ..Self::default()
            },
            Value::Object(map) => {
                let message = match map.get("message") {
                    Some(Value::String(message)) => message.clone(),
                    _ => Value::Object(map.clone()).to_string(),
                };
                Self {
                    message,
                    path: map.get("path").and_then(Value::as_array).cloned(),
                    extensions: map.get("extensions").cloned(),
                }
            }
            other => Self {
                message: other.to_string(),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    http_status: u16,
    body: Envelope,
    query: String,
    raw: Option<String>,
}

impl Response {
    pub fn new(http_status: u16, query: impl Into<String>, body: Envelope) -> Self {
        Self {
            http_status,
            body,
            query: query.into(),
            raw: None,
        }
    }

    /// Parses a body as received from the wire. A JSON object whose `errors`
    /// member is malformed still keeps its `data` and error text. Anything
    /// that is not a JSON object is kept verbatim with an empty envelope.
    pub fn from_body_text(http_status: u16, query: impl Into<String>, text: &str) -> Self {
        let body = serde_json::from_str::<Envelope>(text).ok().or_else(|| {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Some(Envelope::lenient(map)),
                _ => None,
            }
        });
        match body {
            Some(body) => Self::new(http_status, query, body),
            None => Self {
                http_status,
                body: Envelope::default(),
                query: query.into(),
                raw: Some(text.to_string()),
            },
        }
    }

    pub fn from_value(http_status: u16, query: impl Into<String>, value: Value) -> Self {
        let text = value.to_string();
        Self::from_body_text(http_status, query, &text)
    }

    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn ok_status_code(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    pub fn body(&self) -> &Envelope {
        &self.body
    }

    /// The exact query or mutation text that produced this response
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn raw_body(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.body.data.as_ref().filter(|v| !v.is_null())
    }

    /// `data[operation]`, with JSON null treated as absent
    pub fn field(&self, operation: &str) -> Option<&Value> {
        self.data()
            .and_then(|data| data.get(operation))
            .filter(|v| !v.is_null())
    }

    pub fn errors(&self) -> &[GraphQlError] {
        self.body.errors.as_deref().unwrap_or(&[])
    }

    /// An empty `errors` array counts as no errors
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    pub fn first_error_message(&self) -> Option<&str> {
        self.errors().first().map(|e| e.message.as_str())
    }
}

/// Walks a dotted path (`company.id`) through nested objects.
/// Null values are treated as missing.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Reads an identifier that servers may send as a string or a number
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
