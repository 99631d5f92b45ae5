use std::fmt::{self, Display};
use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::json::{self, JsonResult};

/// The body of a response, with JSON queries evaluated on demand.
///
/// The body is parsed at most once, the first time [`find`](Self::find) or
/// [`json_format`](Self::json_format) needs it. The status code of the response is not kept.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandler {
    body: String,
    parsed: OnceLock<Option<Value>>,
}

impl ResponseHandler {
    /// Wraps a response body.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            parsed: OnceLock::new(),
        }
    }

    pub(crate) fn from_bytes(body: Vec<u8>) -> Self {
        let body = match String::from_utf8(body) {
            Ok(body) => body,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Self::new(body)
    }

    fn parsed(&self) -> Option<&Value> {
        self.parsed
            .get_or_init(|| serde_json::from_str(&self.body).ok())
            .as_ref()
    }

    /// Looks up a path expression in the body. See [`crate::json`] for the syntax.
    ///
    /// A body that is not JSON behaves like a document in which nothing exists.
    pub fn find(&self, path: &str) -> JsonResult {
        match self.parsed() {
            Some(root) => json::find(root, path),
            None => JsonResult::absent(),
        }
    }

    /// The body exactly as received.
    pub fn json(&self) -> &str {
        &self.body
    }

    /// The body re-serialized as indented JSON.
    ///
    /// Only JSON objects are formatted. Any other body, including invalid JSON, arrays and
    /// scalars, is silently replaced with an empty object, giving `{}`.
    pub fn json_format(&self) -> String {
        let empty = Map::new();
        let members = match self.parsed() {
            Some(Value::Object(members)) => members,
            _ => &empty,
        };
        serde_json::to_string_pretty(members).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Consumes the handler, returning the body.
    pub fn into_string(self) -> String {
        self.body
    }
}

impl PartialEq for ResponseHandler {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

impl Eq for ResponseHandler {}

impl From<String> for ResponseHandler {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

impl From<&str> for ResponseHandler {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl Display for ResponseHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}
