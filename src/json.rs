//! Path queries over JSON documents.
//!
//! Paths use the gjson dot syntax:
//!
//! | Path                           | Meaning                                              |
//! |--------------------------------|------------------------------------------------------|
//! | `name.first`                   | member `first` of member `name`                      |
//! | `friends.1`                    | second element of array `friends`                    |
//! | `friends[1]`                   | same as above                                        |
//! | `friends.#`                    | number of elements in `friends`                      |
//! | `friends.#.age`                | array of `age` taken from every element              |
//! | `name.fir*`, `name.f?rst`      | first member of `name` whose key matches the pattern |
//! | `friends.#(first=="Roger").age`| `age` of the first element whose `first` is `Roger`  |
//! | `friends.#(age>45)#.first`     | `first` of every element whose `age` exceeds 45      |
//! | `friends.#(first%"D*")`        | first element whose `first` matches the pattern      |
//! | `friends.#(nets)`              | first element that has a `nets` member               |
//! | `children.#(!="Sara")#`        | every element that is not `"Sara"`                   |
//! | `fav\.movie`                   | member literally named `fav.movie`                   |
//!
//! Query operators are `==`, `!=`, `<`, `<=`, `>`, `>=`, `%` (pattern match) and `!%`. The
//! right-hand side is a JSON literal. Strings compare with strings and numbers with numbers;
//! other pairs only support `==` and `!=`. `\` escapes the next character everywhere, so
//! `a\*` is the member literally named `a*`. Modifiers (`@reverse`), multipaths and the `|`
//! pipe are not supported and yield an absent result.
//!
//! Lookups never fail. Malformed documents, malformed paths and missing values all produce an
//! absent [`JsonResult`], whose accessors return zero values.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde_json::Value;

mod path;

/// The JSON type of a [`JsonResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// `null`, or no value at all.
    Null,
    /// `false`
    False,
    /// A number.
    Number,
    /// A string.
    String,
    /// `true`
    True,
    /// An object or an array.
    Json,
}

/// The outcome of a path query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonResult {
    value: Option<Value>,
}

/// Parses `json` and looks up `path` in it.
pub fn get(json: &str, path: &str) -> JsonResult {
    match serde_json::from_str::<Value>(json) {
        Ok(root) => find(&root, path),
        Err(_) => JsonResult::absent(),
    }
}

/// Looks up `path` in an already parsed document.
pub fn find(root: &Value, path: &str) -> JsonResult {
    let value = path::parse(path).and_then(|segments| path::lookup(root, &segments));
    if value.is_none() {
        tracing::trace!(path, "JSON path did not match");
    }
    JsonResult {
        value: value.map(Cow::into_owned),
    }
}

impl JsonResult {
    /// A result that matched nothing.
    pub fn absent() -> Self {
        Self { value: None }
    }

    /// Whether the path matched a value. A matched `null` counts as existing.
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// The matched value.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Consumes the result, returning the matched value.
    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    /// The JSON type of the matched value.
    pub fn kind(&self) -> JsonKind {
        match &self.value {
            None | Some(Value::Null) => JsonKind::Null,
            Some(Value::Bool(false)) => JsonKind::False,
            Some(Value::Bool(true)) => JsonKind::True,
            Some(Value::Number(_)) => JsonKind::Number,
            Some(Value::String(_)) => JsonKind::String,
            Some(Value::Array(_) | Value::Object(_)) => JsonKind::Json,
        }
    }

    /// The content of a matched string, or `""` for anything else.
    pub fn str(&self) -> &str {
        match &self.value {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    /// A textual rendering of the matched value.
    ///
    /// Strings are returned without quotes, containers as compact JSON, and `null` or a missing
    /// value as `""`.
    pub fn string(&self) -> String {
        match &self.value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
        }
    }

    /// The matched value as a signed integer, `0` if it cannot be converted.
    pub fn int(&self) -> i64 {
        match &self.value {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::String(s)) => s
                .parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::Bool(b)) => *b as i64,
            _ => 0,
        }
    }

    /// The matched value as an unsigned integer, `0` if it cannot be converted.
    pub fn uint(&self) -> u64 {
        match &self.value {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or_default(),
            Some(Value::String(s)) => s
                .parse::<u64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| *f >= 0.0)
                        .map(|f| f as u64)
                })
                .unwrap_or_default(),
            Some(Value::Bool(b)) => *b as u64,
            _ => 0,
        }
    }

    /// The matched value as a float, `0.0` if it cannot be converted.
    pub fn float(&self) -> f64 {
        match &self.value {
            Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
            Some(Value::String(s)) => s.parse().unwrap_or_default(),
            Some(Value::Bool(b)) => *b as u8 as f64,
            _ => 0.0,
        }
    }

    /// The matched value as a boolean.
    ///
    /// Numbers are true when non-zero; strings accept the usual spellings of `true`/`1`.
    pub fn bool(&self) -> bool {
        match &self.value {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => matches!(s.as_str(), "1" | "t" | "T" | "true" | "TRUE" | "True"),
            _ => false,
        }
    }

    /// The elements of a matched array.
    ///
    /// A scalar yields a one-element vector, a missing value or `null` an empty one.
    pub fn array(&self) -> Vec<JsonResult> {
        match &self.value {
            None | Some(Value::Null) => vec![],
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| JsonResult {
                    value: Some(item.clone()),
                })
                .collect(),
            Some(_) => vec![self.clone()],
        }
    }

    /// The members of a matched object, empty for anything else.
    pub fn map(&self) -> BTreeMap<String, JsonResult> {
        match &self.value {
            Some(Value::Object(members)) => members
                .iter()
                .map(|(k, v)| {
                    (
                        k.clone(),
                        JsonResult {
                            value: Some(v.clone()),
                        },
                    )
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    /// The matched value as compact JSON text, `""` if nothing matched.
    pub fn raw(&self) -> String {
        self.value
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default()
    }

    /// Looks up `path` relative to the matched value.
    pub fn get(&self, path: &str) -> JsonResult {
        match &self.value {
            Some(value) => find(value, path),
            None => JsonResult::absent(),
        }
    }
}

impl Display for JsonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string())
    }
}

impl From<Value> for JsonResult {
    fn from(value: Value) -> Self {
        Self { value: Some(value) }
    }
}
