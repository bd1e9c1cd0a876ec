//! Expected field types for value construction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Type a field must construct into.
pub enum FieldKind {
    Any,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Map,
    Seq,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Any => "any",
            FieldKind::Null => "null",
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Str => "str",
            FieldKind::Map => "map",
            FieldKind::Seq => "seq",
        }
    }

    /// Returns `true` when `value` can be stored in a field of this kind.
    /// Integers are accepted as floats.
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            FieldKind::Any => true,
            FieldKind::Null => value.is_null(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Int => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Str => value.is_string(),
            FieldKind::Map => value.is_object(),
            FieldKind::Seq => value.is_array(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(FieldKind::Any),
            "null" => Ok(FieldKind::Null),
            "bool" => Ok(FieldKind::Bool),
            "int" => Ok(FieldKind::Int),
            "float" => Ok(FieldKind::Float),
            "str" => Ok(FieldKind::Str),
            "map" => Ok(FieldKind::Map),
            "seq" => Ok(FieldKind::Seq),
            other => Err(format!("unknown field kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Field types keyed by dotted mapping path (for example `server.port`).
///
/// Paths only address mapping keys; values below a sequence are not checked.
pub struct Schema {
    #[serde(default)]
    pub fields: BTreeMap<String, Field>,
    /// Reject keys that are neither declared nor below a declared field.
    #[serde(default)]
    pub strict: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a schema from its JSON form.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn field(mut self, path: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(
            path.into(),
            Field {
                kind,
                required: false,
            },
        );
        self
    }

    pub fn required(mut self, path: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(
            path.into(),
            Field {
                kind,
                required: true,
            },
        );
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn get(&self, path: &str) -> Option<&Field> {
        self.fields.get(path)
    }

    /// Returns `true` when `path` is declared, is a prefix of a declared
    /// path, or lies below a declared field.
    pub fn covers(&self, path: &str) -> bool {
        self.fields.keys().any(|declared| {
            declared == path
                || is_below(declared, path)
                || is_below(path, declared)
        })
    }

    pub fn required_paths(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.required)
            .map(|(path, _)| path.as_str())
    }
}

/// Returns `true` when `path` lies strictly below `parent`.
fn is_below(path: &str, parent: &str) -> bool {
    path.strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldKind, Schema};

    #[test]
    fn kinds_accept_matching_values() {
        assert!(FieldKind::Int.accepts(&json!(3)));
        assert!(!FieldKind::Int.accepts(&json!(3.5)));
        assert!(FieldKind::Float.accepts(&json!(3)));
        assert!(FieldKind::Any.accepts(&json!(null)));
        assert!(!FieldKind::Str.accepts(&json!(1)));
    }

    #[test]
    fn parses_schema_from_json() {
        let schema = Schema::from_json(
            r#"{"fields": {"server.port": {"kind": "int", "required": true}}, "strict": true}"#,
        )
        .unwrap();
        assert!(schema.strict);
        assert_eq!(schema.get("server.port").unwrap().kind, FieldKind::Int);
        assert_eq!(schema.required_paths().collect::<Vec<_>>(), ["server.port"]);
    }

    #[test]
    fn covers_declared_ancestors_and_descendants() {
        let schema = Schema::new()
            .field("server.port", FieldKind::Int)
            .field("labels", FieldKind::Map);
        assert!(schema.covers("server"));
        assert!(schema.covers("server.port"));
        assert!(schema.covers("labels.team"));
        assert!(!schema.covers("serverless"));
        assert!(!schema.covers("name"));
    }
}
