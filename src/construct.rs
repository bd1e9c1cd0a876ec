//! Value construction with per-field fault collection.
//!
//! Resolution faults stop construction. Schema faults are collected into one
//! [`LoadErrors`] while the rest of the document is still decoded.

use std::collections::HashSet;

use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

use crate::error::{Error, LoadError, LoadErrors};
use crate::node::{Node, NodeKind};
use crate::resolve::{check_collection_tag, resolve_scalar, value_tag};
use crate::schema::{FieldKind, Schema};
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Cause attached to every constructor-stage [`LoadError`].
pub enum FieldError {
    /// The value's type does not match the declared field kind.
    #[error("cannot construct {found} into {expected}")]
    Mismatch { found: String, expected: FieldKind },
    /// A required field is absent.
    #[error("missing required field \"{0}\"")]
    Missing(String),
    /// A strict schema does not declare this key.
    #[error("field {0} not found in schema")]
    Unknown(String),
}

struct Constructor<'s> {
    schema: &'s Schema,
    errors: LoadErrors,
    /// Paths that already have a fault, so they are not reported as missing.
    faulted: HashSet<String>,
}

/// Builds the value of `root`, checking it against `schema`.
pub(crate) fn construct(root: &Node, schema: &Schema) -> Result<JsonValue, Error> {
    let mut constructor = Constructor {
        schema,
        errors: LoadErrors::new(),
        faulted: HashSet::new(),
    };

    let value = constructor.value(root, Some(""))?;
    if !schema.fields.is_empty() && !value.is_object() && !value.is_null() {
        constructor.fault(
            root,
            FieldError::Mismatch {
                found: describe(root, &value),
                expected: FieldKind::Map,
            },
        );
    }
    for path in schema.required_paths() {
        if lookup(&value, path).is_none() && !constructor.faulted.contains(path) {
            let owner = nearest_node(root, path);
            constructor.fault(owner, FieldError::Missing(path.to_string()));
        }
    }

    let Constructor { errors, .. } = constructor;
    tracing::debug!(faults = errors.len(), "constructed document");
    errors.into_result()?;
    Ok(value)
}

impl Constructor<'_> {
    /// `path` is `None` below sequences, where the schema does not apply.
    fn value(&mut self, node: &Node, path: Option<&str>) -> Result<JsonValue, LoadError> {
        let schema = self.schema;
        match &node.kind {
            NodeKind::Scalar { .. } => resolve_scalar(node),
            NodeKind::Sequence(items) => {
                check_collection_tag(node)?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.value(item, None)?);
                }
                Ok(JsonValue::Array(out))
            }
            NodeKind::Mapping(entries) => {
                check_collection_tag(node)?;
                let mut out = JsonMap::new();
                for (key, value) in entries {
                    let name = match resolve_scalar(key)? {
                        JsonValue::String(s) => s,
                        other => other.to_string(),
                    };
                    let child = path.map(|p| join(p, &name));

                    if let Some(child) = child.as_deref() {
                        if schema.strict && !schema.covers(child) {
                            self.faulted.insert(child.to_string());
                            self.fault(key, FieldError::Unknown(name));
                            continue;
                        }
                    }

                    let resolved = self.value(value, child.as_deref())?;
                    let field = child.as_deref().and_then(|c| schema.get(c));
                    if let (Some(child), Some(field)) = (child.as_deref(), field) {
                        if !field.kind.accepts(&resolved) {
                            self.faulted.insert(child.to_string());
                            self.fault(
                                value,
                                FieldError::Mismatch {
                                    found: describe(value, &resolved),
                                    expected: field.kind,
                                },
                            );
                            continue;
                        }
                    }
                    out.insert(name, resolved);
                }
                Ok(JsonValue::Object(out))
            }
        }
    }

    fn fault(&mut self, node: &Node, cause: FieldError) {
        tracing::trace!(mark = %node.mark, %cause, "constructor fault");
        let err =
            LoadError::new(Stage::Constructor, cause.to_string(), node.mark).with_cause(cause);
        self.errors.push(err);
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn describe(node: &Node, value: &JsonValue) -> String {
    match node.as_scalar() {
        Some(text) => format!("{} `{text}`", value_tag(value)),
        None => value_tag(value).to_string(),
    }
}

fn lookup<'v>(value: &'v JsonValue, path: &str) -> Option<&'v JsonValue> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Deepest mapping node along `path`, used to place a missing-field fault.
fn nearest_node<'n>(root: &'n Node, path: &str) -> &'n Node {
    let mut current = root;
    for key in path.split('.') {
        let NodeKind::Mapping(entries) = &current.kind else {
            break;
        };
        match entries.iter().find(|(k, _)| k.as_scalar() == Some(key)) {
            Some((_, value)) if matches!(value.kind, NodeKind::Mapping(_)) => current = value,
            _ => break,
        }
    }
    current
}
