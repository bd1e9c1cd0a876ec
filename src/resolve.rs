//! Tag resolution for composed nodes.
//!
//! Plain scalars are resolved with the YAML 1.2 core schema; explicit `!!`
//! tags are checked against the node they are attached to.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Number as JsonNumber, Value as JsonValue};

use crate::error::LoadError;
use crate::node::{Node, NodeKind, ScalarStyle};
use crate::stage::Stage;

pub const NULL_TAG: &str = "!!null";
pub const BOOL_TAG: &str = "!!bool";
pub const INT_TAG: &str = "!!int";
pub const FLOAT_TAG: &str = "!!float";
pub const STR_TAG: &str = "!!str";
pub const MAP_TAG: &str = "!!map";
pub const SEQ_TAG: &str = "!!seq";

struct CorePatterns {
    null: Regex,
    boolean: Regex,
    decimal: Regex,
    octal: Regex,
    hex: Regex,
    float: Regex,
    special_float: Regex,
}

fn patterns() -> &'static CorePatterns {
    static PATTERNS: OnceLock<CorePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CorePatterns {
        null: Regex::new(r"^(?:~|null|Null|NULL)?$").expect("valid regex"),
        boolean: Regex::new(r"^(?:true|True|TRUE|false|False|FALSE)$").expect("valid regex"),
        decimal: Regex::new(r"^[-+]?[0-9]+$").expect("valid regex"),
        octal: Regex::new(r"^0o[0-7]+$").expect("valid regex"),
        hex: Regex::new(r"^0x[0-9a-fA-F]+$").expect("valid regex"),
        float: Regex::new(r"^[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?$")
            .expect("valid regex"),
        special_float: Regex::new(r"^(?:[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$")
            .expect("valid regex"),
    })
}

/// Returns the tag a plain scalar with this text resolves to.
pub fn implicit_tag(text: &str) -> &'static str {
    let p = patterns();
    if p.null.is_match(text) {
        NULL_TAG
    } else if p.boolean.is_match(text) {
        BOOL_TAG
    } else if p.decimal.is_match(text) || p.octal.is_match(text) || p.hex.is_match(text) {
        INT_TAG
    } else if p.float.is_match(text) || p.special_float.is_match(text) {
        FLOAT_TAG
    } else {
        STR_TAG
    }
}

/// Returns the core schema tag describing a resolved value.
pub fn value_tag(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => NULL_TAG,
        JsonValue::Bool(_) => BOOL_TAG,
        JsonValue::Number(n) if n.is_f64() => FLOAT_TAG,
        JsonValue::Number(_) => INT_TAG,
        JsonValue::String(_) => STR_TAG,
        JsonValue::Array(_) => SEQ_TAG,
        JsonValue::Object(_) => MAP_TAG,
    }
}

/// Checks the explicit tag of a mapping or sequence node.
pub(crate) fn check_collection_tag(node: &Node) -> Result<(), LoadError> {
    let expected = match node.kind {
        NodeKind::Mapping(_) => MAP_TAG,
        NodeKind::Sequence(_) => SEQ_TAG,
        NodeKind::Scalar { .. } => return Ok(()),
    };
    match node.tag.as_deref() {
        None => Ok(()),
        Some(tag) if tag == expected => Ok(()),
        Some(tag) => Err(tag_error(node, tag)),
    }
}

/// Resolves a scalar node to its value.
pub(crate) fn resolve_scalar(node: &Node) -> Result<JsonValue, LoadError> {
    let NodeKind::Scalar { value, style } = &node.kind else {
        return Err(LoadError::new(
            Stage::Resolver,
            format!("expected a scalar, found a {}", node.kind_name()),
            node.mark,
        ));
    };

    let tag = match node.tag.as_deref() {
        Some(tag) => tag,
        None if *style == ScalarStyle::Plain => implicit_tag(value),
        None => STR_TAG,
    };

    let resolved = match tag {
        STR_TAG => Some(JsonValue::String(value.clone())),
        NULL_TAG if patterns().null.is_match(value) => Some(JsonValue::Null),
        BOOL_TAG => parse_bool(value).map(JsonValue::Bool),
        INT_TAG => parse_int(value),
        FLOAT_TAG => match parse_float(value) {
            Some(number) => match JsonNumber::from_f64(number) {
                Some(number) => Some(JsonValue::Number(number)),
                None => {
                    return Err(LoadError::new(
                        Stage::Resolver,
                        format!("cannot represent `{value}` as a JSON number"),
                        node.mark,
                    ))
                }
            },
            None => None,
        },
        NULL_TAG | MAP_TAG | SEQ_TAG => None,
        other => {
            return Err(LoadError::new(
                Stage::Resolver,
                format!("unknown tag {other}"),
                node.mark,
            ))
        }
    };

    resolved.ok_or_else(|| tag_error(node, tag))
}

fn tag_error(node: &Node, tag: &str) -> LoadError {
    let message = match node.as_scalar() {
        Some(text) => format!("cannot resolve `{text}` as {tag}"),
        None => format!("cannot resolve a {} as {tag}", node.kind_name()),
    };
    LoadError::new(Stage::Resolver, message, node.mark)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<JsonValue> {
    let p = patterns();
    let number = if p.octal.is_match(text) {
        i64::from_str_radix(&text[2..], 8).ok().map(JsonNumber::from)
    } else if p.hex.is_match(text) {
        i64::from_str_radix(&text[2..], 16).ok().map(JsonNumber::from)
    } else if p.decimal.is_match(text) {
        let digits = text.strip_prefix('+').unwrap_or(text);
        digits
            .parse::<i64>()
            .ok()
            .map(JsonNumber::from)
            .or_else(|| digits.parse::<u64>().ok().map(JsonNumber::from))
    } else {
        None
    };
    number.map(JsonValue::Number)
}

fn parse_float(text: &str) -> Option<f64> {
    let p = patterns();
    if p.special_float.is_match(text) {
        // `.inf`, `-.inf` and `.nan` read as `inf`, `-inf` and `nan` once the dot goes.
        return text.replacen('.', "", 1).parse().ok();
    }
    if !(p.float.is_match(text) || p.decimal.is_match(text)) {
        return None;
    }
    text.parse().ok()
}
