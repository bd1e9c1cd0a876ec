//! Block-style YAML emitter for resolved values.

use std::io::Write;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{EmitterError, Error, WriterError};
use crate::reader::is_allowed;
use crate::resolve::{implicit_tag, STR_TAG};
use crate::signal::raise;

const MAX_DEPTH: usize = 64;

/// Renders `value` as a YAML document.
///
/// Values nested deeper than the emitter supports, and strings holding
/// characters a YAML stream cannot carry, are raised as an [`EmitterError`].
pub(crate) fn to_yaml_string(value: &JsonValue) -> String {
    let mut out = String::new();
    write_value(value, 0, 0, &mut out);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Renders `value` and writes it to `writer`.
pub(crate) fn write_yaml<W: Write>(value: &JsonValue, mut writer: W) -> Result<(), Error> {
    let text = to_yaml_string(value);
    writer.write_all(text.as_bytes()).map_err(WriterError::from)?;
    writer.flush().map_err(WriterError::from)?;
    Ok(())
}

fn write_value(value: &JsonValue, indent: usize, depth: usize, out: &mut String) {
    match value {
        JsonValue::Object(map) => write_object(map, indent, depth, out),
        JsonValue::Array(items) => write_array(items, indent, depth, out),
        _ => {
            push_indent(indent, out);
            out.push_str(&render_scalar(value));
            out.push('\n');
        }
    }
}

fn check_depth(depth: usize) {
    if depth > MAX_DEPTH {
        raise(EmitterError::new(format!("exceeded max depth of {MAX_DEPTH}")));
    }
}

fn write_object(map: &JsonMap<String, JsonValue>, indent: usize, depth: usize, out: &mut String) {
    check_depth(depth);
    if map.is_empty() {
        push_indent(indent, out);
        out.push_str("{}\n");
        return;
    }

    for (key, value) in map {
        push_indent(indent, out);
        out.push_str(&render_string(key));
        match value {
            JsonValue::Object(obj) if obj.is_empty() => out.push_str(": {}\n"),
            JsonValue::Array(arr) if arr.is_empty() => out.push_str(": []\n"),
            JsonValue::Object(obj) => {
                out.push_str(":\n");
                write_object(obj, indent + 2, depth + 1, out);
            }
            JsonValue::Array(arr) => {
                out.push_str(":\n");
                write_array(arr, indent + 2, depth + 1, out);
            }
            _ => {
                out.push_str(": ");
                out.push_str(&render_scalar(value));
                out.push('\n');
            }
        }
    }
}

fn write_array(items: &[JsonValue], indent: usize, depth: usize, out: &mut String) {
    check_depth(depth);
    if items.is_empty() {
        push_indent(indent, out);
        out.push_str("[]\n");
        return;
    }

    for item in items {
        push_indent(indent, out);
        match item {
            JsonValue::Object(map) if !map.is_empty() => {
                out.push_str("-\n");
                write_object(map, indent + 2, depth + 1, out);
            }
            JsonValue::Array(arr) if !arr.is_empty() => {
                out.push_str("-\n");
                write_array(arr, indent + 2, depth + 1, out);
            }
            JsonValue::Object(_) => out.push_str("- {}\n"),
            JsonValue::Array(_) => out.push_str("- []\n"),
            _ => {
                out.push_str("- ");
                out.push_str(&render_scalar(item));
                out.push('\n');
            }
        }
    }
}

fn render_scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(v) => v.to_string(),
        JsonValue::Number(v) => v.to_string(),
        JsonValue::String(v) => render_string(v),
        JsonValue::Array(_) | JsonValue::Object(_) => unreachable!("handled by callers"),
    }
}

fn render_string(input: &str) -> String {
    if !input.chars().all(is_allowed) {
        raise(EmitterError::new("control characters are not allowed"));
    }
    if is_plain(input) {
        input.to_string()
    } else {
        quote_string(input)
    }
}

fn quote_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('"');
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Returns `true` when `input` reads back as the same string without quotes.
fn is_plain(input: &str) -> bool {
    if input.is_empty() || input.trim() != input {
        return false;
    }
    if implicit_tag(input) != STR_TAG {
        return false;
    }
    if input.starts_with(['-', '!', '&', '*', '|', '>', '%', '@', '`', '?']) {
        return false;
    }

    input.chars().all(|ch| {
        !ch.is_control() && !matches!(ch, ':' | '#' | '"' | '\'' | '{' | '}' | '[' | ']' | ',')
    })
}

fn push_indent(indent: usize, out: &mut String) {
    for _ in 0..indent {
        out.push(' ');
    }
}
