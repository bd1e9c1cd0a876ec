//! Structured error reporting for a staged YAML load/emit pipeline.
//!
//! Every load fault is a [`LoadError`] carrying the [`Stage`] that detected it
//! and a source [`Mark`]. Loads that keep going after per-field faults return
//! them together as [`LoadErrors`]. The deprecated [`ConstructError`] and
//! [`TypeError`] shapes are available as views through
//! [`LoadErrors::view_as`].
//!
//! Stages nested deep inside a call may abort it by unwinding; every public
//! function here absorbs that unwind and returns the fault as an ordinary
//! `Err`. The crate must therefore be built with `panic = "unwind"`; an
//! abort strategy is rejected at compile time.

pub mod error;
pub mod legacy;
pub mod mark;
pub mod node;
pub mod resolve;
pub mod schema;
pub mod stage;

mod construct;
mod emitter;
mod parser;
mod reader;
mod scanner;
mod signal;

use std::io::Write;

use serde_json::Value as JsonValue;

pub use construct::FieldError;
pub use error::{
    Cause, EmitterError, Error, ErrorContext, LoadError, LoadErrors, WriterError, NAMESPACE,
};
pub use legacy::{ConstructError, ErrorView, TypeError};
pub use mark::Mark;
pub use node::{Node, NodeKind, ScalarStyle};
pub use schema::{Field, FieldKind, Schema};
pub use stage::Stage;

/// Reads `input` into a node tree.
pub fn compose(input: &[u8]) -> Result<Node, Error> {
    signal::guard("compose", || compose_node(input))
}

/// Loads `input` and constructs its value, checking fields against `schema`.
///
/// Structural faults stop the load with a single [`LoadError`]; field faults
/// are all reported together as [`LoadErrors`].
pub fn load(input: &[u8], schema: &Schema) -> Result<JsonValue, Error> {
    signal::guard("load", || {
        let root = compose_node(input)?;
        construct::construct(&root, schema)
    })
}

pub fn load_str(input: &str, schema: &Schema) -> Result<JsonValue, Error> {
    load(input.as_bytes(), schema)
}

/// Renders `value` as a YAML document.
pub fn emit(value: &JsonValue) -> Result<String, Error> {
    signal::guard("emit", || Ok(emitter::to_yaml_string(value)))
}

/// Renders `value` as a YAML document into `writer`.
pub fn emit_to<W: Write>(value: &JsonValue, writer: W) -> Result<(), Error> {
    signal::guard("emit_to", || emitter::write_yaml(value, writer))
}

fn compose_node(input: &[u8]) -> Result<Node, Error> {
    let (text, offset) = reader::read(input)?;
    let lines = scanner::scan_lines(text, offset)?;
    let root = parser::parse(lines, offset);
    tracing::debug!(bytes = input.len(), kind = root.kind_name(), "composed document");
    Ok(root)
}
