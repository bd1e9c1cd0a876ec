//! Block structure parser and node composer.
//!
//! Builds the node tree from scanned lines. Structural faults can be found
//! at any nesting depth, so they are raised with [`raise`] instead of being
//! returned through every level.

use crate::error::LoadError;
use crate::mark::Mark;
use crate::node::{Node, NodeKind, ScalarStyle};
use crate::scanner::{scan_scalar, split_key, Line};
use crate::signal::raise;
use crate::stage::Stage;

const MAX_DEPTH: usize = 64;

/// Composes the document held by `lines`. `offset` is the byte position of
/// the decoded text, used to place an empty document.
pub(crate) fn parse(lines: Vec<Line<'_>>, offset: usize) -> Node {
    let Some(first) = lines.first().copied() else {
        return Node::scalar("", ScalarStyle::Plain, Mark::new(1, 1, offset));
    };

    let mut parser = Parser { lines, idx: 0 };
    let root = parser.parse_node(first.indent, 0);

    if let Some(line) = parser.lines.get(parser.idx) {
        raise(LoadError::new(
            Stage::Parser,
            "did not find expected <document start>",
            line.mark(),
        ));
    }
    root
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    idx: usize,
}

impl<'a> Parser<'a> {
    fn parse_node(&mut self, indent: usize, depth: usize) -> Node {
        let line = self.lines[self.idx];
        if depth > MAX_DEPTH {
            raise(LoadError::new(
                Stage::Parser,
                format!("exceeded max depth of {MAX_DEPTH}"),
                line.mark(),
            ));
        }

        if is_item(line.body) {
            self.parse_sequence(indent, depth)
        } else if split_key(line.body).is_some() {
            self.parse_mapping(indent, depth)
        } else {
            self.idx += 1;
            self.scalar(&line, 0, line.body.len())
        }
    }

    fn parse_mapping(&mut self, indent: usize, depth: usize) -> Node {
        let start = self.lines[self.idx].mark();
        let mut entries: Vec<(Node, Node)> = Vec::new();

        while let Some(line) = self.lines.get(self.idx).copied() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent || is_item(line.body) {
                raise(
                    LoadError::new(Stage::Parser, "did not find expected key", line.mark())
                        .with_context("while parsing a block mapping", start),
                );
            }

            let Some((key_end, value_start)) = split_key(line.body) else {
                raise(
                    LoadError::new(
                        Stage::Scanner,
                        "could not find expected ':'",
                        line.mark_at(line.body.len()),
                    )
                    .with_context("while scanning a simple key", line.mark()),
                );
            };

            let key = self.scalar(&line, 0, key_end);
            check_duplicate(&entries, &key);

            self.idx += 1;
            let value = if value_start >= line.body.len() {
                self.block_value(&line, indent, depth, true)
            } else {
                self.scalar(&line, value_start, line.body.len())
            };
            entries.push((key, value));
        }

        Node {
            kind: NodeKind::Mapping(entries),
            tag: None,
            mark: start,
        }
    }

    fn parse_sequence(&mut self, indent: usize, depth: usize) -> Node {
        let start = self.lines[self.idx].mark();
        let mut items = Vec::new();

        while let Some(line) = self.lines.get(self.idx).copied() {
            if line.indent < indent || !is_item(line.body) {
                break;
            }
            if line.indent > indent {
                raise(
                    LoadError::new(
                        Stage::Parser,
                        "did not find expected '-' indicator",
                        line.mark(),
                    )
                    .with_context("while parsing a block collection", start),
                );
            }

            let rest = line.body[1..].len() - line.body[1..].trim_start_matches(' ').len();
            if line.body.len() == 1 + rest {
                self.idx += 1;
                items.push(self.block_value(&line, indent, depth, false));
            } else {
                // Compact entry: the content after "- " is parsed as if it
                // started its own, more indented line.
                let inner = line.shifted(1 + rest);
                self.lines[self.idx] = inner;
                items.push(self.parse_node(inner.indent, depth + 1));
            }
        }

        Node {
            kind: NodeKind::Sequence(items),
            tag: None,
            mark: start,
        }
    }

    /// Value of a key or item with nothing after the indicator on its line.
    fn block_value(
        &mut self,
        owner: &Line<'_>,
        indent: usize,
        depth: usize,
        in_mapping: bool,
    ) -> Node {
        match self.lines.get(self.idx).copied() {
            Some(next) if next.indent > indent => self.parse_node(next.indent, depth + 1),
            Some(next) if in_mapping && next.indent == indent && is_item(next.body) => {
                self.parse_sequence(indent, depth + 1)
            }
            _ => Node::scalar("", ScalarStyle::Plain, owner.mark_at(owner.body.len())),
        }
    }

    fn scalar(&self, line: &Line<'_>, from: usize, to: usize) -> Node {
        let scalar = scan_scalar(line, from, to).unwrap_or_else(|err| raise(err));

        let plain = scalar.style == ScalarStyle::Plain;
        let kind = if plain && scalar.value == "{}" {
            NodeKind::Mapping(Vec::new())
        } else if plain && scalar.value == "[]" {
            NodeKind::Sequence(Vec::new())
        } else if plain && scalar.value.starts_with(['{', '[']) {
            raise(LoadError::new(
                Stage::Parser,
                "flow collections are not supported",
                scalar.mark,
            ))
        } else {
            NodeKind::Scalar {
                value: scalar.value,
                style: scalar.style,
            }
        };

        Node {
            kind,
            tag: scalar.tag,
            mark: scalar.mark,
        }
    }
}

fn check_duplicate(entries: &[(Node, Node)], key: &Node) {
    let Some(text) = key.as_scalar() else {
        return;
    };
    if let Some((first, _)) = entries.iter().find(|(k, _)| k.as_scalar() == Some(text)) {
        raise(
            LoadError::new(
                Stage::Composer,
                format!("mapping key \"{text}\" already defined at {}", first.mark),
                key.mark,
            )
            .with_context("while composing a mapping", first.mark),
        );
    }
}

fn is_item(body: &str) -> bool {
    body == "-" || body.starts_with("- ")
}
