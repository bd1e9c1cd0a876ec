//! Source positions attached to load errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the source document.
///
/// `line` and `column` are 1-based; a `line` of 0 means the position is
/// unknown. `index` is the byte offset from the start of the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    pub line: usize,
    pub column: usize,
    pub index: usize,
}

impl Mark {
    pub const fn new(line: usize, column: usize, index: usize) -> Self {
        Self {
            line,
            column,
            index,
        }
    }

    /// Returns `true` when the mark points at a real line.
    pub fn is_known(&self) -> bool {
        self.line > 0
    }

    /// Computes the mark for byte offset `index` within `source`.
    ///
    /// Columns count characters, not bytes. Offsets past the end of `source`
    /// are clamped to its length.
    pub fn locate(source: &str, index: usize) -> Self {
        let index = index.min(source.len());
        let prefix = match source.get(..index) {
            Some(prefix) => prefix,
            None => {
                let boundary = (0..=index)
                    .rev()
                    .find(|i| source.is_char_boundary(*i))
                    .unwrap_or(0);
                &source[..boundary]
            }
        };

        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = prefix[line_start..].chars().count() + 1;
        Self::new(line, column, index)
    }

    /// Renders the mark as a single point.
    pub fn short_string(&self) -> String {
        if !self.is_known() {
            return "<unknown position>".to_string();
        }
        if self.column == 0 {
            return format!("line {}", self.line);
        }
        format!("line {}, column {}", self.line, self.column)
    }

    /// Renders the span from `self` to `other`, collapsing to a single point
    /// when both marks are equal.
    pub fn range_string(&self, other: &Mark) -> String {
        if self == other {
            return self.short_string();
        }
        format!("{} to {}", self.short_string(), other.short_string())
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Mark;

    #[test]
    fn short_string_variants() {
        assert_eq!(Mark::new(4, 2, 40).short_string(), "line 4, column 2");
        assert_eq!(Mark::new(7, 0, 0).short_string(), "line 7");
        assert_eq!(Mark::default().short_string(), "<unknown position>");
        assert_eq!(Mark::new(3, 5, 12).to_string(), "line 3, column 5");
    }

    #[test]
    fn range_collapses_for_equal_marks() {
        let start = Mark::new(1, 1, 0);
        let end = Mark::new(2, 3, 12);
        assert_eq!(
            start.range_string(&end),
            "line 1, column 1 to line 2, column 3"
        );
        assert_eq!(end.range_string(&end), "line 2, column 3");
    }

    #[test]
    fn locate_counts_lines_and_characters() {
        let source = "a: 1\nbé: x\n";
        assert_eq!(Mark::locate(source, 0), Mark::new(1, 1, 0));
        assert_eq!(Mark::locate(source, 5), Mark::new(2, 1, 5));
        // 'é' is two bytes but one column.
        assert_eq!(Mark::locate(source, 8), Mark::new(2, 3, 8));
        assert_eq!(Mark::locate(source, 100).index, source.len());
    }
}
