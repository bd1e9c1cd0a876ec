//! Line scanner for the block YAML subset.
//!
//! Splits the decoded input into significant lines with their indentation and
//! reads scalar tokens. Faults are returned to the caller.

use crate::error::LoadError;
use crate::mark::Mark;
use crate::node::ScalarStyle;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy)]
/// A non-blank, non-comment source line.
pub(crate) struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the line start in the original input.
    pub start: usize,
    /// Columns of leading spaces before `body`.
    pub indent: usize,
    /// Content after the indentation, without trailing comment or spaces.
    pub body: &'a str,
}

impl<'a> Line<'a> {
    pub fn mark(&self) -> Mark {
        self.mark_at(0)
    }

    /// Mark of byte `offset` within `body`.
    pub fn mark_at(&self, offset: usize) -> Mark {
        let offset = offset.min(self.body.len());
        let chars = self.body.get(..offset).map_or(0, |s| s.chars().count());
        Mark::new(
            self.number,
            self.indent + chars + 1,
            self.start + self.indent + offset,
        )
    }

    /// Returns the line with the first `offset` bytes of its body moved into
    /// the indentation. `offset` must cover ASCII only.
    pub fn shifted(&self, offset: usize) -> Line<'a> {
        Line {
            number: self.number,
            start: self.start,
            indent: self.indent + offset,
            body: &self.body[offset..],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A scalar token with its optional tag.
pub(crate) struct Scalar {
    pub tag: Option<String>,
    pub value: String,
    pub style: ScalarStyle,
    pub mark: Mark,
}

/// Splits `text` into significant lines. `offset` is the byte position of
/// `text` within the original input.
pub(crate) fn scan_lines(text: &str, offset: usize) -> Result<Vec<Line<'_>>, LoadError> {
    let mut lines = Vec::new();
    let mut start = offset;

    for (idx, raw) in text.split('\n').enumerate() {
        let line_start = start;
        start += raw.len() + 1;

        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let indent = raw.len() - raw.trim_start_matches(' ').len();
        let rest = &raw[indent..];

        if rest.trim().is_empty() || rest.starts_with('#') {
            continue;
        }

        if rest.starts_with('\t') {
            let mark = Mark::new(idx + 1, indent + 1, line_start + indent);
            return Err(LoadError::new(
                Stage::Scanner,
                "found character that cannot start any token",
                mark,
            )
            .with_context("while scanning for the next token", Mark::new(idx + 1, 1, line_start)));
        }

        let mut line = Line {
            number: idx + 1,
            start: line_start,
            indent,
            body: rest,
        };
        line.body = strip_comment(&line)?;

        if lines.is_empty() && indent == 0 && matches!(line.body, "---" | "...") {
            continue;
        }
        lines.push(line);
    }

    Ok(lines)
}

/// Finds the `:` separating a mapping key from its value.
///
/// Returns the byte offsets of the end of the key and the start of the value.
pub(crate) fn split_key(body: &str) -> Option<(usize, usize)> {
    let mut quote: Option<char> = None;
    let mut prev = ' ';
    let bytes = body.as_bytes();

    for (i, ch) in body.char_indices() {
        match quote {
            Some('"') if ch == '"' && prev != '\\' => quote = None,
            Some('\'') if ch == '\'' => quote = None,
            Some(_) => {}
            None if (ch == '"' || ch == '\'') && prev == ' ' => quote = Some(ch),
            None if ch == ':' => {
                let next = bytes.get(i + 1).copied();
                if next.is_none() || next == Some(b' ') {
                    let value_start = body[i + 1..]
                        .find(|c: char| c != ' ')
                        .map_or(body.len(), |p| i + 1 + p);
                    return Some((i, value_start));
                }
            }
            None => {}
        }
        prev = if prev == '\\' && ch == '\\' { ' ' } else { ch };
    }
    None
}

/// Reads the scalar occupying `body[from..to]` of `line`.
pub(crate) fn scan_scalar(line: &Line<'_>, from: usize, to: usize) -> Result<Scalar, LoadError> {
    let text = &line.body[from..to];
    let mark = line.mark_at(from);

    let (tag, value_offset) = if text.starts_with('!') {
        let end = text.find(' ').unwrap_or(text.len());
        let value_offset = text[end..]
            .find(|c: char| c != ' ')
            .map_or(text.len(), |p| end + p);
        (Some(text[..end].to_string()), value_offset)
    } else {
        (None, 0)
    };
    let start = from + value_offset;
    let text = text[value_offset..].trim_end();

    let (value, style) = match text.chars().next() {
        Some('"') => (read_double_quoted(line, start, text)?, ScalarStyle::DoubleQuoted),
        Some('\'') => (read_single_quoted(line, start, text)?, ScalarStyle::SingleQuoted),
        _ => (text.to_string(), ScalarStyle::Plain),
    };

    Ok(Scalar {
        tag,
        value,
        style,
        mark,
    })
}

fn read_double_quoted(line: &Line<'_>, from: usize, text: &str) -> Result<String, LoadError> {
    let mut out = String::new();
    let mut chars = text.char_indices().skip(1);

    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => {
                expect_end(line, from, text, i + 1)?;
                return Ok(out);
            }
            '\\' => {
                let Some((j, escaped)) = chars.next() else {
                    break;
                };
                match escaped {
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '/' => out.push('/'),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    ' ' => out.push(' '),
                    'x' | 'u' | 'U' => {
                        let width = match escaped {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let digits = text.get(j + 1..j + 1 + width).unwrap_or("");
                        let decoded = u32::from_str_radix(digits, 16)
                            .ok()
                            .filter(|_| digits.len() == width)
                            .and_then(char::from_u32);
                        match decoded {
                            Some(c) => out.push(c),
                            None => {
                                return Err(quoted_error(
                                    line,
                                    from,
                                    "did not find expected hexdecimal number",
                                    from + j,
                                ))
                            }
                        }
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    _ => {
                        return Err(quoted_error(
                            line,
                            from,
                            "found unknown escape character",
                            from + j,
                        ))
                    }
                }
            }
            _ => out.push(ch),
        }
    }

    Err(quoted_error(line, from, "found unexpected end of stream", from + text.len()))
}

fn read_single_quoted(line: &Line<'_>, from: usize, text: &str) -> Result<String, LoadError> {
    let mut out = String::new();
    let mut chars = text.char_indices().skip(1).peekable();

    while let Some((i, ch)) = chars.next() {
        if ch == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                out.push('\'');
                continue;
            }
            expect_end(line, from, text, i + 1)?;
            return Ok(out);
        }
        out.push(ch);
    }

    Err(quoted_error(line, from, "found unexpected end of stream", from + text.len()))
}

fn expect_end(line: &Line<'_>, from: usize, text: &str, end: usize) -> Result<(), LoadError> {
    if text[end..].trim().is_empty() {
        Ok(())
    } else {
        Err(LoadError::new(
            Stage::Scanner,
            "did not find expected key",
            line.mark_at(from + end),
        )
        .with_context("while scanning a quoted scalar", line.mark_at(from)))
    }
}

fn quoted_error(line: &Line<'_>, start: usize, message: &str, at: usize) -> LoadError {
    LoadError::new(Stage::Scanner, message, line.mark_at(at))
        .with_context("while scanning a quoted scalar", line.mark_at(start))
}

fn strip_comment<'a>(line: &Line<'a>) -> Result<&'a str, LoadError> {
    let body = line.body;
    let mut quote: Option<(char, usize)> = None;
    let mut prev = ' ';

    for (i, ch) in body.char_indices() {
        match quote {
            Some(('"', _)) if ch == '"' && prev != '\\' => quote = None,
            Some(('\'', _)) if ch == '\'' => quote = None,
            Some(_) => {}
            None if ch == '#' && prev.is_whitespace() => return Ok(body[..i].trim_end()),
            None if (ch == '"' || ch == '\'') && is_token_start(prev) => quote = Some((ch, i)),
            None => {}
        }
        prev = if prev == '\\' && ch == '\\' { ' ' } else { ch };
    }

    if let Some((_, start)) = quote {
        return Err(quoted_error(line, start, "found unexpected end of stream", body.len()));
    }
    Ok(body.trim_end())
}

fn is_token_start(prev: char) -> bool {
    matches!(prev, ' ' | '\t')
}

#[cfg(test)]
mod tests {
    use super::{scan_lines, scan_scalar, split_key};
    use crate::mark::Mark;
    use crate::node::ScalarStyle;
    use crate::stage::Stage;

    #[test]
    fn skips_blank_and_comment_lines() {
        let lines = scan_lines("---\n# header\n\nname: demo # trailing\n  port: 80\n", 0).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 4);
        assert_eq!(lines[0].body, "name: demo");
        assert_eq!(lines[1].indent, 2);
        assert_eq!(lines[1].mark(), Mark::new(5, 3, 38));
    }

    #[test]
    fn rejects_tab_indentation() {
        let err = scan_lines("a:\n\tb: 1\n", 0).unwrap_err();
        assert_eq!(err.stage(), Stage::Scanner);
        assert_eq!(err.mark(), Mark::new(2, 1, 3));
        assert_eq!(err.context().unwrap().message, "while scanning for the next token");
    }

    #[test]
    fn reports_unterminated_quote_from_its_start() {
        let err = scan_lines("key: \"open\n", 0).unwrap_err();
        assert_eq!(err.message(), "found unexpected end of stream");
        let context = err.context().unwrap();
        assert_eq!(context.message, "while scanning a quoted scalar");
        assert_eq!(context.mark, Mark::new(1, 6, 5));
    }

    #[test]
    fn splits_keys_outside_quotes() {
        assert_eq!(split_key("a: b"), Some((1, 3)));
        assert_eq!(split_key("a:"), Some((1, 2)));
        assert_eq!(split_key("\"a: b\": c"), Some((6, 8)));
        assert_eq!(split_key("http://x"), None);
        assert_eq!(split_key("\"#\\\\\": 1"), Some((5, 7)));
        assert_eq!(split_key("'a\\': b"), Some((4, 6)));
    }

    #[test]
    fn reads_tagged_and_quoted_scalars() {
        let lines = scan_lines("a: !!int \"12\"\nb: 'it''s'\nc: \"\\u00e9\\n\"\n", 0).unwrap();

        let tagged = scan_scalar(&lines[0], 3, lines[0].body.len()).unwrap();
        assert_eq!(tagged.tag.as_deref(), Some("!!int"));
        assert_eq!(tagged.value, "12");
        assert_eq!(tagged.style, ScalarStyle::DoubleQuoted);
        assert_eq!(tagged.mark, Mark::new(1, 4, 3));

        let single = scan_scalar(&lines[1], 3, lines[1].body.len()).unwrap();
        assert_eq!(single.value, "it's");

        let escaped = scan_scalar(&lines[2], 3, lines[2].body.len()).unwrap();
        assert_eq!(escaped.value, "é\n");
    }

    #[test]
    fn rejects_unknown_escape() {
        let lines = scan_lines("a: \"\\q\"\n", 0).unwrap();
        let err = scan_scalar(&lines[0], 3, lines[0].body.len()).unwrap_err();
        assert_eq!(err.message(), "found unknown escape character");
        assert_eq!(err.mark(), Mark::new(1, 6, 5));
    }
}
