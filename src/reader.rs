//! Input decoding: bytes to checked UTF-8 text.

use crate::error::LoadError;
use crate::mark::Mark;
use crate::stage::Stage;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes `input` as UTF-8, skipping a leading byte order mark.
///
/// Returns the text and the byte offset at which it starts in `input`.
pub(crate) fn read(input: &[u8]) -> Result<(&str, usize), LoadError> {
    let offset = if input.starts_with(UTF8_BOM) {
        UTF8_BOM.len()
    } else {
        0
    };
    let bytes = &input[offset..];

    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let valid = std::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default();
            let message = match err.error_len() {
                Some(_) => "invalid leading UTF-8 octet",
                None => "incomplete UTF-8 octet sequence",
            };
            return Err(LoadError::new(
                Stage::Reader,
                message,
                shifted(Mark::locate(valid, valid.len()), offset),
            )
            .with_cause(err));
        }
    };

    if let Some((index, _)) = text.char_indices().find(|(_, ch)| !is_allowed(*ch)) {
        return Err(LoadError::new(
            Stage::Reader,
            "control characters are not allowed",
            shifted(Mark::locate(text, index), offset),
        ));
    }

    Ok((text, offset))
}

/// Whether `ch` may appear anywhere in a YAML stream.
pub(crate) fn is_allowed(ch: char) -> bool {
    !ch.is_control() || matches!(ch, '\t' | '\n' | '\r' | '\u{85}')
}

fn shifted(mark: Mark, offset: usize) -> Mark {
    Mark::new(mark.line, mark.column, mark.index + offset)
}
