//! Byte classification and the UTF-8 pre-pass.
//!
//! `&str` inputs are valid UTF-8 by construction; byte-slice inputs go
//! through [`validate`] before the structural parser sees them.

#[cfg(test)]
#[path = "./utf8_tests.rs"]
mod tests;

use crate::{Error, ErrorKind, Span};

/// What [`validate`] checks besides UTF-8 well-formedness.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Mode {
    /// Only UTF-8 structure.
    Document,
    /// UTF-8 structure plus the control bytes TOML forbids in string content.
    StringContent,
}

/// Control bytes that may never appear unescaped in TOML text: everything
/// below 0x20 except tab and line feed, plus DEL.
#[inline]
pub(crate) fn is_disallowed_control(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B..=0x1F | 0x7F)
}

/// Converts an escaped code point (`\xHH`, `\uHHHH`, `\UHHHHHHHH`) into a
/// `char`. Surrogates and values past U+10FFFF have no UTF-8 encoding.
#[inline]
pub(crate) fn escape_scalar(code: u32) -> Option<char> {
    if (0xD800..=0xDFFF).contains(&code) || code > 0x10FFFF {
        return None;
    }
    char::from_u32(code)
}

/// Checks that `bytes` is well-formed UTF-8, rejecting overlong encodings,
/// surrogates and code points beyond U+10FFFF, and returns it as text.
pub(crate) fn validate(bytes: &[u8], mode: Mode) -> Result<&str, Error> {
    let mut line = 0usize;
    let mut line_start = 0usize;
    let mut i = 0usize;

    let fail = |offset: usize, line: usize, line_start: usize, kind: ErrorKind| Error {
        kind,
        span: Span::at(offset, offset + 1),
        line_info: Some((line, offset - line_start)),
    };

    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            if b == b'\n' {
                line += 1;
                line_start = i + 1;
            } else if mode == Mode::StringContent && is_disallowed_control(b) {
                return Err(fail(i, line, line_start, ErrorKind::InvalidControlChar(b)));
            }
            i += 1;
            continue;
        }

        let width = match b {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            // 0x80..=0xC1 are continuation bytes or overlong two-byte leads,
            // 0xF5.. would encode past U+10FFFF.
            _ => return Err(fail(i, line, line_start, ErrorKind::InvalidUtf8)),
        };
        // Second-byte bounds exclude overlong forms, surrogates and values
        // above U+10FFFF.
        let (lo, hi) = match b {
            0xE0 => (0xA0, 0xBF),
            0xED => (0x80, 0x9F),
            0xF0 => (0x90, 0xBF),
            0xF4 => (0x80, 0x8F),
            _ => (0x80, 0xBF),
        };
        match bytes.get(i + 1) {
            Some(&next) if next >= lo && next <= hi => {}
            _ => return Err(fail(i, line, line_start, ErrorKind::InvalidUtf8)),
        }
        for k in 2..width {
            match bytes.get(i + k) {
                Some(0x80..=0xBF) => {}
                _ => return Err(fail(i, line, line_start, ErrorKind::InvalidUtf8)),
            }
        }
        i += width;
    }
    // SAFETY: every byte was checked above against the UTF-8 encoding rules.
    Ok(unsafe { std::str::from_utf8_unchecked(bytes) })
}
