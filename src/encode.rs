//! Writing a value tree back out as a TOML document.

#[cfg(test)]
#[path = "./encode_tests.rs"]
mod tests;

use crate::error::{EncodeError, EncodeErrorKind};
use crate::parser::is_keylike_byte;
use crate::utf8::{self, Mode};
use crate::{Table, Value};
use std::fmt;

/// Options for [`encode_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Write strings containing newlines as `'''` literals when their content
    /// allows it (default: false)
    pub multiline_strings: bool,
    /// Write non-empty arrays whose elements are all tables as `[[path]]`
    /// sections instead of inline arrays (default: false)
    pub table_array_headers: bool,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn multiline_strings(mut self, enabled: bool) -> Self {
        self.multiline_strings = enabled;
        self
    }

    pub const fn table_array_headers(mut self, enabled: bool) -> Self {
        self.table_array_headers = enabled;
        self
    }
}

/// Encodes a table as a TOML document with default [`EncodeOptions`].
///
/// ```
/// let doc = manifest_toml::parse("[deps]\nserde = \"1.0\"")?;
/// let text = manifest_toml::encode(&doc)?;
/// assert_eq!(text, "[deps]\nserde = \"1.0\"\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn encode(table: &Table) -> Result<String, EncodeError> {
    encode_with(table, &EncodeOptions::default())
}

pub fn encode_with(table: &Table, options: &EncodeOptions) -> Result<String, EncodeError> {
    let mut encoder = Encoder::new(options);
    encoder.section(table)?;
    Ok(encoder.out)
}

/// Encodes an arbitrary value, which must be a table.
pub fn encode_value(value: &Value, options: &EncodeOptions) -> Result<String, EncodeError> {
    match value {
        Value::Table(table) => encode_with(table, options),
        other => Err(EncodeError {
            path: Vec::new(),
            kind: EncodeErrorKind::RootNotTable(other.type_str()),
        }),
    }
}

/// Inline TOML text for a single value, used by `Display`.
pub(crate) fn write_inline_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    let options = EncodeOptions::default();
    let mut encoder = Encoder::new(&options);
    encoder.lenient = true;
    match encoder.inline_value(value) {
        Ok(()) => f.write_str(&encoder.out),
        Err(_) => Err(fmt::Error),
    }
}

/// Writes a key bare when possible, otherwise as a basic string.
pub(crate) fn push_key(out: &mut String, key: &str) {
    if !key.is_empty() && key.bytes().all(is_keylike_byte) {
        out.push_str(key);
    } else {
        push_basic_string(out, key);
    }
}

fn push_basic_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_ascii_control() => {
                out.push_str("\\u00");
                out.push(hex_digit(c as u8 >> 4));
                out.push(hex_digit(c as u8 & 0xF));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn hex_digit(nibble: u8) -> char {
    char::from(b"0123456789ABCDEF"[nibble as usize & 0xF])
}

/// A `'''` literal can hold `s` verbatim: no `'''` run, no trailing quote
/// and no control characters besides tab and line feed.
fn fits_multiline_literal(s: &str) -> bool {
    s.contains('\n')
        && !s.contains("'''")
        && !s.ends_with('\'')
        && utf8::validate(s.as_bytes(), Mode::StringContent).is_ok()
}

fn push_float(out: &mut String, v: f64) {
    if v.is_nan() {
        out.push_str(if v.is_sign_negative() { "-nan" } else { "nan" });
    } else if v.is_infinite() {
        out.push_str(if v.is_sign_positive() { "inf" } else { "-inf" });
    } else {
        let mut buf = zmij::Buffer::new();
        let text = buf.format(v);
        out.push_str(text);
        if !text.contains(['.', 'e', 'E']) {
            out.push_str(".0");
        }
    }
}

struct Encoder<'o> {
    out: String,
    options: &'o EncodeOptions,
    /// Key path of the value being written, for error reports.
    path: Vec<String>,
    /// Writes datetimes without a TOML spelling as-is instead of failing.
    lenient: bool,
}

impl<'o> Encoder<'o> {
    fn new(options: &'o EncodeOptions) -> Self {
        Encoder {
            out: String::new(),
            options,
            path: Vec::new(),
            lenient: false,
        }
    }

    fn fail(&self, kind: EncodeErrorKind) -> EncodeError {
        EncodeError {
            path: self.path.clone(),
            kind,
        }
    }

    fn is_table_array(&self, value: &Value) -> bool {
        match value {
            Value::Array(items) => {
                self.options.table_array_headers
                    && !items.is_empty()
                    && items.iter().all(Value::is_table)
            }
            _ => false,
        }
    }

    /// Writes the `key = value` lines of `table`, then its sub-tables as
    /// sections.
    fn section(&mut self, table: &Table) -> Result<(), EncodeError> {
        trace!(path = ?self.path, "encoding table");
        for (key, value) in table {
            if value.is_table() || self.is_table_array(value) {
                continue;
            }
            self.path.push(key.name.clone());
            push_key(&mut self.out, &key.name);
            self.out.push_str(" = ");
            match value {
                Value::String(s)
                    if self.options.multiline_strings && fits_multiline_literal(s) =>
                {
                    self.out.push_str("'''\n");
                    self.out.push_str(s);
                    self.out.push_str("'''");
                }
                _ => self.inline_value(value)?,
            }
            self.out.push('\n');
            self.path.pop();
        }

        for (key, value) in table {
            self.path.push(key.name.clone());
            match value {
                Value::Table(sub) => {
                    self.header(false);
                    self.section(sub)?;
                }
                Value::Array(items) if self.is_table_array(value) => {
                    for item in items {
                        if let Value::Table(sub) = item {
                            self.header(true);
                            self.section(sub)?;
                        }
                    }
                }
                _ => {}
            }
            self.path.pop();
        }
        Ok(())
    }

    fn header(&mut self, array: bool) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(if array { "[[" } else { "[" });
        for (i, segment) in self.path.iter().enumerate() {
            if i != 0 {
                self.out.push('.');
            }
            push_key(&mut self.out, segment);
        }
        self.out.push_str(if array { "]]\n" } else { "]\n" });
    }

    fn inline_value(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::String(s) => push_basic_string(&mut self.out, s),
            Value::Integer(i) => self.out.push_str(&i.to_string()),
            Value::Float(f) => push_float(&mut self.out, *f),
            Value::Boolean(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Datetime(dt) => {
                let encodable = dt.kind().is_some() && dt.fields_in_range();
                if !encodable && !self.lenient {
                    return Err(self.fail(EncodeErrorKind::UnsupportedDatetime));
                }
                self.out.push_str(&dt.to_string());
            }
            Value::Array(items) => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        self.out.push_str(", ");
                    }
                    self.path.push(i.to_string());
                    self.inline_value(item)?;
                    self.path.pop();
                }
                self.out.push(']');
            }
            Value::Table(table) => {
                if table.is_empty() {
                    self.out.push_str("{}");
                    return Ok(());
                }
                self.out.push_str("{ ");
                for (i, (key, item)) in table.iter().enumerate() {
                    if i != 0 {
                        self.out.push_str(", ");
                    }
                    self.path.push(key.name.clone());
                    push_key(&mut self.out, &key.name);
                    self.out.push_str(" = ");
                    self.inline_value(item)?;
                    self.path.pop();
                }
                self.out.push_str(" }");
            }
        }
        Ok(())
    }
}
