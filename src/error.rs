use crate::Span;
use std::fmt::{self, Debug, Display};

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;

/// Error produced when a TOML document fails to parse.
#[derive(Debug, Clone)]
pub struct Error {
    /// The error kind
    pub kind: ErrorKind,
    /// The span where the error occurs.
    ///
    /// Note some [`ErrorKind`] contain additional span information
    pub span: Span,
    /// Zero-based line and column of `span.start`, available for every error
    /// coming from the parser
    pub line_info: Option<(usize, usize)>,
}

impl std::error::Error for Error {}

impl From<(ErrorKind, Span)> for Error {
    fn from((kind, span): (ErrorKind, Span)) -> Self {
        Self {
            kind,
            span,
            line_info: None,
        }
    }
}

impl Error {
    /// One-based line of the error location.
    pub fn line(&self) -> Option<usize> {
        self.line_info.map(|(line, _)| line + 1)
    }

    /// One-based column (in bytes) of the error location.
    pub fn column(&self) -> Option<usize> {
        self.line_info.map(|(_, col)| col + 1)
    }

    /// Broad class of the failure, see [`Category`].
    pub fn category(&self) -> Category {
        self.kind.category()
    }
}

/// Coarse classification of parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Malformed UTF-8, a disallowed control byte, or oversized input.
    Encoding,
    /// Token-level problems: unterminated constructs, bad escapes, stray
    /// characters.
    Lex,
    /// Well-formed tokens that violate TOML's rules: number grammar, calendar
    /// ranges, nesting limits and redefinitions.
    Semantic,
}

/// Errors that can occur when parsing a document.
#[derive(Clone)]
pub enum ErrorKind {
    /// The input is not well-formed UTF-8.
    InvalidUtf8,

    /// A control byte that TOML never allows unescaped (0x00-0x08,
    /// 0x0B-0x1F or 0x7F) appeared outside a string.
    InvalidControlChar(u8),

    /// The input is larger than the configured maximum.
    FileTooLarge {
        /// The configured limit in bytes
        limit: usize,
    },

    /// EOF was reached when looking for a value.
    UnexpectedEof,

    /// An unexpected character was encountered at the start of a line.
    Unexpected(char),

    /// Wanted one sort of token, but found another.
    Wanted {
        /// Expected token type.
        expected: &'static str,
        /// Actually found token type.
        found: &'static str,
    },

    /// EOF was found before the closing quote of a string.
    UnterminatedString,

    /// EOF was found before the closing `]` of an array.
    UnterminatedArray,

    /// EOF was found before the closing `}` of an inline table.
    UnterminatedInlineTable,

    /// EOF was found before the closing `]` or `]]` of a table header.
    UnterminatedTableHeader,

    /// An invalid character not allowed in a string was found.
    InvalidCharInString(char),

    /// An invalid character was found as an escape.
    InvalidEscape(char),

    /// An invalid character was found in a hex escape.
    InvalidHexEscape(char),

    /// An escape names a code point outside the Unicode scalar values.
    InvalidEscapeValue(u32),

    /// Multiline strings are not allowed for key.
    MultilineStringKey,

    /// A bare word appeared where a value was expected.
    UnquotedString,

    /// A number failed to parse; the payload says why.
    InvalidNumber(&'static str),

    /// A date/time literal has an out-of-range component.
    InvalidDatetime,

    /// Arrays and inline tables are nested deeper than allowed.
    NestingTooDeep {
        /// The configured limit
        limit: usize,
    },

    /// A key was assigned twice, or a table header was declared twice.
    DuplicateKey {
        /// The duplicate key
        key: String,
        /// The span where the first key is located
        first: Span,
    },

    /// A key already holds a different kind of entry than the one being
    /// defined, e.g. a value reopened as a table.
    TypeConflict {
        /// The conflicting key
        key: String,
        /// What the key already holds
        existing: &'static str,
        /// The span where the key was first defined
        first: Span,
    },
}

impl ErrorKind {
    /// Broad class of the failure.
    pub fn category(&self) -> Category {
        match self {
            Self::InvalidUtf8 | Self::InvalidControlChar(_) | Self::FileTooLarge { .. } => {
                Category::Encoding
            }
            Self::UnexpectedEof
            | Self::Unexpected(_)
            | Self::Wanted { .. }
            | Self::UnterminatedString
            | Self::UnterminatedArray
            | Self::UnterminatedInlineTable
            | Self::UnterminatedTableHeader
            | Self::InvalidCharInString(_)
            | Self::InvalidEscape(_)
            | Self::InvalidHexEscape(_)
            | Self::InvalidEscapeValue(_)
            | Self::MultilineStringKey
            | Self::UnquotedString => Category::Lex,
            Self::InvalidNumber(_)
            | Self::InvalidDatetime
            | Self::NestingTooDeep { .. }
            | Self::DuplicateKey { .. }
            | Self::TypeConflict { .. } => Category::Semantic,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InvalidUtf8 => "invalid-utf8",
            Self::InvalidControlChar(..) => "invalid-control-char",
            Self::FileTooLarge { .. } => "file-too-large",
            Self::UnexpectedEof => "unexpected-eof",
            Self::Unexpected(..) => "unexpected",
            Self::Wanted { .. } => "wanted",
            Self::UnterminatedString => "unterminated-string",
            Self::UnterminatedArray => "unterminated-array",
            Self::UnterminatedInlineTable => "unterminated-inline-table",
            Self::UnterminatedTableHeader => "unterminated-table-header",
            Self::InvalidCharInString(..) => "invalid-char-in-string",
            Self::InvalidEscape(..) => "invalid-escape",
            Self::InvalidHexEscape(..) => "invalid-hex-escape",
            Self::InvalidEscapeValue(..) => "invalid-escape-value",
            Self::MultilineStringKey => "multiline-string-key",
            Self::UnquotedString => "unquoted-string",
            Self::InvalidNumber(..) => "invalid-number",
            Self::InvalidDatetime => "invalid-datetime",
            Self::NestingTooDeep { .. } => "nesting-too-deep",
            Self::DuplicateKey { .. } => "duplicate-key",
            Self::TypeConflict { .. } => "type-conflict",
        };
        f.write_str(text)
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

struct Escape(char);

impl fmt::Display for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        if self.0.is_whitespace() || self.0.is_control() {
            for esc in self.0.escape_default() {
                f.write_char(esc)?;
            }
            Ok(())
        } else {
            f.write_char(self.0)
        }
    }
}

impl Error {
    fn write_message(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InvalidUtf8 => f.write_str("invalid utf-8 sequence"),
            ErrorKind::InvalidControlChar(b) => {
                write!(f, "control character 0x{b:02X} is not allowed here")
            }
            ErrorKind::FileTooLarge { limit } => {
                write!(f, "input is too large (maximum {limit} bytes)")
            }
            ErrorKind::UnexpectedEof => f.write_str("unexpected eof encountered"),
            ErrorKind::Unexpected(c) => {
                write!(f, "unexpected character found: `{}`", Escape(*c))
            }
            ErrorKind::Wanted { expected, found } => write!(f, "expected {expected}, found {found}"),
            ErrorKind::UnterminatedString => f.write_str("unterminated string"),
            ErrorKind::UnterminatedArray => f.write_str("unterminated array, expected `]`"),
            ErrorKind::UnterminatedInlineTable => {
                f.write_str("unterminated inline table, expected `}`")
            }
            ErrorKind::UnterminatedTableHeader => f.write_str("unterminated table header"),
            ErrorKind::InvalidCharInString(c) => {
                write!(f, "invalid character in string: `{}`", Escape(*c))
            }
            ErrorKind::InvalidEscape(c) => {
                write!(f, "invalid escape character in string: `{}`", Escape(*c))
            }
            ErrorKind::InvalidHexEscape(c) => {
                write!(f, "invalid hex escape character in string: `{}`", Escape(*c))
            }
            ErrorKind::InvalidEscapeValue(c) => write!(f, "invalid escape value: `{c:#X}`"),
            ErrorKind::MultilineStringKey => {
                f.write_str("multiline strings are not allowed for key")
            }
            ErrorKind::UnquotedString => {
                f.write_str("invalid TOML value, did you mean to use a quoted string?")
            }
            ErrorKind::InvalidNumber(reason) => write!(f, "invalid number: {reason}"),
            ErrorKind::InvalidDatetime => f.write_str("invalid date or time"),
            ErrorKind::NestingTooDeep { limit } => {
                write!(f, "arrays and inline tables nested deeper than {limit} levels")
            }
            ErrorKind::DuplicateKey { key, .. } => write!(f, "duplicate key: `{key}`"),
            ErrorKind::TypeConflict { key, existing, .. } => {
                write!(f, "cannot redefine `{key}`, it is already defined as {existing}")
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_message(f)?;
        if let (Some(line), Some(column)) = (self.line(), self.column()) {
            write!(f, " at line {line}, column {column}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "reporting")]
#[cfg_attr(docsrs, doc(cfg(feature = "reporting")))]
impl Error {
    /// Converts this [`Error`] into a [`codespan_reporting::diagnostic::Diagnostic`]
    pub fn to_diagnostic<FileId: Copy + PartialEq>(
        &self,
        fid: FileId,
    ) -> codespan_reporting::diagnostic::Diagnostic<FileId> {
        use codespan_reporting::diagnostic::{Diagnostic, Label};

        struct Message<'a>(&'a Error);
        impl Display for Message<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.write_message(f)
            }
        }

        let diag = Diagnostic::error()
            .with_code(self.kind.to_string())
            .with_message(Message(self).to_string());

        match &self.kind {
            ErrorKind::DuplicateKey { first, .. } => diag.with_labels(vec![
                Label::secondary(fid, *first).with_message("first defined here"),
                Label::primary(fid, self.span).with_message("duplicate key"),
            ]),
            ErrorKind::TypeConflict { first, existing, .. } => diag.with_labels(vec![
                Label::secondary(fid, *first).with_message(format!("defined as {existing} here")),
                Label::primary(fid, self.span).with_message("redefined here"),
            ]),
            ErrorKind::UnterminatedString
            | ErrorKind::UnterminatedArray
            | ErrorKind::UnterminatedInlineTable
            | ErrorKind::UnterminatedTableHeader => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message("eof reached before terminator"),
            ]),
            ErrorKind::Wanted { expected, .. } => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message(format!("expected {expected}")),
            ]),
            ErrorKind::UnquotedString => diag.with_labels(vec![
                Label::primary(fid, self.span).with_message("string is not quoted"),
            ]),
            _ => diag.with_labels(vec![Label::primary(fid, self.span)]),
        }
    }
}

/// Error produced when a value tree cannot be written as TOML.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeError {
    /// Key path from the document root to the offending value. Array
    /// elements are recorded by their index.
    pub path: Vec<String>,
    /// What went wrong.
    pub kind: EncodeErrorKind,
}

/// The reason a value could not be encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeErrorKind {
    /// The document root is not a table; the payload names its actual type.
    RootNotTable(&'static str),
    /// A datetime that has no TOML spelling. Either its fields do not combine
    /// into a literal (an offset without a time, or neither date nor time),
    /// or one of them is out of range (month 13, hour 24, February 30).
    UnsupportedDatetime,
}

impl std::error::Error for EncodeError {}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cannot encode ")?;
        if self.path.is_empty() {
            f.write_str("document root")?;
        } else {
            let mut dotted = String::new();
            for (i, segment) in self.path.iter().enumerate() {
                if i != 0 {
                    dotted.push('.');
                }
                crate::encode::push_key(&mut dotted, segment);
            }
            write!(f, "`{dotted}`")?;
        }
        match &self.kind {
            EncodeErrorKind::RootNotTable(found) => {
                write!(f, ": expected a table, found {found}")
            }
            EncodeErrorKind::UnsupportedDatetime => {
                f.write_str(": datetime has no TOML representation")
            }
        }
    }
}
