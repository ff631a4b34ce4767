//! The structural driver.
//!
//! A byte-oriented state machine: every step looks at the current [`State`]
//! and the next significant byte, performs one transition and names the
//! state to continue in. Arrays and inline tables are built on an explicit
//! frame stack, so nesting never recurses.

#[cfg(test)]
#[path = "./parser_tests.rs"]
mod tests;

use crate::table::Shape;
use crate::utf8::{self, Mode};
use crate::value::{Key, Value};
use crate::{Datetime, Error, ErrorKind, Span, Table};

/// Tables with at least this many entries use the hash index for lookups.
const INDEXED_TABLE_THRESHOLD: usize = 6;

/// How date/time literals appear in the parsed tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DatetimeFormat {
    /// A [`Value::String`] holding the literal exactly as written.
    Literal,
    /// A [`Value::Datetime`].
    #[default]
    Structured,
}

/// Options for [`parse_with`] and [`parse_slice`].
///
/// ```
/// use manifest_toml::{DatetimeFormat, ParseOptions};
///
/// let options = ParseOptions::default()
///     .max_nesting_depth(16)
///     .datetime(DatetimeFormat::Literal);
/// let doc = manifest_toml::parse_with("at = 1979-05-27", &options)?;
/// assert_eq!(doc.get("at").and_then(|v| v.as_str()), Some("1979-05-27"));
/// # Ok::<(), manifest_toml::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of arrays and inline tables open at once.
    pub max_nesting_depth: usize,
    /// Maximum input length in bytes.
    pub max_input_size: usize,
    /// Whether date/time literals become [`Value::Datetime`] or strings
    /// holding their source text.
    pub datetime: DatetimeFormat,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 1000,
            max_input_size: 100_000_000,
            datetime: DatetimeFormat::Structured,
        }
    }
}

impl ParseOptions {
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn max_input_size(mut self, bytes: usize) -> Self {
        self.max_input_size = bytes;
        self
    }

    pub fn datetime(mut self, format: DatetimeFormat) -> Self {
        self.datetime = format;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Beginning of a line at the top level.
    StartOfLine,
    /// Expecting a key segment inside `[...]` or `[[...]]`.
    Table,
    /// After a header key segment: `.` or the closing bracket.
    InsideTable,
    /// Expecting a key segment of `key = value`.
    Key,
    /// After a key segment: `.` or the assignment.
    InsideKey,
    Assign,
    Value,
    /// After `[` or `,` in an array.
    Array,
    /// After an array element: `,` or `]`.
    InsideArray,
    /// After `{` or `,` in an inline table.
    WaitForKey,
    /// After an inline table entry: `,` or `}`.
    InsideInlineTable,
    /// After a complete top-level line; only a comment may follow.
    WaitForNewline,
}

enum Transition {
    To(State),
    /// The next state depends on the enclosing construct, see
    /// [`Parser::resume`].
    Resume,
    Finish,
}

enum FrameKind {
    Array(Vec<Value>),
    Inline(Table),
}

/// An open array or inline table.
struct Frame {
    kind: FrameKind,
    /// Key path the finished container is assigned to.
    parent_keys: Vec<Key>,
    start: usize,
}

struct Header {
    is_array: bool,
    start: usize,
}

/// Hash index over wide tables. Tables are identified by the span start of
/// their first key, which is unique within one document.
#[derive(Default)]
struct KeyIndex {
    tables: foldhash::HashMap<u32, foldhash::HashMap<Box<str>, usize>>,
}

impl KeyIndex {
    fn find(&self, table: &Table, name: &str) -> Option<usize> {
        if table.len() >= INDEXED_TABLE_THRESHOLD {
            let first = table.first_key_span_start()?;
            self.tables.get(&first)?.get(name).copied()
        } else {
            table.find_index(name)
        }
    }

    fn push(&mut self, table: &mut Table, key: Key, value: Value, shape: Shape) -> usize {
        let idx = table.push_entry(key, value, shape);
        let len = table.len();
        if len < INDEXED_TABLE_THRESHOLD {
            return idx;
        }
        let Some(first) = table.first_key_span_start() else {
            return idx;
        };
        let names = self.tables.entry(first).or_default();
        if len == INDEXED_TABLE_THRESHOLD {
            for (i, entry) in table.entries().iter().enumerate() {
                names.insert(entry.key.name.as_str().into(), i);
            }
        } else {
            names.insert(table.entry(idx).key.name.as_str().into(), idx);
        }
        idx
    }

    /// Inserts a value, rejecting any existing entry of the same name.
    fn insert(
        &mut self,
        table: &mut Table,
        key: Key,
        value: Value,
        shape: Shape,
    ) -> Result<(), Error> {
        if let Some(idx) = self.find(table, &key.name) {
            let first = table.entry(idx).key.span;
            return Err(Error::from((
                ErrorKind::DuplicateKey {
                    key: key.name,
                    first,
                },
                key.span,
            )));
        }
        self.push(table, key, value, shape);
        Ok(())
    }

    /// Resolves a dotted key (`a.b.c = value`) relative to `table`.
    fn assign(
        &mut self,
        table: &mut Table,
        mut keys: Vec<Key>,
        value: Value,
        shape: Shape,
    ) -> Result<(), Error> {
        let Some(last) = keys.pop() else {
            unreachable!("value delivered without a key")
        };
        let mut table = table;
        for key in keys {
            let idx = self.dotted(table, key)?;
            table = descend(table, idx);
        }
        self.insert(table, last, value, shape)
    }

    /// Intermediate segment of a dotted key. Only tables created implicitly
    /// may be extended this way.
    fn dotted(&mut self, table: &mut Table, key: Key) -> Result<usize, Error> {
        match self.find(table, &key.name) {
            Some(idx) => {
                let entry = table.entry(idx);
                match (entry.shape, &entry.value) {
                    (Shape::AutoDictionary | Shape::Dotted, Value::Table(_)) => Ok(idx),
                    (shape, _) => Err(conflict(key, shape, entry.key.span)),
                }
            }
            None => Ok(self.push(table, key, Value::Table(Table::new()), Shape::Dotted)),
        }
    }

    /// Intermediate segment of a table header, e.g. `a` in `[a.b]`.
    fn header_intermediate(&mut self, table: &mut Table, key: Key) -> Result<usize, Error> {
        match self.find(table, &key.name) {
            Some(idx) => {
                let entry = table.entry(idx);
                match (entry.shape, &entry.value) {
                    (Shape::Inline, _) => Err(conflict(key, Shape::Inline, entry.key.span)),
                    (_, Value::Table(_)) => Ok(idx),
                    (Shape::ArrayOfTables, Value::Array(_)) => Ok(idx),
                    (shape, _) => Err(conflict(key, shape, entry.key.span)),
                }
            }
            None => Ok(self.push(
                table,
                key,
                Value::Table(Table::new()),
                Shape::AutoDictionary,
            )),
        }
    }

    /// Final segment of a `[table]` header.
    fn header_table(&mut self, table: &mut Table, key: Key) -> Result<usize, Error> {
        let Some(idx) = self.find(table, &key.name) else {
            return Ok(self.push(table, key, Value::Table(Table::new()), Shape::Dictionary));
        };
        let entry = table.entry_mut(idx);
        match entry.shape {
            // Created implicitly by an earlier header; now defined for real.
            Shape::AutoDictionary => {
                entry.shape = Shape::Dictionary;
                Ok(idx)
            }
            Shape::Dictionary => Err(Error::from((
                ErrorKind::DuplicateKey {
                    key: key.name,
                    first: entry.key.span,
                },
                key.span,
            ))),
            shape => Err(conflict(key, shape, entry.key.span)),
        }
    }

    /// Final segment of a `[[array]]` header: appends a fresh table.
    fn header_array(&mut self, table: &mut Table, key: Key) -> Result<usize, Error> {
        let Some(idx) = self.find(table, &key.name) else {
            let value = Value::Array(vec![Value::Table(Table::new())]);
            return Ok(self.push(table, key, value, Shape::ArrayOfTables));
        };
        let entry = table.entry_mut(idx);
        match (entry.shape, &mut entry.value) {
            (Shape::ArrayOfTables, Value::Array(items)) => {
                items.push(Value::Table(Table::new()));
                Ok(idx)
            }
            (shape, _) => Err(conflict(key, shape, entry.key.span)),
        }
    }
}

fn conflict(key: Key, existing: Shape, first: Span) -> Error {
    Error::from((
        ErrorKind::TypeConflict {
            key: key.name,
            existing: existing.describe(),
            first,
        },
        key.span,
    ))
}

/// Steps into the table held by entry `idx`. For an array of tables this is
/// its last element.
fn descend(table: &mut Table, idx: usize) -> &mut Table {
    match &mut table.entry_mut(idx).value {
        Value::Table(t) => t,
        Value::Array(items) => match items.last_mut() {
            Some(Value::Table(t)) => t,
            _ => unreachable!("array of tables without a table element"),
        },
        _ => unreachable!("descending into a scalar"),
    }
}

#[inline]
pub(crate) fn is_keylike_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

#[inline]
fn is_number_byte(b: u8) -> bool {
    is_keylike_byte(b) || b == b'+' || b == b'.'
}

struct Parser<'a> {
    text: &'a str,
    /// Raw bytes of `text`.
    bytes: &'a [u8],
    cursor: usize,
    options: &'a ParseOptions,

    root: Table,
    /// Entry indices leading from the root to the table that top-level
    /// `key = value` lines write into.
    current: Vec<usize>,
    /// Pending key path of a header or an assignment.
    keys: Vec<Key>,
    header: Option<Header>,
    frames: Vec<Frame>,
    index: KeyIndex,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, options: &'a ParseOptions) -> Self {
        Parser {
            text,
            bytes: text.as_bytes(),
            // A leading byte order mark is skipped.
            cursor: if text.starts_with('\u{feff}') { 3 } else { 0 },
            options,
            root: Table::new(),
            current: Vec::new(),
            keys: Vec::new(),
            header: None,
            frames: Vec::new(),
            index: KeyIndex::default(),
        }
    }

    fn run(&mut self) -> Result<(), Error> {
        let mut state = State::StartOfLine;
        loop {
            trace!(?state, cursor = self.cursor, "step");
            state = match self.step(state)? {
                Transition::To(next) => next,
                Transition::Resume => self.resume(),
                Transition::Finish => return Ok(()),
            };
        }
    }

    fn step(&mut self, state: State) -> Result<Transition, Error> {
        use Transition::*;

        match state {
            State::Array
            | State::InsideArray
            | State::WaitForKey
            | State::InsideInlineTable => self.eat_intermediate()?,
            _ => self.eat_whitespace(),
        }

        let next = self.peek_byte();
        match (state, next) {
            (State::StartOfLine, None) => Ok(Finish),
            (State::StartOfLine, Some(b'#')) => {
                self.eat_comment()?;
                Ok(To(State::StartOfLine))
            }
            (State::StartOfLine, Some(b'\n' | b'\r')) => {
                if !self.eat_newline() {
                    return Err(error(self.cursor, self.cursor + 1, ErrorKind::Unexpected('\r')));
                }
                Ok(To(State::StartOfLine))
            }
            (State::StartOfLine, Some(b'[')) => {
                let start = self.cursor;
                self.cursor += 1;
                let is_array = self.eat_byte(b'[');
                self.header = Some(Header { is_array, start });
                self.keys.clear();
                Ok(To(State::Table))
            }
            (State::StartOfLine, Some(_)) => {
                self.keys.clear();
                Ok(To(State::Key))
            }

            (State::Table | State::InsideTable, None) => Err(self.eof_error()),
            (State::Table, Some(_)) => {
                let key = self.read_key()?;
                self.keys.push(key);
                Ok(To(State::InsideTable))
            }
            (State::InsideTable, Some(b'.')) => {
                self.cursor += 1;
                Ok(To(State::Table))
            }
            (State::InsideTable, Some(b']')) => {
                self.cursor += 1;
                let Some(header) = self.header.take() else {
                    unreachable!("header state without a header")
                };
                if header.is_array && !self.eat_byte(b']') {
                    self.header = Some(header);
                    return Err(match self.peek_byte() {
                        None => self.eof_error(),
                        Some(_) => self.wanted("a right bracket"),
                    });
                }
                self.resolve_header(header)?;
                Ok(To(State::WaitForNewline))
            }
            (State::InsideTable, Some(_)) => Err(self.wanted("a period or a right bracket")),

            (State::Key, Some(_)) => {
                let key = self.read_key()?;
                self.keys.push(key);
                Ok(To(State::InsideKey))
            }
            (State::InsideKey, Some(b'.')) => {
                self.cursor += 1;
                Ok(To(State::Key))
            }
            (State::InsideKey, Some(_)) => Ok(To(State::Assign)),
            (State::Assign, Some(b'=')) => {
                self.cursor += 1;
                Ok(To(State::Value))
            }
            (State::Assign, Some(_)) => Err(self.wanted("an equals")),

            (State::Value, Some(b'[')) => {
                self.open_frame(FrameKind::Array(Vec::new()))?;
                Ok(To(State::Array))
            }
            (State::Value, Some(b'{')) => {
                self.open_frame(FrameKind::Inline(Table::new()))?;
                Ok(To(State::WaitForKey))
            }
            (State::Value, Some(_)) => {
                let value = self.scalar()?;
                self.deliver(value, Shape::Value)?;
                Ok(Resume)
            }

            (State::Array | State::InsideArray, Some(b']'))
            | (State::WaitForKey | State::InsideInlineTable, Some(b'}')) => {
                self.close_frame()?;
                Ok(Resume)
            }
            (State::Array, Some(_)) => Ok(To(State::Value)),
            (State::InsideArray, Some(b',')) => {
                self.cursor += 1;
                Ok(To(State::Array))
            }
            (State::InsideArray, Some(_)) => Err(self.wanted("a comma or a right bracket")),

            (State::WaitForKey, Some(_)) => Ok(To(State::Key)),
            (State::InsideInlineTable, Some(b',')) => {
                self.cursor += 1;
                Ok(To(State::WaitForKey))
            }
            (State::InsideInlineTable, Some(_)) => Err(self.wanted("a comma or a right brace")),

            (State::WaitForNewline, Some(b'#')) => {
                self.eat_comment()?;
                Ok(To(State::WaitForNewline))
            }
            (State::WaitForNewline, None) => Ok(To(State::StartOfLine)),
            (State::WaitForNewline, Some(b)) => {
                if self.eat_newline() {
                    Ok(To(State::StartOfLine))
                } else if b == b'\r' {
                    Err(error(self.cursor, self.cursor + 1, ErrorKind::Unexpected('\r')))
                } else {
                    Err(self.wanted("a newline"))
                }
            }

            (_, None) => Err(self.eof_error()),
        }
    }

    /// The state to continue in after a value or container is complete.
    fn resume(&self) -> State {
        match self.frames.last() {
            Some(Frame {
                kind: FrameKind::Array(_),
                ..
            }) => State::InsideArray,
            Some(Frame {
                kind: FrameKind::Inline(_),
                ..
            }) => State::InsideInlineTable,
            None => State::WaitForNewline,
        }
    }

    // -- containers ---------------------------------------------------------

    fn open_frame(&mut self, kind: FrameKind) -> Result<(), Error> {
        let limit = self.options.max_nesting_depth;
        if self.frames.len() >= limit {
            return Err(error(
                self.cursor,
                self.cursor + 1,
                ErrorKind::NestingTooDeep { limit },
            ));
        }
        self.frames.push(Frame {
            kind,
            parent_keys: std::mem::take(&mut self.keys),
            start: self.cursor,
        });
        self.cursor += 1;
        Ok(())
    }

    fn close_frame(&mut self) -> Result<(), Error> {
        self.cursor += 1;
        let Some(frame) = self.frames.pop() else {
            unreachable!("closing bracket without an open container")
        };
        self.keys = frame.parent_keys;
        match frame.kind {
            FrameKind::Array(items) => self.deliver(Value::Array(items), Shape::Value),
            FrameKind::Inline(table) => self.deliver(Value::Table(table), Shape::Inline),
        }
    }

    /// Hands a finished value to whatever encloses it: the open array, the
    /// open inline table, or the current top-level table.
    fn deliver(&mut self, value: Value, shape: Shape) -> Result<(), Error> {
        let keys = std::mem::take(&mut self.keys);
        match self.frames.last_mut() {
            Some(Frame {
                kind: FrameKind::Array(items),
                ..
            }) => {
                items.push(value);
                Ok(())
            }
            Some(Frame {
                kind: FrameKind::Inline(table),
                ..
            }) => self.index.assign(table, keys, value, shape),
            None => {
                let mut table = &mut self.root;
                for &idx in &self.current {
                    table = descend(table, idx);
                }
                self.index.assign(table, keys, value, shape)
            }
        }
    }

    fn resolve_header(&mut self, header: Header) -> Result<(), Error> {
        let mut keys = std::mem::take(&mut self.keys);
        let Some(last) = keys.pop() else {
            unreachable!("table header without a key")
        };
        let mut path = Vec::with_capacity(keys.len() + 1);
        let mut table = &mut self.root;
        for key in keys {
            let idx = self.index.header_intermediate(table, key)?;
            path.push(idx);
            table = descend(table, idx);
        }
        let idx = if header.is_array {
            self.index.header_array(table, last)?
        } else {
            self.index.header_table(table, last)?
        };
        path.push(idx);
        trace!(
            depth = path.len(),
            array = header.is_array,
            at = header.start,
            "table header"
        );
        self.current = path;
        Ok(())
    }

    // -- error helpers ------------------------------------------------------

    /// EOF inside an open construct reports the construct.
    fn eof_error(&self) -> Error {
        let end = self.bytes.len();
        if let Some(header) = &self.header {
            return error(header.start, end, ErrorKind::UnterminatedTableHeader);
        }
        match self.frames.last() {
            Some(frame @ Frame {
                kind: FrameKind::Array(_),
                ..
            }) => error(frame.start, end, ErrorKind::UnterminatedArray),
            Some(frame) => error(frame.start, end, ErrorKind::UnterminatedInlineTable),
            None => error(end, end, ErrorKind::UnexpectedEof),
        }
    }

    fn wanted(&self, expected: &'static str) -> Error {
        let (found, end) = self.describe_next();
        error(self.cursor, end, ErrorKind::Wanted { expected, found })
    }

    /// Describes the token at the cursor and where it ends.
    fn describe_next(&self) -> (&'static str, usize) {
        match self.peek_byte() {
            None => ("eof", self.bytes.len()),
            Some(b'\n' | b'\r') => ("a newline", self.cursor + 1),
            Some(b' ' | b'\t') => {
                let mut end = self.cursor + 1;
                while let Some(b' ' | b'\t') = self.bytes.get(end) {
                    end += 1;
                }
                ("whitespace", end)
            }
            Some(b'#') => ("a comment", self.cursor + 1),
            Some(b'=') => ("an equals", self.cursor + 1),
            Some(b'.') => ("a period", self.cursor + 1),
            Some(b',') => ("a comma", self.cursor + 1),
            Some(b':') => ("a colon", self.cursor + 1),
            Some(b'+') => ("a plus", self.cursor + 1),
            Some(b'{') => ("a left brace", self.cursor + 1),
            Some(b'}') => ("a right brace", self.cursor + 1),
            Some(b'[') => ("a left bracket", self.cursor + 1),
            Some(b']') => ("a right bracket", self.cursor + 1),
            Some(b'\'' | b'"') => ("a string", self.cursor + 1),
            Some(b) if is_keylike_byte(b) => {
                let mut end = self.cursor + 1;
                while self.bytes.get(end).is_some_and(|&b| is_keylike_byte(b)) {
                    end += 1;
                }
                ("an identifier", end)
            }
            Some(_) => ("a character", self.cursor + self.char_at(self.cursor).len_utf8()),
        }
    }

    fn to_linecol(&self, offset: usize) -> (usize, usize) {
        let mut line_start = 0;
        let mut line_num = 0;
        for (i, &b) in self.bytes.iter().enumerate() {
            if i >= offset {
                return (line_num, offset - line_start);
            }
            if b == b'\n' {
                line_num += 1;
                line_start = i + 1;
            }
        }
        (line_num, offset.saturating_sub(line_start))
    }

    // -- cursor operations --------------------------------------------------

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.cursor).copied()
    }

    #[inline]
    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.cursor + offset).copied()
    }

    #[inline]
    fn eat_byte(&mut self, b: u8) -> bool {
        if self.peek_byte() == Some(b) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// The character starting at byte `offset`, which must be a boundary.
    fn char_at(&self, offset: usize) -> char {
        self.text
            .get(offset..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn eat_whitespace(&mut self) {
        while let Some(b' ' | b'\t') = self.peek_byte() {
            self.cursor += 1;
        }
    }

    fn eat_newline(&mut self) -> bool {
        match self.peek_byte() {
            Some(b'\n') => {
                self.cursor += 1;
                true
            }
            Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => {
                self.cursor += 2;
                true
            }
            _ => false,
        }
    }

    /// Consumes a comment up to (not including) its line ending.
    fn eat_comment(&mut self) -> Result<(), Error> {
        self.cursor += 1;
        while let Some(0x09 | 0x20..=0x7E | 0x80..) = self.peek_byte() {
            self.cursor += 1;
        }
        match self.peek_byte() {
            Some(b) if b != b'\n' && b != b'\r' && utf8::is_disallowed_control(b) => Err(
                error(self.cursor, self.cursor + 1, ErrorKind::InvalidControlChar(b)),
            ),
            _ => Ok(()),
        }
    }

    /// Whitespace, newlines and comments between array elements and inline
    /// table entries.
    fn eat_intermediate(&mut self) -> Result<(), Error> {
        loop {
            self.eat_whitespace();
            if self.eat_newline() {
                continue;
            }
            if self.peek_byte() == Some(b'#') {
                self.eat_comment()?;
                continue;
            }
            return Ok(());
        }
    }

    // -- keys ---------------------------------------------------------------

    fn read_key(&mut self) -> Result<Key, Error> {
        let start = self.cursor;
        match self.peek_byte() {
            Some(delim @ (b'"' | b'\'')) => {
                let (name, multiline) = self.read_string(delim)?;
                if multiline {
                    return Err(error(start, self.cursor, ErrorKind::MultilineStringKey));
                }
                Ok(Key::new(name, Span::at(start, self.cursor)))
            }
            Some(b) if is_keylike_byte(b) => {
                while self.peek_byte().is_some_and(is_keylike_byte) {
                    self.cursor += 1;
                }
                let name = &self.text[start..self.cursor];
                Ok(Key::new(name, Span::at(start, self.cursor)))
            }
            None => Err(self.eof_error()),
            Some(_) => Err(self.wanted("a table key")),
        }
    }

    // -- strings ------------------------------------------------------------

    /// Reads a basic or literal string, single- or multi-line, with the
    /// cursor on the opening quote. Returns the content and whether the
    /// string was multi-line.
    fn read_string(&mut self, delim: u8) -> Result<(String, bool), Error> {
        let start = self.cursor;
        self.cursor += 1;
        let mut multiline = false;
        if self.eat_byte(delim) {
            if self.eat_byte(delim) {
                multiline = true;
            } else {
                return Ok((String::new(), false));
            }
        }
        if multiline {
            self.eat_newline();
        }

        let mut out = String::new();
        loop {
            let run_start = self.cursor;
            while let Some(&b) = self.bytes.get(self.cursor) {
                if b == delim
                    || b == b'\\'
                    || b == b'\n'
                    || b == b'\r'
                    || utf8::is_disallowed_control(b)
                {
                    break;
                }
                self.cursor += 1;
            }
            out.push_str(&self.text[run_start..self.cursor]);

            let i = self.cursor;
            let Some(&b) = self.bytes.get(i) else {
                return Err(error(start, self.bytes.len(), ErrorKind::UnterminatedString));
            };
            self.cursor += 1;

            match b {
                b'\n' if multiline => out.push('\n'),
                b'\r' if multiline && self.eat_byte(b'\n') => out.push_str("\r\n"),
                b'\n' | b'\r' => {
                    return Err(error(i, i + 1, ErrorKind::InvalidCharInString(b as char)));
                }
                b'\\' if delim == b'"' => self.read_escape(start, multiline, &mut out)?,
                b'\\' => out.push('\\'),
                d if d == delim => {
                    if !multiline {
                        return Ok((out, false));
                    }
                    // Up to two quotes directly before the closing delimiter
                    // belong to the content.
                    let mut run = 1;
                    while run < 5 && self.eat_byte(delim) {
                        run += 1;
                    }
                    if run < 3 {
                        for _ in 0..run {
                            out.push(delim as char);
                        }
                        continue;
                    }
                    for _ in 3..run {
                        out.push(delim as char);
                    }
                    return Ok((out, true));
                }
                _ => return Err(error(i, i + 1, ErrorKind::InvalidCharInString(b as char))),
            }
        }
    }

    fn read_escape(
        &mut self,
        string_start: usize,
        multiline: bool,
        out: &mut String,
    ) -> Result<(), Error> {
        let i = self.cursor;
        let Some(&b) = self.bytes.get(i) else {
            return Err(error(
                string_start,
                self.bytes.len(),
                ErrorKind::UnterminatedString,
            ));
        };
        self.cursor += 1;

        let c = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'e' => '\u{1b}',
            b'x' => self.read_hex(2, string_start, i)?,
            b'u' => self.read_hex(4, string_start, i)?,
            b'U' => self.read_hex(8, string_start, i)?,
            b' ' | b'\t' | b'\n' | b'\r' if multiline => {
                self.cursor = i;
                return self.line_ending_backslash(i);
            }
            _ => {
                let c = self.char_at(i);
                return Err(error(i, i + c.len_utf8(), ErrorKind::InvalidEscape(c)));
            }
        };
        out.push(c);
        Ok(())
    }

    /// A backslash followed by optional blanks and a newline trims all
    /// whitespace up to the next non-blank character.
    fn line_ending_backslash(&mut self, at: usize) -> Result<(), Error> {
        self.eat_whitespace();
        if !self.eat_newline() {
            let c = self.char_at(at);
            return Err(error(at, at + 1, ErrorKind::InvalidEscape(c)));
        }
        loop {
            self.eat_whitespace();
            if !self.eat_newline() {
                return Ok(());
            }
        }
    }

    fn read_hex(&mut self, n: usize, string_start: usize, escape: usize) -> Result<char, Error> {
        let mut code = 0u32;
        for _ in 0..n {
            let Some(b) = self.peek_byte() else {
                return Err(error(
                    string_start,
                    self.bytes.len(),
                    ErrorKind::UnterminatedString,
                ));
            };
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => {
                    let c = self.char_at(self.cursor);
                    return Err(error(
                        self.cursor,
                        self.cursor + c.len_utf8(),
                        ErrorKind::InvalidHexEscape(c),
                    ));
                }
            };
            code = code * 16 + digit as u32;
            self.cursor += 1;
        }
        match utf8::escape_scalar(code) {
            Some(c) => Ok(c),
            None => Err(error(
                escape - 1,
                self.cursor,
                ErrorKind::InvalidEscapeValue(code),
            )),
        }
    }

    // -- scalars ------------------------------------------------------------

    fn scalar(&mut self) -> Result<Value, Error> {
        let start = self.cursor;
        match self.peek_byte() {
            Some(delim @ (b'"' | b'\'')) => {
                let (s, _) = self.read_string(delim)?;
                Ok(Value::String(s))
            }
            Some(b'+' | b'-' | b'0'..=b'9') => self.number_or_datetime(),
            Some(b) if is_keylike_byte(b) => {
                while self.peek_byte().is_some_and(is_keylike_byte) {
                    self.cursor += 1;
                }
                match &self.text[start..self.cursor] {
                    "true" => Ok(Value::Boolean(true)),
                    "false" => Ok(Value::Boolean(false)),
                    "inf" => Ok(Value::Float(f64::INFINITY)),
                    "nan" => Ok(Value::Float(f64::NAN)),
                    _ => Err(error(start, self.cursor, ErrorKind::UnquotedString)),
                }
            }
            _ => Err(self.wanted("a value")),
        }
    }

    fn number_or_datetime(&mut self) -> Result<Value, Error> {
        let start = self.cursor;
        let rest = &self.bytes[start..];
        if Datetime::looks_like(rest) {
            let Some((len, datetime)) = Datetime::munch(rest) else {
                let mut end = start;
                while self
                    .bytes
                    .get(end)
                    .is_some_and(|&b| is_number_byte(b) || b == b':')
                {
                    end += 1;
                }
                return Err(error(start, end, ErrorKind::InvalidDatetime));
            };
            self.cursor += len;
            return Ok(match self.options.datetime {
                DatetimeFormat::Literal => Value::String(self.text[start..self.cursor].to_owned()),
                DatetimeFormat::Structured => Value::Datetime(datetime),
            });
        }

        while self.peek_byte().is_some_and(is_number_byte) {
            self.cursor += 1;
        }
        match number(&self.bytes[start..self.cursor]) {
            Ok(value) => Ok(value),
            Err(reason) => Err(error(start, self.cursor, ErrorKind::InvalidNumber(reason))),
        }
    }
}

fn error(start: usize, end: usize, kind: ErrorKind) -> Error {
    Error::from((kind, Span::at(start, end)))
}

// -- number grammar ---------------------------------------------------------

/// Classifies and converts a number token: a maximal run of
/// `[A-Za-z0-9_.+-]` starting with a sign or digit.
fn number(token: &[u8]) -> Result<Value, &'static str> {
    let (negative, signed, body) = match token {
        [b'+', rest @ ..] => (false, true, rest),
        [b'-', rest @ ..] => (true, true, rest),
        _ => (false, false, token),
    };

    match body {
        b"inf" if signed => {
            let inf = if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
            return Ok(Value::Float(inf));
        }
        b"nan" if signed => {
            let nan = if negative { -f64::NAN } else { f64::NAN };
            return Ok(Value::Float(nan));
        }
        _ => {}
    }

    if let [b'0', prefix @ (b'x' | b'o' | b'b'), digits @ ..] = body {
        if signed {
            return Err("a radix prefix cannot be signed");
        }
        let radix = match prefix {
            b'x' => 16,
            b'o' => 8,
            _ => 2,
        };
        let mut buf = String::new();
        digit_run(digits, radix, &mut buf)?;
        return i64::from_str_radix(&buf, radix)
            .map(Value::Integer)
            .map_err(|_| "integer is out of range");
    }

    let mut buf = String::new();
    if negative {
        buf.push('-');
    }
    let split = body
        .iter()
        .position(|b| matches!(b, b'.' | b'e' | b'E'))
        .unwrap_or(body.len());
    let (int_part, mut rest) = body.split_at(split);
    digit_run(int_part, 10, &mut buf)?;
    if int_part.len() > 1 && int_part[0] == b'0' {
        return Err("leading zeros are not allowed");
    }

    if rest.is_empty() {
        return buf
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| "integer is out of range");
    }

    if let [b'.', frac @ ..] = rest {
        let end = frac
            .iter()
            .position(|b| matches!(b, b'e' | b'E'))
            .unwrap_or(frac.len());
        buf.push('.');
        digit_run(&frac[..end], 10, &mut buf)?;
        rest = &frac[end..];
    }
    if let [b'e' | b'E', exp @ ..] = rest {
        buf.push('e');
        let exp = match exp {
            [b'+', digits @ ..] => digits,
            [b'-', digits @ ..] => {
                buf.push('-');
                digits
            }
            _ => exp,
        };
        digit_run(exp, 10, &mut buf)?;
        rest = &[];
    }
    if !rest.is_empty() {
        return Err("unexpected characters after number");
    }

    match buf.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Value::Float(f)),
        Ok(_) => Err("float is out of range"),
        Err(_) => Err("malformed float"),
    }
}

/// Appends a run of digits to `out`, dropping underscores. Each underscore
/// must sit between two digits.
fn digit_run(run: &[u8], radix: u32, out: &mut String) -> Result<(), &'static str> {
    if run.is_empty() {
        return Err("expected digits");
    }
    let mut prev_digit = false;
    for &b in run {
        if b == b'_' {
            if !prev_digit {
                return Err("underscores must sit between digits");
            }
            prev_digit = false;
        } else if (b as char).is_digit(radix) {
            out.push(b as char);
            prev_digit = true;
        } else {
            return Err("invalid digit");
        }
    }
    if !prev_digit {
        return Err("underscores must sit between digits");
    }
    Ok(())
}

// -- entry points -----------------------------------------------------------

fn check_size(len: usize, options: &ParseOptions) -> Result<(), Error> {
    let limit = options.max_input_size.min(u32::MAX as usize);
    if len > limit {
        return Err(Error {
            kind: ErrorKind::FileTooLarge { limit },
            span: Span::default(),
            line_info: Some((0, 0)),
        });
    }
    Ok(())
}

/// Parses a TOML document with default [`ParseOptions`].
///
/// ```
/// let doc = manifest_toml::parse("[package]\nname = \"demo\"")?;
/// assert_eq!(doc.get_path(&["package", "name"]).and_then(|v| v.as_str()), Some("demo"));
/// # Ok::<(), manifest_toml::Error>(())
/// ```
pub fn parse(text: &str) -> Result<Table, Error> {
    parse_with(text, &ParseOptions::default())
}

/// Parses a TOML document.
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Table, Error> {
    check_size(text.len(), options)?;
    debug!(len = text.len(), "parsing document");

    let mut parser = Parser::new(text, options);
    if let Err(mut err) = parser.run() {
        err.line_info = Some(parser.to_linecol(err.span.start as usize));
        debug!(kind = %err.kind, "parse failed");
        return Err(err);
    }
    debug!(keys = parser.root.len(), "parsed document");
    Ok(parser.root)
}

/// Parses raw bytes, reporting malformed UTF-8 before any structural work.
pub fn parse_slice(bytes: &[u8], options: &ParseOptions) -> Result<Table, Error> {
    check_size(bytes.len(), options)?;
    let text = utf8::validate(bytes, Mode::Document)?;
    parse_with(text, options)
}
