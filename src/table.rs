#[cfg(test)]
#[path = "./table_tests.rs"]
mod tests;

use crate::value::{Key, Value};
use std::fmt;

/// How an entry came to exist. Only the parser looks at this: it decides
/// which later definitions may extend or reopen the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Assigned with `key = value`, including arrays.
    Value,
    /// An inline `{ ... }` table, frozen once closed.
    Inline,
    /// Declared with a `[header]`.
    Dictionary,
    /// Created implicitly while resolving a header path such as `[a.b]`.
    AutoDictionary,
    /// Created implicitly by a dotted key such as `a.b = 1`.
    Dotted,
    /// Created by `[[header]]`.
    ArrayOfTables,
}

impl Shape {
    /// Human readable name used in redefinition errors.
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Shape::Value => "a value",
            Shape::Inline => "an inline table",
            Shape::Dictionary => "a table",
            Shape::AutoDictionary => "an implicit table",
            Shape::Dotted => "a dotted-key table",
            Shape::ArrayOfTables => "an array of tables",
        }
    }

    fn for_value(value: &Value) -> Shape {
        if value.is_table() {
            Shape::Dictionary
        } else {
            Shape::Value
        }
    }
}

#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) key: Key,
    pub(crate) value: Value,
    pub(crate) shape: Shape,
}

/// A TOML table: key/value pairs kept in insertion order.
///
/// Lookups are linear. The parser keeps its own hash index while building
/// wide tables, so a parsed document never pays for it twice.
///
/// Equality compares keys and values only; where an entry came from (header,
/// dotted key, inline table) does not matter.
#[derive(Clone, Default)]
pub struct Table {
    entries: Vec<Entry>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.find_index(name)?;
        Some(&self.entries[idx].value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let idx = self.find_index(name)?;
        Some(&mut self.entries[idx].value)
    }

    /// Returns both the stored key (with its source span) and the value.
    pub fn get_key_value(&self, name: &str) -> Option<(&Key, &Value)> {
        let idx = self.find_index(name)?;
        let entry = &self.entries[idx];
        Some((&entry.key, &entry.value))
    }

    #[inline]
    pub fn contains_key(&self, name: &str) -> bool {
        self.find_index(name).is_some()
    }

    /// Follows a path of keys through nested tables.
    ///
    /// ```
    /// let doc = manifest_toml::parse("[a.b]\nc = 1").unwrap();
    /// assert_eq!(doc.get_path(&["a", "b", "c"]).and_then(|v| v.as_integer()), Some(1));
    /// ```
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut table = self;
        for name in parents {
            table = table.get(name)?.as_table()?;
        }
        table.get(last)
    }

    /// Inserts a key/value pair. An existing entry with the same name is
    /// replaced in place, keeping its position, and its old value returned.
    pub fn insert(&mut self, key: impl Into<Key>, value: Value) -> Option<Value> {
        let key = key.into();
        let shape = Shape::for_value(&value);
        match self.find_index(&key.name) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.key = key;
                entry.shape = shape;
                Some(std::mem::replace(&mut entry.value, value))
            }
            None => {
                self.entries.push(Entry { key, value, shape });
                None
            }
        }
    }

    /// Removes an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.remove_entry(name).map(|(_, value)| value)
    }

    pub fn remove_entry(&mut self, name: &str) -> Option<(Key, Value)> {
        let idx = self.find_index(name)?;
        let entry = self.entries.remove(idx);
        Some((entry.key, entry.value))
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|entry| &entry.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|entry| &entry.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.iter_mut().map(|entry| &mut entry.value)
    }

    pub(crate) fn find_index(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key.name == name)
    }

    /// Appends without checking for duplicates, returning the new index.
    pub(crate) fn push_entry(&mut self, key: Key, value: Value, shape: Shape) -> usize {
        self.entries.push(Entry { key, value, shape });
        self.entries.len() - 1
    }

    #[inline]
    pub(crate) fn entry(&self, idx: usize) -> &Entry {
        &self.entries[idx]
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, idx: usize) -> &mut Entry {
        &mut self.entries[idx]
    }

    #[inline]
    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Span start of the first key. Keys of parsed documents never share a
    /// source position, so this identifies a table in the parser's index.
    #[inline]
    pub(crate) fn first_key_span_start(&self) -> Option<u32> {
        self.entries.first().map(|entry| entry.key.span.start)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|entry| other.get(&entry.key.name) == Some(&entry.value))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in &self.entries {
            map.entry(&entry.key, &entry.value);
        }
        map.finish()
    }
}

/// Borrowing iterator over a [`Table`], yielding `(&Key, &Value)` pairs.
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Key, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Consuming iterator over a [`Table`], yielding `(Key, Value)` pairs.
pub struct IntoIter {
    inner: std::vec::IntoIter<Entry>,
}

impl Iterator for IntoIter {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (entry.key, entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for IntoIter {}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a Key, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Table {
    type Item = (Key, Value);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<K: Into<Key>> Extend<(K, Value)> for Table {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Into<Key>> FromIterator<(K, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut table = Table::new();
        table.extend(iter);
        table
    }
}
