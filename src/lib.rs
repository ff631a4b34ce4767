//! A TOML parser and encoder for dependency-manifest tooling.
//!
//! [`parse`] turns a document into an owned [`Table`] tree, rejecting every
//! illegal redefinition (a value reopened as a table, a table declared twice,
//! a table turned into an array of tables, ...) with an [`Error`] that points
//! at the offending bytes. [`encode`] writes a tree back out as TOML text that
//! parses to the same tree.
//!
//! # Examples
//!
//! ```
//! use manifest_toml::{Value, parse, encode};
//!
//! let content = r#"
//! [package]
//! name = "demo"
//!
//! [dependencies]
//! serde = { version = "1.0", features = ["derive"] }
//! log = "0.4"
//! "#;
//!
//! let mut doc = parse(content)?;
//! let deps = doc.get("dependencies").and_then(Value::as_table).unwrap();
//! assert_eq!(deps.len(), 2);
//! assert_eq!(
//!     doc.get_path(&["dependencies", "serde", "version"]).and_then(Value::as_str),
//!     Some("1.0")
//! );
//!
//! if let Some(Value::Table(deps)) = doc.get_mut("dependencies") {
//!     deps.insert("anyhow", Value::from("1"));
//! }
//! let text = encode(&doc)?;
//! assert_eq!(parse(&text)?, doc);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Errors carry a span and a line/column:
//!
//! ```
//! let err = manifest_toml::parse("a = 1\n[a]\nb = 2").unwrap_err();
//! assert_eq!(err.line(), Some(2));
//! assert!(err.to_string().contains("redefine"));
//! ```

#[macro_use]
mod tracing_macros;

mod encode;
mod error;
mod parser;
mod span;
mod table;
mod time;
mod utf8;
mod value;

pub use encode::{EncodeOptions, encode, encode_value, encode_with};
pub use error::{Category, EncodeError, EncodeErrorKind, Error, ErrorKind};
pub use parser::{DatetimeFormat, ParseOptions, parse, parse_slice, parse_with};
pub use span::Span;
pub use table::{IntoIter, Iter, Table};
pub use time::{Date, Datetime, DatetimeKind, Time, TimeOffset};
pub use value::{Key, Value};

#[cfg(feature = "serde")]
pub mod impl_serde;
