//! Decoder and encoder binaries for the `toml-test` suite.
//!
//! Reads TOML on stdin and writes tagged JSON on stdout. With `--encode` the
//! direction is reversed.

use manifest_toml::{Datetime, EncodeOptions, Table, Value};
use serde_json::{Map, Value as Json};
use std::io::Read;

fn tagged(kind: &str, value: String) -> Json {
    let mut obj = Map::new();
    obj.insert("type".to_owned(), Json::String(kind.to_owned()));
    obj.insert("value".to_owned(), Json::String(value));
    Json::Object(obj)
}

fn float_text(value: f64) -> String {
    if value.is_nan() {
        "nan".to_owned()
    } else if value == f64::INFINITY {
        "inf".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_owned()
    } else {
        value.to_string()
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::String(s) => tagged("string", s.clone()),
        Value::Integer(i) => tagged("integer", i.to_string()),
        Value::Float(f) => tagged("float", float_text(*f)),
        Value::Boolean(b) => tagged("bool", b.to_string()),
        Value::Datetime(dt) => {
            let kind = dt.kind().map_or("datetime", |kind| kind.as_str());
            tagged(kind, dt.to_string())
        }
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Table(table) => table_to_json(table),
    }
}

fn table_to_json(table: &Table) -> Json {
    let mut obj = Map::new();
    for (key, value) in table {
        obj.insert(key.name.clone(), to_json(value));
    }
    Json::Object(obj)
}

fn from_json(json: &Json) -> Result<Value, String> {
    match json {
        Json::Object(obj) => {
            if let (2, Some(Json::String(kind)), Some(Json::String(text))) =
                (obj.len(), obj.get("type"), obj.get("value"))
            {
                return scalar(kind, text);
            }
            let mut table = Table::new();
            for (key, value) in obj {
                table.insert(key.as_str(), from_json(value)?);
            }
            Ok(Value::Table(table))
        }
        Json::Array(items) => items
            .iter()
            .map(from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(format!("untagged JSON value: {other}")),
    }
}

fn scalar(kind: &str, text: &str) -> Result<Value, String> {
    let value = match kind {
        "string" => Value::String(text.to_owned()),
        "integer" => Value::Integer(text.parse().map_err(|e| format!("{text}: {e}"))?),
        "float" => Value::Float(match text {
            "nan" | "+nan" => f64::NAN,
            "-nan" => -f64::NAN,
            "inf" | "+inf" => f64::INFINITY,
            "-inf" => f64::NEG_INFINITY,
            _ => text.parse().map_err(|e| format!("{text}: {e}"))?,
        }),
        "bool" => Value::Boolean(text == "true"),
        "datetime" | "datetime-local" | "date-local" | "time-local" => Value::Datetime(
            text.parse::<Datetime>()
                .map_err(|e| format!("{text}: {e}"))?,
        ),
        _ => return Err(format!("unknown type tag `{kind}`")),
    };
    Ok(value)
}

fn report(content: &str, err: &manifest_toml::Error) {
    use codespan_reporting::files::SimpleFiles;
    use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

    let mut files = SimpleFiles::new();
    let file_id = files.add("input.toml", content.to_string());
    let diagnostic = err.to_diagnostic(file_id);
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = codespan_reporting::term::Config::default();

    if codespan_reporting::term::emit_to_io_write(&mut writer.lock(), &config, &files, &diagnostic)
        .is_err()
    {
        eprintln!("{err}");
    }
}

fn decode(buffer: &[u8]) -> i32 {
    let options = manifest_toml::ParseOptions::default();
    match manifest_toml::parse_slice(buffer, &options) {
        Ok(table) => {
            println!("{}", table_to_json(&table));
            0
        }
        Err(err) => {
            match std::str::from_utf8(buffer) {
                Ok(content) => report(content, &err),
                Err(_) => eprintln!("{err}"),
            }
            1
        }
    }
}

fn encode(buffer: &[u8]) -> i32 {
    let json: Json = match serde_json::from_slice(buffer) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("invalid JSON: {err}");
            return 1;
        }
    };
    let value = match from_json(&json) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let options = EncodeOptions::new().table_array_headers(true);
    match manifest_toml::encode_value(&value, &options) {
        Ok(text) => {
            print!("{text}");
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn main() {
    let encode_mode = std::env::args().skip(1).any(|arg| arg == "--encode");

    let mut buffer = Vec::new();
    if std::io::stdin().lock().read_to_end(&mut buffer).is_err() {
        std::process::exit(1)
    }

    let code = if encode_mode {
        encode(&buffer)
    } else {
        decode(&buffer)
    };
    std::process::exit(code)
}
