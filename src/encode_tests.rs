use super::*;
use crate::{Date, Datetime, Time, TimeOffset};

fn encode_str(input: &str) -> String {
    encode(&crate::parse(input).unwrap()).unwrap()
}

fn reparse(text: &str) -> Table {
    match crate::parse(text) {
        Ok(table) => table,
        Err(err) => panic!("encoder output failed to parse: {err}\n{text}"),
    }
}

#[test]
fn keys_are_bare_when_possible() {
    let cases = [
        ("plain", "plain"),
        ("with-dash_and_underscore", "with-dash_and_underscore"),
        ("1234", "1234"),
        ("", "\"\""),
        ("has space", "\"has space\""),
        ("dotted.key", "\"dotted.key\""),
        ("quote\"d", "\"quote\\\"d\""),
        ("ünïcode", "\"ünïcode\""),
    ];
    for (key, expected) in cases {
        let mut out = String::new();
        push_key(&mut out, key);
        assert_eq!(out, expected, "key {key:?}");
    }
}

#[test]
fn string_escaping() {
    let cases = [
        ("plain", r#""plain""#),
        ("a\"b", r#""a\"b""#),
        ("back\\slash", r#""back\\slash""#),
        ("line\nfeed", r#""line\nfeed""#),
        ("cr\rtab\t", r#""cr\rtab\t""#),
        ("\u{8}\u{c}", r#""\b\f""#),
        ("\u{1}\u{1f}", r#""\u0001\u001F""#),
        ("del\u{7f}", r#""del\u007F""#),
        ("snow ☃", "\"snow ☃\""),
    ];
    for (input, expected) in cases {
        let mut out = String::new();
        push_basic_string(&mut out, input);
        assert_eq!(out, expected, "string {input:?}");

        let doc = reparse(&format!("k = {out}"));
        assert_eq!(doc.get("k").and_then(Value::as_str), Some(input));
    }
}

#[test]
fn float_formatting() {
    let cases = [
        (1.0, "1.0"),
        (0.5, "0.5"),
        (-2.0, "-2.0"),
        (0.1, "0.1"),
        (f64::NAN, "nan"),
        (-f64::NAN, "-nan"),
        (f64::INFINITY, "inf"),
        (f64::NEG_INFINITY, "-inf"),
    ];
    for (value, expected) in cases {
        let mut out = String::new();
        push_float(&mut out, value);
        assert_eq!(out, expected);
    }

    // every finite float reads back as itself
    for value in [1e300, 5e-324, f64::MAX, f64::MIN_POSITIVE, 123456.789, 1e16] {
        let mut out = String::new();
        push_float(&mut out, value);
        let doc = reparse(&format!("f = {out}"));
        assert_eq!(doc.get("f").and_then(Value::as_float), Some(value), "{out}");
    }
}

#[test]
fn scalars_come_before_sections() {
    let mut table = Table::new();
    let mut sub = Table::new();
    sub.insert("inner", Value::Integer(1));
    table.insert("sub", Value::Table(sub));
    table.insert("name", Value::from("x"));
    table.insert("list", Value::Array(vec![Value::Integer(1), Value::Integer(2)]));

    let text = encode(&table).unwrap();
    assert_eq!(text, "name = \"x\"\nlist = [1, 2]\n\n[sub]\ninner = 1\n");
    assert_eq!(reparse(&text), table);
}

#[test]
fn nested_headers_use_full_paths() {
    let text = encode_str("[a]\nx = 1\n[a.b]\ny = 2\n[a.\"c d\"]\n[e]");
    assert_eq!(
        text,
        "[a]\nx = 1\n\n[a.b]\ny = 2\n\n[a.\"c d\"]\n\n[e]\n"
    );
}

#[test]
fn implicit_tables_get_headers() {
    // the parent has no direct values but still gets a header line
    let text = encode_str("[a.b.c]\nv = true");
    assert_eq!(text, "[a]\n\n[a.b]\n\n[a.b.c]\nv = true\n");
}

#[test]
fn dotted_and_inline_tables_become_sections() {
    let text = encode_str("a.b = 1\nc = { d = 2 }");
    assert_eq!(text, "[a]\nb = 1\n\n[c]\nd = 2\n");
}

#[test]
fn empty_document() {
    assert_eq!(encode(&Table::new()).unwrap(), "");
    assert_eq!(encode_str("# only a comment\n"), "");
}

#[test]
fn table_arrays_inline_by_default() {
    let text = encode_str("[[bin]]\nname = 'a'\n[[bin]]\nname = 'b'");
    assert_eq!(text, "bin = [{ name = \"a\" }, { name = \"b\" }]\n");
}

#[test]
fn table_array_headers() {
    let options = EncodeOptions::new().table_array_headers(true);
    let doc = crate::parse(
        "top = 1\n[[bin]]\nname = 'a'\n[bin.meta]\nk = 1\n[[bin]]\nname = 'b'\n[[bin]]",
    )
    .unwrap();
    let text = encode_with(&doc, &options).unwrap();
    assert_eq!(
        text,
        "top = 1\n\n[[bin]]\nname = \"a\"\n\n[bin.meta]\nk = 1\n\n[[bin]]\nname = \"b\"\n\n[[bin]]\n"
    );
    assert_eq!(reparse(&text), doc);
}

#[test]
fn mixed_arrays_stay_inline_with_headers_enabled() {
    let options = EncodeOptions::new().table_array_headers(true);
    let doc = crate::parse("mixed = [{ a = 1 }, 2]\nempty = []").unwrap();
    let text = encode_with(&doc, &options).unwrap();
    assert_eq!(text, "mixed = [{ a = 1 }, 2]\nempty = []\n");
}

#[test]
fn multiline_strings_option() {
    let doc = crate::parse(r#"s = "one\ntwo\n""#).unwrap();

    assert_eq!(encode(&doc).unwrap(), "s = \"one\\ntwo\\n\"\n");

    let options = EncodeOptions::new().multiline_strings(true);
    let text = encode_with(&doc, &options).unwrap();
    assert_eq!(text, "s = '''\none\ntwo\n'''\n");
    assert_eq!(reparse(&text), doc);
}

#[test]
fn multiline_strings_fall_back_when_content_does_not_fit() {
    let options = EncodeOptions::new().multiline_strings(true);
    let cases = [
        ("single line", r#""single line""#),
        ("has '''\ntriple", r#""has '''\ntriple""#),
        ("ends in quote\n'", r#""ends in quote\n'""#),
        ("control\u{1}\nchar", r#""control\u0001\nchar""#),
    ];
    for (input, expected) in cases {
        let mut table = Table::new();
        table.insert("s", Value::from(input));
        let text = encode_with(&table, &options).unwrap();
        assert_eq!(text, format!("s = {expected}\n"));
        assert_eq!(reparse(&text), table);
    }

    // leading newlines survive the trimmed first line
    let mut table = Table::new();
    table.insert("s", Value::from("\nstarts blank"));
    let text = encode_with(&table, &options).unwrap();
    assert_eq!(text, "s = '''\n\nstarts blank'''\n");
    assert_eq!(reparse(&text), table);
}

#[test]
fn multiline_strings_stay_escaped_inside_inline_values() {
    let options = EncodeOptions::new().multiline_strings(true);
    let doc = crate::parse("a = [\"x\\ny\"]").unwrap();
    let text = encode_with(&doc, &options).unwrap();
    assert_eq!(text, "a = [\"x\\ny\"]\n");
}

#[test]
fn root_must_be_a_table() {
    let options = EncodeOptions::default();
    let err = encode_value(&Value::Integer(1), &options).unwrap_err();
    assert_eq!(err.kind, EncodeErrorKind::RootNotTable("integer"));
    assert!(err.path.is_empty());

    let err = encode_value(&Value::Array(Vec::new()), &options).unwrap_err();
    assert_eq!(err.kind, EncodeErrorKind::RootNotTable("array"));

    let doc = crate::parse("a = 1").unwrap();
    assert_eq!(
        encode_value(&Value::Table(doc), &options).unwrap(),
        "a = 1\n"
    );
}

#[test]
fn unsupported_datetime_reports_its_path() {
    let zoned_date = Datetime {
        date: Some(Date {
            year: 2024,
            month: 1,
            day: 1,
        }),
        time: None,
        offset: Some(TimeOffset::Z),
    };

    let mut deps = Table::new();
    deps.insert(
        "my crate",
        Value::Array(vec![Value::Integer(1), Value::Datetime(zoned_date)]),
    );
    let mut root = Table::new();
    root.insert("deps", Value::Table(deps));

    let err = encode(&root).unwrap_err();
    assert_eq!(err.kind, EncodeErrorKind::UnsupportedDatetime);
    assert_eq!(err.path, ["deps", "my crate", "1"]);

    // Display is lenient and writes the fields it has
    assert_eq!(Value::Datetime(zoned_date).to_string(), "2024-01-01Z");
}

#[test]
fn out_of_range_datetimes_are_rejected() {
    let date = |year, month, day| Datetime {
        date: Some(Date { year, month, day }),
        time: None,
        offset: None,
    };
    let time = |hour, minute, second, nanosecond, precision| Datetime {
        date: None,
        time: Some(Time {
            hour,
            minute,
            second,
            nanosecond,
            precision,
        }),
        offset: None,
    };
    let zoned = |minutes| Datetime {
        date: Some(Date {
            year: 2024,
            month: 6,
            day: 1,
        }),
        time: Some(Time {
            hour: 12,
            minute: 0,
            second: 0,
            nanosecond: 0,
            precision: 0,
        }),
        offset: Some(TimeOffset::Custom { minutes }),
    };

    let bad = [
        date(2023, 2, 30),
        date(2023, 2, 29),
        date(2024, 0, 1),
        date(2024, 13, 1),
        date(2024, 1, 0),
        date(12345, 1, 1),
        time(25, 0, 0, 0, 0),
        time(12, 60, 0, 0, 0),
        time(12, 0, 61, 0, 0),
        time(12, 0, 0, 1_000_000_000, 9),
        time(12, 0, 0, 500_000_000, 0),
        time(12, 0, 0, 123_456_789, 3),
        time(12, 0, 0, 0, 10),
        zoned(24 * 60),
        zoned(-24 * 60),
    ];
    for dt in bad {
        let mut table = Table::new();
        table.insert("at", Value::Datetime(dt));
        let err = encode(&table).unwrap_err();
        assert_eq!(err.kind, EncodeErrorKind::UnsupportedDatetime, "{dt}");
        assert_eq!(err.path, ["at"]);
    }

    let good = [
        date(2024, 2, 29),
        date(9999, 12, 31),
        time(23, 59, 60, 0, 0),
        time(12, 0, 0, 500_000_000, 1),
        time(12, 0, 0, 123_000_000, 3),
        zoned(23 * 60 + 59),
        zoned(-(23 * 60 + 59)),
    ];
    for dt in good {
        let mut table = Table::new();
        table.insert("at", Value::Datetime(dt));
        let text = encode(&table).unwrap();
        assert_eq!(reparse(&text), table, "{text}");
    }
}

#[test]
fn datetimes_round_trip() {
    let input = "odt = 1979-05-27T07:32:00.999Z\nldt = 1979-05-27T07:32:00\nld = 1979-05-27\nlt = 00:32:00.5\noff = 1979-05-27T00:32:00-07:00";
    let doc = crate::parse(input).unwrap();
    let text = encode(&doc).unwrap();
    assert_eq!(
        text,
        "odt = 1979-05-27T07:32:00.999Z\nldt = 1979-05-27T07:32:00\nld = 1979-05-27\nlt = 00:32:00.5\noff = 1979-05-27T00:32:00-07:00\n"
    );

    let time_only = Datetime {
        date: None,
        time: Some(Time {
            hour: 23,
            minute: 59,
            second: 60,
            nanosecond: 0,
            precision: 0,
        }),
        offset: None,
    };
    let mut table = Table::new();
    table.insert("leap", Value::Datetime(time_only));
    assert_eq!(encode(&table).unwrap(), "leap = 23:59:60\n");
}

#[test]
fn encoded_documents_reparse_equal() {
    let input = r#"
title = "manifest"
version = 3
ratio = 0.25
flags = [true, false]
"quoted key" = { nested = { deep = [1, [2, 3]] } }

[package]
name = "demo"
authors = ["a", "b"]

[dependencies.serde]
version = "1"
features = ["derive"]

[[target]]
name = "x"

[[target]]
name = "y"
cfg.unix = true
"#;
    let doc = crate::parse(input).unwrap();
    for options in [
        EncodeOptions::new(),
        EncodeOptions::new().table_array_headers(true),
        EncodeOptions::new()
            .table_array_headers(true)
            .multiline_strings(true),
    ] {
        let text = encode_with(&doc, &options).unwrap();
        assert_eq!(reparse(&text), doc, "{options:?}\n{text}");
    }
}
