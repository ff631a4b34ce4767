use super::*;
use crate::{Date, Time, TimeOffset};
use std::collections::HashSet;

fn date(year: u16, month: u8, day: u8) -> Datetime {
    Datetime {
        date: Some(Date { year, month, day }),
        time: None,
        offset: None,
    }
}

#[test]
fn type_names() {
    let cases = [
        (Value::from("s"), "string"),
        (Value::Integer(1), "integer"),
        (Value::Float(1.0), "float"),
        (Value::Boolean(true), "boolean"),
        (Value::Datetime(date(2024, 2, 29)), "datetime"),
        (Value::Array(Vec::new()), "array"),
        (Value::Table(Table::new()), "table"),
    ];
    for (value, name) in cases {
        assert_eq!(value.type_str(), name);
    }
}

#[test]
fn accessors_match_only_their_variant() {
    let s = Value::from("text");
    assert_eq!(s.as_str(), Some("text"));
    assert_eq!(s.as_integer(), None);
    assert_eq!(s.as_bool(), None);
    assert!(s.as_array().is_none());
    assert!(s.as_table().is_none());
    assert!(!s.is_table());

    let b = Value::Boolean(false);
    assert_eq!(b.as_bool(), Some(false));
    assert_eq!(b.as_str(), None);
    assert_eq!(b.as_float(), None);

    let dt = Value::Datetime(date(1979, 5, 27));
    assert_eq!(dt.as_datetime(), Some(&date(1979, 5, 27)));
    assert!(Value::Integer(0).as_datetime().is_none());
}

#[test]
fn as_float_widens_integers() {
    assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
    assert_eq!(Value::Integer(-3).as_float(), Some(-3.0));
    assert_eq!(Value::Float(2.5).as_integer(), None);
}

#[test]
fn mutable_accessors() {
    let mut value = crate::parse("list = [1]\n[t]\nk = 'v'")
        .map(Value::Table)
        .unwrap();

    let table = value.as_table_mut().unwrap();
    table
        .get_mut("list")
        .and_then(Value::as_array_mut)
        .unwrap()
        .push(Value::Integer(2));
    table
        .get_mut("t")
        .and_then(Value::as_table_mut)
        .unwrap()
        .insert("added", Value::Boolean(true));

    assert_eq!(value.get("list").unwrap().to_string(), "[1, 2]");
    assert_eq!(
        value.get("t").and_then(|t| t.get("added")),
        Some(&Value::Boolean(true))
    );
    assert!(Value::Integer(1).as_array_mut().is_none());
    assert!(Value::Integer(1).as_table_mut().is_none());
}

#[test]
fn get_only_looks_into_tables() {
    let value = Value::Table(crate::parse("a = { b = 1 }").unwrap());
    assert_eq!(value.get("a").and_then(|a| a.get("b")), Some(&Value::Integer(1)));
    assert!(value.get("missing").is_none());
    assert!(Value::Integer(1).get("a").is_none());
    assert!(Value::Array(vec![Value::Integer(1)]).get("0").is_none());
}

#[test]
fn nan_equals_nan() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_eq!(Value::Float(f64::NAN), Value::Float(-f64::NAN));
    assert_ne!(Value::Float(f64::NAN), Value::Float(0.0));
    assert_eq!(Value::Float(0.0), Value::Float(-0.0));
    assert_eq!(
        Value::Array(vec![Value::Float(f64::NAN)]),
        Value::Array(vec![Value::Float(f64::NAN)])
    );
}

#[test]
fn equality_is_type_strict() {
    assert_ne!(Value::Integer(1), Value::Float(1.0));
    assert_ne!(Value::from("1"), Value::Integer(1));
    assert_ne!(Value::Array(Vec::new()), Value::Table(Table::new()));
    assert_eq!(
        Value::Array(vec![Value::Integer(1), Value::from("x")]),
        Value::Array(vec![Value::Integer(1), Value::from("x")])
    );
    // array order matters, table order does not
    assert_ne!(
        Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
        Value::Array(vec![Value::Integer(2), Value::Integer(1)])
    );
}

#[test]
fn display_is_inline_toml() {
    let doc = crate::parse(
        "a = { b = [1, 2], \"c d\" = 'x\"y' }\nf = 2.5\nz = -0.0\nn = nan\nt = {}",
    )
    .unwrap();
    assert_eq!(
        doc.get("a").unwrap().to_string(),
        r#"{ b = [1, 2], "c d" = "x\"y" }"#
    );
    assert_eq!(doc.get("f").unwrap().to_string(), "2.5");
    assert_eq!(doc.get("z").unwrap().to_string(), "-0.0");
    assert_eq!(doc.get("n").unwrap().to_string(), "nan");
    assert_eq!(doc.get("t").unwrap().to_string(), "{}");
    assert_eq!(Value::from("tab\there").to_string(), r#""tab\there""#);
    assert_eq!(Value::Boolean(true).to_string(), "true");
}

#[test]
fn display_writes_any_datetime() {
    let odd = Datetime {
        date: None,
        time: Some(Time {
            hour: 7,
            minute: 32,
            second: 0,
            nanosecond: 0,
            precision: 0,
        }),
        offset: Some(TimeOffset::Z),
    };
    assert_eq!(Value::Datetime(odd).to_string(), "07:32:00Z");
    assert_eq!(Value::Datetime(date(2000, 1, 2)).to_string(), "2000-01-02");
}

#[test]
fn debug_is_compact() {
    let doc = crate::parse("a = [1, 'two', { x = true }]").unwrap();
    assert_eq!(
        format!("{:?}", doc.get("a").unwrap()),
        r#"[1, "two", {x: true}]"#
    );
}

#[test]
fn conversions() {
    assert_eq!(Value::from("s"), Value::String("s".to_owned()));
    assert_eq!(Value::from(String::from("s")), Value::String("s".to_owned()));
    assert_eq!(Value::from(7_i64), Value::Integer(7));
    assert_eq!(Value::from(0.5_f64), Value::Float(0.5));
    assert_eq!(Value::from(true), Value::Boolean(true));
    assert_eq!(
        Value::from(date(2020, 1, 1)),
        Value::Datetime(date(2020, 1, 1))
    );
    assert_eq!(
        Value::from(vec![Value::Integer(1)]),
        Value::Array(vec![Value::Integer(1)])
    );
    assert!(Value::from(Table::new()).is_table());
}

#[test]
fn keys_compare_by_name_only() {
    let a = Key::new("name", Span::new(0, 4));
    let b = Key::new("name", Span::new(10, 14));
    let c = Key::from("other");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a < c);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);

    let set: HashSet<Key> = [a.clone(), b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert!(set.contains("name"));
    assert!(set.contains("other"));
}

#[test]
fn key_construction() {
    let key = Key::from("plain");
    assert_eq!(key.span, Span::default());
    assert!(key.span.is_empty());
    assert_eq!(key.as_str(), "plain");

    let key = Key::from(String::from("owned"));
    assert_eq!(key.name, "owned");

    let key = Key::new("dotted.name", Span::new(3, 16));
    assert_eq!(key.to_string(), "dotted.name");
    assert_eq!(format!("{key:?}"), "dotted.name");
    assert_eq!(key.span.len(), 13);
}

#[test]
fn parsed_keys_carry_spans() {
    let doc = crate::parse("alpha = 1\n'quoted key' = 2").unwrap();
    let (key, _) = doc.get_key_value("alpha").unwrap();
    assert_eq!(key.span, Span::new(0, 5));
    let (key, _) = doc.get_key_value("quoted key").unwrap();
    assert_eq!(key.span, Span::new(10, 22));
}
