// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use hcleval::*;

#[test]
fn serialize_number() -> Result<()> {
    // Check that integral values are serialized without fractional part
    assert_eq!(serde_json::to_string(&Value::from(1.0))?, "1");
    assert_eq!(serde_json::to_string(&Value::from(-1.0))?, "-1");
    assert_eq!(serde_json::to_string(&Value::from(2.5))?, "2.5");
    assert_eq!(serde_json::to_string(&Value::from(u64::MAX))?, "18446744073709551615");
    Ok(())
}

#[test]
fn parse_number() {
    assert_eq!("42".parse::<Number>(), Ok(Number::UInt(42)));
    assert_eq!("-7".parse::<Number>(), Ok(Number::Int(-7)));
    assert_eq!(".5".parse::<Number>(), Ok(Number::Float(0.5)));
    assert_eq!("1e3".parse::<Number>(), Ok(Number::UInt(1000)));

    for s in ["", " 1", "inf", "NaN", "0x10", "1,000"] {
        assert!(s.parse::<Number>().is_err(), "{s}");
    }
}

#[test]
fn number_equality_across_representations() {
    assert_eq!(Number::UInt(3), Number::Float(3.0));
    assert_eq!(Number::from(-0.0), Number::UInt(0));
    assert!(Number::Int(-1) < Number::UInt(0));
    assert!(Number::Float(0.5) < Number::UInt(1));
}

#[test]
fn unknown_is_distinct() -> Result<()> {
    assert_ne!(Value::Unknown, Value::Null);
    assert_ne!(Value::Unknown, Value::from(""));
    assert!(Value::Unknown.is_unknown());
    assert!(!Value::Null.is_unknown());

    let v = Value::from(vec![Value::from(1u64), Value::Unknown]);
    assert!(v.is_known());
    assert!(!v.is_wholly_known());

    // Unknown only has a display form.
    assert_eq!(Value::Unknown.to_string(), "\"<unknown>\"");
    Ok(())
}

#[test]
fn load_json_and_yaml() -> Result<()> {
    let json = Value::from_json_str(r#"{ "zones": ["a", "b"], "count": 2, "on": true }"#)?;

    let yaml = Value::from_yaml_str(
        r#"
zones:
  - a
  - b
count: 2
on: true
"#,
    )?;
    assert_eq!(json, yaml);

    assert_eq!(json["zones"][1], Value::from("b"));
    assert_eq!(json["count"].type_name(), "number");
    assert_eq!(json["missing"], Value::Null);
    assert_eq!(json["zones"][7], Value::Null);
    assert!(json.as_list().is_err());
    Ok(())
}

#[test]
fn collect_map() {
    let v: Value = [("b", Value::from(2u64)), ("a", Value::from(1u64))]
        .into_iter()
        .collect();
    // Keys are ordered.
    assert_eq!(v.to_string(), r#"{"a":1,"b":2}"#);
}
