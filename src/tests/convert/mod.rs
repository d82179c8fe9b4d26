// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::convert::convert;
use crate::*;

use anyhow::Result;

fn json(s: &str) -> Value {
    Value::from_json_str(s).unwrap()
}

#[test]
fn primitives() -> Result<()> {
    assert_eq!(convert(&Value::from(5u64), &Type::String)?, Value::from("5"));
    assert_eq!(convert(&Value::from(1.5), &Type::String)?, Value::from("1.5"));
    assert_eq!(convert(&Value::from(true), &Type::String)?, Value::from("true"));
    assert_eq!(convert(&Value::from("42"), &Type::Number)?, Value::from(42u64));
    assert_eq!(convert(&Value::from("-0.5"), &Type::Number)?, Value::from(-0.5));
    assert_eq!(convert(&Value::from("1"), &Type::Bool)?, Value::from(true));
    assert_eq!(convert(&Value::from("false"), &Type::Bool)?, Value::from(false));
    Ok(())
}

#[test]
fn primitive_failures() {
    let e = convert(&Value::from("abc"), &Type::Number).unwrap_err();
    assert_eq!(e.to_string(), "number required");

    let e = convert(&Value::from("yes"), &Type::Bool).unwrap_err();
    assert_eq!(e.to_string(), "bool required");

    let e = convert(&json("[1]"), &Type::String).unwrap_err();
    assert_eq!(e.to_string(), "string required");

    let e = convert(&Value::from(1u64), &Type::Bool).unwrap_err();
    assert_eq!(e.to_string(), "bool required");
}

#[test]
fn unknown_and_null_pass_through() -> Result<()> {
    for ty in [
        Type::String,
        Type::Number,
        Type::list(Type::String),
        Type::map(Type::Number),
    ] {
        assert_eq!(convert(&Value::Unknown, &ty)?, Value::Unknown);
        assert_eq!(convert(&Value::Null, &ty)?, Value::Null);
    }
    assert_eq!(
        convert(&json(r#"[1, null]"#), &Type::list(Type::String))?,
        json(r#"["1", null]"#)
    );
    Ok(())
}

#[test]
fn dynamic_accepts_anything() -> Result<()> {
    let v = json(r#"{ "a": [1, "b", true] }"#);
    assert_eq!(convert(&v, &Type::Dynamic)?, v);
    Ok(())
}

#[test]
fn collections() -> Result<()> {
    assert_eq!(
        convert(&json("[1, 2.5, true]"), &Type::list(Type::String))?,
        json(r#"["1", "2.5", "true"]"#)
    );
    assert_eq!(
        convert(&json(r#"["b", "a", "b"]"#), &Type::set(Type::String))?,
        json(r#"["a", "b"]"#)
    );
    assert_eq!(
        convert(&json(r#"{ "a": "1", "b": 2 }"#), &Type::map(Type::Number))?,
        json(r#"{ "a": 1, "b": 2 }"#)
    );
    Ok(())
}

#[test]
fn collection_failures_carry_path() {
    let e = convert(&json(r#"["1", "x"]"#), &Type::list(Type::Number)).unwrap_err();
    assert_eq!(e.to_string(), "[1]: number required");

    let e = convert(&json(r#"{ "a": { "b": [true] } }"#), &Type::map(Type::map(Type::String)))
        .unwrap_err();
    assert_eq!(e.to_string(), "[\"a\"][\"b\"]: string required");

    let e = convert(&json(r#"{ "a": 1 }"#), &Type::list(Type::Number)).unwrap_err();
    assert_eq!(e.to_string(), "list of number required");
}

#[test]
fn objects() -> Result<()> {
    let ty = Type::object([("name", Type::String), ("size", Type::Number)]);

    // Undeclared attributes are dropped.
    assert_eq!(
        convert(&json(r#"{ "name": "web", "size": "8", "extra": 1 }"#), &ty)?,
        json(r#"{ "name": "web", "size": 8 }"#)
    );

    let e = convert(&json(r#"{ "name": "web" }"#), &ty).unwrap_err();
    assert_eq!(e.to_string(), "attribute \"size\" is required");

    let e = convert(&json("[]"), &ty).unwrap_err();
    assert_eq!(e.to_string(), "object required");
    Ok(())
}
