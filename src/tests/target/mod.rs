// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::*;

use std::collections::BTreeMap;

use anyhow::Result;

fn json(s: &str) -> Value {
    Value::from_json_str(s).unwrap()
}

#[test]
fn shapes() {
    assert_eq!(TargetShape::try_of::<String>(), Some(TargetShape::String));
    assert_eq!(TargetShape::try_of::<i64>(), Some(TargetShape::Number));
    assert_eq!(
        TargetShape::try_of::<Vec<String>>(),
        Some(TargetShape::StringList)
    );
    assert_eq!(
        TargetShape::try_of::<BTreeMap<String, i64>>(),
        Some(TargetShape::NumberMap)
    );

    assert_eq!(TargetShape::try_of::<u32>(), None);
    assert_eq!(TargetShape::try_of::<Vec<bool>>(), None);
    assert_eq!(TargetShape::try_of::<&str>(), None);

    assert_eq!(
        TargetShape::NumberList.want_type(),
        Type::list(Type::Number)
    );
    assert!(TargetShape::StringMap.is_map());
    assert!(!TargetShape::StringList.is_map());
}

#[test]
fn bind_each_shape() -> Result<()> {
    let mut s = String::new();
    bind(&Value::from("t2.micro"), &mut s)?;
    assert_eq!(s, "t2.micro");

    let mut n = 0i64;
    bind(&json("-42"), &mut n)?;
    assert_eq!(n, -42);

    // Integral floats are accepted.
    bind(&json("8.0"), &mut n)?;
    assert_eq!(n, 8);

    let mut names: Vec<String> = vec!["stale".to_string()];
    bind(&json(r#"["a", "b"]"#), &mut names)?;
    assert_eq!(names, vec!["a", "b"]);

    let mut ports: Vec<i64> = vec![];
    bind(&json("[80, 443]"), &mut ports)?;
    assert_eq!(ports, vec![80, 443]);

    let mut tags = BTreeMap::<String, String>::new();
    bind(&json(r#"{ "Name": "web", "Env": "" }"#), &mut tags)?;
    assert_eq!(tags.len(), 2);
    assert_eq!(tags["Env"], "");

    let mut sizes = BTreeMap::<String, i64>::new();
    bind(&json(r#"{ "root": 8 }"#), &mut sizes)?;
    assert_eq!(sizes["root"], 8);
    Ok(())
}

#[test]
fn binding_is_strict() {
    let mut s = String::new();
    let e = bind(&Value::from(1u64), &mut s).unwrap_err();
    assert_eq!(e.to_string(), "string required, got number");

    let mut n = 0i64;
    let e = bind(&Value::from("1"), &mut n).unwrap_err();
    assert_eq!(e.to_string(), "number required, got string");

    let e = bind(&Value::Unknown, &mut n).unwrap_err();
    assert_eq!(e.to_string(), "number required, but value is unknown");

    let e = bind(&Value::Null, &mut s).unwrap_err();
    assert_eq!(e.to_string(), "string required, but value is null");

    let mut list: Vec<String> = vec![];
    let e = bind(&json(r#"{ "a": "b" }"#), &mut list).unwrap_err();
    assert_eq!(e.to_string(), "list required, got map");
}

#[test]
fn errors_carry_path() {
    let mut list: Vec<i64> = vec![];
    let e = bind(&json("[1, 2.5]"), &mut list).unwrap_err();
    assert_eq!(e.to_string(), "[1]: number 2.5 is not an integer");

    let mut map = BTreeMap::<String, String>::new();
    let e = bind(&json(r#"{ "a": "x", "b": null }"#), &mut map).unwrap_err();
    assert_eq!(e.to_string(), "[\"b\"]: string required, but value is null");

    let mut n = 0i64;
    let e = bind(&json("18446744073709551615"), &mut n).unwrap_err();
    assert_eq!(
        e.to_string(),
        "number 18446744073709551615 does not fit in a 64-bit integer"
    );
}

#[test]
fn destination_unchanged_on_error() {
    let mut names = vec!["keep".to_string()];
    assert!(bind(&json(r#"["a", 1]"#), &mut names).is_err());
    assert_eq!(names, vec!["keep"]);

    let mut tags = BTreeMap::from([("keep".to_string(), "me".to_string())]);
    assert!(bind(&json(r#"{ "a": [] }"#), &mut tags).is_err());
    assert_eq!(tags.len(), 1);
}

#[test]
#[should_panic(expected = "unexpected result type")]
fn unsupported_destination_panics() {
    #[derive(Default)]
    struct Instance {
        _ami: String,
    }
    let mut dest = Instance::default();
    let _ = bind(&json(r#"{ "ami": "x" }"#), &mut dest);
}
