// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::walk::{traverse, Path, Visit};
use crate::*;

use anyhow::Result;

fn sample() -> Result<Value> {
    Value::from_json_str(r#"{ "a": [1, null, 3], "b": { "c": "x" }, "d": null }"#)
}

#[test]
fn visits_in_pre_order() -> Result<()> {
    let mut v = sample()?;
    let mut seen = vec![];
    traverse::<(), _>(&mut v, &mut |path, _| {
        seen.push(path.to_string());
        Visit::Continue
    })
    .unwrap();

    assert_eq!(
        seen,
        vec![
            "",
            "[\"a\"]",
            "[\"a\"][0]",
            "[\"a\"][1]",
            "[\"a\"][2]",
            "[\"b\"]",
            "[\"b\"][\"c\"]",
            "[\"d\"]",
        ]
    );
    Ok(())
}

#[test]
fn abort_stops_at_first_hit() -> Result<()> {
    let mut v = sample()?;
    let mut visited = 0;
    let r = traverse(&mut v, &mut |path, v| {
        visited += 1;
        match v {
            Value::Null => Visit::Abort(path.clone()),
            _ => Visit::Continue,
        }
    });

    assert_eq!(r, Err(Path::new().key("a").index(1)));
    // root, "a", [0], [1]
    assert_eq!(visited, 4);
    Ok(())
}

#[test]
fn replace_is_in_place_and_not_descended() -> Result<()> {
    let original = sample()?;
    let mut v = original.clone();

    traverse::<(), _>(&mut v, &mut |_, v| match v {
        Value::Null => Visit::Replace(Value::from("")),
        Value::Map(m) if m.contains_key("c") => Visit::Replace(Value::from(vec![Value::Null])),
        _ => Visit::Continue,
    })
    .unwrap();

    assert_eq!(v["a"][1], Value::from(""));
    assert_eq!(v["d"], Value::from(""));
    // The replacement itself still holds a null.
    assert_eq!(v["b"][0], Value::Null);

    // The original tree is not modified.
    assert_eq!(original["a"][1], Value::Null);
    assert_eq!(original["d"], Value::Null);
    Ok(())
}

#[test]
fn abort_leaves_value_untouched() -> Result<()> {
    let mut v = sample()?;
    let r = traverse(&mut v, &mut |_, v| match v {
        Value::Null => Visit::Replace(Value::from("")),
        Value::String(_) => Visit::Abort("string"),
        _ => Visit::Continue,
    });

    assert_eq!(r, Err("string"));
    assert_eq!(v, sample()?);
    Ok(())
}

#[test]
fn storage_is_copied_only_along_replaced_paths() -> Result<()> {
    let original = sample()?;
    let storage = |v: &Value, key: &str| match &v[key] {
        Value::List(items) => Rc::as_ptr(items) as *const (),
        Value::Map(fields) => Rc::as_ptr(fields) as *const (),
        _ => std::ptr::null(),
    };

    // A walk that only looks copies nothing.
    let mut v = original.clone();
    traverse::<(), _>(&mut v, &mut |_, _| Visit::Continue).unwrap();
    match (&v, &original) {
        (Value::Map(a), Value::Map(b)) => assert!(Rc::ptr_eq(a, b)),
        _ => panic!("expected a map"),
    }

    // Replacing inside "a" leaves "b" shared.
    let mut v = original.clone();
    traverse::<(), _>(&mut v, &mut |path, v| match v {
        Value::Null if path.to_string().starts_with("[\"a\"]") => {
            Visit::Replace(Value::from(0u64))
        }
        _ => Visit::Continue,
    })
    .unwrap();
    assert_eq!(v["a"][1], Value::from(0u64));
    assert_eq!(v["d"], Value::Null);
    assert_ne!(storage(&v, "a"), storage(&original, "a"));
    assert_eq!(storage(&v, "b"), storage(&original, "b"));
    Ok(())
}

#[test]
fn scalar_root() {
    let mut v = Value::Unknown;
    let r = traverse(&mut v, &mut |path, v| {
        assert!(path.is_empty());
        match v {
            Value::Unknown => Visit::Abort("unknown"),
            _ => Visit::Continue,
        }
    });
    assert_eq!(r, Err("unknown"));
}

#[test]
fn path_display() {
    let p = Path::new().index(0).key("name");
    assert_eq!(p.to_string(), "[0][\"name\"]");
    assert_eq!(p.prefix(), "[0][\"name\"]: ");
    assert_eq!(Path::new().prefix(), "");
}
