// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type conversion of values.
//!
//! Conversions are lenient between primitives (`"5"` converts to number
//! `5`, `true` converts to string `"true"`) and structural for
//! collections. Unknown and null values convert to any type unchanged.

use crate::number::Number;
use crate::typing::Type;
use crate::value::Value;
use crate::walk::{Path, PathStep};
use crate::Rc;

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// A value that cannot be converted, and where in the value it failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{}", .path.prefix(), .message)]
pub struct ConversionError {
    pub path: Path,
    pub message: String,
}

/// Converts `value` to type `ty`.
pub fn convert(value: &Value, ty: &Type) -> Result<Value, ConversionError> {
    let mut path = Path::new();
    convert_at(value, ty, &mut path)
}

fn fail(path: &Path, message: String) -> ConversionError {
    ConversionError {
        path: path.clone(),
        message,
    }
}

fn convert_at(value: &Value, ty: &Type, path: &mut Path) -> Result<Value, ConversionError> {
    if matches!(value, Value::Unknown | Value::Null) || ty.is_dynamic() {
        return Ok(value.clone());
    }

    match ty {
        Type::String => to_string(value)
            .map(Value::from)
            .ok_or_else(|| fail(path, "string required".to_string())),
        Type::Number => to_number(value)
            .map(Value::Number)
            .ok_or_else(|| fail(path, "number required".to_string())),
        Type::Bool => to_bool(value)
            .map(Value::Bool)
            .ok_or_else(|| fail(path, "bool required".to_string())),
        Type::List(element) => {
            let items = convert_elements(value, ty, element, path)?;
            Ok(Value::from(items))
        }
        Type::Set(element) => {
            let items = convert_elements(value, ty, element, path)?;
            let unique: BTreeSet<Value> = items.into_iter().collect();
            Ok(Value::from(unique.into_iter().collect::<Vec<Value>>()))
        }
        Type::Map(element) => {
            let fields = match value {
                Value::Map(fields) => fields,
                _ => return Err(fail(path, format!("{} required", ty.friendly_name()))),
            };
            let mut converted = BTreeMap::new();
            for (key, item) in fields.iter() {
                path.push(PathStep::Key(key.clone()));
                let r = convert_at(item, element, path);
                path.pop();
                converted.insert(key.clone(), r?);
            }
            Ok(Value::from(converted))
        }
        Type::Object(attributes) => {
            let fields = match value {
                Value::Map(fields) => fields,
                _ => return Err(fail(path, "object required".to_string())),
            };
            let mut converted: BTreeMap<Rc<str>, Value> = BTreeMap::new();
            for (name, attr_ty) in attributes {
                let item = match fields.get(name.as_str()) {
                    Some(item) => item,
                    None => return Err(fail(path, format!("attribute \"{name}\" is required"))),
                };
                let key: Rc<str> = Rc::from(name.as_str());
                path.push(PathStep::Key(key.clone()));
                let r = convert_at(item, attr_ty, path);
                path.pop();
                converted.insert(key, r?);
            }
            Ok(Value::from(converted))
        }
        Type::Dynamic => Ok(value.clone()),
    }
}

fn convert_elements(
    value: &Value,
    ty: &Type,
    element: &Type,
    path: &mut Path,
) -> Result<Vec<Value>, ConversionError> {
    let items = match value {
        Value::List(items) => items,
        _ => return Err(fail(path, format!("{} required", ty.friendly_name()))),
    };
    let mut converted = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        path.push(PathStep::Index(idx));
        let r = convert_at(item, element, path);
        path.pop();
        converted.push(r?);
    }
    Ok(converted)
}

/// String form of a primitive value. Collections have none.
pub fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Number(n) => Some(n.format_decimal()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(*n),
        Value::String(s) => Number::from_str(s).ok(),
        _ => None,
    }
}

pub fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_ref() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
