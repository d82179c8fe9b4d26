// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Destination shapes and binding of values into Rust types.
//!
//! Binding is strict: only the exact value kind is accepted, with no
//! conversion. Conversions happen earlier, while evaluating against the
//! shape's [`want_type`](TargetShape::want_type).

use crate::typing::Type;
use crate::value::Value;
use crate::walk::{Path, PathStep};

use core::any::{self, Any, TypeId};
use std::collections::BTreeMap;

/// Shape of a supported destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    /// `String`
    String,
    /// `i64`
    Number,
    /// `Vec<String>`
    StringList,
    /// `Vec<i64>`
    NumberList,
    /// `BTreeMap<String, String>`
    StringMap,
    /// `BTreeMap<String, i64>`
    NumberMap,
}

impl TargetShape {
    /// Shape of `T`, or `None` if values cannot be bound into `T`.
    pub fn try_of<T: Any>() -> Option<TargetShape> {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<String>() {
            Some(TargetShape::String)
        } else if id == TypeId::of::<i64>() {
            Some(TargetShape::Number)
        } else if id == TypeId::of::<Vec<String>>() {
            Some(TargetShape::StringList)
        } else if id == TypeId::of::<Vec<i64>>() {
            Some(TargetShape::NumberList)
        } else if id == TypeId::of::<BTreeMap<String, String>>() {
            Some(TargetShape::StringMap)
        } else if id == TypeId::of::<BTreeMap<String, i64>>() {
            Some(TargetShape::NumberMap)
        } else {
            None
        }
    }

    /// Shape of `T`.
    ///
    /// # Panics
    ///
    /// Panics when `T` is not one of the supported destination types. Passing
    /// such a destination is a programming error.
    pub fn of<T: Any>() -> TargetShape {
        match Self::try_of::<T>() {
            Some(shape) => shape,
            None => panic!("unexpected result type: {}", any::type_name::<T>()),
        }
    }

    /// Type a value is converted to before it is bound into this shape.
    pub fn want_type(self) -> Type {
        match self {
            TargetShape::String => Type::String,
            TargetShape::Number => Type::Number,
            TargetShape::StringList => Type::list(Type::String),
            TargetShape::NumberList => Type::list(Type::Number),
            TargetShape::StringMap => Type::map(Type::String),
            TargetShape::NumberMap => Type::map(Type::Number),
        }
    }

    pub fn is_map(self) -> bool {
        matches!(self, TargetShape::StringMap | TargetShape::NumberMap)
    }
}

/// A value that does not fit the destination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{}", .path.prefix(), .message)]
pub struct BindError {
    pub path: Path,
    pub message: String,
}

/// Binds `value` into `dest`.
///
/// `dest` is assigned only when the whole value binds; on error it keeps its
/// previous contents.
///
/// # Panics
///
/// Panics when `T` is not a supported destination type, see
/// [`TargetShape::of`].
pub fn bind<T: Any>(value: &Value, dest: &mut T) -> Result<(), BindError> {
    let mut path = Path::new();
    match TargetShape::of::<T>() {
        TargetShape::String => assign(dest, bind_string(value, &path)?),
        TargetShape::Number => assign(dest, bind_number(value, &path)?),
        TargetShape::StringList => assign(dest, bind_list(value, &mut path, bind_string)?),
        TargetShape::NumberList => assign(dest, bind_list(value, &mut path, bind_number)?),
        TargetShape::StringMap => assign(dest, bind_map(value, &mut path, bind_string)?),
        TargetShape::NumberMap => assign(dest, bind_map(value, &mut path, bind_number)?),
    }
}

fn assign<T: Any, V: Any>(dest: &mut T, value: V) -> Result<(), BindError> {
    match (dest as &mut dyn Any).downcast_mut::<V>() {
        Some(d) => {
            *d = value;
            Ok(())
        }
        None => Err(BindError {
            path: Path::new(),
            message: format!("unexpected result type: {}", any::type_name::<T>()),
        }),
    }
}

fn mismatch(path: &Path, want: &str, value: &Value) -> BindError {
    let message = match value {
        Value::Unknown => format!("{want} required, but value is unknown"),
        Value::Null => format!("{want} required, but value is null"),
        v => format!("{want} required, got {}", v.type_name()),
    };
    BindError {
        path: path.clone(),
        message,
    }
}

fn bind_string(value: &Value, path: &Path) -> Result<String, BindError> {
    match value {
        Value::String(s) => Ok(s.to_string()),
        v => Err(mismatch(path, "string", v)),
    }
}

fn bind_number(value: &Value, path: &Path) -> Result<i64, BindError> {
    let n = match value {
        Value::Number(n) => n,
        v => return Err(mismatch(path, "number", v)),
    };
    if !n.is_integer() {
        return Err(BindError {
            path: path.clone(),
            message: format!("number {n} is not an integer"),
        });
    }
    n.as_i64().ok_or_else(|| BindError {
        path: path.clone(),
        message: format!("number {n} does not fit in a 64-bit integer"),
    })
}

fn bind_list<E>(
    value: &Value,
    path: &mut Path,
    bind_element: fn(&Value, &Path) -> Result<E, BindError>,
) -> Result<Vec<E>, BindError> {
    let items = match value {
        Value::List(items) => items,
        v => return Err(mismatch(path, "list", v)),
    };
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        path.push(PathStep::Index(idx));
        let r = bind_element(item, path);
        path.pop();
        out.push(r?);
    }
    Ok(out)
}

fn bind_map<E>(
    value: &Value,
    path: &mut Path,
    bind_element: fn(&Value, &Path) -> Result<E, BindError>,
) -> Result<BTreeMap<String, E>, BindError> {
    let fields = match value {
        Value::Map(fields) => fields,
        v => return Err(mismatch(path, "map", v)),
    };
    let mut out = BTreeMap::new();
    for (key, item) in fields.iter() {
        path.push(PathStep::Key(key.clone()));
        let r = bind_element(item, path);
        path.pop();
        out.insert(key.to_string(), r?);
    }
    Ok(out)
}
