// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref, Span};
use crate::builtins;
use crate::builtins::utils::{
    arg_span, ensure_args_count, ensure_args_range, ensure_list, ensure_map, ensure_min_args,
    ensure_string,
};
use crate::value::Value;

use std::collections::HashMap;

use anyhow::{bail, Result};

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("concat", concat);
    m.insert("length", length);
    m.insert("lookup", lookup);
}

fn concat(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "concat";
    ensure_min_args(span, name, args, 1)?;

    let mut items = vec![];
    for (idx, a) in args.iter().enumerate() {
        items.extend(ensure_list(name, arg_span(span, params, idx), a)?.iter().cloned());
    }
    Ok(Value::from(items))
}

fn length(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "length";
    ensure_args_count(span, name, params, args, 1)?;

    Ok(Value::from(match &args[0] {
        Value::List(a) => a.len(),
        Value::Map(a) => a.len(),
        Value::String(s) => s.chars().count(),
        a => {
            let span = arg_span(span, params, 0);
            bail!("{span}: `{name}` requires list/map/string argument. Got `{a}`.")
        }
    }))
}

fn lookup(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "lookup";
    ensure_args_range(span, name, params, args, 2, 3)?;
    let fields = ensure_map(name, arg_span(span, params, 0), &args[0])?;
    let key = ensure_string(name, arg_span(span, params, 1), &args[1])?;

    match (fields.get(key.as_ref()), args.get(2)) {
        (Some(v), _) => Ok(v.clone()),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => bail!("{span}: `{name}` failed to find key \"{key}\""),
    }
}
