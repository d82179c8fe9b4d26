// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref, Span};
use crate::builtins;
use crate::builtins::utils::{
    arg_span, ensure_args_count, ensure_list, ensure_min_args, ensure_string,
};
use crate::value::Value;

use std::collections::HashMap;

use anyhow::{bail, Result};

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("join", join);
    m.insert("lower", lower);
    m.insert("split", split);
    m.insert("trimspace", trimspace);
    m.insert("upper", upper);
}

fn join(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "join";
    ensure_min_args(span, name, args, 2)?;
    let sep = ensure_string(name, arg_span(span, params, 0), &args[0])?;

    let mut parts: Vec<String> = vec![];
    for (idx, a) in args.iter().enumerate().skip(1) {
        let span = arg_span(span, params, idx);
        for item in ensure_list(name, span, a)?.iter() {
            if item.is_null() {
                bail!("{span}: `{name}` element {} is null", parts.len());
            }
            parts.push(ensure_string(name, span, item)?.to_string());
        }
    }

    Ok(Value::from(parts.join(sep.as_ref())))
}

fn lower(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "lower";
    ensure_args_count(span, name, params, args, 1)?;
    let s = ensure_string(name, arg_span(span, params, 0), &args[0])?;
    Ok(Value::from(s.to_lowercase()))
}

fn split(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "split";
    ensure_args_count(span, name, params, args, 2)?;
    let sep = ensure_string(name, arg_span(span, params, 0), &args[0])?;
    let s = ensure_string(name, arg_span(span, params, 1), &args[1])?;

    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        s.split(sep.as_ref()).map(Value::from).collect()
    };
    Ok(Value::from(parts))
}

fn trimspace(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "trimspace";
    ensure_args_count(span, name, params, args, 1)?;
    let s = ensure_string(name, arg_span(span, params, 0), &args[0])?;
    Ok(Value::from(s.trim()))
}

fn upper(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "upper";
    ensure_args_count(span, name, params, args, 1)?;
    let s = ensure_string(name, arg_span(span, params, 0), &args[0])?;
    Ok(Value::from(s.to_uppercase()))
}
