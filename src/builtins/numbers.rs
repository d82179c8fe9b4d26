// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref, Span};
use crate::builtins;
use crate::builtins::utils::{arg_span, ensure_min_args, ensure_numeric};
use crate::number::Number;
use crate::value::Value;

use std::collections::HashMap;

use anyhow::Result;

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("max", max);
    m.insert("min", min);
}

fn numeric_args(
    span: &Span,
    name: &'static str,
    params: &[Ref<Expr>],
    args: &[Value],
) -> Result<Vec<Number>> {
    ensure_min_args(span, name, args, 1)?;
    args.iter()
        .enumerate()
        .map(|(idx, a)| ensure_numeric(name, arg_span(span, params, idx), a))
        .collect()
}

fn max(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let nums = numeric_args(span, "max", params, args)?;
    Ok(nums.into_iter().max().map(Value::Number).unwrap_or(Value::Null))
}

fn min(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let nums = numeric_args(span, "min", params, args)?;
    Ok(nums.into_iter().min().map(Value::Number).unwrap_or(Value::Null))
}
