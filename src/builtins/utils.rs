// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref, Span};
use crate::convert;
use crate::number::Number;
use crate::value::Value;
use crate::Rc;

use std::collections::BTreeMap;

use anyhow::{bail, Result};

/// Span of the `idx`-th argument, or of the call when arguments were
/// expanded from a final list.
pub fn arg_span<'a>(span: &'a Span, params: &'a [Ref<Expr>], idx: usize) -> &'a Span {
    params.get(idx).map(|p| p.span()).unwrap_or(span)
}

pub fn ensure_args_count(
    span: &Span,
    fcn: &'static str,
    params: &[Ref<Expr>],
    args: &[Value],
    expected: usize,
) -> Result<()> {
    if args.len() != expected {
        let span = match args.len() > expected {
            false => span,
            true => arg_span(span, params, expected),
        };
        if expected == 1 {
            bail!("{span}: `{fcn}` expects 1 argument")
        } else {
            bail!("{span}: `{fcn}` expects {expected} arguments")
        }
    }
    Ok(())
}

pub fn ensure_args_range(
    span: &Span,
    fcn: &'static str,
    params: &[Ref<Expr>],
    args: &[Value],
    min: usize,
    max: usize,
) -> Result<()> {
    if args.len() < min {
        bail!("{span}: `{fcn}` expects at least {min} argument(s)")
    }
    if args.len() > max {
        bail!(
            "{}: `{fcn}` expects at most {max} arguments",
            arg_span(span, params, max)
        )
    }
    Ok(())
}

pub fn ensure_min_args(span: &Span, fcn: &'static str, args: &[Value], min: usize) -> Result<()> {
    if args.len() < min {
        if min == 1 {
            bail!("{span}: `{fcn}` expects at least 1 argument")
        } else {
            bail!("{span}: `{fcn}` expects at least {min} arguments")
        }
    }
    Ok(())
}

fn ensure_not_null(fcn: &str, span: &Span, v: &Value) -> Result<()> {
    if v.is_null() {
        bail!("{span}: `{fcn}` argument must not be null")
    }
    Ok(())
}

// Primitive arguments convert to the parameter type where possible.
pub fn ensure_string(fcn: &str, span: &Span, v: &Value) -> Result<Rc<str>> {
    ensure_not_null(fcn, span, v)?;
    match (v, convert::to_string(v)) {
        (Value::String(s), _) => Ok(s.clone()),
        (_, Some(s)) => Ok(s.as_str().into()),
        _ => bail!("{span}: `{fcn}` expects string argument. Got `{v}` instead"),
    }
}

pub fn ensure_numeric(fcn: &str, span: &Span, v: &Value) -> Result<Number> {
    ensure_not_null(fcn, span, v)?;
    match convert::to_number(v) {
        Some(n) => Ok(n),
        None => bail!("{span}: `{fcn}` expects numeric argument. Got `{v}` instead"),
    }
}

pub fn ensure_list(fcn: &str, span: &Span, v: &Value) -> Result<Rc<Vec<Value>>> {
    ensure_not_null(fcn, span, v)?;
    match v {
        Value::List(items) => Ok(items.clone()),
        _ => bail!("{span}: `{fcn}` expects list argument. Got `{v}` instead"),
    }
}

pub fn ensure_map(fcn: &str, span: &Span, v: &Value) -> Result<Rc<BTreeMap<Rc<str>, Value>>> {
    ensure_not_null(fcn, span, v)?;
    match v {
        Value::Map(fields) => Ok(fields.clone()),
        _ => bail!("{span}: `{fcn}` expects map argument. Got `{v}` instead"),
    }
}
