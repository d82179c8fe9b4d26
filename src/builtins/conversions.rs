// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref, Span};
use crate::builtins;
use crate::builtins::utils::{arg_span, ensure_args_count};
use crate::convert;
use crate::value::Value;

use std::collections::HashMap;

use anyhow::{bail, Result};

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("tonumber", tonumber);
    m.insert("tostring", tostring);
}

// Both conversions pass null through.

fn tonumber(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "tonumber";
    ensure_args_count(span, name, params, args, 1)?;

    Ok(match &args[0] {
        Value::Null => Value::Null,
        v => match convert::to_number(v) {
            Some(n) => Value::Number(n),
            None => {
                let span = arg_span(span, params, 0);
                bail!("{span}: cannot convert `{v}` to number")
            }
        },
    })
}

fn tostring(span: &Span, params: &[Ref<Expr>], args: &[Value]) -> Result<Value> {
    let name = "tostring";
    ensure_args_count(span, name, params, args, 1)?;

    Ok(match &args[0] {
        Value::Null => Value::Null,
        v => match convert::to_string(v) {
            Some(s) => Value::from(s),
            None => {
                let span = arg_span(span, params, 0);
                bail!("{span}: cannot convert {} to string", v.type_name())
            }
        },
    })
}
