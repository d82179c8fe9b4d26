// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod collections;
pub mod conversions;
pub mod numbers;
pub mod strings;
pub mod utils;

use crate::ast::{Expr, Ref, Span};
use crate::value::Value;

use std::collections::HashMap;

use anyhow::Result;
use lazy_static::lazy_static;

/// A function callable from expressions.
///
/// Arguments are fully known when the function is called; calls with unknown
/// arguments yield unknown without invoking the function.
pub type BuiltinFcn = fn(&Span, &[Ref<Expr>], &[Value]) -> Result<Value>;

#[rustfmt::skip]
lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, BuiltinFcn> = {
	let mut m : HashMap<&'static str, BuiltinFcn>  = HashMap::new();

	collections::register(&mut m);
	conversions::register(&mut m);
	numbers::register(&mut m);
	strings::register(&mut m);

	m
    };
}
