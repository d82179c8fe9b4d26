// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod ast;
mod builtins;
mod context;
pub mod convert;
mod error;
mod interpreter;
mod number;
mod references;
mod runner;
pub mod schema;
mod target;
mod typing;
mod value;
pub mod walk;

// Values and contexts are shared between threads.
pub(crate) use std::sync::Arc as Rc;

pub use builtins::BuiltinFcn;
pub use context::{Diagnostic, Diagnostics, EvalContext, Severity, StaticContext};
pub use convert::ConversionError;
pub use error::{Error, ErrorCode, Level};
pub use number::Number;
pub use references::{
    references_in_block, references_in_expr, Reference, ReferenceError, ResourceMode, Subject,
    SubjectKind,
};
pub use runner::Runner;
pub use target::{bind, BindError, TargetShape};
pub use typing::Type;
pub use value::Value;

#[cfg(test)]
mod tests;
