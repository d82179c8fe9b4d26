// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Block, Body, Expr, Span};
use crate::context::EvalContext;
use crate::convert;
use crate::error::{Error, ErrorCode, Level};
use crate::references::{references_in_block, references_in_expr, Reference, ReferenceError};
use crate::schema::BlockSchema;
use crate::target::{self, TargetShape};
use crate::typing::Type;
use crate::value::Value;
use crate::walk::{self, Visit};

use core::any::Any;

use log::{debug, error, warn};

/// Evaluates expressions and blocks for static checks.
///
/// Each operation decides whether the node can be evaluated from static
/// information alone, evaluates it with the context, rejects results that
/// are not fully determined and binds the result into a destination.
///
/// Failures are classified: [`Level::Warning`] means the node cannot be
/// checked statically and should be skipped, [`Level::Error`] means its
/// evaluation is broken.
pub struct Runner<'ctx> {
    ctx: &'ctx dyn EvalContext,
}

fn all_evaluable(refs: &[Reference]) -> bool {
    refs.iter().all(Reference::is_evaluable)
}

impl<'ctx> Runner<'ctx> {
    pub fn new(ctx: &'ctx dyn EvalContext) -> Self {
        Self { ctx }
    }

    /// Whether every reference in `expr` can be resolved statically.
    pub fn is_evaluable_expr(&self, expr: &Expr) -> Result<bool, ReferenceError> {
        Ok(all_evaluable(&references_in_expr(expr)?))
    }

    /// Whether every reference in the schema-declared parts of `body` can be
    /// resolved statically.
    pub fn is_evaluable_block(
        &self,
        body: &Body,
        schema: &BlockSchema,
    ) -> Result<bool, ReferenceError> {
        Ok(all_evaluable(&references_in_block(body, schema)?))
    }

    /// Evaluates `expr` and binds the result into `dest`.
    ///
    /// The value is evaluated against the type implied by `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a supported destination type; see
    /// [`TargetShape`].
    pub fn evaluate_expr<T: Any>(&self, expr: &Expr, dest: &mut T) -> Result<(), Error> {
        let shape = TargetShape::of::<T>();
        let value = self.eval_expr(expr, &shape.want_type())?;
        self.bind_expr_value(expr, &value, dest)
    }

    /// Like [`evaluate_expr`](Self::evaluate_expr), with an explicit type to
    /// evaluate against.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a supported destination type.
    pub fn evaluate_expr_type<T: Any>(
        &self,
        expr: &Expr,
        dest: &mut T,
        want: &Type,
    ) -> Result<(), Error> {
        // Unsupported destinations panic before anything is evaluated.
        let shape = TargetShape::of::<T>();
        debug!("evaluating {} as {shape:?}", expr.span());
        let value = self.eval_expr(expr, want)?;
        self.bind_expr_value(expr, &value, dest)
    }

    /// Evaluates `expr` against `want` and returns the value, which contains
    /// no unknown and no null values.
    pub fn eval_expr(&self, expr: &Expr, want: &Type) -> Result<Value, Error> {
        let span = expr.span();

        let evaluable = match self.is_evaluable_expr(expr) {
            Ok(evaluable) => evaluable,
            Err(e) => {
                let err = Error::new(
                    ErrorCode::EvaluationError,
                    Level::Error,
                    format!("Failed to parse an expression in {span}"),
                )
                .with_cause(e);
                error!("{err}");
                return Err(err);
            }
        };

        if !evaluable {
            let err = Error::new(
                ErrorCode::UnevaluableError,
                Level::Warning,
                format!("Unevaluable expression found in {span}"),
            );
            warn!("{err}; ignoring an unevaluable expression");
            return Err(err);
        }

        let mut value = match self.ctx.evaluate_expr(expr, want) {
            Ok(value) => value,
            Err(diags) => {
                let err = Error::new(
                    ErrorCode::EvaluationError,
                    Level::Error,
                    format!("Failed to eval an expression in {span}"),
                )
                .with_cause(diags);
                error!("{err}");
                return Err(err);
            }
        };

        sanitize_expr_value(&mut value, span)?;
        Ok(value)
    }

    fn bind_expr_value<T: Any>(&self, expr: &Expr, value: &Value, dest: &mut T) -> Result<(), Error> {
        target::bind(value, dest).map_err(|e| {
            let err = Error::new(
                ErrorCode::TypeMismatchError,
                Level::Error,
                format!("Invalid type expression in {}", expr.span()),
            )
            .with_cause(e);
            error!("{err}");
            err
        })
    }

    /// Evaluates `block` with `schema` and binds the resulting object into
    /// `dest`.
    ///
    /// Unlike expressions, null values in a block are accepted and bound as
    /// empty strings. Map destinations get the object converted to a map of
    /// the destination's element type first.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a supported destination type.
    pub fn evaluate_block<T: Any>(
        &self,
        block: &Block,
        schema: &BlockSchema,
        dest: &mut T,
    ) -> Result<(), Error> {
        let shape = TargetShape::of::<T>();
        let span = &block.def_span;

        let evaluable = match self.is_evaluable_block(&block.body, schema) {
            Ok(evaluable) => evaluable,
            Err(e) => {
                let err = Error::new(
                    ErrorCode::EvaluationError,
                    Level::Error,
                    format!("Failed to parse a block in {span}"),
                )
                .with_cause(e);
                error!("{err}");
                return Err(err);
            }
        };

        if !evaluable {
            let err = Error::new(
                ErrorCode::UnevaluableError,
                Level::Warning,
                format!("Unevaluable block found in {span}"),
            );
            warn!("{err}; ignoring an unevaluable block");
            return Err(err);
        }

        let mut value = match self.ctx.evaluate_block(&block.body, schema) {
            Ok(value) => value,
            Err(diags) => {
                let err = Error::new(
                    ErrorCode::EvaluationError,
                    Level::Error,
                    format!("Failed to eval a block in {span}"),
                )
                .with_cause(diags);
                error!("{err}");
                return Err(err);
            }
        };

        sanitize_block_value(&mut value, span)?;

        if shape.is_map() {
            value = convert::convert(&value, &shape.want_type()).map_err(|e| {
                let err = Error::new(
                    ErrorCode::TypeConversionError,
                    Level::Error,
                    format!("Invalid type block in {span}"),
                )
                .with_cause(e);
                error!("{err}");
                err
            })?;
        }

        target::bind(&value, dest).map_err(|e| {
            let err = Error::new(
                ErrorCode::TypeMismatchError,
                Level::Error,
                format!("Invalid type block in {span}"),
            )
            .with_cause(e);
            error!("{err}");
            err
        })
    }
}

// The first unknown or null found wins.
fn sanitize_expr_value(value: &mut Value, span: &Span) -> Result<(), Error> {
    walk::traverse(value, &mut |_, v| match v {
        Value::Unknown => {
            let err = Error::new(
                ErrorCode::UnknownValueError,
                Level::Warning,
                format!("Unknown value found in {span}; Please use environment variables or tfvars to set the value"),
            );
            warn!("{err}; ignoring an expression with an unknown value");
            Visit::Abort(err)
        }
        Value::Null => {
            let err = Error::new(
                ErrorCode::NullValueError,
                Level::Warning,
                format!("Null value found in {span}"),
            );
            warn!("{err}; ignoring an expression with a null value");
            Visit::Abort(err)
        }
        _ => Visit::Continue,
    })
}

// Unknowns are rejected; nulls become empty strings.
fn sanitize_block_value(value: &mut Value, span: &Span) -> Result<(), Error> {
    walk::traverse(value, &mut |_, v| match v {
        Value::Unknown => {
            let err = Error::new(
                ErrorCode::UnknownValueError,
                Level::Warning,
                format!("Unknown value found in {span}; Please use environment variables or tfvars to set the value"),
            );
            warn!("{err}; ignoring a block with an unknown value");
            Visit::Abort(err)
        }
        _ => Visit::Continue,
    })?;

    walk::traverse(value, &mut |_, v| match v {
        Value::Null => {
            debug!("Null value found in {span}, treating it as an empty value");
            Visit::<Error>::Replace(Value::from(""))
        }
        _ => Visit::Continue,
    })
}
