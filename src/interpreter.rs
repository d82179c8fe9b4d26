// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::context::{Diagnostic, Diagnostics, StaticContext};
use crate::convert;
use crate::number::Number;
use crate::schema::{BlockSchema, NestedBlockSchema, NestingMode};
use crate::typing::Type;
use crate::value::Value;
use crate::Rc;

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

type Scope = BTreeMap<String, Value>;
type EvalResult = Result<Value, Diagnostic>;

/// Tree-walking evaluator over [`StaticContext`].
pub struct Interpreter<'a> {
    ctx: &'a StaticContext,
    scopes: Vec<Scope>,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Unary,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Unary => "unary",
        }
    }
}

impl<'a> Interpreter<'a> {
    pub fn new(ctx: &'a StaticContext) -> Self {
        Self {
            ctx,
            scopes: vec![],
        }
    }

    /// Evaluates `expr` and converts the result to `want`.
    pub fn eval_with_type(&mut self, expr: &Expr, want: &Type) -> EvalResult {
        let value = self.eval_expr(expr)?;
        convert::convert(&value, want).map_err(|e| {
            Diagnostic::error(
                "Incorrect value type",
                format!("Invalid expression value: {e}."),
                expr.span(),
            )
        })
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Template { parts, .. } => self.eval_template(parts),
            Expr::TemplateWrap { wrapped, .. } => self.eval_expr(wrapped),
            Expr::ScopeTraversal { span, traversal } => self.eval_scope_traversal(span, traversal),
            Expr::RelativeTraversal {
                span,
                source,
                steps,
            } => {
                let value = self.eval_expr(source)?;
                apply_steps(value, steps, span)
            }
            Expr::Index {
                span,
                collection,
                key,
            } => {
                let collection = self.eval_expr(collection)?;
                let key = self.eval_expr(key)?;
                index_value(&collection, &key, span)
            }
            Expr::Splat { span, source, each } => self.eval_splat(span, source, each),
            Expr::Tuple { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::from(values))
            }
            Expr::Object { items, .. } => self.eval_object(items),
            Expr::FunctionCall {
                span,
                name,
                args,
                expand_final,
            } => self.eval_call(span, name, args, *expand_final),
            Expr::Conditional {
                condition,
                true_result,
                false_result,
                ..
            } => self.eval_conditional(condition, true_result, false_result),
            Expr::BinaryOp { span, op, lhs, rhs } => self.eval_binary_op(span, *op, lhs, rhs),
            Expr::UnaryOp { op, operand, .. } => self.eval_unary_op(*op, operand),
            Expr::For {
                span,
                key_var,
                value_var,
                collection,
                key,
                value,
                condition,
                group,
            } => self.eval_for(
                span,
                key_var.as_deref(),
                value_var,
                collection,
                key.as_deref(),
                value,
                condition.as_deref(),
                *group,
            ),
        }
    }

    fn lookup_local_var(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn eval_scope_traversal(&mut self, span: &Span, traversal: &Traversal) -> EvalResult {
        if let Some(value) = self.lookup_local_var(&traversal.root) {
            return apply_steps(value.clone(), &traversal.steps, span);
        }

        let root = traversal.root.as_str();
        let (name, rest) = match traversal.steps.split_first() {
            Some((TraverseStep::Attr(name), rest)) => (name.as_str(), rest),
            _ => {
                return Err(Diagnostic::error(
                    "Invalid reference",
                    format!("The \"{root}\" object cannot be accessed directly. Instead, access one of its attributes."),
                    span,
                ))
            }
        };

        let value = match root {
            "var" => match self.ctx.variable(name) {
                Some(value) => value.clone(),
                None => {
                    return Err(Diagnostic::error(
                        "Reference to undeclared input variable",
                        format!("An input variable with the name \"{name}\" has not been declared."),
                        span,
                    ))
                }
            },
            "path" => match self.ctx.path_attribute(name) {
                Some(path) => Value::from(path),
                None => {
                    return Err(Diagnostic::error(
                        "Invalid \"path\" attribute",
                        format!("The \"path\" object does not have an attribute named \"{name}\". The supported attributes are path.cwd, path.module and path.root."),
                        span,
                    ))
                }
            },
            "terraform" => match name {
                "workspace" => Value::from(self.ctx.workspace()),
                _ => {
                    return Err(Diagnostic::error(
                        "Invalid \"terraform\" attribute",
                        format!("The \"terraform\" object does not have an attribute named \"{name}\". The only supported attribute is terraform.workspace, the name of the currently-selected workspace."),
                        span,
                    ))
                }
            },
            _ => {
                return Err(Diagnostic::error(
                    "Reference to unsupported object",
                    format!("The \"{root}\" object cannot be resolved statically."),
                    span,
                ))
            }
        };

        apply_steps(value, rest, span)
    }

    fn eval_template(&mut self, parts: &[Ref<Expr>]) -> EvalResult {
        let mut out = String::new();
        let mut unknown = false;

        for part in parts {
            let value = self.eval_expr(part)?;
            match &value {
                Value::Unknown => unknown = true,
                Value::Null => {
                    return Err(Diagnostic::error(
                        "Invalid template interpolation value",
                        "The expression result is null. Cannot include a null value in a string template.",
                        part.span(),
                    ))
                }
                v => match convert::to_string(v) {
                    Some(s) => out.push_str(&s),
                    None => {
                        return Err(Diagnostic::error(
                            "Invalid template interpolation value",
                            format!("Cannot include the given value in a string template: string required, got {}.", v.type_name()),
                            part.span(),
                        ))
                    }
                },
            }
        }

        // Later parts are still checked for errors when an earlier one is unknown.
        if unknown {
            return Ok(Value::Unknown);
        }
        Ok(Value::from(out))
    }

    fn eval_splat(&mut self, span: &Span, source: &Expr, each: &[TraverseStep]) -> EvalResult {
        let items = match self.eval_expr(source)? {
            Value::Unknown => return Ok(Value::Unknown),
            Value::Null => return Ok(Value::new_list()),
            Value::List(items) => items,
            v => Rc::new(vec![v]),
        };

        let mut values = Vec::with_capacity(items.len());
        for item in items.iter() {
            values.push(apply_steps(item.clone(), each, span)?);
        }
        Ok(Value::from(values))
    }

    fn eval_object(&mut self, items: &[ObjectItem]) -> EvalResult {
        let mut fields: BTreeMap<Rc<str>, Value> = BTreeMap::new();
        let mut unknown = false;

        for item in items {
            let key = self.eval_expr(&item.key)?;
            let value = self.eval_expr(&item.value)?;
            match &key {
                Value::Unknown => unknown = true,
                Value::Null => {
                    return Err(Diagnostic::error(
                        "Null value as key",
                        "Can't use a null value as a key.",
                        item.key.span(),
                    ))
                }
                k => match convert::to_string(k) {
                    Some(k) => {
                        fields.insert(k.as_str().into(), value);
                    }
                    None => {
                        return Err(Diagnostic::error(
                            "Incorrect key type",
                            "Can't use this value as a key: string required.",
                            item.key.span(),
                        ))
                    }
                },
            }
        }

        if unknown {
            return Ok(Value::Unknown);
        }
        Ok(Value::from(fields))
    }

    fn eval_call(
        &mut self,
        span: &Span,
        name: &str,
        params: &[Ref<Expr>],
        expand_final: bool,
    ) -> EvalResult {
        let fcn = match self.ctx.function(name) {
            Some(fcn) => *fcn,
            None => {
                return Err(Diagnostic::error(
                    "Call to unknown function",
                    format!("There is no function named \"{name}\"."),
                    span,
                ))
            }
        };

        let mut args = Vec::with_capacity(params.len());
        for p in params {
            args.push(self.eval_expr(p)?);
        }

        if expand_final {
            let last_span = params.last().map(|p| p.span()).unwrap_or(span);
            match args.pop() {
                Some(Value::List(items)) => args.extend(items.iter().cloned()),
                Some(Value::Unknown) => return Ok(Value::Unknown),
                Some(Value::Null) => {
                    return Err(Diagnostic::error(
                        "Invalid expanding argument value",
                        "The expanding argument (indicated by ...) must not be null.",
                        last_span,
                    ))
                }
                Some(_) | None => {
                    return Err(Diagnostic::error(
                        "Invalid expanding argument value",
                        "The expanding argument (indicated by ...) must be of a tuple, list, or set type.",
                        last_span,
                    ))
                }
            }
        }

        if !args.iter().all(Value::is_wholly_known) {
            return Ok(Value::Unknown);
        }

        trace!("calling {name} with {} argument(s)", args.len());
        fcn(span, params, &args).map_err(|e| {
            Diagnostic::error(
                "Error in function call",
                format!("Call to function \"{name}\" failed: {e}."),
                span,
            )
        })
    }

    fn eval_condition(&mut self, expr: &Expr) -> Result<Option<bool>, Diagnostic> {
        match self.eval_expr(expr)? {
            Value::Unknown => Ok(None),
            Value::Null => Err(Diagnostic::error(
                "Invalid conditional",
                "The condition value is null. Conditions must either be true or false.",
                expr.span(),
            )),
            v => match convert::to_bool(&v) {
                Some(b) => Ok(Some(b)),
                None => Err(Diagnostic::error(
                    "Incorrect condition type",
                    format!(
                        "The condition expression must be of type bool, got {}.",
                        v.type_name()
                    ),
                    expr.span(),
                )),
            },
        }
    }

    fn eval_conditional(
        &mut self,
        condition: &Expr,
        true_result: &Expr,
        false_result: &Expr,
    ) -> EvalResult {
        match self.eval_condition(condition)? {
            None => Ok(Value::Unknown),
            Some(true) => self.eval_expr(true_result),
            Some(false) => self.eval_expr(false_result),
        }
    }

    fn eval_binary_op(&mut self, span: &Span, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> EvalResult {
        let lhs_value = self.eval_expr(lhs)?;
        let rhs_value = self.eval_expr(rhs)?;

        if lhs_value.is_unknown() || rhs_value.is_unknown() {
            return Ok(Value::Unknown);
        }

        let bools = || -> Result<(bool, bool), Diagnostic> {
            Ok((
                bool_operand(&lhs_value, lhs, Side::Left)?,
                bool_operand(&rhs_value, rhs, Side::Right)?,
            ))
        };
        let numbers = || -> Result<(Number, Number), Diagnostic> {
            Ok((
                number_operand(&lhs_value, lhs, Side::Left)?,
                number_operand(&rhs_value, rhs, Side::Right)?,
            ))
        };
        let arith = |r: anyhow::Result<Number>| {
            r.map(Value::Number).map_err(|e| {
                Diagnostic::error(
                    "Operation failed",
                    format!("Error during operation: {e}."),
                    span,
                )
            })
        };

        match op {
            BinaryOp::Equal => Ok(Value::Bool(lhs_value == rhs_value)),
            BinaryOp::NotEqual => Ok(Value::Bool(lhs_value != rhs_value)),
            BinaryOp::And => bools().map(|(a, b)| Value::Bool(a && b)),
            BinaryOp::Or => bools().map(|(a, b)| Value::Bool(a || b)),
            BinaryOp::Add => numbers().and_then(|(a, b)| arith(a.add(&b))),
            BinaryOp::Subtract => numbers().and_then(|(a, b)| arith(a.sub(&b))),
            BinaryOp::Multiply => numbers().and_then(|(a, b)| arith(a.mul(&b))),
            BinaryOp::Divide => numbers().and_then(|(a, b)| arith(a.divide(&b))),
            BinaryOp::Modulo => numbers().and_then(|(a, b)| arith(a.modulo(&b))),
            BinaryOp::LessThan => numbers().map(|(a, b)| Value::Bool(a < b)),
            BinaryOp::LessThanOrEqual => numbers().map(|(a, b)| Value::Bool(a <= b)),
            BinaryOp::GreaterThan => numbers().map(|(a, b)| Value::Bool(a > b)),
            BinaryOp::GreaterThanOrEqual => numbers().map(|(a, b)| Value::Bool(a >= b)),
        }
    }

    fn eval_unary_op(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult {
        let value = self.eval_expr(operand)?;
        if value.is_unknown() {
            return Ok(Value::Unknown);
        }
        match op {
            UnaryOp::Negate => number_operand(&value, operand, Side::Unary)?
                .neg()
                .map(Value::Number)
                .map_err(|e| {
                    Diagnostic::error(
                        "Operation failed",
                        format!("Error during operation: {e}."),
                        operand.span(),
                    )
                }),
            UnaryOp::Not => Ok(Value::Bool(!bool_operand(&value, operand, Side::Unary)?)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_for(
        &mut self,
        span: &Span,
        key_var: Option<&str>,
        value_var: &str,
        collection: &Expr,
        key: Option<&Expr>,
        value: &Expr,
        condition: Option<&Expr>,
        group: bool,
    ) -> EvalResult {
        if group && key.is_none() {
            return Err(Diagnostic::error(
                "Invalid 'for' expression",
                "The grouping ellipsis (...) can only be used when constructing an object.",
                span,
            ));
        }

        let elements: Vec<(Value, Value)> = match self.eval_expr(collection)? {
            Value::Unknown => return Ok(Value::Unknown),
            Value::Null => {
                return Err(Diagnostic::error(
                    "Iteration over null value",
                    "A null value cannot be used as the collection in a 'for' expression.",
                    collection.span(),
                ))
            }
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(idx, v)| (Value::from(idx), v.clone()))
                .collect(),
            Value::Map(fields) => fields
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                .collect(),
            v => {
                return Err(Diagnostic::error(
                    "Iteration over non-iterable value",
                    format!(
                        "A value of type {} cannot be used as the collection in a 'for' expression.",
                        v.type_name()
                    ),
                    collection.span(),
                ))
            }
        };

        let mut list: Vec<Value> = vec![];
        let mut object: BTreeMap<Rc<str>, Value> = BTreeMap::new();
        let mut grouped: BTreeMap<Rc<str>, Vec<Value>> = BTreeMap::new();

        for (k, v) in elements {
            let mut scope = Scope::new();
            if let Some(key_var) = key_var {
                scope.insert(key_var.to_string(), k);
            }
            scope.insert(value_var.to_string(), v);

            self.scopes.push(scope);
            let r = self.eval_for_element(span, key, value, condition);
            self.scopes.pop();

            let (elem_key, elem_value) = match r? {
                ForElement::Skip => continue,
                ForElement::Unknown => return Ok(Value::Unknown),
                ForElement::Item(elem_key, elem_value) => (elem_key, elem_value),
            };

            match elem_key {
                None => list.push(elem_value),
                Some(elem_key) if group => grouped.entry(elem_key).or_default().push(elem_value),
                Some(elem_key) => {
                    if object.contains_key(&elem_key) {
                        return Err(Diagnostic::error(
                            "Duplicate object key",
                            format!("Two different items produced the key \"{elem_key}\" in this 'for' expression. If duplicate keys are expected, use the ellipsis (...) after the value expression to enable grouping by key."),
                            span,
                        ));
                    }
                    object.insert(elem_key, elem_value);
                }
            }
        }

        Ok(match (key, group) {
            (None, _) => Value::from(list),
            (Some(_), false) => Value::from(object),
            (Some(_), true) => grouped
                .into_iter()
                .map(|(k, items)| (k, Value::from(items)))
                .collect::<BTreeMap<Rc<str>, Value>>()
                .into(),
        })
    }

    fn eval_for_element(
        &mut self,
        span: &Span,
        key: Option<&Expr>,
        value: &Expr,
        condition: Option<&Expr>,
    ) -> Result<ForElement, Diagnostic> {
        if let Some(condition) = condition {
            match self.eval_condition(condition)? {
                None => return Ok(ForElement::Unknown),
                Some(false) => return Ok(ForElement::Skip),
                Some(true) => (),
            }
        }

        let elem_key = match key {
            None => None,
            Some(key) => match self.eval_expr(key)? {
                Value::Unknown => return Ok(ForElement::Unknown),
                Value::Null => {
                    return Err(Diagnostic::error(
                        "Invalid object key",
                        "Key expression in 'for' expression must not produce a null value.",
                        key.span(),
                    ))
                }
                k => match convert::to_string(&k) {
                    Some(k) => Some(Rc::from(k.as_str())),
                    None => {
                        return Err(Diagnostic::error(
                            "Invalid object key",
                            "The key expression produced an invalid result: string required.",
                            key.span(),
                        ))
                    }
                },
            },
        };

        let elem_value = self.eval_expr(value)?;
        trace!("{span}: for element {elem_key:?} => {elem_value}");
        Ok(ForElement::Item(elem_key, elem_value))
    }

    /// Decodes `body` into an object value shaped by `schema`.
    ///
    /// Missing optional attributes and absent single blocks decode to null.
    pub fn decode_body(&mut self, body: &Body, schema: &BlockSchema) -> Result<Value, Diagnostics> {
        let mut diags = Diagnostics::new();
        let mut fields: BTreeMap<Rc<str>, Value> = BTreeMap::new();

        for attr in &body.attributes {
            if !schema.attributes.contains_key(&attr.name) {
                diags.push(Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here.", attr.name),
                    &attr.span,
                ));
            }
        }
        for block in &body.blocks {
            if !schema.block_types.contains_key(&block.block_type) {
                diags.push(Diagnostic::error(
                    "Unsupported block type",
                    format!(
                        "Blocks of type \"{}\" are not expected here.",
                        block.block_type
                    ),
                    &block.def_span,
                ));
            }
        }

        for (name, attr_schema) in &schema.attributes {
            let value = match body.attribute(name) {
                Some(attr) => match self.eval_with_type(&attr.expr, &attr_schema.ty) {
                    Ok(v) => v,
                    Err(d) => {
                        diags.push(d);
                        continue;
                    }
                },
                None if attr_schema.required => {
                    diags.push(Diagnostic::error(
                        "Missing required argument",
                        format!(
                            "The argument \"{name}\" is required, but no definition was found."
                        ),
                        &body.span,
                    ));
                    continue;
                }
                None => Value::Null,
            };
            fields.insert(name.as_str().into(), value);
        }

        for (block_type, nested) in &schema.block_types {
            let blocks: Vec<&Block> = body
                .blocks
                .iter()
                .filter(|b| &b.block_type == block_type)
                .collect();
            match self.decode_nested_blocks(body, block_type, nested, &blocks) {
                Ok(v) => {
                    fields.insert(block_type.as_str().into(), v);
                }
                Err(d) => diags.extend(d),
            }
        }

        if !diags.is_empty() {
            debug!("{}: block decoded with {} diagnostic(s)", body.span, diags.len());
            return Err(diags);
        }
        Ok(Value::from(fields))
    }

    fn decode_nested_blocks(
        &mut self,
        parent: &Body,
        block_type: &str,
        nested: &NestedBlockSchema,
        blocks: &[&Block],
    ) -> Result<Value, Diagnostics> {
        let mut diags = Diagnostics::new();

        if blocks.len() < nested.min_items {
            diags.push(Diagnostic::error(
                format!("Insufficient {block_type} blocks"),
                format!(
                    "At least {} \"{block_type}\" blocks are required.",
                    nested.min_items
                ),
                &parent.span,
            ));
        }
        if let Some(max) = nested.max_items {
            if blocks.len() > max {
                diags.push(Diagnostic::error(
                    format!("Too many {block_type} blocks"),
                    format!("No more than {max} \"{block_type}\" blocks are allowed."),
                    &blocks[max].def_span,
                ));
            }
        }

        if nested.nesting == NestingMode::Single && blocks.len() > 1 {
            diags.push(Diagnostic::error(
                format!("Duplicate {block_type} block"),
                format!(
                    "Only one \"{block_type}\" block is allowed. Another was defined at {}.",
                    blocks[0].def_span
                ),
                &blocks[1].def_span,
            ));
        }

        let mut decoded = Vec::with_capacity(blocks.len());
        let mut keyed: BTreeMap<Rc<str>, Value> = BTreeMap::new();
        for block in blocks {
            let value = match self.decode_body(&block.body, &nested.block) {
                Ok(v) => v,
                Err(d) => {
                    diags.extend(d);
                    continue;
                }
            };

            if nested.nesting != NestingMode::Map {
                decoded.push(value);
                continue;
            }

            match block.labels.as_slice() {
                [label] => {
                    if keyed.contains_key(label.as_str()) {
                        diags.push(Diagnostic::error(
                            format!("Duplicate {block_type} block"),
                            format!("A \"{block_type}\" block with the label \"{label}\" was already defined."),
                            &block.def_span,
                        ));
                    } else {
                        keyed.insert(label.as_str().into(), value);
                    }
                }
                _ => diags.push(Diagnostic::error(
                    format!("Invalid {block_type} block labels"),
                    format!("A \"{block_type}\" block must have exactly one label: the map key."),
                    &block.def_span,
                )),
            }
        }

        if !diags.is_empty() {
            return Err(diags);
        }

        Ok(match nested.nesting {
            NestingMode::Single => decoded.into_iter().next().unwrap_or(Value::Null),
            NestingMode::List => Value::from(decoded),
            NestingMode::Set => {
                let unique: BTreeSet<Value> = decoded.into_iter().collect();
                Value::from(unique.into_iter().collect::<Vec<Value>>())
            }
            NestingMode::Map => Value::from(keyed),
        })
    }
}

enum ForElement {
    Skip,
    Unknown,
    Item(Option<Rc<str>>, Value),
}

fn bool_operand(value: &Value, expr: &Expr, side: Side) -> Result<bool, Diagnostic> {
    match convert::to_bool(value) {
        Some(b) => Ok(b),
        None => Err(Diagnostic::error(
            "Invalid operand",
            format!("Unsuitable value for {} operand: a bool is required.", side.name()),
            expr.span(),
        )),
    }
}

fn number_operand(value: &Value, expr: &Expr, side: Side) -> Result<Number, Diagnostic> {
    match convert::to_number(value) {
        Some(n) => Ok(n),
        None => Err(Diagnostic::error(
            "Invalid operand",
            format!(
                "Unsuitable value for {} operand: a number is required.",
                side.name()
            ),
            expr.span(),
        )),
    }
}

fn apply_steps(mut value: Value, steps: &[TraverseStep], span: &Span) -> EvalResult {
    for step in steps {
        value = match step {
            TraverseStep::Attr(name) => get_attr(&value, name, span)?,
            TraverseStep::Index(key) => index_value(&value, key, span)?,
        };
    }
    Ok(value)
}

fn get_attr(value: &Value, name: &str, span: &Span) -> EvalResult {
    match value {
        Value::Unknown => Ok(Value::Unknown),
        Value::Null => Err(Diagnostic::error(
            "Attempt to get attribute from null value",
            "This value is null, so it does not have any attributes.",
            span,
        )),
        Value::Map(fields) => match fields.get(name) {
            Some(v) => Ok(v.clone()),
            None => Err(Diagnostic::error(
                "Unsupported attribute",
                format!("This object does not have an attribute named \"{name}\"."),
                span,
            )),
        },
        v => Err(Diagnostic::error(
            "Unsupported attribute",
            format!(
                "Can't access attributes on a value of type {}.",
                v.type_name()
            ),
            span,
        )),
    }
}

fn index_value(collection: &Value, key: &Value, span: &Span) -> EvalResult {
    if collection.is_unknown() || key.is_unknown() {
        return Ok(Value::Unknown);
    }
    if collection.is_null() {
        return Err(Diagnostic::error(
            "Attempt to index null value",
            "This value is null, so it does not have any indices.",
            span,
        ));
    }
    if key.is_null() {
        return Err(Diagnostic::error(
            "Invalid index",
            "Can't use a null value as an indexing key.",
            span,
        ));
    }

    let missing = || {
        Diagnostic::error(
            "Invalid index",
            "The given key does not identify an element in this collection value.",
            span,
        )
    };

    match collection {
        Value::List(items) => {
            let idx = convert::to_number(key)
                .filter(Number::is_integer)
                .and_then(|n| n.as_u64())
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    Diagnostic::error(
                        "Invalid index",
                        "The given key does not identify an element in this collection value: a whole number is required.",
                        span,
                    )
                })?;
            items.get(idx).cloned().ok_or_else(missing)
        }
        Value::Map(fields) => {
            let key = convert::to_string(key).ok_or_else(|| {
                Diagnostic::error(
                    "Invalid index",
                    "The given key does not identify an element in this collection value: string required.",
                    span,
                )
            })?;
            fields.get(key.as_str()).cloned().ok_or_else(missing)
        }
        v => Err(Diagnostic::error(
            "Invalid index",
            format!("This value does not have any indices: {}.", v.type_name()),
            span,
        )),
    }
}
