// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reference extraction and classification.
//!
//! A reference is a symbol an expression depends on, such as `var.region`
//! or `aws_instance.web.id`. Only input variables, `terraform.*` attributes
//! and `path.*` attributes can be resolved from static configuration; every
//! other subject needs live state and makes the expression unevaluable.

use crate::ast::{Body, Expr, Span, Traversal, TraverseStep};
use crate::schema::BlockSchema;

use core::fmt;
use std::collections::BTreeSet;

/// Failure to turn a traversal into a reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("{span}: Invalid reference: The \"{root}\" object cannot be accessed directly. Instead, access one of its attributes.")]
    DirectAccess { span: Span, root: String },

    #[error("{span}: Invalid reference: The \"module\" object cannot be accessed directly. Instead, access one of its attributes.")]
    ModuleCall { span: Span },

    #[error("{span}: Invalid reference: The \"data\" object must be followed by two attribute names: the data source type and the resource name.")]
    DataSource { span: Span },

    #[error("{span}: Invalid reference: A reference to a resource type must be followed by at least one attribute access, specifying the resource name.")]
    ResourceName { span: Span },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceMode {
    Managed,
    Data,
}

/// The object a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Subject {
    InputVariable {
        name: String,
    },
    TerraformAttr {
        name: String,
    },
    PathAttr {
        name: String,
    },
    LocalValue {
        name: String,
    },
    CountAttr {
        name: String,
    },
    ForEachAttr {
        name: String,
    },
    ModuleCall {
        name: String,
        output: Option<String>,
    },
    Resource {
        mode: ResourceMode,
        resource_type: String,
        name: String,
    },
    SelfRef,
}

/// Coarse classification of subjects. The evaluable kinds are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    InputVariable,
    ContextAttribute,
    PathAttribute,
    Other,
}

impl SubjectKind {
    pub const fn is_evaluable(self) -> bool {
        matches!(
            self,
            SubjectKind::InputVariable | SubjectKind::ContextAttribute | SubjectKind::PathAttribute
        )
    }
}

impl Subject {
    pub const fn kind(&self) -> SubjectKind {
        match *self {
            Subject::InputVariable { .. } => SubjectKind::InputVariable,
            Subject::TerraformAttr { .. } => SubjectKind::ContextAttribute,
            Subject::PathAttr { .. } => SubjectKind::PathAttribute,
            Subject::LocalValue { .. }
            | Subject::CountAttr { .. }
            | Subject::ForEachAttr { .. }
            | Subject::ModuleCall { .. }
            | Subject::Resource { .. }
            | Subject::SelfRef => SubjectKind::Other,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::InputVariable { name } => write!(f, "var.{name}"),
            Subject::TerraformAttr { name } => write!(f, "terraform.{name}"),
            Subject::PathAttr { name } => write!(f, "path.{name}"),
            Subject::LocalValue { name } => write!(f, "local.{name}"),
            Subject::CountAttr { name } => write!(f, "count.{name}"),
            Subject::ForEachAttr { name } => write!(f, "each.{name}"),
            Subject::ModuleCall { name, output: None } => write!(f, "module.{name}"),
            Subject::ModuleCall {
                name,
                output: Some(output),
            } => write!(f, "module.{name}.{output}"),
            Subject::Resource {
                mode: ResourceMode::Managed,
                resource_type,
                name,
            } => write!(f, "{resource_type}.{name}"),
            Subject::Resource {
                mode: ResourceMode::Data,
                resource_type,
                name,
            } => write!(f, "data.{resource_type}.{name}"),
            Subject::SelfRef => f.write_str("self"),
        }
    }
}

/// A classified reference found in an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub subject: Subject,
    pub span: Span,
    /// Steps after the part of the traversal that names the subject.
    pub remaining: Vec<TraverseStep>,
}

impl Reference {
    pub fn parse(traversal: &Traversal, span: &Span) -> Result<Reference, ReferenceError> {
        let steps = &traversal.steps;
        let root = traversal.root.as_str();

        let (subject, consumed) = match root {
            "var" | "terraform" | "path" | "local" | "count" | "each" => {
                let name = attr_name(steps, 0).ok_or_else(|| ReferenceError::DirectAccess {
                    span: span.clone(),
                    root: root.to_string(),
                })?;
                let name = name.to_string();
                let subject = match root {
                    "var" => Subject::InputVariable { name },
                    "terraform" => Subject::TerraformAttr { name },
                    "path" => Subject::PathAttr { name },
                    "local" => Subject::LocalValue { name },
                    "count" => Subject::CountAttr { name },
                    _ => Subject::ForEachAttr { name },
                };
                (subject, 1)
            }
            "module" => {
                let name = attr_name(steps, 0)
                    .ok_or_else(|| ReferenceError::ModuleCall { span: span.clone() })?;
                match attr_name(steps, 1) {
                    Some(output) => (
                        Subject::ModuleCall {
                            name: name.to_string(),
                            output: Some(output.to_string()),
                        },
                        2,
                    ),
                    None => (
                        Subject::ModuleCall {
                            name: name.to_string(),
                            output: None,
                        },
                        1,
                    ),
                }
            }
            "data" => match (attr_name(steps, 0), attr_name(steps, 1)) {
                (Some(resource_type), Some(name)) => (
                    Subject::Resource {
                        mode: ResourceMode::Data,
                        resource_type: resource_type.to_string(),
                        name: name.to_string(),
                    },
                    2,
                ),
                _ => return Err(ReferenceError::DataSource { span: span.clone() }),
            },
            "self" => (Subject::SelfRef, 0),
            resource_type => {
                let name = attr_name(steps, 0)
                    .ok_or_else(|| ReferenceError::ResourceName { span: span.clone() })?;
                (
                    Subject::Resource {
                        mode: ResourceMode::Managed,
                        resource_type: resource_type.to_string(),
                        name: name.to_string(),
                    },
                    1,
                )
            }
        };

        Ok(Reference {
            subject,
            span: span.clone(),
            remaining: steps[consumed..].to_vec(),
        })
    }

    pub fn is_evaluable(&self) -> bool {
        self.subject.kind().is_evaluable()
    }
}

fn attr_name(steps: &[TraverseStep], idx: usize) -> Option<&str> {
    match steps.get(idx) {
        Some(TraverseStep::Attr(name)) => Some(name.as_str()),
        _ => None,
    }
}

/// References in `expr`, in the order they appear.
pub fn references_in_expr(expr: &Expr) -> Result<Vec<Reference>, ReferenceError> {
    let mut collector = Collector::default();
    collector.visit(expr)?;
    Ok(collector.refs)
}

/// References in the parts of `body` that `schema` declares.
///
/// Attributes and nested blocks the schema does not know about are skipped;
/// decoding reports them separately.
pub fn references_in_block(
    body: &Body,
    schema: &BlockSchema,
) -> Result<Vec<Reference>, ReferenceError> {
    let mut collector = Collector::default();
    collector.visit_body(body, schema)?;
    Ok(collector.refs)
}

#[derive(Default)]
struct Collector {
    refs: Vec<Reference>,
    // Iteration symbols of the enclosing for expressions.
    locals: Vec<BTreeSet<String>>,
}

impl Collector {
    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|scope| scope.contains(name))
    }

    fn visit_body(&mut self, body: &Body, schema: &BlockSchema) -> Result<(), ReferenceError> {
        for attr in &body.attributes {
            if schema.attributes.contains_key(&attr.name) {
                self.visit(&attr.expr)?;
            }
        }
        for block in &body.blocks {
            if let Some(nested) = schema.block_types.get(&block.block_type) {
                self.visit_body(&block.body, &nested.block)?;
            }
        }
        Ok(())
    }

    fn visit(&mut self, expr: &Expr) -> Result<(), ReferenceError> {
        match expr {
            Expr::Literal { .. } => Ok(()),
            Expr::ScopeTraversal { span, traversal } => {
                if !self.is_local(&traversal.root) {
                    self.refs.push(Reference::parse(traversal, span)?);
                }
                Ok(())
            }
            Expr::Template { parts, .. } => {
                for part in parts {
                    self.visit(part)?;
                }
                Ok(())
            }
            Expr::TemplateWrap { wrapped, .. } => self.visit(wrapped),
            Expr::RelativeTraversal { source, .. } => self.visit(source),
            Expr::Index {
                collection, key, ..
            } => {
                self.visit(collection)?;
                self.visit(key)
            }
            Expr::Splat { source, .. } => self.visit(source),
            Expr::Tuple { items, .. } => {
                for item in items {
                    self.visit(item)?;
                }
                Ok(())
            }
            Expr::Object { items, .. } => {
                for item in items {
                    self.visit(&item.key)?;
                    self.visit(&item.value)?;
                }
                Ok(())
            }
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    self.visit(arg)?;
                }
                Ok(())
            }
            Expr::Conditional {
                condition,
                true_result,
                false_result,
                ..
            } => {
                self.visit(condition)?;
                self.visit(true_result)?;
                self.visit(false_result)
            }
            Expr::BinaryOp { lhs, rhs, .. } => {
                self.visit(lhs)?;
                self.visit(rhs)
            }
            Expr::UnaryOp { operand, .. } => self.visit(operand),
            Expr::For {
                key_var,
                value_var,
                collection,
                key,
                value,
                condition,
                ..
            } => {
                // The collection is evaluated outside the iteration scope.
                self.visit(collection)?;

                let mut scope = BTreeSet::new();
                if let Some(k) = key_var {
                    scope.insert(k.clone());
                }
                scope.insert(value_var.clone());
                self.locals.push(scope);

                let r = self.visit_for_body(key.as_deref(), value, condition.as_deref());
                let _ = self.locals.pop();
                r
            }
        }
    }

    fn visit_for_body(
        &mut self,
        key: Option<&Expr>,
        value: &Expr,
        condition: Option<&Expr>,
    ) -> Result<(), ReferenceError> {
        if let Some(key) = key {
            self.visit(key)?;
        }
        self.visit(value)?;
        if let Some(condition) = condition {
            self.visit(condition)?;
        }
        Ok(())
    }
}
