// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;
use crate::Rc;

use core::{cmp, fmt, ops::Deref};

use serde::{Deserialize, Serialize};

/// Source location of a node, used only to build diagnostics.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Span {
    pub file: Rc<str>,
    pub line: u32,
    pub col: u32,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            file: Rc::from(""),
            line: 0,
            col: 0,
        }
    }
}

impl Span {
    pub fn new(file: &str, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

/// A single step of a traversal: `.name` or `[key]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StepRepr", into = "StepRepr")]
pub enum TraverseStep {
    Attr(String),
    Index(Value),
}

// Compact fixture spelling: `name` is an attribute step, `0` a positional
// index, `{index: key}` any other index.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StepRepr {
    Attr(String),
    Position(u64),
    Keyed { index: Value },
}

impl From<StepRepr> for TraverseStep {
    fn from(repr: StepRepr) -> Self {
        match repr {
            StepRepr::Attr(name) => TraverseStep::Attr(name),
            StepRepr::Position(idx) => TraverseStep::Index(Value::from(idx)),
            StepRepr::Keyed { index } => TraverseStep::Index(index),
        }
    }
}

impl From<TraverseStep> for StepRepr {
    fn from(step: TraverseStep) -> Self {
        match step {
            TraverseStep::Attr(name) => StepRepr::Attr(name),
            TraverseStep::Index(index) => StepRepr::Keyed { index },
        }
    }
}

impl fmt::Display for TraverseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraverseStep::Attr(name) => write!(f, ".{name}"),
            TraverseStep::Index(key) => write!(f, "[{key}]"),
        }
    }
}

/// A symbol followed by attribute and index steps, e.g. `var.subnets[0]`.
///
/// Fixtures spell a traversal as a list whose first element is the root:
/// `[var, subnets, 0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StepRepr>", into = "Vec<StepRepr>")]
pub struct Traversal {
    pub root: String,
    pub steps: Vec<TraverseStep>,
}

impl TryFrom<Vec<StepRepr>> for Traversal {
    type Error = String;

    fn try_from(parts: Vec<StepRepr>) -> Result<Self, Self::Error> {
        let mut parts = parts.into_iter();
        let root = match parts.next() {
            Some(StepRepr::Attr(root)) => root,
            _ => return Err("a traversal must start with a symbol name".to_string()),
        };
        Ok(Traversal {
            root,
            steps: parts.map(TraverseStep::from).collect(),
        })
    }
}

impl From<Traversal> for Vec<StepRepr> {
    fn from(traversal: Traversal) -> Self {
        let mut parts = vec![StepRepr::Attr(traversal.root)];
        parts.extend(traversal.steps.into_iter().map(StepRepr::from));
        parts
    }
}

impl Traversal {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            steps: vec![],
        }
    }

    pub fn attr(mut self, name: &str) -> Self {
        self.steps.push(TraverseStep::Attr(name.to_string()));
        self
    }

    pub fn index(mut self, key: impl Into<Value>) -> Self {
        self.steps.push(TraverseStep::Index(key.into()));
        self
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectItem {
    pub key: Ref<Expr>,
    pub value: Ref<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal {
        #[serde(default)]
        span: Span,
        value: Value,
    },

    // "prefix-${expr}-suffix"
    Template {
        #[serde(default)]
        span: Span,
        parts: Vec<Ref<Expr>>,
    },

    // "${expr}": yields the inner value without string conversion
    TemplateWrap {
        #[serde(default)]
        span: Span,
        wrapped: Ref<Expr>,
    },

    ScopeTraversal {
        #[serde(default)]
        span: Span,
        traversal: Traversal,
    },

    RelativeTraversal {
        #[serde(default)]
        span: Span,
        source: Ref<Expr>,
        steps: Vec<TraverseStep>,
    },

    Index {
        #[serde(default)]
        span: Span,
        collection: Ref<Expr>,
        key: Ref<Expr>,
    },

    // source[*].each
    Splat {
        #[serde(default)]
        span: Span,
        source: Ref<Expr>,
        #[serde(default)]
        each: Vec<TraverseStep>,
    },

    Tuple {
        #[serde(default)]
        span: Span,
        items: Vec<Ref<Expr>>,
    },

    Object {
        #[serde(default)]
        span: Span,
        items: Vec<ObjectItem>,
    },

    FunctionCall {
        #[serde(default)]
        span: Span,
        name: String,
        #[serde(default)]
        args: Vec<Ref<Expr>>,
        #[serde(default)]
        expand_final: bool,
    },

    Conditional {
        #[serde(default)]
        span: Span,
        condition: Ref<Expr>,
        true_result: Ref<Expr>,
        false_result: Ref<Expr>,
    },

    BinaryOp {
        #[serde(default)]
        span: Span,
        op: BinaryOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    UnaryOp {
        #[serde(default)]
        span: Span,
        op: UnaryOp,
        operand: Ref<Expr>,
    },

    // [for k, v in collection : value if condition]
    // {for k, v in collection : key => value... if condition}
    For {
        #[serde(default)]
        span: Span,
        #[serde(default)]
        key_var: Option<String>,
        value_var: String,
        collection: Ref<Expr>,
        #[serde(default)]
        key: Option<Ref<Expr>>,
        value: Ref<Expr>,
        #[serde(default)]
        condition: Option<Ref<Expr>>,
        #[serde(default)]
        group: bool,
    },
}

impl Expr {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Literal { ref span, .. }
            | Self::Template { ref span, .. }
            | Self::TemplateWrap { ref span, .. }
            | Self::ScopeTraversal { ref span, .. }
            | Self::RelativeTraversal { ref span, .. }
            | Self::Index { ref span, .. }
            | Self::Splat { ref span, .. }
            | Self::Tuple { ref span, .. }
            | Self::Object { ref span, .. }
            | Self::FunctionCall { ref span, .. }
            | Self::Conditional { ref span, .. }
            | Self::BinaryOp { ref span, .. }
            | Self::UnaryOp { ref span, .. }
            | Self::For { ref span, .. } => span,
        }
    }

    fn span_mut(&mut self) -> &mut Span {
        match *self {
            Self::Literal { ref mut span, .. }
            | Self::Template { ref mut span, .. }
            | Self::TemplateWrap { ref mut span, .. }
            | Self::ScopeTraversal { ref mut span, .. }
            | Self::RelativeTraversal { ref mut span, .. }
            | Self::Index { ref mut span, .. }
            | Self::Splat { ref mut span, .. }
            | Self::Tuple { ref mut span, .. }
            | Self::Object { ref mut span, .. }
            | Self::FunctionCall { ref mut span, .. }
            | Self::Conditional { ref mut span, .. }
            | Self::BinaryOp { ref mut span, .. }
            | Self::UnaryOp { ref mut span, .. }
            | Self::For { ref mut span, .. } => span,
        }
    }

    /// Returns the node positioned at `span`.
    pub fn at(mut self, span: Span) -> Self {
        *self.span_mut() = span;
        self
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            span: Span::default(),
            value: value.into(),
        }
    }

    pub fn traversal(traversal: Traversal) -> Self {
        Self::ScopeTraversal {
            span: Span::default(),
            traversal,
        }
    }

    pub fn template(parts: Vec<Expr>) -> Self {
        Self::Template {
            span: Span::default(),
            parts: parts.into_iter().map(Ref::new).collect(),
        }
    }

    pub fn template_wrap(wrapped: Expr) -> Self {
        Self::TemplateWrap {
            span: Span::default(),
            wrapped: Ref::new(wrapped),
        }
    }

    pub fn tuple(items: Vec<Expr>) -> Self {
        Self::Tuple {
            span: Span::default(),
            items: items.into_iter().map(Ref::new).collect(),
        }
    }

    pub fn object(items: Vec<(Expr, Expr)>) -> Self {
        Self::Object {
            span: Span::default(),
            items: items
                .into_iter()
                .map(|(key, value)| ObjectItem {
                    key: Ref::new(key),
                    value: Ref::new(value),
                })
                .collect(),
        }
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Self::FunctionCall {
            span: Span::default(),
            name: name.to_string(),
            args: args.into_iter().map(Ref::new).collect(),
            expand_final: false,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::BinaryOp {
            span: Span::default(),
            op,
            lhs: Ref::new(lhs),
            rhs: Ref::new(rhs),
        }
    }

    pub fn conditional(condition: Expr, true_result: Expr, false_result: Expr) -> Self {
        Self::Conditional {
            span: Span::default(),
            condition: Ref::new(condition),
            true_result: Ref::new(true_result),
            false_result: Ref::new(false_result),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub span: Span,
    pub name: String,
    pub expr: Expr,
}

/// Contents of a block: attributes and nested blocks, in source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, expr: Expr) -> Self {
        let span = expr.span().clone();
        self.attributes.push(Attribute {
            span,
            name: name.to_string(),
            expr,
        });
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub block_type: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub body: Body,
    // Position of the block header (type and labels).
    #[serde(default)]
    pub def_span: Span,
}

impl Block {
    pub fn new(block_type: &str, labels: &[&str], body: Body) -> Self {
        Self {
            block_type: block_type.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            body,
            def_span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.def_span = span;
        self
    }
}
