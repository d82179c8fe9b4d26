// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Body, Expr, Span};
use crate::builtins::{self, BuiltinFcn};
use crate::interpreter::Interpreter;
use crate::schema::BlockSchema;
use crate::typing::Type;
use crate::value::Value;

use core::fmt;
use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem reported while evaluating an expression or block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub subject: Option<Span>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>, subject: &Span) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            subject: Some(subject.clone()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(subject) = &self.subject {
            write!(f, "{subject}: ")?;
        }
        f.write_str(&self.summary)?;
        if !self.detail.is_empty() {
            write!(f, "; {}", self.detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Diagnostics reported by an [`EvalContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.0))]
pub struct Diagnostics(pub Vec<Diagnostic>);

fn summarize(diags: &[Diagnostic]) -> String {
    match diags {
        [] => "no diagnostics".to_string(),
        [d] => d.to_string(),
        [d, rest @ ..] => format!("{d}, and {} other diagnostic(s)", rest.len()),
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }
}

/// Evaluates expressions and blocks into values.
///
/// Implementations are read-only snapshots of the symbols in scope and can
/// be shared between threads.
pub trait EvalContext: Send + Sync {
    /// Evaluates `expr` and converts the result to `want`.
    fn evaluate_expr(&self, expr: &Expr, want: &Type) -> Result<Value, Diagnostics>;

    /// Decodes `body` with `schema` into an object value.
    fn evaluate_block(&self, body: &Body, schema: &BlockSchema) -> Result<Value, Diagnostics>;
}

/// Evaluation context built from static configuration: input variables,
/// module paths and the workspace name.
#[derive(Debug, Clone)]
pub struct StaticContext {
    variables: BTreeMap<String, Value>,
    module_path: String,
    root_path: String,
    cwd: String,
    workspace: String,
    functions: HashMap<String, BuiltinFcn>,
}

impl Default for StaticContext {
    fn default() -> Self {
        Self::new()
    }
}

const ENV_VAR_PREFIX: &str = "TF_VAR_";
const ENV_WORKSPACE: &str = "TF_WORKSPACE";

impl StaticContext {
    pub fn new() -> Self {
        Self {
            variables: BTreeMap::new(),
            module_path: ".".to_string(),
            root_path: ".".to_string(),
            cwd: ".".to_string(),
            workspace: "default".to_string(),
            functions: builtins::BUILTINS
                .iter()
                .map(|(name, fcn)| (name.to_string(), *fcn))
                .collect(),
        }
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        trace!("variable {name} = {value}");
        self.variables.insert(name.to_string(), value);
    }

    /// Declares a variable without a value. It evaluates to unknown.
    pub fn declare_variable(&mut self, name: &str) {
        self.set_variable(name, Value::Unknown);
    }

    /// Binds every entry of a map value as a variable.
    pub fn add_variables(&mut self, variables: Value) -> Result<()> {
        let fields = match &variables {
            Value::Map(fields) => fields,
            v => bail!("variables must be a map. Got {} instead", v.type_name()),
        };
        for (name, value) in fields.iter() {
            self.set_variable(name, value.clone());
        }
        debug!("added {} variable(s)", fields.len());
        Ok(())
    }

    pub fn add_variables_from_json_str(&mut self, json: &str) -> Result<()> {
        self.add_variables(Value::from_json_str(json)?)
    }

    #[cfg(feature = "yaml")]
    pub fn add_variables_from_yaml_str(&mut self, yaml: &str) -> Result<()> {
        self.add_variables(Value::from_yaml_str(yaml)?)
    }

    /// Reads `TF_VAR_<name>` entries as string variables and `TF_WORKSPACE`
    /// as the workspace name. Other entries are ignored.
    ///
    /// ```no_run
    /// let mut ctx = hcleval::StaticContext::new();
    /// ctx.add_variables_from_env(std::env::vars());
    /// ```
    pub fn add_variables_from_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let key = key.as_ref();
            if key == ENV_WORKSPACE {
                self.set_workspace(value.as_ref());
            } else if let Some(name) = key.strip_prefix(ENV_VAR_PREFIX) {
                if !name.is_empty() {
                    self.set_variable(name, Value::from(value.as_ref()));
                }
            }
        }
    }

    pub fn set_module_path(&mut self, path: &str) {
        self.module_path = path.to_string();
    }

    pub fn set_root_path(&mut self, path: &str) {
        self.root_path = path.to_string();
    }

    pub fn set_cwd(&mut self, path: &str) {
        self.cwd = path.to_string();
    }

    pub fn set_workspace(&mut self, workspace: &str) {
        self.workspace = workspace.to_string();
    }

    /// Adds or replaces a function callable from expressions.
    pub fn add_function(&mut self, name: &str, fcn: BuiltinFcn) {
        self.functions.insert(name.to_string(), fcn);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&BuiltinFcn> {
        self.functions.get(name)
    }

    pub fn path_attribute(&self, name: &str) -> Option<&str> {
        match name {
            "module" => Some(&self.module_path),
            "root" => Some(&self.root_path),
            "cwd" => Some(&self.cwd),
            _ => None,
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }
}

impl EvalContext for StaticContext {
    fn evaluate_expr(&self, expr: &Expr, want: &Type) -> Result<Value, Diagnostics> {
        Interpreter::new(self)
            .eval_with_type(expr, want)
            .map_err(Diagnostics::from)
    }

    fn evaluate_block(&self, body: &Body, schema: &BlockSchema) -> Result<Value, Diagnostics> {
        Interpreter::new(self).decode_body(body, schema)
    }
}
