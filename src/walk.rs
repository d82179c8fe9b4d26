// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structural traversal of [`Value`] trees.
//!
//! All tree walks in the crate go through [`traverse`]: the visitor decides
//! per node whether to descend, to stop the walk with a reason, or to
//! substitute the node.

use crate::value::Value;
use crate::Rc;

use core::fmt;
use std::collections::BTreeMap;

/// One step from a value into one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Index(usize),
    Key(Rc<str>),
}

/// Location of a nested value relative to the root of a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) {
        let _ = self.steps.pop();
    }

    pub fn index(&self, idx: usize) -> Path {
        let mut p = self.clone();
        p.push(PathStep::Index(idx));
        p
    }

    pub fn key(&self, key: &str) -> Path {
        let mut p = self.clone();
        p.push(PathStep::Key(key.into()));
        p
    }

    /// `"<path>: "` for use in front of a message, or nothing at the root.
    pub fn prefix(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("{self}: ")
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                PathStep::Index(idx) => write!(f, "[{idx}]")?,
                PathStep::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

/// What to do after visiting a node.
#[derive(Debug)]
pub enum Visit<E> {
    /// Keep going, descending into the node's children.
    Continue,
    /// Stop the whole walk and report `E`.
    Abort(E),
    /// Put the given value in place of the node. The replacement is not
    /// visited.
    Replace(Value),
}

/// Walks `value` depth-first in pre-order: a node is visited before its
/// children, list elements in order and map entries in key order.
///
/// The first [`Visit::Abort`] ends the walk and is returned; nodes after it
/// are never visited and `value` is left as it was. Only the lists and maps
/// on the path to a replaced node are copied; all other storage, including
/// storage shared with other trees, is kept as is.
pub fn traverse<E, F>(value: &mut Value, visitor: &mut F) -> Result<(), E>
where
    F: FnMut(&Path, &Value) -> Visit<E>,
{
    let mut path = Path::new();
    if let Some(rewritten) = rewrite(value, &mut path, visitor)? {
        *value = rewritten;
    }
    Ok(())
}

// Returns the new node when it or any descendant was replaced.
fn rewrite<E, F>(value: &Value, path: &mut Path, visitor: &mut F) -> Result<Option<Value>, E>
where
    F: FnMut(&Path, &Value) -> Visit<E>,
{
    match visitor(path, value) {
        Visit::Continue => (),
        Visit::Abort(reason) => return Err(reason),
        Visit::Replace(replacement) => return Ok(Some(replacement)),
    }

    match value {
        Value::List(items) => {
            let mut copy: Option<Vec<Value>> = None;
            for (idx, item) in items.iter().enumerate() {
                path.push(PathStep::Index(idx));
                let r = rewrite(item, path, visitor);
                path.pop();
                if let Some(new_item) = r? {
                    copy.get_or_insert_with(|| items.to_vec())[idx] = new_item;
                }
            }
            Ok(copy.map(|items| Value::List(Rc::new(items))))
        }
        Value::Map(fields) => {
            let mut copy: Option<BTreeMap<Rc<str>, Value>> = None;
            for (key, item) in fields.iter() {
                path.push(PathStep::Key(key.clone()));
                let r = rewrite(item, path, visitor);
                path.pop();
                if let Some(new_item) = r? {
                    copy.get_or_insert_with(|| (**fields).clone())
                        .insert(key.clone(), new_item);
                }
            }
            Ok(copy.map(|fields| Value::Map(Rc::new(fields))))
        }
        _ => Ok(None),
    }
}
