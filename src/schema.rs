// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Block schemas.
//!
//! A [`BlockSchema`] describes what a block body may contain: attributes with
//! their type constraints, and nested block types with their nesting mode.
//! The schema drives both reference extraction (only declared attributes and
//! blocks are inspected) and block evaluation (the shape of the resulting
//! object value).
//!
//! Schemas deserialize from JSON/YAML:
//!
//! ```yaml
//! attributes:
//!   instance_type: { type: string, required: true }
//!   tags: { type: { map: string } }
//! block_types:
//!   ebs_block_device:
//!     nesting: list
//!     block:
//!       attributes:
//!         volume_size: { type: number }
//! ```

use crate::typing::Type;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockSchema {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
    #[serde(default)]
    pub block_types: BTreeMap<String, NestedBlockSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSchema {
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub required: bool,
}

/// How instances of a nested block type are collected in the parent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// At most one instance; the value is an object, or null when absent.
    Single,
    /// Any number of instances, in source order.
    List,
    /// Any number of instances; duplicates collapse.
    Set,
    /// Instances keyed by their single label.
    Map,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestedBlockSchema {
    pub nesting: NestingMode,
    #[serde(default)]
    pub block: BlockSchema,
    #[serde(default)]
    pub min_items: usize,
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, ty: Type, required: bool) -> Self {
        self.attributes
            .insert(name.to_string(), AttributeSchema { ty, required });
        self
    }

    pub fn with_block(mut self, name: &str, nesting: NestingMode, block: BlockSchema) -> Self {
        self.block_types.insert(
            name.to_string(),
            NestedBlockSchema {
                nesting,
                block,
                min_items: 0,
                max_items: None,
            },
        );
        self
    }

    /// Object type of the value produced by decoding a body with this schema.
    pub fn implied_type(&self) -> Type {
        let mut attrs: BTreeMap<String, Type> = self
            .attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.ty.clone()))
            .collect();
        for (name, nested) in &self.block_types {
            let block_ty = nested.block.implied_type();
            let ty = match nested.nesting {
                NestingMode::Single => block_ty,
                NestingMode::List => Type::list(block_ty),
                NestingMode::Set => Type::set(block_ty),
                NestingMode::Map => Type::map(block_ty),
            };
            attrs.insert(name.clone(), ty);
        }
        Type::Object(attrs)
    }
}
