//! Typed inputs and outputs of a revision.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::DataType;

/// Whether an input must be provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputKind {
    #[default]
    Required,
    /// Falls back to [`Input::value`] when not provided.
    Optional,
}

/// Named, typed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    pub data_type: DataType,
    #[serde(default, rename = "type")]
    pub kind: InputKind,
    /// Default value of an optional input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Input {
    /// Creates a required input.
    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            kind: InputKind::Required,
            value: None,
        }
    }

    /// Creates an optional input with a default value.
    pub fn optional(name: impl Into<String>, data_type: DataType, default: Value) -> Self {
        Self {
            name: name.into(),
            data_type,
            kind: InputKind::Optional,
            value: Some(default),
        }
    }

    /// Returns the default value if the input is optional.
    pub fn default_value(&self) -> Option<&Value> {
        match self.kind {
            InputKind::Optional => self.value.as_ref(),
            InputKind::Required => None,
        }
    }
}

/// Named, typed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub data_type: DataType,
}

impl Output {
    /// Creates an output.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered inputs and outputs of a revision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IoInterface {
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl IoInterface {
    /// Creates an interface from inputs and outputs.
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        Self { inputs, outputs }
    }

    /// Looks up an input by name.
    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|input| input.name == name)
    }

    /// Looks up an output by name.
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|output| output.name == name)
    }

    /// Checks that input names and output names are each unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.inputs.iter().map(|input| input.name.as_str()) {
            if !seen.insert(name) {
                return Err(Error::InvalidRevision(format!("duplicate input name '{name}'")));
            }
        }

        seen.clear();
        for name in self.outputs.iter().map(|output| output.name.as_str()) {
            if !seen.insert(name) {
                return Err(Error::InvalidRevision(format!("duplicate output name '{name}'")));
            }
        }

        Ok(())
    }
}
