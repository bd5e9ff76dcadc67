use serde::{Deserialize, Serialize};

use crate::document::Scalar;
use crate::mutation::Mutation;
use crate::provider::ResourceInfo;

/// Result of a validating function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub details: Vec<String>,
}

impl ValidationResult {
    pub fn passed() -> Self {
        Self {
            passed: true,
            details: Vec::new(),
        }
    }

    pub fn failed(details: Vec<String>) -> Self {
        Self {
            passed: false,
            details,
        }
    }
}

/// One attribute value read out of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub resource_type: String,
    pub resource_name: String,
    pub attribute_name: String,
    pub path: String,
    pub value: Scalar,
}

/// Typed result payload returned alongside the (possibly mutated) container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "value")]
pub enum FunctionOutput {
    None,
    ResourceList(Vec<ResourceInfo>),
    AttributeValues(Vec<AttributeValue>),
    Mutations(Vec<Mutation>),
    Validation(ValidationResult),
    Yaml(String),
}

impl FunctionOutput {
    pub fn as_validation(&self) -> Option<&ValidationResult> {
        match self {
            FunctionOutput::Validation(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mutations(&self) -> Option<&[Mutation]> {
        match self {
            FunctionOutput::Mutations(m) => Some(m),
            _ => None,
        }
    }
}
