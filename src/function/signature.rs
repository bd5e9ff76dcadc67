use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::mutation::Mutation;

/// Wire-level data types for parameters, attributes, and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    #[default]
    String,
    Int,
    Bool,
    Enum,
    Yaml,
    Cel,
    ResourceList,
    MutationList,
}

/// A typed argument value. Invocations are positional; names are attached
/// during validation from the signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    String(String),
    Mutations(Vec<Mutation>),
}

impl ArgValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::String(_) => "string",
            ArgValue::Mutations(_) => "mutation-list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mutations(&self) -> Option<&[Mutation]> {
        match self {
            ArgValue::Mutations(m) => Some(m),
            _ => None,
        }
    }
}

/// A validated, named argument as handed to implementations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionArgument {
    pub name: String,
    pub value: ArgValue,
}

/// Optional value constraints on a parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<String>,
}

// Constraint patterns come from signatures installed once at init; cache the
// compiled form instead of recompiling per invocation.
static CONSTRAINT_PATTERNS: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl ValueConstraints {
    fn check(&self, name: &str, value: &ArgValue) -> Result<()> {
        if let Some(pattern) = &self.regexp {
            let text = value.as_str().ok_or_else(|| {
                Error::Type(format!("argument {} has a pattern but is not a string", name))
            })?;
            let matched = {
                let mut cache = CONSTRAINT_PATTERNS.lock().expect("constraint cache poisoned");
                if !cache.contains_key(pattern) {
                    let compiled = Regex::new(pattern).map_err(|e| {
                        Error::Internal(format!("constraint pattern {}: {}", pattern, e))
                    })?;
                    cache.insert(pattern.clone(), compiled);
                }
                cache[pattern].is_match(text)
            };
            if !matched {
                return Err(Error::Type(format!(
                    "argument {}: '{}' does not match {}",
                    name, text, pattern
                )));
            }
        }
        if let Some(min) = self.min {
            let n = value.as_int().ok_or_else(|| {
                Error::Type(format!("argument {} has a minimum but is not an int", name))
            })?;
            if n < min {
                return Err(Error::Type(format!(
                    "argument {}: {} is below the minimum {}",
                    name, n, min
                )));
            }
        }
        if let Some(max) = self.max {
            let n = value.as_int().ok_or_else(|| {
                Error::Type(format!("argument {} has a maximum but is not an int", name))
            })?;
            if n > max {
                return Err(Error::Type(format!(
                    "argument {}: {} is above the maximum {}",
                    name, n, max
                )));
            }
        }
        if !self.enum_values.is_empty() {
            let text = value.as_str().ok_or_else(|| {
                Error::Type(format!("argument {} is an enum but not a string", name))
            })?;
            if !self.enum_values.iter().any(|v| v == text) {
                return Err(Error::Type(format!(
                    "argument {}: '{}' is not one of [{}]",
                    name,
                    text,
                    self.enum_values.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// One declared parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub required: bool,
    pub data_type: DataType,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ValueConstraints>,
}

impl ParameterSpec {
    pub fn required(name: &str, data_type: DataType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            data_type,
            description: description.to_string(),
            constraints: None,
        }
    }

    pub fn optional(name: &str, data_type: DataType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, data_type, description)
        }
    }

    pub fn with_constraints(mut self, constraints: ValueConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// Declared function output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    pub data_type: DataType,
    #[serde(default)]
    pub description: String,
}

/// The self-describing registration record for one function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSpec>,
    pub mutating: bool,
    pub validating: bool,
    pub hermetic: bool,
    pub idempotent: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub affected_resource_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
    #[serde(default)]
    pub var_args: bool,
}

impl FunctionSignature {
    /// Align positional values with the declared parameters and validate
    /// each. Var-args functions validate surplus values against the final
    /// parameter.
    pub fn validate_args(&self, args: &[ArgValue]) -> Result<Vec<FunctionArgument>> {
        if args.len() > self.parameters.len() && !self.var_args {
            return Err(Error::Type(format!(
                "function {} takes {} arguments, got {}",
                self.name,
                self.parameters.len(),
                args.len()
            )));
        }
        let mut out = Vec::with_capacity(args.len());
        for (i, param) in self.parameters.iter().enumerate() {
            match args.get(i) {
                Some(value) => {
                    check_data_type(&self.name, param, value)?;
                    if let Some(constraints) = &param.constraints {
                        constraints.check(&param.name, value)?;
                    }
                    out.push(FunctionArgument {
                        name: param.name.clone(),
                        value: value.clone(),
                    });
                }
                None if param.required => {
                    return Err(Error::Type(format!(
                        "function {} is missing required argument {}",
                        self.name, param.name
                    )));
                }
                None => {}
            }
        }
        if self.var_args {
            let tail = self
                .parameters
                .last()
                .ok_or_else(|| {
                    Error::Internal(format!(
                        "var-args function {} declares no parameters",
                        self.name
                    ))
                })?
                .clone();
            for (i, value) in args.iter().enumerate().skip(self.parameters.len()) {
                check_data_type(&self.name, &tail, value)?;
                if let Some(constraints) = &tail.constraints {
                    constraints.check(&tail.name, value)?;
                }
                out.push(FunctionArgument {
                    name: format!("{}{}", tail.name, i - self.parameters.len() + 1),
                    value: value.clone(),
                });
            }
        }
        Ok(out)
    }
}

fn check_data_type(function: &str, param: &ParameterSpec, value: &ArgValue) -> Result<()> {
    let ok = match param.data_type {
        DataType::String | DataType::Enum | DataType::Yaml | DataType::Cel => {
            matches!(value, ArgValue::String(_))
        }
        DataType::Int => matches!(value, ArgValue::Int(_)),
        DataType::Bool => matches!(value, ArgValue::Bool(_)),
        DataType::MutationList => matches!(value, ArgValue::Mutations(_)),
        // No positional carrier for resource lists; they are output-only.
        DataType::ResourceList => false,
    };
    if !ok {
        return Err(Error::Type(format!(
            "function {} argument {} expects {:?}, got {}",
            function,
            param.name,
            param.data_type,
            value.kind()
        )));
    }
    Ok(())
}
