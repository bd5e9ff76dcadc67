//! Name-keyed function registry and the uniform invocation contract.

use std::collections::BTreeMap;

use tracing::debug;

use super::context::FunctionContext;
use super::result::{FunctionOutput, ValidationResult};
use super::signature::{ArgValue, FunctionArgument, FunctionSignature};
use crate::document::DocContainer;
use crate::error::{Error, Result};

/// A function implementation. It receives the caller context, the container
/// to operate on, the validated argument list, and the opaque live-state
/// payload. All mutation is confined to the container.
pub type Handler = Box<
    dyn Fn(&FunctionContext, &mut DocContainer, &[FunctionArgument], &[u8]) -> Result<FunctionOutput>
        + Send
        + Sync,
>;

pub struct Registration {
    pub signature: FunctionSignature,
    handler: Handler,
}

/// What an invocation produced. Fatal dispatch failures (unknown function,
/// invalid arguments) surface as `Err` from [`FunctionRegistry::invoke`];
/// function-level failures land here so that validating functions still carry
/// their `ValidationResult` and transformations return the unchanged
/// container.
#[derive(Debug)]
pub struct InvocationOutcome {
    pub container: DocContainer,
    pub result: FunctionOutput,
    pub error: Option<Error>,
}

/// Mutable assembly phase; `build` freezes the registry.
#[derive(Default)]
pub struct FunctionRegistryBuilder {
    map: BTreeMap<String, Registration>,
}

impl FunctionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a function. Re-registering a name overwrites deterministically.
    pub fn register(&mut self, signature: FunctionSignature, handler: Handler) {
        let name = signature.name.clone();
        if self
            .map
            .insert(name.clone(), Registration { signature, handler })
            .is_some()
        {
            debug!(function = %name, "re-registration overwrote an existing function");
        }
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry { map: self.map }
    }
}

/// Read-only dispatch table.
pub struct FunctionRegistry {
    map: BTreeMap<String, Registration>,
}

impl FunctionRegistry {
    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.map.get(name)
    }

    /// The self-describing signature list.
    pub fn signatures(&self) -> Vec<&FunctionSignature> {
        self.map.values().map(|r| &r.signature).collect()
    }

    /// Dispatch one invocation: locate by name, validate arguments against
    /// the signature, run the implementation.
    pub fn invoke(
        &self,
        name: &str,
        ctx: &FunctionContext,
        container: DocContainer,
        args: &[ArgValue],
        live_state: &[u8],
    ) -> Result<InvocationOutcome> {
        let registration = self
            .map
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("function {}", name)))?;
        let validated = registration.signature.validate_args(args)?;

        // A failed transformation must hand back the unchanged container.
        let backup = registration
            .signature
            .mutating
            .then(|| container.clone());

        let mut working = container;
        match (registration.handler)(ctx, &mut working, &validated, live_state) {
            Ok(result) => Ok(InvocationOutcome {
                container: working,
                result,
                error: None,
            }),
            Err(error) => {
                let container = backup.unwrap_or(working);
                let result = if registration.signature.validating {
                    FunctionOutput::Validation(ValidationResult::failed(vec![error.to_string()]))
                } else {
                    FunctionOutput::None
                };
                Ok(InvocationOutcome {
                    container,
                    result,
                    error: Some(error),
                })
            }
        }
    }
}
