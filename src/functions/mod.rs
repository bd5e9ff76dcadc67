//! The standard function catalog.

pub mod attributes;
pub mod default_names;
pub mod ensure_context;
pub mod filter;
pub mod mutations;
pub mod replicate;
pub mod resources;
pub mod upsert;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::function::{FunctionArgument, FunctionRegistryBuilder};
use crate::mutation::Mutation;
use crate::path::PathRegistry;
use crate::provider::KubernetesProvider;

/// Install every standard function. Runs once during the init phase.
pub fn register_standard(
    builder: &mut FunctionRegistryBuilder,
    paths: &Arc<PathRegistry>,
    provider: &Arc<KubernetesProvider>,
) {
    resources::register(builder, provider);
    attributes::register(builder, paths, provider);
    filter::register(builder, provider);
    replicate::register(builder, provider);
    upsert::register(builder, provider);
    mutations::register(builder, provider);
    default_names::register(builder, paths, provider);
    ensure_context::register(builder, provider);
}

// Argument access by validated name. Dispatch guarantees required arguments
// are present; these guards catch registration mistakes.

pub(crate) fn required_str<'a>(args: &'a [FunctionArgument], name: &str) -> Result<&'a str> {
    args.iter()
        .find(|a| a.name == name)
        .and_then(|a| a.value.as_str())
        .ok_or_else(|| Error::Type(format!("missing string argument {}", name)))
}

pub(crate) fn optional_str<'a>(args: &'a [FunctionArgument], name: &str) -> Option<&'a str> {
    args.iter()
        .find(|a| a.name == name)
        .and_then(|a| a.value.as_str())
}

pub(crate) fn required_int(args: &[FunctionArgument], name: &str) -> Result<i64> {
    args.iter()
        .find(|a| a.name == name)
        .and_then(|a| a.value.as_int())
        .ok_or_else(|| Error::Type(format!("missing int argument {}", name)))
}

pub(crate) fn required_mutations<'a>(
    args: &'a [FunctionArgument],
    name: &str,
) -> Result<&'a [Mutation]> {
    args.iter()
        .find(|a| a.name == name)
        .and_then(|a| a.value.as_mutations())
        .ok_or_else(|| Error::Type(format!("missing mutation-list argument {}", name)))
}
