use std::sync::Arc;

use crate::document::DocContainer;
use crate::function::{
    DataType, FunctionOutput, FunctionRegistryBuilder, FunctionSignature, OutputSpec,
    ParameterSpec,
};
use crate::mutation::{compute_mutations, patch_mutations, reset_mutations};
use crate::provider::KubernetesProvider;

pub fn register(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    register_compute(builder, provider);
    register_patch(builder, provider);
    register_reset(builder, provider);
}

/// `compute-mutations`: diff a previous container version against the
/// current one, attributing every change to the given function index.
fn register_compute(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "compute-mutations".to_string(),
            description: "Diff a previous container version against this one".to_string(),
            parameters: vec![
                ParameterSpec::required("previous", DataType::Yaml, "previous container"),
                ParameterSpec::required(
                    "function-index",
                    DataType::Int,
                    "index of the attributed invocation",
                ),
            ],
            output: Some(OutputSpec {
                data_type: DataType::MutationList,
                description: "recorded changes".to_string(),
            }),
            mutating: false,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, args, _live| {
            let previous = DocContainer::parse_all(super::required_str(args, "previous")?)?;
            let function_index = super::required_int(args, "function-index")?;
            let mutations =
                compute_mutations(provider.as_ref(), &previous, container, function_index)?;
            Ok(FunctionOutput::Mutations(mutations))
        }),
    );
}

/// `patch-mutations`: re-apply recorded changes gated by their predicates.
fn register_patch(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "patch-mutations".to_string(),
            description: "Apply recorded changes whose predicates hold".to_string(),
            parameters: vec![
                ParameterSpec::required(
                    "predicates",
                    DataType::MutationList,
                    "gating records with patchable flags",
                ),
                ParameterSpec::required("patches", DataType::MutationList, "changes to apply"),
            ],
            output: None,
            mutating: true,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, args, _live| {
            let predicates = super::required_mutations(args, "predicates")?;
            let patches = super::required_mutations(args, "patches")?;
            patch_mutations(container, provider.as_ref(), predicates, patches)?;
            Ok(FunctionOutput::None)
        }),
    );
}

/// `reset-mutations`: revert predicate paths to the canonical placeholders.
fn register_reset(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "reset-mutations".to_string(),
            description: "Reset recorded paths to placeholder values".to_string(),
            parameters: vec![ParameterSpec::required(
                "predicates",
                DataType::MutationList,
                "records naming the paths to reset",
            )],
            output: None,
            mutating: true,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, args, _live| {
            let predicates = super::required_mutations(args, "predicates")?;
            reset_mutations(container, provider.as_ref(), predicates)?;
            Ok(FunctionOutput::None)
        }),
    );
}
