use std::sync::Arc;

use crate::filter::{evaluate, WhereFilter};
use crate::function::{
    DataType, FunctionOutput, FunctionRegistryBuilder, FunctionSignature, OutputSpec,
    ParameterSpec, ValidationResult,
};
use crate::provider::KubernetesProvider;

/// `where-filter`: evaluate a WHERE expression against the container.
/// Passes when at least one resource matches every relational; the details
/// list the matching resources.
pub fn register(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "where-filter".to_string(),
            description: "Evaluate a WHERE expression against the container".to_string(),
            parameters: vec![ParameterSpec::required(
                "expression",
                DataType::String,
                "conjunction of relationals",
            )],
            output: Some(OutputSpec {
                data_type: DataType::String,
                description: "validation result".to_string(),
            }),
            mutating: false,
            validating: true,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, args, _live| {
            let expression = super::required_str(args, "expression")?;
            let filter = WhereFilter::parse(expression)?;
            let outcome = evaluate(&filter, container, provider.as_ref())?;
            let result = if outcome.passed {
                ValidationResult {
                    passed: true,
                    details: outcome.matched,
                }
            } else {
                ValidationResult::failed(vec![format!(
                    "no resource matches '{}'",
                    expression
                )])
            };
            Ok(FunctionOutput::Validation(result))
        }),
    );
}
