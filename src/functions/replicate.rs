use std::sync::Arc;

use regex::Regex;

use crate::error::{Error, Result};
use crate::function::{
    DataType, FunctionOutput, FunctionRegistryBuilder, FunctionSignature, ParameterSpec,
    ValueConstraints,
};
use crate::provider::{KubernetesProvider, ResourceProvider};

/// `replicate`: insert `replicas - 1` copies of one resource immediately
/// after the original, each copy's name suffixed with its ordinal.
///
/// Copies from a previous run (same type, name plus ordinal suffix) are
/// dropped first, so re-invoking with the same count is a no-op.
pub fn register(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "replicate".to_string(),
            description: "Duplicate a resource with ordinal name suffixes".to_string(),
            parameters: vec![
                ParameterSpec::required("category", DataType::String, "resource category"),
                ParameterSpec::required("resource-type", DataType::String, "resource type"),
                ParameterSpec::required(
                    "resource-name",
                    DataType::String,
                    "scopeless resource name",
                ),
                ParameterSpec::required("replicas", DataType::Int, "total replica count")
                    .with_constraints(ValueConstraints {
                        min: Some(1),
                        ..Default::default()
                    }),
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
            let category = super::required_str(args, "category")?;
            let resource_type = super::required_str(args, "resource-type")?;
            let resource_name = super::required_str(args, "resource-name")?;
            let replicas = super::required_int(args, "replicas")? as usize;

            let copy_name_re = copy_name_pattern(resource_name)?;

            // Drop copies left by a previous invocation.
            let mut idx = 0;
            while idx < container.len() {
                let doc = container.get(idx).expect("index bounded by len");
                let is_copy = provider.resource_info(doc).is_ok_and(|info| {
                    info.resource_type == resource_type
                        && copy_name_re
                            .is_match(&provider.remove_scope_from_resource_name(&info.resource_name))
                });
                if is_copy {
                    container.remove(idx);
                } else {
                    idx += 1;
                }
            }

            let mut base_idx = None;
            for (idx, doc) in container.iter().enumerate() {
                let Ok(info) = provider.resource_info(doc) else {
                    continue;
                };
                let scopeless = provider.remove_scope_from_resource_name(&info.resource_name);
                if info.category == category
                    && info.resource_type == resource_type
                    && scopeless == resource_name
                {
                    if base_idx.is_some() {
                        return Err(Error::Type(format!(
                            "replicate target {} {} matches more than one resource",
                            resource_type, resource_name
                        )));
                    }
                    base_idx = Some(idx);
                }
            }
            let base_idx = base_idx.ok_or_else(|| {
                Error::NotFound(format!(
                    "replicate target {} {} ({})",
                    resource_type, resource_name, category
                ))
            })?;

            let base = container.get(base_idx).expect("located above").clone();
            for ordinal in 1..replicas {
                let mut copy = base.clone();
                provider.set_resource_name(
                    &mut copy,
                    &format!("{}{}", resource_name, ordinal),
                )?;
                container.insert(base_idx + ordinal, copy);
            }
            Ok(FunctionOutput::None)
        }),
    );
}

fn copy_name_pattern(base: &str) -> Result<Regex> {
    Regex::new(&format!("^{}[0-9]+$", regex::escape(base)))
        .map_err(|e| Error::Internal(format!("copy name pattern: {}", e)))
}
