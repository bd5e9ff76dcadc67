use std::sync::Arc;

use crate::document::Document;
use crate::error::Error;
use crate::function::{
    DataType, FunctionOutput, FunctionRegistryBuilder, FunctionSignature, ParameterSpec,
};
use crate::provider::{KubernetesProvider, ResourceProvider};

pub fn register(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    register_upsert(builder, provider);
    register_delete(builder, provider);
}

/// `upsert-resource`: replace the resource with the same type and scopeless
/// name in place, or append when absent.
fn register_upsert(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "upsert-resource".to_string(),
            description: "Replace a resource in place or append it".to_string(),
            parameters: vec![ParameterSpec::required(
                "resource",
                DataType::Yaml,
                "resource body",
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
            let body = super::required_str(args, "resource")?;
            let doc = Document::parse(body)?;
            let info = provider.resource_info(&doc)?;
            let scopeless = provider.remove_scope_from_resource_name(&info.resource_name);

            let existing = find_by_identity(container.docs(), provider.as_ref(), &info.resource_type, &scopeless);
            match existing {
                Some(idx) => {
                    *container.get_mut(idx).expect("index located above") = doc;
                }
                None => container.push(doc),
            }
            Ok(FunctionOutput::None)
        }),
    );
}

/// `delete-resource`: remove the first resource matching the type and
/// scopeless name; absence is a typed not-found error.
fn register_delete(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "delete-resource".to_string(),
            description: "Remove one resource by type and name".to_string(),
            parameters: vec![
                ParameterSpec::required("resource-type", DataType::String, "resource type"),
                ParameterSpec::required(
                    "resource-name",
                    DataType::String,
                    "scopeless resource name",
                ),
            ],
            output: None,
            mutating: true,
            validating: false,
            hermetic: true,
            idempotent: false,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, args, _live| {
            let resource_type = super::required_str(args, "resource-type")?;
            let resource_name = super::required_str(args, "resource-name")?;
            let found =
                find_by_identity(container.docs(), provider.as_ref(), resource_type, resource_name);
            match found {
                Some(idx) => {
                    container.remove(idx);
                    Ok(FunctionOutput::None)
                }
                None => Err(Error::NotFound(format!(
                    "{} {}",
                    resource_type, resource_name
                ))),
            }
        }),
    );
}

fn find_by_identity(
    docs: &[Document],
    provider: &KubernetesProvider,
    resource_type: &str,
    scopeless_name: &str,
) -> Option<usize> {
    docs.iter().position(|doc| {
        provider.resource_info(doc).is_ok_and(|info| {
            info.resource_type == resource_type
                && provider.remove_scope_from_resource_name(&info.resource_name) == scopeless_name
        })
    })
}
