use std::sync::Arc;

use crate::function::{
    DataType, FunctionOutput, FunctionRegistryBuilder, FunctionSignature, OutputSpec,
};
use crate::path::visitor::visit_resources;
use crate::provider::KubernetesProvider;

/// `get-resources`: list the identity of every document in the container.
pub fn register(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "get-resources".to_string(),
            description: "List resource identities in container order".to_string(),
            parameters: vec![],
            output: Some(OutputSpec {
                data_type: DataType::ResourceList,
                description: "resource identities".to_string(),
            }),
            mutating: false,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, _args, _live| {
            let mut out = Vec::new();
            visit_resources(container, provider.as_ref(), |_, info, _| {
                out.push(info.clone());
                Ok(())
            })?;
            Ok(FunctionOutput::ResourceList(out))
        }),
    );
}
