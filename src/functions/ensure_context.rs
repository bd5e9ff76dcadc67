use std::sync::Arc;

use crate::document::{escape_key, Scalar};
use crate::function::{FunctionOutput, FunctionRegistryBuilder, FunctionSignature};
use crate::path::visitor::visit_resources;
use crate::provider::KubernetesProvider;

const UNIT_ANNOTATION: &str = "config.manifold.dev/unit";
const SPACE_ANNOTATION: &str = "config.manifold.dev/space";
const REVISION_ANNOTATION: &str = "config.manifold.dev/revision";

/// `ensure-context`: stamp unit/space/revision annotations on every
/// resource. The revision is written as-is; bumping it is gated behind the
/// `bump-revision` feature.
pub fn register(builder: &mut FunctionRegistryBuilder, provider: &Arc<KubernetesProvider>) {
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "ensure-context".to_string(),
            description: "Stamp unit, space, and revision annotations".to_string(),
            parameters: vec![],
            output: None,
            mutating: true,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |ctx, container, _args, _live| {
            #[cfg(feature = "bump-revision")]
            let revision = ctx.revision + 1;
            #[cfg(not(feature = "bump-revision"))]
            let revision = ctx.revision;

            let stamps = [
                (UNIT_ANNOTATION, ctx.unit_slug.clone()),
                (SPACE_ANNOTATION, ctx.space_slug.clone()),
                (REVISION_ANNOTATION, revision.to_string()),
            ];
            visit_resources(container, provider.as_ref(), |_, _, doc| {
                for (annotation, value) in &stamps {
                    let path = format!("metadata.annotations.{}", escape_key(annotation));
                    doc.set_scalar(&path, &Scalar::String(value.clone()))?;
                }
                Ok(())
            })?;
            Ok(FunctionOutput::None)
        }),
    );
}
