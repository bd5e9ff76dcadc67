//! Default-name generation.
//!
//! Every `default-name` registration whose current value still carries the
//! string placeholder gets the registered generation template evaluated
//! against the caller context, and the rendered name replaces the field
//! entirely. Reset round-trips through placeholders rather than text
//! patches.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::MultiError;
use crate::function::{
    FunctionContext, FunctionOutput, FunctionRegistryBuilder, FunctionSignature,
};
use crate::path::visitor::visit_strings;
use crate::path::{PathExpr, PathRegistry, PathVisitorInfo};
use crate::placeholder;
use crate::provider::paths::attr;
use crate::provider::{KubernetesProvider, ResourceInfo, ResourceProvider};
use crate::template;

pub fn register(
    builder: &mut FunctionRegistryBuilder,
    paths: &Arc<PathRegistry>,
    provider: &Arc<KubernetesProvider>,
) {
    let paths = Arc::clone(paths);
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "set-default-names".to_string(),
            description: "Fill placeholder names from generation templates".to_string(),
            parameters: vec![],
            output: None,
            mutating: true,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: Some(attr::DEFAULT_NAME.to_string()),
            var_args: false,
        },
        Box::new(move |ctx, container, _args, _live| {
            let mut multi = MultiError::new();
            for doc in container.iter_mut() {
                let info = match provider.resource_info(doc) {
                    Ok(info) => info,
                    Err(err) => {
                        multi.push(err);
                        continue;
                    }
                };
                let infos: Vec<PathVisitorInfo> = paths
                    .infos_for(attr::DEFAULT_NAME, &info.resource_type)
                    .into_iter()
                    .cloned()
                    .collect();
                for pinfo in infos {
                    let Some(generation_template) = pinfo.generation_template.clone() else {
                        continue;
                    };
                    let fields = template_fields(ctx, provider.as_ref(), &info);
                    let expr = match PathExpr::parse(&pinfo.path) {
                        Ok(expr) => expr,
                        Err(err) => {
                            multi.push(err);
                            continue;
                        }
                    };
                    let visited = visit_strings(doc, &expr, None, |_, current| {
                        if !current.contains(placeholder::STRING) {
                            return Ok(None);
                        }
                        template::render(&generation_template, &fields).map(Some)
                    });
                    if let Err(err) = visited {
                        multi.push(err);
                    }
                }
            }
            multi.into_result(FunctionOutput::None)
        }),
    );
}

fn template_fields(
    ctx: &FunctionContext,
    provider: &KubernetesProvider,
    info: &ResourceInfo,
) -> BTreeMap<String, String> {
    let scopeless = provider.remove_scope_from_resource_name(&info.resource_name);
    [
        (
            "NormalizedUnitName".to_string(),
            provider.normalize_name(&ctx.unit_slug),
        ),
        (
            "NormalizedSpaceName".to_string(),
            provider.normalize_name(&ctx.space_slug),
        ),
        (
            "NormalizedResourceName".to_string(),
            provider.normalize_name(&scopeless),
        ),
        ("TrimmedResourceName".to_string(), scopeless.trim().to_string()),
        (
            "NormalizedResourceType".to_string(),
            provider.normalize_name(&info.resource_type),
        ),
    ]
    .into_iter()
    .collect()
}
