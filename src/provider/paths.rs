//! Standard Kubernetes path registrations, installed during the init phase.

use crate::error::Result;
use crate::function::DataType;
use crate::path::{EmbeddedAccessor, FunctionInvocation, PathRegistryBuilder, PathSpec};

use super::{KubernetesProvider, SchemaLookup};

/// Attribute names for the standard catalog.
pub mod attr {
    pub const CONTAINER_IMAGE: &str = "container-image";
    pub const CONTAINER_IMAGE_TAG: &str = "container-image-tag";
    pub const HOSTNAME: &str = "hostname";
    pub const NAMESPACE_NAME_REFERENCE: &str = "namespace-name-reference";
    pub const DEFAULT_NAME: &str = "default-name";
    pub const RESOURCE_NAME: &str = "resource-name";
    pub const DETAIL: &str = "detail";
    pub use crate::path::ATTRIBUTE_NAME_GENERAL as GENERAL;
}

/// Default generation template for `default-name` registrations.
pub const DEFAULT_NAME_TEMPLATE: &str = "{{.NormalizedUnitName}}-{{.NormalizedSpaceName}}";

/// Image references: `repository[:tag][@digest]`.
pub const IMAGE_ACCESSOR_PATTERN: &str =
    r"^(?P<repository>[^:@]+)(?::(?P<tag>[^@]+))?(?:@(?P<digest>.+))?$";

const POD_TEMPLATE_TYPES: [&str; 4] = [
    "apps/v1/Deployment",
    "apps/v1/StatefulSet",
    "apps/v1/DaemonSet",
    "batch/v1/Job",
];

const CONTAINER_IMAGE_PATH: &str = "spec.template.spec.containers.*?name:container-name.image";
const CRONJOB_IMAGE_PATH: &str =
    "spec.jobTemplate.spec.template.spec.containers.*?name:container-name.image";

/// Install the standard attribute catalog. The schema lookup, when present,
/// enriches `detail` registrations with field descriptions.
pub fn register_standard_paths(
    builder: &mut PathRegistryBuilder,
    provider: &KubernetesProvider,
    schema: &dyn SchemaLookup,
) -> Result<()> {
    for resource_type in POD_TEMPLATE_TYPES {
        builder.register_paths_by_attribute_name(
            attr::CONTAINER_IMAGE,
            resource_type,
            vec![PathSpec::new(CONTAINER_IMAGE_PATH, DataType::String)],
            None,
            None,
            true,
        )?;
        builder.register_paths_by_attribute_name(
            attr::CONTAINER_IMAGE_TAG,
            resource_type,
            vec![image_tag_spec(CONTAINER_IMAGE_PATH)?],
            None,
            None,
            false,
        )?;
    }
    builder.register_paths_by_attribute_name(
        attr::CONTAINER_IMAGE,
        "batch/v1/CronJob",
        vec![PathSpec::new(CRONJOB_IMAGE_PATH, DataType::String)],
        None,
        None,
        true,
    )?;
    builder.register_paths_by_attribute_name(
        attr::CONTAINER_IMAGE_TAG,
        "batch/v1/CronJob",
        vec![image_tag_spec(CRONJOB_IMAGE_PATH)?],
        None,
        None,
        false,
    )?;

    builder.register_paths_by_attribute_name(
        attr::HOSTNAME,
        "networking.k8s.io/v1/Ingress",
        vec![
            PathSpec::new("spec.rules.*.host", DataType::String),
            PathSpec::new("spec.tls.*.hosts.*", DataType::String),
        ],
        None,
        None,
        true,
    )?;

    // metadata.namespace applies everywhere except cluster-scoped types, and
    // is needed from whatever unit owns the Namespace.
    let mut namespace_spec = PathSpec::new("metadata.namespace", DataType::String);
    namespace_spec.type_exceptions = provider
        .cluster_scoped_types()
        .map(String::from)
        .collect();
    builder.register_paths_by_attribute_name(
        attr::NAMESPACE_NAME_REFERENCE,
        crate::path::RESOURCE_TYPE_ANY,
        vec![namespace_spec],
        None,
        Some(FunctionInvocation::new(
            "set-attribute",
            &[attr::NAMESPACE_NAME_REFERENCE, "%s"],
        )),
        true,
    )?;

    let mut default_name_spec = PathSpec::new("metadata.name", DataType::String);
    default_name_spec.generation_template = Some(DEFAULT_NAME_TEMPLATE.to_string());
    builder.register_paths_by_attribute_name(
        attr::DEFAULT_NAME,
        crate::path::RESOURCE_TYPE_ANY,
        vec![default_name_spec],
        None,
        None,
        false,
    )?;

    builder.register_paths_by_attribute_name(
        attr::RESOURCE_NAME,
        crate::path::RESOURCE_TYPE_ANY,
        vec![PathSpec::new("metadata.name", DataType::String)],
        Some(FunctionInvocation::new(
            "get-attributes",
            &[attr::RESOURCE_NAME],
        )),
        None,
        true,
    )?;

    for resource_type in ["apps/v1/Deployment", "apps/v1/StatefulSet"] {
        let mut replicas_spec = PathSpec::new("spec.replicas", DataType::Int);
        replicas_spec.description = schema
            .lookup_path(resource_type, "spec.replicas")
            .map(|info| info.description);
        builder.register_paths_by_attribute_name(
            attr::DETAIL,
            resource_type,
            vec![replicas_spec],
            None,
            None,
            false,
        )?;
    }

    Ok(())
}

fn image_tag_spec(base_path: &str) -> Result<PathSpec> {
    let mut spec = PathSpec::new(&format!("{}#tag", base_path), DataType::String);
    spec.embedded_accessor = Some(EmbeddedAccessor::new("tag", IMAGE_ACCESSOR_PATTERN)?);
    Ok(spec)
}
