//! Process-wide path registry.
//!
//! Keyed `attribute-name → resource-type → unresolved-path`, it records how
//! to visit, get, set, and describe attributes across heterogeneous resource
//! types, plus the needed/provided side-indices used to reason about
//! cross-unit data flow. Registration happens in a single init phase through
//! [`PathRegistryBuilder`]; `build` freezes the registry, after which there
//! is no mutating API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::accessor::EmbeddedAccessor;
use crate::error::{Error, Result};
use crate::function::DataType;

/// Wildcard resource type: applies to every type unless excluded.
pub const RESOURCE_TYPE_ANY: &str = "*";

/// Attribute that collects everything marked "general".
pub const ATTRIBUTE_NAME_GENERAL: &str = "general";

/// How to visit one `(resource type, unresolved path)` registration.
#[derive(Debug, Clone, Serialize)]
pub struct PathVisitorInfo {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    pub attribute_name: String,
    pub data_type: DataType,
    /// Text template constructing a default value (see default-name
    /// generation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_accessor: Option<EmbeddedAccessor>,
    /// Resource types this registration does not apply to when registered
    /// under [`RESOURCE_TYPE_ANY`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_exceptions: Vec<String>,
}

/// A function invocation template, referenced by name only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInvocation {
    pub function_name: String,
    pub arguments: Vec<String>,
}

impl FunctionInvocation {
    pub fn new(function_name: &str, arguments: &[&str]) -> Self {
        Self {
            function_name: function_name.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// One path to register, before it is tied to an attribute and type.
#[derive(Debug, Clone)]
pub struct PathSpec {
    pub path: String,
    pub data_type: DataType,
    pub generation_template: Option<String>,
    pub description: Option<String>,
    pub embedded_accessor: Option<EmbeddedAccessor>,
    pub type_exceptions: Vec<String>,
}

impl PathSpec {
    pub fn new(path: &str, data_type: DataType) -> Self {
        Self {
            path: path.to_string(),
            data_type,
            generation_template: None,
            description: None,
            embedded_accessor: None,
            type_exceptions: Vec::new(),
        }
    }
}

type AttributeMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, PathVisitorInfo>>>;
type InvocationMap = BTreeMap<String, BTreeMap<String, FunctionInvocation>>;

/// Mutable assembly phase of the registry.
#[derive(Debug, Default)]
pub struct PathRegistryBuilder {
    provider_name: String,
    attributes: AttributeMap,
    needed: InvocationMap,
    provided: InvocationMap,
}

impl PathRegistryBuilder {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            ..Default::default()
        }
    }

    /// Register paths under `(attribute, resource_type)`. A getter invocation
    /// marks the paths as provided, a setter as needed. `also_general`
    /// duplicates the registration under the `general` attribute.
    ///
    /// Re-registering an existing `(attribute, type, path)` triple overwrites
    /// the previous entry.
    pub fn register_paths_by_attribute_name(
        &mut self,
        attribute: &str,
        resource_type: &str,
        specs: Vec<PathSpec>,
        getter: Option<FunctionInvocation>,
        setter: Option<FunctionInvocation>,
        also_general: bool,
    ) -> Result<()> {
        for spec in specs {
            validate_accessor(&spec)?;
            let info = PathVisitorInfo {
                path: spec.path.clone(),
                resolved_path: None,
                attribute_name: attribute.to_string(),
                data_type: spec.data_type,
                generation_template: spec.generation_template,
                description: spec.description,
                embedded_accessor: spec.embedded_accessor,
                type_exceptions: spec.type_exceptions,
            };
            self.insert(attribute, resource_type, info.clone());
            if also_general {
                let mut general = info.clone();
                general.attribute_name = ATTRIBUTE_NAME_GENERAL.to_string();
                self.insert(ATTRIBUTE_NAME_GENERAL, resource_type, general);
            }
            if let Some(getter) = &getter {
                self.provided
                    .entry(resource_type.to_string())
                    .or_default()
                    .insert(spec.path.clone(), getter.clone());
            }
            if let Some(setter) = &setter {
                self.needed
                    .entry(resource_type.to_string())
                    .or_default()
                    .insert(spec.path.clone(), setter.clone());
            }
        }
        Ok(())
    }

    /// Record paths a resource requires from elsewhere, with the setter
    /// invocation re-deriving each.
    pub fn register_needed_paths(
        &mut self,
        resource_type: &str,
        entries: Vec<(String, FunctionInvocation)>,
    ) {
        let map = self.needed.entry(resource_type.to_string()).or_default();
        for (path, invocation) in entries {
            map.insert(path, invocation);
        }
    }

    /// Record paths a resource publishes, with the getter invocation reading
    /// each.
    pub fn register_provided_paths(
        &mut self,
        resource_type: &str,
        entries: Vec<(String, FunctionInvocation)>,
    ) {
        let map = self.provided.entry(resource_type.to_string()).or_default();
        for (path, invocation) in entries {
            map.insert(path, invocation);
        }
    }

    /// Freeze the registry. After this point it is read-only.
    pub fn build(self) -> PathRegistry {
        PathRegistry {
            provider_name: self.provider_name,
            attributes: self.attributes,
            needed: self.needed,
            provided: self.provided,
        }
    }

    fn insert(&mut self, attribute: &str, resource_type: &str, info: PathVisitorInfo) {
        let previous = self
            .attributes
            .entry(attribute.to_string())
            .or_default()
            .entry(resource_type.to_string())
            .or_default()
            .insert(info.path.clone(), info);
        if previous.is_some() {
            debug!(
                attribute,
                resource_type, "re-registration overwrote an existing path entry"
            );
        }
    }
}

fn validate_accessor(spec: &PathSpec) -> Result<()> {
    let suffix = spec.path.rfind('#').map(|pos| &spec.path[pos + 1..]);
    match (&spec.embedded_accessor, suffix) {
        (Some(accessor), Some(name)) => {
            if !accessor.has_capture(name) {
                return Err(Error::Internal(format!(
                    "path {} names capture {} but the accessor pattern has no such group",
                    spec.path, name
                )));
            }
            Ok(())
        }
        (None, Some(name)) => Err(Error::Internal(format!(
            "path {} carries accessor suffix #{} but no embedded accessor",
            spec.path, name
        ))),
        // Constructor already validated the default capture.
        _ => Ok(()),
    }
}

/// Read-only registry, shared process-wide after the init phase.
#[derive(Debug)]
pub struct PathRegistry {
    provider_name: String,
    attributes: AttributeMap,
    needed: InvocationMap,
    provided: InvocationMap,
}

impl PathRegistry {
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(|s| s.as_str()).collect()
    }

    /// Registrations applying to `resource_type` for an attribute: the
    /// concrete entries plus the `Any` entries whose exceptions do not name
    /// the type.
    pub fn infos_for(&self, attribute: &str, resource_type: &str) -> Vec<&PathVisitorInfo> {
        let Some(types) = self.attributes.get(attribute) else {
            return Vec::new();
        };
        let mut out: Vec<&PathVisitorInfo> = Vec::new();
        if let Some(concrete) = types.get(resource_type) {
            out.extend(concrete.values());
        }
        if resource_type != RESOURCE_TYPE_ANY {
            if let Some(any) = types.get(RESOURCE_TYPE_ANY) {
                for info in any.values() {
                    let excluded = info.type_exceptions.iter().any(|t| t == resource_type);
                    let shadowed = out.iter().any(|i| i.path == info.path);
                    if !excluded && !shadowed {
                        out.push(info);
                    }
                }
            }
        }
        out
    }

    /// `resource-type → path → info` view for one attribute, with the `Any`
    /// wildcard merged into each concrete type (exceptions applied) and kept
    /// under its own key.
    pub fn registry_for_attribute(
        &self,
        attribute: &str,
    ) -> BTreeMap<String, BTreeMap<String, PathVisitorInfo>> {
        let Some(types) = self.attributes.get(attribute) else {
            return BTreeMap::new();
        };
        let mut out = types.clone();
        if let Some(any) = types.get(RESOURCE_TYPE_ANY) {
            let concrete: Vec<String> = out
                .keys()
                .filter(|t| t.as_str() != RESOURCE_TYPE_ANY)
                .cloned()
                .collect();
            for resource_type in concrete {
                let merged = out.get_mut(&resource_type).expect("key listed above");
                for (path, info) in any {
                    let excluded = info.type_exceptions.iter().any(|t| *t == resource_type);
                    if !excluded && !merged.contains_key(path) {
                        merged.insert(path.clone(), info.clone());
                    }
                }
            }
        }
        out
    }

    /// Serializable full listing (the `GET /paths` payload).
    pub fn listing(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn needed_paths(&self, resource_type: &str) -> Vec<(&str, &FunctionInvocation)> {
        merged_invocations(&self.needed, resource_type)
    }

    pub fn provided_paths(&self, resource_type: &str) -> Vec<(&str, &FunctionInvocation)> {
        merged_invocations(&self.provided, resource_type)
    }
}

fn merged_invocations<'a>(
    map: &'a InvocationMap,
    resource_type: &str,
) -> Vec<(&'a str, &'a FunctionInvocation)> {
    let mut out: Vec<(&str, &FunctionInvocation)> = Vec::new();
    if let Some(concrete) = map.get(resource_type) {
        out.extend(concrete.iter().map(|(p, i)| (p.as_str(), i)));
    }
    if resource_type != RESOURCE_TYPE_ANY {
        if let Some(any) = map.get(RESOURCE_TYPE_ANY) {
            for (path, invocation) in any {
                if !out.iter().any(|(p, _)| *p == path.as_str()) {
                    out.push((path.as_str(), invocation));
                }
            }
        }
    }
    out
}
