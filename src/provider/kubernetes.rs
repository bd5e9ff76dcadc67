use std::collections::BTreeSet;

use crate::document::{Document, Scalar};
use crate::error::{Error, Result};

use super::ResourceProvider;

/// The exact type string identifying a definition resource.
pub const CRD_RESOURCE_TYPE: &str = "apiextensions.k8s.io/v1/CustomResourceDefinition";

/// Kubernetes manifests as the resource domain.
///
/// Whether a type is cluster-scoped is explicit configuration: the set is
/// seeded with the well-known built-ins and extended by the caller for
/// custom types. No guessing from CRD bodies.
#[derive(Debug, Clone)]
pub struct KubernetesProvider {
    cluster_scoped_types: BTreeSet<String>,
}

impl Default for KubernetesProvider {
    fn default() -> Self {
        let cluster_scoped_types = [
            "v1/Namespace",
            "v1/Node",
            "v1/PersistentVolume",
            "rbac.authorization.k8s.io/v1/ClusterRole",
            "rbac.authorization.k8s.io/v1/ClusterRoleBinding",
            "storage.k8s.io/v1/StorageClass",
            "scheduling.k8s.io/v1/PriorityClass",
            "admissionregistration.k8s.io/v1/ValidatingWebhookConfiguration",
            "admissionregistration.k8s.io/v1/MutatingWebhookConfiguration",
            CRD_RESOURCE_TYPE,
        ]
        .into_iter()
        .map(String::from)
        .collect();
        Self {
            cluster_scoped_types,
        }
    }
}

impl KubernetesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the cluster-scoped type set (e.g. for cluster-scoped custom
    /// resources).
    pub fn with_cluster_scoped_types<I>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.cluster_scoped_types.extend(types);
        self
    }

    pub fn is_cluster_scoped(&self, resource_type: &str) -> bool {
        self.cluster_scoped_types.contains(resource_type)
    }

    pub fn cluster_scoped_types(&self) -> impl Iterator<Item = &str> {
        self.cluster_scoped_types.iter().map(|s| s.as_str())
    }

    fn kind(&self, doc: &Document) -> Result<String> {
        match doc.scalar("kind") {
            Some(Scalar::String(kind)) if !kind.is_empty() => Ok(kind),
            _ => Err(Error::Schema {
                file: "<document>".to_string(),
                detail: "missing kind".to_string(),
            }),
        }
    }
}

impl ResourceProvider for KubernetesProvider {
    /// `apiVersion` + `kind` → `group/version/Kind`; the core group is
    /// already elided in `apiVersion` (`v1` vs `apps/v1`).
    fn resource_type(&self, doc: &Document) -> Result<String> {
        let api_version = match doc.scalar("apiVersion") {
            Some(Scalar::String(v)) if !v.is_empty() => v,
            _ => {
                return Err(Error::Schema {
                    file: "<document>".to_string(),
                    detail: "missing apiVersion".to_string(),
                })
            }
        };
        Ok(format!("{}/{}", api_version, self.kind(doc)?))
    }

    fn resource_name(&self, doc: &Document) -> Result<String> {
        let name = match doc.scalar("metadata.name") {
            Some(Scalar::String(name)) if !name.is_empty() => name,
            _ => {
                return Err(Error::Schema {
                    file: "<document>".to_string(),
                    detail: "missing metadata.name".to_string(),
                })
            }
        };
        let resource_type = self.resource_type(doc)?;
        let namespace = if self.is_cluster_scoped(&resource_type) {
            String::new()
        } else {
            match doc.scalar("metadata.namespace") {
                Some(Scalar::String(ns)) => ns,
                _ => String::new(),
            }
        };
        Ok(format!("{}/{}", namespace, name))
    }

    fn resource_category(&self, doc: &Document) -> String {
        let kind = match self.kind(doc) {
            Ok(kind) => kind,
            Err(_) => return self.default_resource_category().to_string(),
        };
        let category = match kind.as_str() {
            "CustomResourceDefinition" => "definition",
            "Namespace" => "namespace",
            "ServiceAccount" | "Role" | "RoleBinding" | "ClusterRole" | "ClusterRoleBinding" => {
                "rbac"
            }
            "ConfigMap" | "Secret" => "config",
            "Service" | "Ingress" | "NetworkPolicy" => "network",
            "Deployment" | "StatefulSet" | "DaemonSet" | "Job" | "CronJob" | "Pod" => "workload",
            "PodDisruptionBudget" => "policy",
            _ => self.default_resource_category(),
        };
        category.to_string()
    }

    fn default_resource_category(&self) -> &'static str {
        "resource"
    }

    fn remove_scope_from_resource_name(&self, name: &str) -> String {
        match name.split_once('/') {
            Some((_, scopeless)) => scopeless.to_string(),
            None => name.to_string(),
        }
    }

    fn scopeless_resource_name_path(&self) -> &'static str {
        "metadata.name"
    }

    fn set_resource_name(&self, doc: &mut Document, name: &str) -> Result<()> {
        doc.set_scalar(
            self.scopeless_resource_name_path(),
            &Scalar::String(name.to_string()),
        )
    }

    fn context_path(&self, field: &str) -> Option<&'static str> {
        match field {
            "name" => Some("metadata.name"),
            "namespace" => Some("metadata.namespace"),
            "labels" => Some("metadata.labels"),
            "annotations" => Some("metadata.annotations"),
            _ => None,
        }
    }

    /// DNS-1123 folding: lowercase, invalid runs become `-`, trimmed to 63.
    fn normalize_name(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut last_dash = false;
        for c in raw.to_lowercase().chars() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                out.push(c);
                last_dash = false;
            } else if !last_dash && !out.is_empty() {
                out.push('-');
                last_dash = true;
            }
        }
        while out.ends_with('-') {
            out.pop();
        }
        out.truncate(63);
        while out.ends_with('-') {
            out.pop();
        }
        out
    }

    fn name_separator(&self) -> &'static str {
        "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        Document::parse(yaml).unwrap()
    }

    #[test]
    fn core_group_is_elided() {
        let provider = KubernetesProvider::new();
        let cm = doc("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n");
        assert_eq!(provider.resource_type(&cm).unwrap(), "v1/ConfigMap");
        let deploy = doc("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: app\n");
        assert_eq!(
            provider.resource_type(&deploy).unwrap(),
            "apps/v1/Deployment"
        );
    }

    #[test]
    fn cluster_scoped_names_have_empty_scope() {
        let provider = KubernetesProvider::new();
        let ns = doc("apiVersion: v1\nkind: Namespace\nmetadata:\n  name: prod\n");
        assert_eq!(provider.resource_name(&ns).unwrap(), "/prod");
        let cm = doc(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: prod\n",
        );
        assert_eq!(provider.resource_name(&cm).unwrap(), "prod/cfg");
    }

    #[test]
    fn normalize_folds_to_dns_label() {
        let provider = KubernetesProvider::new();
        assert_eq!(provider.normalize_name("My App_v2"), "my-app-v2");
        assert_eq!(provider.normalize_name("--Billing--"), "billing");
    }

    #[test]
    fn context_paths_cover_metadata_fields() {
        let provider = KubernetesProvider::new();
        assert_eq!(provider.context_path("namespace"), Some("metadata.namespace"));
        assert_eq!(provider.context_path("annotations"), Some("metadata.annotations"));
        assert_eq!(provider.context_path("uid"), None);
    }

    #[test]
    fn type_maps_index_by_resource_name() {
        let provider = KubernetesProvider::new();
        let docs = vec![
            doc("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: prod\n"),
            doc("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: app\n  namespace: prod\n"),
        ];
        let (types, categories) = provider.resource_and_category_type_maps(&docs);
        assert_eq!(types["prod/cfg"], "v1/ConfigMap");
        assert_eq!(categories["prod/app"], "workload");
    }
}
