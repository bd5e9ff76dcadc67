//! Resource providers: how the engine extracts identity from documents.

mod kubernetes;
pub mod paths;

pub use kubernetes::{KubernetesProvider, CRD_RESOURCE_TYPE};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;

/// Canonical identity of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// `group/version/Kind`, core group elided to `version/Kind`.
    pub resource_type: String,
    /// `namespace/name`, or `/name` for cluster-scoped resources.
    pub resource_name: String,
    /// Provider-defined tag.
    pub category: String,
}

/// Capabilities a resource provider supplies to the engine.
pub trait ResourceProvider: Send + Sync {
    fn resource_type(&self, doc: &Document) -> Result<String>;
    fn resource_name(&self, doc: &Document) -> Result<String>;
    fn resource_category(&self, doc: &Document) -> String;
    fn default_resource_category(&self) -> &'static str;

    /// `ns/name` → `name`.
    fn remove_scope_from_resource_name(&self, name: &str) -> String;
    /// Document path holding the scopeless name.
    fn scopeless_resource_name_path(&self) -> &'static str;
    fn set_resource_name(&self, doc: &mut Document, name: &str) -> Result<()>;

    /// Document path for a named context field, if the provider has one.
    fn context_path(&self, field: &str) -> Option<&'static str>;

    fn normalize_name(&self, raw: &str) -> String;
    fn name_separator(&self) -> &'static str;

    fn resource_info(&self, doc: &Document) -> Result<ResourceInfo> {
        Ok(ResourceInfo {
            resource_type: self.resource_type(doc)?,
            resource_name: self.resource_name(doc)?,
            category: self.resource_category(doc),
        })
    }

    /// `resource-name → resource-type` and `resource-name → category` maps
    /// for a document set. Unidentifiable documents are skipped.
    fn resource_and_category_type_maps(
        &self,
        docs: &[Document],
    ) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let mut types = BTreeMap::new();
        let mut categories = BTreeMap::new();
        for doc in docs {
            let Ok(info) = self.resource_info(doc) else {
                tracing::debug!("skipping unidentifiable document in type maps");
                continue;
            };
            types.insert(info.resource_name.clone(), info.resource_type);
            categories.insert(info.resource_name, info.category);
        }
        (types, categories)
    }
}

/// Optional schema enrichment seam. Lookups may come from an OpenAPI model;
/// absence is non-fatal.
pub trait SchemaLookup: Send + Sync {
    fn lookup_path(&self, type_string: &str, field_path: &str) -> Option<SchemaInfo>;
}

#[derive(Debug, Clone)]
pub struct SchemaInfo {
    pub description: String,
}

/// The no-op lookup used when no schema source is wired in.
pub struct NoSchemaLookup;

impl SchemaLookup for NoSchemaLookup {
    fn lookup_path(&self, _type_string: &str, _field_path: &str) -> Option<SchemaInfo> {
        None
    }
}
