use serde::{Deserialize, Serialize};

/// Opaque caller context handed to every invocation.
///
/// The engine never mutates it; implementations read identifiers out of it
/// (default-name generation, context stamping) and may compare the previous
/// content hash against the current container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionContext {
    pub unit_slug: String,
    pub space_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_content_hash: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub approvers: Vec<String>,
    pub revision: u64,
}

impl FunctionContext {
    pub fn new(unit_slug: &str, space_slug: &str) -> Self {
        Self {
            unit_slug: unit_slug.to_string(),
            space_slug: space_slug.to_string(),
            ..Default::default()
        }
    }
}
