//! Mutation records: per-path changes between two container versions,
//! attributed to the function invocation that produced them.

mod compute;
mod patch;

pub use compute::compute_mutations;
pub use patch::{patch_mutations, reset_mutations};

use serde::{Deserialize, Serialize};

use crate::document::Scalar;

/// One recorded change.
///
/// Scalar changes carry a path and old/new values. A resource deletion is
/// `(identity, no path, no values)`; a resource insertion carries the new
/// body with `old` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub resource_type: String,
    pub resource_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Scalar>,
    pub function_index: i64,
    #[serde(default = "default_patchable")]
    pub patchable: bool,
}

fn default_patchable() -> bool {
    true
}

impl Mutation {
    pub fn is_resource_deletion(&self) -> bool {
        self.path.is_none() && self.old.is_none() && self.new.is_none()
    }

    pub fn is_resource_insertion(&self) -> bool {
        self.path.is_none() && self.old.is_none() && self.new.is_some()
    }
}
