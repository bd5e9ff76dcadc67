use std::collections::HashMap;

use tracing::debug;

use crate::document::{DocContainer, Scalar};
use crate::error::{Error, Result};
use crate::placeholder;
use crate::provider::ResourceProvider;

use super::Mutation;

/// Apply each patch whose corresponding predicate is patchable, in list
/// order, writing the recorded `new` value at the recorded path. Paths or
/// resources that no longer exist are dropped silently.
pub fn patch_mutations(
    container: &mut DocContainer,
    provider: &dyn ResourceProvider,
    predicates: &[Mutation],
    patches: &[Mutation],
) -> Result<()> {
    if predicates.len() != patches.len() {
        return Err(Error::Type(format!(
            "predicate list has {} entries, patch list has {}",
            predicates.len(),
            patches.len()
        )));
    }
    let index = resource_index(provider, container)?;
    for (predicate, patch) in predicates.iter().zip(patches.iter()) {
        if !predicate.patchable {
            continue;
        }
        let Some(path) = &patch.path else {
            continue;
        };
        let key = (patch.resource_type.clone(), patch.resource_name.clone());
        let Some(doc_idx) = index.get(&key) else {
            debug!(resource = %patch.resource_name, "patch target resource missing; dropped");
            continue;
        };
        let doc = container.get_mut(*doc_idx).expect("index built above");
        match &patch.new {
            // Writes land where the path or at least its parent still
            // exists; anything deeper is unknown and dropped.
            Some(scalar) => {
                if doc.exists(path) || parent_exists(doc, path) {
                    doc.set_scalar(path, scalar)?;
                } else {
                    debug!(%path, "patch target path missing; dropped");
                }
            }
            None => {
                if doc.exists(path) {
                    doc.delete(path)?;
                } else {
                    debug!(%path, "delete target path missing; dropped");
                }
            }
        }
    }
    Ok(())
}

/// Reset every patchable predicate path to its canonical placeholder value:
/// `"replaceme"` for strings, `999999999` for integers.
pub fn reset_mutations(
    container: &mut DocContainer,
    provider: &dyn ResourceProvider,
    predicates: &[Mutation],
) -> Result<()> {
    let index = resource_index(provider, container)?;
    for predicate in predicates {
        if !predicate.patchable {
            continue;
        }
        let Some(path) = &predicate.path else {
            continue;
        };
        let key = (
            predicate.resource_type.clone(),
            predicate.resource_name.clone(),
        );
        let Some(doc_idx) = index.get(&key) else {
            continue;
        };
        let doc = container.get_mut(*doc_idx).expect("index built above");
        let Some(current) = doc.scalar(path) else {
            continue;
        };
        let placeholder = match current {
            Scalar::Int(_) => Scalar::Int(placeholder::INT),
            _ => Scalar::String(placeholder::STRING.to_string()),
        };
        doc.set_scalar(path, &placeholder)?;
    }
    Ok(())
}

fn parent_exists(doc: &crate::document::Document, path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((parent, _)) => doc.exists(parent),
        None => true,
    }
}

fn resource_index(
    provider: &dyn ResourceProvider,
    container: &DocContainer,
) -> Result<HashMap<(String, String), usize>> {
    let mut out = HashMap::new();
    for (idx, doc) in container.iter().enumerate() {
        let info = provider.resource_info(doc)?;
        out.entry((info.resource_type, info.resource_name)).or_insert(idx);
    }
    Ok(out)
}
