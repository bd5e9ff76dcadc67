use std::collections::HashMap;

use serde_yaml::Value;

use crate::document::{join_path, DocContainer, Document, Scalar};
use crate::error::Result;
use crate::provider::ResourceProvider;

use super::Mutation;

/// Diff two container versions into a mutation list: resource removals and
/// insertions, and per-path scalar changes, each attributed to
/// `function_index`.
///
/// Removals and changes come out in previous-container order, insertions in
/// modified-container order.
pub fn compute_mutations(
    provider: &dyn ResourceProvider,
    previous: &DocContainer,
    modified: &DocContainer,
    function_index: i64,
) -> Result<Vec<Mutation>> {
    let prev_index = identify(provider, previous)?;
    let mod_index = identify(provider, modified)?;
    let mod_by_key: HashMap<&(String, String), usize> =
        mod_index.iter().map(|(key, idx)| (key, *idx)).collect();
    let prev_keys: HashMap<&(String, String), usize> =
        prev_index.iter().map(|(key, idx)| (key, *idx)).collect();

    let mut mutations = Vec::new();

    for (key, prev_idx) in &prev_index {
        let (resource_type, resource_name) = key.clone();
        match mod_by_key.get(key) {
            None => mutations.push(Mutation {
                resource_type,
                resource_name,
                path: None,
                old: None,
                new: None,
                function_index,
                patchable: true,
            }),
            Some(mod_idx) => {
                let prev_doc = previous.get(*prev_idx).expect("index from identify");
                let mod_doc = modified.get(*mod_idx).expect("index from identify");
                diff_scalars(
                    &resource_type,
                    &resource_name,
                    prev_doc,
                    mod_doc,
                    function_index,
                    &mut mutations,
                );
            }
        }
    }

    for (key, mod_idx) in &mod_index {
        if prev_keys.contains_key(key) {
            continue;
        }
        let doc = modified.get(*mod_idx).expect("index from identify");
        mutations.push(Mutation {
            resource_type: key.0.clone(),
            resource_name: key.1.clone(),
            path: None,
            old: None,
            new: Some(Scalar::String(doc.to_yaml()?)),
            function_index,
            patchable: true,
        });
    }

    Ok(mutations)
}

/// `(type, name) → container index` in container order; the first document
/// wins a duplicate identity.
fn identify(
    provider: &dyn ResourceProvider,
    container: &DocContainer,
) -> Result<Vec<((String, String), usize)>> {
    let mut out: Vec<((String, String), usize)> = Vec::new();
    for (idx, doc) in container.iter().enumerate() {
        let info = provider.resource_info(doc)?;
        let key = (info.resource_type, info.resource_name);
        if out.iter().any(|(k, _)| *k == key) {
            tracing::debug!(
                resource = %key.1,
                "duplicate resource identity; diffing the first occurrence"
            );
            continue;
        }
        out.push((key, idx));
    }
    Ok(out)
}

fn diff_scalars(
    resource_type: &str,
    resource_name: &str,
    previous: &Document,
    modified: &Document,
    function_index: i64,
    mutations: &mut Vec<Mutation>,
) {
    let prev_leaves = scalar_leaves(previous);
    let mod_leaves = scalar_leaves(modified);
    let mod_map: HashMap<&str, &Scalar> = mod_leaves
        .iter()
        .map(|(path, scalar)| (path.as_str(), scalar))
        .collect();
    let prev_map: HashMap<&str, &Scalar> = prev_leaves
        .iter()
        .map(|(path, scalar)| (path.as_str(), scalar))
        .collect();

    for (path, old) in &prev_leaves {
        let new = mod_map.get(path.as_str());
        match new {
            Some(new) if **new == *old => {}
            _ => mutations.push(Mutation {
                resource_type: resource_type.to_string(),
                resource_name: resource_name.to_string(),
                path: Some(path.clone()),
                old: Some(old.clone()),
                new: new.map(|s| (*s).clone()),
                function_index,
                patchable: true,
            }),
        }
    }
    for (path, new) in &mod_leaves {
        if prev_map.contains_key(path.as_str()) {
            continue;
        }
        mutations.push(Mutation {
            resource_type: resource_type.to_string(),
            resource_name: resource_name.to_string(),
            path: Some(path.clone()),
            old: None,
            new: Some(new.clone()),
            function_index,
            patchable: true,
        });
    }
}

/// All scalar leaves in document order as `(escaped dotted path, value)`.
fn scalar_leaves(doc: &Document) -> Vec<(String, Scalar)> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    collect_leaves(doc.root(), &mut prefix, &mut out);
    out
}

fn collect_leaves(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<(String, Scalar)>) {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => s.clone(),
                    other => Scalar::from_value(other)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                };
                prefix.push(key);
                collect_leaves(v, prefix, out);
                prefix.pop();
            }
        }
        Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                prefix.push(i.to_string());
                collect_leaves(v, prefix, out);
                prefix.pop();
            }
        }
        other => {
            if let Some(scalar) = Scalar::from_value(other) {
                out.push((join_path(prefix), scalar));
            }
        }
    }
}
