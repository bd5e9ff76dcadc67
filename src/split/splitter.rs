//! Splits a rendered file set into two ordered YAML streams: definition
//! resources (CRDs) and everything else.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::document::{DocContainer, Document};
use crate::error::{Error, Result};
use crate::provider::{KubernetesProvider, ResourceProvider, ResourceInfo, CRD_RESOURCE_TYPE};

use super::ordering::{order_crds, order_resources};

/// Canonical resource-name shape: `namespace/name` with an empty scope for
/// cluster-scoped resources.
static RESOURCE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^/]*)/(.+)$").unwrap());

/// One document surviving the skip rules, tied to the file it came from.
#[derive(Debug)]
pub struct ManifestEntry {
    pub file: String,
    pub kind: String,
    pub info: ResourceInfo,
    pub doc: Document,
}

/// The two concatenated output streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    pub crds: String,
    pub resources: String,
}

/// Split rendered files into CRD and resource streams, each document
/// preceded by `---` and a `# Source:` header, CRDs in stable priority
/// order and resources in dependency order.
///
/// Skipped entries: empty payloads, partials (basename starting `_`), and
/// `NOTES.txt`. Identical inputs produce byte-identical outputs.
pub fn split_and_order(
    provider: &KubernetesProvider,
    source_name: &str,
    files: &[(String, String)],
) -> Result<SplitOutput> {
    let mut crds: Vec<ManifestEntry> = Vec::new();
    let mut resources: Vec<ManifestEntry> = Vec::new();

    for (file, content) in files {
        if skip_entry(file, content) {
            debug!(%file, "skipping non-manifest entry");
            continue;
        }
        let container = DocContainer::parse_all(content).map_err(|err| Error::Schema {
            file: file.clone(),
            detail: format!("{} (payload: {})", err, excerpt(content)),
        })?;
        for doc in container.docs() {
            let info = provider.resource_info(doc).map_err(|err| match err {
                Error::Schema { detail, .. } => Error::Schema {
                    file: file.clone(),
                    detail,
                },
                other => other,
            })?;
            if !RESOURCE_NAME_RE.is_match(&info.resource_name) {
                return Err(Error::Schema {
                    file: file.clone(),
                    detail: format!("malformed resource name '{}'", info.resource_name),
                });
            }
            let kind = info
                .resource_type
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            let entry = ManifestEntry {
                file: file.clone(),
                kind,
                info,
                doc: doc.clone(),
            };
            if entry.info.resource_type == CRD_RESOURCE_TYPE {
                crds.push(entry);
            } else {
                resources.push(entry);
            }
        }
    }

    let crd_order = order_crds(&crds);
    let resource_order = order_resources(&resources)?;

    Ok(SplitOutput {
        crds: render(source_name, &crds, &crd_order)?,
        resources: render(source_name, &resources, &resource_order)?,
    })
}

fn skip_entry(file: &str, content: &str) -> bool {
    if content.trim().is_empty() {
        return true;
    }
    let basename = file.rsplit('/').next().unwrap_or(file);
    basename.starts_with('_') || basename == "NOTES.txt"
}

fn excerpt(content: &str) -> &str {
    let end = content
        .char_indices()
        .nth(120)
        .map(|(i, _)| i)
        .unwrap_or(content.len());
    &content[..end]
}

fn render(source_name: &str, entries: &[ManifestEntry], order: &[usize]) -> Result<String> {
    let mut out = String::new();
    for &idx in order {
        let entry = &entries[idx];
        out.push_str("---\n");
        out.push_str(&format!("# Source: {}/{}\n", source_name, entry.file));
        out.push_str(&entry.doc.to_yaml()?);
    }
    Ok(out)
}
