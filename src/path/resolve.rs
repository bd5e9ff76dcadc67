//! Resolution of unresolved paths against a concrete document.
//!
//! Resolution expands wildcards and associative matches into the set of
//! concrete paths they denote, carrying parameter bindings along. Missing
//! keys yield an empty result set, never an error, unless the caller asked
//! for strict resolution.

use std::collections::BTreeMap;

use serde_yaml::Value;

use super::grammar::{PathExpr, Segment, WildcardBind};
use crate::document::{join_path, Document, Scalar};
use crate::error::{Error, Result};

/// A concrete dot-separated path plus the parameters captured on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    segments: Vec<String>,
    pub bindings: BTreeMap<String, String>,
}

impl ResolvedPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The escaped dotted form accepted by the document abstraction.
    pub fn dotted(&self) -> String {
        join_path(&self.segments)
    }

    /// The dotted form extended by a sub-path (for `visitor|sub` reads).
    pub fn dotted_with(&self, sub: &[String]) -> String {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(sub);
        join_path(&segments)
    }
}

/// Expand `expr` against `doc` in left-to-right segment order. The result
/// order is stable: document order per wildcard, first match per associative
/// segment.
pub fn resolve(doc: &Document, expr: &PathExpr) -> Result<Vec<ResolvedPath>> {
    let mut frontier: Vec<(Vec<String>, BTreeMap<String, String>, &Value)> =
        vec![(Vec::new(), BTreeMap::new(), doc.root())];

    for segment in &expr.segments {
        let mut next = Vec::new();
        for (segs, binds, node) in frontier {
            match segment {
                Segment::Key(key) => {
                    if let Some(child) = child_by_key(node, key) {
                        next.push((extended(&segs, key), binds, child));
                    }
                }
                Segment::BoundKey { key, param } => {
                    if let Some(child) = child_by_key(node, key) {
                        let mut binds = binds.clone();
                        binds.insert(param.clone(), key.clone());
                        next.push((extended(&segs, key), binds, child));
                    }
                }
                Segment::Index(idx) => {
                    if let Some(child) = child_by_index(node, *idx) {
                        next.push((extended(&segs, &idx.to_string()), binds, child));
                    }
                }
                Segment::Wildcard(bind) => {
                    for (key, child) in ordered_children(node) {
                        let mut binds = binds.clone();
                        match bind {
                            Some(WildcardBind::Key { param }) => {
                                binds.insert(param.clone(), key.clone());
                            }
                            Some(WildcardBind::Field { field, param }) => {
                                if let Some(value) =
                                    child_by_key(child, field).and_then(Scalar::from_value)
                                {
                                    let name = param.clone().unwrap_or_else(|| field.clone());
                                    binds.insert(name, value.to_string());
                                }
                            }
                            None => {}
                        }
                        next.push((extended(&segs, &key), binds, child));
                    }
                }
                Segment::Assoc {
                    field,
                    param,
                    value,
                } => {
                    let Value::Sequence(seq) = node else {
                        continue;
                    };
                    // First match in document order wins.
                    for (idx, child) in seq.iter().enumerate() {
                        let matched = child_by_key(child, field)
                            .and_then(Scalar::from_value)
                            .is_some_and(|s| s.to_string() == *value);
                        if matched {
                            let mut binds = binds.clone();
                            if let Some(param) = param {
                                binds.insert(param.clone(), value.clone());
                            }
                            next.push((extended(&segs, &idx.to_string()), binds, child));
                            break;
                        }
                    }
                }
            }
        }
        frontier = next;
    }

    Ok(frontier
        .into_iter()
        .map(|(segments, bindings, _)| ResolvedPath { segments, bindings })
        .collect())
}

/// Like [`resolve`], but an empty result set is an error. Used for paths the
/// registration marked as needed.
pub fn resolve_strict(doc: &Document, expr: &PathExpr) -> Result<Vec<ResolvedPath>> {
    let resolved = resolve(doc, expr)?;
    if resolved.is_empty() {
        return Err(Error::NotFound(format!(
            "path {} matched nothing",
            expr.raw()
        )));
    }
    Ok(resolved)
}

fn extended(segs: &[String], seg: &str) -> Vec<String> {
    let mut out = segs.to_vec();
    out.push(seg.to_string());
    out
}

fn child_by_key<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Mapping(map) => {
            let string_key = Value::String(key.to_string());
            if let Some(v) = map.get(&string_key) {
                return Some(v);
            }
            let num: i64 = key.parse().ok()?;
            map.get(&Value::Number(num.into()))
        }
        Value::Sequence(seq) => seq.get(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn child_by_index(node: &Value, idx: usize) -> Option<&Value> {
    match node {
        Value::Sequence(seq) => seq.get(idx),
        Value::Mapping(map) => map.get(&Value::Number((idx as i64).into())),
        _ => None,
    }
}

/// Children in document order; raw keys, sequence positions as decimal
/// indices. Escaping happens when a resolved path is rendered.
fn ordered_children(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| {
                let key = match k {
                    Value::String(s) => s.clone(),
                    other => Scalar::from_value(other)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                };
                (key, v)
            })
            .collect(),
        Value::Sequence(seq) => seq
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}
