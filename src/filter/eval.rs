//! WHERE-filter evaluation over resolved paths.
//!
//! A relational matches a resource when any resolved path under it satisfies
//! the comparison; relationals combine by resource-name intersection. With a
//! `visitor|sub` split, a matched subtree lacking the sub-path satisfies only
//! `!=`.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{DocContainer, Document, Scalar};
use crate::error::Result;
use crate::filter::quantity::Quantity;
use crate::path::resolve;
use crate::provider::ResourceProvider;

use super::parser::{CompareOp, Literal, Relational, WhereFilter};

/// Paths compared as opaque physical quantities rather than strings.
static QUANTITY_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.resources\.(requests|limits)\.[a-z]+$").unwrap());

/// Evaluation result: the resources matching every relational, in container
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub passed: bool,
    pub matched: Vec<String>,
}

/// Evaluate against a whole container. Documents the provider cannot
/// identify are skipped.
pub fn evaluate(
    filter: &WhereFilter,
    container: &DocContainer,
    provider: &dyn ResourceProvider,
) -> Result<FilterOutcome> {
    let mut resources: Vec<(String, &Document)> = Vec::new();
    for doc in container.iter() {
        match provider.resource_name(doc) {
            Ok(name) => resources.push((name, doc)),
            Err(_) => tracing::debug!("skipping unidentifiable document in filter evaluation"),
        }
    }

    let mut sets: Vec<BTreeSet<&str>> = Vec::new();
    for rel in &filter.relationals {
        let mut set = BTreeSet::new();
        for (name, doc) in &resources {
            if relational_matches(rel, doc)? {
                set.insert(name.as_str());
            }
        }
        sets.push(set);
    }

    let mut matched = Vec::new();
    for (name, _) in &resources {
        if sets.iter().all(|set| set.contains(name.as_str())) && !matched.contains(name) {
            matched.push(name.clone());
        }
    }
    Ok(FilterOutcome {
        passed: !matched.is_empty(),
        matched,
    })
}

/// True when every relational matches this single document.
pub fn matches_document(filter: &WhereFilter, doc: &Document) -> Result<bool> {
    for rel in &filter.relationals {
        if !relational_matches(rel, doc)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn relational_matches(rel: &Relational, doc: &Document) -> Result<bool> {
    let resolved = resolve(doc, &rel.path)?;
    match &rel.path.sub_path {
        Some(sub) => {
            for rp in &resolved {
                let full = rp.dotted_with(sub);
                match doc.scalar(&full) {
                    Some(scalar) => {
                        if compare(rel, &scalar, &full) {
                            return Ok(true);
                        }
                    }
                    // Missing property under a matched subtree: only
                    // inequality holds.
                    None => {
                        if rel.op == CompareOp::Ne {
                            return Ok(true);
                        }
                    }
                }
            }
            Ok(false)
        }
        None => {
            for rp in &resolved {
                let path = rp.dotted();
                if let Some(scalar) = doc.scalar(&path) {
                    if compare(rel, &scalar, &path) {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
    }
}

/// Typed comparison, dispatched by the literal's lexical type. A scalar of a
/// different kind simply does not match.
fn compare(rel: &Relational, scalar: &Scalar, path: &str) -> bool {
    match &rel.literal {
        Literal::Bool(expected) => scalar
            .as_bool()
            .map(|b| apply_equality(rel.op, b == *expected))
            .unwrap_or(false),
        Literal::Int(expected) => scalar
            .as_int()
            .map(|n| apply_order(rel.op, n.cmp(expected)))
            .unwrap_or(false),
        Literal::Str(expected) => {
            let Some(actual) = scalar.as_str() else {
                return false;
            };
            if QUANTITY_PATH_RE.is_match(path) {
                if let (Ok(lhs), Ok(rhs)) =
                    (actual.parse::<Quantity>(), expected.parse::<Quantity>())
                {
                    return apply_order(rel.op, lhs.cmp(&rhs));
                }
            }
            apply_order(rel.op, actual.cmp(expected.as_str()))
        }
    }
}

fn apply_equality(op: CompareOp, equal: bool) -> bool {
    match op {
        CompareOp::Eq => equal,
        CompareOp::Ne => !equal,
        // The parser rejects ordered operators on booleans.
        _ => false,
    }
}

fn apply_order(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}
