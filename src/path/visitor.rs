//! Typed visitors over resolved paths.
//!
//! Three flavors: typed scalars (string/int/bool) with write-back, whole
//! documents (for subtree operations like comment attachment), and top-level
//! resources. The matched path list is materialized before any callback runs,
//! so callbacks may mutate freely without invalidating iteration. Type
//! mismatches are collected and surfaced as one joined error; missing paths
//! are not errors.

use super::accessor::EmbeddedAccessor;
use super::grammar::PathExpr;
use super::resolve::{resolve, ResolvedPath};
use crate::document::{DocContainer, Document, Scalar};
use crate::error::{Error, MultiError, Result};
use crate::provider::{ResourceInfo, ResourceProvider};

/// Visit string scalars; return `Some(new)` from the callback to write back.
pub fn visit_strings<F>(
    doc: &mut Document,
    expr: &PathExpr,
    accessor: Option<&EmbeddedAccessor>,
    mut f: F,
) -> Result<usize>
where
    F: FnMut(&ResolvedPath, &str) -> Result<Option<String>>,
{
    let mut multi = MultiError::new();
    let mut visited = 0;
    for rp in resolve(doc, expr)? {
        let path = rp.dotted();
        let Some(scalar) = doc.scalar(&path) else {
            continue;
        };
        let Scalar::String(current) = scalar else {
            multi.push(Error::type_mismatch("string", scalar.type_name(), &path));
            continue;
        };
        visited += 1;
        match accessor {
            Some(acc) => {
                let capture = expr.accessor.as_deref().unwrap_or(&acc.capture);
                let piece = match acc.read(&current, capture) {
                    Ok(Some(piece)) => piece,
                    Ok(None) => continue,
                    Err(err) => {
                        multi.push(err);
                        continue;
                    }
                };
                if let Some(new_piece) = f(&rp, &piece)? {
                    if new_piece != piece {
                        let rewritten = acc.write(&current, capture, &new_piece)?;
                        doc.set_scalar(&path, &Scalar::String(rewritten))?;
                    }
                }
            }
            None => {
                if let Some(new) = f(&rp, &current)? {
                    if new != current {
                        doc.set_scalar(&path, &Scalar::String(new))?;
                    }
                }
            }
        }
    }
    multi.into_result(visited)
}

/// Visit integer scalars. Floats with no fractional part are accepted; any
/// other scalar kind fails the visit.
pub fn visit_ints<F>(doc: &mut Document, expr: &PathExpr, mut f: F) -> Result<usize>
where
    F: FnMut(&ResolvedPath, i64) -> Result<Option<i64>>,
{
    let mut multi = MultiError::new();
    let mut visited = 0;
    for rp in resolve(doc, expr)? {
        let path = rp.dotted();
        let Some(scalar) = doc.scalar(&path) else {
            continue;
        };
        let Some(current) = scalar.as_int() else {
            multi.push(Error::type_mismatch("int", scalar.type_name(), &path));
            continue;
        };
        visited += 1;
        if let Some(new) = f(&rp, current)? {
            if new != current {
                doc.set_scalar(&path, &Scalar::Int(new))?;
            }
        }
    }
    multi.into_result(visited)
}

/// Visit boolean scalars.
pub fn visit_bools<F>(doc: &mut Document, expr: &PathExpr, mut f: F) -> Result<usize>
where
    F: FnMut(&ResolvedPath, bool) -> Result<Option<bool>>,
{
    let mut multi = MultiError::new();
    let mut visited = 0;
    for rp in resolve(doc, expr)? {
        let path = rp.dotted();
        let Some(scalar) = doc.scalar(&path) else {
            continue;
        };
        let Some(current) = scalar.as_bool() else {
            multi.push(Error::type_mismatch("bool", scalar.type_name(), &path));
            continue;
        };
        visited += 1;
        if let Some(new) = f(&rp, current)? {
            if new != current {
                doc.set_scalar(&path, &Scalar::Bool(new))?;
            }
        }
    }
    multi.into_result(visited)
}

/// Visit each matched subtree with full document access, for typed
/// set-object and comment attachment. Paths deleted by an earlier callback
/// are skipped.
pub fn visit_nodes<F>(doc: &mut Document, expr: &PathExpr, mut f: F) -> Result<usize>
where
    F: FnMut(&mut Document, &ResolvedPath) -> Result<()>,
{
    let resolved = resolve(doc, expr)?;
    let mut multi = MultiError::new();
    let mut visited = 0;
    for rp in &resolved {
        if !doc.exists(&rp.dotted()) {
            continue;
        }
        visited += 1;
        if let Err(err) = f(doc, rp) {
            multi.push(err);
        }
    }
    multi.into_result(visited)
}

/// Visit top-level documents with their resolved identity. Documents the
/// provider cannot identify are collected as schema errors; callback errors
/// are collected per resource and the visit continues.
pub fn visit_resources<F>(
    container: &mut DocContainer,
    provider: &dyn ResourceProvider,
    mut f: F,
) -> Result<usize>
where
    F: FnMut(usize, &ResourceInfo, &mut Document) -> Result<()>,
{
    let mut infos: Vec<(usize, ResourceInfo)> = Vec::new();
    let mut multi = MultiError::new();
    for (idx, doc) in container.iter().enumerate() {
        match provider.resource_info(doc) {
            Ok(info) => infos.push((idx, info)),
            Err(err) => multi.push(err),
        }
    }
    let mut visited = 0;
    for (idx, info) in &infos {
        let doc = container
            .get_mut(*idx)
            .expect("indices collected from this container");
        visited += 1;
        if let Err(err) = f(*idx, info, doc) {
            multi.push(err);
        }
    }
    multi.into_result(visited)
}
