//! Document abstraction over parsed YAML trees.
//!
//! The engine addresses nodes with dotted paths; `.` inside a key is escaped
//! with `~0` (alongside `~1` for `/` and `~2` for `~`), so a Kubernetes
//! annotation key like `app.kubernetes.io/name` is written
//! `app~0kubernetes~0io/name`.

mod container;
mod scalar;

pub use container::DocContainer;
pub use scalar::Scalar;

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Encode a raw key for use as a path segment.
pub fn escape_key(key: &str) -> String {
    key.replace('~', "~2").replace('.', "~0")
}

/// Decode a path segment back to the raw key.
pub fn unescape_key(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('.'),
            Some('1') => out.push('/'),
            Some('2') => out.push('~'),
            Some(other) => {
                out.push('~');
                out.push(other);
            }
            None => out.push('~'),
        }
    }
    out
}

/// Split a dotted path into raw (unescaped) segments. Empty path is the root.
pub fn split_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').map(unescape_key).collect()
}

/// Join raw segments into a dotted path, escaping each.
pub fn join_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| escape_key(s))
        .collect::<Vec<_>>()
        .join(".")
}

/// One parsed YAML document plus its per-node comments.
///
/// Comments are kept in a side table keyed by resolved path; the YAML layer
/// itself has no comment support, so they are re-injected line-wise when the
/// document is serialized.
#[derive(Debug, Clone)]
pub struct Document {
    root: Value,
    comments: BTreeMap<String, String>,
}

impl PartialEq for Document {
    /// Structural equality over the value tree; comments are presentation.
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Document {
    pub fn new(root: Value) -> Self {
        Self {
            root,
            comments: BTreeMap::new(),
        }
    }

    pub fn parse(input: &str) -> Result<Document> {
        let root: Value = serde_yaml::from_str(input)
            .map_err(|e| Error::Schema {
                file: "<inline>".to_string(),
                detail: e.to_string(),
            })?;
        Ok(Document::new(root))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        node_at(&self.root, &split_path(path))
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        node_at_mut(&mut self.root, &split_path(path))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn scalar(&self, path: &str) -> Option<Scalar> {
        self.get(path).and_then(Scalar::from_value)
    }

    /// Write a value at `path`, creating intermediate mappings. A sequence
    /// index may point at an existing slot or one past the end (append).
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let segs = split_path(path);
        if segs.is_empty() {
            self.root = value;
            return Ok(());
        }
        let mut pending = Some(value);
        let mut node = &mut self.root;
        for (i, seg) in segs.iter().enumerate() {
            let last = i + 1 == segs.len();
            if node.is_null() {
                *node = Value::Mapping(Mapping::new());
            }
            match node {
                Value::Mapping(map) => {
                    let key = Value::String(seg.clone());
                    if last {
                        map.insert(key, pending.take().expect("value consumed once"));
                        return Ok(());
                    }
                    if !map.contains_key(&key) {
                        map.insert(key.clone(), Value::Mapping(Mapping::new()));
                    }
                    node = map.get_mut(&key).expect("key just ensured");
                }
                Value::Sequence(seq) => {
                    let idx: usize = seg.parse().map_err(|_| {
                        Error::Type(format!(
                            "sequence index expected at '{}' in path {}",
                            seg, path
                        ))
                    })?;
                    if last {
                        let value = pending.take().expect("value consumed once");
                        if idx < seq.len() {
                            seq[idx] = value;
                        } else if idx == seq.len() {
                            seq.push(value);
                        } else {
                            return Err(Error::NotFound(format!(
                                "index {} out of range in path {}",
                                idx, path
                            )));
                        }
                        return Ok(());
                    }
                    node = seq.get_mut(idx).ok_or_else(|| {
                        Error::NotFound(format!("index {} out of range in path {}", idx, path))
                    })?;
                }
                _ => {
                    return Err(Error::Type(format!(
                        "cannot descend through scalar at '{}' in path {}",
                        seg, path
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn set_scalar(&mut self, path: &str, scalar: &Scalar) -> Result<()> {
        self.set(path, scalar.to_value())
    }

    pub fn delete(&mut self, path: &str) -> Result<()> {
        let segs = split_path(path);
        let Some((last, parents)) = segs.split_last() else {
            return Err(Error::NotFound("cannot delete document root".to_string()));
        };
        let parent = node_at_mut(&mut self.root, parents)
            .ok_or_else(|| Error::NotFound(format!("no node at path {}", path)))?;
        match parent {
            Value::Mapping(map) => {
                let key = Value::String(last.clone());
                map.remove(&key)
                    .map(|_| ())
                    .ok_or_else(|| Error::NotFound(format!("no node at path {}", path)))
            }
            Value::Sequence(seq) => {
                let idx: usize = last
                    .parse()
                    .map_err(|_| Error::NotFound(format!("no node at path {}", path)))?;
                if idx < seq.len() {
                    seq.remove(idx);
                    Ok(())
                } else {
                    Err(Error::NotFound(format!("no node at path {}", path)))
                }
            }
            _ => Err(Error::NotFound(format!("no node at path {}", path))),
        }
    }

    /// Ordered children of the node at `path`: `(escaped key or index, node)`.
    pub fn children(&self, path: &str) -> Vec<(String, &Value)> {
        match self.get(path) {
            Some(Value::Mapping(map)) => map
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => escape_key(s),
                        other => Scalar::from_value(other)
                            .map(|s| s.to_string())
                            .unwrap_or_default(),
                    };
                    (key, v)
                })
                .collect(),
            Some(Value::Sequence(seq)) => seq
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Attach a comment to the node at `path`; it is re-injected above the
    /// matching line on serialization. The empty path comments the document
    /// head.
    pub fn set_comment(&mut self, path: &str, text: &str) {
        self.comments.insert(path.to_string(), text.to_string());
    }

    pub fn comment(&self, path: &str) -> Option<&str> {
        self.comments.get(path).map(|s| s.as_str())
    }

    pub fn to_yaml(&self) -> Result<String> {
        let rendered = serde_yaml::to_string(&self.root)
            .map_err(|e| Error::Internal(format!("serialize: {}", e)))?;
        Ok(inject_comments(&rendered, &self.comments))
    }
}

fn node_at<'a>(root: &'a Value, segs: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = match node {
            Value::Mapping(map) => {
                let key = Value::String(seg.clone());
                match map.get(&key) {
                    Some(v) => v,
                    None => {
                        let num: i64 = seg.parse().ok()?;
                        map.get(&Value::Number(num.into()))?
                    }
                }
            }
            Value::Sequence(seq) => {
                let idx: usize = seg.parse().ok()?;
                seq.get(idx)?
            }
            _ => return None,
        };
    }
    Some(node)
}

fn node_at_mut<'a>(root: &'a mut Value, segs: &[String]) -> Option<&'a mut Value> {
    let mut node = root;
    for seg in segs {
        node = match node {
            Value::Mapping(map) => {
                let key = Value::String(seg.clone());
                if map.contains_key(&key) {
                    map.get_mut(&key)?
                } else {
                    let num: i64 = seg.parse().ok()?;
                    map.get_mut(&Value::Number(num.into()))?
                }
            }
            Value::Sequence(seq) => {
                let idx: usize = seg.parse().ok()?;
                seq.get_mut(idx)?
            }
            _ => return None,
        };
    }
    Some(node)
}

/// Re-insert comments above the lines their paths resolve to.
///
/// Only mapping chains are tracked; a comment attached under a sequence
/// element stays in the side table without a rendered line.
fn inject_comments(yaml: &str, comments: &BTreeMap<String, String>) -> String {
    if comments.is_empty() {
        return yaml.to_string();
    }
    let mut out: Vec<String> = Vec::new();
    if let Some(head) = comments.get("") {
        for line in head.lines() {
            out.push(format!("# {}", line));
        }
    }
    let mut stack: Vec<(usize, String)> = Vec::new();
    for line in yaml.lines() {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if !trimmed.is_empty() && !trimmed.starts_with('#') && !trimmed.starts_with('-') {
            if let Some(colon) = trimmed.find(':') {
                let key = trimmed[..colon].trim().trim_matches('"');
                while stack.last().is_some_and(|(i, _)| *i >= indent) {
                    stack.pop();
                }
                stack.push((indent, escape_key(key)));
                let dotted = stack
                    .iter()
                    .map(|(_, k)| k.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                if let Some(text) = comments.get(&dotted) {
                    for cline in text.lines() {
                        out.push(format!("{}# {}", " ".repeat(indent), cline));
                    }
                }
            }
        }
        out.push(line.to_string());
    }
    let mut joined = out.join("\n");
    joined.push('\n');
    joined
}
