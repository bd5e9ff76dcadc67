//! Path expression grammar.
//!
//! A path is a dot-separated sequence of segments, optionally suffixed by
//! `|subpath` (visitor/subpath split) and/or `#accessor` (embedded accessor):
//!
//! ```text
//! spec.template.spec.containers.*?name:container.image#tag
//! spec.template.spec.containers.*.|securityContext.runAsNonRoot
//! spec.rules.?host=example~0com.http
//! metadata.annotations.@app/part-of:component
//! ```
//!
//! Each segment kind is one anchored regex applied left-to-right on the
//! remaining input; failures report the offending substring.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::unescape_key;
use crate::error::{Error, Result};

static MAP_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9/_~\-]{0,127}").unwrap());
static INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,10}").unwrap());
static BOUND_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@([A-Za-z][A-Za-z0-9/_~\-]{0,127}):([A-Za-z][A-Za-z0-9_\-]{0,127})").unwrap()
});
static WILDCARD_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\?([A-Za-z][A-Za-z0-9/_~\-]{0,127})(?::([A-Za-z][A-Za-z0-9_\-]{0,127}))?")
        .unwrap()
});
static WILDCARD_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@:([A-Za-z][A-Za-z0-9_\-]{0,127})").unwrap());
static ASSOC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\?([A-Za-z][A-Za-z0-9/_~\-]{0,127})(?::([A-Za-z][A-Za-z0-9_\-]{0,127}))?=([^.]{0,255})",
    )
    .unwrap()
});
static ACCESSOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_\-]{0,127}$").unwrap());

/// One path segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Descend a named field. Stored unescaped.
    Key(String),
    /// Descend a named field, binding the key to a parameter.
    BoundKey { key: String, param: String },
    /// Descend a sequence index.
    Index(usize),
    /// Iterate all children, optionally binding per child.
    Wildcard(Option<WildcardBind>),
    /// Select the first child of a sequence of mappings whose `field` equals
    /// `value`, optionally binding the matched value.
    Assoc {
        field: String,
        param: Option<String>,
        value: String,
    },
}

/// Binding clause attached to a wildcard.
#[derive(Debug, Clone, PartialEq)]
pub enum WildcardBind {
    /// `*?field` / `*?field:param` — bind each child's own `field` value.
    /// Without an explicit parameter the field name itself is the parameter.
    Field { field: String, param: Option<String> },
    /// `*@:param` — bind the map key (or index) the child sits under.
    Key { param: String },
}

/// A parsed, possibly unresolved path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    raw: String,
    pub segments: Vec<Segment>,
    /// Pure dotted segments after `|`, unescaped. No patterns allowed there.
    pub sub_path: Option<Vec<String>>,
    /// Named capture selected by a `#accessor` suffix.
    pub accessor: Option<String>,
}

impl PathExpr {
    pub fn parse(input: &str) -> Result<PathExpr> {
        let raw = input.to_string();
        let mut rest = input;

        let accessor = match rest.rfind('#') {
            Some(pos) => {
                let name = &rest[pos + 1..];
                if !ACCESSOR_RE.is_match(name) {
                    return Err(syntax(name));
                }
                rest = &rest[..pos];
                Some(name.to_string())
            }
            None => None,
        };

        let sub_path = match rest.find('|') {
            Some(pos) => {
                let sub = parse_sub_path(&rest[pos + 1..])?;
                // A split is written `visitor.|sub`; drop the separator dot.
                rest = rest[..pos].trim_end_matches('.');
                Some(sub)
            }
            None => None,
        };

        if rest.is_empty() {
            return Err(syntax(input));
        }

        let mut segments = Vec::new();
        loop {
            let (segment, consumed) = parse_segment(rest)?;
            segments.push(segment);
            rest = &rest[consumed..];
            if rest.is_empty() {
                break;
            }
            match rest.strip_prefix('.') {
                Some(tail) if !tail.is_empty() => rest = tail,
                _ => return Err(syntax(rest)),
            }
        }

        Ok(PathExpr {
            raw,
            segments,
            sub_path,
            accessor,
        })
    }

    /// True when the expression names exactly one node: only keys and
    /// indices, no split and no accessor.
    pub fn is_concrete(&self) -> bool {
        self.sub_path.is_none()
            && self.accessor.is_none()
            && self
                .segments
                .iter()
                .all(|s| matches!(s, Segment::Key(_) | Segment::Index(_)))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Parse the right side of a `|` split: dotted keys and indices only.
pub fn parse_sub_path(input: &str) -> Result<Vec<String>> {
    if input.is_empty() {
        return Err(syntax(input));
    }
    let mut out = Vec::new();
    for part in input.split('.') {
        let key_match = MAP_KEY_RE.find(part).map(|m| m.as_str() == part);
        let index_match = INDEX_RE.find(part).map(|m| m.as_str() == part);
        if key_match == Some(true) || index_match == Some(true) {
            out.push(unescape_key(part));
        } else {
            return Err(syntax(part));
        }
    }
    Ok(out)
}

/// Substitute positional arguments into `%s` placeholders.
pub fn substitute_args(path: &str, args: &[String]) -> Result<String> {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    let mut used = 0;
    while let Some(pos) = rest.find("%s") {
        if used >= args.len() {
            return Err(Error::Type(format!(
                "path '{}' has more %s placeholders than the {} supplied arguments",
                path,
                args.len()
            )));
        }
        out.push_str(&rest[..pos]);
        out.push_str(&args[used]);
        used += 1;
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn parse_segment(input: &str) -> Result<(Segment, usize)> {
    if let Some(rest) = input.strip_prefix('*') {
        let mut consumed = 1;
        let bind = if let Some(caps) = WILDCARD_KEY_RE.captures(rest) {
            consumed += caps.get(0).unwrap().end();
            Some(WildcardBind::Key {
                param: caps[1].to_string(),
            })
        } else if let Some(caps) = WILDCARD_FIELD_RE.captures(rest) {
            consumed += caps.get(0).unwrap().end();
            Some(WildcardBind::Field {
                field: unescape_key(&caps[1]),
                param: caps.get(2).map(|m| m.as_str().to_string()),
            })
        } else {
            None
        };
        return Ok((Segment::Wildcard(bind), consumed));
    }

    if input.starts_with('?') {
        let caps = ASSOC_RE.captures(input).ok_or_else(|| syntax(input))?;
        return Ok((
            Segment::Assoc {
                field: unescape_key(&caps[1]),
                param: caps.get(2).map(|m| m.as_str().to_string()),
                value: unescape_key(&caps[3]),
            },
            caps.get(0).unwrap().end(),
        ));
    }

    if input.starts_with('@') {
        let caps = BOUND_KEY_RE.captures(input).ok_or_else(|| syntax(input))?;
        return Ok((
            Segment::BoundKey {
                key: unescape_key(&caps[1]),
                param: caps[2].to_string(),
            },
            caps.get(0).unwrap().end(),
        ));
    }

    if let Some(m) = INDEX_RE.find(input) {
        let idx: usize = m
            .as_str()
            .parse()
            .map_err(|_| Error::Type(format!("index out of range: {}", m.as_str())))?;
        return Ok((Segment::Index(idx), m.end()));
    }

    if let Some(m) = MAP_KEY_RE.find(input) {
        return Ok((Segment::Key(unescape_key(m.as_str())), m.end()));
    }

    Err(syntax(input))
}

fn syntax(offending: &str) -> Error {
    Error::Syntax {
        context: "path",
        offending: offending.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_and_indices() {
        let expr = PathExpr::parse("spec.template.spec.containers.0.image").unwrap();
        assert_eq!(expr.segments.len(), 6);
        assert!(expr.is_concrete());
        assert_eq!(expr.segments[4], Segment::Index(0));
    }

    #[test]
    fn wildcard_with_field_binding() {
        let expr = PathExpr::parse("spec.containers.*?name:container.image").unwrap();
        assert_eq!(
            expr.segments[2],
            Segment::Wildcard(Some(WildcardBind::Field {
                field: "name".to_string(),
                param: Some("container".to_string()),
            }))
        );
    }

    #[test]
    fn wildcard_with_key_binding() {
        let expr = PathExpr::parse("metadata.labels.*@:label-key").unwrap();
        assert_eq!(
            expr.segments[2],
            Segment::Wildcard(Some(WildcardBind::Key {
                param: "label-key".to_string(),
            }))
        );
    }

    #[test]
    fn associative_match() {
        let expr = PathExpr::parse("spec.containers.?name=main.image").unwrap();
        assert_eq!(
            expr.segments[2],
            Segment::Assoc {
                field: "name".to_string(),
                param: None,
                value: "main".to_string(),
            }
        );
    }

    #[test]
    fn split_and_accessor_suffixes() {
        let expr = PathExpr::parse("spec.containers.*.|securityContext.runAsNonRoot").unwrap();
        assert_eq!(
            expr.sub_path,
            Some(vec![
                "securityContext".to_string(),
                "runAsNonRoot".to_string()
            ])
        );
        let expr = PathExpr::parse("spec.containers.0.image#tag").unwrap();
        assert_eq!(expr.accessor.as_deref(), Some("tag"));
    }

    #[test]
    fn escaped_dot_in_key() {
        let expr = PathExpr::parse("metadata.annotations.app~0kubernetes~0io/name").unwrap();
        assert_eq!(
            expr.segments[2],
            Segment::Key("app.kubernetes.io/name".to_string())
        );
    }

    #[test]
    fn error_reports_offending_substring() {
        let err = PathExpr::parse("spec..replicas").unwrap_err();
        match err {
            Error::Syntax { offending, .. } => assert!(offending.starts_with('.')),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn patterns_rejected_in_sub_path() {
        assert!(PathExpr::parse("spec.containers.*.|nested.*").is_err());
    }

    #[test]
    fn placeholder_substitution() {
        let path = substitute_args("spec.containers.?name=%s.image", &["main".to_string()])
            .unwrap();
        assert_eq!(path, "spec.containers.?name=main.image");
        assert!(substitute_args("a.?n=%s.b.?m=%s", &["x".to_string()]).is_err());
    }
}
