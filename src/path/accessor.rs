//! Embedded accessors: named regex captures that expose a slice of a scalar
//! for reading and writing. A path suffixed `#tag` selects the `tag` capture
//! of the accessor registered alongside it.

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedAccessor {
    /// Default capture name, used when the path carries no `#` suffix.
    pub capture: String,
    pub pattern: String,
    #[serde(skip)]
    regex: Regex,
}

impl EmbeddedAccessor {
    /// Compile an accessor. The named capture must exist in the pattern.
    pub fn new(capture: &str, pattern: &str) -> Result<EmbeddedAccessor> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Internal(format!("accessor pattern {}: {}", pattern, e)))?;
        let accessor = EmbeddedAccessor {
            capture: capture.to_string(),
            pattern: pattern.to_string(),
            regex,
        };
        if !accessor.has_capture(capture) {
            return Err(Error::Internal(format!(
                "accessor pattern {} has no capture named {}",
                pattern, capture
            )));
        }
        Ok(accessor)
    }

    pub fn has_capture(&self, name: &str) -> bool {
        self.regex.capture_names().flatten().any(|n| n == name)
    }

    /// Read the named capture out of `scalar`. A scalar whose lexical form
    /// does not match the pattern is a type error; a non-participating group
    /// reads as `None`.
    pub fn read(&self, scalar: &str, capture: &str) -> Result<Option<String>> {
        let caps = self.regex.captures(scalar).ok_or_else(|| {
            Error::Type(format!(
                "value '{}' does not match accessor pattern {}",
                scalar, self.pattern
            ))
        })?;
        Ok(caps.name(capture).map(|m| m.as_str().to_string()))
    }

    /// Splice `replacement` over the named capture inside `scalar`, returning
    /// the full rewritten scalar. A non-participating group is an error: there
    /// is no span to write into.
    pub fn write(&self, scalar: &str, capture: &str, replacement: &str) -> Result<String> {
        let caps = self.regex.captures(scalar).ok_or_else(|| {
            Error::Type(format!(
                "value '{}' does not match accessor pattern {}",
                scalar, self.pattern
            ))
        })?;
        let m = caps.name(capture).ok_or_else(|| {
            Error::Type(format!(
                "capture {} did not participate in '{}'",
                capture, scalar
            ))
        })?;
        let mut out = String::with_capacity(scalar.len() + replacement.len());
        out.push_str(&scalar[..m.start()]);
        out.push_str(replacement);
        out.push_str(&scalar[m.end()..]);
        Ok(out)
    }
}
