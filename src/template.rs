//! Minimal `{{.Field}}` substitution with a fixed helper set.
//!
//! Directives: `{{.Field}}`, `{{toUpper .Field}}`, `{{toLower .Field}}`,
//! `{{trimSpace .Field}}`, `{{trimPrefix .Field "p"}}`,
//! `{{trimSuffix .Field "s"}}`. Unknown fields, unknown helpers, and
//! unparsable directives are fatal.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\{\s*(?:([A-Za-z]+)\s+)?\.([A-Za-z][A-Za-z0-9]*)(?:\s+"([^"]*)")?\s*\}\}"#)
        .unwrap()
});

/// Render `template` against named fields.
pub fn render(template: &str, fields: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in DIRECTIVE_RE.captures_iter(template) {
        let whole = caps.get(0).expect("group 0 always participates");
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        let field = &caps[2];
        let value = fields.get(field).ok_or_else(|| {
            Error::Internal(format!("template references unknown field {}", field))
        })?;
        let helper_arg = caps.get(3).map(|m| m.as_str());
        let rendered = match caps.get(1).map(|m| m.as_str()) {
            None => value.clone(),
            Some("toUpper") => value.to_uppercase(),
            Some("toLower") => value.to_lowercase(),
            Some("trimSpace") => value.trim().to_string(),
            Some("trimPrefix") => {
                let prefix = helper_arg.ok_or_else(|| {
                    Error::Internal("trimPrefix takes a quoted argument".to_string())
                })?;
                value.strip_prefix(prefix).unwrap_or(value).to_string()
            }
            Some("trimSuffix") => {
                let suffix = helper_arg.ok_or_else(|| {
                    Error::Internal("trimSuffix takes a quoted argument".to_string())
                })?;
                value.strip_suffix(suffix).unwrap_or(value).to_string()
            }
            Some(other) => {
                return Err(Error::Internal(format!("unknown template helper {}", other)))
            }
        };
        out.push_str(&rendered);
    }
    out.push_str(&template[last..]);
    if out.contains("{{") {
        return Err(Error::Internal(format!(
            "unparsed template directive in '{}'",
            template
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> BTreeMap<String, String> {
        [
            ("Name".to_string(), "  Billing  ".to_string()),
            ("Space".to_string(), "prod".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn plain_substitution() {
        assert_eq!(
            render("{{.Space}}-svc", &fields()).unwrap(),
            "prod-svc"
        );
    }

    #[test]
    fn helpers() {
        assert_eq!(render("{{toUpper .Space}}", &fields()).unwrap(), "PROD");
        assert_eq!(
            render("{{trimSpace .Name}}", &fields()).unwrap(),
            "Billing"
        );
        assert_eq!(
            render(r#"{{trimSuffix .Space "od"}}"#, &fields()).unwrap(),
            "pr"
        );
    }

    #[test]
    fn unknown_field_is_fatal() {
        assert!(render("{{.Nope}}", &fields()).is_err());
        assert!(render("{{shout .Space}}", &fields()).is_err());
        assert!(render("{{ broken", &fields()).is_err());
    }
}
