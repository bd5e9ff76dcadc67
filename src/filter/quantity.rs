//! Kubernetes resource quantities as an opaque comparable value.
//!
//! `500m`, `2`, `128Mi`, `1.5Gi` all parse into a canonical milli-unit count;
//! comparison operators are defined on that form.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?[0-9]+(?:\.[0-9]+)?)(Ki|Mi|Gi|Ti|Pi|Ei|[mkMGTPE])?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity {
    millis: i128,
}

impl Quantity {
    pub fn millis(&self) -> i128 {
        self.millis
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Quantity, Error> {
        let caps = QUANTITY_RE
            .captures(s.trim())
            .ok_or_else(|| Error::Type(format!("'{}' is not a resource quantity", s)))?;
        let number: f64 = caps[1]
            .parse()
            .map_err(|_| Error::Type(format!("'{}' is not a resource quantity", s)))?;
        let scale: f64 = match caps.get(2).map(|m| m.as_str()) {
            None => 1_000.0,
            Some("m") => 1.0,
            Some("k") => 1e3 * 1_000.0,
            Some("M") => 1e6 * 1_000.0,
            Some("G") => 1e9 * 1_000.0,
            Some("T") => 1e12 * 1_000.0,
            Some("P") => 1e15 * 1_000.0,
            Some("E") => 1e18 * 1_000.0,
            Some("Ki") => 1024.0 * 1_000.0,
            Some("Mi") => 1024f64.powi(2) * 1_000.0,
            Some("Gi") => 1024f64.powi(3) * 1_000.0,
            Some("Ti") => 1024f64.powi(4) * 1_000.0,
            Some("Pi") => 1024f64.powi(5) * 1_000.0,
            Some("Ei") => 1024f64.powi(6) * 1_000.0,
            Some(other) => {
                return Err(Error::Type(format!("unknown quantity suffix '{}'", other)))
            }
        };
        Ok(Quantity {
            millis: (number * scale).round() as i128,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn milli_cpu_ordering() {
        assert!(q("500m") < q("1"));
        assert!(q("1500m") > q("1"));
        assert_eq!(q("1000m"), q("1"));
    }

    #[test]
    fn binary_and_decimal_suffixes() {
        assert_eq!(q("1Ki").millis(), 1024 * 1000);
        assert!(q("1Mi") > q("1M"));
        assert!(q("128Mi") < q("1Gi"));
        assert_eq!(q("0.5Gi"), q("512Mi"));
    }

    #[test]
    fn rejects_non_quantities() {
        assert!("abc".parse::<Quantity>().is_err());
        assert!("1.2.3".parse::<Quantity>().is_err());
    }
}
