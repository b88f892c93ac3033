/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid OID: {0}")]
pub struct OidError(String);

/// A parsed OID: a non-empty sequence of non-negative integer components.
///
/// Equality and ordering are component-wise, never on the textual form
/// (`"1.3.6.1.2.1.1.5"` sorts before `"1.3.6.1.2.1.1.10"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(Vec<u64>);

impl Oid {
    pub fn parse(s: &str) -> std::result::Result<Self, OidError> {
        let trimmed = s.trim_matches('.');
        if trimmed.is_empty() {
            return Err(OidError(s.to_string()));
        }
        let parts = trimmed
            .split('.')
            .map(|p| p.parse::<u64>().map_err(|_| OidError(s.to_string())))
            .collect::<std::result::Result<Vec<u64>, OidError>>()?;
        Ok(Oid(parts))
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }

    /// True iff `self == prefix` or `self` begins with `prefix.`
    pub fn has_prefix(&self, prefix: &Oid) -> bool {
        self.0 == prefix.0 || (self.0.len() > prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..])
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.0 {
            write!(f, ".{part}")?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = OidError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Oid::parse(s)
    }
}

impl TryFrom<String> for Oid {
    type Error = OidError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Oid::parse(&s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.to_string()
    }
}

/// Strip surrounding '.' and prepend a single leading '.'. Idempotent.
pub fn format_oid(s: &str) -> String {
    format!(".{}", s.trim_matches('.'))
}

/// Strip surrounding '.' and split on '.'.
pub fn split(oid: &str) -> Vec<&str> {
    oid.trim_matches('.').split('.').collect()
}

/// True iff `oid == prefix` or `oid` begins with `prefix + "."`.
pub fn has_prefix(oid: &str, prefix: &str) -> bool {
    match (Oid::parse(oid), Oid::parse(prefix)) {
        (Ok(oid), Ok(prefix)) => oid.has_prefix(&prefix),
        _ => {
            let oid = format_oid(oid);
            let prefix = format_oid(prefix);
            oid == prefix || oid.starts_with(&format!("{prefix}."))
        }
    }
}

/// Lexicographic order over the integer components of two OID strings.
/// Falls back to component count, then to raw string order, on unparseable
/// input so sorting never panics on malformed data.
pub fn total_order(a: &str, b: &str) -> Ordering {
    match (Oid::parse(a), Oid::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_oid_is_idempotent() {
        assert_eq!(format_oid("1.3.6.1"), ".1.3.6.1");
        assert_eq!(format_oid(".1.3.6.1"), ".1.3.6.1");
        assert_eq!(format_oid(&format_oid("1.3.6.1")), ".1.3.6.1");
    }

    #[test]
    fn split_strips_dots() {
        assert_eq!(split(".1.3.6.1"), vec!["1", "3", "6", "1"]);
    }

    #[test]
    fn has_prefix_matches_spec_examples() {
        assert!(has_prefix(".1.3.6.1.3.69", ".1.3.6.1.3"));
        assert!(!has_prefix(".1.3.6.1.30", ".1.3.6.1.3"));
        assert!(has_prefix(".1.3.6.1.3", ".1.3.6.1.3"));
    }

    #[test]
    fn total_order_is_numeric_not_lexicographic() {
        assert_eq!(
            total_order("1.3.6.1.2.1.1.5", "1.3.6.1.2.1.1.10"),
            Ordering::Less
        );
    }

    #[test]
    fn total_order_is_a_total_order() {
        let a = "1.3.6.1.2.1.1.5";
        let b = "1.3.6.1.2.1.1.10";
        let c = "1.3.6.1.2.1.1.10.1";

        // antisymmetric
        assert_eq!(total_order(a, b), total_order(b, a).reverse());
        // transitive
        assert_eq!(total_order(a, b), Ordering::Less);
        assert_eq!(total_order(b, c), Ordering::Less);
        assert_eq!(total_order(a, c), Ordering::Less);
        // trichotomous
        assert_eq!(total_order(a, a), Ordering::Equal);
    }

    #[test]
    fn oid_ordering_matches_components() {
        let mut oids: Vec<Oid> = vec![
            Oid::parse("1.3.6.1.2.1.1.10").unwrap(),
            Oid::parse("1.3.6.1.2.1.1.5").unwrap(),
            Oid::parse("1.3.6.1.2.1.1.5.1").unwrap(),
        ];
        oids.sort();
        assert_eq!(
            oids.iter().map(|o| o.to_string()).collect::<Vec<_>>(),
            vec![
                ".1.3.6.1.2.1.1.5".to_string(),
                ".1.3.6.1.2.1.1.5.1".to_string(),
                ".1.3.6.1.2.1.1.10".to_string(),
            ]
        );
    }
}
