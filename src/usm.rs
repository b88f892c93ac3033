/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Detection of SNMPv3 USM (User-based Security Model) failure reports.
//!
//! A v3 agent that rejects a request for security reasons does not return a
//! transport-level error: it replies with a normal GET/GET-NEXT response
//! whose single varbind is bound under the `usmStats` subtree
//! (`1.3.6.1.6.3.15.1.1`), with the report counter's own value as the
//! payload. The suffix identifies which USM check failed.

use crate::error::UsmError;
use crate::oid::Oid;

const USM_STATS_PREFIX: &str = "1.3.6.1.6.3.15.1.1";

fn usm_prefix() -> Oid {
    Oid::parse(USM_STATS_PREFIX).expect("constant OID is valid")
}

/// Map a `usmStats*` suffix to its diagnostic message, per RFC 3414 §5. The
/// message names the literal usmStats counter identifier rather than a
/// paraphrase, so callers can match on the MIB object itself.
fn message_for_suffix(suffix: u64) -> &'static str {
    match suffix {
        1 => "unsupportedSecLevels",
        2 => "notInTimeWindows",
        3 => "unknownUserNames",
        4 => "unknownEngineIDs",
        5 => "wrongDigests",
        6 => "decryptionErrors",
        _ => "unrecognized USM report",
    }
}

/// Check whether `oid` falls under the usmStats report subtree and, if so,
/// build the corresponding error. Suppressed for end-of-MIB-view style
/// markers, since a v3 walk legitimately runs off the end of that subtree.
pub fn check(oid: &Oid, is_walk_terminator: bool) -> Option<UsmError> {
    if is_walk_terminator {
        return None;
    }
    let prefix = usm_prefix();
    if !oid.has_prefix(&prefix) {
        return None;
    }
    let suffix = oid
        .components()
        .get(prefix.components().len())
        .copied()
        .unwrap_or(0);
    Some(UsmError {
        oid: oid.clone(),
        message: message_for_suffix(suffix),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> Oid {
        Oid::parse(s).unwrap()
    }

    #[test]
    fn detects_each_known_report() {
        for (suffix, message) in [
            (1, "unsupportedSecLevels"),
            (2, "notInTimeWindows"),
            (3, "unknownUserNames"),
            (4, "unknownEngineIDs"),
            (5, "wrongDigests"),
            (6, "decryptionErrors"),
        ] {
            let o = oid(&format!("{USM_STATS_PREFIX}.{suffix}.0"));
            let err = check(&o, false).unwrap();
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn unrecognized_suffix_within_subtree_is_generic() {
        let o = oid(&format!("{USM_STATS_PREFIX}.99.0"));
        let err = check(&o, false).unwrap();
        assert_eq!(err.message, "unrecognized USM report");
    }

    #[test]
    fn outside_subtree_is_not_a_usm_error() {
        assert!(check(&oid("1.3.6.1.2.1.1.5.0"), false).is_none());
    }

    #[test]
    fn walk_terminator_suppresses_report() {
        let o = oid(&format!("{USM_STATS_PREFIX}.3.0"));
        assert!(check(&o, true).is_none());
    }
}
