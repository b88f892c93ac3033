/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Tree-walk engines: a simple single-PDU walk (`walk`) built on GET-NEXT,
//! and an adaptive bulk walk (`walk_bulk`) built on GET-BULK with a
//! self-tuning `max-repetitions` setpoint.

use std::time::{Duration, Instant};

use crate::decode::{build_result, SnmpResult};
use crate::error::{Error, Result};
use crate::oid::{has_prefix, total_order};
use crate::transport::{Binding, SnmpTransport};

/// Setpoint controller for `walk_bulk`'s `max-repetitions`. Climbs slowly
/// after a quiet period, backs off aggressively on timeout.
#[derive(Debug, Clone)]
pub struct BulkWalkController {
    pub default_max_repetitions: u32,
    pub optimal_max_repetitions: u32,
    last_update: Instant,
    calls_since_update: u32,
    pub reassess_interval: Duration,
    pub reassess_call_count: u32,
}

impl BulkWalkController {
    pub fn new() -> Self {
        BulkWalkController {
            default_max_repetitions: 20,
            optimal_max_repetitions: 20,
            last_update: Instant::now(),
            calls_since_update: 0,
            reassess_interval: Duration::from_secs(30),
            reassess_call_count: 30,
        }
    }

    fn cadence_elapsed(&self) -> bool {
        self.last_update.elapsed() >= self.reassess_interval
            || self.calls_since_update >= self.reassess_call_count
    }

    fn reset_cadence(&mut self) {
        self.last_update = Instant::now();
        self.calls_since_update = 0;
    }

    /// Step 1 of the main loop: probe upward after a quiet period.
    pub fn reassess_upward(&mut self) {
        if self.cadence_elapsed() && self.optimal_max_repetitions < self.default_max_repetitions {
            let step = if self.optimal_max_repetitions < 5 { 1 } else { 5 };
            self.optimal_max_repetitions =
                (self.optimal_max_repetitions + step).min(self.default_max_repetitions);
            self.reset_cadence();
        }
    }

    pub fn record_success(&mut self) {
        self.calls_since_update += 1;
    }

    /// Step 3: back off after a timeout. Returns `false` when there is
    /// nothing left to back off to (caller should give up on bulk mode).
    pub fn back_off(&mut self) -> bool {
        if self.optimal_max_repetitions <= 1 {
            return false;
        }
        let step = if self.optimal_max_repetitions > 5 { 5 } else { 1 };
        self.optimal_max_repetitions = self.optimal_max_repetitions.saturating_sub(step).max(1);
        self.reset_cadence();
        true
    }
}

impl Default for BulkWalkController {
    fn default() -> Self {
        Self::new()
    }
}

fn to_result(b: &Binding) -> Result<SnmpResult> {
    build_result(&b.oid, b.ty, b.value.clone()).map_err(Error::from)
}

fn dedup_sort(mut results: Vec<SnmpResult>) -> Vec<SnmpResult> {
    let mut seen = std::collections::HashSet::new();
    results.retain(|r| seen.insert(r.oid().to_string()));
    results.sort_by(|a, b| total_order(&a.oid().to_string(), &b.oid().to_string()));
    results
}

/// Forces a transport's retries to 0 for the lifetime of the guard, then
/// restores whatever value it had on drop. Used by `walk_bulk`, whose GetBulk
/// attempts must each cost exactly one timeout so the controller's backoff
/// sees every failure; restoring on drop covers every exit path, including
/// early returns via `?`.
struct RetriesGuard<'t> {
    transport: &'t mut dyn SnmpTransport,
    original: u32,
}

impl<'t> RetriesGuard<'t> {
    fn new(transport: &'t mut dyn SnmpTransport) -> Self {
        let original = transport.retries();
        transport.set_retries(0);
        RetriesGuard { transport, original }
    }
}

impl Drop for RetriesGuard<'_> {
    fn drop(&mut self) {
        self.transport.set_retries(self.original);
    }
}

/// Single-PDU walk, driven by repeated GET-NEXT. See module docs.
pub async fn walk(transport: &mut dyn SnmpTransport, root: &str) -> Result<Vec<SnmpResult>> {
    let mut cursor = root.to_string();
    let mut previous: Option<String> = None;
    let mut acc = Vec::new();

    loop {
        let response = transport.get_next(&cursor).await?;
        let binding = match response.into_iter().next() {
            Some(b) => b,
            None => break,
        };

        if binding.ty.is_walk_terminator() {
            break;
        }
        if binding.oid == cursor {
            break;
        }
        if !has_prefix(&binding.oid, root) {
            break;
        }
        if Some(&binding.oid) == previous.as_ref() {
            break;
        }

        cursor = binding.oid.clone();
        previous = Some(binding.oid.clone());
        acc.push(to_result(&binding)?);
    }

    Ok(dedup_sort(acc))
}

/// Adaptive bulk walk, driven by GET-BULK with a self-tuning repeat count.
/// Falls back to [`walk`] from the last good cursor if the controller
/// exhausts its backoff range.
pub async fn walk_bulk(
    transport: &mut dyn SnmpTransport,
    root: &str,
    controller: &mut BulkWalkController,
) -> Result<Vec<SnmpResult>> {
    let guard = RetriesGuard::new(transport);
    let transport: &mut dyn SnmpTransport = &mut *guard.transport;

    // Pre-flight: fail fast if the device does not answer at all.
    transport.get_next(root).await?;

    let mut cursor = root.to_string();
    let mut acc: Vec<Binding> = Vec::new();
    let mut exhausted = false;

    loop {
        controller.reassess_upward();

        match transport
            .get_bulk(&cursor, 0, controller.optimal_max_repetitions)
            .await
        {
            Ok(bindings) => {
                controller.record_success();

                let last_raw_is_terminator = bindings
                    .last()
                    .map(|b| b.ty.is_walk_terminator())
                    .unwrap_or(false);

                // Only subtree membership gates the accumulator; whether the
                // walk should stop is decided separately, above, against the
                // unfiltered response. A terminator binding still inside the
                // root subtree is real data and must be kept.
                let filtered: Vec<Binding> = bindings
                    .into_iter()
                    .filter(|b| has_prefix(&b.oid, root))
                    .collect();

                if filtered.is_empty() {
                    break;
                }

                cursor = filtered.last().unwrap().oid.clone();
                acc.extend(filtered);

                if last_raw_is_terminator {
                    break;
                }
            }
            Err(_) => {
                if transport.get_next(&cursor).await.is_err() {
                    exhausted = true;
                    break;
                }
                if !controller.back_off() {
                    exhausted = true;
                    break;
                }
            }
        }
    }

    let mut results: Result<Vec<SnmpResult>> = acc.iter().map(to_result).collect();

    if exhausted {
        let tail = walk(transport, &cursor).await?;
        if let Ok(r) = &mut results {
            r.extend(tail);
        }
    }

    results.map(dedup_sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{RawType, RawValue};
    use crate::transport::{binding, MockTransport};

    fn leaf(oid: &str, value: i64) -> Binding {
        binding(oid, RawType::Integer, RawValue::Int(value))
    }

    fn terminator(oid: &str) -> Binding {
        binding(oid, RawType::EndOfMibView, RawValue::None)
    }

    #[tokio::test]
    async fn single_pdu_walk_stops_at_terminator() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.1", 1)]);
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.2", 2)]);
        mock.push_ok(vec![terminator("1.3.6.1.2.1.1.3")]);

        let results = walk(&mut mock, "1.3.6.1.2.1.1").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].oid().to_string(), ".1.3.6.1.2.1.1.1");
    }

    #[tokio::test]
    async fn single_pdu_walk_stops_when_leaving_subtree() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.1", 1)]);
        mock.push_ok(vec![leaf("1.3.6.1.2.1.2.1", 2)]);

        let results = walk(&mut mock, "1.3.6.1.2.1.1").await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn single_pdu_walk_guards_against_non_advancing_cursor() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1", 0)]);

        let results = walk(&mut mock, "1.3.6.1.2.1.1").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn bulk_walk_filters_overshoot_and_terminates() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.1", 1)]); // pre-flight
        mock.push_ok(vec![
            leaf("1.3.6.1.2.1.1.1", 1),
            leaf("1.3.6.1.2.1.1.2", 2),
            terminator("1.3.6.1.2.1.2.1"),
        ]);

        let mut controller = BulkWalkController::new();
        let results = walk_bulk(&mut mock, "1.3.6.1.2.1.1", &mut controller)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn bulk_walk_accumulates_in_subtree_terminator() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.1", 1)]); // pre-flight
        mock.push_ok(vec![
            leaf("1.3.6.1.2.1.1.1", 1),
            terminator("1.3.6.1.2.1.1.2"),
        ]);

        let mut controller = BulkWalkController::new();
        let results = walk_bulk(&mut mock, "1.3.6.1.2.1.1", &mut controller)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].oid().to_string(), ".1.3.6.1.2.1.1.2");
    }

    #[tokio::test]
    async fn bulk_walk_restores_retries_after_completion() {
        let mut mock = MockTransport::new();
        mock.retries = 3;
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.1", 1)]); // pre-flight
        mock.push_ok(vec![terminator("1.3.6.1.2.1.1.2")]);

        let mut controller = BulkWalkController::new();
        walk_bulk(&mut mock, "1.3.6.1.2.1.1", &mut controller)
            .await
            .unwrap();
        // walk_bulk forces retries to 0 for its own duration; on a clean
        // return the original value must be back in place.
        assert_eq!(mock.retries, 3);
    }

    #[tokio::test]
    async fn bulk_walk_backs_off_then_falls_back_to_single_pdu() {
        let mut mock = MockTransport::new();
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.1", 1)]); // pre-flight

        let mut controller = BulkWalkController::new();
        controller.optimal_max_repetitions = 1;

        // The only GetBulk attempt times out; the confirming GET-NEXT
        // succeeds, optimal_max_repetitions is already at the floor so the
        // loop must fall back to a single-PDU walk.
        mock.push_err(Error::SessionClosed);
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.1", 1)]); // confirm reachability
        mock.push_ok(vec![leaf("1.3.6.1.2.1.1.2", 2)]); // fallback walk step
        mock.push_ok(vec![terminator("1.3.6.1.2.1.1.3")]);

        let results = walk_bulk(&mut mock, "1.3.6.1.2.1.1", &mut controller)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].oid().to_string(), ".1.3.6.1.2.1.1.2");
    }

    #[test]
    fn controller_backs_off_matching_spec_sequence() {
        // 20 -> 15 -> 10 -> 5 -> 4 -> 3 -> 2 -> 1, then refuses.
        let mut c = BulkWalkController::new();
        let expected = [15, 10, 5, 4, 3, 2, 1];
        for want in expected {
            assert!(c.back_off());
            assert_eq!(c.optimal_max_repetitions, want);
        }
        assert!(!c.back_off());
    }

    #[test]
    fn controller_climbs_slowly_below_five() {
        let mut c = BulkWalkController::new();
        c.optimal_max_repetitions = 3;
        c.calls_since_update = c.reassess_call_count;
        c.reassess_upward();
        assert_eq!(c.optimal_max_repetitions, 4);
    }
}
