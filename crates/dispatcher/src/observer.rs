//! DispatchObserver - event sink for routing decisions
//!
//! Passed into each dispatch call so the core carries no global reporter.

use crate::report::{BatchSummary, FailureReason, ProvenanceEvent};

/// Receives dispatch events as they are decided
///
/// All methods default to no-ops.
pub trait DispatchObserver {
    /// A record was routed to failure
    fn on_failure(&mut self, _record_id: &str, _reason: &FailureReason, _penalize: bool) {}

    /// A bulk write call completed
    fn on_put(&mut self, _destination: &str, _requests: usize, _ok: bool) {}

    /// A record was written successfully
    fn on_provenance(&mut self, _record_id: &str, _event: &ProvenanceEvent) {}

    /// The dispatch pass finished
    fn on_batch(&mut self, _summary: &BatchSummary) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// Forwards every event to both observers, left first
impl<A, B> DispatchObserver for (A, B)
where
    A: DispatchObserver,
    B: DispatchObserver,
{
    fn on_failure(&mut self, record_id: &str, reason: &FailureReason, penalize: bool) {
        self.0.on_failure(record_id, reason, penalize);
        self.1.on_failure(record_id, reason, penalize);
    }

    fn on_put(&mut self, destination: &str, requests: usize, ok: bool) {
        self.0.on_put(destination, requests, ok);
        self.1.on_put(destination, requests, ok);
    }

    fn on_provenance(&mut self, record_id: &str, event: &ProvenanceEvent) {
        self.0.on_provenance(record_id, event);
        self.1.on_provenance(record_id, event);
    }

    fn on_batch(&mut self, summary: &BatchSummary) {
        self.0.on_batch(summary);
        self.1.on_batch(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Puts(Vec<(String, bool)>);

    impl DispatchObserver for Puts {
        fn on_put(&mut self, destination: &str, _requests: usize, ok: bool) {
            self.0.push((destination.to_string(), ok));
        }
    }

    #[test]
    fn test_pair_forwards_to_both() {
        let mut pair = (Puts::default(), Puts::default());
        pair.on_put("t", 2, false);
        pair.on_batch(&BatchSummary::default());

        assert_eq!(pair.0 .0, vec![("t".to_string(), false)]);
        assert_eq!(pair.1 .0, pair.0 .0);
    }

    #[test]
    fn test_noop_observer_accepts_events() {
        let mut observer = NoopObserver;
        observer.on_put("t", 1, true);
    }
}
