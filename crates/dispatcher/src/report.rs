//! DispatchReport - per-record routing decisions of one dispatch pass

use std::fmt;
use std::time::Duration;

use contracts::MissingField;

/// Why a record was routed to failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The builder could not derive a request from the record
    ConstructionFailed { message: String },
    /// The derived request is structurally invalid
    InvalidRequest(MissingField),
    /// The bulk write for the record's destination failed
    WriteFailed { destination: String, cause: String },
}

impl FailureReason {
    /// Stable label (metrics / JSON output)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConstructionFailed { .. } => "construction_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::WriteFailed { .. } => "write_failed",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstructionFailed { .. } => f.write_str("request construction failed"),
            Self::InvalidRequest(field) => write!(f, "{field}"),
            Self::WriteFailed { destination, cause } => {
                write!(f, "write to '{destination}' failed: {cause}")
            }
        }
    }
}

/// Provenance of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceEvent {
    /// `<scheme>://<destination>/<key>`
    pub transit_uri: String,
    pub destination: String,
    pub key: String,
    pub cell_count: usize,
    /// Human-readable description, e.g. "Put 3 cells to hbase"
    pub details: String,
    /// Submission phase duration, shared by every success of the pass
    pub duration: Duration,
}

impl ProvenanceEvent {
    /// Duration in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Routing decision for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    Success(ProvenanceEvent),
    Failure {
        reason: FailureReason,
        /// Upstream should delay redelivery
        penalize: bool,
    },
}

impl Routing {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::Failure { reason, .. } => Some(reason),
        }
    }

    pub fn provenance(&self) -> Option<&ProvenanceEvent> {
        match self {
            Self::Success(event) => Some(event),
            Self::Failure { .. } => None,
        }
    }

    pub fn is_penalized(&self) -> bool {
        matches!(self, Self::Failure { penalize: true, .. })
    }
}

/// A record with its routing decision
#[derive(Debug, Clone)]
pub struct Routed<R> {
    /// Index of the record in the input batch
    pub position: usize,
    pub record: R,
    pub routing: Routing,
}

/// Aggregate counts for one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub records: usize,
    pub succeeded: usize,
    pub construction_failed: usize,
    pub invalid: usize,
    pub write_failed: usize,
    pub put_calls: usize,
    pub send_duration: Duration,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.construction_failed + self.invalid + self.write_failed
    }
}

/// Output of [`BatchDispatcher::dispatch`](crate::BatchDispatcher::dispatch)
///
/// Entries are in decision order: classification failures first (input
/// order), then each destination group in first-seen order.
#[derive(Debug, Clone)]
pub struct DispatchReport<R> {
    pub(crate) routed: Vec<Routed<R>>,
    pub(crate) put_calls: usize,
    pub(crate) send_duration: Duration,
}

impl<R> DispatchReport<R> {
    pub fn routed(&self) -> &[Routed<R>] {
        &self.routed
    }

    pub fn into_routed(self) -> Vec<Routed<R>> {
        self.routed
    }

    pub fn len(&self) -> usize {
        self.routed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routed.is_empty()
    }

    /// Number of bulk write calls issued
    pub fn put_calls(&self) -> usize {
        self.put_calls
    }

    /// Wall time of the submission phase
    pub fn send_duration(&self) -> Duration {
        self.send_duration
    }

    pub fn successes(&self) -> impl Iterator<Item = &Routed<R>> {
        self.routed.iter().filter(|r| r.routing.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &Routed<R>> {
        self.routed.iter().filter(|r| !r.routing.is_success())
    }

    /// Routing decision for the record at `position` in the input batch
    pub fn routing_at(&self, position: usize) -> Option<&Routing> {
        self.routed
            .iter()
            .find(|r| r.position == position)
            .map(|r| &r.routing)
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            records: self.routed.len(),
            put_calls: self.put_calls,
            send_duration: self.send_duration,
            ..BatchSummary::default()
        };

        for routed in &self.routed {
            match routed.routing.failure_reason() {
                None => summary.succeeded += 1,
                Some(FailureReason::ConstructionFailed { .. }) => summary.construction_failed += 1,
                Some(FailureReason::InvalidRequest(_)) => summary.invalid += 1,
                Some(FailureReason::WriteFailed { .. }) => summary.write_failed += 1,
            }
        }

        summary
    }
}
