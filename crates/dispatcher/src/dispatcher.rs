//! BatchDispatcher - group, submit and fan out one batch of records
//!
//! One pass: build a request per record, reject invalid ones, group the rest
//! by destination, issue one bulk write per group, then route every record
//! according to its group's outcome.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, error, instrument};

use contracts::{
    ContractError, DispatcherSettings, Record, RequestBuilder, WriteClient, WriteRequest,
};

use crate::observer::DispatchObserver;
use crate::report::{DispatchReport, FailureReason, ProvenanceEvent, Routed, Routing};

/// Valid requests addressed to one destination, with their records
struct Group<R> {
    requests: Vec<WriteRequest>,
    members: Vec<(usize, R)>,
}

impl<R> Group<R> {
    fn new() -> Self {
        Self {
            requests: Vec::new(),
            members: Vec::new(),
        }
    }

    fn push(&mut self, position: usize, record: R, request: WriteRequest) {
        self.requests.push(request);
        self.members.push((position, record));
    }
}

/// Stateless batch dispatcher
///
/// Holds only configuration; every `dispatch` call is independent, so one
/// instance can serve concurrent batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDispatcher {
    scheme: String,
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self::from_settings(&DispatcherSettings::default())
    }
}

impl BatchDispatcher {
    /// Create a dispatcher reporting transit URIs with `scheme`
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }

    pub fn from_settings(settings: &DispatcherSettings) -> Self {
        Self::new(settings.scheme.clone())
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Dispatch one batch
    ///
    /// Never fails: construction errors, invalid requests and bulk write
    /// errors all become failure routings in the report. Write failures carry
    /// the penalize hint; the dispatcher itself never retries.
    #[instrument(
        name = "batch_dispatch",
        skip_all,
        fields(records = records.len(), builder = builder.name(), client = client.name())
    )]
    pub async fn dispatch<R, B, C, O>(
        &self,
        records: Vec<R>,
        builder: &B,
        client: &C,
        observer: &mut O,
    ) -> DispatchReport<R>
    where
        R: Record + Send,
        B: RequestBuilder<R> + ?Sized,
        C: WriteClient + Sync,
        O: DispatchObserver + Send + ?Sized,
    {
        let record_count = records.len();
        let mut routed = Vec::with_capacity(record_count);

        let groups = Self::classify(records, builder, &mut routed, observer);

        debug!(
            records = record_count,
            puts = groups.len(),
            "Sending records in bulk put operations"
        );

        let put_calls = groups.len();
        let (succeeded, send_duration) = Self::submit(groups, client, &mut routed, observer).await;

        debug!(
            succeeded = succeeded.len(),
            send_ms = send_duration.as_millis() as u64,
            "Sent records successfully"
        );

        for (position, record, request) in succeeded {
            let event = self.provenance(&request, send_duration);
            observer.on_provenance(record.record_id(), &event);
            routed.push(Routed {
                position,
                record,
                routing: Routing::Success(event),
            });
        }

        let report = DispatchReport {
            routed,
            put_calls,
            send_duration,
        };
        observer.on_batch(&report.summary());
        report
    }

    /// Build and validate every request; invalid ones are routed to failure
    /// immediately, valid ones grouped by destination in first-seen order.
    fn classify<R, B, O>(
        records: Vec<R>,
        builder: &B,
        routed: &mut Vec<Routed<R>>,
        observer: &mut O,
    ) -> IndexMap<String, Group<R>>
    where
        R: Record,
        B: RequestBuilder<R> + ?Sized,
        O: DispatchObserver + ?Sized,
    {
        let mut groups: IndexMap<String, Group<R>> = IndexMap::new();

        for (position, record) in records.into_iter().enumerate() {
            let request = match builder.build(&record) {
                Ok(request) => request,
                Err(e) => {
                    error!(
                        record_id = record.record_id(),
                        error = %e,
                        "Failed to produce a write request; routing to failure"
                    );
                    let reason = FailureReason::ConstructionFailed {
                        message: e.to_string(),
                    };
                    Self::route_failure(routed, observer, position, record, reason, false);
                    continue;
                }
            };

            if let Some(field) = request.missing_field() {
                error!(
                    record_id = record.record_id(),
                    reason = %field,
                    "Invalid write request; routing to failure"
                );
                let reason = FailureReason::InvalidRequest(field);
                Self::route_failure(routed, observer, position, record, reason, false);
                continue;
            }

            groups
                .entry(request.destination.clone())
                .or_insert_with(Group::new)
                .push(position, record, request);
        }

        groups
    }

    /// Issue one bulk write per group and time the whole phase once
    async fn submit<R, C, O>(
        groups: IndexMap<String, Group<R>>,
        client: &C,
        routed: &mut Vec<Routed<R>>,
        observer: &mut O,
    ) -> (Vec<(usize, R, WriteRequest)>, Duration)
    where
        R: Record + Send,
        C: WriteClient + Sync,
        O: DispatchObserver + Send + ?Sized,
    {
        let start = Instant::now();
        let mut succeeded = Vec::new();

        for (destination, group) in groups {
            let result = client.put(&destination, &group.requests).await;
            observer.on_put(&destination, group.requests.len(), result.is_ok());

            let members = group.members.into_iter().zip(group.requests);
            match result {
                Ok(()) => {
                    succeeded.extend(
                        members.map(|((position, record), request)| (position, record, request)),
                    );
                }
                Err(e) => {
                    error!(destination = %destination, error = %e, "Bulk write failed");
                    let cause = match e {
                        ContractError::WriteFailed { message, .. } => message,
                        other => other.to_string(),
                    };

                    for ((position, record), _request) in members {
                        error!(
                            record_id = record.record_id(),
                            destination = %destination,
                            error = %cause,
                            "Failed to send record; routing to failure"
                        );
                        let reason = FailureReason::WriteFailed {
                            destination: destination.clone(),
                            cause: cause.clone(),
                        };
                        Self::route_failure(routed, observer, position, record, reason, true);
                    }
                }
            }
        }

        (succeeded, start.elapsed())
    }

    fn route_failure<R, O>(
        routed: &mut Vec<Routed<R>>,
        observer: &mut O,
        position: usize,
        record: R,
        reason: FailureReason,
        penalize: bool,
    ) where
        R: Record,
        O: DispatchObserver + ?Sized,
    {
        observer.on_failure(record.record_id(), &reason, penalize);
        routed.push(Routed {
            position,
            record,
            routing: Routing::Failure { reason, penalize },
        });
    }

    fn provenance(&self, request: &WriteRequest, duration: Duration) -> ProvenanceEvent {
        let cell_count = request.cells.len();
        ProvenanceEvent {
            transit_uri: request.transit_uri(&self.scheme),
            destination: request.destination.clone(),
            key: request.key_text(),
            cell_count,
            details: format!("Put {} cells to {}", cell_count, self.scheme),
            duration,
        }
    }
}
