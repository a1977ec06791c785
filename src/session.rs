//! A report session: one live query at a time, observable via `watch`.
//!
//! The session owns the consumer's state for whatever query is current and
//! publishes a snapshot after every applied frame. Presentation code calls
//! [`ReportSession::subscribe`] and re-renders on change.
//!
//! # Runs
//!
//! Each accepted [`submit`](ReportSession::submit) starts a run with its
//! own generation number and cancellation token:
//!
//! - a second `submit` of the query that is already running is a duplicate
//!   and returns [`RunOutcome::Duplicate`] without dispatching;
//! - a different query cancels the running one first;
//! - [`cancel`](ReportSession::cancel) stops the current run, if any.
//!
//! A run publishes only while it is the current generation and not
//! cancelled, checked under the same lock that `cancel` takes, so a frame
//! racing a cancel is dropped rather than shown.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{ClientError, ValidationClient};
use crate::consumer::{consume, ConsumeOutcome, ReportState};
use crate::models::STREAM_FAILURE_MESSAGE;
use crate::registry::UnitRegistry;

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The terminal frame arrived; carries the final state.
    Completed(ReportState),
    /// Cancelled by the caller or superseded by a newer query.
    Cancelled,
    /// The same query was already running; nothing was dispatched.
    Duplicate,
}

struct ActiveRun {
    query: String,
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Latch {
    active: Option<ActiveRun>,
    generation: u64,
}

pub struct ReportSession {
    client: ValidationClient,
    registry: Arc<UnitRegistry>,
    latch: Mutex<Latch>,
    state: watch::Sender<ReportState>,
}

impl ReportSession {
    pub fn new(client: ValidationClient, registry: Arc<UnitRegistry>) -> Self {
        let (state, _) = watch::channel(ReportState::default());
        Self {
            client,
            registry,
            latch: Mutex::new(Latch::default()),
            state,
        }
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ReportState> {
        self.state.subscribe()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ReportState {
        self.state.borrow().clone()
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.latch.lock().active.is_some()
    }

    /// Run one dispatch-and-consume cycle for `query`.
    ///
    /// An invalid query fails before any state changes. Once accepted, every
    /// registry unit is published as `loading` before the request is sent.
    pub async fn submit(&self, query: &str) -> Result<RunOutcome, ClientError> {
        let query = self.client.check_query(query)?.to_string();

        let (generation, cancel) = {
            let mut latch = self.latch.lock();
            if let Some(run) = &latch.active {
                if run.query == query && !run.cancel.is_cancelled() {
                    debug!(generation = run.generation, "duplicate submission suppressed");
                    return Ok(RunOutcome::Duplicate);
                }
                run.cancel.cancel();
            }

            latch.generation += 1;
            let generation = latch.generation;
            let cancel = CancellationToken::new();
            latch.active = Some(ActiveRun {
                query: query.clone(),
                generation,
                cancel: cancel.clone(),
            });
            self.state
                .send_replace(ReportState::seeded(&self.registry, &query));
            (generation, cancel)
        };
        info!(generation, "report run started");

        let result = self.run(generation, &query, &cancel).await;
        self.release(generation);
        result
    }

    async fn run(
        &self,
        generation: u64,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ClientError> {
        let mut state = ReportState::seeded(&self.registry, query);

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(RunOutcome::Cancelled),
            opened = self.client.open(query) => opened,
        };
        let body = match opened {
            Ok(body) => body,
            Err(e) => {
                state.fail_pending(STREAM_FAILURE_MESSAGE);
                self.publish(generation, &state);
                return Err(e);
            }
        };

        let outcome = consume(body, &mut state, cancel, |s| {
            self.publish(generation, s);
        })
        .await;

        match outcome {
            ConsumeOutcome::Completed => {
                let tally = state.tally();
                info!(
                    generation,
                    done = tally.done,
                    error = tally.error,
                    overall = ?state.overall_score(),
                    "report run complete"
                );
                Ok(RunOutcome::Completed(state))
            }
            ConsumeOutcome::Cancelled => {
                info!(generation, "report run cancelled");
                Ok(RunOutcome::Cancelled)
            }
            ConsumeOutcome::Failed(reason) => Err(ClientError::Stream(reason)),
        }
    }

    /// Stop the current run. Idempotent; a no-op when nothing is running.
    pub fn cancel(&self) {
        if let Some(run) = &self.latch.lock().active {
            run.cancel.cancel();
        }
    }

    /// Publish `state` if `generation` is still the live run.
    fn publish(&self, generation: u64, state: &ReportState) -> bool {
        let latch = self.latch.lock();
        match &latch.active {
            Some(run) if run.generation == generation && !run.cancel.is_cancelled() => {
                self.state.send_replace(state.clone());
                true
            }
            _ => false,
        }
    }

    fn release(&self, generation: u64) {
        let mut latch = self.latch.lock();
        if latch
            .active
            .as_ref()
            .is_some_and(|run| run.generation == generation)
        {
            latch.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatch::QueryError;
    use crate::models::UnitStatus;

    fn offline_session() -> ReportSession {
        let mut config = Config::minimal();
        config.client.base_url = "http://127.0.0.1:1".to_string();
        ReportSession::new(
            ValidationClient::from_config(&config).unwrap(),
            Arc::new(UnitRegistry::builtin()),
        )
    }

    #[tokio::test]
    async fn invalid_query_leaves_state_untouched() {
        let session = offline_session();
        let err = session.submit("abcd").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidQuery(QueryError::TooShort { .. })));
        assert!(session.snapshot().results().is_empty());
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn unavailable_backend_fails_every_unit() {
        let session = offline_session();
        let mut rx = session.subscribe();
        let err = session.submit("a tool for indie devs").await.unwrap_err();
        assert!(matches!(err, ClientError::BackendUnavailable(_)));

        let state = rx.borrow_and_update().clone();
        assert_eq!(state.query(), "a tool for indie devs");
        assert_eq!(state.tally().error, UnitRegistry::builtin().len());
        assert!(state
            .results()
            .iter()
            .all(|r| r.status == UnitStatus::Error));
        assert!(!session.is_running());
    }

    #[test]
    fn cancel_without_a_run_is_a_no_op() {
        let session = offline_session();
        session.cancel();
        session.cancel();
        assert!(!session.is_running());
    }
}
