//! Server-side stream dispatcher: fan out every unit, fan in their frames.
//!
//! For one validated query the dispatcher produces a single ordered stream:
//!
//! ```text
//! loading(u1) .. loading(uN)      registry order, before any work starts
//! done|error(ui) ...              completion order, as each settles
//! End                             exactly once, after all N settled
//! ```
//!
//! All resolutions are started on the first poll after the loading frames,
//! so their latencies overlap. Each one is bounded by the unit timeout, and
//! an error, panic, or timeout becomes that unit's error frame without
//! touching its siblings.
//!
//! The stream owns all per-request state. Dropping it (the client went away)
//! drops every in-flight resolution with it.

use futures::future::FutureExt;
use futures::stream::{self, BoxStream, FuturesUnordered, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::models::Frame;
use crate::registry::{UnitDescriptor, UnitRegistry};
use crate::resolver::ContentResolver;

/// Why a query was refused before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query is required")]
    Missing,
    #[error("query must be at least {min} characters after trimming (got {actual})")]
    TooShort { min: usize, actual: usize },
}

/// Trim `raw` and check it has at least `min_chars` characters.
///
/// Length is counted in Unicode scalar values, not bytes.
pub fn validate_query(raw: &str, min_chars: usize) -> Result<&str, QueryError> {
    let trimmed = raw.trim();
    let actual = trimmed.chars().count();
    if actual == 0 {
        return Err(QueryError::Missing);
    }
    if actual < min_chars {
        return Err(QueryError::TooShort {
            min: min_chars,
            actual,
        });
    }
    Ok(trimmed)
}

/// Shared, request-independent dispatcher. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<UnitRegistry>,
    resolver: Arc<dyn ContentResolver>,
    unit_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<UnitRegistry>,
        resolver: Arc<dyn ContentResolver>,
        unit_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            resolver,
            unit_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    /// Frame stream for an already validated query.
    pub fn dispatch(&self, query: &str) -> BoxStream<'static, Frame> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            resolver = self.resolver.name(),
            units = self.registry.len()
        );
        span.in_scope(|| info!(query_chars = query.chars().count(), "dispatch started"));

        let loading: Vec<Frame> = self.registry.ids().map(Frame::loading).collect();

        let query: Arc<str> = Arc::from(query);
        let pending: FuturesUnordered<_> = self
            .registry
            .units()
            .iter()
            .cloned()
            .map(|unit| {
                resolve_unit(
                    Arc::clone(&self.resolver),
                    unit,
                    Arc::clone(&query),
                    self.unit_timeout,
                )
                .instrument(span.clone())
            })
            .collect();

        let mut guard = CompletionGuard {
            span,
            started: Instant::now(),
            finished: false,
        };

        stream::iter(loading)
            .chain(pending)
            .chain(stream::once(async { Frame::End }))
            .map(move |frame| {
                if frame.is_end() {
                    guard.finish();
                }
                frame
            })
            .boxed()
    }
}

async fn resolve_unit(
    resolver: Arc<dyn ContentResolver>,
    unit: UnitDescriptor,
    query: Arc<str>,
    timeout: Duration,
) -> Frame {
    let started = Instant::now();
    let work = AssertUnwindSafe(resolver.resolve(&unit, &query)).catch_unwind();
    let outcome = tokio::time::timeout(timeout, work).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(Ok(content))) => {
            debug!(unit = %unit.id, elapsed_ms, "unit done");
            Frame::done(unit.id, content)
        }
        Ok(Ok(Err(e))) => {
            warn!(unit = %unit.id, elapsed_ms, error = %e, "unit failed");
            Frame::error(unit.id, e.to_string())
        }
        Ok(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            warn!(unit = %unit.id, elapsed_ms, panic = %message, "unit panicked");
            Frame::error(unit.id, format!("unit panicked: {}", message))
        }
        Err(_) => {
            warn!(unit = %unit.id, timeout = ?timeout, "unit timed out");
            Frame::error(unit.id, format!("timed out after {:?}", timeout))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Logs how the request ended once the frame stream goes away.
struct CompletionGuard {
    span: Span,
    started: Instant,
    finished: bool,
}

impl CompletionGuard {
    fn finish(&mut self) {
        self.finished = true;
        let _entered = self.span.enter();
        info!(
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "report complete"
        );
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.finished {
            let _entered = self.span.enter();
            info!(
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "client disconnected; dropping pending units"
            );
        }
    }
}
