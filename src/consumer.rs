//! Client-side stream consumer.
//!
//! Turns an arbitrarily chunked byte stream back into frames and folds them
//! into a [`ReportState`]:
//!
//! - [`LineBuffer`] reassembles lines across chunk boundaries, including
//!   UTF-8 sequences split between chunks;
//! - [`parse_line`] recognises data lines and decodes their JSON payload;
//! - [`ReportState::apply`] is the last-write-wins reducer;
//! - [`consume`] drives the loop, honouring cancellation between frames.
//!
//! Malformed lines are logged and skipped. A stream that errors or ends
//! before its terminal frame fails every unit still loading.

use futures::{Stream, StreamExt};
use serde::Serialize;
use std::fmt::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::{Frame, UnitResult, UnitStatus, UnitUpdate, STREAM_FAILURE_MESSAGE};
use crate::registry::UnitRegistry;
use crate::scoring::{overall_score, Tally, Verdict};

/// Prefix of an event-stream data line.
pub const DATA_PREFIX: &str = "data:";

/// Accumulates raw bytes and yields complete lines.
///
/// Splitting happens on `\n` before decoding, so a multi-byte character cut
/// in half by the transport is only decoded once both halves have arrived.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and drain every complete line, without terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Take whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(decode_line(&tail))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// What one line of the stream turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Blank, comment, other field, or empty payload.
    Skip,
    Frame(Frame),
    Malformed(String),
}

pub fn parse_line(line: &str) -> Line {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Line::Skip;
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Line::Skip;
    }
    match serde_json::from_str::<Frame>(payload) {
        Ok(frame) => Line::Frame(frame),
        Err(e) => Line::Malformed(e.to_string()),
    }
}

/// Effect of applying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    Ignored,
    Terminal,
}

/// Client-held per-unit state for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportState {
    query: String,
    results: Vec<UnitResult>,
    finished: bool,
}

impl ReportState {
    /// Every registry unit in `loading`, in registry order.
    pub fn seeded(registry: &UnitRegistry, query: &str) -> Self {
        Self {
            query: query.to_string(),
            results: registry.ids().map(UnitResult::loading).collect(),
            finished: false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[UnitResult] {
        &self.results
    }

    pub fn get(&self, unit_id: &str) -> Option<&UnitResult> {
        self.results.iter().find(|r| r.unit_id == unit_id)
    }

    /// Whether the terminal frame has been applied.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fold one frame in. Unit frames overwrite their slot wholesale; unknown
    /// ids and anything after the terminal frame are ignored.
    pub fn apply(&mut self, frame: &Frame) -> Applied {
        if self.finished {
            return Applied::Ignored;
        }

        let (unit_id, update) = match frame {
            Frame::End => {
                self.finished = true;
                return Applied::Terminal;
            }
            Frame::Unit { unit_id, update } => (unit_id, update),
        };

        let Some(slot) = self.results.iter_mut().find(|r| &r.unit_id == unit_id) else {
            return Applied::Ignored;
        };

        slot.status = update.status();
        slot.content = None;
        slot.error = None;
        match update {
            UnitUpdate::Loading => {}
            UnitUpdate::Done(content) => slot.content = Some(content.as_ref().clone()),
            UnitUpdate::Error(message) => slot.error = Some(message.clone()),
        }
        Applied::Updated
    }

    /// Move every unit still loading to `error` with `message`. Returns how
    /// many units changed.
    pub fn fail_pending(&mut self, message: &str) -> usize {
        let mut failed = 0;
        for slot in self
            .results
            .iter_mut()
            .filter(|r| r.status == UnitStatus::Loading)
        {
            slot.status = UnitStatus::Error;
            slot.error = Some(message.to_string());
            failed += 1;
        }
        failed
    }

    pub fn overall_score(&self) -> Option<u32> {
        overall_score(&self.results)
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.overall_score().map(Verdict::for_score)
    }

    pub fn tally(&self) -> Tally {
        Tally::of(&self.results)
    }
}

/// How a consume loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The terminal frame arrived.
    Completed,
    /// The caller cancelled; no further updates were applied.
    Cancelled,
    /// Transport error or end of body before the terminal frame. Pending
    /// units have already been failed.
    Failed(String),
}

/// Drive `body` into `state` until the terminal frame, a failure, or
/// cancellation, calling `on_update` after every applied change.
///
/// Cancellation is checked before every frame, so a chunk that was already
/// in flight when `cancel` fired contributes nothing.
pub async fn consume<S, B, E>(
    body: S,
    state: &mut ReportState,
    cancel: &CancellationToken,
    mut on_update: impl FnMut(&ReportState),
) -> ConsumeOutcome
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut lines = LineBuffer::new();
    let mut malformed = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ConsumeOutcome::Cancelled,
            next = body.next() => next,
        };

        let (batch, eof) = match next {
            Some(Ok(chunk)) => (lines.push(chunk.as_ref()), false),
            Some(Err(e)) => {
                return fail(state, &mut on_update, format!("stream error: {}", e));
            }
            None => (lines.finish().into_iter().collect(), true),
        };

        for line in batch {
            if cancel.is_cancelled() {
                return ConsumeOutcome::Cancelled;
            }
            match parse_line(&line) {
                Line::Skip => {}
                Line::Malformed(reason) => {
                    malformed += 1;
                    warn!(error = %reason, "skipping malformed frame");
                }
                Line::Frame(frame) => match state.apply(&frame) {
                    Applied::Terminal => {
                        on_update(state);
                        debug!(malformed, "stream complete");
                        return ConsumeOutcome::Completed;
                    }
                    Applied::Updated => on_update(state),
                    Applied::Ignored => {
                        debug!(unit = frame.unit_id().unwrap_or(""), "ignoring frame for unknown unit");
                    }
                },
            }
        }

        if eof {
            return fail(
                state,
                &mut on_update,
                "stream ended before the terminal frame".to_string(),
            );
        }
    }
}

fn fail(
    state: &mut ReportState,
    on_update: &mut impl FnMut(&ReportState),
    reason: String,
) -> ConsumeOutcome {
    let failed = state.fail_pending(STREAM_FAILURE_MESSAGE);
    warn!(failed_units = failed, reason = %reason, "stream failed");
    if failed > 0 {
        on_update(state);
    }
    ConsumeOutcome::Failed(reason)
}
