//! Report progress reporting for `vv validate`.
//!
//! The CLI watches the session's state snapshots, turns each change into
//! [`ProgressEvent`]s with [`diff`], and hands them to a reporter. Progress is
//! emitted on **stderr** so stdout stays parseable for scripts.

use serde::Serialize;
use std::io::Write;

use crate::consumer::ReportState;
use crate::models::UnitStatus;
use crate::scoring::Verdict;

/// A single progress event for a report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A new query was seeded with every unit loading.
    Started { query: String, total: usize },
    /// One unit reached `done` or `error`.
    Unit {
        unit_id: String,
        status: UnitStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        score: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        settled: usize,
        total: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        overall: Option<u32>,
    },
}

/// Events describing how `next` differs from `prev`.
///
/// A change of query yields `Started` followed by any units already settled
/// in `next`. Units that went back to loading produce no event.
pub fn diff(prev: &ReportState, next: &ReportState) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    let restarted = prev.query() != next.query();
    if restarted && !next.results().is_empty() {
        events.push(ProgressEvent::Started {
            query: next.query().to_string(),
            total: next.results().len(),
        });
    }

    let tally = next.tally();
    let overall = next.overall_score();
    for result in next.results() {
        if !result.status.is_terminal() {
            continue;
        }
        let before = if restarted {
            None
        } else {
            prev.get(&result.unit_id)
        };
        if before == Some(result) {
            continue;
        }
        events.push(ProgressEvent::Unit {
            unit_id: result.unit_id.clone(),
            status: result.status,
            score: result.score(),
            error: result.error.clone(),
            settled: tally.settled(),
            total: tally.total,
            overall,
        });
    }
    events
}

/// Reports report progress. Implementations write to stderr (human or JSON).
pub trait ReportProgress: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Human-friendly progress on stderr: `[3/6] market  done  78  (overall 72, Promising)`.
pub struct StderrProgress;

impl ReportProgress for StderrProgress {
    fn report(&self, event: &ProgressEvent) {
        let line = format_human(event);
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", line);
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ReportProgress for JsonProgress {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ReportProgress for NoProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

pub fn format_human(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Started { query, total } => {
            format!("validating \"{}\" across {} units...", query, total)
        }
        ProgressEvent::Unit {
            unit_id,
            status,
            score,
            error,
            settled,
            total,
            overall,
        } => {
            let width = total.to_string().len();
            let detail = match (status, score, error) {
                (UnitStatus::Error, _, Some(msg)) => msg.clone(),
                (_, Some(s), _) => format!("{:.0}", s),
                _ => "-".to_string(),
            };
            let overall = match overall {
                Some(o) => format!("  (overall {}, {})", o, Verdict::for_score(*o)),
                None => String::new(),
            };
            format!(
                "[{:>w$}/{}] {:<20} {:<5}  {}{}",
                settled,
                total,
                unit_id,
                status.as_str(),
                detail,
                overall,
                w = width
            )
        }
    }
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ReportProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
