//! The terminal presentation layer behind `vv validate` and `vv units`.
//!
//! `run_validate` drives a [`ReportSession`] against the configured backend,
//! streams progress to stderr while frames arrive, then prints the final
//! report to stdout, as a table or as JSON.

use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::client::{ClientError, ValidationClient};
use crate::config::Config;
use crate::consumer::ReportState;
use crate::models::{UnitResult, UnitStatus};
use crate::progress::{diff, ProgressMode};
use crate::registry::UnitRegistry;
use crate::scoring::{Tally, Verdict};
use crate::session::{ReportSession, RunOutcome};

/// JSON shape of a report printed with `--json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary<'a> {
    pub query: &'a str,
    pub overall_score: Option<u32>,
    pub verdict: Option<Verdict>,
    pub verdict_label: Option<&'static str>,
    pub tally: Tally,
    pub results: &'a [UnitResult],
}

pub fn summarize(state: &ReportState) -> ReportSummary<'_> {
    let verdict = state.verdict();
    ReportSummary {
        query: state.query(),
        overall_score: state.overall_score(),
        verdict,
        verdict_label: verdict.map(|v| v.label()),
        tally: state.tally(),
        results: state.results(),
    }
}

/// Plain-text report table.
pub fn render_text(state: &ReportState, registry: &UnitRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Query: {}", state.query());
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<24} {:<8} {:>5}  DETAIL", "UNIT", "STATUS", "SCORE");

    for result in state.results() {
        let label = registry
            .find(&result.unit_id)
            .map(|u| u.label.as_str())
            .unwrap_or(result.unit_id.as_str());
        let score = result
            .score()
            .map(|s| format!("{:.0}", s))
            .unwrap_or_else(|| "-".to_string());
        let detail = match result.status {
            UnitStatus::Done => result
                .content
                .as_ref()
                .and_then(|c| c.recommendation.clone().or_else(|| Some(c.summary.clone())))
                .unwrap_or_default(),
            UnitStatus::Error => result.error.clone().unwrap_or_default(),
            UnitStatus::Loading | UnitStatus::Idle => String::new(),
        };
        let _ = writeln!(
            out,
            "{:<24} {:<8} {:>5}  {}",
            label,
            result.status.as_str(),
            score,
            detail
        );
    }

    let tally = state.tally();
    let _ = writeln!(out);
    match (state.overall_score(), state.verdict()) {
        (Some(score), Some(verdict)) => {
            let _ = writeln!(
                out,
                "Overall: {} / 100 ({}), {} of {} units scored",
                score, verdict, tally.done, tally.total
            );
        }
        _ => {
            let _ = writeln!(out, "Overall: unknown (no scored units)");
        }
    }
    out
}

/// `vv validate "<query>"`.
pub async fn run_validate(
    config: &Config,
    query: &str,
    json: bool,
    progress: ProgressMode,
) -> Result<()> {
    let registry = Arc::new(UnitRegistry::builtin());
    let client = ValidationClient::from_config(config)?;
    let session = Arc::new(ReportSession::new(client, Arc::clone(&registry)));

    let reporter = progress.reporter();
    let mut updates = session.subscribe();
    let watcher = tokio::spawn(async move {
        let mut prev = ReportState::default();
        while updates.changed().await.is_ok() {
            let next = updates.borrow_and_update().clone();
            for event in diff(&prev, &next) {
                reporter.report(&event);
            }
            prev = next;
        }
    });

    let canceller = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                session.cancel();
            }
        })
    };

    let result = session.submit(query).await;
    let last = session.snapshot();

    canceller.abort();
    let _ = canceller.await;
    drop(session);
    let _ = watcher.await;

    let state = match result {
        Ok(RunOutcome::Completed(state)) => state,
        Ok(RunOutcome::Cancelled) => {
            eprintln!("Report cancelled.");
            return Ok(());
        }
        Ok(RunOutcome::Duplicate) => bail!("a report for this query is already running"),
        Err(ClientError::Stream(reason)) => {
            print_report(&last, &registry, json)?;
            bail!("report stream failed: {}", reason);
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&state, &registry, json)
}

fn print_report(state: &ReportState, registry: &UnitRegistry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&summarize(state))?);
    } else {
        print!("{}", render_text(state, registry));
    }
    Ok(())
}

/// `vv units`.
pub fn list_units(registry: &UnitRegistry) {
    println!("{:<20} {:<24} {:<16} DESCRIPTION", "ID", "LABEL", "VIZ");
    for unit in registry.units() {
        println!(
            "{:<20} {:<24} {:<16} {}",
            unit.id, unit.label, unit.viz_hint, unit.description
        );
    }
}
