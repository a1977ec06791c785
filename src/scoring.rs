//! Aggregate score and verdict over the consumer's per-unit results.
//!
//! Both functions are pure and cheap; callers recompute them on every state
//! change, so the overall score is meaningful while units are still running.

use serde::Serialize;
use std::fmt;

use crate::models::UnitResult;

/// Rounded mean of the scores of all `done` units that carry one.
///
/// Units that are not done, or done without a score, are left out of both
/// the sum and the count. Returns `None` when no unit qualifies yet.
pub fn overall_score(results: &[UnitResult]) -> Option<u32> {
    let scores: Vec<f64> = results
        .iter()
        .filter_map(UnitResult::score)
        .filter(|s| s.is_finite())
        .collect();
    if scores.is_empty() {
        return None;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(mean.round().clamp(0.0, 100.0) as u32)
}

/// How bad a verdict is; higher is worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Fair,
    Warning,
    Critical,
}

/// Qualitative band for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Strong,
    Promising,
    NeedsWork,
    HighRisk,
}

impl Verdict {
    /// `>= 80` Strong, `>= 65` Promising, `>= 50` Needs Work, else High Risk.
    pub fn for_score(score: u32) -> Self {
        if score >= 80 {
            Verdict::Strong
        } else if score >= 65 {
            Verdict::Promising
        } else if score >= 50 {
            Verdict::NeedsWork
        } else {
            Verdict::HighRisk
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Strong => "Strong",
            Verdict::Promising => "Promising",
            Verdict::NeedsWork => "Needs Work",
            Verdict::HighRisk => "High Risk",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Verdict::Strong => Severity::Good,
            Verdict::Promising => Severity::Fair,
            Verdict::NeedsWork => Severity::Warning,
            Verdict::HighRisk => Severity::Critical,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress counters for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tally {
    pub total: usize,
    pub loading: usize,
    pub done: usize,
    pub error: usize,
}

impl Tally {
    pub fn of(results: &[UnitResult]) -> Self {
        use crate::models::UnitStatus;

        let mut tally = Tally {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            match r.status {
                UnitStatus::Loading => tally.loading += 1,
                UnitStatus::Done => tally.done += 1,
                UnitStatus::Error => tally.error += 1,
                UnitStatus::Idle => {}
            }
        }
        tally
    }

    pub fn settled(&self) -> usize {
        self.done + self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResultContent, UnitStatus};

    fn done(id: &str, score: Option<f64>) -> UnitResult {
        UnitResult {
            unit_id: id.to_string(),
            status: UnitStatus::Done,
            content: Some(ResultContent {
                summary: String::new(),
                score,
                ..Default::default()
            }),
            error: None,
        }
    }

    #[test]
    fn unknown_until_a_scored_unit_is_done() {
        assert_eq!(overall_score(&[]), None);
        let results = vec![
            UnitResult::loading("a"),
            done("b", None),
            UnitResult {
                status: UnitStatus::Error,
                error: Some("boom".into()),
                ..UnitResult::idle("c")
            },
        ];
        assert_eq!(overall_score(&results), None);
    }

    #[test]
    fn partial_mean_ignores_pending_units() {
        let mut results = vec![
            done("market", Some(78.0)),
            done("competition", Some(65.0)),
            UnitResult::loading("customer"),
            UnitResult::loading("risks"),
        ];
        assert_eq!(overall_score(&results), Some(72));

        results[2] = done("customer", Some(82.0));
        // (78 + 65 + 82) / 3 = 75
        assert_eq!(overall_score(&results), Some(75));
    }

    #[test]
    fn rounds_half_up() {
        let results = vec![done("a", Some(70.0)), done("b", Some(71.0))];
        assert_eq!(overall_score(&results), Some(71));
    }

    #[test]
    fn verdict_bands_are_total_and_monotonic() {
        assert_eq!(Verdict::for_score(100), Verdict::Strong);
        assert_eq!(Verdict::for_score(80), Verdict::Strong);
        assert_eq!(Verdict::for_score(79), Verdict::Promising);
        assert_eq!(Verdict::for_score(65), Verdict::Promising);
        assert_eq!(Verdict::for_score(64), Verdict::NeedsWork);
        assert_eq!(Verdict::for_score(50), Verdict::NeedsWork);
        assert_eq!(Verdict::for_score(49), Verdict::HighRisk);
        assert_eq!(Verdict::for_score(0), Verdict::HighRisk);

        let mut prev = Verdict::for_score(0).severity();
        for s in 1..=100 {
            let sev = Verdict::for_score(s).severity();
            assert!(sev <= prev, "score {} got worse", s);
            prev = sev;
        }
    }

    #[test]
    fn tally_counts_statuses() {
        let results = vec![
            done("a", Some(1.0)),
            UnitResult::loading("b"),
            UnitResult::idle("c"),
        ];
        let t = Tally::of(&results);
        assert_eq!((t.total, t.loading, t.done, t.error), (3, 1, 1, 0));
        assert_eq!(t.settled(), 1);
    }
}
