//! Content resolvers: the per-unit work the dispatcher fans out.
//!
//! A [`ContentResolver`] turns `(unit, query)` into one [`ResultContent`].
//! It may be slow but must eventually settle; the dispatcher bounds every
//! call with a timeout and converts failures into that unit's error frame,
//! so implementations simply return `Err` on failure.
//!
//! The crate ships [`ExtractingResolver`](crate::extract::ExtractingResolver),
//! which wraps a raw text source (e.g. a model endpoint) and recovers
//! structured content from prose-wrapped JSON. [`MockResolver`] is that
//! resolver over [`MockSource`], canned model output with simulated latency.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use anyhow::Result;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::extract::{ExtractingResolver, RawOutputSource};
use crate::mock_content::{mock_output, simulated_latency};
use crate::models::ResultContent;
use crate::registry::UnitDescriptor;

/// Produces one unit's analysis for a query.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Resolve `unit` for `query`. Must be total over registry units.
    async fn resolve(&self, unit: &UnitDescriptor, query: &str) -> Result<ResultContent>;
}

/// Canned model output with per-unit simulated latency.
#[derive(Debug, Clone)]
pub struct MockSource {
    latency_scale: f64,
}

impl MockSource {
    pub fn new(latency_scale: f64) -> Self {
        Self {
            latency_scale: latency_scale.max(0.0),
        }
    }

    pub fn latency_for(&self, unit_id: &str) -> Duration {
        simulated_latency(unit_id).mul_f64(self.latency_scale)
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl RawOutputSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, unit: &UnitDescriptor, query: &str) -> Result<String> {
        let delay = self.latency_for(&unit.id);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(mock_output(&unit.id, query))
    }
}

/// The mock source behind widget extraction, as served by `vv serve`.
pub type MockResolver = ExtractingResolver<MockSource>;

impl MockResolver {
    pub fn with_latency_scale(latency_scale: f64) -> Self {
        ExtractingResolver::new(MockSource::new(latency_scale))
    }

    /// A resolver that answers immediately.
    pub fn instant() -> Self {
        Self::with_latency_scale(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::VizType;

    #[test]
    fn latency_scales() {
        assert_eq!(
            MockSource::new(0.5).latency_for("customer"),
            Duration::from_millis(750)
        );
        assert_eq!(MockSource::new(0.0).latency_for("customer"), Duration::ZERO);
        assert_eq!(MockSource::new(-3.0).latency_for("market"), Duration::ZERO);
    }

    #[tokio::test]
    async fn resolves_known_and_unknown_units() {
        let r = MockResolver::instant();
        assert_eq!(r.name(), "mock");
        let market = UnitDescriptor::new("market", "Market", "", VizType::ScoreCard);
        let content = r.resolve(&market, "indie game tools").await.unwrap();
        assert_eq!(content.score, Some(78.0));
        assert_eq!(content.widgets.len(), 3);
        assert_eq!(content.widgets["segments"].viz_type(), VizType::StackedBar);

        let other = UnitDescriptor::new("weather", "Weather", "", VizType::Gauge);
        let content = r.resolve(&other, "indie game tools").await.unwrap();
        assert!(content.summary.ends_with("indie game tools"));
        assert!(content.widgets.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_simulated_latency() {
        let r = MockResolver::with_latency_scale(1.0);
        let unit = UnitDescriptor::new("risks", "Risks", "", VizType::Gauge);
        let start = tokio::time::Instant::now();
        r.resolve(&unit, "query").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(2900));
    }
}
