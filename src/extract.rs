//! Structured content recovery from raw model output.
//!
//! Model endpoints rarely return clean JSON. They wrap it in prose, put it in
//! a markdown fence, or give up and answer in plain text. This module does a
//! bounded, best-effort recovery:
//!
//! 1. parse the whole text as a JSON object;
//! 2. else parse the first fenced block (```` ```json ```` or a bare fence);
//! 3. else parse the span between the first `{` and the last `}`;
//! 4. else degrade to a plain-text summary.
//!
//! Extraction never fails. Recovered objects are mapped onto
//! [`ResultContent`], and each unit's widget table pulls per-widget
//! visualization payloads out of the object by data key.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::ResultContent;
use crate::registry::UnitDescriptor;
use crate::resolver::ContentResolver;
use crate::viz::{VizPayload, VizType};

/// Characters of raw text kept as the summary when no JSON is recoverable.
pub const FALLBACK_SUMMARY_CHARS: usize = 300;

/// One widget a unit can fill from its structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetDef {
    pub id: &'static str,
    pub label: &'static str,
    pub viz_type: VizType,
    /// Key under `widgets` (or at top level) holding this widget's data.
    pub data_key: &'static str,
}

const fn widget(
    id: &'static str,
    label: &'static str,
    viz_type: VizType,
    data_key: &'static str,
) -> WidgetDef {
    WidgetDef {
        id,
        label,
        viz_type,
        data_key,
    }
}

const MARKET_WIDGETS: &[WidgetDef] = &[
    widget("market_score", "Market Opportunity", VizType::ScoreCard, "market_opportunity"),
    widget("segments", "Market Segmentation", VizType::StackedBar, "segmentation"),
    widget("adoption", "Adoption Curve", VizType::AreaChart, "adoption_curve"),
];

const COMPETITION_WIDGETS: &[WidgetDef] = &[
    widget("comp_radar", "Competitive Positioning", VizType::RadarChart, "competitive_positioning"),
    widget("comp_matrix", "Feature Matrix", VizType::Heatmap, "feature_matrix"),
];

const CUSTOMER_WIDGETS: &[WidgetDef] = &[
    widget("customer_fit", "ICP Fit Signals", VizType::ProgressList, "customer_fit"),
    widget("stakeholders", "Key Stakeholders", VizType::EntityList, "stakeholders"),
];

const BUSINESS_MODEL_WIDGETS: &[WidgetDef] = &[
    widget("revenue_metrics", "Revenue Model", VizType::BarChart, "revenue_metrics"),
    widget("unit_economics", "Unit Economics", VizType::KpiCard, "unit_economics"),
    widget("pricing", "Pricing Strategy", VizType::Distribution, "pricing"),
    widget("financials", "Financial Projections", VizType::DataTable, "financials"),
];

const RISKS_WIDGETS: &[WidgetDef] = &[
    widget("risk_gauge", "Risk Assessment", VizType::Gauge, "risk_assessment"),
    widget("effort_impact", "Effort vs Impact", VizType::Scatter, "effort_impact"),
    widget("key_insight", "Critical Insight", VizType::InsightCallout, "key_insight"),
];

const GTM_WIDGETS: &[WidgetDef] = &[
    widget("roadmap", "GTM Roadmap", VizType::Timeline, "roadmap"),
    widget("growth", "Growth Projection", VizType::LineChart, "growth_projection"),
    widget("channels", "Channel Mix", VizType::Donut, "channel_mix"),
    widget("product_overview", "Product Overview", VizType::TitleCard, "product_overview"),
    widget("features", "Feature Priority", VizType::BarChartHoriz, "feature_priority"),
];

/// The widget table for `unit_id`, if the unit produces widgets.
pub fn widgets_for(unit_id: &str) -> Option<&'static [WidgetDef]> {
    match unit_id {
        "market" => Some(MARKET_WIDGETS),
        "competition" => Some(COMPETITION_WIDGETS),
        "customer" => Some(CUSTOMER_WIDGETS),
        "business_model" => Some(BUSINESS_MODEL_WIDGETS),
        "risks" => Some(RISKS_WIDGETS),
        "gtm" => Some(GTM_WIDGETS),
        _ => None,
    }
}

/// Recover a JSON object from text that may contain prose or markdown fences.
pub fn extract_json(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();

    if let Some(obj) = parse_object(trimmed) {
        return Some(obj);
    }

    if let Some(obj) = fenced_block(trimmed).and_then(parse_object) {
        return Some(obj);
    }

    let first = trimmed.find('{')?;
    let last = trimmed.rfind('}')?;
    if last > first {
        return parse_object(&trimmed[first..=last]);
    }
    None
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Body of the first fenced block. The opening fence may carry a `json`
/// language tag and must end its line.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);

    let newline = after.find('\n')?;
    if !after[..newline].trim().is_empty() {
        return None;
    }

    let body = &after[newline + 1..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Parse a unit's raw output into content with its widgets filled.
///
/// Returns `None` for units without a widget table. Text with no
/// recoverable JSON degrades to a summary of its first
/// [`FALLBACK_SUMMARY_CHARS`] characters.
pub fn parse_unit_output(unit_id: &str, raw: &str) -> Option<ResultContent> {
    let widgets = widgets_for(unit_id)?;
    Some(content_from_raw(unit_id, raw, widgets))
}

/// Like [`parse_unit_output`] but total: units without a widget table still
/// get their top-level fields mapped.
pub fn extract_content(unit_id: &str, raw: &str) -> ResultContent {
    content_from_raw(unit_id, raw, widgets_for(unit_id).unwrap_or(&[]))
}

fn content_from_raw(unit_id: &str, raw: &str, widgets: &[WidgetDef]) -> ResultContent {
    match extract_json(raw) {
        Some(obj) => content_from_object(unit_id, &obj, widgets),
        None => {
            debug!(unit = unit_id, "no JSON recoverable from output; using plain text");
            ResultContent {
                summary: raw.chars().take(FALLBACK_SUMMARY_CHARS).collect(),
                ..Default::default()
            }
        }
    }
}

fn content_from_object(
    unit_id: &str,
    obj: &Map<String, Value>,
    widgets: &[WidgetDef],
) -> ResultContent {
    let mut content = ResultContent {
        summary: string_field(obj, "summary").unwrap_or_default(),
        score: obj.get("score").and_then(Value::as_f64),
        score_label: string_field(obj, "score_label").or_else(|| string_field(obj, "scoreLabel")),
        bullets: string_list(obj, "bullets"),
        tags: string_list(obj, "tags"),
        recommendation: string_field(obj, "recommendation"),
        viz_data: obj
            .get("vizData")
            .and_then(|v| serde_json::from_value::<VizPayload>(v.clone()).ok()),
        ..Default::default()
    };

    let source = obj
        .get("widgets")
        .and_then(Value::as_object)
        .unwrap_or(obj);

    for def in widgets {
        let Some(Value::Object(data)) = source.get(def.data_key) else {
            continue;
        };
        let mut data = data.clone();
        data.entry("vizType")
            .or_insert_with(|| Value::String(def.viz_type.as_str().to_string()));

        match serde_json::from_value::<VizPayload>(Value::Object(data)) {
            Ok(payload) => {
                content.widgets.insert(def.id.to_string(), payload);
            }
            Err(e) => {
                debug!(unit = unit_id, widget = def.id, error = %e, "skipping malformed widget");
            }
        }
    }

    content
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// A source of unstructured unit output, such as a model endpoint.
#[async_trait]
pub trait RawOutputSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, unit: &UnitDescriptor, query: &str) -> Result<String>;
}

/// Adapts a [`RawOutputSource`] into a [`ContentResolver`].
///
/// Only the source's own errors surface; unparseable text becomes a
/// plain-text summary.
pub struct ExtractingResolver<S> {
    source: S,
}

impl<S: RawOutputSource> ExtractingResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: RawOutputSource> ContentResolver for ExtractingResolver<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn resolve(&self, unit: &UnitDescriptor, query: &str) -> Result<ResultContent> {
        let raw = self.source.fetch(unit, query).await?;
        Ok(extract_content(&unit.id, &raw))
    }
}
