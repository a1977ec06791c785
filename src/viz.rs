//! Visualization payloads attached to unit results.
//!
//! A payload is a closed sum type tagged on the wire by `vizType`. Each
//! variant carries only the fields its chart or card needs; the presentation
//! layer dispatches on [`VizPayload::viz_type`].
//!
//! ```json
//! { "vizType": "gauge", "title": "Risk Assessment", "score": 58,
//!   "scoreLabel": "Risk-Adjusted Score", "sublabel": "Moderate risk",
//!   "recommendation": "Hire a sales co-founder." }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The shape a unit prefers to be rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VizType {
    ScoreCard,
    BarChart,
    RadarChart,
    ProgressList,
    TitleCard,
    KpiCard,
    Gauge,
    LineChart,
    StackedBar,
    AreaChart,
    Distribution,
    Scatter,
    Heatmap,
    Donut,
    DataTable,
    EntityList,
    Timeline,
    InsightCallout,
    BarChartHoriz,
}

impl VizType {
    pub const ALL: [VizType; 19] = [
        VizType::ScoreCard,
        VizType::BarChart,
        VizType::RadarChart,
        VizType::ProgressList,
        VizType::TitleCard,
        VizType::KpiCard,
        VizType::Gauge,
        VizType::LineChart,
        VizType::StackedBar,
        VizType::AreaChart,
        VizType::Distribution,
        VizType::Scatter,
        VizType::Heatmap,
        VizType::Donut,
        VizType::DataTable,
        VizType::EntityList,
        VizType::Timeline,
        VizType::InsightCallout,
        VizType::BarChartHoriz,
    ];

    /// Wire name, identical to the `vizType` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            VizType::ScoreCard => "scoreCard",
            VizType::BarChart => "barChart",
            VizType::RadarChart => "radarChart",
            VizType::ProgressList => "progressList",
            VizType::TitleCard => "titleCard",
            VizType::KpiCard => "kpiCard",
            VizType::Gauge => "gauge",
            VizType::LineChart => "lineChart",
            VizType::StackedBar => "stackedBar",
            VizType::AreaChart => "areaChart",
            VizType::Distribution => "distribution",
            VizType::Scatter => "scatter",
            VizType::Heatmap => "heatmap",
            VizType::Donut => "donut",
            VizType::DataTable => "dataTable",
            VizType::EntityList => "entityList",
            VizType::Timeline => "timeline",
            VizType::InsightCallout => "insightCallout",
            VizType::BarChartHoriz => "barChartHoriz",
        }
    }
}

impl fmt::Display for VizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for VizType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VizType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown viz type: '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaDirection {
    Up,
    Down,
    Neutral,
}

// ============ Shared series types ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterItem {
    pub label: String,
    pub value: f64,
    pub max: f64,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarAxis {
    pub axis: String,
    pub value: f64,
    pub full_mark: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XyPoint {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<XyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedBarRow {
    pub name: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub range: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetric {
    pub label: String,
    pub value: String,
    pub delta: String,
    pub delta_direction: DeltaDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    pub row: String,
    pub col: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub role: String,
    pub badge: String,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: String,
    pub label: String,
    pub description: String,
    pub sentiment: Sentiment,
}

// ============ Variant bodies ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    pub title: String,
    pub score: f64,
    pub score_label: String,
    pub items: Vec<MeterItem>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChart {
    pub title: String,
    pub score: f64,
    pub score_label: String,
    pub bars: Vec<NamedValue>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarChart {
    pub title: String,
    pub score: f64,
    pub score_label: String,
    pub axes: Vec<RadarAxis>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressList {
    pub title: String,
    pub score: f64,
    pub score_label: String,
    pub items: Vec<MeterItem>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleCard {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub badge: String,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiCard {
    pub title: String,
    pub metrics: Vec<KpiMetric>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub title: String,
    pub score: f64,
    pub score_label: String,
    pub sublabel: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<Series>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedBar {
    pub title: String,
    pub categories: Vec<String>,
    pub bars: Vec<StackedBarRow>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaChart {
    pub title: String,
    pub x_label: String,
    pub areas: Vec<Series>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub title: String,
    pub x_label: String,
    pub bins: Vec<Bin>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scatter {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub title: String,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub cells: Vec<HeatCell>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donut {
    pub title: String,
    pub slices: Vec<NamedValue>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityList {
    pub title: String,
    pub entities: Vec<Entity>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub title: String,
    pub events: Vec<TimelineEvent>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightCallout {
    pub title: String,
    pub insight: String,
    pub sentiment: Sentiment,
    pub supporting_points: Vec<String>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartHoriz {
    pub title: String,
    pub bars: Vec<NamedValue>,
    pub score: f64,
    pub score_label: String,
    pub recommendation: String,
}

/// A visualization payload, one variant per [`VizType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "vizType", rename_all = "camelCase")]
pub enum VizPayload {
    ScoreCard(ScoreCard),
    BarChart(BarChart),
    RadarChart(RadarChart),
    ProgressList(ProgressList),
    TitleCard(TitleCard),
    KpiCard(KpiCard),
    Gauge(Gauge),
    LineChart(LineChart),
    StackedBar(StackedBar),
    AreaChart(AreaChart),
    Distribution(Distribution),
    Scatter(Scatter),
    Heatmap(Heatmap),
    Donut(Donut),
    DataTable(DataTable),
    EntityList(EntityList),
    Timeline(Timeline),
    InsightCallout(InsightCallout),
    BarChartHoriz(BarChartHoriz),
}

impl VizPayload {
    pub fn viz_type(&self) -> VizType {
        match self {
            VizPayload::ScoreCard(_) => VizType::ScoreCard,
            VizPayload::BarChart(_) => VizType::BarChart,
            VizPayload::RadarChart(_) => VizType::RadarChart,
            VizPayload::ProgressList(_) => VizType::ProgressList,
            VizPayload::TitleCard(_) => VizType::TitleCard,
            VizPayload::KpiCard(_) => VizType::KpiCard,
            VizPayload::Gauge(_) => VizType::Gauge,
            VizPayload::LineChart(_) => VizType::LineChart,
            VizPayload::StackedBar(_) => VizType::StackedBar,
            VizPayload::AreaChart(_) => VizType::AreaChart,
            VizPayload::Distribution(_) => VizType::Distribution,
            VizPayload::Scatter(_) => VizType::Scatter,
            VizPayload::Heatmap(_) => VizType::Heatmap,
            VizPayload::Donut(_) => VizType::Donut,
            VizPayload::DataTable(_) => VizType::DataTable,
            VizPayload::EntityList(_) => VizType::EntityList,
            VizPayload::Timeline(_) => VizType::Timeline,
            VizPayload::InsightCallout(_) => VizType::InsightCallout,
            VizPayload::BarChartHoriz(_) => VizType::BarChartHoriz,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            VizPayload::ScoreCard(v) => &v.title,
            VizPayload::BarChart(v) => &v.title,
            VizPayload::RadarChart(v) => &v.title,
            VizPayload::ProgressList(v) => &v.title,
            VizPayload::TitleCard(v) => &v.title,
            VizPayload::KpiCard(v) => &v.title,
            VizPayload::Gauge(v) => &v.title,
            VizPayload::LineChart(v) => &v.title,
            VizPayload::StackedBar(v) => &v.title,
            VizPayload::AreaChart(v) => &v.title,
            VizPayload::Distribution(v) => &v.title,
            VizPayload::Scatter(v) => &v.title,
            VizPayload::Heatmap(v) => &v.title,
            VizPayload::Donut(v) => &v.title,
            VizPayload::DataTable(v) => &v.title,
            VizPayload::EntityList(v) => &v.title,
            VizPayload::Timeline(v) => &v.title,
            VizPayload::InsightCallout(v) => &v.title,
            VizPayload::BarChartHoriz(v) => &v.title,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            VizPayload::ScoreCard(v) => v.score,
            VizPayload::BarChart(v) => v.score,
            VizPayload::RadarChart(v) => v.score,
            VizPayload::ProgressList(v) => v.score,
            VizPayload::TitleCard(v) => v.score,
            VizPayload::KpiCard(v) => v.score,
            VizPayload::Gauge(v) => v.score,
            VizPayload::LineChart(v) => v.score,
            VizPayload::StackedBar(v) => v.score,
            VizPayload::AreaChart(v) => v.score,
            VizPayload::Distribution(v) => v.score,
            VizPayload::Scatter(v) => v.score,
            VizPayload::Heatmap(v) => v.score,
            VizPayload::Donut(v) => v.score,
            VizPayload::DataTable(v) => v.score,
            VizPayload::EntityList(v) => v.score,
            VizPayload::Timeline(v) => v.score,
            VizPayload::InsightCallout(v) => v.score,
            VizPayload::BarChartHoriz(v) => v.score,
        }
    }
}
