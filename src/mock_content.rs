//! Canned model output used by [`MockSource`](crate::resolver::MockSource).
//!
//! Each unit answers the way a chat model would: a sentence of prose, then a
//! fenced JSON block with the report fields, the unit's primary `vizData`,
//! and a `widgets` object keyed by the unit's widget data keys. Widget
//! payloads omit `vizType`; extraction fills it in from the widget table.

use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::extract::widgets_for;

/// Latency used for ids without a simulated latency entry.
const DEFAULT_LATENCY_MS: u64 = 2500;

/// Simulated per-unit latency, mimicking parallel inference calls.
pub fn simulated_latency(unit_id: &str) -> Duration {
    let ms = match unit_id {
        "market" => 1800,
        "competition" => 2600,
        "customer" => 1500,
        "business_model" => 2200,
        "risks" => 2900,
        "gtm" => 2100,
        _ => DEFAULT_LATENCY_MS,
    };
    Duration::from_millis(ms)
}

/// Raw output for `unit_id`. Units without canned data answer with a bare
/// JSON object describing a generic analysis of `query`.
pub fn mock_output(unit_id: &str, query: &str) -> String {
    let Some(mut report) = report_fields(unit_id) else {
        let generic = json!({
            "summary": format!("Analysis complete for: {}", query),
            "bullets": ["Key insight 1", "Key insight 2", "Key insight 3"],
            "tags": ["Analyzed"]
        });
        return generic.to_string();
    };

    let defs = widgets_for(unit_id).unwrap_or(&[]);
    let mut widgets = Map::new();
    for def in defs {
        if let Some(data) = widget_data(def.data_key) {
            widgets.insert(def.data_key.to_string(), data);
        }
    }

    if let Some(primary) = defs.first() {
        if let Some(Value::Object(mut viz)) = widget_data(primary.data_key) {
            viz.insert("vizType".to_string(), json!(primary.viz_type.as_str()));
            report["vizData"] = Value::Object(viz);
        }
    }
    report["widgets"] = Value::Object(widgets);

    format!(
        "Here is the {} analysis for \"{}\".\n\n```json\n{:#}\n```\n",
        unit_id.replace('_', " "),
        query,
        report
    )
}

fn report_fields(unit_id: &str) -> Option<Value> {
    let v = match unit_id {
        "market" => json!({
            "summary": "The market shows strong signals for this problem space with compound annual growth projected in double digits.",
            "score": 78,
            "scoreLabel": "Market Score",
            "bullets": [
                "Global TAM estimated at $12–18B by 2027 based on analogous verticals",
                "Macro tailwinds: AI adoption, remote work, and cost-cutting pressures align",
                "Category is in early-growth phase with low saturation and high fragmentation"
            ],
            "tags": ["High Growth", "Fragmented", "AI Tailwind"],
            "recommendation": "Strong timing. Enter now to establish category position before consolidation."
        }),
        "competition" => json!({
            "summary": "The competitive field has incumbents but no dominant player has locked in the specific niche.",
            "score": 65,
            "scoreLabel": "Differentiation Score",
            "bullets": [
                "3–4 direct competitors with $5M–$50M ARR, none at escape velocity",
                "Key moat opportunity: proprietary data flywheel + network effects",
                "12–18 month window to differentiate before VC-funded rivals scale"
            ],
            "tags": ["Differentiation Possible", "VC Backed Rivals", "Niche Open"],
            "recommendation": "Win on depth and vertical focus."
        }),
        "customer" => json!({
            "summary": "Clear ICP exists with identifiable pain, budget authority, and urgency to act.",
            "score": 82,
            "scoreLabel": "Customer Fit Score",
            "bullets": [
                "Primary ICP: mid-market ops and product teams (50–500 employees)",
                "Budget range $500–$2,000/mo per team, within discretionary spend",
                "Champions are mid-level ICs; economic buyer is VP-level"
            ],
            "tags": ["Defined ICP", "Recurring Pain", "Budget Confirmed"],
            "recommendation": "Start with bottoms-up PLG motion targeting ICs."
        }),
        "business_model" => json!({
            "summary": "SaaS subscription model is the natural fit with strong unit economics potential.",
            "score": 74,
            "scoreLabel": "Model Viability Score",
            "bullets": [
                "Seat-based SaaS: ~$50–150/seat/mo is defensible in this segment",
                "Land-and-expand: initial 3-seat deal grows to 15 seats within 6 months",
                "Gross margins 70–80% achievable once infrastructure costs stabilize"
            ],
            "tags": ["SaaS", "Land & Expand", "High Margin"],
            "recommendation": "Launch with a usage-based free tier."
        }),
        "risks" => json!({
            "summary": "Primary risks are execution-speed and distribution, not market or technical validity.",
            "score": 58,
            "scoreLabel": "Risk-Adjusted Score",
            "bullets": [
                "Execution risk: thin founding team in sales/go-to-market function",
                "Copycat risk: well-funded competitor could replicate MVP in 3–4 months",
                "Regulatory: GDPR/SOC2 compliance required before enterprise deals"
            ],
            "tags": ["Execution Risk", "Moderate Risk", "Mitigatable"],
            "recommendation": "Hire a sales/growth co-founder early."
        }),
        "gtm" => json!({
            "summary": "PLG-led motion with community and content amplification is the optimal launch path.",
            "score": 71,
            "scoreLabel": "GTM Readiness Score",
            "bullets": [
                "Channel 1: Bottom-up PLG with a free tier targeted at indie users",
                "Channel 2: Founder-led content on LinkedIn/Twitter",
                "Channel 3: Integration partnerships with tools in existing workflow"
            ],
            "tags": ["PLG", "Content-Led", "Community"],
            "recommendation": "First 90 days: 50 design partners, 500 waitlist, 1 anchor integration."
        }),
        _ => return None,
    };
    Some(v)
}

/// Visualization payload for one widget data key, without `vizType`.
fn widget_data(data_key: &str) -> Option<Value> {
    let v = match data_key {
        "market_opportunity" => json!({
            "title": "Market Opportunity",
            "score": 78,
            "scoreLabel": "Market Score",
            "items": [
                { "label": "TAM Size", "value": 85, "max": 100, "sentiment": "positive" },
                { "label": "Growth Rate", "value": 80, "max": 100, "sentiment": "positive" },
                { "label": "Timing", "value": 75, "max": 100, "sentiment": "positive" },
                { "label": "Fragmentation", "value": 70, "max": 100, "sentiment": "neutral" }
            ],
            "recommendation": "Enter now before consolidation."
        }),
        "segmentation" => json!({
            "title": "Market Segmentation by Revenue Potential",
            "score": 66,
            "scoreLabel": "Segmentation Clarity Score",
            "categories": ["Year 1", "Year 2", "Year 3"],
            "bars": [
                { "name": "SMB", "segments": [
                    { "label": "Year 1", "value": 120 },
                    { "label": "Year 2", "value": 200 },
                    { "label": "Year 3", "value": 280 }
                ] },
                { "name": "Mid-Market", "segments": [
                    { "label": "Year 1", "value": 80 },
                    { "label": "Year 2", "value": 350 },
                    { "label": "Year 3", "value": 700 }
                ] },
                { "name": "Enterprise", "segments": [
                    { "label": "Year 1", "value": 0 },
                    { "label": "Year 2", "value": 150 },
                    { "label": "Year 3", "value": 600 }
                ] }
            ],
            "recommendation": "Don't chase enterprise in year one; it will dilute focus."
        }),
        "adoption_curve" => json!({
            "title": "Adoption Curve Over Time",
            "score": 64,
            "scoreLabel": "Adoption Curve Score",
            "xLabel": "Month",
            "areas": [
                { "name": "Innovators", "data": [
                    { "x": "M1", "y": 12 }, { "x": "M3", "y": 45 }, { "x": "M6", "y": 80 },
                    { "x": "M9", "y": 95 }, { "x": "M12", "y": 100 }
                ] },
                { "name": "Early Adopters", "data": [
                    { "x": "M1", "y": 0 }, { "x": "M3", "y": 20 }, { "x": "M6", "y": 120 },
                    { "x": "M9", "y": 280 }, { "x": "M12", "y": 420 }
                ] },
                { "name": "Early Majority", "data": [
                    { "x": "M1", "y": 0 }, { "x": "M3", "y": 0 }, { "x": "M6", "y": 15 },
                    { "x": "M9", "y": 80 }, { "x": "M12", "y": 250 }
                ] }
            ],
            "recommendation": "Prioritize case studies to accelerate early majority crossing."
        }),
        "competitive_positioning" => json!({
            "title": "Competitive Positioning",
            "score": 65,
            "scoreLabel": "Differentiation Score",
            "axes": [
                { "axis": "Product Depth", "value": 80, "fullMark": 100 },
                { "axis": "Distribution", "value": 55, "fullMark": 100 },
                { "axis": "Brand", "value": 45, "fullMark": 100 },
                { "axis": "Data Moat", "value": 70, "fullMark": 100 },
                { "axis": "Pricing", "value": 65, "fullMark": 100 },
                { "axis": "Integrations", "value": 60, "fullMark": 100 }
            ],
            "recommendation": "Focus on product depth and data moat."
        }),
        "feature_matrix" => json!({
            "title": "Competitive Feature Matrix",
            "score": 62,
            "scoreLabel": "Positioning Score",
            "rows": ["Incumbent A", "Incumbent B", "Incumbent C", "Your Product"],
            "cols": ["AI Workflows", "Slack Native", "Analytics", "Integrations", "Mobile"],
            "cells": heatmap_cells(),
            "recommendation": "Double down on AI + Slack; that's your differentiation."
        }),
        "customer_fit" => json!({
            "title": "ICP Fit Signals",
            "score": 82,
            "scoreLabel": "Customer Fit Score",
            "items": [
                { "label": "Pain Frequency", "value": 90, "max": 100, "sentiment": "positive" },
                { "label": "Budget Availability", "value": 80, "max": 100, "sentiment": "positive" },
                { "label": "Decision Speed", "value": 75, "max": 100, "sentiment": "positive" },
                { "label": "Switching Cost", "value": 55, "max": 100, "sentiment": "neutral" },
                { "label": "Champion Access", "value": 85, "max": 100, "sentiment": "positive" }
            ],
            "recommendation": "Target mid-market ops teams first."
        }),
        "stakeholders" => json!({
            "title": "Key Stakeholders",
            "score": 69,
            "scoreLabel": "Stakeholder Clarity Score",
            "entities": [
                { "name": "Operations Manager", "role": "Primary Champion", "badge": "Day-1 User", "sentiment": "positive" },
                { "name": "VP Product / Ops", "role": "Economic Buyer", "badge": "Budget Owner", "sentiment": "positive" },
                { "name": "IT / Security Lead", "role": "Compliance Gatekeeper", "badge": "Blocker Risk", "sentiment": "negative" },
                { "name": "External Investors", "role": "Series A Target", "badge": "Follow Growth", "sentiment": "neutral" },
                { "name": "Integration Partners", "role": "Distribution Lever", "badge": "Slack / Notion", "sentiment": "positive" }
            ],
            "recommendation": "Arm champion with business case deck for VP sign-off."
        }),
        "revenue_metrics" => json!({
            "title": "Revenue Model Metrics",
            "score": 74,
            "scoreLabel": "Model Viability Score",
            "bars": [
                { "name": "Gross Margin", "value": 76 },
                { "name": "NRR", "value": 118 },
                { "name": "CAC Payback", "value": 68 },
                { "name": "LTV/CAC", "value": 85 },
                { "name": "Expansion Rev", "value": 72 }
            ],
            "recommendation": "Optimize for expansion revenue early."
        }),
        "unit_economics" => json!({
            "title": "Unit Economics",
            "score": 72,
            "scoreLabel": "Economics Score",
            "metrics": [
                { "label": "Target ACV", "value": "$21K", "delta": "+18% YoY", "deltaDirection": "up" },
                { "label": "Est. CAC", "value": "$4,200", "delta": "-12% w/ PLG", "deltaDirection": "up" },
                { "label": "LTV/CAC", "value": "4.8×", "delta": "+0.6× from v1", "deltaDirection": "up" },
                { "label": "Gross Margin", "value": "74%", "delta": "Stable", "deltaDirection": "neutral" },
                { "label": "Payback Period", "value": "9.6 mo", "delta": "-2.4 mo", "deltaDirection": "up" },
                { "label": "NRR (target)", "value": "118%", "delta": "+8% expansion", "deltaDirection": "up" }
            ],
            "recommendation": "Optimize CAC first; raise ACV after retention is proven."
        }),
        "pricing" => json!({
            "title": "Competitor Price Point Distribution",
            "score": 70,
            "scoreLabel": "Pricing Confidence Score",
            "xLabel": "Price per Seat / Month",
            "bins": [
                { "range": "$0–49", "count": 8 },
                { "range": "$50–99", "count": 14 },
                { "range": "$100–149", "count": 11 },
                { "range": "$150–199", "count": 6 },
                { "range": "$200–249", "count": 3 },
                { "range": "$250+", "count": 2 }
            ],
            "recommendation": "Price at $129 to capture the highest-density band."
        }),
        "financials" => json!({
            "title": "3-Year Financial Projections",
            "score": 67,
            "scoreLabel": "Financial Confidence Score",
            "columns": ["Metric", "Year 1", "Year 2", "Year 3"],
            "rows": [
                { "cells": ["ARR", "$420K", "$1.8M", "$5.2M"] },
                { "cells": ["MRR (EoY)", "$35K", "$150K", "$435K"] },
                { "cells": ["Customers", "28", "110", "310"] },
                { "cells": ["Gross Margin", "72%", "76%", "79%"] },
                { "cells": ["Burn Rate / mo", "$68K", "$52K", "-$50K"] },
                { "cells": ["Headcount", "4", "11", "22"] },
                { "cells": ["Net Income", "-$816K", "-$312K", "+$600K"] }
            ],
            "recommendation": "Keep headcount lean in Y1. Hire sales only after $500K ARR."
        }),
        "risk_assessment" => json!({
            "title": "Risk Assessment",
            "score": 58,
            "scoreLabel": "Risk-Adjusted Score",
            "sublabel": "Moderate risk; execution is the primary concern",
            "recommendation": "Hire a sales co-founder. Build data lock-in in Month 1."
        }),
        "effort_impact" => json!({
            "title": "Effort vs. Impact Matrix",
            "score": 76,
            "scoreLabel": "Prioritization Clarity Score",
            "xLabel": "Implementation Effort",
            "yLabel": "Business Impact",
            "points": [
                { "x": 20, "y": 90, "label": "PLG Onboarding" },
                { "x": 25, "y": 85, "label": "Slack Integration" },
                { "x": 40, "y": 80, "label": "Core Automation" },
                { "x": 35, "y": 75, "label": "Notion Integration" },
                { "x": 70, "y": 88, "label": "AI Engine" },
                { "x": 80, "y": 78, "label": "Enterprise SSO" },
                { "x": 50, "y": 55, "label": "Analytics Dashboard" },
                { "x": 60, "y": 45, "label": "Custom Reports" },
                { "x": 75, "y": 35, "label": "Mobile App" },
                { "x": 30, "y": 40, "label": "Email Digest" }
            ],
            "recommendation": "Start with top-left cluster; defer bottom-right."
        }),
        "key_insight" => json!({
            "title": "Critical Insight",
            "insight": "Distribution is the moat. In this category, the winner will not be the best product but the one that owns a distribution channel. Your go-to-market strategy is as important as your core feature set.",
            "sentiment": "positive",
            "supportingPoints": [
                "3 of 4 category leaders won via a dominant acquisition channel, not product superiority",
                "PLG + one anchor integration can deliver CAC < $800 vs. $4K+ for outbound",
                "Founders who ship distribution features in Month 1 reach $1M ARR 40% faster"
            ],
            "score": 85,
            "scoreLabel": "Insight Confidence Score",
            "recommendation": "Build your distribution flywheel on day one."
        }),
        "roadmap" => json!({
            "title": "Go-to-Market Roadmap",
            "score": 71,
            "scoreLabel": "GTM Readiness Score",
            "events": [
                { "date": "Month 1–2", "label": "Design Partner Program", "description": "Recruit 50 design partners; validate core workflow", "sentiment": "positive" },
                { "date": "Month 3", "label": "Public Beta Launch", "description": "Launch free tier; activate PLG flywheel", "sentiment": "positive" },
                { "date": "Month 4–5", "label": "Content & Community", "description": "Founder-led content; join 10 niche communities", "sentiment": "neutral" },
                { "date": "Month 6", "label": "First Paid Tier", "description": "Convert top design partners; target $10K MRR", "sentiment": "positive" },
                { "date": "Month 9", "label": "Integration Partnerships", "description": "Ship Notion + Slack integrations; unlock new segment", "sentiment": "positive" }
            ],
            "recommendation": "Move fast on design partners; they become first paid customers."
        }),
        "growth_projection" => json!({
            "title": "ARR Growth Projection",
            "score": 68,
            "scoreLabel": "Growth Confidence Score",
            "xLabel": "Month",
            "yLabel": "ARR ($K)",
            "lines": [
                {
                    "name": "Conservative",
                    "data": [
                        { "x": "M1", "y": 0 }, { "x": "M3", "y": 15 }, { "x": "M6", "y": 80 },
                        { "x": "M9", "y": 280 }, { "x": "M12", "y": 650 }, { "x": "M14", "y": 1000 }
                    ]
                },
                {
                    "name": "Aggressive",
                    "data": [
                        { "x": "M1", "y": 0 }, { "x": "M3", "y": 40 }, { "x": "M6", "y": 180 },
                        { "x": "M9", "y": 520 }, { "x": "M10", "y": 1000 }, { "x": "M12", "y": 1600 }
                    ]
                }
            ],
            "recommendation": "Track MoM growth rate weekly; adjust spend if below 12%."
        }),
        "channel_mix" => json!({
            "title": "Acquisition Channel Mix",
            "score": 73,
            "scoreLabel": "Channel Confidence Score",
            "slices": [
                { "name": "Product-Led Growth", "value": 45 },
                { "name": "Content / SEO", "value": 25 },
                { "name": "Community", "value": 15 },
                { "name": "Partnerships", "value": 10 },
                { "name": "Paid Social", "value": 5 }
            ],
            "recommendation": "Invest in PLG loops and content before any paid spend."
        }),
        "product_overview" => json!({
            "title": "Venture Snapshot",
            "description": "A focused B2B SaaS product solving a high-frequency workflow pain for mid-market teams. Strong PMF signals, clear ICP, and achievable MVP scope within a 10-week build cycle.",
            "tags": ["B2B SaaS", "PLG Motion", "Mid-Market", "AI-Powered"],
            "badge": "Strong Signal",
            "score": 80,
            "scoreLabel": "PMF Signal",
            "recommendation": "Ship narrow and deep. Resist scope creep."
        }),
        "feature_priority" => json!({
            "title": "Feature Value vs. Effort Score",
            "score": 75,
            "scoreLabel": "Feature Clarity Score",
            "bars": [
                { "name": "Core Workflow Automation", "value": 95 },
                { "name": "Slack Integration", "value": 82 },
                { "name": "Notion Integration", "value": 78 },
                { "name": "Team Collaboration", "value": 74 },
                { "name": "AI Suggestions", "value": 68 },
                { "name": "Analytics Dashboard", "value": 62 },
                { "name": "Mobile App", "value": 45 },
                { "name": "API Access", "value": 58 }
            ],
            "recommendation": "Build top 4 for MVP; AI and analytics in v1.1."
        }),
        _ => return None,
    };
    Some(v)
}

fn heatmap_cells() -> Value {
    let rows: [(&str, [u32; 5]); 4] = [
        ("Incumbent A", [30, 40, 70, 80, 60]),
        ("Incumbent B", [25, 35, 55, 65, 75]),
        ("Incumbent C", [50, 45, 85, 90, 70]),
        ("Your Product", [90, 85, 60, 70, 40]),
    ];
    let cols = ["AI Workflows", "Slack Native", "Analytics", "Integrations", "Mobile"];

    let cells: Vec<Value> = rows
        .iter()
        .flat_map(|(row, values)| {
            cols.iter()
                .zip(values.iter())
                .map(move |(col, value)| json!({ "row": row, "col": col, "value": value }))
        })
        .collect();
    Value::Array(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_content, extract_json};
    use crate::registry::UnitRegistry;

    #[test]
    fn every_builtin_unit_answers_with_fenced_json() {
        for unit in UnitRegistry::builtin().units() {
            let raw = mock_output(&unit.id, "a query");
            assert!(raw.starts_with("Here is the"), "unit {}", unit.id);
            assert!(raw.contains("```json\n"), "unit {}", unit.id);
            assert!(extract_json(&raw).is_some(), "unit {}", unit.id);
        }
    }

    #[test]
    fn every_widget_data_key_has_a_payload() {
        for unit in UnitRegistry::builtin().units() {
            for def in widgets_for(&unit.id).unwrap() {
                let data = widget_data(def.data_key)
                    .unwrap_or_else(|| panic!("no payload for {}", def.data_key));
                assert!(data.get("vizType").is_none(), "{} carries vizType", def.data_key);
            }
        }
    }

    #[test]
    fn extracted_output_fills_every_widget() {
        for unit in UnitRegistry::builtin().units() {
            let content = extract_content(&unit.id, &mock_output(&unit.id, "a query"));
            let defs = widgets_for(&unit.id).unwrap();
            assert_eq!(content.widgets.len(), defs.len(), "unit {}", unit.id);
            for def in defs {
                assert_eq!(content.widgets[def.id].viz_type(), def.viz_type, "widget {}", def.id);
            }
            let viz = content
                .viz_data
                .as_ref()
                .unwrap_or_else(|| panic!("{} has no vizData", unit.id));
            assert_eq!(viz.viz_type(), unit.viz_hint, "unit {}", unit.id);
            let score = content.score.unwrap();
            assert!((0.0..=100.0).contains(&score), "unit {}", unit.id);
        }
    }

    #[test]
    fn unknown_unit_gets_generic_output() {
        let content = extract_content("moon_base", &mock_output("moon_base", "lunar \"logistics\""));
        assert_eq!(content.summary, "Analysis complete for: lunar \"logistics\"");
        assert_eq!(content.score, None);
        assert_eq!(content.bullets.len(), 3);
        assert_eq!(content.tags, vec!["Analyzed".to_string()]);
    }

    #[test]
    fn heatmap_has_full_grid() {
        assert_eq!(heatmap_cells().as_array().map(|a| a.len()), Some(20));
    }

    #[test]
    fn latency_defaults_for_unknown_ids() {
        assert_eq!(simulated_latency("customer"), Duration::from_millis(1500));
        assert_eq!(simulated_latency("nope"), Duration::from_millis(DEFAULT_LATENCY_MS));
    }
}
