//! Core data models shared by the dispatcher and the consumer.
//!
//! [`ResultContent`] is what a unit produces, [`UnitResult`] is the
//! consumer's per-unit slot, and [`Frame`] is one message on the wire.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::viz::VizPayload;

/// Generic message applied to units that never completed because the stream failed.
pub const STREAM_FAILURE_MESSAGE: &str = "Analysis failed";

/// Lifecycle of one unit within a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Idle,
    Loading,
    Done,
    Error,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Idle => "idle",
            UnitStatus::Loading => "loading",
            UnitStatus::Done => "done",
            UnitStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitStatus::Done | UnitStatus::Error)
    }
}

/// One unit's finished analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResultContent {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_label: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viz_data: Option<VizPayload>,
    /// Per-widget payloads keyed by widget id, filled by output extraction.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub widgets: BTreeMap<String, VizPayload>,
}

/// The consumer's view of one unit.
///
/// `content` is present only when `status` is `Done`; `error` only when it is `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitResult {
    pub unit_id: String,
    pub status: UnitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitResult {
    pub fn idle(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            status: UnitStatus::Idle,
            content: None,
            error: None,
        }
    }

    pub fn loading(unit_id: impl Into<String>) -> Self {
        Self {
            status: UnitStatus::Loading,
            ..Self::idle(unit_id)
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self.status {
            UnitStatus::Done => self.content.as_ref().and_then(|c| c.score),
            _ => None,
        }
    }
}

/// The state change a unit frame carries.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitUpdate {
    Loading,
    Done(Box<ResultContent>),
    Error(String),
}

impl UnitUpdate {
    pub fn status(&self) -> UnitStatus {
        match self {
            UnitUpdate::Loading => UnitStatus::Loading,
            UnitUpdate::Done(_) => UnitStatus::Done,
            UnitUpdate::Error(_) => UnitStatus::Error,
        }
    }
}

/// One message of the event stream.
///
/// On the wire a frame is a flat JSON object:
///
/// ```json
/// {"unitId": "market", "status": "loading"}
/// {"unitId": "market", "status": "done", "content": {...}}
/// {"unitId": "market", "status": "error", "error": "timed out"}
/// {"type": "done"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireFrame", try_from = "WireFrame")]
pub enum Frame {
    Unit { unit_id: String, update: UnitUpdate },
    End,
}

impl Frame {
    pub fn loading(unit_id: impl Into<String>) -> Self {
        Frame::Unit {
            unit_id: unit_id.into(),
            update: UnitUpdate::Loading,
        }
    }

    pub fn done(unit_id: impl Into<String>, content: ResultContent) -> Self {
        Frame::Unit {
            unit_id: unit_id.into(),
            update: UnitUpdate::Done(Box::new(content)),
        }
    }

    pub fn error(unit_id: impl Into<String>, message: impl Into<String>) -> Self {
        Frame::Unit {
            unit_id: unit_id.into(),
            update: UnitUpdate::Error(message.into()),
        }
    }

    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Frame::Unit { unit_id, .. } => Some(unit_id),
            Frame::End => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Frame::End)
    }
}

/// Terminal marker value of the `type` field.
const END_TYPE: &str = "done";

/// Flat wire representation of a [`Frame`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFrame {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<UnitStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<ResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<Frame> for WireFrame {
    fn from(frame: Frame) -> Self {
        let mut wire = WireFrame {
            kind: None,
            unit_id: None,
            status: None,
            content: None,
            error: None,
        };
        match frame {
            Frame::End => wire.kind = Some(END_TYPE.to_string()),
            Frame::Unit { unit_id, update } => {
                wire.unit_id = Some(unit_id);
                wire.status = Some(update.status());
                match update {
                    UnitUpdate::Loading => {}
                    UnitUpdate::Done(content) => wire.content = Some(*content),
                    UnitUpdate::Error(message) => wire.error = Some(message),
                }
            }
        }
        wire
    }
}

impl TryFrom<WireFrame> for Frame {
    type Error = String;

    fn try_from(wire: WireFrame) -> Result<Self, Self::Error> {
        if wire.kind.as_deref() == Some(END_TYPE) {
            return Ok(Frame::End);
        }

        let unit_id = match wire.unit_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err("frame has neither a terminal type nor a unitId".to_string()),
        };

        let update = match wire.status {
            Some(UnitStatus::Loading) => UnitUpdate::Loading,
            Some(UnitStatus::Done) => match wire.content {
                Some(content) => UnitUpdate::Done(Box::new(content)),
                None => return Err(format!("done frame for '{}' has no content", unit_id)),
            },
            Some(UnitStatus::Error) => UnitUpdate::Error(
                wire.error
                    .unwrap_or_else(|| STREAM_FAILURE_MESSAGE.to_string()),
            ),
            Some(UnitStatus::Idle) | None => {
                return Err(format!("frame for '{}' has no usable status", unit_id))
            }
        };

        Ok(Frame::Unit { unit_id, update })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loading_frame_wire_shape() {
        let v = serde_json::to_value(Frame::loading("market")).unwrap();
        assert_eq!(v, json!({"unitId": "market", "status": "loading"}));
    }

    #[test]
    fn terminal_frame_wire_shape() {
        let v = serde_json::to_value(Frame::End).unwrap();
        assert_eq!(v, json!({"type": "done"}));
        let back: Frame = serde_json::from_value(v).unwrap();
        assert!(back.is_end());
    }

    #[test]
    fn error_frame_carries_message() {
        let v = serde_json::to_value(Frame::error("risks", "timed out")).unwrap();
        assert_eq!(
            v,
            json!({"unitId": "risks", "status": "error", "error": "timed out"})
        );
    }

    #[test]
    fn done_frame_parses_content() {
        let frame: Frame = serde_json::from_value(json!({
            "unitId": "market",
            "status": "done",
            "content": {
                "summary": "Strong market",
                "score": 78,
                "scoreLabel": "Market Score",
                "bullets": ["a", "b"],
                "tags": ["High Growth"]
            }
        }))
        .unwrap();
        match frame {
            Frame::Unit {
                unit_id,
                update: UnitUpdate::Done(content),
            } => {
                assert_eq!(unit_id, "market");
                assert_eq!(content.score, Some(78.0));
                assert_eq!(content.score_label.as_deref(), Some("Market Score"));
                assert_eq!(content.bullets.len(), 2);
                assert!(content.viz_data.is_none());
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn done_without_content_is_rejected() {
        let r = serde_json::from_value::<Frame>(json!({"unitId": "market", "status": "done"}));
        assert!(r.is_err());
    }

    #[test]
    fn error_without_message_gets_generic_text() {
        let frame: Frame =
            serde_json::from_value(json!({"unitId": "market", "status": "error"})).unwrap();
        assert_eq!(frame, Frame::error("market", STREAM_FAILURE_MESSAGE));
    }

    #[test]
    fn unknown_status_and_missing_id_are_rejected() {
        assert!(serde_json::from_value::<Frame>(json!({"unitId": "x", "status": "paused"})).is_err());
        assert!(serde_json::from_value::<Frame>(json!({"status": "loading"})).is_err());
        assert!(serde_json::from_value::<Frame>(json!({"type": "ping"})).is_err());
    }

    #[test]
    fn unit_result_score_requires_done() {
        let mut r = UnitResult::loading("market");
        assert_eq!(r.score(), None);
        r.status = UnitStatus::Done;
        r.content = Some(ResultContent {
            summary: "ok".into(),
            score: Some(70.0),
            ..Default::default()
        });
        assert_eq!(r.score(), Some(70.0));
    }
}
