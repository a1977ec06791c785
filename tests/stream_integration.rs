//! End-to-end tests over HTTP.
//!
//! Each test starts a real server on a free port and talks to it with
//! reqwest or with a [`ReportSession`], so frames travel the same path they
//! do in production: dispatcher, SSE encoding, chunked transfer, line
//! buffering, reducer.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use venture_validator::client::ValidationClient;
use venture_validator::config::Config;
use venture_validator::consumer::{parse_line, Line};
use venture_validator::extract::widgets_for;
use venture_validator::models::{Frame, ResultContent, UnitStatus, UnitUpdate};
use venture_validator::registry::{UnitDescriptor, UnitRegistry};
use venture_validator::resolver::{ContentResolver, MockResolver};
use venture_validator::server::{run_server, run_server_with_resolver};
use venture_validator::session::{ReportSession, RunOutcome};
use venture_validator::viz::VizType;

const IDEA: &str = "A tool that helps indie game devs monetize their Discord communities";

// ─── Test Resolver ──────────────────────────────────────────────────

/// Fails one unit, sleeps on another, answers the rest immediately.
struct FlakyResolver {
    failing: &'static str,
    slow: &'static str,
    delay: Duration,
}

#[async_trait]
impl ContentResolver for FlakyResolver {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn resolve(&self, unit: &UnitDescriptor, _query: &str) -> Result<ResultContent> {
        if unit.id == self.failing {
            bail!("upstream model refused");
        }
        if unit.id == self.slow {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ResultContent {
            summary: format!("{} looks fine", unit.label),
            score: Some(70.0),
            ..Default::default()
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(port: u16, latency_scale: f64) -> Config {
    let config_content = format!(
        r#"
[server]
bind = "127.0.0.1:{port}"

[stream]
min_query_chars = 5
unit_timeout_secs = 5
latency_scale = {latency_scale:?}

[client]
base_url = "http://127.0.0.1:{port}"
connect_timeout_secs = 2
"#
    );
    toml::from_str(&config_content).unwrap()
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start_mock_server(latency_scale: f64) -> (Config, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let cfg = test_config(port, latency_scale);
    let server_cfg = cfg.clone();
    let handle = tokio::spawn(async move {
        run_server(&server_cfg).await.unwrap();
    });
    wait_for_server(port).await;
    (cfg, handle)
}

async fn post_validate(cfg: &Config, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/validate", cfg.client.base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
}

/// Every frame of a complete response body, in arrival order.
fn frames_of(body: &str) -> Vec<Frame> {
    body.lines()
        .filter_map(|line| match parse_line(line) {
            Line::Frame(frame) => Some(frame),
            Line::Skip => None,
            Line::Malformed(raw) => panic!("server sent malformed frame: {}", raw),
        })
        .collect()
}

// ─── Request validation ─────────────────────────────────────────────

#[tokio::test]
async fn test_short_query_is_rejected() {
    let (cfg, handle) = start_mock_server(0.0).await;

    let resp = post_validate(&cfg, json!({ "query": "abcd" })).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "bad_request");
    assert!(body["error"].as_str().unwrap().contains("at least 5"));

    // Whitespace does not count toward the minimum
    let resp = post_validate(&cfg, json!({ "query": "   abcd   " })).await;
    assert_eq!(resp.status().as_u16(), 400);

    handle.abort();
}

#[tokio::test]
async fn test_missing_or_non_string_query_is_rejected() {
    let (cfg, handle) = start_mock_server(0.0).await;

    for body in [json!({}), json!({ "query": 42 }), json!({ "query": null })] {
        let resp = post_validate(&cfg, body.clone()).await;
        assert_eq!(resp.status().as_u16(), 400, "body {} should be rejected", body);
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["code"], "bad_request");
    }

    let resp = reqwest::Client::new()
        .post(format!("{}/api/validate", cfg.client.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    handle.abort();
}

#[tokio::test]
async fn test_boundary_query_opens_event_stream() {
    let (cfg, handle) = start_mock_server(0.0).await;

    let resp = post_validate(&cfg, json!({ "query": "abcde" })).await;
    assert_eq!(resp.status().as_u16(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"));
    let cache = resp.headers()["cache-control"].to_str().unwrap().to_string();
    assert!(cache.contains("no-cache"));

    let frames = frames_of(&resp.text().await.unwrap());
    assert!(frames.last().unwrap().is_end());

    handle.abort();
}

// ─── Frame ordering ─────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_order_loading_then_results_then_end() {
    let (cfg, handle) = start_mock_server(0.0).await;
    let n = UnitRegistry::builtin().len();

    let resp = post_validate(&cfg, json!({ "query": IDEA })).await;
    let frames = frames_of(&resp.text().await.unwrap());
    assert_eq!(frames.len(), 2 * n + 1);

    for frame in &frames[..n] {
        assert!(
            matches!(frame, Frame::Unit { update: UnitUpdate::Loading, .. }),
            "expected loading frame, got {:?}",
            frame
        );
    }

    let mut settled: Vec<&str> = frames[n..2 * n]
        .iter()
        .map(|f| match f {
            Frame::Unit {
                unit_id,
                update: UnitUpdate::Done(_) | UnitUpdate::Error(_),
            } => unit_id.as_str(),
            other => panic!("expected a result frame, got {:?}", other),
        })
        .collect();
    settled.sort_unstable();
    let registry = UnitRegistry::builtin();
    let mut ids: Vec<&str> = registry.ids().collect();
    ids.sort_unstable();
    assert_eq!(settled, ids, "each unit settles exactly once");

    assert!(frames[2 * n].is_end());
    assert_eq!(frames.iter().filter(|f| f.is_end()).count(), 1);

    handle.abort();
}

#[tokio::test]
async fn test_failing_unit_does_not_block_the_others() {
    let port = find_free_port();
    let cfg = test_config(port, 0.0);
    let server_cfg = cfg.clone();
    let handle = tokio::spawn(async move {
        let resolver = Arc::new(FlakyResolver {
            failing: "risks",
            slow: "market",
            delay: Duration::from_millis(300),
        });
        run_server_with_resolver(&server_cfg, resolver).await.unwrap();
    });
    wait_for_server(port).await;

    let resp = post_validate(&cfg, json!({ "query": IDEA })).await;
    let frames = frames_of(&resp.text().await.unwrap());
    let n = UnitRegistry::builtin().len();
    let results = &frames[n..2 * n];

    let failed = results
        .iter()
        .find(|f| f.unit_id() == Some("risks"))
        .unwrap();
    match failed {
        Frame::Unit {
            update: UnitUpdate::Error(message),
            ..
        } => assert!(message.contains("upstream model refused")),
        other => panic!("expected error frame, got {:?}", other),
    }

    // The slow unit settles last
    assert_eq!(results.last().unwrap().unit_id(), Some("market"));
    assert!(frames.last().unwrap().is_end());

    handle.abort();
}

#[tokio::test]
async fn test_done_frames_carry_extracted_widgets() {
    let (cfg, handle) = start_mock_server(0.0).await;

    let resp = post_validate(&cfg, json!({ "query": IDEA })).await;
    let frames = frames_of(&resp.text().await.unwrap());

    let mut done = 0;
    for frame in &frames {
        let (unit_id, content) = match frame {
            Frame::Unit {
                unit_id,
                update: UnitUpdate::Done(content),
            } => (unit_id.as_str(), content),
            _ => continue,
        };
        done += 1;

        let defs = widgets_for(unit_id).unwrap();
        assert_eq!(content.widgets.len(), defs.len(), "widgets for {}", unit_id);
        for def in defs {
            let payload = content
                .widgets
                .get(def.id)
                .unwrap_or_else(|| panic!("{} is missing widget {}", unit_id, def.id));
            assert_eq!(payload.viz_type(), def.viz_type);
        }
        // The preamble before the fenced block never leaks into the summary
        assert!(!content.summary.starts_with("Here is"));
        assert!(content.score.is_some());
    }
    assert_eq!(done, UnitRegistry::builtin().len());

    let market = frames
        .iter()
        .find_map(|f| match f {
            Frame::Unit {
                unit_id,
                update: UnitUpdate::Done(content),
            } if unit_id == "market" => Some(content),
            _ => None,
        })
        .unwrap();
    assert_eq!(market.widgets["segments"].viz_type(), VizType::StackedBar);

    handle.abort();
}

// ─── Registry and health ────────────────────────────────────────────

#[tokio::test]
async fn test_units_and_health_endpoints() {
    let (cfg, handle) = start_mock_server(0.0).await;
    let client = reqwest::Client::new();

    let units: Value = client
        .get(format!("{}/api/units", cfg.client.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let units = units["units"].as_array().unwrap();
    assert_eq!(units.len(), UnitRegistry::builtin().len());
    assert_eq!(units[0]["id"], "market");
    assert!(units[0]["vizHint"].is_string());

    let health: Value = client
        .get(format!("{}/health", cfg.client.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    handle.abort();
}

// ─── Session over HTTP ──────────────────────────────────────────────

fn session_for(cfg: &Config) -> Arc<ReportSession> {
    Arc::new(ReportSession::new(
        ValidationClient::from_config(cfg).unwrap(),
        Arc::new(UnitRegistry::builtin()),
    ))
}

#[tokio::test]
async fn test_session_completes_with_every_unit() {
    let (cfg, handle) = start_mock_server(0.0).await;
    let session = session_for(&cfg);

    let state = match session.submit(IDEA).await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("expected completion, got {:?}", other),
    };
    assert!(state.is_finished());
    assert_eq!(state.query(), IDEA);
    assert_eq!(state.results().len(), UnitRegistry::builtin().len());
    assert!(state.results().iter().all(|r| r.status == UnitStatus::Done));
    assert!(state.overall_score().is_some());
    assert!(state.verdict().is_some());
    assert_eq!(session.snapshot(), state);
    assert!(!session.is_running());

    handle.abort();
}

#[tokio::test]
async fn test_duplicate_submit_is_suppressed_while_running() {
    // Real latencies keep the first run open long enough to collide with.
    let (cfg, handle) = start_mock_server(0.2).await;
    let session = session_for(&cfg);

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit(IDEA).await })
    };
    while !session.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(session.submit(IDEA).await.unwrap(), RunOutcome::Duplicate);

    match first.await.unwrap().unwrap() {
        RunOutcome::Completed(state) => {
            assert_eq!(state.results().len(), UnitRegistry::builtin().len())
        }
        other => panic!("expected completion, got {:?}", other),
    }

    // Once the first run has finished the same query may run again
    assert!(matches!(
        session.submit(IDEA).await.unwrap(),
        RunOutcome::Completed(_)
    ));

    handle.abort();
}

#[tokio::test]
async fn test_cancel_stops_the_run_and_freezes_state() {
    let (cfg, handle) = start_mock_server(1.0).await;
    let session = session_for(&cfg);
    let mut updates = session.subscribe();

    let run = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit(IDEA).await })
    };

    // Wait for the seeded snapshot, then cancel before any unit settles
    updates.changed().await.unwrap();
    session.cancel();

    assert_eq!(run.await.unwrap().unwrap(), RunOutcome::Cancelled);
    let frozen = session.snapshot();
    assert!(!frozen.is_finished());
    assert!(!session.is_running());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(session.snapshot(), frozen);

    handle.abort();
}

#[tokio::test]
async fn test_new_query_supersedes_running_one() {
    let (cfg, handle) = start_mock_server(0.5).await;
    let session = session_for(&cfg);

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit("first idea, slow to finish").await })
    };
    while !session.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = session.submit("second idea entirely").await.unwrap();
    assert!(matches!(second, RunOutcome::Completed(_)));
    assert_eq!(first.await.unwrap().unwrap(), RunOutcome::Cancelled);
    assert_eq!(session.snapshot().query(), "second idea entirely");

    handle.abort();
}

#[test]
fn mock_resolver_is_total_over_the_registry() {
    let resolver = MockResolver::instant();
    let rt = tokio::runtime::Runtime::new().unwrap();
    for unit in UnitRegistry::builtin().units() {
        let content = rt.block_on(resolver.resolve(unit, IDEA)).unwrap();
        assert!(!content.summary.is_empty(), "{} has no summary", unit.id);
    }
}
