//! HTTP front of the dispatcher.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/validate` | Start a report; responds with an event stream |
//! | `GET`  | `/api/units` | The unit registry |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Requests refused before a stream opens get a JSON body:
//!
//! ```json
//! { "error": "query must be at least 5 characters after trimming (got 4)", "code": "bad_request" }
//! ```
//!
//! Once the stream is open, failures are per-unit `error` frames; the HTTP
//! status is always 200.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser front end on
//! another origin can open the stream.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::dispatch::{validate_query, Dispatcher};
use crate::registry::{UnitDescriptor, UnitRegistry};
use crate::resolver::{ContentResolver, MockResolver};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    dispatcher: Dispatcher,
}

/// Starts the server with the built-in registry and the mock resolver.
///
/// Binds to `[server].bind` and runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let resolver = Arc::new(MockResolver::with_latency_scale(config.stream.latency_scale));
    run_server_with_resolver(config, resolver).await
}

/// Starts the server with a custom [`ContentResolver`].
///
/// # Example
///
/// ```rust,no_run
/// use venture_validator::server::run_server_with_resolver;
/// use venture_validator::resolver::MockResolver;
/// use std::sync::Arc;
///
/// # async fn example(config: &venture_validator::config::Config) -> anyhow::Result<()> {
/// run_server_with_resolver(config, Arc::new(MockResolver::instant())).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_resolver(
    config: &Config,
    resolver: Arc<dyn ContentResolver>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let registry = Arc::new(UnitRegistry::builtin());
    let dispatcher = Dispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&resolver),
        config.stream.unit_timeout(),
    );
    let app = router(config, dispatcher);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        bind = %bind_addr,
        units = registry.len(),
        resolver = resolver.name(),
        "validator listening on http://{}",
        bind_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// The application router, without binding a socket.
pub fn router(config: &Config, dispatcher: Dispatcher) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        dispatcher,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/validate", post(handle_validate))
        .route("/api/units", get(handle_units))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C; running until killed");
        futures::future::pending::<()>().await;
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/units ============

#[derive(Serialize)]
struct UnitsResponse {
    units: Vec<UnitDescriptor>,
}

async fn handle_units(State(state): State<AppState>) -> Json<UnitsResponse> {
    Json(UnitsResponse {
        units: state.dispatcher.registry().units().to_vec(),
    })
}

// ============ POST /api/validate ============

/// Handler for `POST /api/validate`.
///
/// Validates `{"query": "..."}` and answers with the dispatcher's frame
/// stream as server-sent events. Nothing is dispatched for a rejected body.
async fn handle_validate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body.map_err(|e| bad_request(format!("invalid request body: {}", e.body_text())))?;

    let query = body
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("query is required and must be a string"))?;

    let query = validate_query(query, state.config.stream.min_query_chars)
        .map_err(|e| bad_request(e.to_string()))?;

    let events = state
        .dispatcher
        .dispatch(query)
        .map(|frame| Event::default().json_data(frame));

    Ok(Sse::new(events))
}
