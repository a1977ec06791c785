//! # Venture Validator
//!
//! A streaming fan-out/fan-in report for startup ideas.
//!
//! One query is dispatched to every unit in a registry at once. Each unit
//! resolves independently and its result is streamed back as a server-sent
//! event the moment it settles, so a slow or failing unit never holds up
//! the others. The client side folds those frames into a report state and
//! derives an overall score and verdict.
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!   POST /api/validate │  Dispatcher  │  loading × N
//!  ───────────────────▶│  (server)    │──────────────┐
//!                      └──────┬───────┘              │
//!                             │ fan-out              ▼
//!              ┌──────────────┼──────────────┐   SSE frames
//!              ▼              ▼              ▼   done / error × N
//!         ┌─────────┐    ┌─────────┐    ┌─────────┐  then end
//!         │ unit 1  │    │ unit 2  │ …  │ unit N  │    │
//!         └─────────┘    └─────────┘    └─────────┘    ▼
//!                                              ┌──────────────┐
//!                                              │  Consumer    │
//!                                              │ ReportState  │──▶ score, verdict
//!                                              └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! vv serve                                  # start the server
//! vv validate "a marketplace for used lab equipment"
//! vv units                                  # list the analysis units
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Wire frames and unit results |
//! | [`viz`] | Visualization payload types |
//! | [`registry`] | Analysis unit descriptors |
//! | [`resolver`] | Content resolver abstraction |
//! | [`mock_content`] | Canned per-unit model output and latencies |
//! | [`extract`] | Structured-output extraction from raw text |
//! | [`dispatch`] | Query validation and the fan-out stream |
//! | [`server`] | HTTP server |
//! | [`consumer`] | Event-stream parsing and report state |
//! | [`client`] | HTTP client for the dispatch endpoint |
//! | [`session`] | One live report with cancellation |
//! | [`scoring`] | Overall score, verdict, and tallies |
//! | [`progress`] | Progress reporting on stderr |
//! | [`report`] | Terminal rendering for the CLI |

pub mod client;
pub mod config;
pub mod consumer;
pub mod dispatch;
pub mod extract;
pub mod mock_content;
pub mod models;
pub mod progress;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod scoring;
pub mod server;
pub mod session;
pub mod viz;
