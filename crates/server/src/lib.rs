//! Server crate: Axum web service for the stock predictor.
//!
//! Serves next-day close predictions from the loaded [`ModelRegistry`],
//! chart data fetched on demand, and the static front-end.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────────┐
//! │  Startup (sync)      │        │  Axum Server (async)     │
//! │                      │        │                          │
//! │  ModelRegistry::load │──Arc──>│ POST /predict            │
//! │  YahooSource::new    │        │ GET  /get_stock_data ──┐ │
//! │                      │        │ GET  /api/models       │ │
//! └──────────────────────┘        │ GET  /health           │ │
//!                                 │ /*   static files      │ │
//!                                 └────────────────────────┼─┘
//!                                      spawn_blocking <────┘
//!                                      PriceSource::fetch
//! ```
//!
//! # Modules
//!
//! - [`app`]: Router builder and [`ServerConfig`]
//! - [`state`]: Shared read-only server state
//! - [`error`]: Unified error handling with HTTP status codes
//! - [`routes`]: HTTP route handlers (health, predict, chart, models)
//!
//! [`ModelRegistry`]: registry::ModelRegistry

pub mod app;
pub mod error;
pub mod routes;
pub mod state;

pub use app::{ServerConfig, create_app, serve};
pub use error::AppError;
pub use state::ServerState;
