//! API Module
//!
//! HTTP handlers and routing for the gateway REST API.
//!
//! # Endpoints
//! - `POST /games/lookup` - Fetch game records by id
//! - `GET /search` - Free-text search
//! - `GET /stats` - Cache and batching statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
