//! HTTP API for driving translation sessions from another process
//!
//! This module exposes the presentation adapter over REST:
//! - POST /sessions/start - Create and start a session
//! - POST /sessions/:id/stop - Stop a session and return its final stats
//! - GET /sessions/:id/status - Current view state
//! - DELETE /sessions/:id/errors/:slot - Dismiss one error slot
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
