//! Translation session lifecycle
//!
//! This module provides the `SessionController` that manages:
//! - Credential exchange through an injected `CredentialSource`
//! - Media session creation, connect and teardown
//! - The lifecycle state machine and its ordered transition feed
//! - Independently dismissible error slots
//! - Session statistics

mod config;
mod controller;
mod errors;
mod state;
mod stats;

pub use config::{generate_session_id, SessionConfig};
pub use controller::{ControllerOptions, SessionController};
pub use errors::{ErrorSlot, ErrorSlots};
pub use state::{LifecycleEvent, SessionState, SessionStatus, StateTransition, Transition};
pub use stats::SessionStats;
