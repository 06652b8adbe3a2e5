use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a translation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Current lifecycle label (`idle`, `connected`, ...)
    pub status: String,

    /// When the controller was created
    pub created_at: DateTime<Utc>,

    /// When the media session first reported connected
    pub connected_at: Option<DateTime<Utc>>,

    /// When the session reached a terminal state
    pub ended_at: Option<DateTime<Utc>>,

    /// Time spent connected, in seconds (up to now if still connected)
    pub connected_secs: f64,

    /// Number of lifecycle transitions so far
    pub transitions: usize,
}
