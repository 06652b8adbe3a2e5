use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ErrorInfo;

/// Lifecycle tag of a session
///
/// `Idle` is initial; `Ended` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
    Ended,
    Failed(ErrorInfo),
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
            SessionStatus::Disconnecting => "disconnecting",
            SessionStatus::Ended => "ended",
            SessionStatus::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Ended | SessionStatus::Failed(_))
    }

    /// Look up what `event` does in this state
    ///
    /// Every (state, event) pair is listed; there is no fallthrough arm.
    pub fn on(&self, event: &LifecycleEvent) -> Transition {
        use LifecycleEvent as E;
        use SessionStatus as S;

        match (self, event) {
            (S::Idle, E::Start) => Transition::To(S::Connecting),
            (S::Idle, E::Stop) => Transition::To(S::Ended),
            (S::Idle, E::Connected | E::ConnectFailed(_) | E::RemoteLost(_) | E::TeardownComplete) => {
                Transition::Ignore
            }

            (S::Connecting, E::Start) => Transition::Reject,
            (S::Connecting, E::Connected) => Transition::To(S::Connected),
            (S::Connecting, E::ConnectFailed(info) | E::RemoteLost(info)) => {
                Transition::To(S::Failed(info.clone()))
            }
            (S::Connecting, E::Stop) => Transition::To(S::Disconnecting),
            (S::Connecting, E::TeardownComplete) => Transition::Ignore,

            (S::Connected, E::Start) => Transition::Reject,
            (S::Connected, E::ConnectFailed(info) | E::RemoteLost(info)) => {
                Transition::To(S::Failed(info.clone()))
            }
            (S::Connected, E::Stop) => Transition::To(S::Disconnecting),
            (S::Connected, E::Connected | E::TeardownComplete) => Transition::Ignore,

            (S::Disconnecting, E::Start) => Transition::Reject,
            (S::Disconnecting, E::TeardownComplete) => Transition::To(S::Ended),
            // Teardown already in flight: late callbacks and repeated stops coalesce
            (
                S::Disconnecting,
                E::Connected | E::ConnectFailed(_) | E::RemoteLost(_) | E::Stop,
            ) => Transition::Ignore,

            (S::Ended | S::Failed(_), E::Start) => Transition::Reject,
            (
                S::Ended | S::Failed(_),
                E::Connected
                | E::ConnectFailed(_)
                | E::RemoteLost(_)
                | E::Stop
                | E::TeardownComplete,
            ) => Transition::Ignore,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs to the lifecycle state machine
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// `start()` invoked
    Start,
    /// The media session acknowledged the connection
    Connected,
    /// Credential fetch or connect request failed
    ConnectFailed(ErrorInfo),
    /// The media session disconnected or faulted on its own
    RemoteLost(ErrorInfo),
    /// `stop()` invoked
    Stop,
    /// Media teardown finished and the grace period elapsed
    TeardownComplete,
}

/// Result of feeding an event to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    To(SessionStatus),
    Ignore,
    /// Lifecycle misuse (`start()` outside `Idle`)
    Reject,
}

/// Snapshot of a session's lifecycle, as handed to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    pub last_error: Option<ErrorInfo>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            last_error: None,
        }
    }
}

/// One step of the lifecycle, published in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn fault() -> ErrorInfo {
        ErrorInfo::new(ErrorKind::CollaboratorError, "room closed")
    }

    fn all_events() -> Vec<LifecycleEvent> {
        vec![
            LifecycleEvent::Start,
            LifecycleEvent::Connected,
            LifecycleEvent::ConnectFailed(fault()),
            LifecycleEvent::RemoteLost(fault()),
            LifecycleEvent::Stop,
            LifecycleEvent::TeardownComplete,
        ]
    }

    #[test]
    fn test_happy_path() {
        let s = SessionStatus::Idle;
        assert_eq!(s.on(&LifecycleEvent::Start), Transition::To(SessionStatus::Connecting));

        let s = SessionStatus::Connecting;
        assert_eq!(s.on(&LifecycleEvent::Connected), Transition::To(SessionStatus::Connected));

        let s = SessionStatus::Connected;
        assert_eq!(s.on(&LifecycleEvent::Stop), Transition::To(SessionStatus::Disconnecting));

        let s = SessionStatus::Disconnecting;
        assert_eq!(s.on(&LifecycleEvent::TeardownComplete), Transition::To(SessionStatus::Ended));
    }

    #[test]
    fn test_start_rejected_outside_idle() {
        for status in [
            SessionStatus::Connecting,
            SessionStatus::Connected,
            SessionStatus::Disconnecting,
            SessionStatus::Ended,
            SessionStatus::Failed(fault()),
        ] {
            assert_eq!(status.on(&LifecycleEvent::Start), Transition::Reject, "{}", status);
        }
    }

    #[test]
    fn test_remote_loss_fails_only_when_not_caller_initiated() {
        let lost = LifecycleEvent::RemoteLost(fault());
        assert!(matches!(
            SessionStatus::Connected.on(&lost),
            Transition::To(SessionStatus::Failed(_))
        ));
        assert_eq!(SessionStatus::Disconnecting.on(&lost), Transition::Ignore);
    }

    #[test]
    fn test_terminal_states_absorb_everything_but_start() {
        for status in [SessionStatus::Ended, SessionStatus::Failed(fault())] {
            for event in all_events() {
                let expected = if event == LifecycleEvent::Start {
                    Transition::Reject
                } else {
                    Transition::Ignore
                };
                assert_eq!(status.on(&event), expected);
            }
        }
    }

    #[test]
    fn test_no_state_jumps_from_idle_to_connected() {
        for event in all_events() {
            assert_ne!(
                SessionStatus::Idle.on(&event),
                Transition::To(SessionStatus::Connected)
            );
        }
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let json = serde_json::to_value(SessionStatus::Connecting).unwrap();
        assert_eq!(json["state"], "connecting");

        let json = serde_json::to_value(SessionStatus::Failed(fault())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"]["kind"], "collaborator_error");
    }
}
