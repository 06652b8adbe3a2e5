//! Boundary between a `SessionController` and whatever UI renders it
//!
//! The adapter holds no business logic. It turns controller state into a
//! flat `ViewState`, turns UI intents into controller calls and forwards
//! change notifications to registered observers.

mod observer;

pub use observer::{ObserverHandle, SessionObserver};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::SessionError;
use crate::session::{
    ErrorSlot, ErrorSlots, SessionController, SessionState, SessionStats, SessionStatus,
};

/// Discrete user actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "slot", rename_all = "snake_case")]
pub enum UiIntent {
    Start,
    Stop,
    DismissError(ErrorSlot),
}

/// Everything a UI needs to render a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub session_id: String,
    pub status: SessionStatus,
    pub errors: ErrorSlots,
    pub can_start: bool,
    pub can_stop: bool,
}

impl ViewState {
    fn build(session_id: &str, state: &SessionState, errors: &ErrorSlots) -> Self {
        let status = state.status.clone();
        Self {
            session_id: session_id.to_string(),
            can_start: matches!(status, SessionStatus::Idle),
            can_stop: !status.is_terminal() && !matches!(status, SessionStatus::Disconnecting),
            status,
            errors: errors.clone(),
        }
    }
}

pub struct PresentationAdapter {
    controller: Arc<SessionController>,
}

impl PresentationAdapter {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self { controller }
    }

    pub fn session_id(&self) -> &str {
        self.controller.session_id()
    }

    pub fn view(&self) -> ViewState {
        ViewState::build(
            self.controller.session_id(),
            &self.controller.current_state(),
            &self.controller.error_slots(),
        )
    }

    pub fn stats(&self) -> SessionStats {
        self.controller.stats()
    }

    /// Translate a UI intent into the matching controller call
    pub async fn dispatch(&self, intent: UiIntent) -> Result<(), SessionError> {
        match intent {
            UiIntent::Start => self.controller.start(),
            UiIntent::Stop => {
                self.controller.stop().await;
                Ok(())
            }
            UiIntent::DismissError(slot) => {
                self.controller.dismiss_error(slot);
                Ok(())
            }
        }
    }

    /// Stream of views, one per state or error-slot change
    pub fn updates(&self) -> ViewUpdates {
        ViewUpdates {
            session_id: self.controller.session_id().to_string(),
            state_rx: self.controller.subscribe(),
            errors_rx: self.controller.subscribe_errors(),
        }
    }

    /// Register `observer` for every transition and error change
    ///
    /// Notifications stop when the returned handle is dropped.
    pub fn observe(&self, observer: Arc<dyn SessionObserver>) -> ObserverHandle {
        ObserverHandle::spawn(
            observer,
            self.controller.transitions(),
            self.controller.subscribe_errors(),
        )
    }
}

/// Push-based view feed returned by `PresentationAdapter::updates`
pub struct ViewUpdates {
    session_id: String,
    state_rx: watch::Receiver<SessionState>,
    errors_rx: watch::Receiver<ErrorSlots>,
}

impl ViewUpdates {
    /// Wait for the next change; `None` once the controller is gone
    pub async fn changed(&mut self) -> Option<ViewState> {
        tokio::select! {
            res = self.state_rx.changed() => res.ok()?,
            res = self.errors_rx.changed() => res.ok()?,
        }

        let state = self.state_rx.borrow_and_update().clone();
        let errors = self.errors_rx.borrow_and_update().clone();
        Some(ViewState::build(&self.session_id, &state, &errors))
    }
}
