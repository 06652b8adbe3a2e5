use serde::{Deserialize, Serialize};

use crate::error::ErrorInfo;

/// Independently dismissible error slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSlot {
    /// Lifecycle failures: token exchange, connect, transport loss
    Session,
    /// Errors reported about the remote translation agent
    Agent,
    /// Local capture/playback errors
    LocalMedia,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSlots {
    pub session: Option<ErrorInfo>,
    pub agent: Option<ErrorInfo>,
    pub local_media: Option<ErrorInfo>,
}

impl ErrorSlots {
    pub fn get(&self, slot: ErrorSlot) -> Option<&ErrorInfo> {
        self.slot(slot).as_ref()
    }

    pub fn set(&mut self, slot: ErrorSlot, info: ErrorInfo) {
        *self.slot_mut(slot) = Some(info);
    }

    /// Clear one slot, leaving the others untouched
    pub fn take(&mut self, slot: ErrorSlot) -> Option<ErrorInfo> {
        self.slot_mut(slot).take()
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_none() && self.agent.is_none() && self.local_media.is_none()
    }

    fn slot(&self, slot: ErrorSlot) -> &Option<ErrorInfo> {
        match slot {
            ErrorSlot::Session => &self.session,
            ErrorSlot::Agent => &self.agent,
            ErrorSlot::LocalMedia => &self.local_media,
        }
    }

    fn slot_mut(&mut self, slot: ErrorSlot) -> &mut Option<ErrorInfo> {
        match slot {
            ErrorSlot::Session => &mut self.session,
            ErrorSlot::Agent => &mut self.agent,
            ErrorSlot::LocalMedia => &mut self.local_media,
        }
    }
}
