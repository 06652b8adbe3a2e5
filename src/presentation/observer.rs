use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::session::{ErrorSlots, StateTransition};

/// Receives session notifications on a background task
#[async_trait]
pub trait SessionObserver: Send + Sync {
    /// Called once per lifecycle transition, in order
    async fn on_state_changed(&self, transition: &StateTransition);

    /// Called whenever any error slot is set or dismissed
    async fn on_errors_changed(&self, _errors: &ErrorSlots) {}
}

/// Keeps an observer subscribed; dropping it unsubscribes
pub struct ObserverHandle {
    task: JoinHandle<()>,
}

impl ObserverHandle {
    pub(crate) fn spawn(
        observer: Arc<dyn SessionObserver>,
        mut transitions: broadcast::Receiver<StateTransition>,
        mut errors: watch::Receiver<ErrorSlots>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut errors_open = true;
            loop {
                tokio::select! {
                    received = transitions.recv() => match received {
                        Ok(transition) => observer.on_state_changed(&transition).await,
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!("Session observer lagged, missed {} transitions", missed);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    changed = errors.changed(), if errors_open => match changed {
                        Ok(()) => {
                            let slots = errors.borrow_and_update().clone();
                            observer.on_errors_changed(&slots).await;
                        }
                        Err(_) => errors_open = false,
                    },
                }
            }
        });

        Self { task }
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
