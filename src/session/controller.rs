use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::errors::{ErrorSlot, ErrorSlots};
use super::state::{LifecycleEvent, SessionState, SessionStatus, StateTransition, Transition};
use super::stats::SessionStats;
use crate::error::{ErrorInfo, ErrorKind, SessionError};
use crate::media::{MediaEvent, MediaSession, MediaSessionFactory};
use crate::token::CredentialSource;

/// Capacity of the transition broadcast; slow observers past this lag
const TRANSITION_BUFFER: usize = 64;

/// Tunables for a `SessionController`
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Wait after media teardown before reporting `Ended`, giving the
    /// transport time to release audio resources
    pub teardown_grace: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            teardown_grace: Duration::from_millis(500),
        }
    }
}

/// Owns the lifecycle of exactly one translation session
///
/// A controller is single-use: once it reaches `Ended` or `Failed` it stays
/// there, and a new conversation needs a new controller. All state changes
/// go through one mutex-guarded transition function, so observers see them
/// in order.
pub struct SessionController {
    shared: Arc<Shared>,
}

struct Shared {
    config: SessionConfig,
    credentials: Arc<dyn CredentialSource>,
    media_factory: Arc<dyn MediaSessionFactory>,
    options: ControllerOptions,
    created_at: DateTime<Utc>,

    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<SessionState>,
    errors_tx: watch::Sender<ErrorSlots>,
    transitions_tx: broadcast::Sender<StateTransition>,

    /// Media handle, present from the start of connect until teardown
    media: tokio::sync::Mutex<Option<Box<dyn MediaSession>>>,

    /// Connection driver (credential fetch, connect, event pump)
    driver: Mutex<Option<JoinHandle<()>>>,
}

struct Lifecycle {
    state: SessionState,
    /// Bumped when teardown begins; completions from older generations are stale
    generation: u64,
    transitions: usize,
    connected_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

enum Outcome {
    Moved { to: SessionStatus, generation: u64 },
    Ignored,
    Rejected(SessionStatus),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionController {
    /// Create a controller for `config`
    ///
    /// Dependencies are passed in explicitly; nothing is looked up from
    /// ambient state.
    pub fn new(
        config: SessionConfig,
        credentials: Arc<dyn CredentialSource>,
        media_factory: Arc<dyn MediaSessionFactory>,
        options: ControllerOptions,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        info!("Creating session controller: {}", config.session_id);

        let (state_tx, _) = watch::channel(SessionState::default());
        let (errors_tx, _) = watch::channel(ErrorSlots::default());
        let (transitions_tx, _) = broadcast::channel(TRANSITION_BUFFER);

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                credentials,
                media_factory,
                options,
                created_at: Utc::now(),
                lifecycle: Mutex::new(Lifecycle {
                    state: SessionState::default(),
                    generation: 0,
                    transitions: 0,
                    connected_at: None,
                    ended_at: None,
                }),
                state_tx,
                errors_tx,
                transitions_tx,
                media: tokio::sync::Mutex::new(None),
                driver: Mutex::new(None),
            }),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.shared.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Begin connecting
    ///
    /// `Idle → Connecting` is applied and published before this returns; the
    /// credential fetch and connect run on a spawned task. Outside a Tokio
    /// runtime this fails with `NoRuntime` and the session stays `Idle`.
    pub fn start(&self) -> Result<(), SessionError> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot start session {}: {}", self.session_id(), e);
                return Err(SessionError::NoRuntime);
            }
        };

        let generation = match self.shared.apply(None, LifecycleEvent::Start) {
            Outcome::Moved { generation, .. } => generation,
            Outcome::Rejected(status) => {
                warn!("Session {} already started ({})", self.session_id(), status);
                return Err(SessionError::AlreadyStarted {
                    state: status.label().to_string(),
                });
            }
            Outcome::Ignored => return Ok(()),
        };

        let shared = Arc::clone(&self.shared);
        let driver = runtime.spawn(async move { shared.drive(generation).await });
        *lock(&self.shared.driver) = Some(driver);

        Ok(())
    }

    /// End the session
    ///
    /// Idempotent. The first call moves the session to `Disconnecting`,
    /// cancels any outstanding fetch/connect, tears the media session down
    /// and reports `Ended`. Calls made while that is in flight, or after the
    /// session already finished, return immediately.
    pub async fn stop(&self) {
        match self.shared.apply(None, LifecycleEvent::Stop) {
            Outcome::Moved {
                to: SessionStatus::Disconnecting,
                ..
            } => {}
            Outcome::Moved { .. } => return,
            Outcome::Ignored | Outcome::Rejected(_) => {
                debug!(
                    "Stop ignored for session {} ({})",
                    self.session_id(),
                    self.current_state().status
                );
                return;
            }
        }

        let driver = lock(&self.shared.driver).take();
        if let Some(driver) = driver {
            driver.abort();
        }

        // Run teardown on its own task so a dropped caller cannot strand the
        // session in Disconnecting
        let shared = Arc::clone(&self.shared);
        if let Err(e) = tokio::spawn(async move { shared.teardown().await }).await {
            error!("Teardown task for session {} failed: {}", self.session_id(), e);
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.shared.state_tx.borrow().clone()
    }

    /// Latest state; every change is pushed to the receiver
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Every transition from now on, in order
    pub fn transitions(&self) -> broadcast::Receiver<StateTransition> {
        self.shared.transitions_tx.subscribe()
    }

    pub fn error_slots(&self) -> ErrorSlots {
        self.shared.errors_tx.borrow().clone()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<ErrorSlots> {
        self.shared.errors_tx.subscribe()
    }

    /// Clear one error slot; the others are left as they are
    pub fn dismiss_error(&self, slot: ErrorSlot) -> Option<ErrorInfo> {
        let mut dismissed = None;
        self.shared.errors_tx.send_if_modified(|slots| {
            dismissed = slots.take(slot);
            dismissed.is_some()
        });

        if dismissed.is_some() {
            debug!("Dismissed {:?} error for session {}", slot, self.session_id());
        }
        dismissed
    }

    /// Wait until the state satisfies `predicate` and return it
    pub async fn wait_for<F>(&self, mut predicate: F) -> SessionState
    where
        F: FnMut(&SessionState) -> bool,
    {
        let mut rx = self.shared.state_tx.subscribe();
        let result = rx.wait_for(|state| predicate(state)).await;
        match result {
            Ok(state) => state.clone(),
            Err(_) => self.current_state(),
        }
    }

    /// Wait for `Connected` or a terminal state
    pub async fn wait_until_settled(&self) -> SessionState {
        self.wait_for(|state| {
            matches!(state.status, SessionStatus::Connected) || state.status.is_terminal()
        })
        .await
    }

    pub fn stats(&self) -> SessionStats {
        let lifecycle = lock(&self.shared.lifecycle);
        let connected_secs = match lifecycle.connected_at {
            Some(connected_at) => {
                let until = lifecycle.ended_at.unwrap_or_else(Utc::now);
                until.signed_duration_since(connected_at).num_milliseconds() as f64 / 1000.0
            }
            None => 0.0,
        };

        SessionStats {
            session_id: self.shared.config.session_id.clone(),
            status: lifecycle.state.status.label().to_string(),
            created_at: self.shared.created_at,
            connected_at: lifecycle.connected_at,
            ended_at: lifecycle.ended_at,
            connected_secs,
            transitions: lifecycle.transitions,
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // The driver holds the only other reference to the media handle
        if let Some(driver) = lock(&self.shared.driver).take() {
            driver.abort();
        }
    }
}

impl Shared {
    /// Feed one event to the state machine and publish the result
    ///
    /// With `Some(generation)`, the event is dropped if teardown started
    /// after that generation was issued.
    fn apply(&self, generation: Option<u64>, event: LifecycleEvent) -> Outcome {
        let mut lifecycle = lock(&self.lifecycle);

        if let Some(generation) = generation {
            if generation != lifecycle.generation {
                debug!(
                    "Dropping stale {:?} for session {} (generation {} != {})",
                    event, self.config.session_id, generation, lifecycle.generation
                );
                return Outcome::Ignored;
            }
        }

        let from = lifecycle.state.status.clone();
        let to = match from.on(&event) {
            Transition::To(to) => to,
            Transition::Ignore => {
                debug!(
                    "Session {} ignored {:?} in state {}",
                    self.config.session_id, event, from
                );
                return Outcome::Ignored;
            }
            Transition::Reject => return Outcome::Rejected(from),
        };

        let now = Utc::now();
        match &to {
            SessionStatus::Disconnecting => lifecycle.generation += 1,
            SessionStatus::Connected => lifecycle.connected_at = Some(now),
            SessionStatus::Ended => lifecycle.ended_at = Some(now),
            SessionStatus::Failed(info) => {
                lifecycle.ended_at = Some(now);
                lifecycle.state.last_error = Some(info.clone());
                self.errors_tx
                    .send_modify(|slots| slots.set(ErrorSlot::Session, info.clone()));
            }
            SessionStatus::Idle | SessionStatus::Connecting => {}
        }

        lifecycle.state.status = to.clone();
        lifecycle.transitions += 1;

        info!("Session {}: {} -> {}", self.config.session_id, from, to);

        // Published under the lock so observers see transitions in order
        self.state_tx.send_replace(lifecycle.state.clone());
        let _ = self.transitions_tx.send(StateTransition {
            from,
            to: to.clone(),
            at: now,
        });

        Outcome::Moved {
            to,
            generation: lifecycle.generation,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        lock(&self.lifecycle).generation == generation
    }

    fn record_error(&self, generation: u64, slot: ErrorSlot, info: ErrorInfo) {
        if !self.is_current(generation) {
            debug!("Dropping stale {:?} error: {}", slot, info.message);
            return;
        }
        warn!(
            "Session {} {:?} error: {}",
            self.config.session_id, slot, info.message
        );
        self.errors_tx.send_modify(|slots| slots.set(slot, info));
    }

    fn fail(&self, generation: u64, err: &SessionError) {
        error!("Session {} failed: {}", self.config.session_id, err);
        self.apply(Some(generation), LifecycleEvent::ConnectFailed(ErrorInfo::from(err)));
    }

    /// Fetch credentials, connect, then pump media events until the session ends
    async fn drive(self: Arc<Self>, generation: u64) {
        let credentials = match self.credentials.fetch_credentials(&self.config).await {
            Ok(credentials) => credentials,
            Err(e) => {
                self.fail(generation, &e);
                return;
            }
        };

        if !self.is_current(generation) {
            debug!("Session {} stopped during credential fetch", self.config.session_id);
            return;
        }

        let media = match self.media_factory.create(&self.config) {
            Ok(media) => media,
            Err(e) => {
                self.fail(generation, &SessionError::collaborator(&e));
                return;
            }
        };

        info!(
            "Session {} connecting {} media session to {}",
            self.config.session_id,
            media.name(),
            credentials.server_url
        );

        // The handle is parked in the shared slot for the whole connect. If
        // stop() aborts this task mid-connect, teardown finds it there and
        // disconnects it.
        let mut slot = self.media.lock().await;
        if !self.is_current(generation) {
            debug!("Session {} stopped before connect", self.config.session_id);
            return;
        }

        let connected = slot.insert(media).connect(&credentials).await;
        drop(credentials);

        let events = match connected {
            Ok(events) => events,
            Err(e) => {
                slot.take();
                drop(slot);
                self.fail(generation, &SessionError::collaborator(&e));
                return;
            }
        };
        drop(slot);

        self.pump(generation, events).await;
    }

    async fn pump(&self, generation: u64, mut events: mpsc::Receiver<MediaEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                MediaEvent::Connected => {
                    self.apply(Some(generation), LifecycleEvent::Connected);
                }
                MediaEvent::Disconnected { reason } => {
                    let message = reason.unwrap_or_else(|| "media session disconnected".to_string());
                    self.lose_remote(generation, message).await;
                    return;
                }
                MediaEvent::Fault(message) => {
                    self.lose_remote(generation, message).await;
                    return;
                }
                MediaEvent::AgentError(message) => self.record_error(
                    generation,
                    ErrorSlot::Agent,
                    ErrorInfo::new(ErrorKind::CollaboratorError, message),
                ),
                MediaEvent::LocalMediaError(message) => self.record_error(
                    generation,
                    ErrorSlot::LocalMedia,
                    ErrorInfo::new(ErrorKind::CollaboratorError, message),
                ),
            }
        }

        self.lose_remote(generation, "media event stream closed".to_string())
            .await;
    }

    async fn lose_remote(&self, generation: u64, message: String) {
        let info = ErrorInfo::new(ErrorKind::CollaboratorError, message);
        if let Outcome::Moved { .. } = self.apply(Some(generation), LifecycleEvent::RemoteLost(info)) {
            let media = self.media.lock().await.take();
            if let Some(mut media) = media {
                if let Err(e) = media.disconnect().await {
                    error!("Failed to release {} media session: {:#}", media.name(), e);
                }
            }
        }
    }

    async fn teardown(&self) {
        let media = self.media.lock().await.take();
        if let Some(mut media) = media {
            info!(
                "Disconnecting {} media session for {}",
                media.name(),
                self.config.session_id
            );
            if let Err(e) = media.disconnect().await {
                let err = SessionError::collaborator(&e);
                error!("Media teardown failed for {}: {}", self.config.session_id, err);
                self.errors_tx
                    .send_modify(|slots| slots.set(ErrorSlot::Session, ErrorInfo::from(&err)));
            }
        }

        tokio::time::sleep(self.options.teardown_grace).await;
        self.apply(None, LifecycleEvent::TeardownComplete);
    }
}
