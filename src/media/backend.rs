use anyhow::Result;
use tokio::sync::mpsc;

use crate::session::SessionConfig;
use crate::token::Credentials;

/// Events pushed by the media session after `connect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// The room/transport is up
    Connected,
    /// The transport went away; `reason` is set when the library gave one
    Disconnected { reason: Option<String> },
    /// Session-level runtime fault; the session cannot continue
    Fault(String),
    /// The remote translation agent reported a problem
    AgentError(String),
    /// Local capture/playback problem (microphone, audio route, ...)
    LocalMediaError(String),
}

/// Real-time media session provided by an external communication library
///
/// Implementations wrap the library's room/transport object. The controller
/// owns the handle exclusively and never shares it.
#[async_trait::async_trait]
pub trait MediaSession: Send {
    /// Issue the connect request
    ///
    /// Returns once the request is in flight; the outcome (and everything
    /// after it) arrives on the returned channel.
    async fn connect(&mut self, credentials: &Credentials) -> Result<mpsc::Receiver<MediaEvent>>;

    /// Tear the transport down and release its resources
    async fn disconnect(&mut self) -> Result<()>;

    /// Get collaborator name for logging
    fn name(&self) -> &str;
}

/// Builds one `MediaSession` per translation session
pub trait MediaSessionFactory: Send + Sync {
    fn create(&self, config: &SessionConfig) -> Result<Box<dyn MediaSession>>;
}
