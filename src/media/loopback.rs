//! In-process media session for local runs and tests
//!
//! Acknowledges a connect after a configurable delay and reports a clean
//! disconnect on teardown. No audio flows.

use anyhow::{bail, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::backend::{MediaEvent, MediaSession, MediaSessionFactory};
use crate::session::SessionConfig;
use crate::token::Credentials;

/// Behaviour of the loopback collaborator
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Delay before `Connected` is reported
    pub connect_delay: Duration,
    /// Capacity of the event channel
    pub event_buffer: usize,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(50),
            event_buffer: 16,
        }
    }
}

pub struct LoopbackMedia {
    session_id: String,
    config: LoopbackConfig,
    events: Option<mpsc::Sender<MediaEvent>>,
}

impl LoopbackMedia {
    pub fn new(session_id: impl Into<String>, config: LoopbackConfig) -> Self {
        Self {
            session_id: session_id.into(),
            config,
            events: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.events.is_some()
    }
}

#[async_trait::async_trait]
impl MediaSession for LoopbackMedia {
    async fn connect(&mut self, credentials: &Credentials) -> Result<mpsc::Receiver<MediaEvent>> {
        if self.events.is_some() {
            bail!("Loopback session {} is already connected", self.session_id);
        }
        if credentials.server_url.is_empty() {
            bail!("Loopback session {} got an empty server URL", self.session_id);
        }

        info!(
            "Loopback session {} connecting to {}",
            self.session_id, credentials.server_url
        );

        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        let ack = tx.clone();
        let delay = self.config.connect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the session was torn down first
            let _ = ack.send(MediaEvent::Connected).await;
        });

        self.events = Some(tx);
        Ok(rx)
    }

    async fn disconnect(&mut self) -> Result<()> {
        match self.events.take() {
            Some(tx) => {
                debug!("Loopback session {} disconnecting", self.session_id);
                let _ = tx.send(MediaEvent::Disconnected { reason: None }).await;
                Ok(())
            }
            None => {
                debug!("Loopback session {} was not connected", self.session_id);
                Ok(())
            }
        }
    }

    fn name(&self) -> &str {
        "loopback"
    }
}

/// Factory handing out `LoopbackMedia` sessions
#[derive(Debug, Clone, Default)]
pub struct LoopbackMediaFactory {
    config: LoopbackConfig,
}

impl LoopbackMediaFactory {
    pub fn new(config: LoopbackConfig) -> Self {
        Self { config }
    }
}

impl MediaSessionFactory for LoopbackMediaFactory {
    fn create(&self, config: &SessionConfig) -> Result<Box<dyn MediaSession>> {
        Ok(Box::new(LoopbackMedia::new(
            config.session_id.clone(),
            self.config.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_acknowledges_connect() {
        let mut media = LoopbackMedia::new(
            "s-1",
            LoopbackConfig {
                connect_delay: Duration::from_millis(1),
                event_buffer: 4,
            },
        );

        let mut events = media
            .connect(&Credentials::new("t", "wss://example"))
            .await
            .unwrap();
        assert_eq!(events.recv().await, Some(MediaEvent::Connected));

        media.disconnect().await.unwrap();
        assert_eq!(
            events.recv().await,
            Some(MediaEvent::Disconnected { reason: None })
        );
        assert!(!media.is_connected());
    }

    #[tokio::test]
    async fn test_loopback_rejects_double_connect() {
        let mut media = LoopbackMedia::new("s-2", LoopbackConfig::default());
        let creds = Credentials::new("t", "wss://example");

        let _events = media.connect(&creds).await.unwrap();
        assert!(media.connect(&creds).await.is_err());
    }
}
