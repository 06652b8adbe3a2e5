// Test doubles shared by the session, presentation and HTTP tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use talkbridge::media::{MediaEvent, MediaSession, MediaSessionFactory};
use talkbridge::{
    ControllerOptions, CredentialSource, Credentials, SessionConfig, SessionController,
    SessionError,
};
use tokio::sync::mpsc;

/// Credential source returning a fixed result, optionally after a delay
pub struct FakeCredentials {
    result: Result<Credentials, SessionError>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeCredentials {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Credentials::new("test-token", "wss://media.test")),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: SessionError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(err),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Credentials::new("test-token", "wss://media.test")),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for FakeCredentials {
    async fn fetch_credentials(&self, _config: &SessionConfig) -> Result<Credentials, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

/// What the scripted media session does and what happened to it
#[derive(Default)]
pub struct MediaScript {
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    /// Send `Connected` as soon as connect is called
    pub auto_ack: bool,
    /// Make connect itself fail
    pub fail_connect: bool,
    /// How long connect takes before it returns
    pub connect_delay: Duration,
    events: Mutex<Option<mpsc::Sender<MediaEvent>>>,
}

impl MediaScript {
    pub fn acking() -> Arc<Self> {
        Arc::new(Self {
            auto_ack: true,
            ..Default::default()
        })
    }

    pub fn silent() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            fail_connect: true,
            ..Default::default()
        })
    }

    pub fn slow_connect(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            auto_ack: true,
            connect_delay: delay,
            ..Default::default()
        })
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Push an event as if the media library had reported it
    pub async fn emit(&self, event: MediaEvent) {
        let tx = self.events.lock().unwrap().clone();
        tx.expect("media session not connected")
            .send(event)
            .await
            .expect("controller dropped the event stream");
    }
}

pub struct ScriptedMedia {
    script: Arc<MediaScript>,
}

#[async_trait]
impl MediaSession for ScriptedMedia {
    async fn connect(&mut self, _credentials: &Credentials) -> Result<mpsc::Receiver<MediaEvent>> {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        if !self.script.connect_delay.is_zero() {
            tokio::time::sleep(self.script.connect_delay).await;
        }
        if self.script.fail_connect {
            bail!("room join refused");
        }

        let (tx, rx) = mpsc::channel(16);
        if self.script.auto_ack {
            tx.send(MediaEvent::Connected).await?;
        }
        *self.script.events.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.script.disconnects.fetch_add(1, Ordering::SeqCst);
        // Real libraries report the disconnect they were asked for
        let tx = self.script.events.lock().unwrap().take();
        if let Some(tx) = tx {
            let _ = tx.send(MediaEvent::Disconnected { reason: None }).await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedFactory {
    pub script: Arc<MediaScript>,
}

impl MediaSessionFactory for ScriptedFactory {
    fn create(&self, _config: &SessionConfig) -> Result<Box<dyn MediaSession>> {
        Ok(Box::new(ScriptedMedia {
            script: Arc::clone(&self.script),
        }))
    }
}

pub fn fast_options() -> ControllerOptions {
    ControllerOptions {
        teardown_grace: Duration::from_millis(10),
    }
}

pub fn ana_and_ben() -> SessionConfig {
    SessionConfig::new("Ana", "English", "Ben").with_counterpart_language("Spanish")
}

pub fn controller(
    credentials: Arc<FakeCredentials>,
    script: Arc<MediaScript>,
) -> SessionController {
    SessionController::new(
        ana_and_ben(),
        credentials,
        Arc::new(ScriptedFactory { script }),
        fast_options(),
    )
    .unwrap()
}

/// Fail the test instead of hanging forever
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out")
}
