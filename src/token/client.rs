use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::credentials::Credentials;
use super::messages::{StartConversationRequest, StartConversationResponse};
use crate::error::SessionError;
use crate::session::SessionConfig;

/// Path of the token endpoint, relative to the backend base URL
pub const START_PATH: &str = "/api/conversations/start";

/// Source of fresh transport credentials for a session
///
/// The controller only depends on this trait, so hosts can swap the HTTP
/// backend for anything else that hands out credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch_credentials(&self, config: &SessionConfig) -> Result<Credentials, SessionError>;
}

/// Stateless HTTP client for the token endpoint
///
/// Performs exactly one request per call. Retrying is left to the caller.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: Client,
}

impl TokenClient {
    /// Build a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, SessionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Reuse an existing `reqwest::Client` (connection pool, proxies, ...)
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Exchange `config` for transport credentials
    pub async fn fetch_credentials(
        &self,
        config: &SessionConfig,
        api_key: &str,
        base_url: &str,
    ) -> Result<Credentials, SessionError> {
        if api_key.trim().is_empty() {
            return Err(SessionError::InvalidConfig("API key must not be empty".to_string()));
        }
        let endpoint = endpoint_url(base_url)?;

        info!(
            "Requesting credentials for session {} from {}",
            config.session_id, endpoint
        );

        let body = StartConversationRequest::from(config);
        let response = self
            .http
            .post(endpoint.clone())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Transport(format!("Failed to reach {}: {}", endpoint, e)))?;

        let status = response.status();
        let payload = response.bytes().await.map_err(|e| {
            SessionError::Transport(format!("Failed to read response from {}: {}", endpoint, e))
        })?;

        if status != StatusCode::OK {
            warn!(
                "Token endpoint rejected session {} with status {}",
                config.session_id, status
            );
            return Err(SessionError::rejected(
                status.as_u16(),
                &String::from_utf8_lossy(&payload),
            ));
        }

        let parsed: StartConversationResponse = serde_json::from_slice(&payload)
            .map_err(|e| SessionError::MalformedResponse(e.to_string()))?;

        if parsed.transport.token.is_empty() {
            return Err(SessionError::MalformedResponse(
                "transport.token is empty".to_string(),
            ));
        }
        if parsed.transport.url.is_empty() {
            return Err(SessionError::MalformedResponse(
                "transport.url is empty".to_string(),
            ));
        }

        debug!(
            "Received credentials for session {} (server={})",
            config.session_id, parsed.transport.url
        );

        Ok(Credentials::new(parsed.transport.token, parsed.transport.url))
    }
}

/// Resolve `{base_url}/api/conversations/start`, rejecting relative URLs
pub fn endpoint_url(base_url: &str) -> Result<Url, SessionError> {
    let base = Url::parse(base_url.trim())
        .map_err(|e| SessionError::InvalidConfig(format!("invalid base URL {:?}: {}", base_url, e)))?;

    if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
        return Err(SessionError::InvalidConfig(format!(
            "base URL must be an absolute http(s) URL, got {:?}",
            base_url
        )));
    }

    if base.query().is_some() || base.fragment().is_some() {
        return Err(SessionError::InvalidConfig(format!(
            "base URL must not carry a query or fragment, got {:?}",
            base_url
        )));
    }

    let mut url = base;
    url.path_segments_mut()
        .map_err(|_| SessionError::InvalidConfig(format!("base URL {:?} has no path", base_url)))?
        .pop_if_empty()
        .extend(START_PATH.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// `CredentialSource` backed by the HTTP token endpoint
#[derive(Debug, Clone)]
pub struct BackendCredentialSource {
    client: TokenClient,
    api_key: String,
    base_url: String,
}

impl BackendCredentialSource {
    pub fn new(client: TokenClient, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for BackendCredentialSource {
    async fn fetch_credentials(&self, config: &SessionConfig) -> Result<Credentials, SessionError> {
        self.client
            .fetch_credentials(config, &self.api_key, &self.base_url)
            .await
    }
}
