//! Token exchange with the translation backend
//!
//! `POST {base_url}/api/conversations/start` turns a `SessionConfig` and an
//! API key into short-lived transport `Credentials` for the media session.

pub mod client;
pub mod credentials;
pub mod messages;

pub use client::{BackendCredentialSource, CredentialSource, TokenClient, START_PATH};
pub use credentials::Credentials;
pub use messages::{StartConversationRequest, StartConversationResponse, TransportGrant};
