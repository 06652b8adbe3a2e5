use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::session::SessionConfig;

/// Field names owned by the request itself; context fields may not shadow them
pub const RESERVED_FIELDS: [&str; 5] = [
    "initiator_name",
    "initiator_language",
    "counterpart_name",
    "counterpart_language",
    "session_id",
];

/// Body of `POST /api/conversations/start`
#[derive(Debug, Serialize)]
pub struct StartConversationRequest<'a> {
    pub initiator_name: &'a str,
    pub initiator_language: &'a str,
    pub counterpart_name: &'a str,
    /// Serialized as JSON `null` when the counterpart language is unknown
    pub counterpart_language: Option<&'a str>,
    pub session_id: &'a str,
    #[serde(flatten)]
    pub context: BTreeMap<&'a str, &'a str>,
}

impl<'a> From<&'a SessionConfig> for StartConversationRequest<'a> {
    fn from(config: &'a SessionConfig) -> Self {
        let mut context = BTreeMap::new();
        for (key, value) in &config.context_fields {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                warn!("Dropping context field {:?}: name is reserved", key);
                continue;
            }
            context.insert(key.as_str(), value.as_str());
        }

        Self {
            initiator_name: &config.initiator_name,
            initiator_language: &config.initiator_language,
            counterpart_name: &config.counterpart_name,
            counterpart_language: config.counterpart_language.as_deref(),
            session_id: &config.session_id,
            context,
        }
    }
}

/// Response of `POST /api/conversations/start`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartConversationResponse {
    pub transport: TransportGrant,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransportGrant {
    pub token: String,
    pub url: String,
}
