use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SessionError;

/// Caller-supplied description of one translation session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name of the party starting the session (e.g. the driver)
    pub initiator_name: String,

    /// Language the initiator speaks
    pub initiator_language: String,

    /// Name of the other party
    pub counterpart_name: String,

    /// Language the counterpart speaks; `None` lets the backend auto-detect
    #[serde(default)]
    pub counterpart_language: Option<String>,

    /// Unique identifier for this session attempt
    #[serde(default = "generate_session_id")]
    pub session_id: String,

    /// Free-form metadata forwarded to the backend (e.g. pickup/dropoff)
    #[serde(default)]
    pub context_fields: BTreeMap<String, String>,
}

pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl SessionConfig {
    pub fn new(
        initiator_name: impl Into<String>,
        initiator_language: impl Into<String>,
        counterpart_name: impl Into<String>,
    ) -> Self {
        Self {
            initiator_name: initiator_name.into(),
            initiator_language: initiator_language.into(),
            counterpart_name: counterpart_name.into(),
            counterpart_language: None,
            session_id: generate_session_id(),
            context_fields: BTreeMap::new(),
        }
    }

    pub fn with_counterpart_language(mut self, language: impl Into<String>) -> Self {
        self.counterpart_language = Some(language.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_fields.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.initiator_name.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "initiator_name must not be empty".to_string(),
            ));
        }
        if self.initiator_language.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "initiator_language must not be empty".to_string(),
            ));
        }
        if self.counterpart_name.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "counterpart_name must not be empty".to_string(),
            ));
        }
        if self.session_id.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "session_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_distinct_ids() {
        let a = SessionConfig::new("Ana", "English", "Ben");
        let b = SessionConfig::new("Ana", "English", "Ben");
        assert_ne!(a.session_id, b.session_id);
        assert!(a.counterpart_language.is_none());
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        assert!(SessionConfig::new("", "English", "Ben").validate().is_err());
        assert!(SessionConfig::new("Ana", "English", "  ").validate().is_err());
        assert!(SessionConfig::new("Ana", "English", "Ben").validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = r#"{
            "initiator_name": "Ana",
            "initiator_language": "English",
            "counterpart_name": "Ben"
        }"#;

        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert!(!config.session_id.is_empty());
        assert!(config.counterpart_language.is_none());
        assert!(config.context_fields.is_empty());
    }
}
