use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::MediaSessionFactory;
use crate::presentation::PresentationAdapter;
use crate::session::ControllerOptions;
use crate::token::CredentialSource;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live sessions (session_id → adapter)
    pub sessions: Arc<RwLock<HashMap<String, Arc<PresentationAdapter>>>>,

    /// Where new sessions get their credentials
    pub credentials: Arc<dyn CredentialSource>,

    /// Builds the media session for each new controller
    pub media: Arc<dyn MediaSessionFactory>,

    pub options: ControllerOptions,
}

impl AppState {
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        media: Arc<dyn MediaSessionFactory>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            credentials,
            media,
            options,
        }
    }
}
