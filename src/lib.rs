pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod presentation;
pub mod session;
pub mod token;

pub use config::Config;
pub use error::{ErrorInfo, ErrorKind, SessionError};
pub use http::{create_router, AppState};
pub use media::{LoopbackMediaFactory, MediaEvent, MediaSession, MediaSessionFactory};
pub use presentation::{ObserverHandle, PresentationAdapter, SessionObserver, UiIntent, ViewState};
pub use session::{
    ControllerOptions, ErrorSlot, ErrorSlots, SessionConfig, SessionController, SessionState,
    SessionStats, SessionStatus, StateTransition,
};
pub use token::{BackendCredentialSource, CredentialSource, Credentials, TokenClient};
