pub mod backend;
pub mod loopback;

pub use backend::{MediaEvent, MediaSession, MediaSessionFactory};
pub use loopback::{LoopbackConfig, LoopbackMedia, LoopbackMediaFactory};
