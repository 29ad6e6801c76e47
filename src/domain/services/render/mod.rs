use thiserror::Error;

pub mod render_worker;
pub mod repeater;

pub use self::render_worker::{RenderClient, RenderWorker};
pub use self::repeater::{RepeatTask, Repeater};

/// Errors returned to callers of the render dispatcher.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The worker has stopped
    #[error("Render worker channel closed")]
    ChannelClosed,

    /// The worker dropped the request without answering
    #[error("Failed to receive response from render worker")]
    NoResponse,
}
