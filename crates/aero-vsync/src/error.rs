use thiserror::Error;

pub type Result<T> = std::result::Result<T, VsyncError>;

/// Errors surfaced by the vsync generator.
///
/// Ticking, locking and waiting are infallible once a generator is running; errors only come from
/// validating configuration at the boundary and from spawning the ticker thread.
#[derive(Debug, Error)]
pub enum VsyncError {
    #[error("invalid refresh rate {hz} Hz (expected a non-zero rate)")]
    InvalidRefreshRate { hz: u32 },

    #[error("invalid value for env var {0}")]
    InvalidEnv(&'static str),

    /// The OS refused to create the ticker thread.
    #[error("failed to spawn vsync ticker thread: {0}")]
    Spawn(#[source] std::io::Error),
}
