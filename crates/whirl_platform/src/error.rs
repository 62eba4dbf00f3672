//! Platform error types

use thiserror::Error;

/// Frame driver errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Refresh rate outside the supported range
    #[error("Invalid refresh rate: {0} Hz (expected 1..=1000)")]
    InvalidRefreshRate(u32),

    /// Failed to spawn the pacing thread
    #[error("Failed to spawn frame pacing thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
