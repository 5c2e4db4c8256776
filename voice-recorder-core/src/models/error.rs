use thiserror::Error;

/// Errors that can occur while recording, finalizing, or playing back audio.
///
/// Payloads are plain strings so the error stays `Clone` and can be handed
/// to delegates from the capture thread.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Capture device cannot be opened or the storage location is unusable.
    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    /// The capture source reported its error sentinel for one read.
    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
