use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;

/// Event delegate for recording session notifications.
///
/// `on_error` may be called from the capture thread; the other methods run
/// on whichever thread calls `start`/`stop`. Implementations should marshal
/// to the UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: RecorderState);

    /// Called for transient read errors and I/O failures during capture.
    fn on_error(&self, error: &CaptureError);

    /// Called when a recording has been finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
