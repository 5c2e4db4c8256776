/// Recording session state machine.
///
/// ```text
/// idle ──start──▶ capturing ──stop (join, finalize)──▶ idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Capturing,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }
}

/// Playback controller state machine.
///
/// ```text
/// idle → preparing → prepared → playing ⇄ paused
///                                  ↓        ↓
///                                idle (stop / release)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Prepared,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Whether the decoder has finished preparing its current source.
    pub fn is_prepared(&self) -> bool {
        matches!(self, Self::Prepared | Self::Playing | Self::Paused)
    }
}
