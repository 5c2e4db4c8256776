use std::sync::Arc;
use std::time::Duration;

use crate::models::error::CaptureError;

/// Fired once when asynchronous preparation has finished.
pub type PreparedCallback = Box<dyn FnOnce() + Send + 'static>;

/// Fired each time playback reaches the end of the source.
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Interface for a platform media decoder/player.
///
/// One instance plays one source. The playback controller creates a fresh
/// decoder for every prepare cycle and releases the old one first.
///
/// Callbacks must be delivered from the decoder's own thread, never from
/// inside one of these method calls: the controller holds its state lock
/// while calling them. `release` is the exception. It is always called
/// after that lock is dropped, so it may block until pending callbacks
/// have run.
pub trait AudioDecoder: Send + 'static {
    /// Point the decoder at `source` (a path or URL) and start preparing it
    /// in the background.
    ///
    /// `on_prepared` must be invoked from the decoder's own thread, never
    /// synchronously from inside this call.
    fn prepare_async(
        &mut self,
        source: &str,
        on_prepared: PreparedCallback,
        on_completion: CompletionCallback,
    ) -> Result<(), CaptureError>;

    fn start(&mut self) -> Result<(), CaptureError>;

    fn pause(&mut self) -> Result<(), CaptureError>;

    fn stop(&mut self) -> Result<(), CaptureError>;

    fn seek_to(&mut self, position: Duration) -> Result<(), CaptureError>;

    fn is_playing(&self) -> bool;

    /// Tear down all decoder resources. Safe in any state. Callbacks that
    /// still arrive afterwards are ignored by the controller.
    fn release(&mut self);
}
