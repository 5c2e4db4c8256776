use crate::models::audio_models::{AudioFormat, AudioSource};
use crate::models::error::CaptureError;

/// Interface for platform-specific microphone sources.
///
/// A source is opened once per recording session, read from on the
/// session's capture thread until the session stops, then closed on the
/// controlling thread. It is moved between those threads, hence `Send`.
pub trait CaptureSource: Send + 'static {
    /// Whether a capture device is currently present.
    fn is_available(&self) -> bool;

    /// Open the device with `format` and start delivering buffers.
    fn open(&mut self, format: &AudioFormat) -> Result<(), CaptureError>;

    /// Samples per read. The session allocates its buffer from this after `open`.
    fn buffer_size(&self) -> usize;

    /// Block until a buffer is ready and fill `buffer` with signed 16-bit
    /// samples. Returns the number of valid samples, which may be less than
    /// `buffer.len()` (including zero).
    ///
    /// `Err` is the per-read error sentinel: the session skips that
    /// iteration and keeps reading.
    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError>;

    /// Stop the device and release it.
    fn close(&mut self) -> Result<(), CaptureError>;

    /// Information about the device backing this source.
    fn device_info(&self) -> AudioSource;
}
