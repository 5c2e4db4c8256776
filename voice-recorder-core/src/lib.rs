//! # voice-recorder-core
//!
//! Microphone recording pipeline and playback control.
//!
//! A `RecordingSession` pulls fixed-size 16-bit buffers from a
//! `CaptureSource` on a background thread, publishes a live RMS amplitude,
//! and appends the samples to a raw temp stream. On stop it joins the
//! thread and wraps the stream in a 44-byte-header WAV container.
//! A `PlaybackController` drives any `AudioDecoder` through
//! prepare/play/pause/stop/seek.
//!
//! ## Architecture
//!
//! ```text
//! voice-recorder-core (this crate)
//! ├── traits/       ← CaptureSource, RecorderDelegate, AudioDecoder
//! ├── models/       ← CaptureError, AudioFormat, RecorderConfiguration, states, RecordingResult
//! ├── processing/   ← RMS loudness + AmplitudeHandle, WAV header generation
//! ├── storage/      ← RawStreamWriter, container finalizer, file naming, metadata sidecar
//! ├── sources/      ← PcmReaderSource
//! └── session/      ← RecordingSession, PlaybackController
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioFormat, AudioSource, MicrophoneType};
pub use models::config::{FileStem, RecorderConfiguration, RecorderOptions};
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{PlaybackState, RecorderState};
pub use processing::loudness::AmplitudeHandle;
pub use processing::wav_format::BlockAlign;
pub use session::player::PlaybackController;
pub use session::recorder::RecordingSession;
pub use sources::pcm_reader::PcmReaderSource;
pub use storage::finalizer::{finalize_container, FinalizedContainer};
pub use storage::raw_writer::RawStreamWriter;
pub use traits::capture_delegate::RecorderDelegate;
pub use traits::capture_source::CaptureSource;
pub use traits::decoder::{AudioDecoder, CompletionCallback, PreparedCallback};
