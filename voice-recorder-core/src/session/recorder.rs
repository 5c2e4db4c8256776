use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Local;

use crate::models::audio_models::AudioSource;
use crate::models::config::RecorderConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::RecorderState;
use crate::processing::loudness::AmplitudeHandle;
use crate::storage::finalizer;
use crate::storage::metadata;
use crate::storage::naming;
use crate::storage::raw_writer::RawStreamWriter;
use crate::traits::capture_delegate::RecorderDelegate;
use crate::traits::capture_source::CaptureSource;

/// What the capture thread hands back when it exits.
struct CaptureOutcome<S> {
    source: S,
    /// Payload bytes written, or the I/O error that ended the loop.
    result: Result<u64, CaptureError>,
}

/// Everything owned by one Capturing period.
struct ActiveCapture<S> {
    running: Arc<AtomicBool>,
    handle: thread::JoinHandle<CaptureOutcome<S>>,
    temp_path: PathBuf,
    device: AudioSource,
}

/// Recording session controller.
///
/// Owns the capture source, the background capture thread and the raw
/// stream of the current session. Only one session can be capturing at a
/// time; `start` and `stop` take `&mut self`, so hosts sharing a recorder
/// across threads wrap it in a mutex.
///
/// Data flow:
/// ```text
/// [CaptureSource] → buffer ─┬→ [rms_level] → AmplitudeHandle
///                           └→ [RawStreamWriter] → record_<uuid>.raw
///
/// stop: join thread → close source → finalize_container → <dir>/<prefix><stem>.wav
/// ```
///
/// The amplitude keeps its last reading after `stop` and is reset to 0 when
/// the next session starts.
pub struct RecordingSession<S: CaptureSource> {
    config: RecorderConfiguration,
    source: Option<S>,
    active: Option<ActiveCapture<S>>,
    amplitude: AmplitudeHandle,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    last_recording: Option<RecordingResult>,
}

impl<S: CaptureSource> RecordingSession<S> {
    pub fn new(source: S, config: RecorderConfiguration) -> Self {
        Self {
            config,
            source: Some(source),
            active: None,
            amplitude: AmplitudeHandle::new(),
            delegate: None,
            last_recording: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Capturing
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_capturing()
    }

    /// Latest loudness reading (RMS in raw 16-bit sample units).
    pub fn current_amplitude(&self) -> f64 {
        self.amplitude.current()
    }

    /// A handle for polling the amplitude from other threads.
    pub fn amplitude_handle(&self) -> AmplitudeHandle {
        self.amplitude.clone()
    }

    /// Path of the most recent successfully finalized recording.
    pub fn last_output_path(&self) -> Option<&Path> {
        self.last_recording.as_ref().map(|r| r.file_path.as_path())
    }

    pub fn last_recording(&self) -> Option<&RecordingResult> {
        self.last_recording.as_ref()
    }

    /// The capture device, if the source is still owned by this session.
    pub fn device_info(&self) -> Option<AudioSource> {
        match (&self.active, &self.source) {
            (Some(active), _) => Some(active.device.clone()),
            (None, Some(source)) => Some(source.device_info()),
            (None, None) => None,
        }
    }

    /// Start capturing. Returns immediately; a no-op if already capturing.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            log::debug!("start ignored: already capturing");
            return Ok(());
        }

        let mut source = self.source.take().ok_or_else(|| {
            CaptureError::DeviceNotAvailable("capture source was lost by a previous session".into())
        })?;

        let writer = match self.open_capture(&mut source) {
            Ok(writer) => writer,
            Err(e) => {
                self.source = Some(source);
                log::warn!("Recording not started: {}", e);
                self.report(&e);
                return Err(e);
            }
        };

        let device = source.device_info();
        let temp_path = writer.file_path().to_path_buf();
        let running = Arc::new(AtomicBool::new(true));
        self.amplitude.reset();

        let loop_running = Arc::clone(&running);
        let amplitude = self.amplitude.clone();
        let delegate = self.delegate.clone();

        let handle = thread::Builder::new()
            .name("audio-recorder".into())
            .spawn(move || capture_loop(source, writer, &loop_running, &amplitude, delegate.as_deref()))
            .map_err(|e| {
                // The source went down with the closure; the next start reports it lost.
                remove_temp(&temp_path);
                CaptureError::Unknown(format!("failed to spawn capture thread: {}", e))
            })?;

        log::info!(
            "Recording started on {} ({} Hz, {} ch, {} bit)",
            device.name,
            self.config.format().sample_rate,
            self.config.format().channels,
            self.config.format().bits_per_sample
        );

        self.active = Some(ActiveCapture {
            running,
            handle,
            temp_path,
            device,
        });
        self.notify_state(RecorderState::Capturing);
        Ok(())
    }

    /// Stop capturing and finalize the recording.
    ///
    /// Blocks until the capture thread has exited and the raw stream is
    /// closed, then writes the container. Returns `Ok(None)` if no session
    /// was capturing.
    pub fn stop(&mut self) -> Result<Option<PathBuf>, CaptureError> {
        let Some(active) = self.active.take() else {
            log::debug!("stop ignored: no recording in progress");
            return Ok(None);
        };

        let result = self.finish_capture(active);
        self.notify_state(RecorderState::Idle);
        match result {
            Ok(recording) => {
                let path = recording.file_path.clone();
                if let Some(ref delegate) = self.delegate {
                    delegate.on_recording_finished(&recording);
                }
                self.last_recording = Some(recording);
                Ok(Some(path))
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    // --- Internal helpers ---

    /// Check the device and storage, create the raw stream, open the source.
    fn open_capture(&self, source: &mut S) -> Result<RawStreamWriter, CaptureError> {
        if !source.is_available() {
            return Err(CaptureError::DeviceNotAvailable(format!(
                "{} is not available",
                source.device_info().name
            )));
        }

        naming::ensure_directory(self.config.directory())?;
        naming::ensure_directory(self.config.temp_directory())?;

        let writer = RawStreamWriter::create(naming::temp_stream_path(&self.config))?;

        if let Err(e) = source.open(&self.config.format()) {
            remove_temp(writer.file_path());
            return Err(e);
        }
        Ok(writer)
    }

    fn finish_capture(&mut self, active: ActiveCapture<S>) -> Result<RecordingResult, CaptureError> {
        let ActiveCapture {
            running,
            handle,
            temp_path,
            device,
        } = active;

        running.store(false, Ordering::Release);
        let outcome = handle.join().map_err(|_| {
            CaptureError::Unknown(format!(
                "capture thread panicked; raw stream left at {}",
                temp_path.display()
            ))
        })?;

        let CaptureOutcome { mut source, result } = outcome;
        if let Err(e) = source.close() {
            log::warn!("Failed to close capture source: {}", e);
        }
        self.source = Some(source);

        let payload_bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Recording abandoned: {}", e);
                remove_temp(&temp_path);
                return Err(e);
            }
        };
        log::debug!("Capture thread joined after {} bytes", payload_bytes);

        let destination = naming::output_path(&self.config, &Local::now())?;
        naming::ensure_directory(self.config.directory())?;

        let format = self.config.format();
        let container = finalizer::finalize_container(&temp_path, &destination, &format, self.config.block_align())
            .map_err(|e| {
                log::error!("Finalization failed, raw stream kept at {}: {}", temp_path.display(), e);
                e
            })?;
        remove_temp(&temp_path);

        let metadata = RecordingMetadata::new(
            &destination.to_string_lossy(),
            format,
            container.payload_bytes,
            &container.checksum,
            Some(device),
        );
        if self.config.write_metadata() {
            if let Err(e) = metadata::write_metadata(&metadata, &destination) {
                log::warn!("Recording saved without metadata sidecar: {}", e);
                self.report(&e);
            }
        }

        log::info!(
            "Recording saved to {} ({:.2}s)",
            destination.display(),
            metadata.duration_secs
        );

        Ok(RecordingResult {
            file_path: container.path,
            payload_bytes: container.payload_bytes,
            duration_secs: metadata.duration_secs,
            checksum: container.checksum,
            metadata,
        })
    }

    fn notify_state(&self, state: RecorderState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }

    fn report(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

impl<S: CaptureSource> Drop for RecordingSession<S> {
    fn drop(&mut self) {
        if self.active.is_some() {
            if let Err(e) = self.stop() {
                log::error!("Failed to finalize recording on drop: {}", e);
            }
        }
    }
}

/// Background capture loop: read → measure → append, until `running` clears.
///
/// A read that is already in flight when `running` clears is still written.
/// Read errors skip the iteration; a write error ends the loop.
fn capture_loop<S: CaptureSource>(
    mut source: S,
    mut writer: RawStreamWriter,
    running: &AtomicBool,
    amplitude: &AmplitudeHandle,
    delegate: Option<&dyn RecorderDelegate>,
) -> CaptureOutcome<S> {
    let mut buffer = vec![0i16; source.buffer_size().max(1)];

    while running.load(Ordering::Acquire) {
        let count = match source.read(&mut buffer) {
            Ok(count) => count.min(buffer.len()),
            Err(e) => {
                log::warn!("Capture read failed, skipping buffer: {}", e);
                if let Some(delegate) = delegate {
                    delegate.on_error(&e);
                }
                continue;
            }
        };

        let samples = &buffer[..count];
        amplitude.publish(samples);

        if let Err(e) = writer.append(samples) {
            log::error!("Failed to write audio data: {}", e);
            if let Some(delegate) = delegate {
                delegate.on_error(&e);
            }
            return CaptureOutcome { source, result: Err(e) };
        }
    }

    let result = writer.finish();
    CaptureOutcome { source, result }
}

fn remove_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        log::warn!("Failed to remove raw stream {}: {}", path.display(), e);
    }
}
