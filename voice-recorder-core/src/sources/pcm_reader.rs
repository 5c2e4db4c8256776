//! Capture source backed by a stream of raw 16-bit little-endian PCM.
//!
//! Useful for feeding pre-recorded audio or a pipe from an external
//! capture process through the recording pipeline.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::models::audio_models::{AudioFormat, AudioSource};
use crate::models::error::CaptureError;
use crate::traits::capture_source::CaptureSource;

/// Reads fixed-size sample buffers from any `Read`.
///
/// At end of input every read reports zero valid samples after waiting one
/// buffer's duration, so an exhausted source idles instead of spinning the
/// capture thread. With pacing enabled every read waits that long, and the
/// source behaves like a live device instead of draining as fast as possible.
pub struct PcmReaderSource<R> {
    name: String,
    reader: R,
    buffer_size: usize,
    paced: bool,
    format: Option<AudioFormat>,
    bytes: Vec<u8>,
}

impl PcmReaderSource<BufReader<File>> {
    /// Source reading a headerless PCM file.
    pub fn open_file(path: &Path, buffer_size: usize) -> Result<Self, CaptureError> {
        let file = File::open(path).map_err(|e| {
            CaptureError::DeviceNotAvailable(format!("failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(path.display().to_string(), BufReader::new(file), buffer_size))
    }
}

impl<R: Read + Send + 'static> PcmReaderSource<R> {
    pub fn new(name: impl Into<String>, reader: R, buffer_size: usize) -> Self {
        Self {
            name: name.into(),
            reader,
            buffer_size: buffer_size.max(1),
            paced: false,
            format: None,
            bytes: Vec::new(),
        }
    }

    /// Sleep one buffer duration per read.
    pub fn with_pacing(mut self) -> Self {
        self.paced = true;
        self
    }

    /// Fill `self.bytes` as far as the reader allows. Returns bytes read.
    fn fill(&mut self, wanted: usize) -> io::Result<usize> {
        self.bytes.resize(wanted, 0);
        let mut filled = 0;
        while filled < wanted {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + Send + 'static> CaptureSource for PcmReaderSource<R> {
    fn is_available(&self) -> bool {
        true
    }

    fn open(&mut self, format: &AudioFormat) -> Result<(), CaptureError> {
        if format.bits_per_sample != 16 {
            return Err(CaptureError::ConfigurationFailed(format!(
                "unsupported bit depth: {}",
                format.bits_per_sample
            )));
        }
        self.format = Some(*format);
        Ok(())
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError> {
        let format = self
            .format
            .ok_or_else(|| CaptureError::ReadFailed("source is not open".into()))?;

        let wanted = buffer.len().min(self.buffer_size);
        let filled = self
            .fill(wanted * 2)
            .map_err(|e| CaptureError::ReadFailed(e.to_string()))?;
        if filled % 2 != 0 {
            log::warn!("{}: dropping trailing odd byte", self.name);
        }

        let count = filled / 2;
        for (sample, pair) in buffer.iter_mut().zip(self.bytes[..count * 2].chunks_exact(2)) {
            *sample = i16::from_le_bytes([pair[0], pair[1]]);
        }

        if self.paced || count == 0 {
            let buffer_bytes = wanted as u64 * (format.bits_per_sample / 8) as u64;
            thread::sleep(Duration::from_secs_f64(format.duration_secs(buffer_bytes)));
        }

        Ok(count)
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.format = None;
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: format!("pcm:{}", self.name),
            name: self.name.clone(),
            microphone_type: None,
            is_default: false,
        }
    }
}
