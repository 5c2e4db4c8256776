use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;

/// Append-only sink for one session's headerless PCM stream.
///
/// Samples are written as signed 16-bit little-endian, exactly the bytes
/// the container payload will carry. The file is truncated on creation
/// and closed by [`RawStreamWriter::finish`] (or on drop, without the
/// durability guarantees).
pub struct RawStreamWriter {
    file_path: PathBuf,
    file: BufWriter<File>,
    scratch: Vec<u8>,
    total_bytes_written: u64,
}

impl RawStreamWriter {
    /// Create (or truncate) the raw stream file, creating its directory.
    pub fn create(file_path: PathBuf) -> Result<Self, CaptureError> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&file_path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create raw stream: {}", e)))?;

        Ok(Self {
            file_path,
            file: BufWriter::new(file),
            scratch: Vec::new(),
            total_bytes_written: 0,
        })
    }

    /// Append samples verbatim.
    pub fn append(&mut self, samples: &[i16]) -> Result<(), CaptureError> {
        self.scratch.clear();
        self.scratch.reserve(samples.len() * 2);
        for sample in samples {
            self.scratch.extend_from_slice(&sample.to_le_bytes());
        }

        self.file
            .write_all(&self.scratch)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        self.total_bytes_written += self.scratch.len() as u64;
        Ok(())
    }

    /// Flush, sync and close the stream. Returns the payload length in bytes.
    pub fn finish(self) -> Result<u64, CaptureError> {
        let file = self
            .file
            .into_inner()
            .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| CaptureError::StorageError(format!("sync failed: {}", e)))?;
        Ok(self.total_bytes_written)
    }

    /// Payload bytes written so far (buffered bytes included).
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}
