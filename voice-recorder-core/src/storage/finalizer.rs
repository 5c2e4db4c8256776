use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_models::AudioFormat;
use crate::models::error::CaptureError;
use crate::processing::wav_format::{self, BlockAlign, MAX_PAYLOAD_SIZE};

const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// A container written by [`finalize_container`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedContainer {
    pub path: PathBuf,
    pub payload_bytes: u64,
    /// SHA-256 hex digest of the whole file, header included.
    pub checksum: String,
}

/// Sibling name the container is written under before it replaces
/// `destination`.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Wrap a raw PCM stream in a WAV container at `destination`.
///
/// The payload length is the raw file's size at open time. The header and
/// streamed payload go to [`partial_path`] first, which is renamed over
/// `destination` once it is complete and synced. On failure only the
/// partial file is removed, so an existing file at `destination` is left
/// untouched. The raw stream is never modified.
pub fn finalize_container(
    raw_path: &Path,
    destination: &Path,
    format: &AudioFormat,
    block_align: BlockAlign,
) -> Result<FinalizedContainer, CaptureError> {
    let raw = File::open(raw_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to open raw stream: {}", e)))?;
    let payload_bytes = raw
        .metadata()
        .map_err(|e| CaptureError::StorageError(format!("failed to stat raw stream: {}", e)))?
        .len();

    if payload_bytes > MAX_PAYLOAD_SIZE {
        return Err(CaptureError::StorageError(format!(
            "payload of {} bytes exceeds the WAV size limit",
            payload_bytes
        )));
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
    }

    let partial = partial_path(destination);
    let out = File::create(&partial)
        .map_err(|e| CaptureError::StorageError(format!("failed to create container: {}", e)))?;

    let header = wav_format::generate_wav_header(format, block_align, payload_bytes as u32);

    let written = write_container(raw, out, &header, payload_bytes).and_then(|checksum| {
        fs::rename(&partial, destination)
            .map_err(|e| CaptureError::StorageError(format!("failed to move container into place: {}", e)))?;
        Ok(checksum)
    });

    match written {
        Ok(checksum) => {
            log::info!(
                "Finalized {} ({} payload bytes)",
                destination.display(),
                payload_bytes
            );
            Ok(FinalizedContainer {
                path: destination.to_path_buf(),
                payload_bytes,
                checksum,
            })
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&partial) {
                log::warn!(
                    "Failed to remove partial container {}: {}",
                    partial.display(),
                    remove_err
                );
            }
            Err(e)
        }
    }
}

fn write_container(
    raw: File,
    out: File,
    header: &[u8],
    payload_bytes: u64,
) -> Result<String, CaptureError> {
    let mut hasher = Sha256::new();
    let mut out = BufWriter::new(out);

    out.write_all(header)
        .map_err(|e| CaptureError::StorageError(format!("header write failed: {}", e)))?;
    hasher.update(header);

    let mut payload = raw.take(payload_bytes);
    let mut chunk = vec![0u8; COPY_CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let n = match payload.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CaptureError::StorageError(format!("raw stream read failed: {}", e))),
        };
        out.write_all(&chunk[..n])
            .map_err(|e| CaptureError::StorageError(format!("payload write failed: {}", e)))?;
        hasher.update(&chunk[..n]);
        copied += n as u64;
    }

    if copied != payload_bytes {
        return Err(CaptureError::StorageError(format!(
            "raw stream shorter than expected: {} of {} bytes",
            copied, payload_bytes
        )));
    }

    let file = out
        .into_inner()
        .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e.error())))?;
    file.sync_all()
        .map_err(|e| CaptureError::StorageError(format!("sync failed: {}", e)))?;

    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    }

    #[test]
    fn wraps_payload_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("session.raw");
        let dest = dir.path().join("out").join("audio_001.wav");
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        fs::write(&raw, &payload).unwrap();

        let container = finalize_container(&raw, &dest, &AudioFormat::VOICE, BlockAlign::Standard).unwrap();
        assert_eq!(container.payload_bytes, 1000);
        assert_eq!(container.path, dest);

        let data = fs::read(&dest).unwrap();
        assert_eq!(data.len(), 44 + 1000);
        assert_eq!(u32_at(&data, 4), 1036);
        assert_eq!(u32_at(&data, 40), 1000);
        assert_eq!(&data[44..], &payload[..]);

        // raw stream is left for the caller to delete
        assert!(raw.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn empty_payload_gives_bare_header() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("empty.raw");
        let dest = dir.path().join("empty.wav");
        fs::write(&raw, b"").unwrap();

        finalize_container(&raw, &dest, &AudioFormat::VOICE, BlockAlign::Standard).unwrap();

        let data = fs::read(&dest).unwrap();
        assert_eq!(data.len(), 44);
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(u32_at(&data, 4), 36);
        assert_eq!(u32_at(&data, 40), 0);
    }

    #[test]
    fn checksum_covers_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("session.raw");
        let dest = dir.path().join("audio.wav");
        fs::write(&raw, [7u8; 64]).unwrap();

        let container = finalize_container(&raw, &dest, &AudioFormat::VOICE, BlockAlign::Standard).unwrap();

        let expected = hex_encode(&Sha256::digest(fs::read(&dest).unwrap()));
        assert_eq!(container.checksum, expected);
        assert_eq!(container.checksum.len(), 64);
    }

    #[test]
    fn missing_raw_stream_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("missing.raw");
        let dest = dir.path().join("audio.wav");

        let result = finalize_container(&raw, &dest, &AudioFormat::VOICE, BlockAlign::Standard);
        assert!(matches!(result, Err(CaptureError::StorageError(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn overwrites_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("session.raw");
        let dest = dir.path().join("audio.wav");
        fs::write(&dest, vec![0xEE; 4096]).unwrap();
        fs::write(&raw, [1u8, 2, 3, 4]).unwrap();

        finalize_container(&raw, &dest, &AudioFormat::VOICE, BlockAlign::Legacy).unwrap();

        let data = fs::read(&dest).unwrap();
        assert_eq!(data.len(), 48);
        assert_eq!(&data[44..], &[1, 2, 3, 4]);
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/rec/audio_001.wav")),
            PathBuf::from("/rec/audio_001.wav.part")
        );
    }

    #[test]
    fn blocked_partial_file_keeps_existing_container() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("session.raw");
        let dest = dir.path().join("audio.wav");
        fs::write(&dest, b"previous take").unwrap();
        fs::write(&raw, [1u8, 2, 3, 4]).unwrap();
        fs::create_dir(partial_path(&dest)).unwrap();

        let result = finalize_container(&raw, &dest, &AudioFormat::VOICE, BlockAlign::Standard);
        assert!(matches!(result, Err(CaptureError::StorageError(_))));
        assert_eq!(fs::read(&dest).unwrap(), b"previous take");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_copy_keeps_existing_container() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("session.raw");
        let dest = dir.path().join("audio.wav");
        fs::write(&dest, b"previous take").unwrap();
        fs::write(&raw, [5u8; 128]).unwrap();
        // Every write to /dev/full fails with ENOSPC.
        std::os::unix::fs::symlink("/dev/full", partial_path(&dest)).unwrap();

        let result = finalize_container(&raw, &dest, &AudioFormat::VOICE, BlockAlign::Standard);
        assert!(matches!(result, Err(CaptureError::StorageError(_))));
        assert_eq!(fs::read(&dest).unwrap(), b"previous take");
        assert!(fs::symlink_metadata(partial_path(&dest)).is_err());
    }
}
