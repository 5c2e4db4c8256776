use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::{AudioFormat, AudioSource};

/// Outcome of a successfully finalized recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub payload_bytes: u64,
    pub duration_secs: f64,
    pub metadata: RecordingMetadata,
    /// SHA-256 hex digest of the complete container file.
    pub checksum: String,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the optional JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    pub created_at: String,
    pub duration_secs: f64,
    pub payload_bytes: u64,
    pub format: AudioFormat,
    pub checksum: String,
    pub source: Option<AudioSource>,
}

impl RecordingMetadata {
    pub fn new(
        file_path: &str,
        format: AudioFormat,
        payload_bytes: u64,
        checksum: &str,
        source: Option<AudioSource>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: format.duration_secs(payload_bytes),
            payload_bytes,
            format,
            checksum: checksum.to_string(),
            source,
        }
    }
}
