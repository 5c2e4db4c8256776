use std::fmt::Write as _;
use std::path::{is_separator, Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{TimeZone, Utc};
use serde::Deserialize;

use super::audio_models::AudioFormat;
use super::error::CaptureError;
use crate::processing::wav_format::BlockAlign;

/// Recognized recorder options, as a host would write them in JSON.
///
/// This is the raw, unvalidated input. Turn it into a
/// [`RecorderConfiguration`] before handing it to a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecorderOptions {
    /// Destination folder for finalized recordings.
    pub directory: PathBuf,

    /// strftime pattern (chrono syntax) used as the filename stem.
    pub date_pattern: Option<String>,

    /// String prepended to every filename.
    pub file_prefix: String,

    /// Filename stem used when no date pattern is set.
    pub fallback_id: Option<String>,

    /// Where raw session streams are written (default: OS temp dir).
    pub temp_directory: Option<PathBuf>,

    /// Block-align formula for the container header.
    pub block_align: BlockAlign,

    /// Write a `.metadata.json` sidecar next to each recording.
    pub write_metadata: bool,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            date_pattern: None,
            file_prefix: String::new(),
            fallback_id: None,
            temp_directory: None,
            block_align: BlockAlign::Standard,
            write_metadata: false,
        }
    }
}

/// How the filename stem (between prefix and extension) is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStem {
    /// Local time at stop, formatted with this strftime pattern.
    Timestamp(String),
    /// A fixed identifier; every recording overwrites the previous one.
    Fixed(String),
}

/// Validated, immutable recorder configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfiguration {
    directory: PathBuf,
    file_prefix: String,
    file_stem: FileStem,
    temp_directory: PathBuf,
    block_align: BlockAlign,
    write_metadata: bool,
}

impl RecorderConfiguration {
    pub fn new(options: RecorderOptions) -> Result<Self, CaptureError> {
        if options.directory.as_os_str().is_empty() {
            return Err(CaptureError::ConfigurationFailed(
                "recording directory must not be empty".into(),
            ));
        }
        if options.file_prefix.contains(is_separator) {
            return Err(CaptureError::ConfigurationFailed(format!(
                "file prefix contains a path separator: {:?}",
                options.file_prefix
            )));
        }

        // An empty pattern is the same as no pattern.
        let date_pattern = options.date_pattern.filter(|p| !p.is_empty());
        let fallback_id = options.fallback_id.filter(|id| !id.is_empty());

        let file_stem = match (date_pattern, fallback_id) {
            (Some(pattern), _) => {
                validate_date_pattern(&pattern)?;
                FileStem::Timestamp(pattern)
            }
            (None, Some(id)) => {
                if id.contains(is_separator) {
                    return Err(CaptureError::ConfigurationFailed(format!(
                        "fallback id contains a path separator: {:?}",
                        id
                    )));
                }
                FileStem::Fixed(id)
            }
            (None, None) => {
                return Err(CaptureError::ConfigurationFailed(
                    "either a date pattern or a fallback id is required".into(),
                ))
            }
        };

        Ok(Self {
            directory: options.directory,
            file_prefix: options.file_prefix,
            file_stem,
            temp_directory: options.temp_directory.unwrap_or_else(std::env::temp_dir),
            block_align: options.block_align,
            write_metadata: options.write_metadata,
        })
    }

    /// Parse `RecorderOptions` from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let options: RecorderOptions = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid options: {}", e)))?;
        Self::new(options)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    pub fn file_stem(&self) -> &FileStem {
        &self.file_stem
    }

    pub fn temp_directory(&self) -> &Path {
        &self.temp_directory
    }

    pub fn block_align(&self) -> BlockAlign {
        self.block_align
    }

    pub fn write_metadata(&self) -> bool {
        self.write_metadata
    }

    /// The capture format. Fixed for every session.
    pub fn format(&self) -> AudioFormat {
        AudioFormat::VOICE
    }
}

fn validate_date_pattern(pattern: &str) -> Result<(), CaptureError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(CaptureError::ConfigurationFailed(format!(
            "invalid date pattern: {:?}",
            pattern
        )));
    }

    let sample = Utc
        .with_ymd_and_hms(2000, 12, 31, 23, 59, 59)
        .single()
        .ok_or_else(|| CaptureError::Unknown("sample timestamp out of range".into()))?;
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format(pattern)).map_err(|_| {
        CaptureError::ConfigurationFailed(format!("unformattable date pattern: {:?}", pattern))
    })?;
    if rendered.contains(is_separator) {
        return Err(CaptureError::ConfigurationFailed(format!(
            "date pattern produces a path separator: {:?}",
            pattern
        )));
    }
    Ok(())
}
