use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::models::config::{FileStem, RecorderConfiguration};
use crate::models::error::CaptureError;

/// Extension of every finalized recording.
pub const FILE_EXTENSION: &str = "wav";

/// Destination path for a recording finished at `now`:
/// `<directory>/<prefix><timestamp-or-fallback>.wav`.
pub fn output_path<Tz>(config: &RecorderConfiguration, now: &DateTime<Tz>) -> Result<PathBuf, CaptureError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let stem = match config.file_stem() {
        FileStem::Timestamp(pattern) => {
            let mut stamp = String::new();
            write!(stamp, "{}", now.format(pattern)).map_err(|_| {
                CaptureError::ConfigurationFailed(format!("unformattable date pattern: {:?}", pattern))
            })?;
            stamp
        }
        FileStem::Fixed(id) => id.clone(),
    };

    Ok(config
        .directory()
        .join(format!("{}{}.{}", config.file_prefix(), stem, FILE_EXTENSION)))
}

/// A fresh raw-stream path for one session inside the temp directory.
pub fn temp_stream_path(config: &RecorderConfiguration) -> PathBuf {
    config
        .temp_directory()
        .join(format!("record_{}.raw", uuid::Uuid::new_v4().simple()))
}

/// Make sure `dir` exists and is a directory.
///
/// Failure means the storage location is unusable, which the recorder
/// reports as an unavailable device.
pub fn ensure_directory(dir: &Path) -> Result<(), CaptureError> {
    fs::create_dir_all(dir).map_err(|e| {
        CaptureError::DeviceNotAvailable(format!("storage unavailable at {}: {}", dir.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::config::RecorderOptions;

    fn config(date_pattern: Option<&str>) -> RecorderConfiguration {
        RecorderConfiguration::new(RecorderOptions {
            directory: PathBuf::from("/rec"),
            file_prefix: "audio_".into(),
            fallback_id: Some("001".into()),
            date_pattern: date_pattern.map(str::to_string),
            temp_directory: Some(PathBuf::from("/tmp/voice")),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn fallback_id_name() {
        let now = Utc.with_ymd_and_hms(2015, 4, 26, 10, 30, 0).unwrap();
        let path = output_path(&config(None), &now).unwrap();
        assert_eq!(path, PathBuf::from("/rec/audio_001.wav"));
    }

    #[test]
    fn timestamp_name() {
        let now = Utc.with_ymd_and_hms(2015, 4, 26, 10, 30, 5).unwrap();
        let path = output_path(&config(Some("%Y_%m_%d_%H_%M_%S")), &now).unwrap();
        assert_eq!(path, PathBuf::from("/rec/audio_2015_04_26_10_30_05.wav"));
    }

    #[test]
    fn temp_paths_are_unique() {
        let config = config(None);
        let a = temp_stream_path(&config);
        let b = temp_stream_path(&config);
        assert_ne!(a, b);
        assert!(a.starts_with("/tmp/voice"));
        assert_eq!(a.extension().unwrap(), "raw");
    }

    #[test]
    fn ensure_directory_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn ensure_directory_fails_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, b"x").unwrap();
        let result = ensure_directory(&file.join("sub"));
        assert!(matches!(result, Err(CaptureError::DeviceNotAvailable(_))));
    }
}
