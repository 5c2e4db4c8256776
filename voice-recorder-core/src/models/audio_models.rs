use serde::{Deserialize, Serialize};

/// Fixed PCM capture format.
///
/// Every session records with the same format; there is no way to change it
/// mid-session. `AudioFormat::VOICE` is the only format the recorder opens
/// capture sources with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// 16 kHz, mono, signed 16-bit little-endian linear PCM.
    pub const VOICE: AudioFormat = AudioFormat {
        sample_rate: 16_000,
        channels: 1,
        bits_per_sample: 16,
    };

    /// Bytes per second of audio: `bits * sample_rate * channels / 8`.
    pub fn byte_rate(&self) -> u32 {
        self.bits_per_sample as u32 * self.sample_rate * self.channels as u32 / 8
    }

    /// Bytes per frame: `channels * bits / 8`.
    pub fn frame_size(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    /// Duration in seconds of `payload_bytes` of PCM in this format.
    pub fn duration_secs(&self, payload_bytes: u64) -> f64 {
        let byte_rate = self.byte_rate();
        if byte_rate == 0 {
            return 0.0;
        }
        payload_bytes as f64 / byte_rate as f64
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::VOICE
    }
}

/// Kind of microphone backing a capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MicrophoneType {
    #[serde(rename = "built-in")]
    BuiltIn,
    #[serde(rename = "line-in")]
    LineIn,
    #[serde(rename = "headset")]
    Headset,
    #[serde(rename = "bluetooth-HFP")]
    BluetoothHfp,
    #[serde(rename = "USB")]
    Usb,
    #[serde(rename = "car")]
    Car,
}

/// A capture device as described by its `CaptureSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub microphone_type: Option<MicrophoneType>,
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_format_rates() {
        let format = AudioFormat::VOICE;
        assert_eq!(format.byte_rate(), 32_000);
        assert_eq!(format.frame_size(), 2);
        assert_eq!(format.duration_secs(64_000), 2.0);
    }

    #[test]
    fn microphone_type_wire_names() {
        let json = serde_json::to_string(&MicrophoneType::BluetoothHfp).unwrap();
        assert_eq!(json, "\"bluetooth-HFP\"");
        let parsed: MicrophoneType = serde_json::from_str("\"USB\"").unwrap();
        assert_eq!(parsed, MicrophoneType::Usb);
    }
}
