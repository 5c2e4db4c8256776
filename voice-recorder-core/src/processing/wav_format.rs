//! RIFF/WAVE container header generation.
//!
//! A finalized recording is a fixed 44-byte header followed by the raw
//! PCM payload, all multi-byte fields little-endian.

use serde::Deserialize;

use crate::models::audio_models::AudioFormat;

/// Size of the RIFF/WAVE header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Header bytes counted by the RIFF size field beyond the payload
/// (everything after the initial `"RIFF" <size>` group).
pub const RIFF_OVERHEAD: u32 = 36;

/// Largest payload whose RIFF size field still fits in 32 bits.
pub const MAX_PAYLOAD_SIZE: u64 = (u32::MAX - RIFF_OVERHEAD) as u64;

/// Formula used for the block-align field at offset 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockAlign {
    /// `channels * bits / 8`, what every WAV reader expects.
    #[default]
    Standard,
    /// Low byte of `bits * sample_rate / 8` with a zero high byte, as the
    /// older recorders wrote it. For 16 kHz this is `0x00 0x00`.
    Legacy,
}

impl BlockAlign {
    pub fn value(&self, format: &AudioFormat) -> u16 {
        match self {
            Self::Standard => format.frame_size(),
            Self::Legacy => {
                let legacy = format.bits_per_sample as u32 * format.sample_rate / 8;
                (legacy & 0xff) as u16
            }
        }
    }
}

/// Generate a 44-byte WAV RIFF header for `data_size` bytes of payload.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    data_size + 36
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = bits * sample_rate * channels / 8
/// [32-33]  block_align (see `BlockAlign`)
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// `data_size` must not exceed [`MAX_PAYLOAD_SIZE`].
pub fn generate_wav_header(format: &AudioFormat, block_align: BlockAlign, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let chunk_size = RIFF_OVERHEAD + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&block_align.value(format).to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}
