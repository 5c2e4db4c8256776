use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Root-mean-square of 16-bit samples.
///
/// Returns `None` for an empty slice so callers can keep their previous
/// reading instead of dividing by zero. The result is in raw sample units
/// (0.0 ..= 32768.0), not normalized.
pub fn rms_level(samples: &[i16]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum_sq: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    Some((sum_sq / samples.len() as f64).sqrt())
}

/// Single-writer / multi-reader cell holding the latest loudness reading.
///
/// The value is stored as `f64` bits in an `AtomicU64`, so readers never
/// observe a torn write. Cloning shares the same cell.
#[derive(Debug, Clone, Default)]
pub struct AmplitudeHandle {
    bits: Arc<AtomicU64>,
}

impl AmplitudeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published amplitude, 0.0 before anything was measured.
    pub fn current(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Measure `samples` and publish the result.
    ///
    /// An empty slice leaves the previous value untouched.
    pub fn publish(&self, samples: &[i16]) {
        if let Some(level) = rms_level(samples) {
            self.bits.store(level.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn reset(&self) {
        self.bits.store(0.0f64.to_bits(), Ordering::Relaxed);
    }
}
