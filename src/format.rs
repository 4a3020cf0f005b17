use std::time::Duration;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// PCM layout of decoded audio flowing through the jitter buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum FormatError {
    #[display(fmt = "sample rate must be non-zero")]
    ZeroSampleRate,
    #[display(fmt = "channel count must be non-zero")]
    ZeroChannels,
    #[display(fmt = "bits per sample must be a non-zero multiple of 8, got {}", _0)]
    BitsPerSample(u16),
}

impl AudioFormat {
    /// 16 bit stereo at 48kHz
    pub const DEFAULT: AudioFormat = AudioFormat {
        sample_rate: 48000,
        channels: 2,
        bits_per_sample: 16,
    };

    pub fn validate(&self) -> Result<(), FormatError> {
        if self.sample_rate == 0 {
            return Err(FormatError::ZeroSampleRate);
        }

        if self.channels == 0 {
            return Err(FormatError::ZeroChannels);
        }

        if self.bits_per_sample == 0 || self.bits_per_sample % 8 != 0 {
            return Err(FormatError::BitsPerSample(self.bits_per_sample));
        }

        Ok(())
    }

    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bits_per_sample / 8)
    }

    /// `None` when the byte count does not fit in memory.
    pub fn bytes_for_frames(&self, frames: usize) -> Option<usize> {
        frames.checked_mul(self.bytes_per_frame())
    }

    /// Byte count for a duration, rounded down to whole frames.
    pub fn bytes_for_duration(&self, duration: Duration) -> Option<usize> {
        let frames = duration.as_micros() * u128::from(self.sample_rate) / 1_000_000;
        let frames = usize::try_from(frames).ok()?;
        self.bytes_for_frames(frames)
    }

    pub fn duration_of_frames(&self, frames: usize) -> Duration {
        let micros = frames as u128 * 1_000_000 / u128::from(self.sample_rate.max(1));
        Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_rates() {
        let format = AudioFormat::DEFAULT;
        assert_eq!(format.bytes_per_frame(), 4);
        assert_eq!(format.bytes_for_frames(960), Some(3840));
        assert_eq!(format.bytes_for_duration(Duration::from_millis(20)), Some(3840));
        assert_eq!(format.duration_of_frames(960), Duration::from_millis(20));
    }

    #[test]
    fn oversized_counts_do_not_overflow() {
        let format = AudioFormat::DEFAULT;
        assert_eq!(format.bytes_for_frames(usize::MAX / 2), None);
        assert_eq!(format.bytes_for_duration(Duration::from_millis(u64::MAX)), None);
        assert_eq!(format.duration_of_frames(usize::MAX), Duration::from_micros(u64::MAX));
    }

    #[test]
    fn rejects_odd_bit_depth() {
        let format = AudioFormat { bits_per_sample: 12, ..AudioFormat::DEFAULT };
        assert_eq!(format.validate(), Err(FormatError::BitsPerSample(12)));

        let format = AudioFormat { channels: 0, ..AudioFormat::DEFAULT };
        assert_eq!(format.validate(), Err(FormatError::ZeroChannels));

        assert_eq!(AudioFormat::DEFAULT.validate(), Ok(()));
    }
}
