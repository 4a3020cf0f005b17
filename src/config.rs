use std::path::Path;
use std::time::Duration;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use crate::format::{AudioFormat, FormatError};

const CONFIG_FILE_NAME: &str = "radiobuf.toml";

/// Construction-time parameters of a jitter buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    pub format: AudioFormat,
    /// Frames per decoded packet. Every packet in a stream is this long.
    pub segment_frames: usize,
    /// How much audio the ring store can hold.
    pub ring_duration_ms: u64,
    /// Upper bound on silence segments injected for a single gap.
    pub max_concealment_segments: u32,
    /// Upper bound on packets waiting in the reorder queue. Unbounded when
    /// unset.
    pub max_queue_depth: Option<usize>,
}

impl Default for JitterConfig {
    fn default() -> Self {
        JitterConfig {
            format: AudioFormat::DEFAULT,
            segment_frames: 960,
            ring_duration_ms: 10_000,
            max_concealment_segments: 5,
            max_queue_depth: None,
        }
    }
}

#[derive(Debug, Display, From)]
pub enum ConfigError {
    #[display(fmt = "invalid audio format: {}", _0)]
    Format(FormatError),
    #[display(fmt = "segment_frames must be non-zero")]
    #[from(ignore)]
    ZeroSegment,
    #[display(fmt = "max_queue_depth must be non-zero when set")]
    #[from(ignore)]
    ZeroQueueDepth,
    #[display(fmt = "ring store of {} bytes cannot hold {} bytes of concealment and audio", ring, needed)]
    #[from(ignore)]
    RingTooSmall { ring: usize, needed: usize },
    #[display(fmt = "{} is too large to allocate", _0)]
    #[from(ignore)]
    TooLarge(&'static str),
    #[display(fmt = "locating config directory: {}", _0)]
    Xdg(xdg::BaseDirectoriesError),
    #[display(fmt = "reading {}: {}", _0, _1)]
    #[from(ignore)]
    Read(String, std::io::Error),
    #[display(fmt = "parsing {}: {}", _0, _1)]
    #[from(ignore)]
    Parse(String, toml::de::Error),
}

impl JitterConfig {
    /// Only meaningful once [`validate`](Self::validate) has passed.
    pub fn segment_bytes(&self) -> usize {
        self.format.bytes_for_frames(self.segment_frames).unwrap_or(usize::MAX)
    }

    pub fn segment_duration(&self) -> Duration {
        self.format.duration_of_frames(self.segment_frames)
    }

    /// Only meaningful once [`validate`](Self::validate) has passed.
    pub fn ring_bytes(&self) -> usize {
        self.format.bytes_for_duration(Duration::from_millis(self.ring_duration_ms))
            .unwrap_or(usize::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.format.validate()?;

        if self.segment_frames == 0 {
            return Err(ConfigError::ZeroSegment);
        }

        if self.max_queue_depth == Some(0) {
            return Err(ConfigError::ZeroQueueDepth);
        }

        let segment = self.format.bytes_for_frames(self.segment_frames)
            .ok_or(ConfigError::TooLarge("segment_frames"))?;

        let ring = self.format.bytes_for_duration(Duration::from_millis(self.ring_duration_ms))
            .ok_or(ConfigError::TooLarge("ring_duration_ms"))?;

        // one worst-case gap plus the packet that revealed it must fit
        let needed = (self.max_concealment_segments as usize)
            .checked_add(1)
            .and_then(|segments| segments.checked_mul(segment))
            .ok_or(ConfigError::TooLarge("max_concealment_segments"))?;

        if ring < needed {
            return Err(ConfigError::RingTooSmall { ring, needed });
        }

        Ok(())
    }
}

/// Contents of `radiobuf.toml`. Every section is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub jitter: JitterConfig,
    pub receive: ReceiveFileConfig,
    pub discovery: DiscoveryFileConfig,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ReceiveFileConfig {
    pub bind: Option<String>,
    pub device: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryFileConfig {
    pub port: Option<u16>,
}

impl FileConfig {
    /// Loads the config file from an explicit path, or from the XDG config
    /// directory when one exists there. A missing XDG file is not an error.
    pub fn load(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => {
                let dirs = xdg::BaseDirectories::new()?;
                match dirs.find_config_file(CONFIG_FILE_NAME) {
                    Some(path) => path,
                    None => return Ok(FileConfig::default()),
                }
            }
        };

        tracing::debug!(path = %path.display(), "loading config file");

        let text = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;

        FileConfig::parse(&text)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e))
    }

    pub fn parse(text: &str) -> Result<FileConfig, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Command line overrides for [`JitterConfig`].
#[derive(StructOpt, Debug, Clone, Default)]
pub struct JitterOpt {
    #[structopt(long, env = "RADIOBUF_SAMPLE_RATE")]
    pub sample_rate: Option<u32>,
    #[structopt(long, env = "RADIOBUF_CHANNELS")]
    pub channels: Option<u16>,
    #[structopt(long, env = "RADIOBUF_BITS")]
    pub bits_per_sample: Option<u16>,
    #[structopt(long, env = "RADIOBUF_SEGMENT_FRAMES")]
    pub segment_frames: Option<usize>,
    #[structopt(long)]
    pub ring_duration_ms: Option<u64>,
    #[structopt(long)]
    pub max_concealment: Option<u32>,
    #[structopt(long)]
    pub max_queue_depth: Option<usize>,
}

impl JitterOpt {
    pub fn apply(&self, mut config: JitterConfig) -> JitterConfig {
        if let Some(rate) = self.sample_rate {
            config.format.sample_rate = rate;
        }
        if let Some(channels) = self.channels {
            config.format.channels = channels;
        }
        if let Some(bits) = self.bits_per_sample {
            config.format.bits_per_sample = bits;
        }
        if let Some(frames) = self.segment_frames {
            config.segment_frames = frames;
        }
        if let Some(ms) = self.ring_duration_ms {
            config.ring_duration_ms = ms;
        }
        if let Some(max) = self.max_concealment {
            config.max_concealment_segments = max;
        }
        if self.max_queue_depth.is_some() {
            config.max_queue_depth = self.max_queue_depth;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = JitterConfig::default();
        config.validate().unwrap();

        assert_eq!(config.segment_bytes(), 3840);
        assert_eq!(config.segment_duration(), Duration::from_millis(20));
        assert_eq!(config.ring_bytes(), 1_920_000);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = FileConfig::parse(r#"
            [jitter]
            max_concealment_segments = 3

            [jitter.format]
            channels = 1

            [receive]
            bind = "0.0.0.0:5010"
        "#).unwrap();

        assert_eq!(file.jitter.max_concealment_segments, 3);
        assert_eq!(file.jitter.format.channels, 1);
        assert_eq!(file.jitter.format.sample_rate, 48000);
        assert_eq!(file.jitter.segment_frames, 960);
        assert_eq!(file.receive.bind.as_deref(), Some("0.0.0.0:5010"));
        assert_eq!(file.discovery.port, None);
    }

    #[test]
    fn command_line_overrides_file() {
        let opt = JitterOpt {
            channels: Some(1),
            max_concealment: Some(2),
            ..Default::default()
        };

        let config = opt.apply(JitterConfig::default());
        assert_eq!(config.format.channels, 1);
        assert_eq!(config.max_concealment_segments, 2);
        assert_eq!(config.segment_frames, 960);
    }

    #[test]
    fn ring_must_hold_worst_case_gap() {
        let config = JitterConfig {
            ring_duration_ms: 100,
            max_concealment_segments: 5,
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::RingTooSmall { .. })));
    }

    #[test]
    fn oversized_values_are_errors() {
        let config = JitterConfig { segment_frames: usize::MAX / 2, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::TooLarge("segment_frames"))));

        let config = JitterConfig { ring_duration_ms: u64::MAX, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::TooLarge("ring_duration_ms"))));

        let config = JitterConfig {
            segment_frames: usize::MAX / 8,
            max_concealment_segments: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::TooLarge("max_concealment_segments"))));
    }

    #[test]
    fn rejects_zero_segment() {
        let config = JitterConfig { segment_frames: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSegment)));
    }
}
