//! Jitter compensation between a network audio decoder and an audio output
//! callback.
//!
//! Decoded packets arrive out of order, duplicated or not at all. A
//! [`JitterBuffer`] puts them back in sequence, stands in silence for short
//! gaps, and always hands the output callback exactly as many bytes as it
//! asks for without blocking.
//!
//! ```
//! use radiobuf::{JitterBuffer, JitterConfig};
//!
//! let config = JitterConfig::default();
//! let jitter = JitterBuffer::new(&config);
//!
//! let segment = vec![1u8; config.segment_bytes()];
//! jitter.enqueue(2, segment.clone());
//! jitter.enqueue(1, segment);
//!
//! let out = jitter.read_vec(config.segment_bytes() * 3);
//! assert_eq!(out.len(), config.segment_bytes() * 3);
//! ```

pub mod buffer;
pub mod config;
pub mod discovery;
pub mod format;
pub mod protocol;
pub mod receive;
pub mod socket;
pub mod source;
pub mod stats;
pub mod thread;

use derive_more::{Display, From};

pub use config::JitterConfig;
pub use format::AudioFormat;
pub use receive::jitter::JitterBuffer;
pub use receive::queue::Insert;
pub use stats::JitterStats;

#[derive(Debug, Display, From)]
pub enum RunError {
    #[display(fmt = "configuration: {}", _0)]
    Config(config::ConfigError),
    #[display(fmt = "audio output: {}", _0)]
    Output(receive::output::OutputError),
    #[display(fmt = "not a socket address: {}", _0)]
    #[from(ignore)]
    BadAddress(String),
    #[display(fmt = "binding socket: {}", _0)]
    #[from(ignore)]
    Listen(std::io::Error),
    #[display(fmt = "socket error: {}", _0)]
    #[from(ignore)]
    Socket(std::io::Error),
    #[display(fmt = "reading input: {}", _0)]
    #[from(ignore)]
    Input(std::io::Error),
}
