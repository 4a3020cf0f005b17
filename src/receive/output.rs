use std::io::Write;
use std::time::{Duration, Instant};

use crate::config::JitterConfig;
use crate::receive::jitter::JitterBuffer;

pub struct OutputConfig {
    pub device: Option<String>,
    pub jitter: JitterConfig,
}

#[cfg(feature = "output")]
pub use self::device::{Output, OutputError};

#[cfg(not(feature = "output"))]
pub use self::pipe::{Output, OutputError};

/// Pulls one segment per segment interval and hands it to `sink`, the way a
/// sound card callback would. Runs until `sink` fails.
pub fn pump<W: Write>(jitter: &JitterBuffer, interval: Duration, mut sink: W) -> std::io::Result<()> {
    let mut segment = vec![0u8; jitter.segment_len()];
    let mut deadline = Instant::now();

    loop {
        jitter.read(&mut segment);
        sink.write_all(&segment)?;
        sink.flush()?;

        deadline += interval;
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        } else {
            // fell behind, don't try to catch up with a burst
            deadline = now;
        }
    }
}

#[cfg(not(feature = "output"))]
mod pipe {
    use std::thread::JoinHandle;

    use derive_more::{Display, From};

    use super::OutputConfig;
    use crate::receive::jitter::JitterBuffer;

    /// Writes raw PCM to stdout in real time, for piping into a player.
    pub struct Output {
        _thread: JoinHandle<()>,
    }

    #[derive(Debug, Display, From)]
    pub enum OutputError {
        #[display(fmt = "spawning output thread: {}", _0)]
        Spawn(std::io::Error),
    }

    impl Output {
        pub fn new(config: &OutputConfig, jitter: JitterBuffer) -> Result<Output, OutputError> {
            if let Some(device) = &config.device {
                tracing::warn!(device, "built without device output, writing PCM to stdout instead");
            }

            let interval = config.jitter.segment_duration();

            let thread = std::thread::Builder::new()
                .name("radiobuf/audio".into())
                .spawn(move || {
                    crate::thread::set_realtime_priority();

                    let stdout = std::io::stdout().lock();
                    if let Err(e) = super::pump(&jitter, interval, stdout) {
                        tracing::error!(error = %e, "stdout closed, stopping output");
                    }
                })?;

            Ok(Output { _thread: thread })
        }
    }
}

#[cfg(feature = "output")]
mod device {
    use bytemuck::Pod;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{BuildStreamError, OutputCallbackInfo, SizedSample, Stream, StreamConfig, StreamError};
    use derive_more::{Display, From};

    use super::OutputConfig;
    use crate::receive::jitter::JitterBuffer;

    pub struct Output {
        _stream: Stream,
    }

    #[derive(Debug, Display, From)]
    pub enum OutputError {
        #[display(fmt = "no output device available")]
        #[from(ignore)]
        NoDeviceAvailable,
        #[display(fmt = "no output device named {:?}", _0)]
        #[from(ignore)]
        NoSuchDevice(String),
        #[display(fmt = "listing output devices: {}", _0)]
        Devices(cpal::DevicesError),
        #[display(fmt = "unsupported bit depth for device output: {}", _0)]
        #[from(ignore)]
        BitDepth(u16),
        #[display(fmt = "building output stream: {}", _0)]
        BuildStream(BuildStreamError),
        #[display(fmt = "starting output stream: {}", _0)]
        PlayStream(cpal::PlayStreamError),
    }

    impl Output {
        pub fn new(config: &OutputConfig, jitter: JitterBuffer) -> Result<Output, OutputError> {
            let host = cpal::default_host();

            let device = match &config.device {
                Some(name) => host.output_devices()?
                    .find(|device| device.name().ok().as_deref() == Some(name.as_str()))
                    .ok_or_else(|| OutputError::NoSuchDevice(name.clone()))?,
                None => host.default_output_device()
                    .ok_or(OutputError::NoDeviceAvailable)?,
            };

            let format = config.jitter.format;
            let stream_config = StreamConfig {
                channels: format.channels,
                sample_rate: cpal::SampleRate(format.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let stream = match format.bits_per_sample {
                8 => build::<u8>(&device, &stream_config, jitter)?,
                16 => build::<i16>(&device, &stream_config, jitter)?,
                32 => build::<i32>(&device, &stream_config, jitter)?,
                bits => return Err(OutputError::BitDepth(bits)),
            };

            stream.play()?;

            Ok(Output { _stream: stream })
        }
    }

    fn build<T: SizedSample + Pod>(
        device: &cpal::Device,
        config: &StreamConfig,
        jitter: JitterBuffer,
    ) -> Result<Stream, BuildStreamError> {
        device.build_output_stream(config,
            {
                let mut initialized_thread = false;

                move |output: &mut [T], _: &OutputCallbackInfo| {
                    if !initialized_thread {
                        crate::thread::set_name("radiobuf/audio");
                        crate::thread::set_realtime_priority();
                        initialized_thread = true;
                    }

                    jitter.read(bytemuck::cast_slice_mut(output));
                }
            },
            {
                move |err: StreamError| {
                    tracing::error!(error = %err, "output stream error");
                }
            },
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::format::AudioFormat;

    /// Accepts a fixed number of writes, then reports a closed pipe.
    struct Limited {
        written: Vec<u8>,
        remaining: usize,
    }

    impl Write for Limited {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            self.remaining -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn pump_writes_whole_segments_until_sink_fails() {
        let jitter = JitterBuffer::new(&JitterConfig {
            format: AudioFormat { sample_rate: 1000, channels: 1, bits_per_sample: 8 },
            segment_frames: 2,
            ..Default::default()
        });
        jitter.enqueue(1, vec![1, 1]);
        jitter.enqueue(3, vec![3, 3]);

        let mut sink = Limited { written: Vec::new(), remaining: 4 };
        let err = pump(&jitter, Duration::from_millis(1), &mut sink).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(sink.written, vec![1, 1, 0, 0, 3, 3, 0, 0]);
    }
}
