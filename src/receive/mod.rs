mod buffer;
pub mod jitter;
pub mod output;
pub mod queue;

use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use structopt::StructOpt;

use crate::config::{FileConfig, JitterOpt};
use crate::protocol;
use crate::receive::jitter::JitterBuffer;
use crate::receive::output::{Output, OutputConfig};
use crate::socket::{self, Socket, SocketOpt, DEFAULT_AUDIO_PORT};
use crate::RunError;

#[derive(StructOpt, Clone)]
pub struct ReceiveOpt {
    #[structopt(flatten)]
    pub socket: SocketOpt,
    #[structopt(flatten)]
    pub jitter: JitterOpt,
    #[structopt(long, env = "RADIOBUF_RECEIVE_DEVICE")]
    pub device: Option<String>,
    /// Seconds between stats reports, 0 to disable
    #[structopt(long, default_value = "5")]
    pub stats_interval: u64,
}

pub fn run(opt: ReceiveOpt, file: FileConfig) -> Result<(), RunError> {
    let config = opt.jitter.apply(file.jitter);
    config.validate()?;

    let bind = match (opt.socket.bind, file.receive.bind) {
        (Some(addr), _) => addr,
        (None, Some(addr)) => addr.parse::<SocketAddr>()
            .map_err(|_| RunError::BadAddress(addr))?,
        (None, None) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_AUDIO_PORT)),
    };

    let jitter = JitterBuffer::new(&config);
    let segment_len = jitter.segment_len();

    let output_config = OutputConfig {
        device: opt.device.or(file.receive.device),
        jitter: config,
    };

    let _output = Output::new(&output_config, jitter.clone())?;

    let socket = Socket::bind(bind)
        .map_err(RunError::Listen)?;

    let stats_interval = Duration::from_secs(opt.stats_interval);
    if !stats_interval.is_zero() {
        socket.set_read_timeout(Some(stats_interval))
            .map_err(RunError::Socket)?;
    }

    tracing::info!(%bind, segment_len, "receiving audio");

    crate::thread::set_name("radiobuf/network");
    crate::thread::set_realtime_priority();

    let mut buf = vec![0u8; protocol::MAX_PACKET_SIZE];
    let mut last_report = Instant::now();

    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, peer)) => {
                match protocol::parse(&buf[..len], segment_len) {
                    Ok(packet) => {
                        jitter.enqueue(packet.seq, packet.samples);
                    }
                    Err(e) => {
                        tracing::trace!(%peer, error = ?e, "ignoring datagram");
                    }
                }
            }
            Err(e) if socket::is_timeout(&e) => {}
            Err(e) => return Err(RunError::Socket(e)),
        }

        if !stats_interval.is_zero() && last_report.elapsed() >= stats_interval {
            tracing::info!(stats = %jitter.stats().to_json(), "jitter buffer");
            last_report = Instant::now();
        }
    }
}
