mod encode;

use std::io::Read;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use structopt::StructOpt;

use crate::config::{FileConfig, JitterOpt};
use crate::socket::Socket;
use crate::source::encode::{PacketSink, Packetizer};
use crate::RunError;

#[derive(StructOpt)]
pub struct SendOpt {
    /// Where to send audio packets
    #[structopt(long, env = "RADIOBUF_TARGET")]
    pub target: SocketAddr,
    #[structopt(flatten)]
    pub jitter: JitterOpt,
    /// Send as fast as stdin allows instead of at playback speed
    #[structopt(long)]
    pub no_pace: bool,
}

/// Reads raw PCM from stdin and sends it as numbered segments.
pub fn run(opt: SendOpt, file: FileConfig) -> Result<(), RunError> {
    let config = opt.jitter.apply(file.jitter);
    config.validate()?;

    let socket = Socket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .map_err(RunError::Listen)?;

    let interval = if opt.no_pace { None } else { Some(config.segment_duration()) };

    let sink = UdpSink {
        socket,
        target: opt.target,
        interval,
        deadline: Instant::now(),
        sent: 0,
        errors: 0,
    };

    tracing::info!(dest = %opt.target, segment_len = config.segment_bytes(), "sending stdin");

    let mut packetizer = Packetizer::new(sink, config.segment_bytes());
    let mut stdin = std::io::stdin().lock();
    let mut buf = vec![0u8; config.segment_bytes()];

    loop {
        let len = stdin.read(&mut buf).map_err(RunError::Input)?;
        if len == 0 {
            break;
        }
        packetizer.write(&buf[..len]);
    }

    let sink = packetizer.finish();

    tracing::info!(packets = sink.sent, errors = sink.errors, "end of input");

    Ok(())
}

struct UdpSink {
    socket: Socket,
    target: SocketAddr,
    interval: Option<Duration>,
    deadline: Instant,
    sent: u64,
    errors: u64,
}

impl PacketSink for UdpSink {
    fn send(&mut self, datagram: &[u8]) {
        if let Some(interval) = self.interval {
            let now = Instant::now();
            if self.deadline > now {
                std::thread::sleep(self.deadline - now);
            }
            self.deadline = std::cmp::max(self.deadline, now) + interval;
        }

        // a lost send is just a lost packet to the receiver
        match self.socket.send_to(datagram, self.target) {
            Ok(()) => self.sent += 1,
            Err(e) => {
                self.errors += 1;
                tracing::debug!(error = %e, "send failed");
            }
        }
    }
}
