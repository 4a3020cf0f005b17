//! Listens for server announcements broadcast on the local network and
//! reports the advertised endpoint.
//!
//! An announcement is a UTF-8 datagram holding either `host:port` or just
//! `host`, in which case the default audio port is assumed.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use derive_more::{Display, From};

use crate::socket::{self, Socket, DEFAULT_AUDIO_PORT};

pub const DISCOVERY_PORT: u16 = 5069;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Display, From)]
pub enum DiscoveryError {
    #[display(fmt = "announcement is not utf-8: {}", _0)]
    Utf8(Utf8Error),
    #[display(fmt = "announcement has no host")]
    #[from(ignore)]
    EmptyHost,
    #[display(fmt = "bad port in announcement: {}", _0)]
    Port(ParseIntError),
}

pub fn parse_announcement(datagram: &[u8]) -> Result<ServerEndpoint, DiscoveryError> {
    let message = std::str::from_utf8(datagram)?.trim();

    let endpoint = match message.split_once(':') {
        Some((host, rest)) => {
            // anything after a second colon is ignored
            let port = rest.split(':').next().unwrap_or_default();
            ServerEndpoint {
                host: host.trim().to_owned(),
                port: port.trim().parse()?,
            }
        }
        None => ServerEndpoint {
            host: message.to_owned(),
            port: DEFAULT_AUDIO_PORT,
        },
    };

    if endpoint.host.is_empty() {
        return Err(DiscoveryError::EmptyHost);
    }

    Ok(endpoint)
}

/// Background thread receiving announcements until stopped or dropped.
pub struct DiscoveryListener {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DiscoveryListener {
    /// Listens on all interfaces at `port`.
    pub fn start<F>(port: u16, on_endpoint: F) -> io::Result<Self>
        where F: FnMut(ServerEndpoint) + Send + 'static
    {
        Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), on_endpoint)
    }

    pub fn bind<F>(addr: SocketAddr, mut on_endpoint: F) -> io::Result<Self>
        where F: FnMut(ServerEndpoint) + Send + 'static
    {
        let socket = Socket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let local_addr = socket.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));

        let thread = std::thread::Builder::new()
            .name("radiobuf/discovery".into())
            .spawn({
                let stop = Arc::clone(&stop);
                move || {
                    tracing::info!(%local_addr, "listening for server announcements");

                    let mut buf = [0u8; 1024];

                    while !stop.load(Ordering::Relaxed) {
                        let (len, peer) = match socket.recv_from(&mut buf) {
                            Ok(received) => received,
                            Err(e) if socket::is_timeout(&e) => continue,
                            Err(e) => {
                                tracing::error!(error = %e, "discovery socket failed");
                                break;
                            }
                        };

                        match parse_announcement(&buf[..len]) {
                            Ok(endpoint) => {
                                tracing::debug!(%peer, %endpoint, "server announced");
                                on_endpoint(endpoint);
                            }
                            Err(e) => {
                                tracing::warn!(%peer, error = %e, "ignoring announcement");
                            }
                        }
                    }

                    tracing::debug!("discovery listener stopped");
                }
            })?;

        Ok(DiscoveryListener {
            local_addr,
            stop,
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals the thread and waits for it to observe the flag, which takes
    /// at most one poll interval.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for DiscoveryListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn host_and_port() {
        let endpoint = parse_announcement(b" 10.0.0.7 : 5010 \n").unwrap();
        assert_eq!(endpoint, ServerEndpoint { host: "10.0.0.7".into(), port: 5010 });
        assert_eq!(endpoint.to_string(), "10.0.0.7:5010");
    }

    #[test]
    fn bare_host_uses_default_port() {
        let endpoint = parse_announcement(b"radio.example\r\n").unwrap();
        assert_eq!(endpoint.host, "radio.example");
        assert_eq!(endpoint.port, DEFAULT_AUDIO_PORT);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let endpoint = parse_announcement(b"host:5003:extra").unwrap();
        assert_eq!(endpoint.port, 5003);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_announcement(b"host:port"), Err(DiscoveryError::Port(_))));
        assert!(matches!(parse_announcement(b":5002"), Err(DiscoveryError::EmptyHost)));
        assert!(matches!(parse_announcement(b"   "), Err(DiscoveryError::EmptyHost)));
        assert!(matches!(parse_announcement(&[0xff, 0xfe]), Err(DiscoveryError::Utf8(_))));
    }

    #[test]
    fn listener_reports_announcements() {
        let (tx, rx) = mpsc::channel();
        let mut listener = DiscoveryListener::bind("127.0.0.1:0".parse().unwrap(), move |endpoint| {
            let _ = tx.send(endpoint);
        }).unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"not a port:x", listener.local_addr()).unwrap();
        sender.send_to(b"192.168.1.20:5002", listener.local_addr()).unwrap();

        let endpoint = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(endpoint, ServerEndpoint { host: "192.168.1.20".into(), port: 5002 });

        listener.stop();
    }
}
