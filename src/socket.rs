use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Type};
use structopt::StructOpt;

pub const DEFAULT_AUDIO_PORT: u16 = 5002;

#[derive(StructOpt, Debug, Clone, Default)]
pub struct SocketOpt {
    /// Local address to receive on, defaults to 0.0.0.0:5002
    #[structopt(long, env = "RADIOBUF_BIND")]
    pub bind: Option<SocketAddr>,
}

pub struct Socket {
    socket: UdpSocket,
}

impl Socket {
    /// Binds a UDP socket with address reuse and broadcast enabled, so that
    /// several clients on one machine can share a broadcast port.
    pub fn bind(addr: SocketAddr) -> io::Result<Socket> {
        let socket = socket2::Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_broadcast(true)?;
        socket.bind(&addr.into())?;

        Ok(Socket { socket: socket.into() })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    pub fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<()> {
        self.socket.send_to(buf, dest)?;
        Ok(())
    }
}

/// True for the error kinds a read timeout produces.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
