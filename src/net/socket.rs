use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixStream;
#[cfg(unix)]
use std::path::Path;

use socket2::SockRef;

#[derive(Debug)]
pub enum Socket {
    Tcp(TcpStream),

    #[cfg(unix)]
    Unix(UnixStream),
}

impl Socket {
    pub fn connect_tcp(
        host: &str,
        port: u16,
        source_address: Option<&str>,
    ) -> io::Result<Self> {
        // a bracketed host spec like [::1] selects IPv6
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("hostname {:?} did not resolve", host),
                )
            })?;

        let stream = match source_address {
            Some(source) => {
                let domain = match addr {
                    SocketAddr::V4(_) => socket2::Domain::IPV4,
                    SocketAddr::V6(_) => socket2::Domain::IPV6,
                };
                let socket =
                    socket2::Socket::new(domain, socket2::Type::STREAM, None)?;
                let bind: SocketAddr = (source, 0)
                    .to_socket_addrs()?
                    .next()
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::AddrNotAvailable,
                            "local_socket_address did not resolve",
                        )
                    })?;
                socket.bind(&bind.into())?;
                socket.connect(&addr.into())?;
                socket.into()
            }
            None => TcpStream::connect(addr)?,
        };

        stream.set_nodelay(true)?;

        Ok(Socket::Tcp(stream))
    }

    #[cfg(unix)]
    pub fn connect_uds(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Socket::Unix(UnixStream::connect(path)?))
    }

    #[cfg(not(unix))]
    pub fn connect_uds(_: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Unix domain sockets are not supported outside Unix platforms",
        ))
    }

    pub fn set_keepalive(&self) -> io::Result<()> {
        if let Socket::Tcp(stream) = self {
            SockRef::from(stream).set_tcp_keepalive(&socket2::TcpKeepalive::new())?;
        }

        Ok(())
    }

    /// Arrange for close to drop the connection abortively (RST instead of
    /// a lingering FIN).
    pub fn set_abortive_close(&self) -> io::Result<()> {
        if let Socket::Tcp(stream) = self {
            SockRef::from(stream).set_linger(Some(Duration::from_secs(0)))?;
        }

        Ok(())
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Socket::Tcp(stream) => stream.set_read_timeout(timeout),

            #[cfg(unix)]
            Socket::Unix(stream) => stream.set_read_timeout(timeout),
        }
    }

    pub fn shutdown(&self) -> io::Result<()> {
        match self {
            Socket::Tcp(stream) => stream.shutdown(Shutdown::Both),

            #[cfg(unix)]
            Socket::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Socket::Tcp(stream) => stream.read(buf),

            #[cfg(unix)]
            Socket::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Socket::Tcp(stream) => stream.write(buf),

            #[cfg(unix)]
            Socket::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Socket::Tcp(stream) => stream.flush(),

            #[cfg(unix)]
            Socket::Unix(stream) => stream.flush(),
        }
    }
}
