//! The transport seam of the resolver.
//!
//! The resolver hands serialized queries to a [`Transport`] and receives
//! serialized responses back. The trait has exactly two operations, one
//! per protocol, each returning a future over the reply octets. The
//! production implementation, [`SocketTransport`], talks to the network
//! through Tokio sockets; tests swap in transports that short-circuit
//! the network entirely.

use super::Error;
use bytes::Bytes;
use core::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::{timeout_at, Instant};
use tracing::trace;

/// How many times we try a new random port if we get 'address in use.'
const RETRY_RANDOM_PORT: usize = 10;

//------------ Transport -----------------------------------------------------

/// A way of exchanging serialized DNS messages with a server.
///
/// Both operations send one request and resolve to the octets of one
/// response. All correlation beyond what the protocol provides -- source
/// filtering and message ID matching for UDP datagrams -- happens inside
/// the transport; interpreting the response is the resolver's business.
pub trait Transport: fmt::Debug + Send + Sync {
    /// Sends a request over UDP and awaits the response datagram.
    ///
    /// Datagrams from other sources or with a message ID different from
    /// the request's are dropped and the transport keeps listening until
    /// `deadline`. A datagram larger than `recv_limit` fails with
    /// [`Error::OversizedResponse`].
    fn send_udp<'a>(
        &'a self,
        server: SocketAddr,
        request: &'a [u8],
        recv_limit: usize,
        deadline: Instant,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>;

    /// Sends a request over TCP and awaits the response message.
    ///
    /// The request is sent with the two-octet length prefix of DNS over
    /// TCP and a single length-framed response is read. The connection
    /// is scoped to this one exchange.
    fn send_tcp<'a>(
        &'a self,
        server: SocketAddr,
        request: &'a [u8],
        deadline: Instant,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>;
}

//------------ SocketTransport -----------------------------------------------

/// The transport implementation atop the operating system's sockets.
#[derive(Clone, Copy, Debug, Default)]
pub struct SocketTransport;

impl SocketTransport {
    /// Creates a new socket transport.
    pub fn new() -> Self {
        SocketTransport
    }

    /// Performs the UDP exchange.
    async fn udp_exchange(
        server: SocketAddr,
        request: &[u8],
        recv_limit: usize,
        deadline: Instant,
    ) -> Result<Bytes, Error> {
        let sock = Self::udp_bind(server.is_ipv4()).await?;
        // Connecting makes the kernel drop datagrams from any other
        // source.
        sock.connect(server).await.map_err(Error::network)?;
        let sent = timeout_at(deadline, sock.send(request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Error::network)?;
        if sent != request.len() {
            return Err(Error::network(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "short UDP send",
            )));
        }

        let mut saw_mismatch = false;
        loop {
            let mut buf = vec![0u8; recv_limit + 1];
            let len = match timeout_at(deadline, sock.recv(&mut buf)).await {
                Ok(res) => res.map_err(Error::network)?,
                Err(_) => {
                    // The deadline passed. If we only ever saw replies
                    // for someone else, report that instead of a plain
                    // timeout.
                    return Err(if saw_mismatch {
                        Error::IdMismatch
                    } else {
                        Error::Timeout
                    });
                }
            };
            if len > recv_limit {
                return Err(Error::OversizedResponse);
            }
            buf.truncate(len);
            if len < 2 || buf[..2] != request[..2] {
                trace!("dropping datagram with unexpected message ID");
                saw_mismatch = true;
                continue;
            }
            return Ok(Bytes::from(buf));
        }
    }

    /// Performs the TCP exchange.
    async fn tcp_exchange(
        server: SocketAddr,
        request: &[u8],
        deadline: Instant,
    ) -> Result<Bytes, Error> {
        let mut stream = timeout_at(deadline, TcpStream::connect(server))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Error::network)?;

        let len = request.len() as u16;
        timeout_at(deadline, async {
            stream.write_all(&len.to_be_bytes()).await?;
            stream.write_all(request).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout)?
        .map_err(Error::network)?;

        timeout_at(deadline, async {
            let mut len = [0u8; 2];
            stream.read_exact(&mut len).await?;
            let mut buf = vec![0u8; usize::from(u16::from_be_bytes(len))];
            stream.read_exact(&mut buf).await?;
            Ok::<_, std::io::Error>(Bytes::from(buf))
        })
        .await
        .map_err(|_| Error::Timeout)?
        .map_err(Error::network)
    }

    /// Binds a UDP socket to a random local port.
    async fn udp_bind(v4: bool) -> Result<UdpSocket, Error> {
        let mut i = 0;
        loop {
            let local: SocketAddr = if v4 {
                ([0u8; 4], 0).into()
            } else {
                ([0u16; 8], 0).into()
            };
            match UdpSocket::bind(&local).await {
                Ok(sock) => return Ok(sock),
                Err(err) => {
                    if i == RETRY_RANDOM_PORT {
                        return Err(Error::network(err));
                    } else {
                        i += 1
                    }
                }
            }
        }
    }
}

impl Transport for SocketTransport {
    fn send_udp<'a>(
        &'a self,
        server: SocketAddr,
        request: &'a [u8],
        recv_limit: usize,
        deadline: Instant,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>
    {
        Box::pin(Self::udp_exchange(server, request, recv_limit, deadline))
    }

    fn send_tcp<'a>(
        &'a self,
        server: SocketAddr,
        request: &'a [u8],
        deadline: Instant,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>
    {
        Box::pin(Self::tcp_exchange(server, request, deadline))
    }
}

//--- Transport for pointers

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_udp<'a>(
        &'a self,
        server: SocketAddr,
        request: &'a [u8],
        recv_limit: usize,
        deadline: Instant,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>
    {
        (**self).send_udp(server, request, recv_limit, deadline)
    }

    fn send_tcp<'a>(
        &'a self,
        server: SocketAddr,
        request: &'a [u8],
        deadline: Instant,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>
    {
        (**self).send_tcp(server, request, deadline)
    }
}
