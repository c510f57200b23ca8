use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, trace};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};

use crate::{
    error::{ProtocolError, RconError, Result},
    packet::Packet,
};

/// Largest `size` field we are willing to allocate for.
pub const MAX_PACKET_SIZE: i32 = 1024 * 1024;

// Seeds stay below 2^30 so a connection has plenty of ids left before i32::MAX.
const SEED_WINDOW: u64 = 1 << 30;

/// Hands out request ids: positive, strictly increasing, never the server's
/// reserved `-1`.
#[derive(Debug)]
struct RequestIds {
    next: i32,
}

impl RequestIds {
    fn seeded() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| (elapsed.as_secs() % SEED_WINDOW) as i32 + 1)
            .unwrap_or(1);
        Self::starting_at(seed)
    }

    fn starting_at(first: i32) -> Self {
        RequestIds { next: first.max(1) }
    }

    fn allocate(&mut self) -> i32 {
        let id = self.next;
        self.next = self.next.checked_add(1).unwrap_or(1);
        id
    }
}

/// One stream to the server, opened once and never reopened. Generic over the
/// stream so tests can script the peer; in production it is a [TcpStream].
///
/// Dropping a connection closes the socket, so every exit path releases it.
pub struct Connection<S = TcpStream> {
    stream: Option<S>,
    request_ids: RequestIds,
    io_timeout: Option<Duration>,
}

impl Connection<TcpStream> {
    /// Dial `host:port`, giving up after `timeout`. No retries.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        debug!("connecting to {}", addr);

        let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| RconError::ConnectTimeout(timeout))?
            .map_err(RconError::UnreachableHost)?;

        trace!("opened tcp stream to {}", addr);
        Ok(Self::from_stream(stream))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn from_stream(stream: S) -> Self {
        Connection {
            stream: Some(stream),
            request_ids: RequestIds::seeded(),
            io_timeout: None,
        }
    }

    /// Start request ids at `first` instead of the clock-derived seed.
    pub fn with_first_request_id(mut self, first: i32) -> Self {
        self.request_ids = RequestIds::starting_at(first);
        self
    }

    /// Bound every subsequent send and receive.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn next_request_id(&mut self) -> i32 {
        self.request_ids.allocate()
    }

    /// Write the whole frame. `write_all` keeps going until every byte is out.
    ///
    /// On failure the stream is dropped; a half-written frame leaves it useless.
    pub async fn send(&mut self, packet: &Packet) -> Result<()> {
        let limit = self.io_timeout;
        let stream = self.stream.as_mut().ok_or(RconError::NotConnected)?;
        let frame = packet.pack();

        trace!(
            "sending packet id {} type {:?} ({} bytes)",
            packet.id(),
            packet.packet_type(),
            frame.len()
        );

        let result = with_deadline(limit, async move {
            stream
                .write_all(&frame)
                .await
                .map_err(RconError::SendError)?;
            stream.flush().await.map_err(RconError::SendError)
        })
        .await;
        self.close_on_error(result)
    }

    /// Read one frame: the size field, then exactly that many bytes. The
    /// transport may hand them over in arbitrary fragments.
    ///
    /// On failure the stream is dropped, since we can't tell where the next
    /// frame starts.
    pub async fn receive(&mut self) -> Result<Packet> {
        let limit = self.io_timeout;
        let stream = self.stream.as_mut().ok_or(RconError::NotConnected)?;
        let result = with_deadline(limit, read_frame(stream)).await;
        let packet = self.close_on_error(result)?;

        trace!(
            "received packet id {} type {:?} ({} body bytes)",
            packet.id(),
            packet.packet_type(),
            packet.body().len()
        );
        Ok(packet)
    }

    fn close_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if self.stream.take().is_some() {
                debug!("closing rcon stream after error: {}", e);
            }
        }
        result
    }

    /// Close the stream if it is still open. Safe to call any number of times.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("error shutting down rcon stream: {}", e);
            }
            trace!("rcon stream closed");
        }
    }
}

async fn read_frame<S>(stream: &mut S) -> Result<Packet>
where
    S: AsyncRead + Unpin,
{
    let mut size_field = [0u8; 4];
    stream.read_exact(&mut size_field).await.map_err(read_error)?;

    let size = i32::from_le_bytes(size_field);
    if !(Packet::BASE_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&size) {
        return Err(ProtocolError::SizeOutOfBounds(size).into());
    }

    let mut frame = vec![0u8; 4 + size as usize];
    frame[..4].copy_from_slice(&size_field);
    stream.read_exact(&mut frame[4..]).await.map_err(read_error)?;

    Ok(Packet::unpack(&frame)?)
}

fn read_error(e: std::io::Error) -> RconError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        RconError::Protocol(ProtocolError::Truncated)
    } else {
        RconError::ReceiveError(e)
    }
}

async fn with_deadline<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RconError::IoTimeout(limit))?,
        None => fut.await,
    }
}
