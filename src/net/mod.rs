use std::io;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use metriken::metric;
use metriken::Counter;
use metriken::LazyCounter;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::Error;
use crate::identity::PrivateKey;

#[metric(name = "connect/total")]
pub static CONNECT: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "connect/ok")]
pub static CONNECT_OK: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "connect/exception")]
pub static CONNECT_EX: LazyCounter = LazyCounter::new(Counter::default);

#[metric(name = "connect/timeout")]
pub static CONNECT_TIMEOUT: LazyCounter = LazyCounter::new(Counter::default);

/// Upper bound on a single frame payload. Session exchanges are tiny; a
/// larger length prefix means a corrupt or hostile peer.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Timeouts governing the dial and per-stream reads. `None` means "use the
/// transport default", never a zero duration.
#[derive(Clone, Copy, Debug, Default)]
pub struct DialConfig {
    pub connect_timeout: Option<Duration>,
    pub stream_timeout: Option<Duration>,
}

impl DialConfig {
    /// Maps whole-second harness arguments into timeouts. Zero selects the
    /// transport default.
    pub fn from_secs(connect: u64, stream: u64) -> Self {
        Self {
            connect_timeout: (connect > 0).then(|| Duration::from_secs(connect)),
            stream_timeout: (stream > 0).then(|| Duration::from_secs(stream)),
        }
    }
}

/// Dials storage node endpoints on behalf of one resolved identity. The
/// identity's compressed public point rides along into every `Connection`
/// it opens and is presented during session negotiation.
pub struct Connector {
    identity: Vec<u8>,
    dial: DialConfig,
}

impl Connector {
    pub fn new(key: &PrivateKey, dial: DialConfig) -> Self {
        let identity = key.verifying_key().to_encoded_point(true).as_bytes().to_vec();
        Self { identity, dial }
    }

    /// Dials `endpoint`, honoring the connect timeout when one is set. An
    /// optional `scheme://` prefix is accepted and stripped. Failure is
    /// terminal for the caller's setup; no retry happens here.
    pub async fn connect(&self, endpoint: &str) -> Result<Connection, Error> {
        CONNECT.increment();

        let addr = strip_scheme(endpoint);

        let dialed = match self.dial.connect_timeout {
            Some(limit) => match timeout(limit, TcpStream::connect(addr)).await {
                Ok(result) => result,
                Err(_) => {
                    CONNECT_TIMEOUT.increment();
                    return Err(Error::Connection {
                        endpoint: endpoint.to_string(),
                        source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                    });
                }
            },
            None => TcpStream::connect(addr).await,
        };

        match dialed {
            Ok(stream) => {
                CONNECT_OK.increment();
                Ok(Connection {
                    stream,
                    stream_timeout: self.dial.stream_timeout,
                    identity: self.identity.clone(),
                })
            }
            Err(source) => {
                CONNECT_EX.increment();
                Err(Error::Connection {
                    endpoint: endpoint.to_string(),
                    source,
                })
            }
        }
    }
}

/// An open stream to a storage node, owned exclusively by one VU. Reads are
/// bounded by the configured stream timeout when one is set.
pub struct Connection {
    stream: TcpStream,
    stream_timeout: Option<Duration>,
    identity: Vec<u8>,
}

impl Connection {
    /// Compressed SEC1 point of the signing identity this connection was
    /// opened with.
    pub fn identity(&self) -> &[u8] {
        &self.identity
    }

    pub async fn write_frame(&mut self, payload: &[u8]) -> io::Result<()> {
        write_frame(&mut self.stream, payload).await
    }

    pub async fn read_frame(&mut self) -> io::Result<Vec<u8>> {
        match self.stream_timeout {
            Some(limit) => match timeout(limit, read_frame(&mut self.stream)).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "stream timed out")),
            },
            None => read_frame(&mut self.stream).await,
        }
    }

    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

/// Writes one length-prefixed frame: u32 big-endian payload length, then the
/// payload itself.
pub async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, payload: &[u8]) -> io::Result<()> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "frame too large"));
    }

    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    stream.write_all(&buf).await
}

/// Reads one length-prefixed frame, rejecting lengths above
/// [`MAX_FRAME_SIZE`].
pub async fn read_frame<S: AsyncRead + Unpin>(stream: &mut S) -> io::Result<Vec<u8>> {
    let len = stream.read_u32().await? as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "frame too large"));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

fn strip_scheme(endpoint: &str) -> &str {
    endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seconds_means_transport_default() {
        let dial = DialConfig::from_secs(0, 0);
        assert!(dial.connect_timeout.is_none());
        assert!(dial.stream_timeout.is_none());

        let dial = DialConfig::from_secs(5, 30);
        assert_eq!(dial.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(dial.stream_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn scheme_prefix_is_stripped() {
        assert_eq!(strip_scheme("grpc://s01.frostfs.devenv:8080"), "s01.frostfs.devenv:8080");
        assert_eq!(strip_scheme("127.0.0.1:8080"), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn frame_round_trip() {
        let (mut a, mut b) = tokio::io::duplex(256);

        write_frame(&mut a, b"hello").await.unwrap();
        assert_eq!(read_frame(&mut b).await.unwrap(), b"hello");

        write_frame(&mut a, &[]).await.unwrap();
        assert!(read_frame(&mut b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, _b) = tokio::io::duplex(16);
        let payload = vec![0u8; MAX_FRAME_SIZE + 1];
        assert!(write_frame(&mut a, &payload).await.is_err());

        let (mut a, mut b) = tokio::io::duplex(16);
        tokio::io::AsyncWriteExt::write_u32(&mut a, (MAX_FRAME_SIZE + 1) as u32)
            .await
            .unwrap();
        assert!(read_frame(&mut b).await.is_err());
    }
}
