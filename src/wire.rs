//! Length-framed message codec over a bidirectional byte stream.
//!
//! Every message on the wire is a u32 big-endian length prefix followed by
//! exactly that many payload bytes. The codec is generic over the stream type
//! so the same code runs over `TcpStream` in production and in-memory duplex
//! pipes in tests.

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;

pub struct WireCodec<S> {
    stream: S,
}

impl<S: AsyncRead + AsyncWrite + Unpin> WireCodec<S> {
    pub fn new(stream: S) -> Self {
        WireCodec { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Write one frame: length prefix, payload, flush.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.stream.write_u32(payload.len() as u32).await?;
        self.stream.write_all(payload).await?;
        self.stream.flush().await?;
        debug!("sent frame of {} bytes", payload.len());
        Ok(())
    }

    /// Read one frame, blocking until the full payload has arrived.
    ///
    /// A stream that closes before delivering the announced byte count
    /// surfaces as a transport error.
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        let len = self.stream.read_u32().await?;
        let mut payload = vec![0u8; len as usize];
        self.stream.read_exact(&mut payload).await?;
        debug!("received frame of {} bytes", len);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_send_receive_roundtrip() {
        let (a, b) = tokio::io::duplex(1024);
        let mut tx = WireCodec::new(a);
        let mut rx = WireCodec::new(b);

        tx.send(b"hello frame").await.unwrap();
        assert_eq!(rx.receive().await.unwrap(), b"hello frame");
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let (a, b) = tokio::io::duplex(64);
        let mut tx = WireCodec::new(a);
        let mut rx = WireCodec::new(b);

        tx.send(b"").await.unwrap();
        assert_eq!(rx.receive().await.unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn test_multiple_frames_in_order() {
        let (a, b) = tokio::io::duplex(1024);
        let mut tx = WireCodec::new(a);
        let mut rx = WireCodec::new(b);

        tx.send(b"first").await.unwrap();
        tx.send(b"second").await.unwrap();
        tx.send(&[0xAA; 300]).await.unwrap();

        assert_eq!(rx.receive().await.unwrap(), b"first");
        assert_eq!(rx.receive().await.unwrap(), b"second");
        assert_eq!(rx.receive().await.unwrap(), vec![0xAA; 300]);
    }

    #[tokio::test]
    async fn test_truncated_stream_is_transport_error() {
        let (a, b) = tokio::io::duplex(1024);
        let mut rx = WireCodec::new(b);

        // announce 100 bytes but deliver only 3, then close
        {
            let mut stream = a;
            stream.write_u32(100).await.unwrap();
            stream.write_all(b"abc").await.unwrap();
        }

        match rx.receive().await {
            Err(Error::Transport(_)) => {}
            other => panic!("expected transport error, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn test_closed_stream_is_transport_error() {
        let (a, b) = tokio::io::duplex(64);
        drop(a);
        let mut rx = WireCodec::new(b);
        assert!(matches!(rx.receive().await, Err(Error::Transport(_))));
    }
}
