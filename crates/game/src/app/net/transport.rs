use std::collections::VecDeque;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::envelope::EnvelopeError;

pub(crate) const DEFAULT_OUTBOUND_CAP_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub(crate) enum TransportError {
    #[error("transport write failed: {0}")]
    Io(#[from] io::Error),
    #[error("outbound queue full: {pending_bytes} bytes pending, {chunk_bytes} more would exceed cap {cap_bytes}")]
    QueueFull {
        pending_bytes: usize,
        chunk_bytes: usize,
        cap_bytes: usize,
    },
    #[error("transport is disconnected")]
    Disconnected,
    #[error(transparent)]
    Encode(#[from] EnvelopeError),
}

/// Outbound byte channel to the remote authority.
///
/// `send` must return within the current frame; implementations queue what
/// they cannot write immediately and drain it from `flush`.
pub(crate) trait Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Debug)]
struct OutboundChunkState {
    bytes: Vec<u8>,
    written: usize,
}

#[derive(Debug)]
pub(crate) struct TcpCommandTransport {
    stream: TcpStream,
    peer: SocketAddr,
    active_chunk: Option<OutboundChunkState>,
    queued_chunks: VecDeque<Vec<u8>>,
    queued_bytes: usize,
    cap_bytes: usize,
    disconnected: bool,
}

impl TcpCommandTransport {
    pub(crate) fn connect(
        addr: SocketAddr,
        cap_bytes: usize,
        connect_timeout: Duration,
    ) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, connect_timeout)?;
        Self::from_stream(stream, cap_bytes)
    }

    fn from_stream(stream: TcpStream, cap_bytes: usize) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        if let Err(err) = stream.set_nodelay(true) {
            warn!(error = %err, "transport_nodelay_failed");
        }
        let peer = stream.peer_addr()?;
        Ok(Self {
            stream,
            peer,
            active_chunk: None,
            queued_chunks: VecDeque::new(),
            queued_bytes: 0,
            cap_bytes,
            disconnected: false,
        })
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn pending_bytes(&self) -> usize {
        let active_remaining = self
            .active_chunk
            .as_ref()
            .map(|state| state.bytes.len().saturating_sub(state.written))
            .unwrap_or(0);
        self.queued_bytes.saturating_add(active_remaining)
    }

    fn enqueue(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let pending_bytes = self.pending_bytes();
        if pending_bytes.saturating_add(bytes.len()) > self.cap_bytes {
            return Err(TransportError::QueueFull {
                pending_bytes,
                chunk_bytes: bytes.len(),
                cap_bytes: self.cap_bytes,
            });
        }
        self.queued_bytes = self.queued_bytes.saturating_add(bytes.len());
        self.queued_chunks.push_back(bytes.to_vec());
        Ok(())
    }
}

impl Transport for TcpCommandTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.disconnected {
            return Err(TransportError::Disconnected);
        }
        self.enqueue(bytes)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        if self.disconnected {
            return Err(TransportError::Disconnected);
        }
        let result = flush_pending_chunks(
            &mut self.active_chunk,
            &mut self.queued_chunks,
            &mut self.queued_bytes,
            |payload| self.stream.write(payload),
        );
        if let Err(err) = result {
            self.disconnected = true;
            self.active_chunk = None;
            self.queued_chunks.clear();
            self.queued_bytes = 0;
            return Err(TransportError::Io(err));
        }
        Ok(())
    }
}

fn flush_pending_chunks<F>(
    active_chunk: &mut Option<OutboundChunkState>,
    queued_chunks: &mut VecDeque<Vec<u8>>,
    queued_bytes: &mut usize,
    mut write_payload: F,
) -> io::Result<()>
where
    F: FnMut(&[u8]) -> io::Result<usize>,
{
    loop {
        let state = match active_chunk {
            Some(state) => state,
            None => {
                let Some(bytes) = queued_chunks.pop_front() else {
                    return Ok(());
                };
                *queued_bytes = queued_bytes.saturating_sub(bytes.len());
                active_chunk.insert(OutboundChunkState { bytes, written: 0 })
            }
        };

        let remaining = &state.bytes[state.written..];
        match write_payload(remaining) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "transport_write_zero",
                ));
            }
            Ok(bytes_written) => {
                state.written = state.written.saturating_add(bytes_written);
                if state.written >= state.bytes.len() {
                    *active_chunk = None;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                debug!(
                    written = state.written,
                    total = state.bytes.len(),
                    queued_len = queued_chunks.len(),
                    "transport_flush_would_block"
                );
                return Ok(());
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}
