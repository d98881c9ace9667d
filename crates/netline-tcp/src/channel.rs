//! Duplex message channel over an established TCP stream.

use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::{debug, trace};

use netline_core::{Error, Message, Result};

/// Bytes requested from the stream per read call while assembling a line.
const READ_CHUNK: usize = 1024;

struct ReadHalf {
    stream: TcpStream,
    /// Bytes received but not yet resolved into a complete line.
    buffer: BytesMut,
}

/// A duplex, message-framed wrapper over one established TCP connection.
///
/// Created by the client connector on a successful connect, or by the
/// server for each accepted connection. Send and receive paths hold
/// independent locks; [`Channel::close`] takes neither, so it is safe from
/// any thread at any time, including while another thread is blocked in
/// [`Channel::receive`].
pub struct Channel {
    read: Mutex<ReadHalf>,
    write: Mutex<TcpStream>,
    /// Dedicated handle for `close()`; never used for data transfer.
    shutdown_handle: TcpStream,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl Channel {
    /// Wrap an established stream in a channel, capturing the peer
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BrokenPipe`] if the stream's peer address cannot be
    /// read or the stream handle cannot be cloned, which means the
    /// connection died between establishment and wrapping.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        let peer = stream.peer_addr().map_err(|source| Error::BrokenPipe {
            address: "unknown".into(),
            port: 0,
            details: source.to_string(),
        })?;
        let clone_failed = |source: std::io::Error| Error::BrokenPipe {
            address: peer.ip().to_string(),
            port: peer.port(),
            details: source.to_string(),
        };
        let read_half = stream.try_clone().map_err(clone_failed)?;
        let write_half = stream.try_clone().map_err(clone_failed)?;
        Ok(Self {
            read: Mutex::new(ReadHalf {
                stream: read_half,
                buffer: BytesMut::with_capacity(READ_CHUNK),
            }),
            write: Mutex::new(write_half),
            shutdown_handle: stream,
            peer,
            closed: AtomicBool::new(false),
        })
    }

    /// Send one message.
    ///
    /// Writes from concurrent callers are serialized under the write lock;
    /// encoded lines are never interleaved at the byte level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BrokenPipe`] if the channel is already closed
    /// locally or the underlying write fails.
    pub fn send(&self, message: &Message) -> Result<()> {
        let bytes = netline_wire::encode(message);
        let mut stream = self.write.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(self.broken_pipe("channel closed locally"));
        }
        stream
            .write_all(&bytes)
            .map_err(|source| self.broken_pipe(&source.to_string()))?;
        trace!(peer = %self.peer, opcode = message.opcode, "sent message");
        Ok(())
    }

    /// Receive the next message, blocking until a full line is available.
    ///
    /// Returns `Ok(None)` on end-of-stream: the peer closed its sending
    /// direction, or this channel was closed locally. A line already framed
    /// in the buffer is still delivered after a local close; end-of-stream
    /// follows on the next call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BrokenPipe`] on a read failure that is not a close,
    /// and [`Error::InvalidMessage`] when a line fails to decode. The
    /// corrupted line is discarded and the channel stays usable, so the
    /// protocol resynchronizes on the next line.
    pub fn receive(&self) -> Result<Option<Message>> {
        let mut read = self.read.lock();
        loop {
            if let Some(newline) = read.buffer.iter().position(|&byte| byte == b'\n') {
                let line = read.buffer.split_to(newline + 1);
                return netline_wire::decode(&line[..line.len() - 1]).map(Some);
            }
            if self.closed.load(Ordering::Acquire) {
                return Ok(None);
            }
            let mut chunk = [0_u8; READ_CHUNK];
            match read.stream.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(count) => read.buffer.extend_from_slice(&chunk[..count]),
                Err(source) if source.kind() == ErrorKind::Interrupted => {}
                // A concurrent local close may surface as a reset instead
                // of a zero-byte read; report it as end-of-stream either
                // way.
                Err(_) if self.closed.load(Ordering::Acquire) => return Ok(None),
                Err(source) => return Err(self.broken_pipe(&source.to_string())),
            }
        }
    }

    /// Close both directions of the connection.
    ///
    /// Idempotent and safe from any thread, including concurrently with an
    /// in-flight [`Channel::send`] or [`Channel::receive`]; a blocked
    /// receive observes end-of-stream. Never blocks on I/O; shutdown
    /// failures on an already-dead connection are swallowed.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(peer = %self.peer, "closing channel");
            let _ = self.shutdown_handle.shutdown(Shutdown::Both);
        }
    }

    /// The peer's socket address, captured at construction.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// The peer's IP address.
    #[must_use]
    pub fn peer_address(&self) -> IpAddr {
        self.peer.ip()
    }

    /// The peer's port.
    #[must_use]
    pub fn peer_port(&self) -> u16 {
        self.peer.port()
    }

    fn broken_pipe(&self, details: &str) -> Error {
        Error::BrokenPipe {
            address: self.peer.ip().to_string(),
            port: self.peer.port(),
            details: details.to_string(),
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("peer", &self.peer)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}
