//! The netline error taxonomy.

use thiserror::Error;

/// A specialized `Result` type for netline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents the failure kinds surfaced by the framework.
///
/// Each variant carries the contextual fields a caller needs for
/// diagnostics; the framework never retries on the caller's behalf once a
/// channel is established.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The address or port failed validation before any I/O. Never retried.
    #[error("invalid address or port: {address}:{port}")]
    InvalidAddressOrPort {
        /// The address as supplied by the caller.
        address: String,
        /// The port as supplied by the caller.
        port: u16,
    },

    /// Binding the listen port failed at server construction.
    #[error("failed to bind port {port}: {details}")]
    BindPort {
        /// The requested listen port.
        port: u16,
        /// Description of the underlying bind failure.
        details: String,
    },

    /// Every connect attempt, including retries, failed.
    #[error("could not establish connection to {address}:{port}: {details}")]
    ConnectionEstablishment {
        /// The remote address as supplied by the caller.
        address: String,
        /// The remote port.
        port: u16,
        /// Description of the last underlying connect failure.
        details: String,
    },

    /// A send or receive on an established channel failed at the transport
    /// level.
    #[error("broken pipe (peer {address}:{port}): {details}")]
    BrokenPipe {
        /// The peer's address.
        address: String,
        /// The peer's port.
        port: u16,
        /// Description of the underlying I/O failure.
        details: String,
    },

    /// A received line failed to decode as a well-formed message. The
    /// channel resynchronizes on the next line.
    #[error("invalid message {line:?}: {details}")]
    InvalidMessage {
        /// The offending line, without its terminator.
        line: String,
        /// Description of the decode failure.
        details: String,
    },
}
