//! # netline TCP transport
//!
//! The duplex [`Channel`], a message-framed wrapper over one established
//! TCP connection, and the client [`connect`] entry point with bounded
//! retry.
//!
//! All I/O is blocking. A channel's read and write paths are guarded by
//! independent locks, so one thread can sit in [`Channel::receive`] while
//! another calls [`Channel::send`] on the same channel: the usual shape of
//! a relay handler that forwards in one direction while its peer's handler
//! writes in the other.

mod channel;
mod connector;

pub use channel::Channel;
pub use connector::{ConnectOptions, DEFAULT_RETRY_COUNT, connect, connect_with_options};
