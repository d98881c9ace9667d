//! # netline
//!
//! A minimal framework for line-oriented, message-based TCP services: a
//! [`Server`] that dispatches each accepted connection to an
//! application-supplied [`Service`] on its own thread, a retrying client
//! [`connect`] entry point, and a symmetric duplex [`Channel`] that frames
//! [`Message`]s as newline-terminated JSON over the byte stream.
//!
//! The framework targets small peer-pairing and relay protocols; the
//! [`Rendezvous`] broker implements the two-connection pairing rendezvous
//! those services need.
//!
//! ## A relay in a few lines
//!
//! ```no_run
//! use std::sync::Arc;
//! use netline::prelude::*;
//!
//! struct Relay {
//!     rendezvous: Arc<Rendezvous>,
//! }
//!
//! impl Service for Relay {
//!     fn execute(&self, channel: Arc<Channel>) -> netline::Result<()> {
//!         let peer = match self.rendezvous.offer(Arc::clone(&channel)) {
//!             PairOutcome::Paired(peer) => peer,
//!             PairOutcome::Rejected => {
//!                 channel.send(&Message::new(-1).with_data1("server is full"))?;
//!                 channel.close();
//!                 return Ok(());
//!             }
//!         };
//!         while let Some(message) = channel.receive()? {
//!             peer.send(&message)?;
//!         }
//!         peer.close();
//!         Ok(())
//!     }
//! }
//!
//! let rendezvous = Arc::new(Rendezvous::new());
//! let service = Arc::new(Relay { rendezvous });
//! let server = Server::new(Arc::new(SharedService::new(service)), 4000)?;
//!
//! let client = netline::connect("localhost", 4000)?;
//! client.send(&Message::new(1).with_data1("hello"))?;
//! # server.shutdown();
//! # Ok::<(), netline::Error>(())
//! ```
//!
//! ## Wire protocol
//!
//! Each direction of a connection is a sequence of independent
//! newline-terminated lines, each the JSON object
//! `{"op": <integer>, "data1": <string>, "data2": <string>, "data3": <string>}`.
//! No handshake, no length prefix, no reserved opcodes: the opcode space
//! belongs entirely to the application.

pub use netline_core::{Error, Message, Result};
pub use netline_server::{
    PairOutcome, Rendezvous, Server, ServerState, Service, ServiceFactory, SharedService,
};
pub use netline_tcp::{
    Channel, ConnectOptions, DEFAULT_RETRY_COUNT, connect, connect_with_options,
};

/// The wire codec, re-exported for applications that frame messages over
/// their own byte streams.
pub use netline_wire as wire;

/// Common imports for building netline services.
pub mod prelude {
    pub use netline_core::{Error, Message, Result};
    pub use netline_server::{
        PairOutcome, Rendezvous, Server, ServerState, Service, ServiceFactory, SharedService,
    };
    pub use netline_tcp::{Channel, ConnectOptions, connect, connect_with_options};
}
