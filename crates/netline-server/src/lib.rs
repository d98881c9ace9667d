//! # netline server
//!
//! Accepts TCP connections and dispatches each to an application-supplied
//! [`Service`], running on its own thread with blocking I/O.
//!
//! The [`Server`] owns a dedicated accept-loop thread. For every accepted
//! connection it wraps the stream in a [`Channel`](netline_tcp::Channel),
//! obtains a service instance from the application's [`ServiceFactory`],
//! and runs `service.execute(channel)` on a fresh thread. Failures inside a
//! handler are confined to that connection. [`Server::shutdown`] unblocks
//! the accept loop, closes every live channel, and joins every handler
//! thread before returning.
//!
//! The [`Rendezvous`] broker covers the framework's target use case of
//! pairing two connections and relaying between them.

mod rendezvous;
mod server;
mod service;

pub use rendezvous::{PairOutcome, Rendezvous};
pub use server::{Server, ServerState};
pub use service::{Service, ServiceFactory, SharedService};
