//! Core types for the netline framework.
//!
//! This crate is the foundation layer shared by every other netline crate:
//! the [`Message`] value type exchanged between peers and the [`Error`]
//! taxonomy surfaced by the transport, connector, and server layers.

pub mod error;
pub mod message;

pub use error::{Error, Result};
pub use message::Message;
