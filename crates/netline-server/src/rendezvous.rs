//! Pairing rendezvous between two connection handlers.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use netline_tcp::Channel;

/// What [`Rendezvous::offer`] resolved to for one connection.
#[derive(Debug, Clone)]
pub enum PairOutcome {
    /// A peer arrived; this is its channel.
    Paired(Arc<Channel>),
    /// Both slots were already taken.
    Rejected,
}

/// One-directional pairing state.
#[derive(Default)]
enum State {
    #[default]
    Empty,
    /// The first connection is parked, waiting for a peer.
    WaitingForPeer(Arc<Channel>),
    /// The second connection arrived; its channel awaits pickup by the
    /// first.
    Paired(Arc<Channel>),
    /// Handoff complete; all later connections are rejected.
    Full,
}

/// A one-shot rendezvous point pairing the first two connections offered
/// to it.
///
/// The genuinely shared mutable state of a pairing service lives here
/// rather than in ad hoc locking inside handlers. The state machine is
/// `Empty → WaitingForPeer → Paired → Full`, one-directional: the broker
/// never resets, so a server that should pair again uses a fresh
/// `Rendezvous`.
///
/// Typical use: a factory holds an `Arc<Rendezvous>` and hands it to every
/// service it creates; each handler calls [`Rendezvous::offer`] with its
/// own channel and either relays to the returned peer or tells the
/// connection it was rejected.
#[derive(Default)]
pub struct Rendezvous {
    state: Mutex<State>,
    arrived: Condvar,
}

impl Rendezvous {
    /// Create an empty rendezvous point.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a connection for pairing.
    ///
    /// The first caller blocks until a peer arrives and receives the
    /// peer's channel; the second caller returns immediately with the
    /// first caller's channel; every later caller is rejected. The call
    /// blocks indefinitely for the first connection: closing its channel
    /// from elsewhere (e.g. the server's shutdown drain) does not wake it,
    /// only the arrival of a peer does.
    #[must_use]
    pub fn offer(&self, channel: Arc<Channel>) -> PairOutcome {
        let mut state = self.state.lock();
        match &*state {
            State::Empty => {
                debug!(peer = %channel.peer_addr(), "waiting for peer");
                *state = State::WaitingForPeer(channel);
                loop {
                    self.arrived.wait(&mut state);
                    if matches!(*state, State::Paired(_)) {
                        let State::Paired(peer) = std::mem::replace(&mut *state, State::Full)
                        else {
                            unreachable!()
                        };
                        return PairOutcome::Paired(peer);
                    }
                }
            }
            State::WaitingForPeer(_) => {
                let State::WaitingForPeer(first) =
                    std::mem::replace(&mut *state, State::Paired(channel))
                else {
                    unreachable!()
                };
                debug!(peer = %first.peer_addr(), "pair complete");
                self.arrived.notify_one();
                PairOutcome::Paired(first)
            }
            State::Paired(_) | State::Full => PairOutcome::Rejected,
        }
    }
}
