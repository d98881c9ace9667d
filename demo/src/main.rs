//! Pairing-relay demo: one server, two chatting clients, one rejected.
//!
//! Run with `RUST_LOG=debug` to watch the accept loop, pairing, and
//! shutdown protocol at work.

use std::sync::Arc;
use std::thread;

use tracing::info;
use tracing_subscriber::EnvFilter;

use netline::prelude::*;

const OP_EXIT: i64 = 0;
const OP_REJECT: i64 = -1;
const OP_CHAT: i64 = 1;

/// Pairs the first two connections and relays between them; later
/// connections are turned away.
struct RelayService {
    rendezvous: Arc<Rendezvous>,
}

impl Service for RelayService {
    fn execute(&self, channel: Arc<Channel>) -> netline::Result<()> {
        let peer = match self.rendezvous.offer(Arc::clone(&channel)) {
            PairOutcome::Paired(peer) => peer,
            PairOutcome::Rejected => {
                channel.send(&Message::new(OP_REJECT).with_data1("server is full"))?;
                channel.close();
                return Ok(());
            }
        };
        loop {
            match channel.receive()? {
                Some(message) if message.opcode != OP_EXIT => peer.send(&message)?,
                _ => break,
            }
        }
        peer.send(&Message::new(OP_EXIT))?;
        peer.close();
        Ok(())
    }
}

fn main() -> netline::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let service = Arc::new(RelayService {
        rendezvous: Arc::new(Rendezvous::new()),
    });
    let server = Server::bind(Arc::new(SharedService::new(service)), 0, "127.0.0.1")?;
    let port = server.local_addr().port();
    info!(port, "relay server up");

    let alice = connect("127.0.0.1", port)?;
    let bob = connect("127.0.0.1", port)?;

    alice.send(&Message::new(OP_CHAT).with_data1("Hello, Bob!"))?;
    let greeting = bob.receive()?.expect("relayed greeting");
    info!(text = %greeting.data1, "bob received");

    bob.send(&Message::new(OP_CHAT).with_data1("Hi, Alice!"))?;
    let reply = alice.receive()?.expect("relayed reply");
    info!(text = %reply.data1, "alice received");

    // A third caller finds the server full.
    let mallory = connect("127.0.0.1", port)?;
    let rejection = mallory.receive()?.expect("rejection message");
    info!(reason = %rejection.data1, "third client rejected");

    // Alice hangs up; Bob is told the conversation is over.
    alice.send(&Message::new(OP_EXIT))?;
    let farewell = bob.receive()?.expect("exit notification");
    info!(opcode = farewell.opcode, "bob notified");

    let waiter = thread::spawn(move || {
        // Both relay handlers wind down once the exit propagates.
        while let Ok(Some(_)) = bob.receive() {}
        while let Ok(Some(_)) = alice.receive() {}
    });
    waiter.join().expect("clients drain cleanly");

    server.shutdown();
    info!("relay server stopped");
    Ok(())
}
