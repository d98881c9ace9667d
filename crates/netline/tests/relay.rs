//! End-to-end pairing-relay scenarios over real TCP connections.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use netline::prelude::*;

/// Application opcodes for the relay protocol under test.
const OP_EXIT: i64 = 0;
const OP_REJECT: i64 = -1;
const OP_CHAT: i64 = 1;
const OP_CHAT_BACK: i64 = 2;

/// Pairs the first two connections and forwards messages between them; any
/// further connection is told the server is full and disconnected.
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

fn start_relay_server() -> Server {
    let service = Arc::new(RelayService {
        rendezvous: Arc::new(Rendezvous::new()),
    });
    Server::bind(Arc::new(SharedService::new(service)), 0, "127.0.0.1")
        .expect("ephemeral port must bind")
}

fn client(server: &Server) -> Channel {
    connect("127.0.0.1", server.local_addr().port()).expect("server is listening")
}

#[test]
fn relays_between_paired_clients_and_rejects_a_third() {
    let server = start_relay_server();
    let first = client(&server);
    let second = client(&server);

    // Both directions relay independently.
    first
        .send(&Message::new(OP_CHAT).with_data1("Hello, second!"))
        .unwrap();
    second
        .send(&Message::new(OP_CHAT_BACK).with_data1("Hello, first!"))
        .unwrap();
    assert_eq!(
        second.receive().unwrap(),
        Some(Message::new(OP_CHAT).with_data1("Hello, second!"))
    );
    assert_eq!(
        first.receive().unwrap(),
        Some(Message::new(OP_CHAT_BACK).with_data1("Hello, first!"))
    );

    // Both clients are now provably paired, so a third is rejected: it
    // receives the application-level rejection, then end-of-stream.
    let third = client(&server);
    let rejection = third.receive().unwrap().expect("rejection message");
    assert_eq!(rejection.opcode, OP_REJECT);
    assert!(third.receive().unwrap().is_none());

    // Payload fields survive the relay untouched.
    first
        .send(
            &Message::new(OP_CHAT)
                .with_data1("Goodbye, second!")
                .with_data2("payload\nwith newline")
                .with_data3("🦀"),
        )
        .unwrap();
    let relayed = second.receive().unwrap().unwrap();
    assert_eq!(relayed.data2, "payload\nwith newline");
    assert_eq!(relayed.data3, "🦀");

    // The exit opcode propagates to the peer and ends both connections.
    first.send(&Message::new(OP_EXIT)).unwrap();
    assert_eq!(second.receive().unwrap().map(|m| m.opcode), Some(OP_EXIT));
    assert!(second.receive().unwrap().is_none());
    assert_eq!(first.receive().unwrap().map(|m| m.opcode), Some(OP_EXIT));
    assert!(first.receive().unwrap().is_none());

    server.shutdown();
}

#[test]
fn peer_close_delivers_exit_then_end_of_stream() {
    let server = start_relay_server();
    let first = client(&server);
    let second = client(&server);

    // Prove the pair is established before closing.
    first.send(&Message::new(OP_CHAT).with_data1("ping")).unwrap();
    assert_eq!(second.receive().unwrap().map(|m| m.opcode), Some(OP_CHAT));

    // Closing without sending an exit opcode still notifies the peer.
    first.close();
    assert_eq!(second.receive().unwrap().map(|m| m.opcode), Some(OP_EXIT));
    assert!(second.receive().unwrap().is_none());

    server.shutdown();
}

#[test]
fn per_connection_factories_work_with_shared_broker() {
    // The same relay built from per-connection service instances sharing
    // one broker through the factory closure.
    let rendezvous = Arc::new(Rendezvous::new());
    let factory = {
        let rendezvous = Arc::clone(&rendezvous);
        move || -> Arc<dyn Service> {
            Arc::new(RelayService {
                rendezvous: Arc::clone(&rendezvous),
            })
        }
    };
    let server = Server::bind(Arc::new(factory), 0, "127.0.0.1").unwrap();

    let first = client(&server);
    let second = client(&server);
    second
        .send(&Message::new(OP_CHAT).with_data1("across instances"))
        .unwrap();
    assert_eq!(
        first.receive().unwrap(),
        Some(Message::new(OP_CHAT).with_data1("across instances"))
    );

    first.send(&Message::new(OP_EXIT)).unwrap();
    assert_eq!(second.receive().unwrap().map(|m| m.opcode), Some(OP_EXIT));
    server.shutdown();
}
