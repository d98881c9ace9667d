//! Accept loop and graceful-shutdown state machine.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use netline_core::{Error, Result};
use netline_tcp::{Channel, ConnectOptions, connect_with_options};

use crate::service::ServiceFactory;

/// Lifecycle of a [`Server`]. Transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Constructed, acceptor not yet bound.
    Created,
    /// The accept loop is running.
    Listening,
    /// Shutdown has begun; the accept loop is being unblocked and drained.
    ShuttingDown,
    /// All handler threads have terminated.
    Stopped,
}

/// A line-oriented TCP server.
///
/// Construction binds the listen address and starts the accept-loop
/// daemon; the server is `Listening` when the constructor returns.
/// [`Server::shutdown`], also invoked on drop, drives the server to
/// `Stopped`, returning only once every handler thread has finished.
pub struct Server {
    local_addr: SocketAddr,
    shutting_down: Arc<AtomicBool>,
    state: Arc<Mutex<ServerState>>,
    daemon: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Listen on all interfaces (`::`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BindPort`] if the port cannot be bound; no thread
    /// is started in that case.
    pub fn new(factory: Arc<dyn ServiceFactory>, listen_port: u16) -> Result<Self> {
        Self::bind(factory, listen_port, "::")
    }

    /// Listen on an explicit address.
    ///
    /// Port 0 binds an ephemeral port; the actual one is available from
    /// [`Server::local_addr`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::BindPort`] if the address does not parse or the
    /// port cannot be bound.
    pub fn bind(
        factory: Arc<dyn ServiceFactory>,
        listen_port: u16,
        listen_address: &str,
    ) -> Result<Self> {
        let state = Arc::new(Mutex::new(ServerState::Created));
        let bind_failure = |details: String| Error::BindPort {
            port: listen_port,
            details,
        };
        let listener = TcpListener::bind((listen_address, listen_port))
            .map_err(|source| bind_failure(source.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| bind_failure(source.to_string()))?;

        let shutting_down = Arc::new(AtomicBool::new(false));
        let daemon = Daemon {
            listener,
            factory,
            shutting_down: Arc::clone(&shutting_down),
            state: Arc::clone(&state),
        };
        let handle = thread::Builder::new()
            .name("netline-accept".into())
            .spawn(move || daemon.run())
            .map_err(|source| bind_failure(source.to_string()))?;
        *state.lock() = ServerState::Listening;
        info!(%local_addr, "server listening");

        Ok(Self {
            local_addr,
            shutting_down,
            state,
            daemon: Mutex::new(Some(handle)),
        })
    }

    /// The address the acceptor is actually bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        *self.state.lock()
    }

    /// Stop accepting, close all live channels, and join every handler
    /// thread.
    ///
    /// Idempotent and callable from any state; blocks until all handler
    /// threads have terminated. A blocked `accept` is unblocked by a
    /// throwaway connection to the server's own listening address; its
    /// outcome is ignored, it exists only to break the blocking call.
    pub fn shutdown(&self) {
        let Some(handle) = self.daemon.lock().take() else {
            return;
        };
        info!(local_addr = %self.local_addr, "shutting down server");
        *self.state.lock() = ServerState::ShuttingDown;
        self.shutting_down.store(true, Ordering::Release);

        let wake_address = if self.local_addr.ip().is_unspecified() {
            "localhost".to_string()
        } else {
            self.local_addr.ip().to_string()
        };
        let wake = ConnectOptions::default()
            .retry_count(1)
            .backoff(Duration::from_millis(0));
        match connect_with_options(&wake_address, self.local_addr.port(), &wake) {
            Ok(channel) => channel.close(),
            Err(_) => {
                // The accept loop has already exited; nothing to unblock.
            }
        }

        if handle.join().is_err() {
            error!("accept loop panicked");
        }
        *self.state.lock() = ServerState::Stopped;
        info!(local_addr = %self.local_addr, "server stopped");
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The accept-loop thread. Owns the acceptor and the registries of live
/// channels and handler threads; both are touched only from this thread.
struct Daemon {
    listener: TcpListener,
    factory: Arc<dyn ServiceFactory>,
    shutting_down: Arc<AtomicBool>,
    state: Arc<Mutex<ServerState>>,
}

impl Daemon {
    fn run(self) {
        let mut channels: Vec<Arc<Channel>> = Vec::new();
        let mut handlers: Vec<JoinHandle<()>> = Vec::new();

        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if self.shutting_down.load(Ordering::Acquire) {
                        // The shutdown wake-up connection; drop it and exit.
                        drop(stream);
                        break;
                    }
                    debug!(%peer, "accepted connection");
                    let channel = match Channel::from_stream(stream) {
                        Ok(channel) => Arc::new(channel),
                        Err(error) => {
                            warn!(%peer, %error, "dropping connection that died before wrapping");
                            continue;
                        }
                    };
                    channels.push(Arc::clone(&channel));
                    let service = self.factory.create();
                    let worker_channel = Arc::clone(&channel);
                    let spawned = thread::Builder::new()
                        .name(format!("netline-conn-{peer}"))
                        .spawn(move || {
                            if let Err(error) = service.execute(worker_channel) {
                                error!(%peer, %error, "service failed");
                            }
                        });
                    match spawned {
                        Ok(handle) => handlers.push(handle),
                        Err(error) => {
                            warn!(%peer, %error, "failed to spawn handler thread");
                            channel.close();
                        }
                    }
                }
                Err(error) => {
                    if !self.shutting_down.load(Ordering::Acquire) {
                        error!(%error, "accept failed, stopping accept loop");
                        *self.state.lock() = ServerState::ShuttingDown;
                        self.shutting_down.store(true, Ordering::Release);
                    }
                    break;
                }
            }
        }

        // Release the acceptor before draining so the port frees up even if
        // a handler takes a while to observe its closed channel.
        drop(self.listener);
        debug!(
            channels = channels.len(),
            handlers = handlers.len(),
            "draining connections"
        );
        for channel in &channels {
            channel.close();
        }
        for handler in handlers {
            if handler.join().is_err() {
                error!("connection handler panicked");
            }
        }
    }
}
