//! Client connector with bounded retry.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use netline_core::{Error, Result};

use crate::channel::Channel;

/// Total connect attempts made by [`connect`].
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Fixed delay between connect attempts.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Connect attempt policy.
///
/// The backoff is fixed rather than exponential: the point of retrying is
/// to ride out a server whose bind has not completed yet, and the server
/// shutdown protocol relies on a connect against a listening server
/// succeeding promptly.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Total number of connect attempts; a value of 0 still attempts once.
    pub retry_count: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl ConnectOptions {
    /// Set the total number of connect attempts.
    #[must_use]
    pub const fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the fixed delay between attempts.
    #[must_use]
    pub const fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Connect to a server with the default retry policy.
///
/// # Errors
///
/// Returns [`Error::InvalidAddressOrPort`] if the address does not validate
/// (see [`connect_with_options`]) and [`Error::ConnectionEstablishment`] if
/// every attempt fails.
pub fn connect(address: &str, port: u16) -> Result<Channel> {
    connect_with_options(address, port, &ConnectOptions::default())
}

/// Connect to a server with an explicit retry policy.
///
/// The address may be a numeric IPv4/IPv6 literal or a resolvable
/// hostname. Validation and resolution happen before any connect attempt;
/// a failure there is terminal and never retried. Transport-level connect
/// failures are retried up to `options.retry_count` attempts in total, with
/// the fixed backoff slept between attempts only.
///
/// # Errors
///
/// Returns [`Error::InvalidAddressOrPort`] if the port is 0 or the address
/// fails to validate or resolve, and [`Error::ConnectionEstablishment`],
/// carrying the last underlying error, once all attempts are exhausted.
pub fn connect_with_options(address: &str, port: u16, options: &ConnectOptions) -> Result<Channel> {
    let targets = resolve(address, port)?;
    let attempts = options.retry_count.max(1);
    let mut last_failure = String::new();
    for attempt in 1..=attempts {
        match try_targets(&targets, &mut last_failure) {
            Some(stream) => {
                debug!(address, port, attempt, "connection established");
                return Channel::from_stream(stream);
            }
            None if attempt < attempts => {
                warn!(
                    address,
                    port, attempt, attempts, "connect attempt failed, backing off"
                );
                thread::sleep(options.backoff);
            }
            None => {}
        }
    }
    Err(Error::ConnectionEstablishment {
        address: address.to_string(),
        port,
        details: last_failure,
    })
}

fn try_targets(targets: &[SocketAddr], last_failure: &mut String) -> Option<TcpStream> {
    for target in targets {
        match TcpStream::connect(target) {
            Ok(stream) => return Some(stream),
            Err(source) => *last_failure = source.to_string(),
        }
    }
    None
}

/// Validate and resolve the remote endpoint. Accepts numeric literals and
/// hostnames; rejects port 0 (ports above 65535 are unrepresentable).
fn resolve(address: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let invalid = || Error::InvalidAddressOrPort {
        address: address.to_string(),
        port,
    };
    if port == 0 {
        return Err(invalid());
    }
    let targets: Vec<SocketAddr> = (address, port)
        .to_socket_addrs()
        .map_err(|_| invalid())?
        .collect();
    if targets.is_empty() {
        return Err(invalid());
    }
    Ok(targets)
}
