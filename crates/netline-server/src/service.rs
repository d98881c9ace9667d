//! The application-facing service contract.

use std::sync::Arc;

use netline_core::Result;
use netline_tcp::Channel;

/// Application-supplied logic executed once per accepted connection.
///
/// `execute` runs on a dedicated thread and owns the connection's
/// lifecycle: the framework never closes the channel when `execute`
/// returns, so a service that wants the connection torn down must call
/// [`Channel::close`] itself (or rely on the server's shutdown drain).
///
/// An `Err` return is logged and confined to the connection's thread; it
/// does not affect the server or any other connection. The same holds for
/// panics.
pub trait Service: Send + Sync {
    /// Handle one connection.
    ///
    /// # Errors
    ///
    /// Implementations propagate whatever channel or application failure
    /// ends the connection; the framework only logs it.
    fn execute(&self, channel: Arc<Channel>) -> Result<()>;
}

/// Application-supplied constructor of one [`Service`] per connection.
///
/// A factory may return a distinct instance per call or hand out clones of
/// one shared instance; the server does not care. State shared across
/// connections (a pairing broker, a room registry) belongs inside the
/// factory and the services it creates, protected by the application.
pub trait ServiceFactory: Send + Sync {
    /// Create the service instance for the next accepted connection.
    fn create(&self) -> Arc<dyn Service>;
}

/// Every `Fn() -> Arc<dyn Service>` closure is a factory.
impl<F> ServiceFactory for F
where
    F: Fn() -> Arc<dyn Service> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Service> {
        self()
    }
}

/// A factory that hands every connection the same shared service instance.
///
/// Sugar for the singleton case: the service itself carries whatever
/// cross-connection state the application needs.
pub struct SharedService {
    service: Arc<dyn Service>,
}

impl SharedService {
    /// Wrap a service instance to be shared across all connections.
    pub fn new(service: Arc<dyn Service>) -> Self {
        Self { service }
    }
}

impl ServiceFactory for SharedService {
    fn create(&self) -> Arc<dyn Service> {
        Arc::clone(&self.service)
    }
}
