//! Remote channel port — best-effort outbound requests.
//!
//! Inbound events do not go through this port: transports hand them to the
//! instance through its [`InstanceHandle`](crate::runner::InstanceHandle).

use std::future::Future;

use actiflow_domain::remote::RemoteRequest;

/// Sends one-way requests to remote peers.
pub trait RemoteChannel: Send + Sync {
    /// Send `request` without waiting for an answer.
    ///
    /// Delivery failures are the implementation's to log; they must never
    /// stall or fail the caller.
    fn send(&self, request: RemoteRequest) -> impl Future<Output = ()> + Send;
}

impl<T: RemoteChannel> RemoteChannel for std::sync::Arc<T> {
    fn send(&self, request: RemoteRequest) -> impl Future<Output = ()> + Send {
        (**self).send(request)
    }
}
