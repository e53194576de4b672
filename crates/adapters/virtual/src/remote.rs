//! Logging remote channel — records outbound requests instead of sending them.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actiflow_app::ports::RemoteChannel;
use actiflow_domain::error::RemoteSendFailure;
use actiflow_domain::remote::RemoteRequest;

#[derive(Debug)]
struct RemoteState {
    delivered: Vec<RemoteRequest>,
    reachable: bool,
}

/// A [`RemoteChannel`] that logs every request and keeps the delivered ones.
///
/// While unreachable, requests are dropped with a logged
/// [`RemoteSendFailure`]; the caller never sees the failure.
#[derive(Debug, Clone)]
pub struct VirtualRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl Default for VirtualRemote {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(RemoteState {
                delivered: Vec::new(),
                reachable: true,
            })),
        }
    }
}

impl VirtualRemote {
    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests that were delivered, oldest first.
    #[must_use]
    pub fn delivered(&self) -> Vec<RemoteRequest> {
        self.lock().delivered.clone()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }
}

impl RemoteChannel for VirtualRemote {
    fn send(&self, request: RemoteRequest) -> impl Future<Output = ()> + Send {
        let mut state = self.lock();
        if state.reachable {
            tracing::info!(
                uri = %request.uri,
                method = %request.method,
                payload = %request.payload,
                "remote request delivered"
            );
            state.delivered.push(request);
        } else {
            let failure = RemoteSendFailure {
                uri: request.uri,
                method: request.method,
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "remote peer unreachable",
                )),
            };
            tracing::warn!(err = %failure, "remote request dropped");
        }
        async {}
    }
}
