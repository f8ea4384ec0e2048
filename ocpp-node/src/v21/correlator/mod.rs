mod envelope;
mod handle;
mod pending;

use std::{sync::Arc, time::Duration};

use ocpp_core::{
    format::message::{CallResponse, EncodeDecode},
    v21::protocol_error::ProtocolError,
};
use tokio::{sync::oneshot, time::Instant};

use crate::v21::{
    error::{OcppError, TransportError},
    interfaces::Transport,
    routing::Route,
};

pub use envelope::{RequestEnvelope, ResponseEnvelope, Signature};
pub use handle::ResponseHandle;
use pending::{PendingRequest, PendingRequests};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Delivered,
    /// No outstanding request carries this id, it was unknown or already
    /// resolved. The response is dropped.
    Orphan,
}

/// Pairs outbound calls with their responses by unique id.
pub struct Correlator<T: Transport> {
    transport: Arc<T>,
    pending: Arc<PendingRequests>,
    default_timeout: Duration,
}

impl<T: Transport> Correlator<T> {
    pub fn new(transport: Arc<T>, default_timeout: Duration) -> Self {
        Self {
            transport,
            pending: Arc::new(PendingRequests::default()),
            default_timeout,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn is_pending(&self, request_id: &str) -> bool {
        self.pending.contains(request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Registers the request, writes it to the transport and hands back the
    /// handle its response will arrive on.
    pub async fn send<P: serde::Serialize>(
        &self,
        route: &Route,
        envelope: &RequestEnvelope<P>,
        timeout: Option<Duration>,
    ) -> Result<ResponseHandle, OcppError> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        if timeout.is_zero() {
            return Err(OcppError::InvalidTimeout);
        }
        let frame = envelope.to_call()?.encode();
        let request_id = envelope.request_id.clone();
        let deadline = Instant::now() + timeout;
        let (tx, rx) = oneshot::channel();

        if let Err(e) = self.pending.insert(
            request_id.clone(),
            PendingRequest {
                action: envelope.action,
                connection_id: route.connection_id.clone(),
                sent_at: envelope.timestamp,
                deadline,
                tx,
            },
        ) {
            log::error!("refusing to send {}: {}", envelope.action, e);
            return Err(e);
        }
        let handle = ResponseHandle::new(request_id.clone(), deadline, rx, self.pending.clone());

        log::info!("[MSG_OUT] {}", frame);
        if let Err(e) = self.transport.send(route, frame).await {
            log::warn!("{} `{}` not sent: {}", envelope.action, request_id, e);
            self.pending.remove(&request_id);
            return Err(OcppError::Transport(e));
        }
        Ok(handle)
    }

    pub fn complete(&self, response: CallResponse<ProtocolError>) -> Completion {
        self.complete_envelope(response.into())
    }

    pub fn complete_envelope(&self, response: ResponseEnvelope) -> Completion {
        if self.pending.resolve(&response.request_id, response.outcome) {
            Completion::Delivered
        } else {
            log::warn!("orphan response for `{}` dropped", response.request_id);
            Completion::Orphan
        }
    }

    /// Times out every request whose deadline has passed. Returns how many
    /// were resolved by this sweep.
    pub fn sweep_expired(&self) -> usize {
        self.pending
            .expired(Instant::now())
            .into_iter()
            .filter(|id| self.pending.resolve(id, Err(OcppError::Timeout(id.clone()))))
            .count()
    }

    /// Fails everything that was written to a connection that went away.
    pub fn fail_connection(&self, connection_id: &str) -> usize {
        self.pending
            .on_connection(connection_id)
            .into_iter()
            .filter(|id| {
                self.pending.resolve(
                    id,
                    Err(OcppError::Transport(TransportError::Disconnected(
                        connection_id.to_string(),
                    ))),
                )
            })
            .count()
    }
}
