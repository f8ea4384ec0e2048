use std::{fmt, sync::Arc};

use tokio::{sync::oneshot, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::v21::error::{OcppError, TransportError};

use super::pending::{Outcome, PendingRequests};

/// Caller side of one outstanding request.
pub struct ResponseHandle {
    request_id: String,
    deadline: Instant,
    rx: oneshot::Receiver<Outcome>,
    pending: Arc<PendingRequests>,
}

impl ResponseHandle {
    pub(crate) fn new(
        request_id: String,
        deadline: Instant,
        rx: oneshot::Receiver<Outcome>,
        pending: Arc<PendingRequests>,
    ) -> Self {
        Self {
            request_id,
            deadline,
            rx,
            pending,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the response, the deadline or `cancel`, whichever resolves
    /// the pending entry first.
    pub async fn recv(
        mut self,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, OcppError> {
        tokio::select! {
            res = &mut self.rx => return self.flatten(res),
            _ = tokio::time::sleep_until(self.deadline) => {
                let id = self.request_id.clone();
                if self.pending.resolve(&id, Err(OcppError::Timeout(id.clone()))) {
                    log::warn!("request `{}` timed out", id);
                }
            }
            _ = cancel.cancelled() => {
                let id = self.request_id.clone();
                if self.pending.resolve(&id, Err(OcppError::Cancelled(id.clone()))) {
                    log::debug!("request `{}` cancelled by caller", id);
                }
            }
        }
        // whoever removed the entry has sent, or is about to send, the outcome
        let res = (&mut self.rx).await;
        self.flatten(res)
    }

    fn flatten(&self, res: Result<Outcome, oneshot::error::RecvError>) -> Outcome {
        res.unwrap_or_else(|_| {
            Err(OcppError::Transport(TransportError::Closed(
                self.request_id.clone(),
            )))
        })
    }
}

impl fmt::Debug for ResponseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseHandle")
            .field("request_id", &self.request_id)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Drop for ResponseHandle {
    fn drop(&mut self) {
        // nobody is waiting anymore, don't keep the entry until the sweeper runs
        self.pending.remove(&self.request_id);
    }
}
