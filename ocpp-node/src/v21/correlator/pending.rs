use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::{sync::oneshot, time::Instant};

use crate::v21::error::OcppError;

pub(crate) type Outcome = Result<serde_json::Value, OcppError>;

pub(crate) struct PendingRequest {
    pub action: &'static str,
    pub connection_id: String,
    pub sent_at: DateTime<Utc>,
    pub deadline: Instant,
    pub tx: oneshot::Sender<Outcome>,
}

/// Outstanding requests by id. Removing an entry is the only way to resolve
/// it, which makes every request resolve exactly once.
#[derive(Default)]
pub(crate) struct PendingRequests {
    map: DashMap<String, PendingRequest>,
}

impl PendingRequests {
    pub fn insert(&self, request_id: String, pending: PendingRequest) -> Result<(), OcppError> {
        match self.map.entry(request_id) {
            Entry::Occupied(entry) => Err(OcppError::DuplicateRequestId(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(pending);
                Ok(())
            }
        }
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.map.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn remove(&self, request_id: &str) -> Option<PendingRequest> {
        self.map.remove(request_id).map(|(_, pending)| pending)
    }

    /// Returns false when the request was already resolved or never existed.
    pub fn resolve(&self, request_id: &str, outcome: Outcome) -> bool {
        match self.remove(request_id) {
            Some(pending) => {
                log::trace!(
                    "resolved {} `{}` sent at {}",
                    pending.action,
                    request_id,
                    pending.sent_at
                );
                // the handle may already be gone, nothing left to notify then
                let _ = pending.tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn expired(&self, now: Instant) -> Vec<String> {
        self.map
            .iter()
            .filter(|entry| entry.value().deadline <= now)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn on_connection(&self, connection_id: &str) -> Vec<String> {
        self.map
            .iter()
            .filter(|entry| entry.value().connection_id == connection_id)
            .map(|entry| entry.key().clone())
            .collect()
    }
}
