use chrono::{DateTime, Utc};
use ocpp_core::v21::types::{IdToken, OperationalStatus};

use super::{EntityStore, EvseState};

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub evse_id: i32,
    pub id_token: IdToken,
    pub remote_start_id: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub seq_no: u32,
    pub total_cost: Option<f64>,
    pub reservation_id: Option<i32>,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum StartRejection {
    #[error("evse {0} does not exist")]
    UnknownEvse(i32),
    #[error("no idle evse available")]
    NoIdleEvse,
    #[error("evse {0} already has a transaction")]
    Occupied(i32),
    #[error("evse {0} is faulted")]
    Faulted(i32),
    #[error("evse {0} is inoperative")]
    Unavailable(i32),
    #[error("evse {0} is reserved for another token")]
    Reserved(i32),
}

impl EntityStore {
    /// Starts a transaction on `evse_id`, or on the lowest idle EVSE when no
    /// id is given. The check and the state change happen under the EVSE's
    /// lock, so of two concurrent starts on one EVSE exactly one succeeds.
    /// A reservation held by the same token is consumed, an expired one is
    /// dropped first.
    pub fn start_transaction(
        &self,
        evse_id: Option<i32>,
        id_token: &IdToken,
        remote_start_id: Option<i32>,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Result<TransactionRecord, StartRejection> {
        self.purge_expired_reservations(now);
        let evse_id = match evse_id {
            Some(id) => id,
            None => self
                .evses
                .find_key(|_, evse| evse.is_startable() && evse.reservation_id.is_none())
                .ok_or(StartRejection::NoIdleEvse)?,
        };
        let mut evse = self
            .evses
            .get_mut(&evse_id)
            .ok_or(StartRejection::UnknownEvse(evse_id))?;
        match evse.state {
            EvseState::Charging { .. } => return Err(StartRejection::Occupied(evse_id)),
            EvseState::Faulted => return Err(StartRejection::Faulted(evse_id)),
            EvseState::Idle => {}
        }
        if evse.operational == OperationalStatus::Inoperative {
            return Err(StartRejection::Unavailable(evse_id));
        }
        let reservation_id = match evse.reservation_id {
            Some(reservation_id) => {
                let held_by_token = self
                    .reservations
                    .try_get(&reservation_id)
                    .map(|reservation| reservation.accepts(id_token, now))
                    .unwrap_or(false);
                if !held_by_token {
                    return Err(StartRejection::Reserved(evse_id));
                }
                self.reservations.try_remove(&reservation_id);
                evse.reservation_id = None;
                Some(reservation_id)
            }
            None => None,
        };

        let record = TransactionRecord {
            transaction_id: transaction_id.clone(),
            evse_id,
            id_token: id_token.clone(),
            remote_start_id,
            started_at: now,
            seq_no: 0,
            total_cost: None,
            reservation_id,
        };
        evse.state = EvseState::Charging {
            transaction_id: transaction_id.clone(),
        };
        self.transactions.upsert(transaction_id, record.clone());
        Ok(record)
    }

    /// Ends the transaction and frees its EVSE. `None` if it is not running.
    pub fn stop_transaction(&self, transaction_id: &str) -> Option<TransactionRecord> {
        let evse_id = self.transactions.try_get(&transaction_id.to_string())?.evse_id;
        let mut evse = self.evses.get_mut(&evse_id)?;
        // a concurrent stop may have won between the lookup and the lock
        let mut record = self.transactions.try_remove(&transaction_id.to_string())?;
        if matches!(&evse.state, EvseState::Charging { transaction_id: t } if t == transaction_id) {
            evse.state = EvseState::Idle;
        }
        record.seq_no += 1;
        Some(record)
    }

    pub fn transaction(&self, transaction_id: &str) -> Option<TransactionRecord> {
        self.transactions.try_get(&transaction_id.to_string())
    }

    pub fn is_transaction_active(&self, transaction_id: &str) -> bool {
        self.transactions.contains(&transaction_id.to_string())
    }

    pub fn has_active_transactions(&self) -> bool {
        !self.transactions.is_empty()
    }

    pub fn active_transactions(&self) -> Vec<TransactionRecord> {
        self.transactions.values()
    }

    /// Bumps the sequence number and returns the one to use for the next event.
    pub fn next_seq_no(&self, transaction_id: &str) -> Option<u32> {
        self.transactions.update(&transaction_id.to_string(), |record| {
            record.seq_no += 1;
            record.seq_no
        })
    }

    pub fn update_cost(&self, transaction_id: &str, total_cost: f64) -> bool {
        self.transactions
            .update(&transaction_id.to_string(), |record| {
                record.total_cost = Some(total_cost);
            })
            .is_some()
    }
}
