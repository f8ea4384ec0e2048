use ocpp_core::v21::types::{ConnectorStatus, OperationalStatus};

use super::{EntityStore, TransactionRecord};

#[derive(Clone, Debug, PartialEq)]
pub enum EvseState {
    Idle,
    Charging { transaction_id: String },
    Faulted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvseRecord {
    pub id: i32,
    pub state: EvseState,
    pub operational: OperationalStatus,
    pub reservation_id: Option<i32>,
}

impl EvseRecord {
    pub fn is_charging(&self) -> bool {
        matches!(self.state, EvseState::Charging { .. })
    }

    pub fn is_startable(&self) -> bool {
        self.state == EvseState::Idle && self.operational == OperationalStatus::Operative
    }

    pub fn connector_status(&self) -> ConnectorStatus {
        match (&self.state, self.operational) {
            (EvseState::Faulted, _) => ConnectorStatus::Faulted,
            (EvseState::Charging { .. }, _) => ConnectorStatus::Occupied,
            (EvseState::Idle, OperationalStatus::Inoperative) => ConnectorStatus::Unavailable,
            (EvseState::Idle, OperationalStatus::Operative) => match self.reservation_id {
                Some(_) => ConnectorStatus::Reserved,
                None => ConnectorStatus::Available,
            },
        }
    }
}

impl EntityStore {
    pub fn evse(&self, evse_id: i32) -> Option<EvseRecord> {
        self.evses.try_get(&evse_id)
    }

    pub fn evse_snapshot(&self) -> Vec<EvseRecord> {
        self.evses.values()
    }

    /// Changes availability of one EVSE or, with `None`, of all of them.
    /// Returns `None` for an unknown EVSE, otherwise whether the change only
    /// takes effect after a running transaction ends.
    pub fn set_operational(&self, evse_id: Option<i32>, status: OperationalStatus) -> Option<bool> {
        let targets = match evse_id {
            Some(id) if self.evses.contains(&id) => vec![id],
            Some(_) => return None,
            None => self.evses.keys_where(|_, _| true),
        };
        let mut scheduled = false;
        for id in targets {
            self.evses.update(&id, |evse| {
                evse.operational = status;
                if status == OperationalStatus::Inoperative && evse.is_charging() {
                    scheduled = true;
                }
            });
        }
        Some(scheduled)
    }

    /// Marks the EVSE faulted, ending whatever transaction ran on it.
    pub fn fault_evse(&self, evse_id: i32) -> Option<TransactionRecord> {
        let mut evse = self.evses.get_mut(&evse_id)?;
        let previous = std::mem::replace(&mut evse.state, EvseState::Faulted);
        match previous {
            EvseState::Charging { transaction_id } => {
                let mut record = self.transactions.try_remove(&transaction_id)?;
                record.seq_no += 1;
                Some(record)
            }
            EvseState::Idle | EvseState::Faulted => None,
        }
    }

    pub fn clear_fault(&self, evse_id: i32) -> bool {
        self.evses
            .update(&evse_id, |evse| {
                if evse.state == EvseState::Faulted {
                    evse.state = EvseState::Idle;
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false)
    }
}
