mod certificate;
mod display_message;
mod evse;
mod reservation;
mod table;
mod transaction;
mod variables;

use ocpp_core::v21::types::{CertificateUse, MessageInfo, OperationalStatus, ResetType};
use parking_lot::Mutex;

pub use certificate::{certificate_hash, InstalledCertificate};
pub use display_message::DisplayMessageRecord;
pub use evse::{EvseRecord, EvseState};
pub use reservation::ReservationRecord;
pub use table::Table;
pub use transaction::{StartRejection, TransactionRecord};
pub use variables::{VariableKey, VariableRecord, VariableSeed};

// Composite operations lock tables in this order and release in reverse:
// evses -> reservations -> transactions. Single-table operations take one
// key lock at a time.
pub struct EntityStore {
    pub(crate) evses: Table<i32, EvseRecord>,
    pub(crate) reservations: Table<i32, ReservationRecord>,
    pub(crate) transactions: Table<String, TransactionRecord>,
    pub(crate) display_messages: Table<i32, MessageInfo>,
    pub(crate) certificates: Table<CertificateUse, InstalledCertificate>,
    pub(crate) variables: Table<VariableKey, VariableRecord>,
    pub(crate) scheduled_reset: Mutex<Option<ResetType>>,
}

impl EntityStore {
    /// EVSEs are numbered from 1 and start idle and operative.
    pub fn new(evse_count: usize, variables: Vec<VariableSeed>) -> Self {
        let store = Self {
            evses: Table::default(),
            reservations: Table::default(),
            transactions: Table::default(),
            display_messages: Table::default(),
            certificates: Table::default(),
            variables: Table::default(),
            scheduled_reset: Mutex::new(None),
        };
        for id in 1..=evse_count as i32 {
            store.evses.try_add(
                id,
                EvseRecord {
                    id,
                    state: EvseState::Idle,
                    operational: OperationalStatus::Operative,
                    reservation_id: None,
                },
            );
        }
        for seed in variables {
            store.define_variable(seed);
        }
        store
    }

    pub fn evses(&self) -> &Table<i32, EvseRecord> {
        &self.evses
    }

    pub fn reservations(&self) -> &Table<i32, ReservationRecord> {
        &self.reservations
    }

    pub fn transactions(&self) -> &Table<String, TransactionRecord> {
        &self.transactions
    }

    pub fn display_messages(&self) -> &Table<i32, MessageInfo> {
        &self.display_messages
    }

    pub fn certificates(&self) -> &Table<CertificateUse, InstalledCertificate> {
        &self.certificates
    }

    pub fn variables(&self) -> &Table<VariableKey, VariableRecord> {
        &self.variables
    }

    pub fn schedule_reset(&self, kind: ResetType) {
        *self.scheduled_reset.lock() = Some(kind);
    }

    pub fn scheduled_reset(&self) -> Option<ResetType> {
        *self.scheduled_reset.lock()
    }

    /// Hands out the scheduled reset once the last transaction is gone.
    pub fn take_scheduled_reset_if_idle(&self) -> Option<ResetType> {
        let mut scheduled = self.scheduled_reset.lock();
        if scheduled.is_some() && self.transactions.is_empty() {
            scheduled.take()
        } else {
            None
        }
    }
}
