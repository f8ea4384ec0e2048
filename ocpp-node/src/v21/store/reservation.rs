use chrono::{DateTime, Utc};
use ocpp_core::v21::types::{IdToken, OperationalStatus, ReserveNowStatus};

use super::{EntityStore, EvseState};

#[derive(Clone, Debug, PartialEq)]
pub struct ReservationRecord {
    pub id: i32,
    pub evse_id: Option<i32>,
    pub id_token: IdToken,
    pub group_id_token: Option<IdToken>,
    pub expiry: DateTime<Utc>,
}

impl ReservationRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }

    pub(crate) fn accepts(&self, id_token: &IdToken, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            return false;
        }
        self.id_token.matches(id_token)
            || self
                .group_id_token
                .as_ref()
                .map(|group| group.matches(id_token))
                .unwrap_or(false)
    }
}

impl EntityStore {
    /// A reservation without an EVSE is held against the lowest available one.
    /// Reusing an id that is still held is rejected. Reservations that expired
    /// by `now` no longer hold anything.
    pub fn reserve(&self, reservation: ReservationRecord, now: DateTime<Utc>) -> ReserveNowStatus {
        self.purge_expired_reservations(now);
        if reservation.is_expired(now) || self.reservations.contains(&reservation.id) {
            return ReserveNowStatus::Rejected;
        }
        let evse_id = match reservation.evse_id {
            Some(id) => id,
            None => match self.evses.find_key(|_, evse| {
                evse.is_startable() && evse.reservation_id.is_none()
            }) {
                Some(id) => id,
                None => return ReserveNowStatus::Occupied,
            },
        };
        let Some(mut evse) = self.evses.get_mut(&evse_id) else {
            return ReserveNowStatus::Rejected;
        };
        match evse.state {
            EvseState::Faulted => return ReserveNowStatus::Faulted,
            EvseState::Charging { .. } => return ReserveNowStatus::Occupied,
            EvseState::Idle => {}
        }
        if evse.operational == OperationalStatus::Inoperative {
            return ReserveNowStatus::Unavailable;
        }
        if evse.reservation_id.is_some() {
            return ReserveNowStatus::Occupied;
        }
        let id = reservation.id;
        let record = ReservationRecord {
            evse_id: Some(evse_id),
            ..reservation
        };
        if !self.reservations.try_add(id, record) {
            log::debug!("reservation {} already held", id);
            return ReserveNowStatus::Rejected;
        }
        evse.reservation_id = Some(id);
        ReserveNowStatus::Accepted
    }

    /// Returns whether a reservation with this id was held.
    pub fn cancel_reservation(&self, reservation_id: i32) -> bool {
        let Some(evse_id) = self
            .reservations
            .try_get(&reservation_id)
            .and_then(|reservation| reservation.evse_id)
        else {
            return false;
        };
        match self.evses.get_mut(&evse_id) {
            Some(mut evse) => {
                let removed = self.reservations.try_remove(&reservation_id).is_some();
                if evse.reservation_id == Some(reservation_id) {
                    evse.reservation_id = None;
                }
                removed
            }
            None => self.reservations.try_remove(&reservation_id).is_some(),
        }
    }

    pub fn reservation(&self, reservation_id: i32) -> Option<ReservationRecord> {
        self.reservations.try_get(&reservation_id)
    }

    /// Drops reservations whose expiry has passed and frees their EVSEs.
    pub fn purge_expired_reservations(&self, now: DateTime<Utc>) -> Vec<ReservationRecord> {
        let expired = self
            .reservations
            .keys_where(|_, reservation| reservation.is_expired(now));
        let mut purged = Vec::new();
        for id in expired {
            let Some(evse_id) = self.reservations.try_get(&id).and_then(|r| r.evse_id) else {
                continue;
            };
            let mut evse = self.evses.get_mut(&evse_id);
            if let Some(record) = self.reservations.try_remove(&id) {
                if let Some(evse) = evse.as_mut() {
                    if evse.reservation_id == Some(id) {
                        evse.reservation_id = None;
                    }
                }
                purged.push(record);
            }
        }
        if !purged.is_empty() {
            log::info!("purged {} expired reservation(s)", purged.len());
        }
        purged
    }
}
