use std::time::Duration;

use chrono::{DateTime, Utc};
use ocpp_core::v21::types::{ResetType, StopReason, TriggerReason};

use crate::v21::{
    interfaces::Transport,
    store::{EvseRecord, ReservationRecord},
};

use super::ChargingStation;

impl<T: Transport> ChargingStation<T> {
    /// Reports the EVSE's connector status as it is now.
    pub(crate) fn spawn_status_notification(&self, evse_id: i32) {
        let Some(evse) = self.store.evse(evse_id) else {
            return;
        };
        log::debug!("evse {} is {:?}", evse_id, evse.connector_status());
        let station = self.clone();
        self.tasks.spawn("StatusNotification", async move {
            station.status_notification(&evse).await
        });
    }

    /// Reports every EVSE whose connector status differs from `before`.
    pub(crate) fn notify_status_changes(&self, before: &[EvseRecord]) {
        for old in before {
            let changed = self
                .store
                .evse(old.id)
                .map(|evse| evse.connector_status() != old.connector_status())
                .unwrap_or(false);
            if changed {
                self.spawn_status_notification(old.id);
            }
        }
    }

    /// Drops reservations that expired by `now` and reports their EVSEs
    /// available again.
    pub fn release_expired_reservations(&self, now: DateTime<Utc>) -> Vec<ReservationRecord> {
        let purged = self.store.purge_expired_reservations(now);
        for reservation in &purged {
            log::info!("reservation {} expired", reservation.id);
            if let Some(evse_id) = reservation.evse_id {
                self.spawn_status_notification(evse_id);
            }
        }
        purged
    }

    pub(crate) fn spawn_reservation_sweeper(&self) {
        let station = self.clone();
        let period = self.config.sweep_interval().max(Duration::from_millis(1));
        self.tasks.spawn("reservation sweeper", async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        station.release_expired_reservations(Utc::now());
                    }
                    _ = station.shutdown.cancelled() => return Ok(()),
                }
            }
        });
    }

    /// Hands out a scheduled reset once no transaction is left.
    pub(crate) fn release_scheduled_reset(&self) -> Option<ResetType> {
        let kind = self.store.take_scheduled_reset_if_idle()?;
        log::info!("station idle, executing scheduled {:?} reset", kind);
        Some(kind)
    }

    /// Marks the EVSE faulted. A transaction running on it ends with an
    /// AbnormalCondition event. `false` for an unknown EVSE.
    pub fn fault_evse(&self, evse_id: i32) -> bool {
        if self.store.evse(evse_id).is_none() {
            return false;
        }
        if let Some(record) = self.store.fault_evse(evse_id) {
            log::warn!(
                "evse {} faulted during transaction {}",
                evse_id,
                record.transaction_id
            );
            self.spawn_transaction_ended(record, TriggerReason::AbnormalCondition, StopReason::Other);
            self.release_scheduled_reset();
        }
        self.spawn_status_notification(evse_id);
        true
    }

    pub fn clear_fault(&self, evse_id: i32) -> bool {
        if !self.store.clear_fault(evse_id) {
            return false;
        }
        self.spawn_status_notification(evse_id);
        true
    }

    /// Starts sending heartbeats every `interval`, replacing an earlier loop.
    pub(crate) fn spawn_heartbeat(&self, interval: Duration) {
        let stop = self.shutdown.child_token();
        if let Some(previous) = self.heartbeat.lock().replace(stop.clone()) {
            previous.cancel();
        }
        let station = self.clone();
        self.tasks.spawn("heartbeat", async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = station.heartbeat().await {
                            log::warn!("heartbeat failed: {}", e);
                        }
                    }
                    _ = stop.cancelled() => return Ok(()),
                }
            }
        });
    }
}
