use chrono::Utc;
use ocpp_core::v21::{
    messages::{
        cancel_reservation::{CancelReservationRequest, CancelReservationResponse},
        reserve_now::{ReserveNowRequest, ReserveNowResponse},
    },
    types::{CancelReservationStatus, ReserveNowStatus, StatusInfo},
};

use crate::v21::{
    interfaces::Transport, registry::RequestContext, station::ChargingStation,
    store::ReservationRecord,
};

impl<T: Transport> ChargingStation<T> {
    pub(crate) async fn reserve_now_ocpp(
        &self,
        ctx: RequestContext,
        req: ReserveNowRequest,
    ) -> ReserveNowResponse {
        let record = ReservationRecord {
            id: req.id,
            evse_id: req.evse_id,
            id_token: req.id_token,
            group_id_token: req.group_id_token,
            expiry: req.expiry_date_time,
        };
        let now = ctx.received_at.max(Utc::now());
        self.release_expired_reservations(now);
        let status = self.store.reserve(record, now);
        if status == ReserveNowStatus::Accepted {
            if let Some(evse_id) = self.store.reservation(req.id).and_then(|r| r.evse_id) {
                self.spawn_status_notification(evse_id);
            }
        }
        let status_info = match status {
            ReserveNowStatus::Accepted => None,
            ReserveNowStatus::Rejected => Some(StatusInfo::new("InvalidReservation")),
            ReserveNowStatus::Faulted
            | ReserveNowStatus::Occupied
            | ReserveNowStatus::Unavailable => Some(StatusInfo::new("EvseNotAvailable")),
        };
        log::info!("reservation {} -> {:?}", req.id, status);
        ReserveNowResponse {
            status,
            status_info,
        }
    }

    // an id that is not held is still Accepted
    pub(crate) async fn cancel_reservation_ocpp(
        &self,
        _ctx: RequestContext,
        req: CancelReservationRequest,
    ) -> CancelReservationResponse {
        let evse_id = self
            .store
            .reservation(req.reservation_id)
            .and_then(|reservation| reservation.evse_id);
        match evse_id {
            Some(evse_id) if self.store.cancel_reservation(req.reservation_id) => {
                self.spawn_status_notification(evse_id);
            }
            _ => log::debug!("reservation {} was not held", req.reservation_id),
        }
        CancelReservationResponse {
            status: CancelReservationStatus::Accepted,
            status_info: None,
        }
    }
}
