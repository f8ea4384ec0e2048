use ocpp_core::v21::{
    messages::{
        change_availability::{ChangeAvailabilityRequest, ChangeAvailabilityResponse},
        reset::{ResetRequest, ResetResponse},
        unlock_connector::{UnlockConnectorRequest, UnlockConnectorResponse},
    },
    types::{ChangeAvailabilityStatus, ResetStatus, StatusInfo, UnlockStatus},
};

use crate::v21::{interfaces::Transport, registry::RequestContext, station::ChargingStation};

impl<T: Transport> ChargingStation<T> {
    /// While transactions run the reset is only scheduled; it is released
    /// when the last one stops.
    pub(crate) async fn reset_ocpp(&self, _ctx: RequestContext, req: ResetRequest) -> ResetResponse {
        if let Some(evse_id) = req.evse_id {
            if self.store.evse(evse_id).is_none() {
                return ResetResponse {
                    status: ResetStatus::Rejected,
                    status_info: Some(StatusInfo::new("UnknownEvse")),
                };
            }
        }
        if self.store.has_active_transactions() {
            self.store.schedule_reset(req.kind);
            log::info!("{:?} reset scheduled until transactions end", req.kind);
            return ResetResponse {
                status: ResetStatus::Scheduled,
                status_info: None,
            };
        }
        log::info!("{:?} reset accepted", req.kind);
        ResetResponse {
            status: ResetStatus::Accepted,
            status_info: None,
        }
    }

    pub(crate) async fn unlock_connector_ocpp(
        &self,
        _ctx: RequestContext,
        req: UnlockConnectorRequest,
    ) -> UnlockConnectorResponse {
        let status = match self.store.evse(req.evse_id) {
            Some(_) if req.connector_id != 1 => UnlockStatus::UnknownConnector,
            None => UnlockStatus::UnknownConnector,
            Some(evse) if evse.is_charging() => UnlockStatus::OngoingAuthorizedTransaction,
            Some(_) => UnlockStatus::Unlocked,
        };
        UnlockConnectorResponse {
            status,
            status_info: None,
        }
    }

    pub(crate) async fn change_availability_ocpp(
        &self,
        _ctx: RequestContext,
        req: ChangeAvailabilityRequest,
    ) -> ChangeAvailabilityResponse {
        let evse_id = req.evse.as_ref().map(|evse| evse.id);
        let before = self.store.evse_snapshot();
        let status = match self.store.set_operational(evse_id, req.operational_status) {
            None => ChangeAvailabilityStatus::Rejected,
            Some(true) => ChangeAvailabilityStatus::Scheduled,
            Some(false) => ChangeAvailabilityStatus::Accepted,
        };
        log::info!(
            "availability of {} -> {:?}: {:?}",
            evse_id.map(|id| format!("evse {}", id)).unwrap_or_else(|| "station".into()),
            req.operational_status,
            status
        );
        self.notify_status_changes(&before);
        ChangeAvailabilityResponse {
            status,
            status_info: None,
        }
    }
}
