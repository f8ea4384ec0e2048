use ocpp_core::v21::{
    messages::{
        cost_updated::{CostUpdatedRequest, CostUpdatedResponse},
        request_start_transaction::{
            RequestStartTransactionRequest, RequestStartTransactionResponse,
        },
        request_stop_transaction::{RequestStopTransactionRequest, RequestStopTransactionResponse},
    },
    types::{RequestStartStopStatus, StatusInfo, StopReason, TransactionEventKind, TriggerReason},
};

use crate::v21::{
    interfaces::Transport,
    registry::RequestContext,
    station::ChargingStation,
    store::{StartRejection, TransactionRecord},
};

impl<T: Transport> ChargingStation<T> {
    pub(crate) async fn request_start_transaction_ocpp(
        &self,
        ctx: RequestContext,
        req: RequestStartTransactionRequest,
    ) -> RequestStartTransactionResponse {
        let transaction_id = self.sender.next_request_id();
        self.release_expired_reservations(ctx.received_at);
        let started = self.store.start_transaction(
            req.evse_id,
            &req.id_token,
            Some(req.remote_start_id),
            transaction_id,
            ctx.received_at,
        );
        match started {
            Ok(record) => {
                log::info!(
                    "transaction {} started on evse {}",
                    record.transaction_id,
                    record.evse_id
                );
                let transaction_id = record.transaction_id.clone();
                self.spawn_status_notification(record.evse_id);
                let station = self.clone();
                ctx.tasks.spawn("TransactionEvent(Started)", async move {
                    station
                        .transaction_event(
                            TransactionEventKind::Started,
                            TriggerReason::RemoteStart,
                            &record,
                            None,
                        )
                        .await
                        .map(|_| ())
                });
                RequestStartTransactionResponse {
                    status: RequestStartStopStatus::Accepted,
                    status_info: None,
                    transaction_id: Some(transaction_id),
                }
            }
            Err(rejection) => {
                log::info!("remote start {} rejected: {}", req.remote_start_id, rejection);
                RequestStartTransactionResponse {
                    status: RequestStartStopStatus::Rejected,
                    status_info: Some(StatusInfo::with_info(
                        start_reason_code(&rejection),
                        rejection.to_string(),
                    )),
                    transaction_id: None,
                }
            }
        }
    }

    pub(crate) async fn request_stop_transaction_ocpp(
        &self,
        _ctx: RequestContext,
        req: RequestStopTransactionRequest,
    ) -> RequestStopTransactionResponse {
        let Some(record) = self.store.stop_transaction(&req.transaction_id) else {
            return RequestStopTransactionResponse {
                status: RequestStartStopStatus::Rejected,
                status_info: Some(StatusInfo::new("TxNotFound")),
            };
        };
        log::info!("transaction {} stopped remotely", record.transaction_id);
        self.spawn_status_notification(record.evse_id);
        self.spawn_transaction_ended(record, TriggerReason::RemoteStop, StopReason::Remote);
        self.release_scheduled_reset();
        RequestStopTransactionResponse {
            status: RequestStartStopStatus::Accepted,
            status_info: None,
        }
    }

    pub(crate) async fn cost_updated_ocpp(
        &self,
        _ctx: RequestContext,
        req: CostUpdatedRequest,
    ) -> CostUpdatedResponse {
        if !self.store.update_cost(&req.transaction_id, req.total_cost) {
            log::warn!("cost update for unknown transaction {}", req.transaction_id);
        }
        CostUpdatedResponse {}
    }

    pub(crate) fn spawn_transaction_ended(
        &self,
        record: TransactionRecord,
        trigger_reason: TriggerReason,
        stopped_reason: StopReason,
    ) {
        let station = self.clone();
        self.tasks.spawn("TransactionEvent(Ended)", async move {
            station
                .transaction_event(
                    TransactionEventKind::Ended,
                    trigger_reason,
                    &record,
                    Some(stopped_reason),
                )
                .await
                .map(|_| ())
        });
    }
}

fn start_reason_code(rejection: &StartRejection) -> &'static str {
    match rejection {
        StartRejection::UnknownEvse(_) => "UnknownEvse",
        StartRejection::NoIdleEvse | StartRejection::Occupied(_) => "TxInProgress",
        StartRejection::Faulted(_) | StartRejection::Unavailable(_) => "EvseNotAvailable",
        StartRejection::Reserved(_) => "Reserved",
    }
}
