use std::time::Duration;

use chrono::{DateTime, Utc};
use ocpp_core::v21::{
    messages::{
        authorize::AuthorizeRequest,
        boot_notification::{BootNotificationRequest, BootNotificationResponse},
        data_transfer::{DataTransferRequest, DataTransferResponse},
        heartbeat::HeartbeatRequest,
        notify_display_messages::NotifyDisplayMessagesRequest,
        security_event_notification::SecurityEventNotificationRequest,
        status_notification::StatusNotificationRequest,
        transaction_event::{TransactionEventRequest, TransactionEventResponse},
    },
    types::{
        BootReason, ChargingState, Evse, IdToken, IdTokenInfo, MessageInfo, RegistrationStatus,
        StopReason, Transaction, TransactionEventKind, TriggerReason,
    },
};

use crate::v21::{
    error::OcppError,
    interfaces::Transport,
    store::{EvseRecord, TransactionRecord},
};

use super::ChargingStation;

impl<T: Transport> ChargingStation<T> {
    pub async fn boot_notification(
        &self,
        reason: BootReason,
    ) -> Result<BootNotificationResponse, OcppError> {
        let req = BootNotificationRequest {
            charging_station: self.config.station_info.clone(),
            reason,
        };
        let res = self.sender.send_to_csms(req).await?;
        log::info!("boot notification answered with {:?}", res.status);
        if res.status == RegistrationStatus::Accepted && res.interval > 0 {
            self.spawn_heartbeat(Duration::from_secs(res.interval));
        }
        Ok(res)
    }

    /// Returns the CSMS clock.
    pub async fn heartbeat(&self) -> Result<DateTime<Utc>, OcppError> {
        let res = self
            .sender
            .send(self.sender.csms_id(), HeartbeatRequest {}, self.background_options())
            .await?;
        Ok(res.current_time)
    }

    /// Reports the current status of the EVSE's single connector.
    pub async fn status_notification(&self, evse: &EvseRecord) -> Result<(), OcppError> {
        let req = StatusNotificationRequest {
            timestamp: Utc::now(),
            connector_status: evse.connector_status(),
            evse_id: evse.id,
            connector_id: 1,
        };
        self.sender
            .send(self.sender.csms_id(), req, self.background_options())
            .await
            .map(|_| ())
    }

    pub async fn authorize(&self, id_token: IdToken) -> Result<IdTokenInfo, OcppError> {
        let res = self.sender.send_to_csms(AuthorizeRequest { id_token }).await?;
        Ok(res.id_token_info)
    }

    pub async fn data_transfer(
        &self,
        vendor_id: &str,
        message_id: Option<&str>,
        data: Option<serde_json::Value>,
    ) -> Result<DataTransferResponse, OcppError> {
        let req = DataTransferRequest {
            vendor_id: vendor_id.to_string(),
            message_id: message_id.map(|m| m.to_string()),
            data,
        };
        self.sender.send_to_csms(req).await
    }

    pub async fn security_event_notification(
        &self,
        kind: &str,
        tech_info: Option<String>,
    ) -> Result<(), OcppError> {
        let req = SecurityEventNotificationRequest {
            kind: kind.to_string(),
            timestamp: Utc::now(),
            tech_info,
        };
        self.sender.send_to_csms(req).await.map(|_| ())
    }

    /// An empty `messages` still sends one request so the CSMS learns the
    /// query is complete.
    pub async fn notify_display_messages(
        &self,
        request_id: i32,
        messages: Vec<MessageInfo>,
    ) -> Result<(), OcppError> {
        let req = NotifyDisplayMessagesRequest {
            request_id,
            tbc: None,
            message_info: if messages.is_empty() {
                None
            } else {
                Some(messages)
            },
        };
        self.sender
            .send(self.sender.csms_id(), req, self.background_options())
            .await
            .map(|_| ())
    }

    /// Reports a transaction event. A cost in the response is kept on the
    /// transaction record.
    pub async fn transaction_event(
        &self,
        kind: TransactionEventKind,
        trigger_reason: TriggerReason,
        record: &TransactionRecord,
        stopped_reason: Option<StopReason>,
    ) -> Result<TransactionEventResponse, OcppError> {
        let seq_no = match kind {
            TransactionEventKind::Updated => self
                .store
                .next_seq_no(&record.transaction_id)
                .unwrap_or(record.seq_no),
            TransactionEventKind::Started | TransactionEventKind::Ended => record.seq_no,
        };
        let charging_state = match kind {
            TransactionEventKind::Ended => ChargingState::Idle,
            TransactionEventKind::Started | TransactionEventKind::Updated => {
                ChargingState::Charging
            }
        };
        let req = TransactionEventRequest {
            event_type: kind,
            timestamp: Utc::now(),
            trigger_reason,
            seq_no,
            offline: None,
            transaction_info: Transaction {
                transaction_id: record.transaction_id.clone(),
                charging_state: Some(charging_state),
                stopped_reason,
                remote_start_id: record.remote_start_id,
            },
            id_token: Some(record.id_token.clone()),
            evse: Some(Evse {
                id: record.evse_id,
                connector_id: Some(1),
            }),
        };
        let res = self
            .sender
            .send(self.sender.csms_id(), req, self.background_options())
            .await?;
        if let Some(total_cost) = res.total_cost {
            self.store.update_cost(&record.transaction_id, total_cost);
        }
        Ok(res)
    }
}
