use std::{sync::Arc, thread};

use chrono::{Duration, Utc};
use ocpp_core::v21::{
    messages::{
        authorize::{AuthorizeRequest, AuthorizeResponse},
        boot_notification::{BootNotificationRequest, BootNotificationResponse},
        cancel_reservation::CancelReservationRequest,
        change_availability::ChangeAvailabilityRequest,
        clear_display_message::ClearDisplayMessageRequest,
        cost_updated::CostUpdatedRequest,
        data_transfer::{DataTransferRequest, DataTransferResponse},
        delete_certificate::DeleteCertificateRequest,
        get_display_messages::GetDisplayMessagesRequest,
        get_installed_certificate_ids::GetInstalledCertificateIdsRequest,
        get_variables::GetVariablesRequest,
        heartbeat::{HeartbeatRequest, HeartbeatResponse},
        install_certificate::InstallCertificateRequest,
        notify_display_messages::{NotifyDisplayMessagesRequest, NotifyDisplayMessagesResponse},
        request_start_transaction::RequestStartTransactionRequest,
        request_stop_transaction::RequestStopTransactionRequest,
        reserve_now::ReserveNowRequest,
        reset::ResetRequest,
        security_event_notification::{
            SecurityEventNotificationRequest, SecurityEventNotificationResponse,
        },
        set_display_message::SetDisplayMessageRequest,
        set_variables::SetVariablesRequest,
        status_notification::{StatusNotificationRequest, StatusNotificationResponse},
        transaction_event::{TransactionEventRequest, TransactionEventResponse},
        unlock_connector::UnlockConnectorRequest,
    },
    types::{
        Attribute, AuthorizationStatus, BootReason, CancelReservationStatus, CertificateUse, ChangeAvailabilityStatus,
        ClearMessageStatus, Component, ConnectorStatus, DataTransferStatus,
        DeleteCertificateStatus, DisplayMessageStatus, Evse, GetDisplayMessagesStatus,
        GetInstalledCertificateStatus, GetVariableData, GetVariableStatus, IdToken, IdTokenInfo,
        InstallCertificateStatus, MessageContent, MessageFormat, MessageInfo, MessagePriority,
        OperationalStatus, RegistrationStatus, RequestStartStopStatus, ReserveNowStatus,
        ResetStatus, ResetType, SetVariableData, SetVariableStatus, StatusInfo, StopReason,
        TransactionEventKind, TriggerReason, UnlockStatus, Variable,
    },
};
use ocpp_node::v21::{
    store::{certificate_hash, EvseState, ReservationRecord, StartRejection},
    EntityStore,
};
use serde_json::json;

use crate::harness::{payload, TestNode};

const PEM_ROOT: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIUQ2hhcmdlUm9vdA\n-----END CERTIFICATE-----";
const PEM_V2G: &str = "-----BEGIN CERTIFICATE-----\nMIIBtDCCAVqgAwIBAgIUVjJHUm9vdENB\n-----END CERTIFICATE-----";

fn reserve(id: i32, evse_id: Option<i32>, token: &str) -> ReserveNowRequest {
    ReserveNowRequest {
        id,
        expiry_date_time: Utc::now() + Duration::minutes(15),
        id_token: IdToken::central(token),
        evse_id,
        group_id_token: None,
    }
}

fn remote_start(evse_id: Option<i32>, token: &str, remote_start_id: i32) -> RequestStartTransactionRequest {
    RequestStartTransactionRequest {
        evse_id,
        remote_start_id,
        id_token: IdToken::central(token),
        group_id_token: None,
    }
}

fn text_message(id: i32, transaction_id: Option<&str>) -> MessageInfo {
    MessageInfo {
        id,
        priority: MessagePriority::NormalCycle,
        state: None,
        start_date_time: None,
        end_date_time: None,
        transaction_id: transaction_id.map(|t| t.to_string()),
        message: MessageContent {
            format: MessageFormat::UTF8,
            language: Some("en".to_string()),
            content: format!("message {}", id),
        },
        display: None,
    }
}

fn get_variable(component: &str, variable: &str) -> GetVariableData {
    GetVariableData {
        attribute_type: None,
        component: Component::named(component),
        variable: Variable::named(variable),
    }
}

fn set_variable(component: &str, variable: &str, value: &str) -> SetVariableData {
    SetVariableData {
        attribute_type: None,
        attribute_value: value.to_string(),
        component: Component::named(component),
        variable: Variable::named(variable),
    }
}

fn ended(total_cost: Option<f64>) -> TransactionEventResponse {
    TransactionEventResponse {
        total_cost,
        id_token_info: None,
        updated_personal_message: None,
    }
}

/// Answers the next StatusNotification, returning the EVSE and the status
/// it reported.
async fn status_update(t: &TestNode) -> (i32, ConnectorStatus) {
    let call = t
        .answer::<StatusNotificationRequest>(StatusNotificationResponse {})
        .await;
    let req: StatusNotificationRequest = payload(&call).unwrap();
    assert_eq!(req.connector_id, 1);
    (req.evse_id, req.connector_status)
}

/// Starts a transaction on `evse_id` through the CSMS and answers the
/// Started event and the status change, returning the transaction id.
async fn start_charging(t: &TestNode, evse_id: i32, token: &str) -> String {
    let res = t.request(remote_start(Some(evse_id), token, 100 + evse_id)).await;
    assert_eq!(res.status, RequestStartStopStatus::Accepted);
    let call = t.answer::<TransactionEventRequest>(ended(None)).await;
    assert_eq!(call.payload["eventType"], "Started");
    assert_eq!(status_update(t).await, (evse_id, ConnectorStatus::Occupied));
    res.transaction_id.unwrap()
}

pub async fn reservation_id_reuse_and_cancel() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t.request(reserve(42, Some(1), "TOKEN-A")).await;
    assert_eq!(res.status, ReserveNowStatus::Accepted);
    assert!(res.status_info.is_none());

    let res = t.request(reserve(42, Some(2), "TOKEN-B")).await;
    assert_eq!(res.status, ReserveNowStatus::Rejected);
    assert_eq!(res.status_info, Some(StatusInfo::new("InvalidReservation")));
    assert_eq!(station.store().evse(2).unwrap().reservation_id, None);

    let res = t.request(reserve(43, Some(1), "TOKEN-B")).await;
    assert_eq!(res.status, ReserveNowStatus::Occupied);
    assert_eq!(
        station.store().evse(1).unwrap().connector_status(),
        ConnectorStatus::Reserved
    );

    for _ in 0..2 {
        let res = t
            .request(CancelReservationRequest { reservation_id: 42 })
            .await;
        assert_eq!(res.status, CancelReservationStatus::Accepted);
    }
    assert!(station.store().reservation(42).is_none());
    assert_eq!(station.store().evse(1).unwrap().reservation_id, None);
}

pub async fn reservation_without_evse_takes_lowest_free() {
    let t = TestNode::with_defaults();
    let station = t.station();

    assert_eq!(t.request(reserve(1, None, "A")).await.status, ReserveNowStatus::Accepted);
    assert_eq!(t.request(reserve(2, None, "B")).await.status, ReserveNowStatus::Accepted);
    assert_eq!(t.request(reserve(3, None, "C")).await.status, ReserveNowStatus::Occupied);

    assert_eq!(station.store().reservation(1).unwrap().evse_id, Some(1));
    assert_eq!(station.store().reservation(2).unwrap().evse_id, Some(2));

    let res = t.request(reserve(4, Some(9), "D")).await;
    assert_eq!(res.status, ReserveNowStatus::Rejected);
}

pub async fn second_start_on_busy_evse_rejected() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let transaction_id = start_charging(&t, 1, "TOKEN-A").await;
    let before = station.store().transaction(&transaction_id).unwrap();
    assert_eq!(
        station.store().evse(1).unwrap().state,
        EvseState::Charging {
            transaction_id: transaction_id.clone()
        }
    );

    let res = t.request(remote_start(Some(1), "TOKEN-B", 7)).await;
    assert_eq!(res.status, RequestStartStopStatus::Rejected);
    assert!(res.transaction_id.is_none());
    assert_eq!(res.status_info.unwrap().reason_code, "TxInProgress");

    assert_eq!(station.store().transactions().len(), 1);
    assert_eq!(station.store().transaction(&transaction_id), Some(before));
    assert!(t.wire.drain().is_empty());
}

pub async fn started_event_carries_transaction() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t.request(remote_start(None, "TOKEN-A", 55)).await;
    assert_eq!(res.status, RequestStartStopStatus::Accepted);
    let transaction_id = res.transaction_id.unwrap();

    let call = t.answer::<TransactionEventRequest>(ended(Some(1.25))).await;
    let event: TransactionEventRequest = payload(&call).unwrap();
    assert_eq!(event.event_type, TransactionEventKind::Started);
    assert_eq!(event.trigger_reason, TriggerReason::RemoteStart);
    assert_eq!(event.seq_no, 0);
    assert_eq!(event.transaction_info.transaction_id, transaction_id);
    assert_eq!(event.transaction_info.remote_start_id, Some(55));
    assert_eq!(event.evse, Some(Evse { id: 1, connector_id: Some(1) }));
    assert_eq!(event.id_token, Some(IdToken::central("TOKEN-A")));

    // the cost lands once the background task sees the response
    let mut total_cost = None;
    for _ in 0..100 {
        total_cost = station.store().transaction(&transaction_id).unwrap().total_cost;
        if total_cost.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(total_cost, Some(1.25));
}

pub async fn concurrent_starts_admit_one() {
    let store = Arc::new(EntityStore::new(1, vec![]));
    let token = IdToken::central("RACE");
    let outcomes: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                let token = token.clone();
                scope.spawn(move || {
                    store.start_transaction(Some(1), &token, None, format!("tx-{}", n), Utc::now())
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .all(|e| *e == StartRejection::Occupied(1)));
    assert_eq!(store.transactions().len(), 1);
}

pub async fn stop_transaction_reports_ended() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t
        .request(RequestStopTransactionRequest {
            transaction_id: "no-such-tx".to_string(),
        })
        .await;
    assert_eq!(res.status, RequestStartStopStatus::Rejected);
    assert_eq!(res.status_info, Some(StatusInfo::new("TxNotFound")));

    let transaction_id = start_charging(&t, 2, "TOKEN-A").await;
    let res = t
        .request(RequestStopTransactionRequest {
            transaction_id: transaction_id.clone(),
        })
        .await;
    assert_eq!(res.status, RequestStartStopStatus::Accepted);

    let call = t.answer::<TransactionEventRequest>(ended(None)).await;
    let event: TransactionEventRequest = payload(&call).unwrap();
    assert_eq!(event.event_type, TransactionEventKind::Ended);
    assert_eq!(event.trigger_reason, TriggerReason::RemoteStop);
    assert_eq!(event.seq_no, 1);
    assert_eq!(event.transaction_info.stopped_reason, Some(StopReason::Remote));
    assert_eq!(status_update(&t).await, (2, ConnectorStatus::Available));

    assert!(!station.store().is_transaction_active(&transaction_id));
    assert_eq!(station.store().evse(2).unwrap().state, EvseState::Idle);
}

pub async fn cost_updates_follow_transaction() {
    let t = TestNode::with_defaults();
    let station = t.station();
    let transaction_id = start_charging(&t, 1, "TOKEN-A").await;

    t.request(CostUpdatedRequest {
        total_cost: 3.5,
        transaction_id: transaction_id.clone(),
    })
    .await;
    assert_eq!(
        station.store().transaction(&transaction_id).unwrap().total_cost,
        Some(3.5)
    );

    t.request(CostUpdatedRequest {
        total_cost: 9.0,
        transaction_id: "gone".to_string(),
    })
    .await;
    assert!(station.store().transaction("gone").is_none());
}

pub async fn reservation_consumed_by_matching_token() {
    let t = TestNode::with_defaults();
    let station = t.station();
    assert_eq!(
        t.request(reserve(8, Some(1), "OWNER")).await.status,
        ReserveNowStatus::Accepted
    );
    assert_eq!(status_update(&t).await, (1, ConnectorStatus::Reserved));

    let res = t.request(remote_start(Some(1), "STRANGER", 1)).await;
    assert_eq!(res.status, RequestStartStopStatus::Rejected);
    assert_eq!(res.status_info.unwrap().reason_code, "Reserved");
    assert!(station.store().reservation(8).is_some());

    let transaction_id = start_charging(&t, 1, "OWNER").await;
    let record = station.store().transaction(&transaction_id).unwrap();
    assert_eq!(record.reservation_id, Some(8));
    assert!(station.store().reservation(8).is_none());
    assert_eq!(station.store().evse(1).unwrap().reservation_id, None);
}

pub async fn expired_reservations_purged() {
    let store = EntityStore::new(2, vec![]);
    let now = Utc::now();
    let record = |id: i32, evse_id: i32, expiry| ReservationRecord {
        id,
        evse_id: Some(evse_id),
        id_token: IdToken::central("T"),
        group_id_token: None,
        expiry,
    };

    assert_eq!(
        store.reserve(record(1, 1, now - Duration::seconds(1)), now),
        ReserveNowStatus::Rejected
    );
    assert_eq!(
        store.reserve(record(2, 1, now + Duration::seconds(30)), now),
        ReserveNowStatus::Accepted
    );
    assert_eq!(
        store.reserve(record(3, 2, now + Duration::minutes(10)), now),
        ReserveNowStatus::Accepted
    );

    let purged = store.purge_expired_reservations(now + Duration::minutes(1));
    assert_eq!(purged.len(), 1);
    assert_eq!(purged[0].id, 2);
    assert_eq!(store.evse(1).unwrap().reservation_id, None);
    assert_eq!(store.evse(2).unwrap().reservation_id, Some(3));
}

pub async fn expired_reservation_frees_evse() {
    let t0 = Utc::now();
    let later = t0 + Duration::minutes(5);
    let held = |id: i32, expiry| ReservationRecord {
        id,
        evse_id: Some(1),
        id_token: IdToken::central("OWNER"),
        group_id_token: None,
        expiry,
    };
    let reserved_store = || {
        let store = EntityStore::new(1, vec![]);
        assert_eq!(
            store.reserve(held(5, t0 + Duration::seconds(30)), t0),
            ReserveNowStatus::Accepted
        );
        store
    };

    let store = reserved_store();
    let started = store.start_transaction(
        Some(1),
        &IdToken::central("OTHER"),
        None,
        "tx-late".to_string(),
        later,
    );
    assert_eq!(started.unwrap().reservation_id, None);
    assert!(store.reservation(5).is_none());

    let store = reserved_store();
    assert_eq!(
        store.reserve(held(7, later + Duration::minutes(10)), later),
        ReserveNowStatus::Accepted
    );
    assert_eq!(store.evse(1).unwrap().reservation_id, Some(7));

    let store = reserved_store();
    assert_eq!(
        store.reserve(held(5, later + Duration::minutes(10)), later),
        ReserveNowStatus::Accepted
    );
    assert_eq!(store.reservation(5).unwrap().expiry, later + Duration::minutes(10));
}

pub async fn expired_reservation_released_to_other_token() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t
        .request(ReserveNowRequest {
            id: 5,
            expiry_date_time: Utc::now() + Duration::milliseconds(150),
            id_token: IdToken::central("OWNER"),
            evse_id: Some(1),
            group_id_token: None,
        })
        .await;
    assert_eq!(res.status, ReserveNowStatus::Accepted);
    assert_eq!(status_update(&t).await, (1, ConnectorStatus::Reserved));

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert_eq!(status_update(&t).await, (1, ConnectorStatus::Available));
    assert!(station.store().reservation(5).is_none());

    start_charging(&t, 1, "STRANGER").await;
}

pub async fn faulted_evse_ends_transaction() {
    let store = EntityStore::new(1, vec![]);
    let token = IdToken::central("T");
    let record = store
        .start_transaction(Some(1), &token, None, "tx-f".to_string(), Utc::now())
        .unwrap();

    let ended = store.fault_evse(1).unwrap();
    assert_eq!(ended.transaction_id, record.transaction_id);
    assert_eq!(ended.seq_no, 1);
    assert!(!store.has_active_transactions());
    assert_eq!(store.evse(1).unwrap().connector_status(), ConnectorStatus::Faulted);

    assert_eq!(
        store.start_transaction(Some(1), &token, None, "tx-g".to_string(), Utc::now()),
        Err(StartRejection::Faulted(1))
    );
    assert!(store.clear_fault(1));
    assert!(!store.clear_fault(1));
    assert!(store
        .start_transaction(Some(1), &token, None, "tx-g".to_string(), Utc::now())
        .is_ok());
}

pub async fn display_message_lifecycle() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t
        .request(SetDisplayMessageRequest {
            message: text_message(5, Some("not-running")),
        })
        .await;
    assert_eq!(res.status, DisplayMessageStatus::UnknownTransaction);
    assert_eq!(res.status_info, Some(StatusInfo::new("TxNotFound")));

    let res = t
        .request(SetDisplayMessageRequest {
            message: text_message(5, None),
        })
        .await;
    assert_eq!(res.status, DisplayMessageStatus::Accepted);

    let res = t
        .request(GetDisplayMessagesRequest {
            id: Some(vec![5]),
            request_id: 77,
            priority: None,
            state: None,
        })
        .await;
    assert_eq!(res.status, GetDisplayMessagesStatus::Accepted);

    let call = t
        .answer::<NotifyDisplayMessagesRequest>(NotifyDisplayMessagesResponse {})
        .await;
    let notify: NotifyDisplayMessagesRequest = payload(&call).unwrap();
    assert_eq!(notify.request_id, 77);
    assert_eq!(notify.message_info, Some(vec![text_message(5, None)]));

    let res = t
        .request(GetDisplayMessagesRequest {
            id: None,
            request_id: 78,
            priority: Some(MessagePriority::AlwaysFront),
            state: None,
        })
        .await;
    assert_eq!(res.status, GetDisplayMessagesStatus::Unknown);

    let res = t.request(ClearDisplayMessageRequest { id: 5 }).await;
    assert_eq!(res.status, ClearMessageStatus::Accepted);
    let res = t.request(ClearDisplayMessageRequest { id: 5 }).await;
    assert_eq!(res.status, ClearMessageStatus::Unknown);
    assert!(station.store().display_messages().is_empty());
}

pub async fn data_transfer_by_vendor() {
    let t = TestNode::with_defaults();
    t.station();

    let res = t
        .request(DataTransferRequest {
            vendor_id: "com.example.unknown".to_string(),
            message_id: None,
            data: Some(json!({ "k": 1 })),
        })
        .await;
    assert_eq!(res.status, DataTransferStatus::UnknownVendorId);
    assert!(res.data.is_none());

    let res = t
        .request(DataTransferRequest {
            vendor_id: "org.openchargealliance".to_string(),
            message_id: Some("echo".to_string()),
            data: Some(json!({ "k": 1 })),
        })
        .await;
    assert_eq!(res.status, DataTransferStatus::Accepted);
    assert_eq!(res.data, Some(json!({ "k": 1 })));
}

pub async fn device_model_variables() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t
        .request(GetVariablesRequest {
            get_variable_data: vec![
                get_variable("OCPPCommCtrlr", "HeartbeatInterval"),
                get_variable("SecurityCtrlr", "BasicAuthPassword"),
                get_variable("OCPPCommCtrlr", "NoSuchVariable"),
                get_variable("NoSuchCtrlr", "Enabled"),
                GetVariableData {
                    attribute_type: Some(Attribute::MaxSet),
                    ..get_variable("OCPPCommCtrlr", "HeartbeatInterval")
                },
            ],
        })
        .await;
    let statuses: Vec<_> = res
        .get_variable_result
        .iter()
        .map(|r| r.attribute_status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            GetVariableStatus::Accepted,
            GetVariableStatus::Rejected,
            GetVariableStatus::UnknownVariable,
            GetVariableStatus::UnknownComponent,
            GetVariableStatus::NotSupportedAttributeType,
        ]
    );
    assert_eq!(res.get_variable_result[0].attribute_value.as_deref(), Some("300"));
    assert!(res.get_variable_result[1].attribute_value.is_none());

    let res = t
        .request(SetVariablesRequest {
            set_variable_data: vec![
                set_variable("OCPPCommCtrlr", "HeartbeatInterval", "60"),
                set_variable("SecurityCtrlr", "Identity", "CS999"),
                set_variable("SecurityCtrlr", "BasicAuthPassword", "hunter2"),
            ],
        })
        .await;
    let statuses: Vec<_> = res
        .set_variable_result
        .iter()
        .map(|r| r.attribute_status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            SetVariableStatus::Accepted,
            SetVariableStatus::Rejected,
            SetVariableStatus::Accepted,
        ]
    );
    let store = station.store();
    assert_eq!(
        store.variable_value("OCPPCommCtrlr", "HeartbeatInterval").as_deref(),
        Some("60")
    );
    assert_eq!(store.variable_value("SecurityCtrlr", "Identity").as_deref(), Some("CS001"));
    assert_eq!(
        store.variable_value("SecurityCtrlr", "BasicAuthPassword").as_deref(),
        Some("hunter2")
    );
}

pub async fn certificate_management() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t.request(GetInstalledCertificateIdsRequest { certificate_type: None }).await;
    assert_eq!(res.status, GetInstalledCertificateStatus::NotFound);

    let res = t
        .request(InstallCertificateRequest {
            certificate_type: CertificateUse::V2GRootCertificate,
            certificate: "not a certificate".to_string(),
        })
        .await;
    assert_eq!(res.status, InstallCertificateStatus::Rejected);
    assert_eq!(res.status_info, Some(StatusInfo::new("InvalidCertificate")));

    for (kind, pem) in [
        (CertificateUse::CSMSRootCertificate, PEM_ROOT),
        (CertificateUse::V2GRootCertificate, PEM_V2G),
    ] {
        let res = t
            .request(InstallCertificateRequest {
                certificate_type: kind,
                certificate: pem.to_string(),
            })
            .await;
        assert_eq!(res.status, InstallCertificateStatus::Accepted);
    }
    assert_eq!(station.store().certificates().len(), 2);

    let res = t
        .request(GetInstalledCertificateIdsRequest {
            certificate_type: Some(vec![CertificateUse::V2GRootCertificate]),
        })
        .await;
    assert_eq!(res.status, GetInstalledCertificateStatus::Accepted);
    let chains = res.certificate_hash_data_chain.unwrap();
    assert_eq!(chains.len(), 1);
    let v2g_hash = chains[0].certificate_hash_data.clone();
    assert_eq!(Some(v2g_hash.clone()), certificate_hash(PEM_V2G));
    assert_eq!(v2g_hash.serial_number.len(), 16);

    let delete = |hash| DeleteCertificateRequest {
        certificate_hash_data: hash,
    };
    assert_eq!(
        t.request(delete(v2g_hash.clone())).await.status,
        DeleteCertificateStatus::Accepted
    );
    assert_eq!(
        t.request(delete(v2g_hash)).await.status,
        DeleteCertificateStatus::NotFound
    );
    assert_eq!(
        t.request(delete(certificate_hash(PEM_ROOT).unwrap())).await.status,
        DeleteCertificateStatus::Failed
    );
    assert_eq!(station.store().certificates().len(), 1);
}

pub async fn reset_waits_for_transactions() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let res = t
        .request(ResetRequest {
            kind: ResetType::Immediate,
            evse_id: Some(9),
        })
        .await;
    assert_eq!(res.status, ResetStatus::Rejected);

    let transaction_id = start_charging(&t, 1, "TOKEN-A").await;
    let res = t
        .request(ResetRequest {
            kind: ResetType::OnIdle,
            evse_id: None,
        })
        .await;
    assert_eq!(res.status, ResetStatus::Scheduled);
    assert_eq!(station.store().scheduled_reset(), Some(ResetType::OnIdle));

    t.request(RequestStopTransactionRequest { transaction_id }).await;
    t.answer::<TransactionEventRequest>(ended(None)).await;
    assert_eq!(station.store().scheduled_reset(), None);
}

pub async fn availability_and_unlock() {
    let t = TestNode::with_defaults();
    let station = t.station();
    start_charging(&t, 1, "TOKEN-A").await;

    let unlock = |evse_id, connector_id| UnlockConnectorRequest {
        evse_id,
        connector_id,
    };
    assert_eq!(
        t.request(unlock(1, 1)).await.status,
        UnlockStatus::OngoingAuthorizedTransaction
    );
    assert_eq!(t.request(unlock(2, 1)).await.status, UnlockStatus::Unlocked);
    assert_eq!(t.request(unlock(2, 3)).await.status, UnlockStatus::UnknownConnector);
    assert_eq!(t.request(unlock(7, 1)).await.status, UnlockStatus::UnknownConnector);

    let change = |evse_id: Option<i32>, status| ChangeAvailabilityRequest {
        operational_status: status,
        evse: evse_id.map(|id| Evse {
            id,
            connector_id: None,
        }),
    };
    assert_eq!(
        t.request(change(Some(1), OperationalStatus::Inoperative)).await.status,
        ChangeAvailabilityStatus::Scheduled
    );
    assert_eq!(
        t.request(change(Some(2), OperationalStatus::Inoperative)).await.status,
        ChangeAvailabilityStatus::Accepted
    );
    assert_eq!(
        t.request(change(Some(5), OperationalStatus::Inoperative)).await.status,
        ChangeAvailabilityStatus::Rejected
    );
    assert_eq!(
        station.store().evse(2).unwrap().connector_status(),
        ConnectorStatus::Unavailable
    );

    let res = t.request(remote_start(Some(2), "TOKEN-B", 9)).await;
    assert_eq!(res.status, RequestStartStopStatus::Rejected);
    assert_eq!(res.status_info.unwrap().reason_code, "EvseNotAvailable");

    assert_eq!(
        t.request(change(None, OperationalStatus::Operative)).await.status,
        ChangeAvailabilityStatus::Accepted
    );
    assert!(station.store().evse(2).unwrap().is_startable());
}

pub async fn boot_notification_to_csms() {
    let t = TestNode::with_defaults();
    let station = t.station();
    let booting = tokio::spawn({
        let station = station.clone();
        async move { station.boot_notification(BootReason::PowerUp).await }
    });

    let call = t
        .answer::<BootNotificationRequest>(BootNotificationResponse {
            current_time: Utc::now(),
            interval: 300,
            status: RegistrationStatus::Accepted,
            status_info: None,
        })
        .await;
    assert_eq!(call.payload["reason"], "PowerUp");
    assert_eq!(call.payload["chargingStation"]["model"], "rocpp-node");

    let res = booting.await.unwrap().unwrap();
    assert_eq!(res.status, RegistrationStatus::Accepted);
    assert_eq!(res.interval, 300);
}

pub async fn status_follows_evse_changes() {
    let t = TestNode::with_defaults();
    let station = t.station();

    t.request(reserve(3, Some(2), "TOKEN-A")).await;
    assert_eq!(status_update(&t).await, (2, ConnectorStatus::Reserved));
    t.request(CancelReservationRequest { reservation_id: 3 }).await;
    assert_eq!(status_update(&t).await, (2, ConnectorStatus::Available));

    t.request(ChangeAvailabilityRequest {
        operational_status: OperationalStatus::Inoperative,
        evse: Some(Evse {
            id: 2,
            connector_id: None,
        }),
    })
    .await;
    assert_eq!(status_update(&t).await, (2, ConnectorStatus::Unavailable));

    assert!(station.fault_evse(1));
    assert_eq!(status_update(&t).await, (1, ConnectorStatus::Faulted));
    assert!(station.clear_fault(1));
    assert_eq!(status_update(&t).await, (1, ConnectorStatus::Available));
    assert!(!station.clear_fault(1));
    assert!(!station.fault_evse(9));
    assert!(t.wire.drain().is_empty());
}

pub async fn fault_ends_transaction_and_runs_reset() {
    let t = TestNode::with_defaults();
    let station = t.station();
    let transaction_id = start_charging(&t, 1, "TOKEN-A").await;

    let res = t
        .request(ResetRequest {
            kind: ResetType::OnIdle,
            evse_id: None,
        })
        .await;
    assert_eq!(res.status, ResetStatus::Scheduled);

    assert!(station.fault_evse(1));
    assert_eq!(station.store().scheduled_reset(), None);
    assert!(!station.store().is_transaction_active(&transaction_id));

    let call = t.answer::<TransactionEventRequest>(ended(None)).await;
    let event: TransactionEventRequest = payload(&call).unwrap();
    assert_eq!(event.event_type, TransactionEventKind::Ended);
    assert_eq!(event.trigger_reason, TriggerReason::AbnormalCondition);
    assert_eq!(event.transaction_info.transaction_id, transaction_id);
    assert_eq!(event.transaction_info.stopped_reason, Some(StopReason::Other));
    assert_eq!(status_update(&t).await, (1, ConnectorStatus::Faulted));
}

pub async fn outbound_requests_to_csms() {
    let t = TestNode::with_defaults();
    let station = t.station();
    let csms_time = Utc::now() - Duration::seconds(3);

    let (now, call) = tokio::join!(
        station.heartbeat(),
        t.answer::<HeartbeatRequest>(HeartbeatResponse {
            current_time: csms_time
        })
    );
    assert_eq!(now.unwrap(), csms_time);
    assert_eq!(call.payload, json!({}));

    let (info, call) = tokio::join!(
        station.authorize(IdToken::central("TOKEN-A")),
        t.answer::<AuthorizeRequest>(AuthorizeResponse {
            id_token_info: IdTokenInfo {
                status: AuthorizationStatus::Blocked,
                cache_expiry_date_time: None,
            },
        })
    );
    assert_eq!(info.unwrap().status, AuthorizationStatus::Blocked);
    let req: AuthorizeRequest = payload(&call).unwrap();
    assert_eq!(req.id_token, IdToken::central("TOKEN-A"));

    let (res, call) = tokio::join!(
        station.data_transfer("com.example", Some("meter"), Some(json!({ "kWh": 3 }))),
        t.answer::<DataTransferRequest>(DataTransferResponse {
            status: DataTransferStatus::UnknownMessageId,
            status_info: None,
            data: None,
        })
    );
    assert_eq!(res.unwrap().status, DataTransferStatus::UnknownMessageId);
    assert_eq!(call.payload["vendorId"], "com.example");
    assert_eq!(call.payload["messageId"], "meter");
    assert_eq!(call.payload["data"]["kWh"], 3);

    let (res, call) = tokio::join!(
        station.security_event_notification("FirmwareUpdated", Some("v2".to_string())),
        t.answer::<SecurityEventNotificationRequest>(SecurityEventNotificationResponse {})
    );
    res.unwrap();
    assert_eq!(call.payload["type"], "FirmwareUpdated");
    assert_eq!(call.payload["techInfo"], "v2");
}

pub async fn accepted_boot_starts_heartbeat() {
    let t = TestNode::with_defaults();
    let station = t.station();

    let (res, _) = tokio::join!(
        station.boot_notification(BootReason::PowerUp),
        t.answer::<BootNotificationRequest>(BootNotificationResponse {
            current_time: Utc::now(),
            interval: 1,
            status: RegistrationStatus::Accepted,
            status_info: None,
        })
    );
    assert_eq!(res.unwrap().status, RegistrationStatus::Accepted);

    let call = t
        .answer::<HeartbeatRequest>(HeartbeatResponse {
            current_time: Utc::now(),
        })
        .await;
    assert_eq!(call.action, "Heartbeat");
    t.shutdown().await;
    assert_eq!(t.node.tasks().running(), 0);
}
