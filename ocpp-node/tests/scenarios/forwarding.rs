use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ocpp_core::{
    format::{frame::Call, message::EncodeDecode},
    v21::{
        messages::{
            data_transfer::{DataTransferRequest, DataTransferResponse},
            reset::{ResetRequest, ResetResponse},
        },
        protocol_error::ProtocolError,
        types::{DataTransferStatus, ResetStatus, ResetType, StatusInfo},
    },
};
use ocpp_node::v21::{
    ConnectionContext, DecisionKind, ForwardingDecision, RequestContext, FILTERED,
};
use serde_json::json;

use crate::harness::TestNode;

const SENTINEL: &str = "DROP-ME";

fn data_transfer(data: &str) -> DataTransferRequest {
    DataTransferRequest {
        vendor_id: "org.openchargealliance".to_string(),
        message_id: None,
        data: Some(json!(data)),
    }
}

pub async fn sentinel_filter_skips_handler() {
    let t = TestNode::with_defaults();
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = invoked.clone();
    t.node
        .registry()
        .register::<DataTransferRequest, _, _>(move |_ctx, req| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                DataTransferResponse {
                    status: DataTransferStatus::Accepted,
                    status_info: None,
                    data: req.data,
                }
            }
        });
    t.node
        .forwarding()
        .add_filter::<DataTransferRequest, _>(|_ctx: &RequestContext, req: &DataTransferRequest| {
            if req.data == Some(json!(SENTINEL)) {
                ForwardingDecision::Reject("sentinel payload".to_string())
            } else {
                ForwardingDecision::Forward
            }
        });

    let res = t.request(data_transfer(SENTINEL)).await;
    assert_eq!(res.status, DataTransferStatus::Rejected);
    assert_eq!(
        res.status_info,
        Some(StatusInfo::with_info(FILTERED, "sentinel payload"))
    );
    assert_eq!(invoked.load(Ordering::SeqCst), 0);

    let res = t.request(data_transfer("hello")).await;
    assert_eq!(res.status, DataTransferStatus::Accepted);
    assert_eq!(res.data, Some(json!("hello")));
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
}

pub async fn replace_substitutes_response() {
    let t = TestNode::with_defaults();
    let station = t.station();
    t.node
        .forwarding()
        .add_filter::<ResetRequest, _>(|_ctx: &RequestContext, req: &ResetRequest| {
            match req.kind {
                ResetType::Immediate => ForwardingDecision::Replace(ResetResponse {
                    status: ResetStatus::Rejected,
                    status_info: Some(StatusInfo::new("MaintenanceWindow")),
                }),
                _ => ForwardingDecision::Forward,
            }
        });

    let res = t
        .request(ResetRequest {
            kind: ResetType::Immediate,
            evse_id: None,
        })
        .await;
    assert_eq!(res.status, ResetStatus::Rejected);
    assert_eq!(res.status_info.unwrap().reason_code, "MaintenanceWindow");
    assert_eq!(station.store().scheduled_reset(), None);

    let res = t
        .request(ResetRequest {
            kind: ResetType::OnIdle,
            evse_id: None,
        })
        .await;
    assert_eq!(res.status, ResetStatus::Accepted);
}

pub async fn first_non_forward_decision_wins() {
    let t = TestNode::with_defaults();
    let engine = t.node.forwarding();
    engine.add_filter::<DataTransferRequest, _>(|_ctx: &RequestContext, _req: &DataTransferRequest| {
        ForwardingDecision::Forward
    });
    engine.add_filter::<DataTransferRequest, _>(|_ctx: &RequestContext, _req: &DataTransferRequest| {
        ForwardingDecision::Reject("second".to_string())
    });
    engine.add_filter::<DataTransferRequest, _>(|_ctx: &RequestContext, _req: &DataTransferRequest| {
        ForwardingDecision::Reject("third".to_string())
    });
    assert_eq!(engine.filter_count("DataTransfer"), 3);

    let res = t.request(data_transfer("anything")).await;
    assert_eq!(res.status, DataTransferStatus::Rejected);
    assert_eq!(
        res.status_info.and_then(|info| info.additional_info),
        Some("second".to_string())
    );
}

pub async fn malformed_payload_passes_filters() {
    let t = TestNode::with_defaults();
    t.station();
    let engine = t.node.forwarding();
    engine.add_filter::<DataTransferRequest, _>(|_ctx: &RequestContext, _req: &DataTransferRequest| {
        ForwardingDecision::Reject("never".to_string())
    });

    let unique_id = t.next_uid();
    let call = Call {
        unique_id: unique_id.clone(),
        action: "DataTransfer".to_string(),
        payload: json!({ "vendorId": 12 }),
    };
    t.inject(call.encode()).await;

    let err = t.wire.error(&unique_id).await;
    assert_eq!(err.error_code, ProtocolError::FormatViolation);
}

pub async fn decision_record_reports_outcome() {
    let t = TestNode::with_defaults();
    t.node
        .forwarding()
        .add_filter::<DataTransferRequest, _>(|_ctx: &RequestContext, _req: &DataTransferRequest| {
            ForwardingDecision::Reject("audit".to_string())
        });
    let ctx = RequestContext {
        request_id: "r-1".to_string(),
        action: "DataTransfer".to_string(),
        received_at: chrono::Utc::now(),
        source: "CSMS".into(),
        connection: ConnectionContext::new("ws-csms"),
        event_tracking_id: 1,
        cancel: Default::default(),
        tasks: t.node.tasks().clone(),
    };

    let record = t
        .node
        .forwarding()
        .decide(&ctx, &serde_json::to_value(data_transfer("x")).unwrap());
    assert_eq!(record.request_id, "r-1");
    assert_eq!(record.decision, DecisionKind::Reject);
    assert_eq!(record.reason.as_deref(), Some("audit"));
    assert!(record.reply.is_some());

    let other = RequestContext {
        action: "Reset".to_string(),
        ..ctx
    };
    let record = t.node.forwarding().decide(&other, &json!({ "type": "OnIdle" }));
    assert_eq!(record.decision, DecisionKind::Forward);
    assert!(record.reply.is_none());
}
