use std::time::Duration;

use chrono::{DateTime, Utc};
use ocpp_core::{
    format::{frame::Call, message::CallResponse},
    v21::protocol_error::ProtocolError,
};

use crate::v21::{error::OcppError, routing::NodeId};

/// Detached signature over a payload. Produced and checked outside this crate.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub key_id: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_method: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RequestEnvelope<T> {
    pub request_id: String,
    pub action: &'static str,
    pub timestamp: DateTime<Utc>,
    pub timeout: Duration,
    pub event_tracking_id: u64,
    pub destination: NodeId,
    pub network_path: Vec<NodeId>,
    pub payload: T,
    pub signatures: Vec<Signature>,
}

impl<T: serde::Serialize> RequestEnvelope<T> {
    pub(crate) fn to_call(&self) -> Result<Call, OcppError> {
        Call::new(self.request_id.clone(), self.action, &self.payload)
            .map_err(|e| OcppError::Parsing(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResponseEnvelope {
    pub request_id: String,
    pub outcome: Result<serde_json::Value, OcppError>,
}

impl From<CallResponse<ProtocolError>> for ResponseEnvelope {
    fn from(response: CallResponse<ProtocolError>) -> Self {
        match response {
            CallResponse::CallResult(res) => Self {
                request_id: res.unique_id,
                outcome: Ok(res.payload),
            },
            CallResponse::CallError(err) => Self {
                request_id: err.unique_id,
                outcome: Err(OcppError::Protocol {
                    code: err.error_code,
                    description: err.error_description,
                }),
            },
        }
    }
}
