use super::super::types::{ChangeAvailabilityStatus, Evse, OperationalStatus, StatusInfo};

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityRequest {
    pub operational_status: OperationalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse: Option<Evse>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityResponse {
    pub status: ChangeAvailabilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
}

ocpp_action!(ChangeAvailabilityRequest => ChangeAvailabilityResponse, "ChangeAvailability");
