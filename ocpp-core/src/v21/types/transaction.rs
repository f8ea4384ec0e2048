#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum TransactionEventKind {
    Ended,
    Started,
    Updated,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum TriggerReason {
    AbnormalCondition,
    Authorized,
    CablePluggedIn,
    ChargingStateChanged,
    Deauthorized,
    EVDeparted,
    RemoteStart,
    RemoteStop,
    ResetCommand,
    StopAuthorized,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum ChargingState {
    Charging,
    EVConnected,
    SuspendedEV,
    SuspendedEVSE,
    Idle,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum StopReason {
    DeAuthorized,
    EmergencyStop,
    EVDisconnected,
    ImmediateReset,
    Local,
    Other,
    PowerLoss,
    Reboot,
    Remote,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_state: Option<ChargingState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_reason: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_start_id: Option<i32>,
}
