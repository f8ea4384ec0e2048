use std::time::Duration;

use ocpp_core::v21::types::{ChargingStation, Mutability};

use crate::v21::store::VariableSeed;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub node_id: String,
    pub csms_id: String,
    pub seed: u64,
    /// Seconds.
    pub call_timeout: u64,
    /// Milliseconds.
    pub handler_timeout: u64,
    /// Milliseconds.
    pub sweep_interval: u64,
    pub number_of_evses: usize,
    pub data_transfer_vendors: Vec<String>,
    pub station_info: ChargingStation,
    pub variables: Vec<VariableSeed>,
}

impl NodeConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout)
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval)
    }

    pub fn accepts_vendor(&self, vendor_id: &str) -> bool {
        self.data_transfer_vendors.iter().any(|v| v == vendor_id)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "CS001".to_string(),
            csms_id: "CSMS".to_string(),
            seed: 0,
            call_timeout: 30,
            handler_timeout: 5_000,
            sweep_interval: 1_000,
            number_of_evses: 2,
            data_transfer_vendors: vec!["org.openchargealliance".to_string()],
            station_info: ChargingStation {
                model: "rocpp-node".to_string(),
                vendor_name: "rocpp".to_string(),
                serial_number: None,
                firmware_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            variables: vec![
                VariableSeed::new("OCPPCommCtrlr", "HeartbeatInterval", "300", Mutability::ReadWrite),
                VariableSeed::new("OCPPCommCtrlr", "MessageTimeout", "30", Mutability::ReadWrite),
                VariableSeed::new("SecurityCtrlr", "Identity", "CS001", Mutability::ReadOnly),
                VariableSeed::new("SecurityCtrlr", "BasicAuthPassword", "", Mutability::WriteOnly),
                VariableSeed::new("AuthCtrlr", "AuthorizeRemoteStart", "false", Mutability::ReadWrite),
                VariableSeed::new("DisplayMessageCtrlr", "Enabled", "true", Mutability::ReadOnly),
            ],
        }
    }
}
