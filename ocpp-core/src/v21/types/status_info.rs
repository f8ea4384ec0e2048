#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub reason_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl StatusInfo {
    pub fn new(reason_code: &str) -> Self {
        Self {
            reason_code: reason_code.to_string(),
            additional_info: None,
        }
    }

    pub fn with_info(reason_code: &str, additional_info: impl Into<String>) -> Self {
        Self {
            reason_code: reason_code.to_string(),
            additional_info: Some(additional_info.into()),
        }
    }
}
