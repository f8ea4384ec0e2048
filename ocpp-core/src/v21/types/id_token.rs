#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdToken {
    pub id_token: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl IdToken {
    pub fn central(id_token: &str) -> Self {
        Self {
            id_token: id_token.to_string(),
            kind: "Central".to_string(),
        }
    }

    pub fn matches(&self, other: &IdToken) -> bool {
        self.id_token == other.id_token && self.kind == other.kind
    }
}
