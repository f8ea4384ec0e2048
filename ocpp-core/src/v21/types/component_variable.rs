use super::Evse;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse: Option<Evse>,
}

impl Component {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instance: None,
            evse: None,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl Variable {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instance: None,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub enum Attribute {
    #[default]
    Actual,
    Target,
    MinSet,
    MaxSet,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum Mutability {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GetVariableData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<Attribute>,
    pub component: Component,
    pub variable: Variable,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<Attribute>,
    pub attribute_value: String,
    pub component: Component,
    pub variable: Variable,
}
