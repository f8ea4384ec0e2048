use ocpp_core::v21::types::{
    Attribute, Component, GetVariableData, GetVariableResult, GetVariableStatus, Mutability,
    SetVariableData, SetVariableResult, SetVariableStatus, Variable,
};

use super::EntityStore;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableKey {
    pub component: String,
    pub component_instance: Option<String>,
    pub evse_id: Option<i32>,
    pub variable: String,
    pub variable_instance: Option<String>,
}

impl VariableKey {
    pub fn new(component: &Component, variable: &Variable) -> Self {
        Self {
            component: component.name.clone(),
            component_instance: component.instance.clone(),
            evse_id: component.evse.as_ref().map(|evse| evse.id),
            variable: variable.name.clone(),
            variable_instance: variable.instance.clone(),
        }
    }

    fn same_component(&self, other: &VariableKey) -> bool {
        self.component == other.component
            && self.component_instance == other.component_instance
            && self.evse_id == other.evse_id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableRecord {
    pub value: String,
    pub mutability: Mutability,
}

/// Initial device-model entry, as found in the node configuration.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VariableSeed {
    pub component: Component,
    pub variable: Variable,
    pub value: String,
    pub mutability: Mutability,
}

impl VariableSeed {
    pub fn new(component: &str, variable: &str, value: &str, mutability: Mutability) -> Self {
        Self {
            component: Component::named(component),
            variable: Variable::named(variable),
            value: value.to_string(),
            mutability,
        }
    }
}

enum Lookup {
    Found(VariableRecord),
    UnknownComponent,
    UnknownVariable,
}

impl EntityStore {
    pub fn define_variable(&self, seed: VariableSeed) {
        let key = VariableKey::new(&seed.component, &seed.variable);
        self.variables.upsert(
            key,
            VariableRecord {
                value: seed.value,
                mutability: seed.mutability,
            },
        );
    }

    fn lookup_variable(&self, key: &VariableKey) -> Lookup {
        if let Some(record) = self.variables.try_get(key) {
            return Lookup::Found(record);
        }
        match self.variables.find_key(|k, _| k.same_component(key)) {
            Some(_) => Lookup::UnknownVariable,
            None => Lookup::UnknownComponent,
        }
    }

    pub fn get_variable(&self, data: &GetVariableData) -> GetVariableResult {
        let attribute = data.attribute_type.unwrap_or_default();
        let key = VariableKey::new(&data.component, &data.variable);
        let (status, value) = match self.lookup_variable(&key) {
            Lookup::UnknownComponent => (GetVariableStatus::UnknownComponent, None),
            Lookup::UnknownVariable => (GetVariableStatus::UnknownVariable, None),
            Lookup::Found(_) if attribute != Attribute::Actual => {
                (GetVariableStatus::NotSupportedAttributeType, None)
            }
            Lookup::Found(record) => match record.mutability {
                Mutability::WriteOnly => (GetVariableStatus::Rejected, None),
                Mutability::ReadOnly | Mutability::ReadWrite => {
                    (GetVariableStatus::Accepted, Some(record.value))
                }
            },
        };
        GetVariableResult {
            attribute_status: status,
            attribute_status_info: None,
            attribute_type: data.attribute_type,
            attribute_value: value,
            component: data.component.clone(),
            variable: data.variable.clone(),
        }
    }

    pub fn set_variable(&self, data: &SetVariableData) -> SetVariableResult {
        let attribute = data.attribute_type.unwrap_or_default();
        let key = VariableKey::new(&data.component, &data.variable);
        let status = match self.lookup_variable(&key) {
            Lookup::UnknownComponent => SetVariableStatus::UnknownComponent,
            Lookup::UnknownVariable => SetVariableStatus::UnknownVariable,
            Lookup::Found(_) if attribute != Attribute::Actual => {
                SetVariableStatus::NotSupportedAttributeType
            }
            Lookup::Found(record) if record.mutability == Mutability::ReadOnly => {
                SetVariableStatus::Rejected
            }
            Lookup::Found(_) => {
                let value = data.attribute_value.clone();
                match self.variables.update(&key, |record| record.value = value) {
                    Some(()) => SetVariableStatus::Accepted,
                    None => SetVariableStatus::UnknownVariable,
                }
            }
        };
        SetVariableResult {
            attribute_type: data.attribute_type,
            attribute_status: status,
            attribute_status_info: None,
            component: data.component.clone(),
            variable: data.variable.clone(),
        }
    }

    pub fn variable_value(&self, component: &str, variable: &str) -> Option<String> {
        let key = VariableKey::new(&Component::named(component), &Variable::named(variable));
        self.variables.try_get(&key).map(|record| record.value)
    }
}
