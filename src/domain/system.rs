// System and data input domain models
use crate::domain::token::TokenRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub value: Option<f64>,
    /// Last update, epoch milliseconds.
    #[serde(default)]
    pub date: Option<i64>,
}

impl DataInput {
    pub fn new(id: impl Into<String>, name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            units: units.into(),
            value: None,
            date: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub id: String,
    #[serde(default)]
    pub building_id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub data_inputs: Vec<DataInput>,
}

impl System {
    pub fn new(id: impl Into<String>, name: impl Into<String>, data_inputs: Vec<DataInput>) -> Self {
        Self {
            id: id.into(),
            building_id: String::new(),
            name: name.into(),
            metadata: HashMap::new(),
            data_inputs,
        }
    }

    pub fn data_input(&self, id: &str) -> Option<&DataInput> {
        self.data_inputs.iter().find(|input| input.id == id)
    }
}

/// Look up the data input a token points at.
pub fn find_data_input<'a>(systems: &'a [System], token: &TokenRef) -> Option<&'a DataInput> {
    systems
        .iter()
        .find(|system| system.id == token.system_id)
        .and_then(|system| system.data_input(&token.data_input_id))
}

/// Every `(token, value)` pair that currently has a value.
pub fn current_values(systems: &[System]) -> HashMap<TokenRef, f64> {
    systems
        .iter()
        .flat_map(|system| {
            system.data_inputs.iter().filter_map(move |input| {
                input
                    .value
                    .map(|value| (TokenRef::new(&system.id, &input.id), value))
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedValue {
    pub date: i64,
    pub value: f64,
}

/// Push message carrying fresh values for some inputs of one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataMessage {
    pub building_id: String,
    pub system_id: String,
    pub data_inputs: HashMap<String, TimestampedValue>,
}

/// Merge a push message into a systems snapshot. Returns how many inputs changed.
pub fn apply_new_data(systems: &mut [System], message: &NewDataMessage) -> usize {
    let Some(system) = systems.iter_mut().find(|s| s.id == message.system_id) else {
        return 0;
    };

    let mut updated = 0;
    for input in &mut system.data_inputs {
        if let Some(fresh) = message.data_inputs.get(&input.id) {
            input.value = Some(fresh.value);
            input.date = Some(fresh.date);
            updated += 1;
        }
    }
    updated
}
