use serde::{Deserialize, Serialize};

/// A soil (or other subject) property referenced by evaluations.
///
/// Properties are immutable catalog entries. Input data may key a value by
/// either the property `name` or its `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Value modifier such as `"RV"`, `"low"` or `"high"`.
    #[serde(default)]
    pub modifier: String,
    #[serde(default)]
    pub is_categorical: bool,
}

impl Property {
    /// Whether `key` names this property by id or by name.
    pub fn is_identified_by(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }
}
