use crate::domain::model::InputRow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing column '{0}'")]
pub struct MissingColumn(pub String);

/// Which input columns play which role in the one-line address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub street_number_key: Option<String>,
    pub street_key: String,
    pub city_key: String,
    pub state_key: String,
    pub postal_key: Option<String>,
    pub country_key: Option<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            street_number_key: None,
            street_key: "street".to_string(),
            city_key: "city".to_string(),
            state_key: "state".to_string(),
            postal_key: None,
            country_key: None,
        }
    }
}

impl FieldMapping {
    /// Builds `[number ]street, city, state[ postal][, country]`.
    ///
    /// Optional parts are only added when their key is configured and the row has it.
    pub fn extract(&self, row: &InputRow) -> Result<String, MissingColumn> {
        let required = |key: &str| row.get(key).ok_or_else(|| MissingColumn(key.to_string()));
        let optional = |key: &Option<String>| key.as_deref().and_then(|k| row.get(k));

        let street = required(&self.street_key)?;
        let city = required(&self.city_key)?;
        let state = required(&self.state_key)?;

        let mut address = String::new();
        if let Some(number) = optional(&self.street_number_key) {
            address.push_str(number);
            address.push(' ');
        }
        address.push_str(&format!("{}, {}, {}", street, city, state));
        if let Some(postal) = optional(&self.postal_key) {
            address.push(' ');
            address.push_str(postal);
        }
        if let Some(country) = optional(&self.country_key) {
            address.push_str(", ");
            address.push_str(country);
        }

        Ok(address)
    }

    /// Every configured column name.
    pub fn columns(&self) -> Vec<&str> {
        [
            self.street_number_key.as_deref(),
            Some(self.street_key.as_str()),
            Some(self.city_key.as_str()),
            Some(self.state_key.as_str()),
            self.postal_key.as_deref(),
            self.country_key.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
