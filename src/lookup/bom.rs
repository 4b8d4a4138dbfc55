use serde::{Deserialize, Serialize};

use crate::errors::{FormError, FormResult};

use super::text;

/// One component line of a bill of materials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomComponent {
    #[serde(deserialize_with = "text")]
    pub item_code: String,
    #[serde(default, deserialize_with = "text")]
    pub item_name: String,
    #[serde(default, deserialize_with = "text")]
    pub quantity: String,
}

/// Response of the BOM details endpoint for a planned quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomDetails {
    pub success: bool,
    #[serde(default, deserialize_with = "text")]
    pub product_id: String,
    #[serde(default)]
    pub components: Vec<BomComponent>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BomDetails {
    /// Components of a successful response; the server's error otherwise.
    pub fn into_components(self) -> FormResult<Vec<BomComponent>> {
        if self.success {
            Ok(self.components)
        } else {
            Err(FormError::Lookup(
                self.error
                    .unwrap_or_else(|| "BOM details unavailable".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_response_surfaces_server_error() {
        let details: BomDetails =
            serde_json::from_str(r#"{"success":false,"error":"BOM not found"}"#).unwrap();
        match details.into_components() {
            Err(FormError::Lookup(message)) => assert_eq!(message, "BOM not found"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn components_accept_numeric_quantities() {
        let details: BomDetails = serde_json::from_str(
            r#"{"success":true,"product_id":7,"components":[{"item_code":"RM-1","item_name":"Resin","quantity":2.5}]}"#,
        )
        .unwrap();
        assert_eq!(details.product_id, "7");
        let components = details.into_components().unwrap();
        assert_eq!(components[0].quantity, "2.5");
    }
}
