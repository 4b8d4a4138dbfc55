use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Named input of a line-item row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    ItemCode,
    ItemName,
    Quantity,
    UnitPrice,
    Uom,
    Stock,
    Debit,
    Credit,
    Account,
    CostCenter,
    Description,
    Other(String),
}

impl Field {
    /// Every named field, in desktop column order.
    pub fn known() -> [Field; 11] {
        [
            Field::ItemCode,
            Field::ItemName,
            Field::Uom,
            Field::Stock,
            Field::Quantity,
            Field::UnitPrice,
            Field::Account,
            Field::Description,
            Field::CostCenter,
            Field::Debit,
            Field::Credit,
        ]
    }

    /// Form field name as posted to the backend (`prefix-<index>-<name>`).
    pub fn as_str(&self) -> &str {
        match self {
            Field::ItemCode => "item_code",
            Field::ItemName => "item_name",
            Field::Quantity => "quantity",
            Field::UnitPrice => "unit_price",
            Field::Uom => "uom",
            Field::Stock => "stock",
            Field::Debit => "debit",
            Field::Credit => "credit",
            Field::Account => "account",
            Field::CostCenter => "cost_center",
            Field::Description => "description",
            Field::Other(name) => name,
        }
    }

    /// Accepts snake_case form names as well as camelCase and dashed spellings.
    pub fn from_name(name: &str) -> Field {
        match normalize(name).as_str() {
            "item_code" | "code" => Field::ItemCode,
            "item_name" | "name" => Field::ItemName,
            "quantity" | "qty" => Field::Quantity,
            "unit_price" | "price" => Field::UnitPrice,
            "uom" | "unit" => Field::Uom,
            "stock" => Field::Stock,
            "debit" | "debit_amount" => Field::Debit,
            "credit" | "credit_amount" => Field::Credit,
            "account" => Field::Account,
            "cost_center" => Field::CostCenter,
            "description" => Field::Description,
            _ => Field::Other(name.trim().to_string()),
        }
    }

    /// Names the formset owns itself: the persisted id, the delete flag and
    /// the derived line total. They are never row inputs.
    pub fn is_reserved(&self) -> bool {
        match self {
            Field::Other(name) => {
                let folded: String = name
                    .trim()
                    .chars()
                    .filter(|ch| *ch != '_' && *ch != '-')
                    .map(|ch| ch.to_ascii_lowercase())
                    .collect();
                RESERVED_NAMES.contains(&folded.as_str())
            }
            _ => false,
        }
    }

    /// Inputs the per-row line total depends on.
    pub fn affects_totals(&self) -> bool {
        matches!(
            self,
            Field::Quantity | Field::UnitPrice | Field::Debit | Field::Credit
        )
    }
}

const RESERVED_NAMES: [&str; 3] = ["id", "delete", "linetotal"];

fn normalize(name: &str) -> String {
    let spaced: String = name
        .trim()
        .chars()
        .flat_map(|ch| {
            if ch.is_ascii_uppercase() {
                vec!['_', ch.to_ascii_lowercase()]
            } else if ch == '-' {
                vec!['_']
            } else {
                vec![ch]
            }
        })
        .collect();
    spaced.trim_start_matches('_').to_string()
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Field::from_name(s))
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Err(de::Error::custom("field name cannot be empty"));
        }
        Ok(Field::from_name(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_names_map_to_known_fields() {
        assert_eq!(Field::from_name("itemCode"), Field::ItemCode);
        assert_eq!(Field::from_name("unitPrice"), Field::UnitPrice);
        assert_eq!(Field::from_name("cost-center"), Field::CostCenter);
        assert_eq!(Field::from_name("quantity"), Field::Quantity);
    }

    #[test]
    fn formset_owned_names_are_reserved() {
        for name in ["id", "DELETE", "line_total", "lineTotal", "line-total"] {
            assert!(Field::from_name(name).is_reserved(), "{name} should be reserved");
        }
        assert!(!Field::from_name("warehouse").is_reserved());
        assert!(!Field::Quantity.is_reserved());
    }

    #[test]
    fn unknown_names_are_kept_verbatim() {
        let field = Field::from_name("warehouse");
        assert_eq!(field, Field::Other("warehouse".into()));
        assert_eq!(field.as_str(), "warehouse");
    }

    #[test]
    fn serializes_as_form_name() {
        let json = serde_json::to_string(&Field::UnitPrice).unwrap();
        assert_eq!(json, "\"unit_price\"");
        let parsed: Field = serde_json::from_str("\"itemName\"").unwrap();
        assert_eq!(parsed, Field::ItemName);
    }
}
