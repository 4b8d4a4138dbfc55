//! Item catalog lookups.
//!
//! `client` talks to the catalog HTTP API, `cache` persists the whole
//! catalog between sessions, `service` picks a strategy and degrades to stale
//! data on failure, and `debounce` coalesces keystroke-driven searches.

pub mod bom;
pub mod cache;
pub mod client;
pub mod debounce;
pub mod service;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::currency::is_empty_or_zero;
use crate::form::{Field, Row, RowKey};

pub use bom::{BomComponent, BomDetails};
pub use cache::{CachedCatalog, CatalogCache};
pub use client::{CatalogSource, HttpCatalog};
pub use debounce::SearchDebouncer;
pub use service::{CacheStatus, LookupOutcome, LookupService, LookupStrategy};

/// Shortest trimmed query that reaches the network.
pub const MIN_QUERY_LEN: usize = 2;

/// One entry of the item catalog as served by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(deserialize_with = "text")]
    pub code: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub uom: String,
    #[serde(default, deserialize_with = "text")]
    pub stock: String,
    #[serde(default, deserialize_with = "text")]
    pub unit_price: String,
}

impl CatalogItem {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_uom(mut self, uom: impl Into<String>) -> Self {
        self.uom = uom.into();
        self
    }

    pub fn with_stock(mut self, stock: impl Into<String>) -> Self {
        self.stock = stock.into();
        self
    }

    pub fn with_unit_price(mut self, unit_price: impl Into<String>) -> Self {
        self.unit_price = unit_price.into();
        self
    }

    /// Case-insensitive substring match on code or name.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.code.to_lowercase().contains(&needle) || self.name.to_lowercase().contains(&needle)
    }
}

// The API mixes JSON strings and numbers for the same fields.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Items whose code or name contains `query`; everything for a blank query.
pub fn filter_items(items: &[CatalogItem], query: &str) -> Vec<CatalogItem> {
    let query = query.trim();
    if query.is_empty() {
        return items.to_vec();
    }
    items.iter().filter(|item| item.matches(query)).cloned().collect()
}

/// Copies a chosen catalog item into a row.
///
/// Name, unit and stock always follow the item. A price or quantity the user
/// already typed is kept; empty or zero values are filled (quantity with 1).
pub fn apply_to_row(row: &mut Row, item: &CatalogItem) {
    row.set_field(Field::ItemCode, item.code.clone());
    row.set_field(Field::ItemName, item.name.clone());
    row.set_field(Field::Uom, item.uom.clone());
    row.set_field(Field::Stock, item.stock.clone());
    if is_empty_or_zero(row.field(&Field::UnitPrice)) {
        row.set_field(Field::UnitPrice, item.unit_price.clone());
    }
    if is_empty_or_zero(row.field(&Field::Quantity)) {
        row.set_field(Field::Quantity, "1");
    }
}

/// Clears what a previous lookup wrote, leaving the typed code in place.
pub fn clear_lookup_fields(row: &mut Row) {
    row.set_field(Field::ItemName, "");
    row.set_field(Field::Uom, "");
    row.set_field(Field::Stock, "");
}

/// Identifies one issued lookup for one row. Only the newest ticket per row
/// may write back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupTicket {
    pub row: RowKey,
    pub seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::RowTemplate;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("ITM-001", "Steel Bolt"),
            CatalogItem::new("ITM-002", "Copper Wire"),
            CatalogItem::new("PKG-010", "Bolt Box"),
        ]
    }

    #[test]
    fn filter_matches_code_or_name_ignoring_case() {
        let hits = filter_items(&catalog(), "bolt");
        let codes: Vec<&str> = hits.iter().map(|item| item.code.as_str()).collect();
        assert_eq!(codes, vec!["ITM-001", "PKG-010"]);
        assert_eq!(filter_items(&catalog(), "itm").len(), 2);
        assert_eq!(filter_items(&catalog(), "  ").len(), 3);
    }

    #[test]
    fn numeric_fields_deserialize_from_strings_or_numbers() {
        let item: CatalogItem = serde_json::from_str(
            r#"{"code":"A1","name":"Widget","uom":null,"stock":"40.00","unit_price":12.5}"#,
        )
        .unwrap();
        assert_eq!(item.uom, "");
        assert_eq!(item.stock, "40.00");
        assert_eq!(item.unit_price, "12.5");
    }

    #[test]
    fn apply_keeps_typed_price_and_quantity() {
        let mut row = Row::from_template(&RowTemplate::empty());
        row.set_field(Field::UnitPrice, "9.99");
        row.set_field(Field::Quantity, "4");
        let item = CatalogItem::new("A1", "Widget")
            .with_uom("Pcs")
            .with_stock("40")
            .with_unit_price("12.50");
        apply_to_row(&mut row, &item);
        assert_eq!(row.field(&Field::UnitPrice), "9.99");
        assert_eq!(row.field(&Field::Quantity), "4");
        assert_eq!(row.field(&Field::ItemName), "Widget");
        assert_eq!(row.field(&Field::Stock), "40");
    }

    #[test]
    fn apply_fills_zero_price_and_empty_quantity() {
        let mut row = Row::from_template(&RowTemplate::empty());
        row.set_field(Field::UnitPrice, "0");
        let item = CatalogItem::new("A1", "Widget").with_unit_price("12.50");
        apply_to_row(&mut row, &item);
        assert_eq!(row.field(&Field::UnitPrice), "12.50");
        assert_eq!(row.field(&Field::Quantity), "1");
    }
}
