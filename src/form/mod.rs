//! Line-item rows and the store that owns them.

pub mod field;
pub mod row;
pub mod store;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use field::Field;
pub use row::{Derived, Row, RowKey, RowSeed, RowTemplate};
pub use store::RowStore;

use crate::errors::FormError;

/// Business document family; selects how rows and aggregates are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    /// Invoices, receipts and orders: quantity times unit price.
    #[default]
    LineItems,
    /// Bill of materials: component value plus an additional cost percentage.
    BillOfMaterials,
    /// Journal entry: debit and credit lines that must balance.
    JournalEntry,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::LineItems => "line_items",
            FormKind::BillOfMaterials => "bill_of_materials",
            FormKind::JournalEntry => "journal_entry",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "line_items" | "invoice" | "receipt" | "order" => Ok(FormKind::LineItems),
            "bill_of_materials" | "bom" => Ok(FormKind::BillOfMaterials),
            "journal_entry" | "journal" => Ok(FormKind::JournalEntry),
            other => Err(FormError::InvalidInput(format!(
                "unknown form kind `{other}`"
            ))),
        }
    }
}
