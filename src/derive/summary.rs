use serde::Serialize;

use crate::currency::format_amount;

/// Difference below which a journal entry counts as balanced.
pub const BALANCE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LineItemTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub payable_amount: f64,
    pub paid_amount: f64,
    pub due_amount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BomTotals {
    pub total_component_value: f64,
    pub additional_cost: f64,
    pub total_after_additional_cost: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct JournalTotals {
    pub total_debit: f64,
    pub total_credit: f64,
    pub difference: f64,
    pub balanced: bool,
}

/// Aggregate values for the whole form, shaped by the form kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    LineItems(LineItemTotals),
    BillOfMaterials(BomTotals),
    JournalEntry(JournalTotals),
}

impl Summary {
    /// Named two-decimal values, as the host form's summary inputs hold them.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        match self {
            Summary::LineItems(totals) => vec![
                ("total_amount", format_amount(totals.subtotal)),
                ("tax_amount", format_amount(totals.tax_amount)),
                ("discount_amount", format_amount(totals.discount_amount)),
                ("payable_amount", format_amount(totals.payable_amount)),
                ("paid_amount", format_amount(totals.paid_amount)),
                ("due_amount", format_amount(totals.due_amount)),
            ],
            Summary::BillOfMaterials(totals) => vec![
                (
                    "total_component_value",
                    format_amount(totals.total_component_value),
                ),
                ("additional_cost", format_amount(totals.additional_cost)),
                (
                    "total_after_discount",
                    format_amount(totals.total_after_additional_cost),
                ),
            ],
            Summary::JournalEntry(totals) => vec![
                ("total_debit", format_amount(totals.total_debit)),
                ("total_credit", format_amount(totals.total_credit)),
                ("difference", format_amount(totals.difference)),
            ],
        }
    }

    /// Sum of the visible line totals (debits for journal entries).
    pub fn subtotal(&self) -> f64 {
        match self {
            Summary::LineItems(totals) => totals.subtotal,
            Summary::BillOfMaterials(totals) => totals.total_component_value,
            Summary::JournalEntry(totals) => totals.total_debit,
        }
    }
}
