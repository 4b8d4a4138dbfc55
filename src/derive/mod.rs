//! Derived-field recalculation: per-row line totals and form aggregates.

pub mod header;
pub mod summary;

use std::sync::Arc;

use tracing::debug;

use crate::currency::{format_amount, parse_amount, round2};
use crate::form::{Field, FormKind, Row, RowStore};
use crate::utils::clock::{Clock, SystemClock};

pub use header::{HeaderField, HeaderFields};
pub use summary::{BomTotals, JournalTotals, LineItemTotals, Summary, BALANCE_TOLERANCE};

/// Recomputes every derived value of a form.
///
/// All passes are idempotent: running them twice without an intervening edit
/// yields identical rows, header and summary.
#[derive(Clone)]
pub struct DerivationEngine {
    kind: FormKind,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for DerivationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationEngine")
            .field("kind", &self.kind)
            .finish()
    }
}

impl DerivationEngine {
    pub fn new(kind: FormKind) -> Self {
        Self::with_clock(kind, Arc::new(SystemClock))
    }

    pub fn with_clock(kind: FormKind, clock: Arc<dyn Clock>) -> Self {
        Self { kind, clock }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    /// Line total of a single row for this form kind.
    pub fn line_total(&self, row: &Row) -> f64 {
        match self.kind {
            FormKind::LineItems | FormKind::BillOfMaterials => {
                round2(row.number(&Field::Quantity) * row.number(&Field::UnitPrice))
            }
            FormKind::JournalEntry => {
                round2(row.number(&Field::Debit) - row.number(&Field::Credit))
            }
        }
    }

    pub fn recompute_row(&self, row: &mut Row) {
        let total = self.line_total(row);
        row.derived_mut().line_total = total;
    }

    pub fn recompute_rows(&self, store: &mut RowStore) {
        for row in store.rows_mut() {
            self.recompute_row(row);
        }
    }

    /// Aggregates over the given rows. Callers pass visible rows only.
    ///
    /// May write derived defaults back into the header: the percentage-based
    /// discount while the override latch is open, and today's payment date the
    /// first time a positive paid amount appears.
    pub fn recompute_aggregates<'a, I>(&self, rows: I, header: &mut HeaderFields) -> Summary
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let summary = match self.kind {
            FormKind::LineItems => {
                let subtotal = round2(rows.into_iter().map(Row::line_total).sum());
                Summary::LineItems(self.line_item_totals(subtotal, header))
            }
            FormKind::BillOfMaterials => {
                let value = round2(rows.into_iter().map(Row::line_total).sum());
                let percentage = parse_amount(&header.other_cost_percentage);
                let additional_cost = round2(value * percentage / 100.0);
                Summary::BillOfMaterials(BomTotals {
                    total_component_value: value,
                    additional_cost,
                    total_after_additional_cost: round2(value + additional_cost),
                })
            }
            FormKind::JournalEntry => {
                let (debit, credit) = rows.into_iter().fold((0.0, 0.0), |(d, c), row| {
                    (d + row.number(&Field::Debit), c + row.number(&Field::Credit))
                });
                let total_debit = round2(debit);
                let total_credit = round2(credit);
                let difference = round2((total_debit - total_credit).abs());
                Summary::JournalEntry(JournalTotals {
                    total_debit,
                    total_credit,
                    difference,
                    balanced: difference <= BALANCE_TOLERANCE,
                })
            }
        };
        debug!(kind = %self.kind, ?summary, "aggregates recomputed");
        summary
    }

    /// Full pass: every row, then aggregates over the visible rows.
    pub fn recompute(&self, store: &mut RowStore, header: &mut HeaderFields) -> Summary {
        self.recompute_rows(store);
        self.recompute_aggregates(store.visible_rows(), header)
    }

    fn line_item_totals(&self, subtotal: f64, header: &mut HeaderFields) -> LineItemTotals {
        let tax_amount = if header.tax_rate.trim().is_empty() {
            0.0
        } else {
            round2(subtotal * parse_amount(&header.tax_rate) / 100.0)
        };

        let derive_discount =
            !header.discount_user_modified() && !header.other_cost_percentage.trim().is_empty();
        let discount_amount = if derive_discount {
            let derived =
                round2(subtotal * parse_amount(&header.other_cost_percentage) / 100.0);
            header.discount_amount = format_amount(derived);
            derived
        } else {
            round2(parse_amount(&header.discount_amount))
        };

        let paid_amount = round2(parse_amount(&header.paid_amount));
        if paid_amount > 0.0 && header.payment_date.is_none() {
            let today = self.clock.today();
            debug!(%today, "defaulting payment date");
            header.payment_date = Some(today);
        }

        let payable_amount = round2(subtotal + tax_amount - discount_amount);
        LineItemTotals {
            subtotal,
            tax_amount,
            discount_amount,
            payable_amount,
            paid_amount,
            due_amount: round2(payable_amount - paid_amount),
        }
    }
}
