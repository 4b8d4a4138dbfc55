use tracing::debug;

use crate::currency::format_amount;
use crate::derive::Summary;
use crate::form::{Field, FormKind, Row};

use super::{summary_label, ElementCache, RenderStats, RenderedElement, ViewBinding, ViewKind};

const PLACEHOLDER: &str = "-";

/// Card layout: a short stack of lines per visible row.
#[derive(Debug, Clone)]
pub struct MobileView {
    kind: FormKind,
    cache: ElementCache,
}

impl MobileView {
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            cache: ElementCache::default(),
        }
    }

    fn card(&self, row: &Row) -> Vec<String> {
        let value = |field: Field| {
            let text = row.field(&field).trim();
            if text.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                text.to_string()
            }
        };
        match self.kind {
            FormKind::LineItems | FormKind::BillOfMaterials => {
                let mut lines = vec![
                    format!(
                        "[{}] {} · {}",
                        row.index(),
                        value(Field::ItemCode),
                        value(Field::ItemName)
                    ),
                    format!(
                        "Qty {} {} @ {}",
                        value(Field::Quantity),
                        value(Field::Uom),
                        value(Field::UnitPrice)
                    ),
                ];
                if self.kind == FormKind::LineItems {
                    lines.push(format!("Stock {}", value(Field::Stock)));
                }
                lines.push(format!("Total {}", format_amount(row.line_total())));
                lines
            }
            FormKind::JournalEntry => vec![
                format!("[{}] {}", row.index(), value(Field::Account)),
                format!(
                    "Debit {}  Credit {}",
                    value(Field::Debit),
                    value(Field::Credit)
                ),
                format!("Cost center {}", value(Field::CostCenter)),
                format!("Note {}", value(Field::Description)),
            ],
        }
    }
}

impl ViewBinding for MobileView {
    fn kind(&self) -> ViewKind {
        ViewKind::Mobile
    }

    fn render(&mut self, rows: &[&Row], summary: &Summary) -> RenderStats {
        let cards = rows.iter().map(|row| self.card(row)).collect();
        let stats = self.cache.reconcile(rows, cards, summary);
        debug!(view = "mobile", ?stats, "rendered");
        stats
    }

    fn elements(&self) -> &[RenderedElement] {
        self.cache.elements()
    }

    fn wirings(&self) -> usize {
        self.cache.wirings()
    }

    fn output(&self) -> String {
        let mut blocks: Vec<String> = self
            .cache
            .elements()
            .iter()
            .map(|element| {
                let mut lines = element.values.iter();
                let mut card = lines.next().cloned().unwrap_or_default();
                for line in lines {
                    card.push_str("\n    ");
                    card.push_str(line);
                }
                card
            })
            .collect();
        let summary: Vec<String> = self
            .cache
            .summary()
            .iter()
            .map(|(name, value)| format!("{}: {}", summary_label(name), value))
            .collect();
        if !summary.is_empty() {
            blocks.push(summary.join("\n"));
        }
        blocks.join("\n\n")
    }
}
