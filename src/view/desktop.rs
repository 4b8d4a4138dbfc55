use tracing::debug;

use crate::currency::{format_amount, format_grouped, parse_amount, LocaleConfig};
use crate::derive::Summary;
use crate::form::{Field, FormKind, Row};

use super::table::{Table, TableColumn};
use super::{summary_label, ElementCache, RenderStats, RenderedElement, ViewBinding, ViewKind};

/// Table layout: one grid line per visible row.
#[derive(Debug, Clone)]
pub struct DesktopView {
    kind: FormKind,
    columns: Vec<TableColumn>,
    fields: Vec<Field>,
    locale: LocaleConfig,
    cache: ElementCache,
}

impl DesktopView {
    pub fn new(kind: FormKind) -> Self {
        let (columns, fields) = layout(kind);
        Self {
            kind,
            columns,
            fields,
            locale: LocaleConfig::default(),
            cache: ElementCache::default(),
        }
    }

    pub fn with_locale(mut self, locale: LocaleConfig) -> Self {
        self.locale = locale;
        self
    }

    pub fn form_kind(&self) -> FormKind {
        self.kind
    }

    fn cells(&self, row: &Row) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.fields.len() + 2);
        cells.push(row.index().to_string());
        cells.extend(self.fields.iter().map(|field| row.field(field).to_string()));
        if self.kind != FormKind::JournalEntry {
            cells.push(format_amount(row.line_total()));
        }
        cells
    }
}

fn layout(kind: FormKind) -> (Vec<TableColumn>, Vec<Field>) {
    let mut columns = vec![TableColumn::right("#", 2)];
    let fields = match kind {
        FormKind::LineItems => {
            columns.extend([
                TableColumn::left("Item Code", 9, Some(16)),
                TableColumn::left("Item Name", 12, Some(28)),
                TableColumn::left("UoM", 3, Some(8)),
                TableColumn::right("Stock", 6),
                TableColumn::right("Qty", 6),
                TableColumn::right("Unit Price", 10),
                TableColumn::right("Total", 10),
            ]);
            vec![
                Field::ItemCode,
                Field::ItemName,
                Field::Uom,
                Field::Stock,
                Field::Quantity,
                Field::UnitPrice,
            ]
        }
        FormKind::BillOfMaterials => {
            columns.extend([
                TableColumn::left("Item Code", 9, Some(16)),
                TableColumn::left("Item Name", 12, Some(28)),
                TableColumn::left("UoM", 3, Some(8)),
                TableColumn::right("Qty", 6),
                TableColumn::right("Unit Price", 10),
                TableColumn::right("Total", 10),
            ]);
            vec![
                Field::ItemCode,
                Field::ItemName,
                Field::Uom,
                Field::Quantity,
                Field::UnitPrice,
            ]
        }
        FormKind::JournalEntry => {
            columns.extend([
                TableColumn::left("Account", 10, Some(24)),
                TableColumn::left("Description", 12, Some(28)),
                TableColumn::left("Cost Center", 11, Some(16)),
                TableColumn::right("Debit", 10),
                TableColumn::right("Credit", 10),
            ]);
            vec![
                Field::Account,
                Field::Description,
                Field::CostCenter,
                Field::Debit,
                Field::Credit,
            ]
        }
    };
    (columns, fields)
}

impl ViewBinding for DesktopView {
    fn kind(&self) -> ViewKind {
        ViewKind::Desktop
    }

    fn render(&mut self, rows: &[&Row], summary: &Summary) -> RenderStats {
        let cells = rows.iter().map(|row| self.cells(row)).collect();
        let stats = self.cache.reconcile(rows, cells, summary);
        debug!(view = "desktop", ?stats, "rendered");
        stats
    }

    fn elements(&self) -> &[RenderedElement] {
        self.cache.elements()
    }

    fn wirings(&self) -> usize {
        self.cache.wirings()
    }

    fn output(&self) -> String {
        let table = Table {
            columns: &self.columns,
            rows: self
                .cache
                .elements()
                .iter()
                .map(|element| element.values.clone())
                .collect(),
            padding: 1,
        };
        let mut out = table.render();
        let summary = self.cache.summary();
        if !summary.is_empty() {
            out.push('\n');
        }
        for (name, value) in summary {
            out.push('\n');
            out.push_str(&format!(
                "{:>24}: {}",
                summary_label(name),
                format_grouped(&self.locale, parse_amount(value))
            ));
        }
        out
    }
}
