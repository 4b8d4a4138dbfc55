//! Submit-ready snapshot of a form.
//!
//! Field names follow the formset convention `<prefix>-<index>-<field>` and
//! the management counters `<prefix>-TOTAL_FORMS` and friends, so the host
//! form can post the payload as-is.

use tracing::info;

use crate::currency::format_amount;
use crate::derive::{HeaderField, HeaderFields, Summary};
use crate::form::{FormKind, RowStore};

pub const MIN_NUM_FORMS: usize = 0;
pub const MAX_NUM_FORMS: usize = 1000;

/// Flags every blank row for deletion, including the last visible one.
/// Returns how many rows were newly flagged.
pub fn flag_empty_rows(store: &mut RowStore, kind: FormKind) -> usize {
    let blank: Vec<_> = store
        .rows()
        .iter()
        .filter(|row| !row.is_marked_for_deletion() && row.is_blank(kind))
        .map(|row| row.key())
        .collect();
    for key in &blank {
        store.flag_for_submission(*key);
    }
    if !blank.is_empty() {
        info!(flagged = blank.len(), "empty rows flagged for deletion");
    }
    blank.len()
}

/// Ordered name/value pairs as the browser would post them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    pairs: Vec<(String, String)>,
}

impl FormPayload {
    pub fn build(
        prefix: &str,
        kind: FormKind,
        store: &RowStore,
        header: &HeaderFields,
        summary: &Summary,
    ) -> Self {
        let mut payload = Self::default();
        payload.push(format!("{prefix}-TOTAL_FORMS"), store.total_forms().to_string());
        payload.push(format!("{prefix}-INITIAL_FORMS"), store.initial_forms().to_string());
        payload.push(format!("{prefix}-MIN_NUM_FORMS"), MIN_NUM_FORMS.to_string());
        payload.push(format!("{prefix}-MAX_NUM_FORMS"), MAX_NUM_FORMS.to_string());

        for row in store.rows() {
            let index = row.index();
            payload.push(
                format!("{prefix}-{index}-id"),
                row.id().unwrap_or_default().to_string(),
            );
            for (field, value) in row.fields().filter(|(field, _)| !field.is_reserved()) {
                payload.push(format!("{prefix}-{index}-{field}"), value.to_string());
            }
            if kind != FormKind::JournalEntry {
                payload.push(
                    format!("{prefix}-{index}-line_total"),
                    format_amount(row.line_total()),
                );
            }
            if row.is_marked_for_deletion() {
                payload.push(format!("{prefix}-{index}-DELETE"), "on".to_string());
            }
        }

        for (name, value) in summary.entries() {
            payload.push(name.to_string(), value);
        }
        for field in HeaderField::all() {
            let value = header.get(field);
            if value.trim().is_empty() || payload.get(field.as_str()).is_some() {
                continue;
            }
            payload.push(field.as_str().to_string(), value);
        }
        payload
    }

    fn push(&mut self, name: String, value: String) {
        self.pairs.push((name, value));
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First value posted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}
