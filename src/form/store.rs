use tracing::{debug, info, warn};

use crate::errors::{FormError, FormResult};

use super::{Field, Row, RowKey, RowSeed, RowTemplate};

/// Canonical ordered sequence of rows for one form instance.
///
/// Both views render from this store and write through it. Every structural
/// mutation reassigns `index` so that indices are `0..len` over the full list,
/// soft-deleted rows included. The store never becomes empty.
#[derive(Debug, Clone)]
pub struct RowStore {
    rows: Vec<Row>,
    template: RowTemplate,
}

impl RowStore {
    /// Creates a store holding a single blank row.
    pub fn new(template: RowTemplate) -> Self {
        let mut store = Self {
            rows: vec![Row::from_template(&template)],
            template,
        };
        store.reindex();
        store
    }

    /// Creates a store from server-rendered rows; falls back to one blank row.
    pub fn from_seeds(seeds: Vec<RowSeed>, template: RowTemplate) -> Self {
        if seeds.is_empty() {
            return Self::new(template);
        }
        let mut store = Self {
            rows: seeds.into_iter().map(Row::from_seed).collect(),
            template,
        };
        store.reindex();
        store.ensure_visible_row();
        store
    }

    pub fn template(&self) -> &RowTemplate {
        &self.template
    }

    /// Inserts a row built from `template` at `position` (clamped to `len`).
    pub fn insert_at(&mut self, position: usize, template: &RowTemplate) -> RowKey {
        let position = position.min(self.rows.len());
        let row = Row::from_template(template);
        let key = row.key();
        self.rows.insert(position, row);
        self.reindex();
        info!(row = %key, position, total = self.rows.len(), "row inserted");
        key
    }

    /// Inserts a row built from the store's own template.
    pub fn insert_blank(&mut self, position: usize) -> RowKey {
        let template = self.template.clone();
        self.insert_at(position, &template)
    }

    /// Flags the row for deletion unless it is the last visible row.
    ///
    /// Returns whether the flag was set.
    pub fn soft_delete(&mut self, key: RowKey) -> bool {
        let visible = self.visible_count();
        let Some(row) = self.rows.iter_mut().find(|row| row.key() == key) else {
            warn!(row = %key, "soft delete requested for unknown row");
            return false;
        };
        if row.is_marked_for_deletion() {
            return false;
        }
        if visible <= 1 {
            debug!(row = %key, "refusing to hide the last visible row");
            return false;
        }
        row.set_marked_for_deletion(true);
        info!(row = %key, "row marked for deletion");
        true
    }

    /// Physically removes an unsaved row. No-op for persisted rows and for the
    /// only remaining row.
    pub fn hard_remove(&mut self, key: RowKey) -> bool {
        if self.rows.len() <= 1 {
            debug!(row = %key, "refusing to remove the only row");
            return false;
        }
        let Some(position) = self.position(key) else {
            warn!(row = %key, "remove requested for unknown row");
            return false;
        };
        if self.rows[position].is_persisted() {
            warn!(row = %key, "persisted rows can only be soft deleted");
            return false;
        }
        self.rows.remove(position);
        self.reindex();
        self.ensure_visible_row();
        info!(row = %key, total = self.rows.len(), "row removed");
        true
    }

    /// Writes a single field. Derivations are the caller's concern.
    ///
    /// Reserved names (`id`, `DELETE`, `line_total`) are rejected.
    pub fn update(&mut self, key: RowKey, field: Field, value: impl Into<String>) -> FormResult<()> {
        if field.is_reserved() {
            return Err(FormError::InvalidInput(format!(
                "`{field}` is managed by the form and cannot be edited"
            )));
        }
        let row = self
            .row_mut(key)
            .ok_or_else(|| FormError::RowNotFound(key.to_string()))?;
        row.set_field(field, value);
        Ok(())
    }

    /// Moves a row to `position` (clamped), keeping indices contiguous.
    pub fn move_row(&mut self, key: RowKey, position: usize) -> FormResult<()> {
        let from = self
            .position(key)
            .ok_or_else(|| FormError::RowNotFound(key.to_string()))?;
        let row = self.rows.remove(from);
        let to = position.min(self.rows.len());
        self.rows.insert(to, row);
        self.reindex();
        debug!(row = %key, from, to, "row moved");
        Ok(())
    }

    /// Rows not flagged for deletion, in index order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter().filter(|row| !row.is_marked_for_deletion())
    }

    pub fn visible_count(&self) -> usize {
        self.visible_rows().count()
    }

    /// All rows, soft-deleted ones included.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: RowKey) -> Option<&Row> {
        self.rows.iter().find(|row| row.key() == key)
    }

    pub fn at_index(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn position(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|row| row.key() == key)
    }

    /// Value of the management form's total-forms counter.
    pub fn total_forms(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows that already exist on the backend.
    pub fn initial_forms(&self) -> usize {
        self.rows.iter().filter(|row| row.is_persisted()).count()
    }

    /// Drops unsaved rows and flags persisted ones, then appends one blank
    /// row so the form stays editable.
    pub fn clear(&mut self) {
        self.rows.retain(|row| row.is_persisted());
        for row in &mut self.rows {
            row.set_marked_for_deletion(true);
        }
        let blank = Row::from_template(&self.template);
        self.rows.push(blank);
        self.reindex();
        info!(total = self.rows.len(), "rows cleared");
    }

    /// Appends a blank row when every row is hidden.
    pub fn ensure_visible_row(&mut self) -> Option<RowKey> {
        if self.visible_count() > 0 {
            return None;
        }
        let len = self.rows.len();
        Some(self.insert_blank(len))
    }

    pub(crate) fn row_mut(&mut self, key: RowKey) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.key() == key)
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> + '_ {
        self.rows.iter_mut()
    }

    /// Flags a row regardless of the visibility guard; submission only.
    pub(crate) fn flag_for_submission(&mut self, key: RowKey) {
        if let Some(row) = self.row_mut(key) {
            row.set_marked_for_deletion(true);
        }
    }

    fn reindex(&mut self) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.set_index(index);
        }
    }
}
