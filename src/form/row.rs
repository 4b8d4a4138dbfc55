use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::{is_empty_or_zero, parse_amount};

use super::{Field, FormKind};

/// In-session handle for a row; stable across reorders and independent of
/// the persisted backend id, which new rows do not have yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey(Uuid);

impl RowKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RowKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

/// Values computed by the derivation engine. Never edited directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    pub line_total: f64,
}

/// One line item of the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    key: RowKey,
    id: Option<String>,
    index: usize,
    fields: BTreeMap<Field, String>,
    derived: Derived,
    marked_for_deletion: bool,
}

impl Row {
    pub(crate) fn from_template(template: &RowTemplate) -> Self {
        Self {
            key: RowKey::new(),
            id: None,
            index: 0,
            fields: template.defaults.clone(),
            derived: Derived::default(),
            marked_for_deletion: false,
        }
    }

    pub(crate) fn from_seed(seed: RowSeed) -> Self {
        Self {
            key: RowKey::new(),
            id: seed.id.filter(|id| !id.trim().is_empty()),
            index: 0,
            fields: seed
                .fields
                .into_iter()
                .filter(|(field, _)| !field.is_reserved())
                .collect(),
            derived: Derived::default(),
            marked_for_deletion: seed.delete,
        }
    }

    pub fn key(&self) -> RowKey {
        self.key
    }

    /// Persisted backend id, absent for rows created in this session.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Current value of a field; missing fields read as empty.
    pub fn field(&self, field: &Field) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    /// Lenient numeric view of a field.
    pub fn number(&self, field: &Field) -> f64 {
        parse_amount(self.field(field))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Field, &str)> {
        self.fields.iter().map(|(field, value)| (field, value.as_str()))
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn line_total(&self) -> f64 {
        self.derived.line_total
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    /// A row that carries no meaningful input for the given form kind.
    pub fn is_blank(&self, kind: FormKind) -> bool {
        let empty = |field: Field| self.field(&field).trim().is_empty();
        match kind {
            FormKind::LineItems | FormKind::BillOfMaterials => {
                empty(Field::ItemCode)
                    && empty(Field::ItemName)
                    && is_empty_or_zero(self.field(&Field::Quantity))
            }
            FormKind::JournalEntry => {
                empty(Field::Account)
                    && empty(Field::Description)
                    && is_empty_or_zero(self.field(&Field::Debit))
                    && is_empty_or_zero(self.field(&Field::Credit))
            }
        }
    }

    pub(crate) fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn set_marked_for_deletion(&mut self, marked: bool) {
        self.marked_for_deletion = marked;
    }

    pub(crate) fn derived_mut(&mut self) -> &mut Derived {
        &mut self.derived
    }
}

/// Blank-row blueprint: every field cleared except the listed defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowTemplate {
    #[serde(default)]
    defaults: BTreeMap<Field, String>,
}

impl RowTemplate {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, field: Field, value: impl Into<String>) -> Self {
        self.defaults.insert(field, value.into());
        self
    }

    pub fn defaults(&self) -> &BTreeMap<Field, String> {
        &self.defaults
    }
}

/// Row data supplied by the server-rendered form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSeed {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<Field, String>,
    #[serde(default, rename = "DELETE")]
    pub delete: bool,
}

impl RowSeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persisted(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }
}
