//! One live form: the row store, its derivations and the views showing it.
//!
//! `FormSession` is the only place where edits enter the model. Every handler
//! mutates the store, reruns the derivation pass when totals may have moved,
//! and re-renders every attached view from the store. Views never talk to each
//! other directly.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, info, warn};

use crate::config::FormConfig;
use crate::currency::LocaleConfig;
use crate::derive::{DerivationEngine, HeaderField, HeaderFields, Summary};
use crate::errors::{FormError, FormResult};
use crate::form::{Field, FormKind, Row, RowKey, RowSeed, RowStore, RowTemplate};
use crate::lookup::{
    apply_to_row, clear_lookup_fields, BomComponent, CatalogItem, LookupService, LookupTicket,
};
use crate::submission::{flag_empty_rows, FormPayload};
use crate::utils::clock::{Clock, SystemClock};
use crate::view::{
    ContextMenu, DesktopView, DismissReason, MenuAction, MobileView, RenderStats, ViewBinding,
    ViewKind,
};

/// Where a new row goes relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Above,
    Below,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Persisted row flagged for deletion on submit.
    SoftDeleted,
    /// Unsaved row dropped from the store.
    Removed,
    /// Nothing changed: last visible row, unknown row, or already flagged.
    Refused,
}

/// Result of acting on the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Added(RowKey),
    Deleted(DeleteOutcome),
}

/// Construction parameters for a session.
#[derive(Clone)]
pub struct SessionOptions {
    pub kind: FormKind,
    pub prefix: String,
    pub template: RowTemplate,
    /// Whether the page carries each view's container.
    pub desktop: bool,
    pub mobile: bool,
    pub locale: LocaleConfig,
    pub header: HeaderFields,
    pub clock: Arc<dyn Clock>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            kind: FormKind::default(),
            prefix: "form".into(),
            template: RowTemplate::empty(),
            desktop: true,
            mobile: true,
            locale: LocaleConfig::default(),
            header: HeaderFields::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &FormConfig) -> Self {
        Self {
            kind: config.form_kind,
            prefix: config.prefix.clone(),
            template: config.row_template(),
            locale: config.locale.clone(),
            ..Self::default()
        }
    }
}

pub struct FormSession {
    kind: FormKind,
    prefix: String,
    store: RowStore,
    header: HeaderFields,
    engine: DerivationEngine,
    summary: Summary,
    desktop: Option<DesktopView>,
    mobile: Option<MobileView>,
    menu: ContextMenu,
    pending_lookups: HashMap<RowKey, u64>,
    lookup_seq: u64,
}

impl FormSession {
    pub fn new(options: SessionOptions) -> Self {
        Self::with_seeds(options, Vec::new())
    }

    /// Starts a session over rows rendered by the server.
    pub fn with_seeds(options: SessionOptions, seeds: Vec<RowSeed>) -> Self {
        let SessionOptions {
            kind,
            prefix,
            template,
            desktop,
            mobile,
            locale,
            mut header,
            clock,
        } = options;
        let mut store = RowStore::from_seeds(seeds, template);
        let engine = DerivationEngine::with_clock(kind, clock);
        let summary = engine.recompute(&mut store, &mut header);
        let mut session = Self {
            kind,
            prefix,
            store,
            header,
            engine,
            summary,
            desktop: desktop.then(|| DesktopView::new(kind).with_locale(locale)),
            mobile: mobile.then(|| MobileView::new(kind)),
            menu: ContextMenu::new(),
            pending_lookups: HashMap::new(),
            lookup_seq: 0,
        };
        session.render();
        info!(%kind, rows = session.store.len(), "form session started");
        session
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn header(&self) -> &HeaderFields {
        &self.header
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    /// The attached view of `kind`, if its container exists.
    pub fn view(&self, kind: ViewKind) -> Option<&dyn ViewBinding> {
        match kind {
            ViewKind::Desktop => self.desktop.as_ref().map(|view| view as &dyn ViewBinding),
            ViewKind::Mobile => self.mobile.as_ref().map(|view| view as &dyn ViewBinding),
        }
    }

    /// Visible row at display position `position`.
    pub fn visible_row(&self, position: usize) -> Option<&Row> {
        self.store.visible_rows().nth(position)
    }

    /// Re-renders every attached view from the store.
    pub fn render(&mut self) -> Vec<(ViewKind, RenderStats)> {
        let rows: Vec<&Row> = self.store.visible_rows().collect();
        let mut stats = Vec::with_capacity(2);
        if let Some(view) = self.desktop.as_mut() {
            stats.push((ViewKind::Desktop, view.render(&rows, &self.summary)));
        }
        if let Some(view) = self.mobile.as_mut() {
            stats.push((ViewKind::Mobile, view.render(&rows, &self.summary)));
        }
        stats
    }

    /// Reruns the derivation pass over the whole store.
    pub fn recalculate(&mut self) -> Summary {
        self.summary = self.engine.recompute(&mut self.store, &mut self.header);
        self.summary
    }

    fn refresh(&mut self) {
        self.recalculate();
        self.render();
    }

    /// A user typed `raw` into `field` of row `key` in the `origin` view.
    ///
    /// Fields feeding totals trigger the derivation pass. Item code edits
    /// return a ticket for the lookup the caller should issue.
    pub fn on_field_edited(
        &mut self,
        origin: ViewKind,
        key: RowKey,
        field: Field,
        raw: &str,
    ) -> FormResult<Option<LookupTicket>> {
        if field.is_reserved() {
            warn!(%origin, %field, "edit of a form-managed field rejected");
            return Err(FormError::InvalidInput(format!(
                "`{field}` is managed by the form and cannot be edited"
            )));
        }
        let previous = self
            .store
            .get(key)
            .map(|row| row.field(&field).to_string())
            .ok_or_else(|| FormError::RowNotFound(key.to_string()))?;
        if previous == raw {
            return Ok(None);
        }
        self.store.update(key, field.clone(), raw)?;
        if field.affects_totals() {
            self.recalculate();
        } else {
            debug!(%origin, %field, "layout field edited; derivation skipped");
        }
        self.render();

        if field == Field::ItemCode && !raw.trim().is_empty() {
            return Ok(self.begin_lookup(key));
        }
        Ok(None)
    }

    pub fn on_header_edited(&mut self, field: HeaderField, raw: &str) -> FormResult<Summary> {
        self.header.edit(field, raw)?;
        self.refresh();
        Ok(self.summary)
    }

    /// Inserts a row next to `anchor`. An unknown anchor appends.
    pub fn on_add_requested(&mut self, anchor: Option<RowKey>, position: InsertPosition) -> RowKey {
        let anchor_position = anchor.and_then(|key| self.store.position(key));
        let at = match (position, anchor_position) {
            (InsertPosition::Above, Some(at)) => at,
            (InsertPosition::Below, Some(at)) => at + 1,
            (InsertPosition::Append, _) => self.store.len(),
            (_, None) => {
                if anchor.is_some() {
                    warn!(?position, "anchor row not found; appending");
                }
                self.store.len()
            }
        };
        let key = self.store.insert_blank(at);
        self.refresh();
        key
    }

    /// Persisted rows are soft-deleted, unsaved rows removed. The last
    /// visible row is never deleted.
    pub fn on_delete_requested(&mut self, key: RowKey) -> DeleteOutcome {
        let Some(row) = self.store.get(key) else {
            warn!(row = %key, "delete requested for unknown row");
            return DeleteOutcome::Refused;
        };
        if row.is_marked_for_deletion() {
            return DeleteOutcome::Refused;
        }
        if self.store.visible_count() <= 1 {
            debug!(row = %key, "refusing to delete the last visible row");
            return DeleteOutcome::Refused;
        }
        let outcome = if row.is_persisted() {
            if self.store.soft_delete(key) {
                DeleteOutcome::SoftDeleted
            } else {
                DeleteOutcome::Refused
            }
        } else if self.store.hard_remove(key) {
            DeleteOutcome::Removed
        } else {
            DeleteOutcome::Refused
        };
        if outcome != DeleteOutcome::Refused {
            self.pending_lookups.remove(&key);
            self.refresh();
        }
        outcome
    }

    /// Opens the row menu on a visible row.
    pub fn open_menu(&mut self, key: RowKey) -> bool {
        match self.store.get(key) {
            Some(row) if !row.is_marked_for_deletion() => {
                self.menu.open(key);
                true
            }
            _ => false,
        }
    }

    pub fn dismiss_menu(&mut self, reason: DismissReason) {
        self.menu.dismiss(reason);
    }

    /// Runs `action` on the menu's target. A closed menu, or a target that
    /// no longer exists, does nothing.
    pub fn on_menu_action(&mut self, action: MenuAction) -> Option<MenuOutcome> {
        let (key, action) = self.menu.take_action(action)?;
        if self.store.get(key).is_none() {
            debug!(row = %key, "menu target no longer exists");
            return None;
        }
        Some(match action {
            MenuAction::AddAbove => {
                MenuOutcome::Added(self.on_add_requested(Some(key), InsertPosition::Above))
            }
            MenuAction::AddBelow => {
                MenuOutcome::Added(self.on_add_requested(Some(key), InsertPosition::Below))
            }
            MenuAction::Delete => MenuOutcome::Deleted(self.on_delete_requested(key)),
        })
    }

    /// Issues a lookup ticket for `key`, superseding any earlier one.
    pub fn begin_lookup(&mut self, key: RowKey) -> Option<LookupTicket> {
        self.store.get(key)?;
        self.lookup_seq += 1;
        self.pending_lookups.insert(key, self.lookup_seq);
        Some(LookupTicket {
            row: key,
            seq: self.lookup_seq,
        })
    }

    /// Writes a lookup result back. Responses for superseded tickets or
    /// removed rows are dropped. A miss clears the looked-up fields.
    pub fn complete_lookup(&mut self, ticket: LookupTicket, item: Option<&CatalogItem>) -> bool {
        if self.pending_lookups.get(&ticket.row) != Some(&ticket.seq) {
            debug!(row = %ticket.row, seq = ticket.seq, "stale lookup response discarded");
            return false;
        }
        self.pending_lookups.remove(&ticket.row);
        let Some(row) = self.store.row_mut(ticket.row) else {
            return false;
        };
        match item {
            Some(item) => apply_to_row(row, item),
            None => {
                debug!(row = %ticket.row, "item code not found; clearing lookup fields");
                clear_lookup_fields(row);
            }
        }
        self.refresh();
        true
    }

    /// Fills a row from an item picked in a search list.
    pub fn apply_item(&mut self, key: RowKey, item: &CatalogItem) -> FormResult<()> {
        let row = self
            .store
            .row_mut(key)
            .ok_or_else(|| FormError::RowNotFound(key.to_string()))?;
        apply_to_row(row, item);
        self.pending_lookups.remove(&key);
        info!(row = %key, code = %item.code, "item applied");
        self.refresh();
        Ok(())
    }

    /// Resolves the row's item code against the catalog and writes the
    /// result back. Network failures leave the row untouched.
    pub async fn resolve_item_code(&mut self, lookup: &LookupService, key: RowKey) -> bool {
        let Some(code) = self
            .store
            .get(key)
            .map(|row| row.field(&Field::ItemCode).trim().to_string())
        else {
            return false;
        };
        let Some(ticket) = self.begin_lookup(key) else {
            return false;
        };
        match lookup.by_code(&code).await {
            Ok(item) => self.complete_lookup(ticket, item.as_ref()),
            Err(err) => {
                warn!(row = %key, code = %code, error = %err, "item lookup failed");
                self.pending_lookups.remove(&key);
                false
            }
        }
    }

    /// Replaces the rows with the components of a bill of materials.
    pub fn apply_bom(&mut self, components: &[BomComponent]) -> Vec<RowKey> {
        self.menu.dismiss(DismissReason::OutsideClick);
        self.pending_lookups.clear();
        self.store.clear();
        let mut keys = Vec::with_capacity(components.len());
        for (idx, component) in components.iter().enumerate() {
            // The blank row left by `clear` takes the first component.
            let reuse = if idx == 0 {
                self.store.visible_rows().next().map(Row::key)
            } else {
                None
            };
            let key = match reuse {
                Some(key) => key,
                None => {
                    let len = self.store.len();
                    self.store.insert_blank(len)
                }
            };
            if let Some(row) = self.store.row_mut(key) {
                row.set_field(Field::ItemCode, component.item_code.clone());
                row.set_field(Field::ItemName, component.item_name.clone());
                row.set_field(Field::Quantity, component.quantity.clone());
            }
            keys.push(key);
        }
        info!(components = components.len(), "bill of materials applied");
        self.refresh();
        keys
    }

    /// Fetches a bill of materials and applies it.
    pub async fn load_bom(
        &mut self,
        lookup: &LookupService,
        bom_id: &str,
        planned_quantity: f64,
    ) -> FormResult<Vec<RowKey>> {
        let components = lookup
            .bom_details(bom_id, planned_quantity)
            .await?
            .into_components()?;
        Ok(self.apply_bom(&components))
    }

    /// Flags empty rows and builds the payload the host form posts.
    pub fn prepare_submission(&mut self) -> FormPayload {
        self.menu.dismiss(DismissReason::OutsideClick);
        flag_empty_rows(&mut self.store, self.kind);
        self.refresh();
        let payload =
            FormPayload::build(&self.prefix, self.kind, &self.store, &self.header, &self.summary);
        info!(
            total = self.store.total_forms(),
            initial = self.store.initial_forms(),
            "submission prepared"
        );
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> FormSession {
        FormSession::new(SessionOptions::default())
    }

    fn first_key(session: &FormSession) -> RowKey {
        session.store().rows()[0].key()
    }

    #[test]
    fn edit_in_one_view_reaches_the_other() {
        let mut session = session();
        let key = first_key(&session);
        session
            .on_field_edited(ViewKind::Desktop, key, Field::Quantity, "3")
            .unwrap();
        session
            .on_field_edited(ViewKind::Desktop, key, Field::UnitPrice, "12.505")
            .unwrap();

        let mobile = session.view(ViewKind::Mobile).unwrap();
        assert_eq!(mobile.elements().len(), 1);
        assert!(mobile.elements()[0].values.iter().any(|line| line == "Total 37.52"));
        assert_eq!(session.summary().subtotal(), 37.52);
    }

    #[test]
    fn form_managed_fields_cannot_be_edited() {
        let mut session = session();
        let key = first_key(&session);
        session
            .on_field_edited(ViewKind::Desktop, key, Field::Quantity, "2")
            .unwrap();
        session
            .on_field_edited(ViewKind::Desktop, key, Field::UnitPrice, "5")
            .unwrap();

        for name in ["line_total", "id", "DELETE"] {
            let result =
                session.on_field_edited(ViewKind::Desktop, key, Field::from_name(name), "999");
            assert!(matches!(result, Err(FormError::InvalidInput(_))), "{name} accepted");
        }

        let payload = session.prepare_submission();
        let totals: Vec<&str> = payload
            .pairs()
            .iter()
            .filter(|(name, _)| name == "form-0-line_total")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(totals, vec!["10.00"]);
        assert_eq!(payload.get("form-0-id"), Some(""));
        assert_eq!(payload.get("form-0-DELETE"), None);
    }

    #[test]
    fn item_code_edits_issue_tickets_and_stale_ones_are_dropped() {
        let mut session = session();
        let key = first_key(&session);
        let first = session
            .on_field_edited(ViewKind::Mobile, key, Field::ItemCode, "A")
            .unwrap()
            .unwrap();
        let second = session
            .on_field_edited(ViewKind::Mobile, key, Field::ItemCode, "A1")
            .unwrap()
            .unwrap();

        let stale = CatalogItem::new("A", "Old");
        assert!(!session.complete_lookup(first, Some(&stale)));
        let fresh = CatalogItem::new("A1", "Widget").with_unit_price("4");
        assert!(session.complete_lookup(second, Some(&fresh)));
        let row = session.store().get(key).unwrap();
        assert_eq!(row.field(&Field::ItemName), "Widget");
        assert_eq!(row.line_total(), 4.0);
    }

    #[test]
    fn lookup_miss_clears_previous_item_details() {
        let mut session = session();
        let key = first_key(&session);
        session
            .apply_item(key, &CatalogItem::new("A1", "Widget").with_uom("Pcs"))
            .unwrap();
        let ticket = session
            .on_field_edited(ViewKind::Desktop, key, Field::ItemCode, "ZZ")
            .unwrap()
            .unwrap();
        assert!(session.complete_lookup(ticket, None));
        let row = session.store().get(key).unwrap();
        assert_eq!(row.field(&Field::ItemCode), "ZZ");
        assert_eq!(row.field(&Field::ItemName), "");
        assert_eq!(row.field(&Field::Uom), "");
    }

    #[test]
    fn last_visible_row_cannot_be_deleted() {
        let mut session = session();
        let key = first_key(&session);
        assert_eq!(session.on_delete_requested(key), DeleteOutcome::Refused);
        assert_eq!(session.store().visible_count(), 1);
    }

    #[test]
    fn persisted_rows_are_soft_deleted_and_new_rows_removed() {
        let mut session = FormSession::with_seeds(
            SessionOptions::default(),
            vec![
                RowSeed::persisted("1").with(Field::Quantity, "1"),
                RowSeed::persisted("2"),
            ],
        );
        let persisted = first_key(&session);
        let added = session.on_add_requested(Some(persisted), InsertPosition::Below);
        assert_eq!(session.store().get(added).unwrap().index(), 1);

        assert_eq!(session.on_delete_requested(added), DeleteOutcome::Removed);
        assert_eq!(session.on_delete_requested(persisted), DeleteOutcome::SoftDeleted);
        assert_eq!(session.store().len(), 2);
        assert_eq!(session.store().visible_count(), 1);
        assert_eq!(session.view(ViewKind::Desktop).unwrap().elements().len(), 1);
    }

    #[test]
    fn menu_actions_consume_the_target() {
        let mut session = session();
        let key = first_key(&session);
        assert!(session.open_menu(key));
        let outcome = session.on_menu_action(MenuAction::AddAbove);
        let Some(MenuOutcome::Added(added)) = outcome else {
            panic!("expected a row to be added, got {outcome:?}");
        };
        assert_eq!(session.store().get(added).unwrap().index(), 0);
        assert_eq!(session.on_menu_action(MenuAction::Delete), None);

        session.open_menu(key);
        session.dismiss_menu(DismissReason::Escape);
        assert_eq!(session.on_menu_action(MenuAction::Delete), None);
        assert_eq!(session.store().len(), 2);
    }

    #[test]
    fn missing_views_are_skipped() {
        let mut session = FormSession::new(SessionOptions {
            mobile: false,
            ..SessionOptions::default()
        });
        let key = first_key(&session);
        session
            .on_field_edited(ViewKind::Desktop, key, Field::Quantity, "2")
            .unwrap();
        assert!(session.view(ViewKind::Mobile).is_none());
        assert_eq!(session.render().len(), 1);
    }

    #[test]
    fn bom_replaces_rows_with_components() {
        let mut session = FormSession::new(SessionOptions {
            kind: FormKind::BillOfMaterials,
            ..SessionOptions::default()
        });
        let components = vec![
            BomComponent {
                item_code: "RM-1".into(),
                item_name: "Resin".into(),
                quantity: "2".into(),
            },
            BomComponent {
                item_code: "RM-2".into(),
                item_name: "Hardener".into(),
                quantity: "1".into(),
            },
        ];
        let keys = session.apply_bom(&components);
        assert_eq!(keys.len(), 2);
        let codes: Vec<&str> = session
            .store()
            .visible_rows()
            .map(|row| row.field(&Field::ItemCode))
            .collect();
        assert_eq!(codes, vec!["RM-1", "RM-2"]);
    }

    #[test]
    fn submission_flags_blank_rows() {
        let mut session = session();
        let key = first_key(&session);
        session
            .on_field_edited(ViewKind::Desktop, key, Field::ItemCode, "A1")
            .unwrap();
        session.on_add_requested(None, InsertPosition::Append);
        let payload = session.prepare_submission();
        assert_eq!(payload.get("form-TOTAL_FORMS"), Some("2"));
        assert_eq!(payload.get("form-0-DELETE"), None);
        assert_eq!(payload.get("form-1-DELETE"), Some("on"));
    }
}
