//! Presentations of the row store.
//!
//! Views are pure render targets: they never own row data. `render` is the
//! only path that creates row elements, and a row element is wired to its
//! input handlers exactly once, when it is created.

pub mod context_menu;
pub mod desktop;
pub mod mobile;
pub mod table;

use std::{collections::HashMap, fmt};

use crate::derive::Summary;
use crate::form::{Row, RowKey};

pub use context_menu::{ContextMenu, DismissReason, MenuAction};
pub use desktop::DesktopView;
pub use mobile::MobileView;

/// Which layout a binding renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Desktop,
    Mobile,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::Desktop => f.write_str("desktop"),
            ViewKind::Mobile => f.write_str("mobile"),
        }
    }
}

/// Render/edit adapter between the store and one on-screen layout.
pub trait ViewBinding {
    fn kind(&self) -> ViewKind;

    /// Makes the view show exactly `rows` (count, order, values) and `summary`.
    fn render(&mut self, rows: &[&Row], summary: &Summary) -> RenderStats;

    /// Row elements currently on screen, in display order.
    fn elements(&self) -> &[RenderedElement];

    /// Handler attachments made over the view's lifetime. Grows only when
    /// a new row element is created.
    fn wirings(&self) -> usize;

    /// Text form of the view.
    fn output(&self) -> String;
}

/// What a render pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub summary_changed: bool,
}

impl RenderStats {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0 && !self.summary_changed
    }
}

/// One rendered row element.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedElement {
    pub key: RowKey,
    pub index: usize,
    pub values: Vec<String>,
    listeners: u32,
}

impl RenderedElement {
    /// Number of times input handlers were attached to this element.
    pub fn listener_count(&self) -> u32 {
        self.listeners
    }

    fn wire(&mut self) {
        self.listeners += 1;
    }
}

/// Keyed element list shared by both layouts.
#[derive(Debug, Default, Clone)]
pub(crate) struct ElementCache {
    elements: Vec<RenderedElement>,
    summary: Vec<(&'static str, String)>,
    wirings: usize,
}

impl ElementCache {
    /// Matches elements to `rows` by key. `values` holds one entry per row.
    pub(crate) fn reconcile(
        &mut self,
        rows: &[&Row],
        values: Vec<Vec<String>>,
        summary: &Summary,
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        let mut previous: HashMap<RowKey, RenderedElement> = self
            .elements
            .drain(..)
            .map(|element| (element.key, element))
            .collect();

        for (row, values) in rows.iter().zip(values) {
            match previous.remove(&row.key()) {
                Some(mut element) => {
                    if element.values == values && element.index == row.index() {
                        stats.unchanged += 1;
                    } else {
                        element.values = values;
                        element.index = row.index();
                        stats.updated += 1;
                    }
                    self.elements.push(element);
                }
                None => {
                    let mut element = RenderedElement {
                        key: row.key(),
                        index: row.index(),
                        values,
                        listeners: 0,
                    };
                    element.wire();
                    self.wirings += 1;
                    self.elements.push(element);
                    stats.created += 1;
                }
            }
        }
        stats.removed = previous.len();

        let entries = summary.entries();
        if entries != self.summary {
            self.summary = entries;
            stats.summary_changed = true;
        }
        stats
    }

    pub(crate) fn elements(&self) -> &[RenderedElement] {
        &self.elements
    }

    pub(crate) fn wirings(&self) -> usize {
        self.wirings
    }

    pub(crate) fn summary(&self) -> &[(&'static str, String)] {
        &self.summary
    }
}

/// Human label for a summary entry name.
pub(crate) fn summary_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    for (idx, word) in name.split('_').enumerate() {
        if idx > 0 {
            label.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            label.extend(first.to_uppercase());
            label.push_str(chars.as_str());
        }
    }
    label
}
