use std::{fmt, str::FromStr};

use tracing::debug;

use crate::errors::FormError;
use crate::form::RowKey;

/// Entries offered by the row menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddAbove,
    AddBelow,
    Delete,
}

impl MenuAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuAction::AddAbove => "add-above",
            MenuAction::AddBelow => "add-below",
            MenuAction::Delete => "delete",
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuAction {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "add-above" | "above" => Ok(MenuAction::AddAbove),
            "add-below" | "below" => Ok(MenuAction::AddBelow),
            "delete" | "remove" => Ok(MenuAction::Delete),
            other => Err(FormError::InvalidInput(format!(
                "unknown menu action '{other}'"
            ))),
        }
    }
}

/// Why an open menu went away without an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    OutsideClick,
    Scroll,
    Escape,
}

impl FromStr for DismissReason {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "click" | "outside" | "outside-click" => Ok(DismissReason::OutsideClick),
            "scroll" => Ok(DismissReason::Scroll),
            "escape" | "esc" => Ok(DismissReason::Escape),
            other => Err(FormError::InvalidInput(format!(
                "unknown dismiss reason '{other}'"
            ))),
        }
    }
}

/// Transient per-row menu. Holds at most one target row at a time.
#[derive(Debug, Clone, Default)]
pub struct ContextMenu {
    target: Option<RowKey>,
}

impl ContextMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the menu on `key`, replacing any previous target.
    pub fn open(&mut self, key: RowKey) {
        debug!(row = %key, "context menu opened");
        self.target = Some(key);
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<RowKey> {
        self.target
    }

    pub fn dismiss(&mut self, reason: DismissReason) {
        if let Some(key) = self.target.take() {
            debug!(row = %key, ?reason, "context menu dismissed");
        }
    }

    /// Consumes the target for `action`. Returns `None` when the menu is closed.
    pub fn take_action(&mut self, action: MenuAction) -> Option<(RowKey, MenuAction)> {
        let key = self.target.take()?;
        debug!(row = %key, %action, "context menu action");
        Some((key, action))
    }
}
