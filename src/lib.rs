#![doc(test(attr(deny(warnings))))]

//! Formset Core models the line-item forms of a back-office application: one
//! shared row store rendered by a desktop table and mobile cards, derived
//! totals recomputed on every edit, and item lookups against the catalog API.

pub mod cli;
pub mod config;
pub mod currency;
pub mod derive;
pub mod errors;
pub mod form;
pub mod lookup;
pub mod session;
pub mod submission;
pub mod utils;
pub mod view;

use std::sync::Once;

pub use errors::{FormError, FormResult};
pub use session::{DeleteOutcome, FormSession, InsertPosition, SessionOptions};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Formset Core tracing initialized.");
    });
}
