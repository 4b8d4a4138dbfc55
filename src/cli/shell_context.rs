use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::config::{ConfigManager, FormConfig};
use crate::form::{RowKey, RowSeed};
use crate::lookup::{CatalogCache, CatalogItem, HttpCatalog, LookupService, SearchDebouncer};
use crate::session::{FormSession, SessionOptions};

use super::commands::{all_definitions, CommandRegistry};
use super::core::CliError;
use super::core::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Everything a command handler can reach.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub config_manager: ConfigManager,
    pub config: FormConfig,
    pub session: FormSession,
    pub lookup: LookupService,
    pub debouncer: SearchDebouncer,
    pub runtime: Runtime,
    /// Results of the last `search`, addressed by `pick`.
    pub last_results: Vec<CatalogItem>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        let config = config_manager.load()?;
        let lookup = build_lookup(&config_manager, &config)?;
        let debouncer = SearchDebouncer::new(config.lookup.debounce());
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            mode,
            registry: CommandRegistry::new(all_definitions()),
            session: FormSession::new(SessionOptions::from_config(&config)),
            config_manager,
            config,
            lookup,
            debouncer,
            runtime,
            last_results: Vec::new(),
            last_command: None,
            running: true,
        })
    }

    /// `(name, usage)` of every command, for completion and hints.
    pub fn command_usages(&self) -> Vec<(&'static str, &'static str)> {
        self.registry
            .iter()
            .map(|definition| (definition.name, definition.usage))
            .collect()
    }

    /// Replaces the session with one over `seeds`.
    pub fn restart_session(&mut self, seeds: Vec<RowSeed>) {
        self.session = FormSession::with_seeds(SessionOptions::from_config(&self.config), seeds);
        self.last_results.clear();
    }

    /// Saves `config` and switches the lookup service over to it. A rejected
    /// config leaves both the file and the running shell untouched.
    pub fn apply_config(&mut self, config: FormConfig) -> Result<(), CommandError> {
        let lookup = build_lookup(&self.config_manager, &config)?;
        self.config_manager.save(&config)?;
        self.debouncer = SearchDebouncer::new(config.lookup.debounce());
        self.lookup = lookup;
        self.config = config;
        Ok(())
    }

    /// Key of the row shown as `#index`.
    pub fn row_key(&self, raw: &str) -> Result<RowKey, CommandError> {
        let index: usize = raw
            .parse()
            .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a row number")))?;
        self.session
            .store()
            .at_index(index)
            .map(|row| row.key())
            .ok_or_else(|| CommandError::InvalidArguments(format!("no row #{index}")))
    }
}

fn build_lookup(
    config_manager: &ConfigManager,
    config: &FormConfig,
) -> Result<LookupService, crate::errors::FormError> {
    let source = HttpCatalog::new(&config.api_base_url, config.domain.clone())?;
    let cache = CatalogCache::in_dir(
        config_manager.base_dir(),
        &config.lookup.cache_key,
        config.lookup.cache_expiry_minutes,
    );
    Ok(
        LookupService::new(Arc::new(source), config.lookup.strategy, cache)
            .with_min_query_len(config.lookup.min_query_len),
    )
}
