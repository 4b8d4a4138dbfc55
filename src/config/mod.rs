use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::currency::LocaleConfig;
use crate::errors::{FormError, FormResult};
use crate::form::{Field, FormKind, RowTemplate};
use crate::lookup::cache::{CACHE_KEY, DEFAULT_EXPIRY_MINUTES};
use crate::lookup::{LookupStrategy, MIN_QUERY_LEN};
use crate::utils::{ensure_dir, paths, write_atomic};

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_DOMAIN: &str = "inventory";
const DEFAULT_PREFIX: &str = "form";
const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Catalog lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub strategy: LookupStrategy,
    pub cache_key: String,
    pub cache_expiry_minutes: i64,
    pub debounce_ms: u64,
    pub min_query_len: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            strategy: LookupStrategy::Remote,
            cache_key: CACHE_KEY.into(),
            cache_expiry_minutes: DEFAULT_EXPIRY_MINUTES,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

impl LookupConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub api_base_url: String,
    /// Application segment of the item endpoints, e.g. `inventory`.
    pub domain: String,
    /// Formset prefix used for submitted field names.
    pub prefix: String,
    pub form_kind: FormKind,
    pub locale: LocaleConfig,
    pub lookup: LookupConfig,
    /// Values pre-filled into rows added by the user.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub row_defaults: BTreeMap<Field, String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            domain: DEFAULT_DOMAIN.into(),
            prefix: DEFAULT_PREFIX.into(),
            form_kind: FormKind::default(),
            locale: LocaleConfig::default(),
            lookup: LookupConfig::default(),
            row_defaults: BTreeMap::new(),
        }
    }
}

impl FormConfig {
    pub fn row_template(&self) -> RowTemplate {
        self.row_defaults
            .iter()
            .fold(RowTemplate::empty(), |template, (field, value)| {
                template.with_default(field.clone(), value.clone())
            })
    }

    pub fn validate(&self) -> FormResult<()> {
        if self.prefix.trim().is_empty() {
            return Err(FormError::Config("formset prefix cannot be empty".into()));
        }
        if self.domain.trim().is_empty() {
            return Err(FormError::Config("api domain cannot be empty".into()));
        }
        if self.lookup.cache_expiry_minutes <= 0 {
            return Err(FormError::Config(format!(
                "cache expiry must be positive, got {} minutes",
                self.lookup.cache_expiry_minutes
            )));
        }
        if let Some(field) = self.row_defaults.keys().find(|field| field.is_reserved()) {
            return Err(FormError::Config(format!(
                "`{field}` cannot have a row default"
            )));
        }
        parse_base_url(&self.api_base_url)?;
        Ok(())
    }
}

/// Parses the catalog API root. It must be able to carry endpoint paths.
pub fn parse_base_url(raw: &str) -> FormResult<url::Url> {
    let url = url::Url::parse(raw)
        .map_err(|err| FormError::Config(format!("invalid api base url '{raw}': {err}")))?;
    if url.cannot_be_a_base() {
        return Err(FormError::Config(format!(
            "api base url '{raw}' cannot carry a path"
        )));
    }
    Ok(url)
}

/// Loads and stores `config.json` in the application data directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> FormResult<Self> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> FormResult<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
            base,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored configuration, or defaults when none was saved.
    pub fn load(&self) -> FormResult<FormConfig> {
        if !self.path.exists() {
            return Ok(FormConfig::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: FormConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &FormConfig) -> FormResult<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, FormConfig::default());
        assert_eq!(config.lookup.cache_expiry_minutes, 30);
        assert_eq!(config.lookup.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn saved_config_is_reloaded() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut config = FormConfig {
            prefix: "receipt_items".into(),
            form_kind: FormKind::JournalEntry,
            ..FormConfig::default()
        };
        config.lookup.strategy = LookupStrategy::CachedCatalog;
        config.row_defaults.insert(Field::Uom, "Pcs".into());
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.row_template().defaults().get(&Field::Uom).map(String::as_str), Some("Pcs"));
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"domain":"purchase","lookup":{"debounce_ms":150}}"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.domain, "purchase");
        assert_eq!(config.lookup.debounce_ms, 150);
        assert_eq!(config.lookup.cache_key, "inventory_items_cache");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = FormConfig {
            api_base_url: "not a url".into(),
            ..FormConfig::default()
        };
        assert!(matches!(config.validate(), Err(FormError::Config(_))));
        let config = FormConfig {
            prefix: " ".into(),
            ..FormConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn base_url_must_accept_paths() {
        let config = FormConfig {
            api_base_url: "mailto:ops@example.com".into(),
            ..FormConfig::default()
        };
        assert!(matches!(config.validate(), Err(FormError::Config(_))));
        assert!(parse_base_url("https://erp.example.com/app/").is_ok());
    }

    #[test]
    fn rejected_config_is_not_written() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut config = FormConfig::default();
        config.row_defaults.insert(Field::from_name("line_total"), "1".into());
        assert!(manager.save(&config).is_err());
        assert!(!manager.path().exists());
    }
}
