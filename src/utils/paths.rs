use dirs::home_dir;
use std::{env, path::PathBuf};

const DEFAULT_DIR_NAME: &str = ".formset_core";
const CONFIG_FILE: &str = "config.json";
const CACHE_DIR: &str = "cache";

/// Environment variable overriding the application data directory.
pub const HOME_ENV: &str = "FORMSET_CORE_HOME";

/// Returns the application-specific data directory, defaulting to `~/.formset_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Directory holding client-side lookup caches.
fn cache_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(CACHE_DIR)
}

/// Location of a named cache entry, e.g. `inventory_items_cache`.
pub fn cache_file_in(base: &std::path::Path, key: &str) -> PathBuf {
    cache_dir_in(base).join(format!("{key}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn cache_entries_live_under_cache_dir() {
        let path = cache_file_in(Path::new("/tmp/base"), "inventory_items_cache");
        assert_eq!(
            path,
            Path::new("/tmp/base/cache/inventory_items_cache.json")
        );
    }
}
