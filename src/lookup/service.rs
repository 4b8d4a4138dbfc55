use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::{FormError, FormResult};
use crate::utils::clock::{Clock, SystemClock};

use super::{
    filter_items, BomDetails, CatalogCache, CatalogItem, CatalogSource, SearchDebouncer,
    MIN_QUERY_LEN,
};

/// How searches reach the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// One server search per query.
    #[default]
    Remote,
    /// Whole catalog fetched once, filtered locally.
    CachedCatalog,
}

impl fmt::Display for LookupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupStrategy::Remote => f.write_str("remote"),
            LookupStrategy::CachedCatalog => f.write_str("cached_catalog"),
        }
    }
}

impl FromStr for LookupStrategy {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "remote" => Ok(LookupStrategy::Remote),
            "cached_catalog" | "cached" | "cache" => Ok(LookupStrategy::CachedCatalog),
            other => Err(FormError::InvalidInput(format!(
                "unknown lookup strategy '{other}'"
            ))),
        }
    }
}

/// Freshness of the data behind a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh { age_minutes: i64 },
    StaleAfterError,
    Unavailable,
}

impl CacheStatus {
    pub fn is_error(&self) -> bool {
        !matches!(self, CacheStatus::Fresh { .. })
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStatus::Fresh { age_minutes: 0 } => f.write_str("Using fresh data"),
            CacheStatus::Fresh { age_minutes: 1 } => f.write_str("Cache: 1 minute old"),
            CacheStatus::Fresh { age_minutes } => write!(f, "Cache: {age_minutes} minutes old"),
            CacheStatus::StaleAfterError => f.write_str("Error fetching data, using cache"),
            CacheStatus::Unavailable => f.write_str("Error fetching data"),
        }
    }
}

/// Result list plus a status line; lookups never fail outright.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupOutcome {
    pub items: Vec<CatalogItem>,
    pub status: Option<CacheStatus>,
}

impl LookupOutcome {
    fn empty() -> Self {
        Self::default()
    }
}

/// Catalog access with strategy selection and stale-data fallback.
pub struct LookupService {
    source: Arc<dyn CatalogSource>,
    strategy: LookupStrategy,
    cache: Mutex<CatalogCache>,
    clock: Arc<dyn Clock>,
    min_query_len: usize,
}

impl fmt::Debug for LookupService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupService")
            .field("strategy", &self.strategy)
            .field("min_query_len", &self.min_query_len)
            .finish_non_exhaustive()
    }
}

impl LookupService {
    pub fn new(source: Arc<dyn CatalogSource>, strategy: LookupStrategy, cache: CatalogCache) -> Self {
        Self::with_clock(source, strategy, cache, Arc::new(SystemClock))
    }

    /// Builds the service and loads any persisted catalog snapshot.
    pub fn with_clock(
        source: Arc<dyn CatalogSource>,
        strategy: LookupStrategy,
        mut cache: CatalogCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if strategy == LookupStrategy::CachedCatalog {
            if let Err(err) = cache.load(clock.now()) {
                warn!(error = %err, "catalog cache could not be read");
            }
        }
        Self {
            source,
            strategy,
            cache: Mutex::new(cache),
            clock,
            min_query_len: MIN_QUERY_LEN,
        }
    }

    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    pub fn strategy(&self) -> LookupStrategy {
        self.strategy
    }

    /// Items matching `query`. Queries shorter than the minimum length after
    /// trimming return nothing without touching the network.
    pub async fn search(&self, query: &str) -> LookupOutcome {
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            debug!(query, "query too short; skipping lookup");
            return LookupOutcome::empty();
        }
        match self.strategy {
            LookupStrategy::Remote => match self.source.search(query).await {
                Ok(items) => LookupOutcome {
                    items,
                    status: None,
                },
                Err(err) => {
                    warn!(query, error = %err, "item search failed");
                    LookupOutcome {
                        items: Vec::new(),
                        status: Some(CacheStatus::Unavailable),
                    }
                }
            },
            LookupStrategy::CachedCatalog => {
                let (items, status) = self.catalog(false).await;
                LookupOutcome {
                    items: filter_items(&items, query),
                    status: Some(status),
                }
            }
        }
    }

    /// `search` behind a trailing debounce. `None` when a newer call
    /// superseded this one.
    pub async fn search_debounced(
        &self,
        debouncer: &SearchDebouncer,
        query: &str,
    ) -> Option<LookupOutcome> {
        debouncer.run(|| self.search(query)).await
    }

    /// Forces a catalog fetch regardless of cache age.
    pub async fn refresh(&self) -> CacheStatus {
        self.catalog(true).await.1
    }

    /// Freshness of the cached catalog, if one is held.
    pub async fn status(&self) -> Option<CacheStatus> {
        let cache = self.cache.lock().await;
        cache.entry().map(|entry| CacheStatus::Fresh {
            age_minutes: entry.age_minutes(self.clock.now()),
        })
    }

    pub async fn by_code(&self, code: &str) -> FormResult<Option<CatalogItem>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        self.source.by_code(code).await
    }

    pub async fn bom_details(&self, bom_id: &str, planned_quantity: f64) -> FormResult<BomDetails> {
        self.source.bom_details(bom_id, planned_quantity).await
    }

    async fn catalog(&self, force: bool) -> (Vec<CatalogItem>, CacheStatus) {
        let mut cache = self.cache.lock().await;
        let now = self.clock.now();
        if !force && cache.is_fresh(now) {
            if let Some(entry) = cache.entry() {
                return (
                    entry.items.clone(),
                    CacheStatus::Fresh {
                        age_minutes: entry.age_minutes(now),
                    },
                );
            }
        }
        match self.source.catalog().await {
            Ok(items) => {
                if let Err(err) = cache.store(items.clone(), now) {
                    warn!(error = %err, "catalog cache could not be saved");
                }
                (items, CacheStatus::Fresh { age_minutes: 0 })
            }
            Err(err) => {
                warn!(error = %err, "catalog fetch failed");
                match cache.items() {
                    Some(items) => (items.to_vec(), CacheStatus::StaleAfterError),
                    None => (Vec::new(), CacheStatus::Unavailable),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeCatalog {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl FakeCatalog {
        fn items() -> Vec<CatalogItem> {
            vec![
                CatalogItem::new("ITM-001", "Steel Bolt"),
                CatalogItem::new("ITM-002", "Copper Wire"),
            ]
        }

        fn result(&self) -> FormResult<Vec<CatalogItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(FormError::Lookup("offline".into()))
            } else {
                Ok(Self::items())
            }
        }
    }

    #[async_trait]
    impl CatalogSource for FakeCatalog {
        async fn search(&self, query: &str) -> FormResult<Vec<CatalogItem>> {
            self.result().map(|items| filter_items(&items, query))
        }

        async fn catalog(&self) -> FormResult<Vec<CatalogItem>> {
            self.result()
        }

        async fn by_code(&self, code: &str) -> FormResult<Option<CatalogItem>> {
            Ok(self.result()?.into_iter().find(|item| item.code == code))
        }

        async fn bom_details(&self, _: &str, _: f64) -> FormResult<BomDetails> {
            Err(FormError::Lookup("no bom".into()))
        }
    }

    fn service(
        source: Arc<FakeCatalog>,
        strategy: LookupStrategy,
        temp: &TempDir,
    ) -> LookupService {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        LookupService::with_clock(
            source,
            strategy,
            CatalogCache::in_dir(temp.path(), "inventory_items_cache", 30),
            Arc::new(clock),
        )
    }

    #[tokio::test]
    async fn short_queries_skip_the_network() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(FakeCatalog::default());
        let lookup = service(source.clone(), LookupStrategy::Remote, &temp);

        assert!(lookup.search(" w ").await.items.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let outcome = lookup.search("bo").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.items.len(), 1);
    }

    #[tokio::test]
    async fn cached_catalog_fetches_once_and_filters_locally() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(FakeCatalog::default());
        let lookup = service(source.clone(), LookupStrategy::CachedCatalog, &temp);

        let first = lookup.search("itm").await;
        let second = lookup.search("wire").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.items.len(), 2);
        assert_eq!(second.items[0].code, "ITM-002");
        assert_eq!(second.status.unwrap().to_string(), "Using fresh data");
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_cached_items() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(FakeCatalog::default());
        let lookup = service(source.clone(), LookupStrategy::CachedCatalog, &temp);
        lookup.search("itm").await;

        source.failing.store(true, Ordering::SeqCst);
        let status = lookup.refresh().await;
        assert_eq!(status, CacheStatus::StaleAfterError);
        assert_eq!(lookup.search("bolt").await.items.len(), 1);
    }

    #[tokio::test]
    async fn failure_without_cache_is_reported_not_raised() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(FakeCatalog::default());
        source.failing.store(true, Ordering::SeqCst);

        let cached = service(source.clone(), LookupStrategy::CachedCatalog, &temp);
        let outcome = cached.search("bolt").await;
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.status.unwrap().to_string(), "Error fetching data");

        let remote = service(source, LookupStrategy::Remote, &temp);
        assert_eq!(remote.search("bolt").await.status, Some(CacheStatus::Unavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_burst_queries_the_source_once() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(FakeCatalog::default());
        let lookup = service(source.clone(), LookupStrategy::Remote, &temp);
        let debouncer = SearchDebouncer::default();

        let (first, last) = tokio::join!(
            lookup.search_debounced(&debouncer, "bo"),
            async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                lookup.search_debounced(&debouncer, "bolt").await
            }
        );
        assert!(first.is_none());
        assert_eq!(last.unwrap().items[0].code, "ITM-001");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_labels() {
        assert_eq!(CacheStatus::Fresh { age_minutes: 1 }.to_string(), "Cache: 1 minute old");
        assert_eq!(CacheStatus::Fresh { age_minutes: 12 }.to_string(), "Cache: 12 minutes old");
        assert!(CacheStatus::StaleAfterError.is_error());
    }
}
