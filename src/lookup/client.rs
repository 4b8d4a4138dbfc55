use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::parse_base_url;
use crate::errors::FormResult;

use super::{BomDetails, CatalogItem};

/// Read access to the item catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Items matching `query` as filtered by the server.
    async fn search(&self, query: &str) -> FormResult<Vec<CatalogItem>>;

    /// The whole catalog, for client-side filtering.
    async fn catalog(&self) -> FormResult<Vec<CatalogItem>>;

    /// Exact item for `code`; `None` when the server does not know it.
    async fn by_code(&self, code: &str) -> FormResult<Option<CatalogItem>>;

    async fn bom_details(&self, bom_id: &str, planned_quantity: f64) -> FormResult<BomDetails>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<CatalogItem>,
}

/// `CatalogSource` over the inventory HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    http: Client,
    base_url: Url,
    domain: String,
}

impl HttpCatalog {
    pub fn new(base_url: &str, domain: impl Into<String>) -> FormResult<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            http: Client::new(),
            base_url,
            domain: domain.into(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    // Trailing slash included, matching the server's routes.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments).push("");
        }
        url
    }

    async fn fetch_items(&self, query: Option<&str>) -> FormResult<Vec<CatalogItem>> {
        let url = self.endpoint(&[self.domain.as_str(), "api", "items", "search"]);
        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(&[("query", query)]);
        }
        let body: SearchResponse = request.send().await?.error_for_status()?.json().await?;
        Ok(body.items)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn search(&self, query: &str) -> FormResult<Vec<CatalogItem>> {
        let items = self.fetch_items(Some(query)).await?;
        debug!(query, hits = items.len(), "catalog search");
        Ok(items)
    }

    async fn catalog(&self) -> FormResult<Vec<CatalogItem>> {
        let items = self.fetch_items(None).await?;
        info!(items = items.len(), "catalog fetched");
        Ok(items)
    }

    async fn by_code(&self, code: &str) -> FormResult<Option<CatalogItem>> {
        let url = self.endpoint(&[self.domain.as_str(), "api", "items", "by-code", code]);
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(code, "item code not in catalog");
            return Ok(None);
        }
        let item = response.error_for_status()?.json().await?;
        Ok(Some(item))
    }

    async fn bom_details(&self, bom_id: &str, planned_quantity: f64) -> FormResult<BomDetails> {
        let url = self.endpoint(&["production", "api", "bom", bom_id, "details"]);
        let details: BomDetails = self
            .http
            .get(url)
            .query(&[("planned_quantity", planned_quantity.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!(
            bom = bom_id,
            components = details.components.len(),
            success = details.success,
            "bom details fetched"
        );
        Ok(details)
    }
}
