//! Product catalog and search.
//!
//! The full catalog is cached with `moka` so that cart merges, search
//! fallbacks, and repeated listings share one snapshot until the TTL lapses.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, instrument};

use qkart_core::Product;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::error::Result;

const CATALOG_KEY: &str = "products";

/// Result of a product search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Products to display.
    pub products: Vec<Product>,
    /// Backend message to show alongside the products, when the search
    /// failed and the unfiltered catalog is shown instead.
    pub notice: Option<String>,
}

impl SearchOutcome {
    fn found(products: Vec<Product>) -> Self {
        Self {
            products,
            notice: None,
        }
    }
}

/// Catalog access with an in-memory product cache.
#[derive(Clone)]
pub struct CatalogService {
    api: ApiClient,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("api", &self.api)
            .field("cached", &self.cache.contains_key(CATALOG_KEY))
            .finish()
    }
}

impl CatalogService {
    /// Create a catalog service.
    #[must_use]
    pub fn new(api: ApiClient, config: &StorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_cache_ttl)
            .build();
        Self { api, cache }
    }

    /// The full product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is not cached and cannot be fetched.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(products) = self.cache.get(CATALOG_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let products = Arc::new(self.api.products().await?);
        self.cache.insert(CATALOG_KEY, Arc::clone(&products)).await;
        Ok(products)
    }

    /// Drop the cached catalog so the next call refetches it.
    pub async fn invalidate(&self) {
        self.cache.invalidate(CATALOG_KEY).await;
    }

    /// Search the catalog.
    ///
    /// - A blank query returns the full catalog.
    /// - A 404 from the backend means no matches and yields an empty list.
    /// - A 5xx yields the unfiltered catalog together with the backend's
    ///   message as a notice.
    ///
    /// # Errors
    ///
    /// Returns an error for any other failure, or if the fallback catalog
    /// cannot be fetched.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchOutcome::found(self.products().await?.to_vec()));
        }

        match self.api.search_products(query).await {
            Ok(products) => Ok(SearchOutcome::found(products)),
            Err(e) if e.is_not_found() => {
                debug!("No products matched");
                Ok(SearchOutcome::found(Vec::new()))
            }
            Err(ApiError::Server { message, .. }) => {
                tracing::warn!(%message, "Search failed, falling back to full catalog");
                Ok(SearchOutcome {
                    products: self.products().await?.to_vec(),
                    notice: Some(message),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
