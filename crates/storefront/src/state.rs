//! Shared application state.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::services::{
    AddressBook, AuthService, CartService, CatalogService, CheckoutService, SearchDebouncer,
    SearchResult,
};
use crate::session::{FileSessionStore, SessionContext, SessionError};

/// Application state shared across the front end.
///
/// This struct is cheaply cloneable via `Arc` and hands out the services,
/// which all share one API client and one catalog cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    catalog: CatalogService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let catalog = CatalogService::new(api.clone(), &config);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                catalog,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Load the session persisted at the configured path.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file exists but cannot be read.
    pub fn session(&self) -> Result<SessionContext, SessionError> {
        SessionContext::init(FileSessionStore::new(&self.inner.config.session_path))
    }

    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.inner.api.clone())
    }

    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(self.inner.api.clone(), self.inner.catalog.clone())
    }

    #[must_use]
    pub fn addresses(&self) -> AddressBook {
        AddressBook::new(self.inner.api.clone())
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(self.inner.api.clone())
    }

    /// Start a search debouncer over the shared catalog, using the
    /// configured window.
    #[must_use]
    pub fn search_debouncer(
        &self,
    ) -> (SearchDebouncer, tokio::sync::mpsc::UnboundedReceiver<SearchResult>) {
        SearchDebouncer::spawn(self.inner.catalog.clone(), self.inner.config.search_debounce)
    }
}
