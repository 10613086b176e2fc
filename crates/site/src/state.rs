//! Application state shared across handlers.

use std::sync::Arc;

use aitoonic_core::{CategoryWithCount, DataStore};
use moka::future::Cache;

use crate::config::SiteConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    store: Arc<dyn DataStore>,
    /// Category browser result; `None` when caching is disabled.
    browser_cache: Option<Cache<(), Arc<[CategoryWithCount]>>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: SiteConfig, store: Arc<dyn DataStore>) -> Self {
        let browser_cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                browser_cache,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the data store.
    #[must_use]
    pub fn store(&self) -> &dyn DataStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn browser_cache(&self) -> Option<&Cache<(), Arc<[CategoryWithCount]>>> {
        self.inner.browser_cache.as_ref()
    }
}
