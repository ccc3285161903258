use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::model::site::Site;
use crate::store::{SiteStore, StoreError};

/// Read-through cache of site configuration.
///
/// Built once at start-up and shared through `AppState`; clones share the
/// same underlying cache.
#[derive(Clone)]
pub struct SiteCache {
    cache: Cache<u64, Arc<Site>>,
    store: Arc<dyn SiteStore>,
}

impl SiteCache {
    pub fn new(store: Arc<dyn SiteStore>, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { cache, store }
    }

    /// Unknown sites are not cached, so a site created later is seen on the
    /// next lookup.
    pub async fn get(&self, site_id: u64) -> Result<Option<Arc<Site>>, StoreError> {
        if let Some(site) = self.cache.get(&site_id).await {
            return Ok(Some(site));
        }

        let Some(site) = self.store.find_site(site_id).await? else {
            return Ok(None);
        };

        let site = Arc::new(site);
        self.cache.insert(site_id, site.clone()).await;
        Ok(Some(site))
    }

    pub async fn put(&self, site: Site) {
        self.cache.insert(site.id, Arc::new(site)).await;
    }

    pub async fn invalidate(&self, site_id: u64) {
        self.cache.invalidate(&site_id).await;
    }

    /// Loads every site into the cache.
    pub async fn warmup(&self) -> Result<usize, StoreError> {
        let sites = self.store.list_sites().await?;
        let total = sites.len();

        let inserts: Vec<_> = sites
            .into_iter()
            .map(|site| self.cache.insert(site.id, Arc::new(site)))
            .collect();
        futures::future::join_all(inserts).await;

        tracing::info!(total, "Site cache warmup complete");
        Ok(total)
    }
}
