use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use super::matcher;
use super::recommend::{recommend, Recommendation};
use super::repo::{ProductSource, StaticCatalog};
use super::repo_types::{CalorieCategory, Product};
use crate::store::with_timeout;

/// Product lookups with the static catalog as the fallback for any remote failure.
pub struct CatalogService {
    remote: Arc<dyn ProductSource>,
    fallback: StaticCatalog,
    timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<Product>,
    pub recommendation: Recommendation,
}

impl CatalogService {
    pub fn new(remote: Arc<dyn ProductSource>, timeout: Duration) -> Self {
        Self {
            remote,
            fallback: StaticCatalog,
            timeout,
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> SearchOutcome {
        if query.trim().is_empty() {
            return SearchOutcome {
                results: Vec::new(),
                recommendation: Recommendation::default(),
            };
        }
        let candidates = match with_timeout(self.timeout, self.remote.search(query, limit)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "remote product search failed; using static catalog");
                self.fallback_all().await
            }
        };
        let results = matcher::search(query, &candidates, limit);
        let recommendation = recommend(&results);
        SearchOutcome {
            results,
            recommendation,
        }
    }

    pub async fn list_all(&self) -> Vec<Product> {
        match with_timeout(self.timeout, self.remote.list_all()).await {
            Ok(all) => all,
            Err(e) => {
                warn!(error = %e, "remote product list failed; using static catalog");
                self.fallback_all().await
            }
        }
    }

    pub async fn list_by_brand(&self, brand: &str) -> Vec<Product> {
        match with_timeout(self.timeout, self.remote.list_by_brand(brand)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, %brand, "remote brand lookup failed; using static catalog");
                self.fallback.list_by_brand(brand).await.unwrap_or_default()
            }
        }
    }

    pub async fn list_by_category(&self, category: CalorieCategory) -> Vec<Product> {
        match with_timeout(self.timeout, self.remote.list_by_category(category)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, %category, "remote category lookup failed; using static catalog");
                self.fallback.list_by_category(category).await.unwrap_or_default()
            }
        }
    }

    /// Finds a product by id in whichever catalog answers.
    pub async fn find(&self, id: &str) -> Option<Product> {
        self.list_all().await.into_iter().find(|p| p.id == id)
    }

    async fn fallback_all(&self) -> Vec<Product> {
        self.fallback.list_all().await.unwrap_or_default()
    }
}

/// Per-user search sequence numbers. A search result may only be shown if no newer
/// search was issued by the same user while it was in flight.
///
/// Holds one `u64` per user that has ever searched since startup; entries are not
/// evicted, so memory grows with the number of distinct users, not with searches.
#[derive(Default)]
pub struct SearchSequencer {
    latest: Mutex<HashMap<Uuid, u64>>,
}

impl SearchSequencer {
    /// Registers a new search and returns its sequence number.
    ///
    /// `Err(seq)` means the request is stale on arrival: a client-supplied `seq`
    /// older than the latest one, or equal to it (already taken by another
    /// request). The counter never moves back.
    pub fn issue(&self, user_id: Uuid, client_seq: Option<u64>) -> Result<u64, u64> {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        let current = latest.entry(user_id).or_insert(0);
        let seq = match client_seq {
            Some(s) if s <= *current => return Err(s),
            Some(s) => s,
            None => *current + 1,
        };
        *current = seq;
        Ok(seq)
    }

    pub fn is_current(&self, user_id: Uuid, seq: u64) -> bool {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.get(&user_id).is_some_and(|&l| l == seq)
    }
}
