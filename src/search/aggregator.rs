use futures::future::try_join_all;
use sea_orm::DbErr;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::backend::SearchBackend;

/// Searchable collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    MenuItem,
    Order,
    Category,
    Customer,
    Supplier,
    Table,
    Inventory,
    Coupon,
    Profile,
}

impl SearchKind {
    /// Every collection, in the order hits are returned
    pub const ALL: [SearchKind; 9] = [
        SearchKind::MenuItem,
        SearchKind::Order,
        SearchKind::Category,
        SearchKind::Customer,
        SearchKind::Supplier,
        SearchKind::Table,
        SearchKind::Inventory,
        SearchKind::Coupon,
        SearchKind::Profile,
    ];

    /// Row cap for this collection
    pub fn limit(&self) -> u64 {
        match self {
            SearchKind::MenuItem | SearchKind::Order | SearchKind::Customer => 5,
            _ => 3,
        }
    }

    /// Client-side navigation target for a hit
    pub fn route(&self, id: i64) -> String {
        match self {
            SearchKind::MenuItem => format!("/menu?item={}", id),
            SearchKind::Order => format!("/orders/{}", id),
            SearchKind::Category => format!("/menu?category={}", id),
            SearchKind::Customer => format!("/customers/{}", id),
            SearchKind::Supplier => format!("/suppliers/{}", id),
            SearchKind::Table => format!("/tables/{}", id),
            SearchKind::Inventory => format!("/inventory/{}", id),
            SearchKind::Coupon => format!("/coupons/{}", id),
            SearchKind::Profile => format!("/users/{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub route: String,
}

impl SearchHit {
    pub fn new(kind: SearchKind, id: i64, title: impl Into<String>, subtitle: Option<String>) -> Self {
        Self {
            kind,
            id,
            title: title.into(),
            subtitle,
            route: kind.route(id),
        }
    }
}

/// Results of one search, tagged with the query that produced them
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{kind:?} lookup failed: {source}")]
    Lookup {
        kind: SearchKind,
        #[source]
        source: DbErr,
    },
}

#[derive(Clone)]
pub struct SearchAggregator {
    backend: Arc<dyn SearchBackend>,
    min_len: usize,
}

impl SearchAggregator {
    pub fn new(backend: Arc<dyn SearchBackend>, min_len: usize) -> Self {
        Self { backend, min_len }
    }

    /// Run a search; any failed lookup clears the whole result to empty.
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        match self.try_search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!("Search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Run a search, surfacing the first failed lookup.
    ///
    /// Queries shorter than the minimum length return no hits without
    /// touching the backend.
    pub async fn try_search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let query = query.trim();
        if query.chars().count() < self.min_len {
            return Ok(Vec::new());
        }

        let lookups = SearchKind::ALL
            .iter()
            .map(|kind| self.backend.lookup(*kind, query, kind.limit()));
        let batches = try_join_all(lookups).await?;

        Ok(batches.into_iter().flatten().collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns two hits per collection and records every call
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub calls: Mutex<Vec<(SearchKind, String, u64)>>,
        pub failing: Option<SearchKind>,
    }

    impl FakeBackend {
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        async fn lookup(
            &self,
            kind: SearchKind,
            query: &str,
            limit: u64,
        ) -> Result<Vec<SearchHit>, SearchError> {
            self.calls.lock().unwrap().push((kind, query.to_string(), limit));
            if self.failing == Some(kind) {
                return Err(SearchError::Lookup {
                    kind,
                    source: DbErr::Custom("timeout".into()),
                });
            }
            Ok(vec![
                SearchHit::new(kind, 1, format!("{query} one"), None),
                SearchHit::new(kind, 2, format!("{query} two"), None),
            ])
        }
    }

    #[tokio::test]
    async fn test_short_query_never_calls_backend() {
        let backend = Arc::new(FakeBackend::default());
        let agg = SearchAggregator::new(backend.clone(), 2);

        assert!(agg.search("").await.is_empty());
        assert!(agg.search("p").await.is_empty());
        assert!(agg.search("  q  ").await.is_empty());
        assert!(agg.search("é").await.is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_issues_nine_lookups_in_fixed_order() {
        let backend = Arc::new(FakeBackend::default());
        let agg = SearchAggregator::new(backend.clone(), 2);

        let hits = agg.search(" pi ").await;

        let calls = backend.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 9);
        assert!(calls.iter().all(|(_, q, _)| q == "pi"));

        assert_eq!(hits.len(), 18);
        let kinds: Vec<SearchKind> = hits.iter().map(|h| h.kind).step_by(2).collect();
        assert_eq!(kinds, SearchKind::ALL.to_vec());
        assert_eq!(hits[0].route, "/menu?item=1");
        assert_eq!(hits[3].route, "/orders/2");
    }

    #[tokio::test]
    async fn test_row_caps() {
        let backend = Arc::new(FakeBackend::default());
        let agg = SearchAggregator::new(backend.clone(), 2);
        agg.search("burger").await;

        for (kind, _, limit) in backend.calls.lock().unwrap().iter() {
            assert!((3..=5).contains(limit), "{kind:?}");
            assert_eq!(*limit, kind.limit());
        }
    }

    #[tokio::test]
    async fn test_single_failure_clears_results() {
        let backend = Arc::new(FakeBackend {
            failing: Some(SearchKind::Supplier),
            ..Default::default()
        });
        let agg = SearchAggregator::new(backend.clone(), 2);

        assert!(agg.search("pizza").await.is_empty());
        assert!(matches!(
            agg.try_search("pizza").await,
            Err(SearchError::Lookup { kind: SearchKind::Supplier, .. })
        ));
    }
}
