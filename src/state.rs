use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::external::{PostalClient, QrClient};
use crate::notify::ChangeFeed;
use crate::permission::PermissionEnforcer;
use crate::search::{DbSearchBackend, SearchAggregator};
use crate::theme::{DbThemeRepository, ThemeStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Permission enforcer
    pub perm: PermissionEnforcer,
    /// Application configuration
    pub config: Arc<Config>,
    /// Row change events for order tracking
    pub feed: ChangeFeed,
    pub themes: Arc<ThemeStore>,
    pub search: SearchAggregator,
    pub postal: PostalClient,
    pub qr: QrClient,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, perm: PermissionEnforcer, config: Config) -> Self {
        let feed = ChangeFeed::new(config.notify.feed_capacity);
        let themes = Arc::new(ThemeStore::new(Arc::new(DbThemeRepository::new(db.clone()))));
        let search = SearchAggregator::new(
            Arc::new(DbSearchBackend::new(db.clone())),
            config.search.min_query_len,
        );
        let postal = PostalClient::new(&config.external.postal_url);
        let qr = QrClient::new(&config.external.qr_url, config.external.qr_size);

        Self {
            db,
            perm,
            config: Arc::new(config),
            feed,
            themes,
            search,
            postal,
            qr,
        }
    }

    /// Quiet period before a search-as-you-type query fires
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.config.search.debounce_ms)
    }
}
