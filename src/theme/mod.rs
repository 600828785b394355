//! Per-user display theme
//!
//! The preference is cached in memory and mirrored to one
//! `pos_theme_preference` row per user. Writes check for an existing row and
//! then either insert or update it; the two steps are not atomic.

use async_trait::async_trait;
use dashmap::DashMap;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entity::theme_preference;

/// Stored preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }

    /// Concrete scheme to render with, given the platform's current scheme
    pub fn resolve(self, platform: ColorScheme) -> ColorScheme {
        match self {
            Theme::Light => ColorScheme::Light,
            Theme::Dark => ColorScheme::Dark,
            Theme::System => platform,
        }
    }
}

/// Resolved scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    /// Client hint header carrying the platform scheme
    pub const CLIENT_HINT: &'static str = "sec-ch-prefers-color-scheme";

    /// Read the `Sec-CH-Prefers-Color-Scheme` value; anything but "dark" is light
    pub fn from_client_hint(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().trim_matches('"')) {
            Some(v) if v.eq_ignore_ascii_case("dark") => ColorScheme::Dark,
            _ => ColorScheme::Light,
        }
    }
}

#[async_trait]
pub trait ThemeRepository: Send + Sync {
    async fn find(&self, user_id: i64) -> Result<Option<Theme>, DbErr>;
    async fn insert(&self, user_id: i64, theme: Theme) -> Result<(), DbErr>;
    async fn update(&self, user_id: i64, theme: Theme) -> Result<(), DbErr>;
}

pub struct DbThemeRepository {
    db: Arc<DatabaseConnection>,
}

impl DbThemeRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ThemeRepository for DbThemeRepository {
    async fn find(&self, user_id: i64) -> Result<Option<Theme>, DbErr> {
        let row = theme_preference::Entity::find()
            .filter(theme_preference::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;
        Ok(row.map(|r| Theme::parse(&r.theme).unwrap_or_default()))
    }

    async fn insert(&self, user_id: i64, theme: Theme) -> Result<(), DbErr> {
        theme_preference::ActiveModel {
            user_id: Set(user_id),
            theme: Set(theme.as_str().to_string()),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        Ok(())
    }

    async fn update(&self, user_id: i64, theme: Theme) -> Result<(), DbErr> {
        theme_preference::Entity::update_many()
            .col_expr(theme_preference::Column::Theme, Expr::value(theme.as_str()))
            .col_expr(
                theme_preference::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(theme_preference::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}

pub struct ThemeStore {
    repo: Arc<dyn ThemeRepository>,
    cache: DashMap<i64, Theme>,
}

impl ThemeStore {
    pub fn new(repo: Arc<dyn ThemeRepository>) -> Self {
        Self {
            repo,
            cache: DashMap::new(),
        }
    }

    /// Current preference; falls back to `System` when nothing is stored or
    /// the backend cannot be read
    pub async fn get(&self, user_id: i64) -> Theme {
        if let Some(theme) = self.cache.get(&user_id) {
            return *theme;
        }

        match self.repo.find(user_id).await {
            Ok(found) => {
                let theme = found.unwrap_or_default();
                self.cache.insert(user_id, theme);
                theme
            }
            Err(e) => {
                tracing::error!("Failed to load theme for user {}: {}", user_id, e);
                Theme::default()
            }
        }
    }

    /// Insert or update the backend row; the cache follows only a saved value
    pub async fn set(&self, user_id: i64, theme: Theme) -> Result<(), DbErr> {
        if self.repo.find(user_id).await?.is_some() {
            self.repo.update(user_id, theme).await?;
        } else {
            self.repo.insert(user_id, theme).await?;
        }

        self.cache.insert(user_id, theme);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRepo {
        rows: Mutex<HashMap<i64, Theme>>,
        finds: AtomicUsize,
        inserts: AtomicUsize,
        updates: AtomicUsize,
        read_only: AtomicBool,
    }

    impl FakeRepo {
        fn check_writable(&self) -> Result<(), DbErr> {
            if self.read_only.load(Ordering::SeqCst) {
                return Err(DbErr::Custom("read-only".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ThemeRepository for FakeRepo {
        async fn find(&self, user_id: i64) -> Result<Option<Theme>, DbErr> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().unwrap().get(&user_id).copied())
        }

        async fn insert(&self, user_id: i64, theme: Theme) -> Result<(), DbErr> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.check_writable()?;
            self.rows.lock().unwrap().insert(user_id, theme);
            Ok(())
        }

        async fn update(&self, user_id: i64, theme: Theme) -> Result<(), DbErr> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.check_writable()?;
            self.rows.lock().unwrap().insert(user_id, theme);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_set_inserts() {
        let repo = Arc::new(FakeRepo::default());
        let store = ThemeStore::new(repo.clone());

        store.set(1, Theme::Dark).await.unwrap();

        assert_eq!(repo.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(repo.updates.load(Ordering::SeqCst), 0);
        assert_eq!(store.get(1).await, Theme::Dark);
    }

    #[tokio::test]
    async fn test_existing_row_updates() {
        let repo = Arc::new(FakeRepo::default());
        repo.rows.lock().unwrap().insert(1, Theme::Light);
        let store = ThemeStore::new(repo.clone());

        store.set(1, Theme::System).await.unwrap();

        assert_eq!(repo.inserts.load(Ordering::SeqCst), 0);
        assert_eq!(repo.updates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.rows.lock().unwrap()[&1], Theme::System);
    }

    #[tokio::test]
    async fn test_get_caches_backend_value() {
        let repo = Arc::new(FakeRepo::default());
        repo.rows.lock().unwrap().insert(5, Theme::Dark);
        let store = ThemeStore::new(repo.clone());

        assert_eq!(store.get(5).await, Theme::Dark);
        assert_eq!(store.get(5).await, Theme::Dark);
        assert_eq!(repo.finds.load(Ordering::SeqCst), 1);

        assert_eq!(store.get(6).await, Theme::System);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_saved_theme() {
        let repo = Arc::new(FakeRepo::default());
        repo.rows.lock().unwrap().insert(3, Theme::Light);
        let store = ThemeStore::new(repo.clone());
        assert_eq!(store.get(3).await, Theme::Light);

        repo.read_only.store(true, Ordering::SeqCst);
        assert!(store.set(3, Theme::Dark).await.is_err());
        assert_eq!(store.get(3).await, Theme::Light);

        // a first write that fails leaves nothing cached either
        assert!(store.set(4, Theme::Dark).await.is_err());
        assert_eq!(store.get(4).await, Theme::System);
    }

    #[test]
    fn test_resolve_system_follows_platform() {
        assert_eq!(Theme::System.resolve(ColorScheme::Dark), ColorScheme::Dark);
        assert_eq!(Theme::System.resolve(ColorScheme::Light), ColorScheme::Light);
        assert_eq!(Theme::Light.resolve(ColorScheme::Dark), ColorScheme::Light);
        assert_eq!(Theme::Dark.resolve(ColorScheme::Light), ColorScheme::Dark);
    }

    #[test]
    fn test_client_hint_parsing() {
        assert_eq!(ColorScheme::from_client_hint(Some("dark")), ColorScheme::Dark);
        assert_eq!(ColorScheme::from_client_hint(Some("\"dark\"")), ColorScheme::Dark);
        assert_eq!(ColorScheme::from_client_hint(Some("light")), ColorScheme::Light);
        assert_eq!(ColorScheme::from_client_hint(None), ColorScheme::Light);
    }
}
