use std::sync::Arc;
use crate::{
    config::{AuthConfig, Config},
    error::AppResult,
    infrastructure::{
        database::ContentStore,
        middleware::HasViewerSource,
        sqlite_database::SqliteDatabase,
    },
    paginator::Paginator,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub paginator: Paginator,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        config.validate()?;
        let database = SqliteDatabase::connect(&config.database).await?;
        Ok(Self::with_store(Arc::new(database), config))
    }

    /// Build state around an already-open store.
    pub fn with_store(store: Arc<dyn ContentStore>, config: Config) -> Self {
        let paginator = Paginator::new(config.pagination.posts_per_page);
        Self {
            store,
            paginator,
            config,
        }
    }
}

impl HasViewerSource for AppState {
    fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    fn auth_config(&self) -> &AuthConfig {
        &self.config.auth
    }
}
