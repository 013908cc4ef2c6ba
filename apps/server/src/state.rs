//! Shared application state.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::db::PgAcademyStore;
use crate::search::SearchEngine;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<PgAcademyStore>,
    pub engine: Arc<SearchEngine<PgAcademyStore>>,
}

impl AppState {
    /// Connect the pool, run migrations, and wire up the engine.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let store = Arc::new(PgAcademyStore::new(pool));
        let engine = Arc::new(SearchEngine::new(store.clone(), config.search.clone()));

        Ok(Self {
            config: Arc::new(config),
            store,
            engine,
        })
    }
}
