use std::sync::Arc;

use crate::{
    config::Config, database::SignageDatabase, infrastructure::digest_store::DigestStore,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SignageDatabase>,
    pub digests: Arc<DigestStore>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let database = SignageDatabase::new(&config.database.url).await?;
        database.init().await?;

        Ok(Self {
            db: Arc::new(database),
            digests: Arc::new(DigestStore::new(config.digest_cache.capacity)),
            config,
        })
    }
}
