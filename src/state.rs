use std::sync::Arc;

use actix_web::web::Data;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    broadcast::Broadcaster,
    config::{Config, StoreBackend},
    db::init_db,
    routes::Limiters,
    store::Stores,
    utils::username_index::UsernameIndex,
};

/// Everything the HTTP workers share. Built once, cloned into each worker's `App`.
#[derive(Clone)]
pub struct AppState {
    pub config: Data<Config>,
    pub stores: Data<Stores>,
    pub broadcaster: Data<Broadcaster>,
    pub usernames: Data<UsernameIndex>,
    pub limiters: Limiters,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Result<Self> {
        let limiters = Limiters::from_config(&config)?;
        Ok(Self {
            broadcaster: Data::new(Broadcaster::new(config.broadcast_capacity)),
            usernames: Data::new(UsernameIndex::default()),
            stores: Data::new(stores),
            config: Data::new(config),
            limiters,
        })
    }

    /// Builds the stores the config asks for and the state around them.
    pub async fn from_config(config: Config) -> Result<Self> {
        let stores = match config.store {
            StoreBackend::Mysql => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set when STORE=mysql")?;
                let pool = init_db(url, config.db_max_connections)
                    .await
                    .context("Failed to connect to database")?;
                Stores::mysql(pool)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory stores; records are lost on restart");
                Stores::in_memory()
            }
        };
        info!(store = %config.store, "Stores ready");

        Self::new(config, stores)
    }

    /// Fills the username index from the user store in the background.
    pub fn spawn_username_warmup(&self, batch_size: usize) {
        let users = Arc::clone(&self.stores.users);
        let index = self.usernames.clone();

        actix_web::rt::spawn(async move {
            if let Err(e) = index.warmup(users.as_ref(), batch_size).await {
                tracing::error!(error = %e, "Failed to warmup username index");
            }
        });
    }
}
