use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::MySqlPool;
use std::sync::Arc;

pub struct Server {
    pub user_service: Arc<dyn UserService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let server = match settings.store.backend.as_str() {
            "memory" => Self::in_memory(),
            "mysql" => {
                let dsn = settings
                    .store
                    .dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.dsn is required for mysql"))?;
                let tx_manager =
                    MySqlTxManager::connect(dsn, settings.store.max_connections).await?;
                let pool = tx_manager.pool().clone();
                if settings.store.migrate {
                    MIGRATOR.run(&pool).await?;
                    info!("migrations applied");
                }

                Self::with_store(
                    Arc::new(MySqlUserRepo::new()),
                    Arc::new(MySqlFriendRequestRepo::new()),
                    Arc::new(tx_manager),
                    Some(pool),
                )
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        info!(backend = %settings.store.backend, "server started");
        Ok(server)
    }

    /// A server backed by a fresh process-local store.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_store(
            Arc::new(MemoryUserRepo::new()),
            Arc::new(MemoryFriendRequestRepo::new()),
            Arc::new(MemoryTxManager::new(store)),
            None,
        )
    }

    fn with_store(
        user_repo: Arc<dyn UserRepo>,
        friend_request_repo: Arc<dyn FriendRequestRepo>,
        tx_manager: Arc<dyn TxManager>,
        pool: Option<MySqlPool>,
    ) -> Self {
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(
            user_repo.clone(),
            friend_request_repo.clone(),
            tx_manager.clone(),
        ));
        let relationship_service: Arc<dyn RelationshipService> = Arc::new(
            RealRelationshipService::new(user_repo, friend_request_repo, tx_manager),
        );

        Self {
            user_service,
            relationship_service,
            pool,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
