use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{Api, Settings};
use chrono::TimeDelta;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub token_service: Arc<dyn TokenService>,
    pub api: Api,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let algorithm = settings.jwt.algorithm()?;

        let mut pool = None;
        let credential_store: Arc<dyn CredentialStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryCredentialStore::new()),
            "redis" => {
                let dsn = settings
                    .store
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.redis_dsn is required"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisCredentialStore::new(
                    redis_manager,
                    settings.store.prefix.clone(),
                ))
            }
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.mysql_dsn is required"))?;
                let mysql_pool = Pool::<MySql>::connect(dsn).await?;
                pool = Some(mysql_pool.clone());
                Arc::new(MySqlCredentialStore::new(mysql_pool))
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };
        info!(backend = %settings.store.backend, "credential store ready");

        let secret_hasher: Arc<dyn SecretHasher> = Arc::new(
            Argon2SecretHasher::new(
                settings.hasher.memory_kib,
                settings.hasher.iterations,
                settings.hasher.parallelism,
            )
            .map_err(|e| anyhow::anyhow!(e))?,
        );

        let access_ttl = TimeDelta::try_seconds(settings.jwt.access_ttl_secs)
            .ok_or_else(|| anyhow::anyhow!("jwt.access_ttl_secs is out of range"))?;
        let refresh_ttl = TimeDelta::try_seconds(settings.jwt.refresh_ttl_secs)
            .ok_or_else(|| anyhow::anyhow!("jwt.refresh_ttl_secs is out of range"))?;

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHmacCodec::new(JwtConfig {
            algorithm,
            access_secret: settings.jwt.access_secret.clone().into_bytes(),
            refresh_secret: settings.jwt.refresh_secret.clone().into_bytes(),
            access_ttl,
            refresh_ttl,
            leeway: settings.jwt.leeway_secs,
        }));

        let token_service: Arc<dyn TokenService> = Arc::new(RealTokenService::new(
            credential_store,
            secret_hasher,
            token_codec,
        ));

        let mut server = Self::new(token_service, settings.api.clone());
        server.pool = pool;

        info!("server started");
        Ok(server)
    }

    pub fn new(token_service: Arc<dyn TokenService>, api: Api) -> Self {
        Self {
            token_service,
            api,
            cancel: CancellationToken::new(),
            pool: None,
        }
    }

    /// Cancellation handle for one request; fires when the server shuts down.
    pub fn request_cancel(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}
