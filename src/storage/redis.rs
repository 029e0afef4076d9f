//! Redis backend on a `deadpool-redis` connection pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands, RedisError};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, PoolError, Runtime};
use tracing::debug;
use url::Url;

use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::storage::traits::KvBackend;

/// Pooled Redis client.
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Build the connection pool. No connection is opened until first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot form a valid connection URL or
    /// the pool cannot be created.
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let url = connection_url(config)?;

        let mut pool_config = PoolConfig::new(config.pool_size);
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        pool_config.timeouts.wait = Some(connect_timeout);
        pool_config.timeouts.create = Some(connect_timeout);
        pool_config.timeouts.recycle = Some(connect_timeout);

        let mut redis_config = Config::from_url(url.as_str());
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        debug!(
            address = %config.address,
            db = config.db,
            pool_size = config.pool_size,
            "Redis pool created"
        );

        Ok(Self { pool })
    }

    async fn connection(&self) -> BackendResult<Connection> {
        self.pool.get().await.map_err(map_pool_error)
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> BackendResult<u64> {
        let mut conn = self.connection().await?;
        conn.del::<_, u64>(key).await.map_err(map_redis_error)
    }

    async fn health_check(&self) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_redis_error)
    }

    async fn close(&self) -> BackendResult<()> {
        self.pool.close();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Build `redis://[:password@]host:port/db` from configuration.
fn connection_url(config: &BackendConfig) -> BackendResult<Url> {
    let mut url = Url::parse(&format!("redis://{}", config.address))
        .map_err(|e| BackendError::Connection(format!("invalid address {}: {e}", config.address)))?;

    if let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) {
        url.set_password(Some(password))
            .map_err(|()| BackendError::Connection("cannot set password".to_string()))?;
    }
    url.set_path(&format!("/{}", config.db));

    Ok(url)
}

fn map_pool_error(err: PoolError) -> BackendError {
    match err {
        PoolError::Backend(e) => map_redis_error(e),
        PoolError::Closed => BackendError::Closed,
        other => BackendError::Pool(other.to_string()),
    }
}

fn map_redis_error(err: RedisError) -> BackendError {
    if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
        BackendError::Connection(err.to_string())
    } else {
        BackendError::Command(err.to_string())
    }
}
