use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// Database pool configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection
    pub acquire_timeout: Duration,
    /// Maximum idle time before a connection is closed
    pub idle_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(1800), // 30 minutes
        }
    }
}

impl PoolConfig {
    /// Overrides defaults with `DB_*` settings. Unparseable values are
    /// ignored.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let number = |key: &str| get(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(n) = number("DB_MAX_CONNECTIONS").and_then(|n| u32::try_from(n).ok()) {
            config.max_connections = n;
        }
        if let Some(n) = number("DB_MIN_CONNECTIONS").and_then(|n| u32::try_from(n).ok()) {
            config.min_connections = n;
        }
        if let Some(n) = number("DB_ACQUIRE_TIMEOUT") {
            config.acquire_timeout = Duration::from_secs(n);
        }
        if let Some(n) = number("DB_IDLE_TIMEOUT") {
            config.idle_timeout = Duration::from_secs(n);
        }
        if let Some(n) = number("DB_MAX_LIFETIME") {
            config.max_lifetime = Duration::from_secs(n);
        }

        config.max_connections = config.max_connections.max(1);
        config.min_connections = config.min_connections.min(config.max_connections);
        config
    }
}

/// Create a database connection pool
pub async fn create_pool(database_url: &str, config: &PoolConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    tracing::info!(
        max = config.max_connections,
        min = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        "Database pool created"
    );

    Ok(pool)
}

/// Creates the `opportunity` table on development databases.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get pool statistics
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub in_use: u32,
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    let idle = pool.num_idle() as u32;
    PoolStats {
        size: pool.size(),
        idle,
        in_use: pool.size().saturating_sub(idle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_pool_defaults() {
        let config = PoolConfig::from_lookup(lookup(&[]));
        assert_eq!(config, PoolConfig::default());
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 0);
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_pool_overrides() {
        let config = PoolConfig::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_MIN_CONNECTIONS", "8"),
            ("DB_ACQUIRE_TIMEOUT", "5"),
            ("DB_MAX_LIFETIME", "not-a-number"),
        ]));
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.min_connections, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.max_lifetime, Duration::from_secs(1800));
    }

    #[test]
    fn test_oversized_connection_counts_are_ignored() {
        let config = PoolConfig::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "4294967297"),
            ("DB_MIN_CONNECTIONS", "4294967296"),
        ]));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 0);
    }
}
