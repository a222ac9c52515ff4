//! Configuración del pool de PostgreSQL
//!
//! Los límites del pool se leen de `DB_*`; cualquier variable ausente usa
//! el valor por defecto.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgPoolOptions;

/// Límites del pool de conexiones
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
        }
    }
}

impl PoolConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de consulta de variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(value) => value.trim().parse().with_context(|| format!("{} must be a valid number", key)),
                None => Ok(default),
            }
        };

        let config = Self {
            max_connections: number("DB_MAX_CONNECTIONS", defaults.max_connections.into())? as u32,
            min_connections: number("DB_MIN_CONNECTIONS", defaults.min_connections.into())? as u32,
            acquire_timeout: Duration::from_secs(number("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout.as_secs())?),
            idle_timeout: Duration::from_secs(number("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout.as_secs())?),
            max_lifetime: Duration::from_secs(number("DB_MAX_LIFETIME_SECS", defaults.max_lifetime.as_secs())?),
        };

        if config.max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        if config.min_connections > config.max_connections {
            bail!(
                "DB_MIN_CONNECTIONS ({}) cannot exceed DB_MAX_CONNECTIONS ({})",
                config.min_connections,
                config.max_connections
            );
        }
        Ok(config)
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}
