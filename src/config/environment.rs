//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;

use super::database::PoolConfig;
use super::planning::{PlanningConfig, DEFAULT_MINUTES_PER_STOP};

/// Backend de persistencia
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub pool: PoolConfig,
    pub cors_origins: Vec<String>,
    pub planning: PlanningConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            storage: StorageBackend::Memory,
            database_url: None,
            pool: PoolConfig::default(),
            cors_origins: Vec::new(),
            planning: PlanningConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(value) => value.parse().context("PORT must be a valid number")?,
            Err(_) => defaults.port,
        };

        let storage = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("postgres") => StorageBackend::Postgres,
            Ok("memory") | Err(_) => StorageBackend::Memory,
            Ok(other) => return Err(anyhow!("STORAGE_BACKEND desconocido: {}", other)),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE_BACKEND=postgres"));
        }

        let minutes_per_stop = match env::var("ROUTE_MINUTES_PER_STOP") {
            Ok(value) => value.parse().context("ROUTE_MINUTES_PER_STOP must be a valid number")?,
            Err(_) => DEFAULT_MINUTES_PER_STOP,
        };

        let day_start = match env::var("ROUTE_DAY_START") {
            Ok(value) => NaiveTime::parse_from_str(&value, "%H:%M")
                .context("ROUTE_DAY_START must use HH:MM")?,
            Err(_) => defaults.planning.day_start,
        };

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port,
            host: env::var("HOST").unwrap_or(defaults.host),
            storage,
            database_url,
            pool: PoolConfig::from_env()?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            planning: PlanningConfig { minutes_per_stop, day_start },
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
