//! Conexión a PostgreSQL
//!
//! Crea el pool y aplica las migraciones de `migrations/` al arrancar.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::database::PoolConfig;

/// Conectar y migrar
pub async fn connect(database_url: &str, pool_config: &PoolConfig) -> Result<PgPool> {
    info!(
        "🗄️ Conectando a {} (pool {}..{})",
        mask_database_url(database_url),
        pool_config.min_connections,
        pool_config.max_connections
    );

    let pool = pool_config
        .pool_options()
        .connect(database_url)
        .await
        .context("no se pudo conectar a PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("error aplicando migraciones")?;

    info!("✅ Base de datos lista");
    Ok(pool)
}

/// Enmascara las credenciales de la URL para los logs
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
