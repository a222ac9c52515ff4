use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AgentDirectory, HotelDirectory};
use crate::models::{Agent, Hotel};
use crate::utils::errors::{not_found_error, AppResult};

/// Directorio de hoteles y repartidores (solo lectura)
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HotelDirectory for PgDirectory {
    async fn get_hotel(&self, id: Uuid) -> AppResult<Hotel> {
        sqlx::query_as::<_, Hotel>("SELECT id, name, zone, address, price_per_kg FROM hotels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found_error("Hotel", id))
    }
}

#[async_trait]
impl AgentDirectory for PgDirectory {
    async fn list_active_agents(&self, zone: Option<&str>) -> AppResult<Vec<Agent>> {
        let agents = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, name, zone, active
            FROM agents
            WHERE active AND ($1::text IS NULL OR zone = $1)
            ORDER BY name, id
            "#,
        )
        .bind(zone)
        .fetch_all(&self.pool)
        .await?;

        Ok(agents)
    }

    async fn get_agent(&self, id: Uuid) -> AppResult<Agent> {
        sqlx::query_as::<_, Agent>("SELECT id, name, zone, active FROM agents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found_error("Agent", id))
    }
}
