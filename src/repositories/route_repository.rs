use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::RouteRepository;
use crate::models::{CompletionKind, Route, RouteEvent, RouteFilter, RouteStatus, Stop};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Fila de la tabla routes; las paradas y la auditoría van en JSONB
#[derive(Debug, sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    route_number: i32,
    agent_id: Uuid,
    agent_name: String,
    route_date: NaiveDate,
    status: RouteStatus,
    estimated_duration_minutes: i32,
    stops: Json<Vec<Stop>>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    total_pickups: i32,
    total_deliveries: i32,
    completion_kind: Option<Json<CompletionKind>>,
    audit_trail: Json<Vec<RouteEvent>>,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Self {
            id: row.id,
            route_number: row.route_number,
            agent_id: row.agent_id,
            agent_name: row.agent_name,
            route_date: row.route_date,
            status: row.status,
            estimated_duration_minutes: row.estimated_duration_minutes,
            stops: row.stops.0,
            created_at: row.created_at,
            started_at: row.started_at,
            ended_at: row.ended_at,
            total_pickups: row.total_pickups,
            total_deliveries: row.total_deliveries,
            completion_kind: row.completion_kind.map(|kind| kind.0),
            audit_trail: row.audit_trail.0,
        }
    }
}

const ROUTE_COLUMNS: &str = "id, route_number, agent_id, agent_name, route_date, status, estimated_duration_minutes, \
    stops, created_at, started_at, ended_at, total_pickups, total_deliveries, completion_kind, audit_trail";

pub struct PgRouteRepository {
    pool: PgPool,
}

impl PgRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RouteRepository for PgRouteRepository {
    async fn list_routes(&self, filter: &RouteFilter) -> AppResult<Vec<Route>> {
        let query = format!(
            r#"
            SELECT {}
            FROM routes
            WHERE ($1::date IS NULL OR route_date = $1)
            AND ($2::uuid IS NULL OR agent_id = $2)
            AND ($3::route_status IS NULL OR status = $3)
            ORDER BY route_date, route_number
            "#,
            ROUTE_COLUMNS
        );

        let rows = sqlx::query_as::<_, RouteRow>(&query)
            .bind(filter.date)
            .bind(filter.agent_id)
            .bind(filter.status)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn get_route(&self, id: Uuid) -> AppResult<Route> {
        let query = format!("SELECT {} FROM routes WHERE id = $1", ROUTE_COLUMNS);

        sqlx::query_as::<_, RouteRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Route::from)
            .ok_or_else(|| not_found_error("Route", id))
    }

    async fn insert_route(&self, route: &Route) -> AppResult<()> {
        let query = format!(
            r#"
            INSERT INTO routes ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
            ROUTE_COLUMNS
        );

        sqlx::query(&query)
            .bind(route.id)
            .bind(route.route_number)
            .bind(route.agent_id)
            .bind(&route.agent_name)
            .bind(route.route_date)
            .bind(route.status)
            .bind(route.estimated_duration_minutes)
            .bind(Json(&route.stops))
            .bind(route.created_at)
            .bind(route.started_at)
            .bind(route.ended_at)
            .bind(route.total_pickups)
            .bind(route.total_deliveries)
            .bind(route.completion_kind.as_ref().map(Json))
            .bind(Json(&route.audit_trail))
            .execute(&self.pool)
            .await
            .map_err(|e| route_write_error(e, route))?;

        Ok(())
    }

    async fn update_route(&self, route: &Route) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE routes
            SET status = $2, stops = $3, started_at = $4, ended_at = $5,
                completion_kind = $6, audit_trail = $7
            WHERE id = $1
            "#,
        )
        .bind(route.id)
        .bind(route.status)
        .bind(Json(&route.stops))
        .bind(route.started_at)
        .bind(route.ended_at)
        .bind(route.completion_kind.as_ref().map(Json))
        .bind(Json(&route.audit_trail))
        .execute(&self.pool)
        .await
        .map_err(|e| route_write_error(e, route))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Route", route.id));
        }
        Ok(())
    }

    async fn delete_routes(&self, date: NaiveDate) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM routes WHERE route_date = $1")
            .bind(date)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn route_write_error(error: sqlx::Error, route: &Route) -> AppError {
    match error {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict(format!(
            "Route {} for agent {} on {} collides with an existing route",
            route.route_number, route.agent_id, route.route_date
        )),
        other => AppError::Database(other),
    }
}
