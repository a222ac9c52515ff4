use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ServiceRepository;
use crate::models::{Service, ServiceFilter, ServiceStatus};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

const SERVICE_COLUMNS: &str = "id, hotel_id, zone, guest_name, room_number, bag_count, weight, priority, status, \
    pickup_agent_id, delivery_agent_id, created_at, pickup_date, labeling_date, delivery_date, \
    delivered_bag_count, delivery_percentage, price, observations, label_photos, cancellation_reason, version";

pub struct PgServiceRepository {
    pool: PgPool,
}

impl PgServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    async fn list_services(&self, filter: &ServiceFilter) -> AppResult<Vec<Service>> {
        let query = format!(
            r#"
            SELECT {}
            FROM services
            WHERE ($1::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date = $1)
            AND ($2::text IS NULL OR zone = $2)
            AND ($3::uuid IS NULL OR pickup_agent_id = $3 OR delivery_agent_id = $3)
            AND ($4::service_status[] IS NULL OR status = ANY($4))
            ORDER BY created_at, id
            "#,
            SERVICE_COLUMNS
        );

        let services = sqlx::query_as::<_, Service>(&query)
            .bind(filter.date)
            .bind(filter.zone.as_deref())
            .bind(filter.agent_id)
            .bind(filter.statuses.clone())
            .fetch_all(&self.pool)
            .await?;

        Ok(services)
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Service> {
        let query = format!("SELECT {} FROM services WHERE id = $1", SERVICE_COLUMNS);

        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found_error("Service", id))
    }

    async fn insert_service(&self, service: &Service) -> AppResult<()> {
        let query = format!(
            r#"
            INSERT INTO services ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
            SERVICE_COLUMNS
        );

        sqlx::query(&query)
            .bind(service.id)
            .bind(service.hotel_id)
            .bind(&service.zone)
            .bind(&service.guest_name)
            .bind(&service.room_number)
            .bind(service.bag_count)
            .bind(service.weight)
            .bind(service.priority)
            .bind(service.status)
            .bind(service.pickup_agent_id)
            .bind(service.delivery_agent_id)
            .bind(service.created_at)
            .bind(service.pickup_date)
            .bind(service.labeling_date)
            .bind(service.delivery_date)
            .bind(service.delivered_bag_count)
            .bind(service.delivery_percentage)
            .bind(service.price)
            .bind(&service.observations)
            .bind(&service.label_photos)
            .bind(&service.cancellation_reason)
            .bind(service.version)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict(format!("Service '{}' already exists", service.id))
                }
                other => AppError::Database(other),
            })?;

        Ok(())
    }

    async fn save_service(&self, service: &Service, expected_status: ServiceStatus) -> AppResult<Service> {
        let query = format!(
            r#"
            UPDATE services
            SET weight = $4, priority = $5, status = $6, pickup_agent_id = $7, delivery_agent_id = $8,
                pickup_date = $9, labeling_date = $10, delivery_date = $11, delivered_bag_count = $12,
                delivery_percentage = $13, price = $14, observations = $15, label_photos = $16,
                cancellation_reason = $17, version = version + 1
            WHERE id = $1 AND status = $2 AND version = $3
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        );

        let saved = sqlx::query_as::<_, Service>(&query)
            .bind(service.id)
            .bind(expected_status)
            .bind(service.version)
            .bind(service.weight)
            .bind(service.priority)
            .bind(service.status)
            .bind(service.pickup_agent_id)
            .bind(service.delivery_agent_id)
            .bind(service.pickup_date)
            .bind(service.labeling_date)
            .bind(service.delivery_date)
            .bind(service.delivered_bag_count)
            .bind(service.delivery_percentage)
            .bind(service.price)
            .bind(&service.observations)
            .bind(&service.label_photos)
            .bind(&service.cancellation_reason)
            .fetch_optional(&self.pool)
            .await?;

        match saved {
            Some(saved) => Ok(saved),
            None => {
                // Distinguir registro inexistente de escritura concurrente
                self.get_service(service.id).await?;
                Err(conflict_error("Service", service.id))
            }
        }
    }
}
