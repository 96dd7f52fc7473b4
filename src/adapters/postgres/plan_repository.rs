//! PostgreSQL implementation of PlanRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::db_error;
use crate::domain::catalog::{PlanDuration, RenewalType, SubscriptionPlan};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, Timestamp};
use crate::ports::PlanRepository;

pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    duration: String,
    price: i64,
    renewal_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for SubscriptionPlan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let duration: PlanDuration = row.duration.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid duration value: {}", e))
        })?;
        let renewal_type: RenewalType = row.renewal_type.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid renewal_type value: {}", e))
        })?;

        Ok(SubscriptionPlan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            duration,
            price: row.price,
            renewal_type,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn save(&self, plan: &SubscriptionPlan) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO plans (id, name, duration, price, renewal_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(plan.duration.code())
        .bind(plan.price)
        .bind(plan.renewal_type.as_str())
        .bind(plan.created_at.as_datetime())
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save plan", e))?;

        Ok(())
    }

    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE plans SET
                name = $2,
                duration = $3,
                price = $4,
                renewal_type = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(plan.duration.code())
        .bind(plan.price)
        .bind(plan.renewal_type.as_str())
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update plan", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::PlanNotFound, "Plan not found")
                .with_detail("id", plan.id.to_string()));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, duration, price, renewal_type, created_at, updated_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find plan", e))?;

        row.map(SubscriptionPlan::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<SubscriptionPlan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, duration, price, renewal_type, created_at, updated_at
            FROM plans
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list plans", e))?;

        rows.into_iter().map(SubscriptionPlan::try_from).collect()
    }

    async fn delete(&self, id: &PlanId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete plan", e))?;

        Ok(result.rows_affected() > 0)
    }
}
