//! PostgreSQL implementation of PaymentRepository.
//!
//! Settlement is `UPDATE ... WHERE id = $1 AND status = 'pending'`; a zero
//! row count means somebody else settled first (or the row is gone).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::db_error;
use crate::domain::foundation::{AccountId, DomainError, ErrorCode, PaymentId, PlanId, Timestamp};
use crate::domain::payment::{GatewayMetadata, PaymentRecord, PaymentStatus};
use crate::ports::{PaymentRepository, SettleOutcome};

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn outcome_for_untouched(&self, id: &PaymentId) -> Result<SettleOutcome, DomainError> {
        Ok(match self.find_by_id(id).await? {
            Some(record) => SettleOutcome::AlreadySettled(record),
            None => SettleOutcome::NotFound,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    account_id: Uuid,
    plan_id: Uuid,
    amount: i64,
    status: String,
    transaction_id: Option<String>,
    payment_reference: Option<String>,
    payment_method: Option<String>,
    transaction_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status value: {}", row.status))
        })?;

        Ok(PaymentRecord {
            id: PaymentId::from_uuid(row.id),
            account_id: AccountId::from_uuid(row.account_id),
            plan_id: PlanId::from_uuid(row.plan_id),
            amount: row.amount,
            status,
            gateway: GatewayMetadata {
                transaction_id: row.transaction_id,
                payment_reference: row.payment_reference,
                payment_method: row.payment_method,
                transaction_date: row.transaction_date.map(Timestamp::from_datetime),
            },
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, account_id, plan_id, amount, status,
           transaction_id, payment_reference, payment_method, transaction_date,
           created_at, updated_at
    FROM payments
"#;

fn to_records(rows: Vec<PaymentRow>) -> Result<Vec<PaymentRecord>, DomainError> {
    rows.into_iter().map(PaymentRecord::try_from).collect()
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, account_id, plan_id, amount, status,
                transaction_id, payment_reference, payment_method, transaction_date,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.account_id.as_uuid())
        .bind(record.plan_id.as_uuid())
        .bind(record.amount)
        .bind(record.status.as_str())
        .bind(&record.gateway.transaction_id)
        .bind(&record.gateway.payment_reference)
        .bind(&record.gateway.payment_method)
        .bind(record.gateway.transaction_date.map(|t| *t.as_datetime()))
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert payment", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_PAYMENT))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find payment", e))?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<PaymentRecord>, DomainError> {
        let rows: Vec<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE account_id = $1 ORDER BY created_at DESC", SELECT_PAYMENT))
                .bind(account_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("find account payments", e))?;

        to_records(rows)
    }

    async fn find_all(&self) -> Result<Vec<PaymentRecord>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!("{} ORDER BY created_at DESC", SELECT_PAYMENT))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list payments", e))?;

        to_records(rows)
    }

    async fn find_pending_created_before(
        &self,
        created_before: Timestamp,
    ) -> Result<Vec<PaymentRecord>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'pending' AND created_at < $1 ORDER BY created_at ASC",
            SELECT_PAYMENT
        ))
        .bind(created_before.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find stale payments", e))?;

        to_records(rows)
    }

    async fn settle_success(
        &self,
        id: &PaymentId,
        metadata: &GatewayMetadata,
        at: Timestamp,
    ) -> Result<SettleOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = 'success',
                transaction_id = $2,
                payment_reference = $3,
                payment_method = $4,
                transaction_date = $5,
                updated_at = $6
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .bind(&metadata.transaction_id)
        .bind(&metadata.payment_reference)
        .bind(&metadata.payment_method)
        .bind(metadata.transaction_date.map(|t| *t.as_datetime()))
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("settle payment", e))?;

        if result.rows_affected() == 1 {
            return Ok(SettleOutcome::Applied);
        }
        self.outcome_for_untouched(id).await
    }

    async fn settle_failed(&self, id: &PaymentId, at: Timestamp) -> Result<SettleOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = 'failed', updated_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("fail payment", e))?;

        if result.rows_affected() == 1 {
            return Ok(SettleOutcome::Applied);
        }
        self.outcome_for_untouched(id).await
    }
}
