//! PostgreSQL implementation of AccountRepository.
//!
//! Membership periods and attendance live in JSONB columns on the account
//! row, so granting or expiring a period is a single-row update guarded by
//! the `version` column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::db_error;
use crate::domain::foundation::{AccountId, DomainError, ErrorCode, PlanId, Timestamp};
use crate::domain::membership::{Account, AttendanceRecord, MembershipPeriod};
use crate::ports::AccountRepository;

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    phone_number: Option<String>,
    membership_periods: Json<Vec<MembershipPeriod>>,
    attendance: Json<Vec<AttendanceRecord>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: AccountId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            phone_number: row.phone_number,
            membership_periods: row.membership_periods.0,
            attendance: row.attendance.0,
            version: row.version,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        }
    }
}

const SELECT_ACCOUNT: &str = r#"
    SELECT id, username, email, full_name, phone_number,
           membership_periods, attendance, version, created_at, updated_at
    FROM accounts
"#;

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn insert(&self, account: &Account) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, email, full_name, phone_number,
                membership_periods, attendance, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&account.phone_number)
        .bind(Json(&account.membership_periods))
        .bind(Json(&account.attendance))
        .bind(account.version)
        .bind(account.created_at.as_datetime())
        .bind(account.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("accounts_username_key") {
                    return DomainError::validation("username", "Username already taken");
                }
                if db_err.constraint() == Some("accounts_pkey") {
                    return DomainError::validation("id", "Account already exists");
                }
            }
            db_error("insert account", e)
        })?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                username = $3,
                email = $4,
                full_name = $5,
                phone_number = $6,
                membership_periods = $7,
                attendance = $8,
                updated_at = $9,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.version)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&account.phone_number)
        .bind(Json(&account.membership_periods))
        .bind(Json(&account.attendance))
        .bind(account.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update account", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Distinguish a lost race from a missing row
        let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM accounts WHERE id = $1")
            .bind(account.id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("read account version", e))?;

        match exists {
            Some((found,)) => Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!(
                    "Account {} was modified concurrently (expected version {}, found {})",
                    account.id, account.version, found
                ),
            )),
            None => Err(DomainError::new(ErrorCode::AccountNotFound, "Account not found")
                .with_detail("id", account.id.to_string())),
        }
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_ACCOUNT))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find account", e))?;

        Ok(row.map(Account::from))
    }

    async fn find_ids_with_active_periods(&self) -> Result<Vec<AccountId>, DomainError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM accounts
            WHERE membership_periods @> '[{"status": "active"}]'::jsonb
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("scan active accounts", e))?;

        Ok(ids.into_iter().map(|(id,)| AccountId::from_uuid(id)).collect())
    }

    async fn find_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Account>, DomainError> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            "{} WHERE membership_periods @> jsonb_build_array(jsonb_build_object('plan_id', $1::text))",
            SELECT_ACCOUNT
        ))
        .bind(plan_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find accounts by plan", e))?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    async fn find_clocked_in_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Account>, DomainError> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE EXISTS (
                SELECT 1 FROM jsonb_array_elements(attendance) AS visit
                WHERE (visit->>'clock_in')::timestamptz BETWEEN $1 AND $2
            )
            ORDER BY username"#,
            SELECT_ACCOUNT
        ))
        .bind(from.as_datetime())
        .bind(to.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find attendance", e))?;

        Ok(rows.into_iter().map(Account::from).collect())
    }
}
