//! MySQL-backed challenge store
//!
//! One row per `(identifier, purpose)`. Conditional operations put the
//! version into the `WHERE` clause and treat zero affected rows as a conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, error};
use uuid::Uuid;

use mg_core::domain::entities::{ChallengeKey, OtpPurpose, OtpRecord, RecordVersion, StoredCode};
use mg_core::errors::StorageError;
use mg_core::repositories::OtpStore;

/// Table definition used by [`MySqlOtpStore::ensure_schema`]
pub const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS otp_challenges (
        identifier VARCHAR(254) NOT NULL,
        purpose VARCHAR(32) NOT NULL,
        id CHAR(36) NOT NULL,
        code TEXT NOT NULL,
        issued_at DATETIME(6) NOT NULL,
        expires_at DATETIME(6) NOT NULL,
        attempts_remaining INT UNSIGNED NOT NULL,
        PRIMARY KEY (identifier, purpose),
        KEY idx_otp_challenges_expires_at (expires_at)
    )
"#;

/// Challenge store on MySQL
pub struct MySqlOtpStore {
    pool: MySqlPool,
}

impl MySqlOtpStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Create the challenge table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create otp_challenges table");
                unavailable(e)
            })?;
        Ok(())
    }

    fn row_to_record(row: &MySqlRow) -> Result<OtpRecord, StorageError> {
        let id: String = row.try_get("id").map_err(corrupted)?;
        let purpose: String = row.try_get("purpose").map_err(corrupted)?;
        let code: String = row.try_get("code").map_err(corrupted)?;

        Ok(OtpRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| StorageError::corrupted(format!("invalid record id: {}", e)))?,
            identifier: row.try_get("identifier").map_err(corrupted)?,
            purpose: purpose.parse::<OtpPurpose>().map_err(StorageError::corrupted)?,
            code: serde_json::from_str::<StoredCode>(&code)
                .map_err(|e| StorageError::corrupted(format!("invalid stored code: {}", e)))?,
            issued_at: row.try_get::<DateTime<Utc>, _>("issued_at").map_err(corrupted)?,
            expires_at: row.try_get::<DateTime<Utc>, _>("expires_at").map_err(corrupted)?,
            attempts_remaining: row.try_get::<u32, _>("attempts_remaining").map_err(corrupted)?,
        })
    }
}

fn unavailable(error: sqlx::Error) -> StorageError {
    StorageError::unavailable(error.to_string())
}

fn corrupted(error: sqlx::Error) -> StorageError {
    StorageError::corrupted(error.to_string())
}

#[async_trait]
impl OtpStore for MySqlOtpStore {
    async fn get(&self, key: &ChallengeKey) -> Result<Option<OtpRecord>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, identifier, purpose, code, issued_at, expires_at, attempts_remaining
            FROM otp_challenges
            WHERE identifier = ? AND purpose = ?
            "#,
        )
        .bind(&key.identifier)
        .bind(key.purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn replace(&self, record: &OtpRecord) -> Result<(), StorageError> {
        let code = serde_json::to_string(&record.code)
            .map_err(|e| StorageError::corrupted(format!("failed to encode stored code: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO otp_challenges
                (identifier, purpose, id, code, issued_at, expires_at, attempts_remaining)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                id = VALUES(id),
                code = VALUES(code),
                issued_at = VALUES(issued_at),
                expires_at = VALUES(expires_at),
                attempts_remaining = VALUES(attempts_remaining)
            "#,
        )
        .bind(&record.identifier)
        .bind(record.purpose.as_str())
        .bind(record.id.to_string())
        .bind(code)
        .bind(record.issued_at)
        .bind(record.expires_at)
        .bind(record.attempts_remaining)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn decrement_attempts(
        &self,
        key: &ChallengeKey,
        version: &RecordVersion,
    ) -> Result<u32, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE otp_challenges
            SET attempts_remaining = attempts_remaining - 1
            WHERE identifier = ? AND purpose = ? AND id = ?
              AND attempts_remaining = ? AND attempts_remaining > 0
            "#,
        )
        .bind(&key.identifier)
        .bind(key.purpose.as_str())
        .bind(version.id.to_string())
        .bind(version.attempts_remaining)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(version.attempts_remaining - 1)
    }

    async fn remove(&self, key: &ChallengeKey, version: &RecordVersion) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            DELETE FROM otp_challenges
            WHERE identifier = ? AND purpose = ? AND id = ? AND attempts_remaining = ?
            "#,
        )
        .bind(&key.identifier)
        .bind(key.purpose.as_str())
        .bind(version.id.to_string())
        .bind(version.attempts_remaining)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let result = sqlx::query("DELETE FROM otp_challenges WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        let purged = result.rows_affected() as usize;
        debug!(purged = purged, "Purged expired challenges from MySQL");
        Ok(purged)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
