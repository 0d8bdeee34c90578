//! `PostgreSQL` implementation of [`AuthStore`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, Connection, PgPool, Row};
use std::time::Duration;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{AuthStore, Identity, StoreError};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a small connection pool against `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn apply_schema(&self) -> Result<()> {
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }
        Ok(())
    }
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn identity_from_row(row: &PgRow) -> Identity {
    Identity::new(
        row.get("id"),
        row.get("email"),
        row.get("password_hash"),
        row.get("created_at_unix"),
    )
}

macro_rules! db_span {
    ($operation:literal, $query:expr) => {
        info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = $operation,
            db.statement = $query
        )
    };
}

#[async_trait]
impl AuthStore for PgStore {
    async fn insert_identity(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Identity, StoreError> {
        let query = r"
            INSERT INTO identities (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash,
                      EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix
        ";
        let result = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(db_span!("INSERT", query))
            .await;

        match result {
            Ok(row) => Ok(identity_from_row(&row)),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert identity")
                .into()),
        }
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let query = r"
            SELECT id, email, password_hash,
                   EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix
            FROM identities
            WHERE email = $1
        ";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span!("SELECT", query))
            .await
            .context("failed to lookup identity")?;

        Ok(row.as_ref().map(identity_from_row))
    }

    async fn delete_identity(&self, id: Uuid) -> Result<bool, StoreError> {
        // sessions.identity_id cascades, so bound sessions go with the row.
        let query = "DELETE FROM identities WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span!("DELETE", query))
            .await
            .context("failed to delete identity")?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_session(
        &self,
        identity_id: Uuid,
        token_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<i64, StoreError> {
        let query = r"
            INSERT INTO sessions (session_hash, identity_id, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
            RETURNING EXTRACT(EPOCH FROM expires_at)::BIGINT AS expires_at_unix
        ";
        let result = sqlx::query(query)
            .bind(token_hash)
            .bind(identity_id)
            .bind(ttl_seconds)
            .fetch_one(&self.pool)
            .instrument(db_span!("INSERT", query))
            .await;

        match result {
            Ok(row) => Ok(row.get("expires_at_unix")),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert session")
                .into()),
        }
    }

    async fn lookup_session(&self, token_hash: &[u8]) -> Result<Option<Identity>, StoreError> {
        // The join drops sessions whose identity is gone, even without the cascade.
        let query = r"
            SELECT identities.id, identities.email, identities.password_hash,
                   EXTRACT(EPOCH FROM identities.created_at)::BIGINT AS created_at_unix
            FROM sessions
            JOIN identities ON identities.id = sessions.identity_id
            WHERE sessions.session_hash = $1
              AND sessions.expires_at > NOW()
            LIMIT 1
        ";
        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(db_span!("SELECT", query))
            .await
            .context("failed to lookup session")?;

        Ok(row.as_ref().map(identity_from_row))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), StoreError> {
        let query = "DELETE FROM sessions WHERE session_hash = $1";
        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(db_span!("DELETE", query))
            .await
            .context("failed to delete session")?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> Result<u64, StoreError> {
        let query = "DELETE FROM sessions WHERE expires_at <= NOW()";
        let result = sqlx::query(query)
            .execute(&self.pool)
            .instrument(db_span!("DELETE", query))
            .await
            .context("failed to purge expired sessions")?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")?;
        Ok(())
    }
}
