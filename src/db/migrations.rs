//! Database lifecycle and schema migrations.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteConnection;
use std::path::Path;

use super::Database;

impl Database {
    /// Create a new database connection
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    /// Failure here is the one fatal startup condition of a run: nothing
    /// downstream can proceed without a writable store.
    pub async fn new(path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory: {}",
                    e
                )))
            })?;
        }

        // Connect with WAL journaling so the verifier can read while a
        // crawl is writing
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to database: {}",
                e
            )))
        })?;

        let db = Self { pool };

        // Run migrations
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;

        // Create schema version table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create schema_version table: {}",
                e
            )))
        })?;

        // Check current version
        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query schema version: {}",
                        e
                    )))
                })?
                .flatten();

        let current_version = current_version.unwrap_or(0);

        // Apply migrations
        if current_version < 1 {
            Self::migrate_v1(&mut conn).await?;
        }

        Ok(())
    }

    /// Migration v1: Create the companies table
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
        tracing::info!("Applying database migration v1");

        // Wrap migration in a transaction so partial failures don't leave the DB in a broken state
        sqlx::query("BEGIN")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to begin transaction: {}",
                    e
                )))
            })?;

        let result = async {
            Self::create_companies_schema(conn).await?;
            Self::record_migration(conn, 1).await?;
            Ok::<(), Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::MigrationFailed(format!(
                            "Failed to commit migration v1: {}",
                            e
                        )))
                    })?;
                Ok(())
            }
            Err(e) => {
                sqlx::query("ROLLBACK").execute(&mut *conn).await.ok();
                Err(e)
            }
        }
    }

    /// Create the companies table, one row per BIN
    async fn create_companies_schema(conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                bin TEXT PRIMARY KEY,
                title_ru TEXT NOT NULL DEFAULT '',
                title_kz TEXT NOT NULL DEFAULT '',
                address_ru TEXT NOT NULL DEFAULT '',
                address_kz TEXT NOT NULL DEFAULT '',
                ceo_name TEXT NOT NULL DEFAULT '',
                ceo_position TEXT NOT NULL DEFAULT '',
                primary_oked TEXT NOT NULL DEFAULT '',
                secondary_oked TEXT NOT NULL DEFAULT '[]',
                kato_code TEXT NOT NULL DEFAULT '',
                kato_description TEXT NOT NULL DEFAULT '',
                registration_date TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT '',
                status_description TEXT NOT NULL DEFAULT '',
                years_on_market INTEGER NOT NULL DEFAULT 0,
                months_on_market INTEGER NOT NULL DEFAULT 0,
                is_nds INTEGER NOT NULL DEFAULT 0,
                krp TEXT NOT NULL DEFAULT '',
                krp_description TEXT NOT NULL DEFAULT '',
                kfc TEXT NOT NULL DEFAULT '',
                kfc_description TEXT NOT NULL DEFAULT '',
                kse TEXT NOT NULL DEFAULT '',
                kse_description TEXT NOT NULL DEFAULT '',
                rnn TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                website TEXT NOT NULL DEFAULT '',
                postal_code TEXT NOT NULL DEFAULT '',
                city TEXT NOT NULL DEFAULT '',
                street TEXT NOT NULL DEFAULT '',
                total_debt_kgd REAL NOT NULL DEFAULT 0,
                total_fine_kgd REAL NOT NULL DEFAULT 0,
                main_debt_kgd REAL NOT NULL DEFAULT 0,
                total_debt_egov REAL NOT NULL DEFAULT 0,
                pension_debt REAL NOT NULL DEFAULT 0,
                medical_debt REAL NOT NULL DEFAULT 0,
                social_debt REAL NOT NULL DEFAULT 0,
                violation_count INTEGER NOT NULL DEFAULT 0,
                warning_count INTEGER NOT NULL DEFAULT 0,
                in_inactive_registry INTEGER NOT NULL DEFAULT 0,
                in_absent_registry INTEGER NOT NULL DEFAULT 0,
                in_fake_registry INTEGER NOT NULL DEFAULT 0,
                in_bankrupt_registry INTEGER NOT NULL DEFAULT 0,
                in_invalid_registry INTEGER NOT NULL DEFAULT 0,
                in_tax_debtor_registry INTEGER NOT NULL DEFAULT 0,
                unreliable_samruk INTEGER NOT NULL DEFAULT 0,
                unreliable_gz INTEGER NOT NULL DEFAULT 0,
                was_nds INTEGER NOT NULL DEFAULT 0,
                filials_count INTEGER NOT NULL DEFAULT 0,
                same_address_count INTEGER NOT NULL DEFAULT 0,
                same_ceo_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create companies table: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Record a completed migration in the schema_version table
    async fn record_migration(conn: &mut SqliteConnection, version: i64) -> Result<()> {
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to record migration v{}: {}",
                    version, e
                )))
            })?;

        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
