use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement,
    TransactionTrait,
};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{Permissions, Scope, Token, User, token::hash_plaintext};

pub mod migrator;
pub mod repositories;

use repositories::{
    permission::PermissionRepository, token::TokenRepository, user::UserRepository,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Edit conflict: the record changed since it was read")]
    EditConflict,

    #[error("Duplicate email address")]
    DuplicateEmail,

    #[error("Database call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Pooled connection plus a per-call deadline. Every operation is bounded
/// by `query_timeout`; on expiry the query future is dropped.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    query_timeout: Duration,
}

impl Store {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if let Some(path_str) = sqlite_file_path(&config.url) {
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.idle_timeout_seconds * 2))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .context("Failed to connect to database")?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply migrations")?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            config.min_connections, config.max_connections
        );

        Ok(Self {
            conn,
            query_timeout: config.query_timeout(),
        })
    }

    async fn bounded<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        tokio::time::timeout(self.query_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.query_timeout))?
    }

    pub async fn ping(&self) -> StoreResult<()> {
        let backend = self.conn.get_database_backend();
        self.bounded(async {
            self.conn
                .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
                .await?;
            Ok::<(), StoreError>(())
        })
        .await
    }

    fn user_repo(&self) -> UserRepository<'_, DatabaseConnection> {
        UserRepository::new(&self.conn)
    }

    fn token_repo(&self) -> TokenRepository<'_, DatabaseConnection> {
        TokenRepository::new(&self.conn)
    }

    fn permission_repo(&self) -> PermissionRepository<'_, DatabaseConnection> {
        PermissionRepository::new(&self.conn)
    }

    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.bounded(self.user_repo().insert(user)).await
    }

    /// Inserts a new user together with its default grants and its first
    /// activation token. Either all three writes land or none do; a
    /// timeout drops the uncommitted transaction.
    pub async fn insert_registration(
        &self,
        user: &User,
        default_codes: &[String],
        activation: &Token,
    ) -> StoreResult<()> {
        self.bounded(async {
            let txn = self.conn.begin().await?;

            UserRepository::new(&txn).insert(user).await?;
            PermissionRepository::new(&txn)
                .grant(user.id, default_codes)
                .await?;
            TokenRepository::new(&txn).insert(activation).await?;

            txn.commit().await?;
            Ok::<(), StoreError>(())
        })
        .await
    }

    pub async fn update_user(
        &self,
        user: &User,
        expected_last_updated: DateTime<Utc>,
    ) -> StoreResult<User> {
        self.bounded(self.user_repo().update(user, expected_last_updated))
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.bounded(self.user_repo().get_by_email(email)).await
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> StoreResult<User> {
        self.bounded(self.user_repo().get_by_id(id)).await
    }

    pub async fn insert_token(&self, token: &Token) -> StoreResult<()> {
        self.bounded(self.token_repo().insert(token)).await
    }

    pub async fn delete_tokens_for_user(&self, scope: Scope, user_id: Uuid) -> StoreResult<u64> {
        self.bounded(self.token_repo().delete_for_user(scope, user_id))
            .await
    }

    /// Looks up by the hash of `plaintext`; the plaintext itself never
    /// reaches the database.
    pub async fn get_user_for_token(&self, scope: Scope, plaintext: &str) -> StoreResult<User> {
        let hash = hash_plaintext(plaintext);
        self.bounded(self.token_repo().get_user(scope, hash)).await
    }

    pub async fn get_permissions_for_user(&self, user_id: Uuid) -> StoreResult<Permissions> {
        self.bounded(self.permission_repo().for_user(user_id)).await
    }

    pub async fn grant_permissions(&self, user_id: Uuid, codes: &[String]) -> StoreResult<u64> {
        self.bounded(self.permission_repo().grant(user_id, codes))
            .await
    }
}

/// Filesystem path of a file-backed SQLite URL, if `url` is one.
fn sqlite_file_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(path)
    }
}
