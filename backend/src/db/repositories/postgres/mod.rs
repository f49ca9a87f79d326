//! Postgres repository implementation using Diesel.
//!
//! Two tables: `analyses` for configurations and `analysis_snapshots` for
//! serialized overviews keyed by analysis id. Snapshot writes are a single
//! `INSERT .. ON CONFLICT (analysis_id) DO UPDATE`, so a reader never sees a
//! half-replaced blob.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    AnalysisRepository, AnalysisSnapshotRepository, ErrorContext, RepositoryError,
    RepositoryResult,
};
use crate::models::{Analysis, AnalysisFilter, AnalysisId, AnalysisSnapshot, ProjectId};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Parse an env var, falling back to `default` when unset or malformed.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Build the pool and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        let mut conn = pool.get()?;
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        drop(conn);

        log::info!(
            "Postgres repository ready (pool max={}, retries={})",
            config.max_pool_size,
            config.max_retries
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run `f` on a pooled connection, retrying retryable failures with
    /// exponential backoff.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let mut retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut attempt = 0;
            loop {
                let result = pool
                    .get()
                    .map_err(RepositoryError::from)
                    .and_then(|mut conn| {
                        total_queries.fetch_add(1, Ordering::Relaxed);
                        f(&mut conn)
                    });

                match result {
                    Ok(value) => return Ok(value),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        attempt += 1;
                        retried_operations.fetch_add(1, Ordering::Relaxed);
                        log::warn!(
                            "{} failed (attempt {}), retrying in {:?}: {}",
                            operation,
                            attempt,
                            retry_delay,
                            e
                        );
                        std::thread::sleep(retry_delay);
                        retry_delay *= 2;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new(operation),
            )
        })?
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn load_analysis(conn: &mut PgConnection, id: AnalysisId) -> RepositoryResult<Analysis> {
    let row = analyses::table
        .find(id.value())
        .select(AnalysisRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| RepositoryError::analysis_not_found(id, "get_analysis"))?;
    Analysis::try_from(row)
}

#[async_trait]
impl AnalysisRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1").execute(conn)?;
            Ok(true)
        })
        .await
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> RepositoryResult<Analysis> {
        let changes = AnalysisChanges::from(analysis);
        self.with_conn("insert_analysis", move |conn| {
            let row = diesel::insert_into(analyses::table)
                .values(&changes)
                .returning(AnalysisRow::as_returning())
                .get_result(conn)?;
            Analysis::try_from(row)
        })
        .await
    }

    async fn update_analysis(&self, analysis: &Analysis) -> RepositoryResult<Analysis> {
        let id = analysis.id.ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Analysis has no id",
                ErrorContext::new("update_analysis").with_entity("analysis"),
            )
        })?;
        let mut changes = AnalysisChanges::from(analysis);
        changes.last_modified_date = Utc::now();

        self.with_conn("update_analysis", move |conn| {
            let row = diesel::update(analyses::table.find(id.value()))
                .set(&changes)
                .returning(AnalysisRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::analysis_not_found(id, "update_analysis"))?;
            Analysis::try_from(row)
        })
        .await
    }

    async fn get_analysis(&self, id: AnalysisId) -> RepositoryResult<Analysis> {
        self.with_conn("get_analysis", move |conn| load_analysis(conn, id))
            .await
    }

    async fn exists_analysis(&self, id: AnalysisId) -> RepositoryResult<bool> {
        self.with_conn("exists_analysis", move |conn| {
            let found = diesel::select(diesel::dsl::exists(analyses::table.find(id.value())))
                .get_result(conn)?;
            Ok(found)
        })
        .await
    }

    async fn exists_analysis_name(
        &self,
        project_id: ProjectId,
        name: &str,
        exclude: Option<AnalysisId>,
    ) -> RepositoryResult<bool> {
        let name = name.to_string();
        self.with_conn("exists_analysis_name", move |conn| {
            let mut query = analyses::table
                .filter(analyses::project_id.eq(project_id.value()))
                .filter(analyses::name.eq(&name))
                .into_boxed();
            if let Some(exclude) = exclude {
                query = query.filter(analyses::id.ne(exclude.value()));
            }
            let count: i64 = query.count().get_result(conn)?;
            Ok(count > 0)
        })
        .await
    }

    async fn list_analyses(&self, filter: &AnalysisFilter) -> RepositoryResult<Vec<Analysis>> {
        let filter = filter.clone();
        self.with_conn("list_analyses", move |conn| {
            let mut query = analyses::table
                .select(AnalysisRow::as_select())
                .order(analyses::id.asc())
                .into_boxed();
            if let Some(project_id) = filter.project_id {
                query = query.filter(analyses::project_id.eq(project_id.value()));
            }
            if let Some(created_by) = filter.created_by {
                query = query.filter(analyses::created_by.eq(created_by.value()));
            }
            if let Some(after) = filter.created_after {
                query = query.filter(analyses::created_date.ge(after));
            }
            if let Some(before) = filter.created_before {
                query = query.filter(analyses::created_date.le(before));
            }
            if let Some(resource) = filter.resource {
                query = query.filter(analyses::resource.eq(resource.as_str()));
            }
            if let Some(pattern) = filter.name_pattern() {
                query = query.filter(analyses::name.ilike(pattern));
            }

            query
                .load::<AnalysisRow>(conn)?
                .into_iter()
                .map(Analysis::try_from)
                .collect()
        })
        .await
    }

    async fn delete_analyses(&self, ids: &[AnalysisId]) -> RepositoryResult<usize> {
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        self.with_conn("delete_analyses", move |conn| {
            let deleted =
                diesel::delete(analyses::table.filter(analyses::id.eq_any(&ids))).execute(conn)?;
            Ok(deleted)
        })
        .await
    }
}

#[async_trait]
impl AnalysisSnapshotRepository for PostgresRepository {
    async fn fetch_snapshot(
        &self,
        analysis_id: AnalysisId,
    ) -> RepositoryResult<Option<AnalysisSnapshot>> {
        self.with_conn("fetch_snapshot", move |conn| {
            analysis_snapshots::table
                .find(analysis_id.value())
                .select(SnapshotRow::as_select())
                .first(conn)
                .optional()?
                .map(AnalysisSnapshot::try_from)
                .transpose()
        })
        .await
    }

    async fn has_snapshot(&self, analysis_id: AnalysisId) -> RepositoryResult<bool> {
        self.with_conn("has_snapshot", move |conn| {
            let found = diesel::select(diesel::dsl::exists(
                analysis_snapshots::table.find(analysis_id.value()),
            ))
            .get_result(conn)?;
            Ok(found)
        })
        .await
    }

    async fn upsert_snapshot(&self, snapshot: &AnalysisSnapshot) -> RepositoryResult<()> {
        let row = SnapshotRow::from(snapshot);
        let analysis_id = snapshot.analysis_id;
        self.with_conn("upsert_snapshot", move |conn| {
            diesel::insert_into(analysis_snapshots::table)
                .values(&row)
                .on_conflict(analysis_snapshots::analysis_id)
                .do_update()
                .set((
                    analysis_snapshots::resource.eq(excluded(analysis_snapshots::resource)),
                    analysis_snapshots::template.eq(excluded(analysis_snapshots::template)),
                    analysis_snapshots::data.eq(excluded(analysis_snapshots::data)),
                    analysis_snapshots::checksum.eq(excluded(analysis_snapshots::checksum)),
                    analysis_snapshots::created_date.eq(excluded(analysis_snapshots::created_date)),
                ))
                .execute(conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                        _,
                    ) => RepositoryError::analysis_not_found(analysis_id, "upsert_snapshot"),
                    other => other.into(),
                })?;
            Ok(())
        })
        .await
    }

    async fn delete_snapshots(&self, analysis_ids: &[AnalysisId]) -> RepositoryResult<usize> {
        let ids: Vec<i64> = analysis_ids.iter().map(|id| id.value()).collect();
        self.with_conn("delete_snapshots", move |conn| {
            let deleted = diesel::delete(
                analysis_snapshots::table.filter(analysis_snapshots::analysis_id.eq_any(&ids)),
            )
            .execute(conn)?;
            Ok(deleted)
        })
        .await
    }
}
