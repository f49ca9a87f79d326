//! Analysis and snapshot storage.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  services::analysis - detail / export / add / delete    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴───────────────┐
//!     │                               │
//! ┌───▼──────────────┐   ┌────────────▼─────────┐
//! │ LocalRepository  │   │ PostgresRepository   │
//! │ (in-memory)      │   │ (Diesel, r2d2)       │
//! └──────────────────┘   └──────────────────────┘
//! ```
//!
//! Use [`RepositoryFactory`] or [`RepositoryBuilder`] to pick a backend, or
//! [`get_repository`] for the process-wide instance.

// Feature flag priority: postgres > local
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use checksum::{calculate_checksum, verify_checksum};
pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AnalysisRepository, AnalysisSnapshotRepository, ErrorContext, FullRepository,
    RepositoryError, RepositoryResult,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

#[cfg(feature = "postgres-repo")]
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
    let repo = RepositoryFactory::create_postgres(&config).await?;
    Ok(repo as Arc<dyn FullRepository>)
}

#[cfg(all(feature = "local-repo", not(feature = "postgres-repo")))]
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    Ok(RepositoryFactory::create_local())
}

/// Initialize the global repository for the selected backend.
///
/// Must not be called from inside a Tokio runtime; it drives its own.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime for repository init")?;
    let repo = runtime
        .block_on(create_selected_repository())
        .context("Failed to create repository")?;
    if REPOSITORY.set(repo).is_ok() {
        log::info!("Global repository initialized");
    }
    Ok(())
}

/// The global repository, initializing it on first use.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        init_repository()?;
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
