//! Analysis configuration repository.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Analysis, AnalysisFilter, AnalysisId, ProjectId};

/// CRUD operations for [`Analysis`] rows.
///
/// The transient `data_obj` field is never persisted; implementations store
/// and return analyses without it.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a new analysis and return it with its assigned id.
    async fn insert_analysis(&self, analysis: &Analysis) -> RepositoryResult<Analysis>;

    /// Overwrite an existing analysis.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If `analysis.id` is absent or unknown
    async fn update_analysis(&self, analysis: &Analysis) -> RepositoryResult<Analysis>;

    /// Retrieve an analysis by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the analysis doesn't exist
    async fn get_analysis(&self, id: AnalysisId) -> RepositoryResult<Analysis>;

    async fn exists_analysis(&self, id: AnalysisId) -> RepositoryResult<bool>;

    /// Whether another analysis in `project_id` already uses `name`.
    ///
    /// `exclude` skips one id, so an update can keep its own name.
    async fn exists_analysis_name(
        &self,
        project_id: ProjectId,
        name: &str,
        exclude: Option<AnalysisId>,
    ) -> RepositoryResult<bool>;

    /// List analyses matching `filter`, ordered by id.
    async fn list_analyses(&self, filter: &AnalysisFilter) -> RepositoryResult<Vec<Analysis>>;

    /// Delete analyses by id; unknown ids are skipped.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows deleted
    async fn delete_analyses(&self, ids: &[AnalysisId]) -> RepositoryResult<usize>;
}
