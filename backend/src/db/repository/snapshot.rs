//! Snapshot repository.
//!
//! One snapshot per analysis. A snapshot is only ever replaced as a whole;
//! there is no partial update.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{AnalysisId, AnalysisSnapshot};

#[async_trait]
pub trait AnalysisSnapshotRepository: Send + Sync {
    /// Fetch the snapshot for an analysis.
    ///
    /// # Returns
    /// * `Ok(None)` - If no snapshot has been written yet
    async fn fetch_snapshot(&self, analysis_id: AnalysisId)
        -> RepositoryResult<Option<AnalysisSnapshot>>;

    async fn has_snapshot(&self, analysis_id: AnalysisId) -> RepositoryResult<bool>;

    /// Insert or atomically replace the snapshot keyed by
    /// `snapshot.analysis_id`.
    async fn upsert_snapshot(&self, snapshot: &AnalysisSnapshot) -> RepositoryResult<()>;

    /// Delete snapshots for the given analyses.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of snapshots removed
    async fn delete_snapshots(&self, analysis_ids: &[AnalysisId]) -> RepositoryResult<usize>;
}
