//! In-memory local repository implementation.
//!
//! Stores analyses and snapshots in hash maps behind a single lock. Used for
//! unit tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{Analysis, AnalysisFilter, AnalysisId, AnalysisSnapshot, ProjectId};

/// In-memory local repository.
///
/// Clones share the same storage.
///
/// # Example
/// ```
/// use analysis_overview::db::repositories::LocalRepository;
/// use analysis_overview::db::AnalysisRepository;
/// use analysis_overview::models::{Analysis, ProjectId, TaskTemplate, UserId};
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// let analysis = Analysis::new(ProjectId(1), "Progress", TaskTemplate::Progress.into(), UserId(1));
/// let stored = repo.insert_analysis(&analysis).await.unwrap();
/// assert!(stored.id.is_some());
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    analyses: HashMap<AnalysisId, Analysis>,
    snapshots: HashMap<AnalysisId, AnalysisSnapshot>,
    next_analysis_id: AnalysisId,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            analyses: HashMap::new(),
            snapshots: HashMap::new(),
            next_analysis_id: AnalysisId(1),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn analysis_count(&self) -> usize {
        self.data.read().analyses.len()
    }

    pub fn snapshot_count(&self) -> usize {
        self.data.read().snapshots.len()
    }

    /// Overwrite a stored snapshot blob as-is, bypassing the codec.
    ///
    /// Test helper for corrupt and stale snapshot scenarios.
    pub fn put_raw_snapshot(&self, snapshot: AnalysisSnapshot) {
        self.data
            .write()
            .snapshots
            .insert(snapshot.analysis_id, snapshot);
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }

    fn name_taken(
        data: &LocalData,
        project_id: ProjectId,
        name: &str,
        exclude: Option<AnalysisId>,
    ) -> bool {
        data.analyses.values().any(|a| {
            a.project_id == project_id && a.name == name && a.id != exclude
        })
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> RepositoryResult<Analysis> {
        self.check_health("insert_analysis")?;
        let mut data = self.data.write();
        if Self::name_taken(&data, analysis.project_id, &analysis.name, None) {
            return Err(RepositoryError::validation_with_context(
                format!("Analysis name '{}' already exists", analysis.name),
                ErrorContext::new("insert_analysis").with_entity("analysis"),
            ));
        }

        let id = data.next_analysis_id;
        data.next_analysis_id = AnalysisId(id.0 + 1);

        let mut stored = analysis.without_data();
        stored.id = Some(id);
        data.analyses.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_analysis(&self, analysis: &Analysis) -> RepositoryResult<Analysis> {
        self.check_health("update_analysis")?;
        let id = analysis.id.ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Analysis has no id",
                ErrorContext::new("update_analysis").with_entity("analysis"),
            )
        })?;

        let mut data = self.data.write();
        if !data.analyses.contains_key(&id) {
            return Err(RepositoryError::analysis_not_found(id, "update_analysis"));
        }
        if Self::name_taken(&data, analysis.project_id, &analysis.name, Some(id)) {
            return Err(RepositoryError::validation_with_context(
                format!("Analysis name '{}' already exists", analysis.name),
                ErrorContext::new("update_analysis")
                    .with_entity("analysis")
                    .with_entity_id(id),
            ));
        }

        let mut stored = analysis.without_data();
        stored.last_modified_date = Utc::now();
        data.analyses.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_analysis(&self, id: AnalysisId) -> RepositoryResult<Analysis> {
        self.check_health("get_analysis")?;
        self.data
            .read()
            .analyses
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::analysis_not_found(id, "get_analysis"))
    }

    async fn exists_analysis(&self, id: AnalysisId) -> RepositoryResult<bool> {
        self.check_health("exists_analysis")?;
        Ok(self.data.read().analyses.contains_key(&id))
    }

    async fn exists_analysis_name(
        &self,
        project_id: ProjectId,
        name: &str,
        exclude: Option<AnalysisId>,
    ) -> RepositoryResult<bool> {
        self.check_health("exists_analysis_name")?;
        Ok(Self::name_taken(&self.data.read(), project_id, name, exclude))
    }

    async fn list_analyses(&self, filter: &AnalysisFilter) -> RepositoryResult<Vec<Analysis>> {
        self.check_health("list_analyses")?;
        let data = self.data.read();
        let mut analyses: Vec<Analysis> = data
            .analyses
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        analyses.sort_by_key(|a| a.id);
        Ok(analyses)
    }

    async fn delete_analyses(&self, ids: &[AnalysisId]) -> RepositoryResult<usize> {
        self.check_health("delete_analyses")?;
        let mut data = self.data.write();
        // Snapshots go with their analysis, as with the Postgres foreign key.
        for id in ids {
            data.snapshots.remove(id);
        }
        Ok(ids
            .iter()
            .filter(|id| data.analyses.remove(*id).is_some())
            .count())
    }
}

#[async_trait]
impl AnalysisSnapshotRepository for LocalRepository {
    async fn fetch_snapshot(
        &self,
        analysis_id: AnalysisId,
    ) -> RepositoryResult<Option<AnalysisSnapshot>> {
        self.check_health("fetch_snapshot")?;
        Ok(self.data.read().snapshots.get(&analysis_id).cloned())
    }

    async fn has_snapshot(&self, analysis_id: AnalysisId) -> RepositoryResult<bool> {
        self.check_health("has_snapshot")?;
        Ok(self.data.read().snapshots.contains_key(&analysis_id))
    }

    async fn upsert_snapshot(&self, snapshot: &AnalysisSnapshot) -> RepositoryResult<()> {
        self.check_health("upsert_snapshot")?;
        let mut data = self.data.write();
        if !data.analyses.contains_key(&snapshot.analysis_id) {
            return Err(RepositoryError::analysis_not_found(
                snapshot.analysis_id,
                "upsert_snapshot",
            ));
        }
        data.snapshots.insert(snapshot.analysis_id, snapshot.clone());
        Ok(())
    }

    async fn delete_snapshots(&self, analysis_ids: &[AnalysisId]) -> RepositoryResult<usize> {
        self.check_health("delete_snapshots")?;
        let mut data = self.data.write();
        Ok(analysis_ids
            .iter()
            .filter(|id| data.snapshots.remove(*id).is_some())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResource, TaskTemplate, UserId};

    fn analysis(name: &str) -> Analysis {
        Analysis::new(ProjectId(1), name, TaskTemplate::Progress.into(), UserId(1))
    }

    fn snapshot(id: AnalysisId, data: &str) -> AnalysisSnapshot {
        AnalysisSnapshot {
            analysis_id: id,
            resource: AnalysisResource::Task,
            template: "PROGRESS".to_string(),
            data: data.to_string(),
            checksum: crate::db::calculate_checksum(data),
            created_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.get_analysis(AnalysisId(1)).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = LocalRepository::new();
        let a = repo.insert_analysis(&analysis("a")).await.unwrap();
        let b = repo.insert_analysis(&analysis("b")).await.unwrap();
        assert_eq!(a.id, Some(AnalysisId(1)));
        assert_eq!(b.id, Some(AnalysisId(2)));
        assert_eq!(repo.analysis_count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_per_project() {
        let repo = LocalRepository::new();
        repo.insert_analysis(&analysis("dup")).await.unwrap();
        let err = repo.insert_analysis(&analysis("dup")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let mut other_project = analysis("dup");
        other_project.project_id = ProjectId(2);
        assert!(repo.insert_analysis(&other_project).await.is_ok());
    }

    #[tokio::test]
    async fn test_not_found_error() {
        let repo = LocalRepository::new();
        let err = repo.get_analysis(AnalysisId(99)).await.unwrap_err();
        assert!(err.is_not_found());

        let mut missing = analysis("ghost");
        missing.id = Some(AnalysisId(99));
        assert!(repo.update_analysis(&missing).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_filtered() {
        let repo = LocalRepository::new();
        for name in ["c", "a", "b"] {
            repo.insert_analysis(&analysis(name)).await.unwrap();
        }
        let all = repo.list_analyses(&AnalysisFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        let filtered = repo
            .list_analyses(&AnalysisFilter {
                name_contains: Some("B".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_upsert_overwrites() {
        let repo = LocalRepository::new();
        let id = repo.insert_analysis(&analysis("a")).await.unwrap().id.unwrap();
        assert!(repo.fetch_snapshot(id).await.unwrap().is_none());

        repo.upsert_snapshot(&snapshot(id, "{\"a\":1}")).await.unwrap();
        repo.upsert_snapshot(&snapshot(id, "{\"a\":2}")).await.unwrap();

        assert!(repo.has_snapshot(id).await.unwrap());
        assert_eq!(repo.snapshot_count(), 1);
        let stored = repo.fetch_snapshot(id).await.unwrap().unwrap();
        assert_eq!(stored.data, "{\"a\":2}");
    }

    #[tokio::test]
    async fn test_delete_counts_only_existing() {
        let repo = LocalRepository::new();
        let a = repo.insert_analysis(&analysis("a")).await.unwrap();
        let id = a.id.unwrap();
        repo.upsert_snapshot(&snapshot(id, "{}")).await.unwrap();

        assert_eq!(repo.delete_analyses(&[id, AnalysisId(42)]).await.unwrap(), 1);
        assert!(!repo.has_snapshot(id).await.unwrap());
        assert_eq!(repo.delete_snapshots(&[id]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_for_missing_analysis_rejected() {
        let repo = LocalRepository::new();
        let err = repo
            .upsert_snapshot(&snapshot(AnalysisId(8), "{}"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.context().entity.as_deref(), Some("analysis"));
        assert_eq!(repo.snapshot_count(), 0);
    }
}
