//! Overview Computer.
//!
//! Resolves the overview for an analysis: from its snapshot when the
//! analysis asks for snapshot data and a usable one exists, live through the
//! query collaborators otherwise. This is the only writer of snapshots.

use std::sync::Arc;

use log::{debug, info, warn};

use super::codec;
use super::error::{AnalysisError, AnalysisResult};
use super::query::{FuncCaseQuery, OverviewParams, TaskQuery};
use crate::config::SnapshotSettings;
use crate::db::FullRepository;
use crate::models::{Analysis, AnalysisId, AnalysisTemplate};
use crate::overview::Overview;
use crate::registry;

/// Resolves overviews for analyses.
///
/// Holds one collaborator per resource axis. Cloning is cheap; the
/// collaborators are shared.
#[derive(Clone)]
pub struct OverviewComputer {
    task_query: Arc<dyn TaskQuery>,
    case_query: Arc<dyn FuncCaseQuery>,
    settings: SnapshotSettings,
}

/// What a snapshot lookup produced.
enum Cached {
    Hit(Overview),
    Miss,
}

impl OverviewComputer {
    /// Build a computer with default [`SnapshotSettings`] (write-back on).
    pub fn new(task_query: Arc<dyn TaskQuery>, case_query: Arc<dyn FuncCaseQuery>) -> Self {
        Self {
            task_query,
            case_query,
            settings: SnapshotSettings::default(),
        }
    }

    /// Replace the snapshot settings.
    pub fn with_settings(mut self, settings: SnapshotSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Compute live, ignoring any snapshot.
    pub async fn compute(&self, analysis: &Analysis) -> AnalysisResult<Overview> {
        let template = analysis.template()?;
        self.compute_template(template, analysis).await
    }

    async fn compute_template(
        &self,
        template: AnalysisTemplate,
        analysis: &Analysis,
    ) -> AnalysisResult<Overview> {
        debug!("Computing {} live for analysis {:?}", template, analysis.id);
        let params = OverviewParams::from(analysis);
        let overview = registry::compute(
            self.task_query.as_ref(),
            self.case_query.as_ref(),
            template,
            &params,
        )
        .await?;
        debug_assert_eq!(overview.template(), template);
        Ok(overview)
    }

    /// Resolve the overview for `analysis`.
    ///
    /// The returned variant always matches `analysis.template()`.
    pub async fn resolve<R: FullRepository + ?Sized>(
        &self,
        repo: &R,
        analysis: &Analysis,
    ) -> AnalysisResult<Overview> {
        let template = analysis.template()?;

        let id = match (analysis.is_snapshot(), analysis.id) {
            (true, Some(id)) => id,
            (true, None) => {
                debug!("Unsaved snapshot analysis '{}', computing live", analysis.name);
                return self.compute_template(template, analysis).await;
            }
            (false, _) => return self.compute_template(template, analysis).await,
        };

        if let Cached::Hit(overview) = self.read_snapshot(repo, id, template).await? {
            return Ok(overview);
        }

        let overview = self.compute_template(template, analysis).await?;
        if self.settings.write_back {
            self.write_snapshot(repo, id, &overview).await?;
        }
        Ok(overview)
    }

    /// Recompute live and overwrite the snapshot regardless of what is stored.
    ///
    /// Runs whether or not the analysis is in snapshot mode and ignores the
    /// write-back setting. Fails with a validation error for an unsaved
    /// analysis, and with `NotFound` if the analysis row is gone.
    pub async fn refresh<R: FullRepository + ?Sized>(
        &self,
        repo: &R,
        analysis: &Analysis,
    ) -> AnalysisResult<Overview> {
        let id = analysis
            .id
            .ok_or_else(|| AnalysisError::validation("Cannot refresh an unsaved analysis"))?;
        let overview = self.compute(analysis).await?;
        self.write_snapshot(repo, id, &overview).await?;
        Ok(overview)
    }

    /// Look up a usable snapshot. Missing, empty and stale blobs are misses;
    /// a checksum or decode failure is an error.
    async fn read_snapshot<R: FullRepository + ?Sized>(
        &self,
        repo: &R,
        id: AnalysisId,
        template: AnalysisTemplate,
    ) -> AnalysisResult<Cached> {
        let Some(snapshot) = repo.fetch_snapshot(id).await? else {
            debug!("No snapshot for analysis {}", id);
            return Ok(Cached::Miss);
        };

        if snapshot.data.trim().is_empty() {
            debug!("Empty snapshot for analysis {}", id);
            return Ok(Cached::Miss);
        }

        if !snapshot.written_under(template) {
            warn!(
                "Snapshot for analysis {} was written as {}/{}, analysis is now {}; recomputing",
                id, snapshot.resource, snapshot.template, template
            );
            return Ok(Cached::Miss);
        }

        let overview = codec::from_snapshot(&snapshot)?;
        debug!("Served analysis {} from snapshot ({})", id, template);
        Ok(Cached::Hit(overview))
    }

    /// Encode and upsert, replacing any earlier snapshot for `id`.
    async fn write_snapshot<R: FullRepository + ?Sized>(
        &self,
        repo: &R,
        id: AnalysisId,
        overview: &Overview,
    ) -> AnalysisResult<()> {
        let snapshot = codec::to_snapshot(id, overview)?;
        repo.upsert_snapshot(&snapshot).await?;
        info!("Stored {} snapshot for analysis {}", snapshot.template, id);
        Ok(())
    }
}
