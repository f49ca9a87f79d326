//! Analysis service layer.
//!
//! Repository-agnostic operations on analyses: CRUD with validation, overview
//! resolution, and export. Storage goes through [`FullRepository`], overview
//! computation and every snapshot write through [`OverviewComputer`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use analysis_overview::config::EngineConfig;
//! use analysis_overview::db::LocalRepository;
//! use analysis_overview::models::AnalysisId;
//! use analysis_overview::services::{AnalysisService, OverviewComputer};
//! # async fn run(computer: OverviewComputer) -> Result<(), Box<dyn std::error::Error>> {
//! let service = AnalysisService::new(Arc::new(LocalRepository::new()), computer, EngineConfig::default());
//! let analysis = service.detail(AnalysisId(1)).await?;
//! println!("{:?}", analysis.data_obj.map(|o| o.template()));
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use super::computer::OverviewComputer;
use super::error::{AnalysisError, AnalysisResult, ExportError};
use super::export::{self, Grid, Workbook};
use crate::config::EngineConfig;
use crate::db::FullRepository;
use crate::models::{Analysis, AnalysisFilter, AnalysisId};
use crate::overview::Overview;

const MAX_NAME_LEN: usize = 100;

pub struct AnalysisService<R: FullRepository + ?Sized> {
    repo: Arc<R>,
    computer: OverviewComputer,
    config: EngineConfig,
}

impl<R: FullRepository + ?Sized> Clone for AnalysisService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            computer: self.computer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R: FullRepository + ?Sized> AnalysisService<R> {
    /// The computer picks up the snapshot settings from `config`.
    pub fn new(repo: Arc<R>, computer: OverviewComputer, config: EngineConfig) -> Self {
        let computer = computer.with_settings(config.snapshot.clone());
        Self {
            repo,
            computer,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn health_check(&self) -> AnalysisResult<bool> {
        Ok(self.repo.health_check().await?)
    }

    // ==================== Reads ====================

    /// Load an analysis with its overview resolved into `data_obj`.
    pub async fn detail(&self, id: AnalysisId) -> AnalysisResult<Analysis> {
        let mut analysis = self.repo.get_analysis(id).await?;
        let overview = self.computer.resolve(self.repo.as_ref(), &analysis).await?;
        analysis.data_obj = Some(overview);
        Ok(analysis)
    }

    pub async fn list(&self, filter: &AnalysisFilter) -> AnalysisResult<Vec<Analysis>> {
        Ok(self.repo.list_analyses(filter).await?)
    }

    async fn overview(&self, id: AnalysisId) -> AnalysisResult<(Analysis, Overview)> {
        let analysis = self.repo.get_analysis(id).await?;
        let overview = self.computer.resolve(self.repo.as_ref(), &analysis).await?;
        Ok((analysis, overview))
    }

    /// Flat detail grid of the resolved overview.
    pub async fn grid(&self, id: AnalysisId) -> AnalysisResult<Grid> {
        let (_, overview) = self.overview(id).await?;
        Ok(export::to_grid(&overview)?)
    }

    pub async fn workbook(&self, id: AnalysisId) -> AnalysisResult<Workbook> {
        let (_, overview) = self.overview(id).await?;
        Ok(export::to_workbook(&overview, &self.config.export.sheet_title))
    }

    // ==================== Export ====================

    /// Export into the configured export directory.
    pub async fn export(&self, id: AnalysisId) -> AnalysisResult<PathBuf> {
        let dir = self.config.export.directory.clone();
        self.export_to(id, &dir).await
    }

    /// Write `<analysisName>-<epochMillis>.xlsx` into `dir`.
    pub async fn export_to(&self, id: AnalysisId, dir: &Path) -> AnalysisResult<PathBuf> {
        let (analysis, overview) = self.overview(id).await?;
        let title = self.config.export.sheet_title.clone();
        let workbook = export::to_workbook(&overview, &title);
        let path = dir.join(export::export_file_name(
            &analysis.name,
            Utc::now().timestamp_millis(),
        ));
        let sheets = workbook.sheets.len();

        let path = tokio::task::spawn_blocking(move || {
            export::write_workbook_file(&workbook, &title, &path)
        })
        .await
        .map_err(|e| ExportError::Io(std::io::Error::other(e)))??;

        info!(
            "Exported analysis {} ({} sheet(s)) to {}",
            id,
            sheets,
            path.display()
        );
        Ok(path)
    }

    // ==================== Writes ====================

    async fn validate(
        &self,
        analysis: &Analysis,
        exclude: Option<AnalysisId>,
    ) -> AnalysisResult<()> {
        let name = analysis.name.trim();
        if name.is_empty() {
            return Err(AnalysisError::validation("Analysis name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AnalysisError::validation(format!(
                "Analysis name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        analysis.template()?;
        if let (Some(start), Some(end)) = (analysis.calc_start_time, analysis.calc_end_time) {
            if start > end {
                return Err(AnalysisError::validation(
                    "Calculation start time is after end time",
                ));
            }
        }
        if self
            .repo
            .exists_analysis_name(analysis.project_id, &analysis.name, exclude)
            .await?
        {
            return Err(AnalysisError::validation(format!(
                "An analysis named '{}' already exists in project {}",
                analysis.name, analysis.project_id
            )));
        }
        Ok(())
    }

    pub async fn add(&self, analysis: &Analysis) -> AnalysisResult<Analysis> {
        self.validate(analysis, None).await?;
        let stored = self.repo.insert_analysis(&analysis.without_data()).await?;
        info!(
            "Added analysis {:?} '{}' ({}/{})",
            stored.id, stored.name, stored.resource, stored.template_name
        );
        Ok(stored)
    }

    /// Update an analysis. A change to what it computes drops its snapshot.
    pub async fn update(&self, analysis: &Analysis) -> AnalysisResult<Analysis> {
        let id = analysis
            .id
            .ok_or_else(|| AnalysisError::validation("Cannot update an analysis without an id"))?;
        let current = self.repo.get_analysis(id).await?;
        self.validate(analysis, Some(id)).await?;

        let updated = self.repo.update_analysis(&analysis.without_data()).await?;
        if !current.same_computation(&updated) {
            let dropped = self.repo.delete_snapshots(&[id]).await?;
            debug!("Analysis {} changed computation, dropped {} snapshot(s)", id, dropped);
        }
        info!("Updated analysis {} '{}'", id, updated.name);
        Ok(updated)
    }

    /// Delete analyses and their snapshots. Unknown ids are skipped.
    pub async fn delete(&self, ids: &[AnalysisId]) -> AnalysisResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let snapshots = self.repo.delete_snapshots(ids).await?;
        let deleted = self.repo.delete_analyses(ids).await?;
        info!("Deleted {} analyses and {} snapshot(s)", deleted, snapshots);
        Ok(deleted)
    }

    /// Recompute a snapshot analysis live and overwrite its snapshot.
    pub async fn refresh_snapshot(&self, id: AnalysisId) -> AnalysisResult<Overview> {
        let analysis = self.repo.get_analysis(id).await?;
        if !analysis.is_snapshot() {
            return Err(AnalysisError::validation(format!(
                "Analysis {} reads live data and has no snapshot to refresh",
                id
            )));
        }
        let overview = self.computer.refresh(self.repo.as_ref(), &analysis).await?;
        info!("Refreshed snapshot for analysis {}", id);
        Ok(overview)
    }
}
