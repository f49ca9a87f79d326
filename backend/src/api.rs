//! Public API surface.
//!
//! The types a caller needs to configure analyses, resolve their overviews,
//! and export them, gathered in one place.

pub use crate::config::{EngineConfig, ExportSettings, SnapshotSettings};
pub use crate::db::{FullRepository, LocalRepository, RepositoryError, RepositoryResult};
pub use crate::models::{
    Analysis, AnalysisDataSource, AnalysisFilter, AnalysisId, AnalysisResource, AnalysisSnapshot,
    AnalysisTemplate, CaseTemplate, OrgId, OrgType, PlanId, ProjectId, TaskTemplate,
    TemplateError, UserId,
};
pub use crate::overview::{
    CaseOverview, DataDetails, DetailGroup, DetailRow, Overview, OverviewReport,
    TabularOverview, TaskOverview,
};
pub use crate::services::{
    AnalysisError, AnalysisResult, AnalysisService, FuncCaseQuery, Grid, NamedGrid,
    OverviewComputer, OverviewParams, QueryError, QueryResult, TaskQuery, Workbook,
};
