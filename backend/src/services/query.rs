//! Live computation collaborators.
//!
//! The engine does not compute statistics itself. Each template on each
//! resource axis has exactly one entry point here, and each entry point
//! returns the concrete report type that template is bound to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::QueryError;
use crate::models::{Analysis, OrgId, OrgType, PlanId, ProjectId};
use crate::overview::*;

/// Scope arguments passed unchanged to every entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewParams {
    pub project_id: ProjectId,
    /// Narrow to one iteration plan; `None` spans the whole project.
    pub plan_id: Option<PlanId>,
    /// Organization level of `org_id`. Both are set or both are `None`.
    pub org_type: Option<OrgType>,
    pub org_id: Option<OrgId>,
    /// Inclusive lower bound of the calculation window.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound of the calculation window.
    pub end_time: Option<DateTime<Utc>>,
    /// Fill the per-assignee breakdown (`user_details`).
    pub contains_user_analysis: bool,
    /// Fill the row-level detail (`data_details`).
    pub contains_data_detail: bool,
}

impl From<&Analysis> for OverviewParams {
    fn from(a: &Analysis) -> Self {
        Self {
            project_id: a.project_id,
            plan_id: a.plan_id,
            org_type: a.org_type,
            org_id: a.org_id,
            start_time: a.calc_start_time,
            end_time: a.calc_end_time,
            contains_user_analysis: a.contains_user_analysis,
            contains_data_detail: a.contains_data_detail,
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Task-side statistics provider.
///
/// One method per task template. Implementations must honor the two
/// `contains_*` flags: when a flag is off the matching section of the
/// report is left `None`.
#[async_trait]
pub trait TaskQuery: Send + Sync {
    /// Completion counts and the completion rate.
    async fn progress(&self, p: &OverviewParams) -> QueryResult<ProgressOverview>;
    /// Daily remaining-work series across the window.
    async fn burndown(&self, p: &OverviewParams) -> QueryResult<BurnDownOverview>;
    /// Estimated and actual hours.
    async fn workload(&self, p: &OverviewParams) -> QueryResult<WorkloadOverview>;
    async fn overdue_assessment(&self, p: &OverviewParams)
        -> QueryResult<OverdueAssessmentOverview>;
    /// Bugs linked to tasks in scope.
    async fn bugs(&self, p: &OverviewParams) -> QueryResult<BugOverview>;
    async fn handling_efficiency(&self, p: &OverviewParams)
        -> QueryResult<HandlingEfficiencyOverview>;
    /// Composite block of progress, workload and delay figures.
    async fn core_kpi(&self, p: &OverviewParams) -> QueryResult<TaskCoreKpiOverview>;
    async fn failures(&self, p: &OverviewParams) -> QueryResult<FailureOverview>;
    async fn backlog_tasks(&self, p: &OverviewParams) -> QueryResult<BacklogTaskOverview>;
    async fn recent_delivery(&self, p: &OverviewParams) -> QueryResult<RecentDeliveryTaskOverview>;
    /// Creation-to-completion hours for completed tasks.
    async fn lead_time(&self, p: &OverviewParams) -> QueryResult<TaskLeadTimeOverview>;
    async fn unplanned_tasks(&self, p: &OverviewParams) -> QueryResult<UnplannedTaskOverview>;
    /// Created versus completed counts per day.
    async fn growth_trend(&self, p: &OverviewParams) -> QueryResult<TaskGrowthTrendOverview>;
    async fn resource_creation(&self, p: &OverviewParams)
        -> QueryResult<ResourceCreationOverview>;
}

/// Functional test case statistics provider.
///
/// Mirrors [`TaskQuery`] for test cases; the bug and efficiency entries
/// are replaced by their testing counterparts.
#[async_trait]
pub trait FuncCaseQuery: Send + Sync {
    async fn progress(&self, p: &OverviewParams) -> QueryResult<CaseProgressOverview>;
    async fn burndown(&self, p: &OverviewParams) -> QueryResult<CaseBurnDownOverview>;
    async fn workload(&self, p: &OverviewParams) -> QueryResult<CaseWorkloadOverview>;
    async fn overdue_assessment(&self, p: &OverviewParams)
        -> QueryResult<CaseOverdueAssessmentOverview>;
    /// Bugs raised by testers while executing cases.
    async fn submitted_bugs(&self, p: &OverviewParams) -> QueryResult<TesterSubmittedBugOverview>;
    async fn testing_efficiency(&self, p: &OverviewParams)
        -> QueryResult<TestingEfficiencyOverview>;
    async fn core_kpi(&self, p: &OverviewParams) -> QueryResult<CaseCoreKpiOverview>;
    /// Time from case submission to review verdict.
    async fn review_efficiency(&self, p: &OverviewParams)
        -> QueryResult<ReviewEfficiencyOverview>;
    async fn backlog_cases(&self, p: &OverviewParams) -> QueryResult<BacklogCaseOverview>;
    async fn recent_delivery(&self, p: &OverviewParams) -> QueryResult<RecentDeliveryCaseOverview>;
    async fn lead_time(&self, p: &OverviewParams) -> QueryResult<CaseLeadTimeOverview>;
    async fn unplanned_cases(&self, p: &OverviewParams) -> QueryResult<UnplannedCaseOverview>;
    async fn growth_trend(&self, p: &OverviewParams) -> QueryResult<CaseGrowthTrendOverview>;
    async fn resource_creation(&self, p: &OverviewParams)
        -> QueryResult<ResourceCreationOverview>;
}
