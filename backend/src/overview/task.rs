//! Task-side reports.

use serde::Serialize;

use super::counts::*;
use super::details::*;
use super::OverviewReport;
use crate::models::TaskTemplate;

pub type ProgressOverview = OverviewReport<ProgressCount, TaskProgressDetail>;
/// Grouped into `NUM` and `WORKLOAD` series.
pub type BurnDownOverview = OverviewReport<BurnDownCount, BurnDownPoint>;
pub type WorkloadOverview = OverviewReport<WorkloadCount, TaskWorkloadDetail>;
pub type OverdueAssessmentOverview = OverviewReport<OverdueAssessmentCount, TaskOverdueDetail>;
pub type BugOverview = OverviewReport<BugCount, BugDetail>;
pub type HandlingEfficiencyOverview = OverviewReport<HandlingEfficiencyCount, TaskEfficiencyDetail>;
pub type TaskCoreKpiOverview = OverviewReport<CoreKpiCount, TaskEfficiencyDetail>;
pub type FailureOverview = OverviewReport<FailureCount, TaskEfficiencyDetail>;
pub type BacklogTaskOverview = OverviewReport<BacklogCount, TaskProgressDetail>;
/// Grouped into `TODAY`, `LAST_WEEK` and `LAST_MONTH`.
pub type RecentDeliveryTaskOverview = OverviewReport<RecentDeliveryCount, TaskProgressDetail>;
pub type TaskLeadTimeOverview = OverviewReport<LeadTimeCount, LeadTimeDetail>;
pub type UnplannedTaskOverview = OverviewReport<UnplannedWorkCount, TaskProgressDetail>;
/// Grouped into `TOTAL` and `ADDED` series.
pub type TaskGrowthTrendOverview = OverviewReport<GrowthTrendCount, TrendPoint>;
pub type ResourceCreationOverview = OverviewReport<ResourceCreationCount, ResourceCreationDetail>;

super::overview_enum!(
    /// Report for one task template.
    TaskOverview for TaskTemplate {
        Progress(ProgressOverview),
        Burndown(BurnDownOverview),
        Workload(WorkloadOverview),
        OverdueAssessment(OverdueAssessmentOverview),
        Bugs(BugOverview),
        HandlingEfficiency(HandlingEfficiencyOverview),
        CoreKpi(TaskCoreKpiOverview),
        Failures(FailureOverview),
        BacklogTasks(BacklogTaskOverview),
        RecentDelivery(RecentDeliveryTaskOverview),
        LeadTime(TaskLeadTimeOverview),
        UnplannedTasks(UnplannedTaskOverview),
        TaskGrowthTrend(TaskGrowthTrendOverview),
        ResourceCreation(ResourceCreationOverview),
    }
);
