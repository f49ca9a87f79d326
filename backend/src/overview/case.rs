//! Functional test case reports.

use serde::Serialize;

use super::counts::*;
use super::details::*;
use super::task::ResourceCreationOverview;
use super::OverviewReport;
use crate::models::CaseTemplate;

pub type CaseProgressOverview = OverviewReport<ProgressCount, CaseProgressDetail>;
/// Grouped into `NUM` and `WORKLOAD` series.
pub type CaseBurnDownOverview = OverviewReport<BurnDownCount, BurnDownPoint>;
pub type CaseWorkloadOverview = OverviewReport<WorkloadCount, CaseWorkloadDetail>;
pub type CaseOverdueAssessmentOverview = OverviewReport<OverdueAssessmentCount, CaseProgressDetail>;
pub type TesterSubmittedBugOverview = OverviewReport<SubmittedBugCount, SubmittedBugDetail>;
pub type TestingEfficiencyOverview = OverviewReport<TestingEfficiencyCount, CaseTestingDetail>;
pub type CaseCoreKpiOverview = OverviewReport<CoreKpiCount, CaseTestingDetail>;
pub type ReviewEfficiencyOverview = OverviewReport<ReviewEfficiencyCount, CaseReviewDetail>;
pub type BacklogCaseOverview = OverviewReport<BacklogCount, CaseProgressDetail>;
/// Grouped into `TODAY`, `LAST_WEEK` and `LAST_MONTH`.
pub type RecentDeliveryCaseOverview = OverviewReport<RecentDeliveryCount, CaseProgressDetail>;
pub type CaseLeadTimeOverview = OverviewReport<LeadTimeCount, LeadTimeDetail>;
pub type UnplannedCaseOverview = OverviewReport<UnplannedWorkCount, CaseProgressDetail>;
pub type CaseGrowthTrendOverview = OverviewReport<GrowthTrendCount, TrendPoint>;

super::overview_enum!(
    /// Report for one case template.
    CaseOverview for CaseTemplate {
        Progress(CaseProgressOverview),
        Burndown(CaseBurnDownOverview),
        Workload(CaseWorkloadOverview),
        OverdueAssessment(CaseOverdueAssessmentOverview),
        SubmittedBugs(TesterSubmittedBugOverview),
        TestingEfficiency(TestingEfficiencyOverview),
        CoreKpi(CaseCoreKpiOverview),
        ReviewEfficiency(ReviewEfficiencyOverview),
        BacklogCases(BacklogCaseOverview),
        RecentDelivery(RecentDeliveryCaseOverview),
        LeadTime(CaseLeadTimeOverview),
        UnplannedCases(UnplannedCaseOverview),
        CaseGrowthTrend(CaseGrowthTrendOverview),
        ResourceCreation(ResourceCreationOverview),
    }
);
