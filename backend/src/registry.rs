//! Template registry.
//!
//! Two exhaustive tables per resource axis: the compute side maps a template
//! to its query entry point, the decode side maps it to its report type.
//! Both are plain `match`es over the closed template enums, so adding a
//! template without wiring both sides does not compile. Task tables only
//! ever see [`TaskTemplate`] and case tables only [`CaseTemplate`].

use crate::models::{AnalysisTemplate, CaseTemplate, TaskTemplate};
use crate::overview::{CaseOverview, Overview, TaskOverview};
use crate::services::query::{FuncCaseQuery, OverviewParams, QueryResult, TaskQuery};

/// Run the task entry point for `template`.
///
/// Every [`TaskTemplate`] maps to exactly one [`TaskQuery`] method.
pub async fn compute_task<Q: TaskQuery + ?Sized>(
    query: &Q,
    template: TaskTemplate,
    p: &OverviewParams,
) -> QueryResult<TaskOverview> {
    use TaskTemplate as T;
    Ok(match template {
        T::Progress => TaskOverview::Progress(query.progress(p).await?),
        T::Burndown => TaskOverview::Burndown(query.burndown(p).await?),
        T::Workload => TaskOverview::Workload(query.workload(p).await?),
        T::OverdueAssessment => {
            TaskOverview::OverdueAssessment(query.overdue_assessment(p).await?)
        }
        T::Bugs => TaskOverview::Bugs(query.bugs(p).await?),
        T::HandlingEfficiency => {
            TaskOverview::HandlingEfficiency(query.handling_efficiency(p).await?)
        }
        T::CoreKpi => TaskOverview::CoreKpi(query.core_kpi(p).await?),
        T::Failures => TaskOverview::Failures(query.failures(p).await?),
        T::BacklogTasks => TaskOverview::BacklogTasks(query.backlog_tasks(p).await?),
        T::RecentDelivery => TaskOverview::RecentDelivery(query.recent_delivery(p).await?),
        T::LeadTime => TaskOverview::LeadTime(query.lead_time(p).await?),
        T::UnplannedTasks => TaskOverview::UnplannedTasks(query.unplanned_tasks(p).await?),
        T::TaskGrowthTrend => TaskOverview::TaskGrowthTrend(query.growth_trend(p).await?),
        T::ResourceCreation => TaskOverview::ResourceCreation(query.resource_creation(p).await?),
    })
}

/// Run the case entry point for `template`.
pub async fn compute_case<Q: FuncCaseQuery + ?Sized>(
    query: &Q,
    template: CaseTemplate,
    p: &OverviewParams,
) -> QueryResult<CaseOverview> {
    use CaseTemplate as C;
    Ok(match template {
        C::Progress => CaseOverview::Progress(query.progress(p).await?),
        C::Burndown => CaseOverview::Burndown(query.burndown(p).await?),
        C::Workload => CaseOverview::Workload(query.workload(p).await?),
        C::OverdueAssessment => {
            CaseOverview::OverdueAssessment(query.overdue_assessment(p).await?)
        }
        C::SubmittedBugs => CaseOverview::SubmittedBugs(query.submitted_bugs(p).await?),
        C::TestingEfficiency => {
            CaseOverview::TestingEfficiency(query.testing_efficiency(p).await?)
        }
        C::CoreKpi => CaseOverview::CoreKpi(query.core_kpi(p).await?),
        C::ReviewEfficiency => CaseOverview::ReviewEfficiency(query.review_efficiency(p).await?),
        C::BacklogCases => CaseOverview::BacklogCases(query.backlog_cases(p).await?),
        C::RecentDelivery => CaseOverview::RecentDelivery(query.recent_delivery(p).await?),
        C::LeadTime => CaseOverview::LeadTime(query.lead_time(p).await?),
        C::UnplannedCases => CaseOverview::UnplannedCases(query.unplanned_cases(p).await?),
        C::CaseGrowthTrend => CaseOverview::CaseGrowthTrend(query.growth_trend(p).await?),
        C::ResourceCreation => CaseOverview::ResourceCreation(query.resource_creation(p).await?),
    })
}

/// Dispatch on the resource axis, then on the template.
///
/// Task templates only reach `task_query` and case templates only reach
/// `case_query`. Query errors pass through unchanged.
pub async fn compute<T, C>(
    task_query: &T,
    case_query: &C,
    template: AnalysisTemplate,
    p: &OverviewParams,
) -> QueryResult<Overview>
where
    T: TaskQuery + ?Sized,
    C: FuncCaseQuery + ?Sized,
{
    Ok(match template {
        AnalysisTemplate::Task(t) => Overview::Task(compute_task(task_query, t, p).await?),
        AnalysisTemplate::Case(t) => Overview::Case(compute_case(case_query, t, p).await?),
    })
}

/// Deserialize a task blob as the report type `template` is bound to.
pub fn decode_task(template: TaskTemplate, blob: &str) -> serde_json::Result<TaskOverview> {
    use serde_json::from_str as de;
    use TaskTemplate as T;
    Ok(match template {
        T::Progress => TaskOverview::Progress(de(blob)?),
        T::Burndown => TaskOverview::Burndown(de(blob)?),
        T::Workload => TaskOverview::Workload(de(blob)?),
        T::OverdueAssessment => TaskOverview::OverdueAssessment(de(blob)?),
        T::Bugs => TaskOverview::Bugs(de(blob)?),
        T::HandlingEfficiency => TaskOverview::HandlingEfficiency(de(blob)?),
        T::CoreKpi => TaskOverview::CoreKpi(de(blob)?),
        T::Failures => TaskOverview::Failures(de(blob)?),
        T::BacklogTasks => TaskOverview::BacklogTasks(de(blob)?),
        T::RecentDelivery => TaskOverview::RecentDelivery(de(blob)?),
        T::LeadTime => TaskOverview::LeadTime(de(blob)?),
        T::UnplannedTasks => TaskOverview::UnplannedTasks(de(blob)?),
        T::TaskGrowthTrend => TaskOverview::TaskGrowthTrend(de(blob)?),
        T::ResourceCreation => TaskOverview::ResourceCreation(de(blob)?),
    })
}

/// Deserialize a case blob as the report type `template` is bound to.
pub fn decode_case(template: CaseTemplate, blob: &str) -> serde_json::Result<CaseOverview> {
    use serde_json::from_str as de;
    use CaseTemplate as C;
    Ok(match template {
        C::Progress => CaseOverview::Progress(de(blob)?),
        C::Burndown => CaseOverview::Burndown(de(blob)?),
        C::Workload => CaseOverview::Workload(de(blob)?),
        C::OverdueAssessment => CaseOverview::OverdueAssessment(de(blob)?),
        C::SubmittedBugs => CaseOverview::SubmittedBugs(de(blob)?),
        C::TestingEfficiency => CaseOverview::TestingEfficiency(de(blob)?),
        C::CoreKpi => CaseOverview::CoreKpi(de(blob)?),
        C::ReviewEfficiency => CaseOverview::ReviewEfficiency(de(blob)?),
        C::BacklogCases => CaseOverview::BacklogCases(de(blob)?),
        C::RecentDelivery => CaseOverview::RecentDelivery(de(blob)?),
        C::LeadTime => CaseOverview::LeadTime(de(blob)?),
        C::UnplannedCases => CaseOverview::UnplannedCases(de(blob)?),
        C::CaseGrowthTrend => CaseOverview::CaseGrowthTrend(de(blob)?),
        C::ResourceCreation => CaseOverview::ResourceCreation(de(blob)?),
    })
}

/// Deserialize `blob` as the report type bound to `template`.
///
/// There is no fallback to another type: a blob written under a different
/// template fails here even when its JSON happens to be similar.
pub fn decode(template: AnalysisTemplate, blob: &str) -> serde_json::Result<Overview> {
    Ok(match template {
        AnalysisTemplate::Task(t) => Overview::Task(decode_task(t, blob)?),
        AnalysisTemplate::Case(t) => Overview::Case(decode_case(t, blob)?),
    })
}
