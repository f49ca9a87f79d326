#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use analysis_overview::config::EngineConfig;
use analysis_overview::db::LocalRepository;
use analysis_overview::models::{
    Analysis, AnalysisDataSource, AnalysisTemplate, ProjectId, UserId,
};
use analysis_overview::overview::*;
use analysis_overview::services::{
    AnalysisService, FuncCaseQuery, OverviewComputer, OverviewParams, QueryError, QueryResult,
    TaskQuery,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ==================== Fixtures ====================

pub const ASSIGNEES: [UserId; 2] = [UserId(7), UserId(9)];
pub const DETAIL_ROWS: usize = 3;

/// Detail rows with every field set, so codec round trips cover dates,
/// optional ids and fractional numbers.
pub trait Populated: Sized {
    fn populated(i: usize) -> Self;
}

/// Timestamp with sub-second precision.
pub fn stamp(i: usize) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(1_717_171_717 + i as i64 * 3_600, 123_456_789 + i as u32)
        .single()
}

pub fn day(i: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 5, 1 + i as u32)
}

fn amount(i: usize) -> f64 {
    0.1 + i as f64 * 1.7
}

fn text(prefix: &str, i: usize) -> String {
    format!("{}-{}", prefix, i)
}

impl Populated for TaskProgressDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("T", i),
            name: text("Task", i),
            task_type: "STORY".to_string(),
            status: "DONE".to_string(),
            assignee_name: Some(text("Dev", i)),
            evaluate_workload: amount(i),
            actual_workload: amount(i) * 1.25,
            completed: i % 2 == 0,
            overdue: i % 2 == 1,
            start_date: stamp(i),
            deadline: stamp(i + 24),
            completed_date: stamp(i + 30),
        }
    }
}

impl Populated for BurnDownPoint {
    fn populated(i: usize) -> Self {
        Self {
            time: day(i),
            remaining: 40.5 - amount(i),
            ideal: 40.0 - i as f64 * 2.5,
            completed: amount(i),
        }
    }
}

impl Populated for TaskWorkloadDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("T", i),
            name: text("Task", i),
            assignee_name: Some(text("Dev", i)),
            evaluate_workload: amount(i),
            actual_workload: amount(i) + 0.35,
            remaining_workload: 0.65,
            invalid: i == 1,
        }
    }
}

impl Populated for TaskOverdueDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("T", i),
            name: text("Task", i),
            assignee_name: Some(text("Dev", i)),
            deadline: stamp(i),
            overdue_hours: 12.25 + i as f64,
            evaluate_workload: amount(i),
        }
    }
}

impl Populated for BugDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("B", i),
            name: text("Bug", i),
            severity: "MAJOR".to_string(),
            valid: i != 1,
            missing: i == 2,
            assignee_name: Some(text("Dev", i)),
            actual_workload: amount(i),
        }
    }
}

impl Populated for TaskEfficiencyDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("T", i),
            name: text("Task", i),
            assignee_name: Some(text("Dev", i)),
            processing_times: 1 + i as i64,
            failure_times: i as i64,
            completed: true,
            evaluate_workload: amount(i),
            actual_workload: amount(i) * 0.8,
        }
    }
}

impl Populated for LeadTimeDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("T", i),
            name: text("Task", i),
            assignee_name: Some(text("Dev", i)),
            created_date: stamp(i),
            completed_date: stamp(i + 48),
            lead_time_hours: 48.0 + amount(i),
        }
    }
}

impl Populated for TrendPoint {
    fn populated(i: usize) -> Self {
        Self {
            time: day(i),
            total_num: 10 + i as i64,
            added_num: 1 + i as i64,
        }
    }
}

impl Populated for ResourceCreationDetail {
    fn populated(i: usize) -> Self {
        Self {
            resource_type: "CASE".to_string(),
            name: text("Case", i),
            creator_id: Some(UserId(100 + i as i64)),
            created_date: stamp(i),
        }
    }
}

impl Populated for CaseProgressDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("C", i),
            name: text("Case", i),
            module_name: Some("Login".to_string()),
            tester_name: Some(text("Tester", i)),
            test_result: "PASSED".to_string(),
            review_status: "APPROVED".to_string(),
            evaluate_workload: amount(i),
            overdue: i == 0,
            deadline: stamp(i),
            completed_date: stamp(i + 2),
        }
    }
}

impl Populated for CaseWorkloadDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("C", i),
            name: text("Case", i),
            tester_name: Some(text("Tester", i)),
            evaluate_workload: amount(i),
            actual_workload: amount(i) + 0.05,
            invalid: i == 2,
        }
    }
}

impl Populated for SubmittedBugDetail {
    fn populated(i: usize) -> Self {
        Self {
            bug_code: text("B", i),
            bug_name: text("Bug", i),
            case_code: text("C", i),
            tester_name: Some(text("Tester", i)),
            severity: "CRITICAL".to_string(),
            valid: true,
            missing: i == 1,
            submitted_date: stamp(i),
        }
    }
}

impl Populated for CaseTestingDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("C", i),
            name: text("Case", i),
            tester_name: Some(text("Tester", i)),
            test_times: 2 + i as i64,
            passed: i != 2,
            last_result: "PASSED".to_string(),
        }
    }
}

impl Populated for CaseReviewDetail {
    fn populated(i: usize) -> Self {
        Self {
            code: text("C", i),
            name: text("Case", i),
            reviewer_name: Some(text("Reviewer", i)),
            review_times: 1 + i as i64,
            review_status: "APPROVED".to_string(),
            reviewed_date: stamp(i),
        }
    }
}

pub fn populated_rows<R: Populated>() -> Vec<R> {
    (0..DETAIL_ROWS).map(R::populated).collect()
}

/// A report shaped by the scope flags: assignee blocks when user analysis is
/// on, details (flat, or one group per name) when data details are on.
pub fn report<C: Clone, R: DetailSchema + Populated>(
    p: &OverviewParams,
    total: C,
    groups: &[&str],
) -> OverviewReport<C, R> {
    let mut report = OverviewReport::new(total.clone());
    if p.contains_user_analysis {
        report = report.with_assignees(ASSIGNEES.iter().map(|id| (*id, total.clone())));
    }
    if p.contains_data_detail {
        report = if groups.is_empty() {
            report.with_details(populated_rows())
        } else {
            report.with_groups(
                groups
                    .iter()
                    .map(|g| DetailGroup::new(*g, populated_rows()))
                    .collect(),
            )
        };
    }
    report
}

pub fn progress_rows(codes: &[&str]) -> Vec<TaskProgressDetail> {
    codes
        .iter()
        .enumerate()
        .map(|(i, code)| TaskProgressDetail {
            code: code.to_string(),
            name: format!("Task {}", code),
            ..TaskProgressDetail::populated(i)
        })
        .collect()
}

pub fn analysis(name: &str, template: impl Into<AnalysisTemplate>) -> Analysis {
    let mut a = Analysis::new(ProjectId(1), name, template.into(), UserId(7));
    a.contains_user_analysis = true;
    a.contains_data_detail = true;
    a
}

pub fn snapshot_analysis(name: &str, template: impl Into<AnalysisTemplate>) -> Analysis {
    let mut a = analysis(name, template);
    a.datasource = AnalysisDataSource::SnapshotData;
    a
}

// ==================== Fake collaborators ====================

const SERIES: &[&str] = &["NUM", "WORKLOAD"];
const WINDOWS: &[&str] = &["TODAY", "LAST_WEEK", "LAST_MONTH"];
const TREND: &[&str] = &["TOTAL", "ADDED"];

/// Answers every task and case entry point with a fixture report.
#[derive(Default)]
pub struct FakeQuery {
    calls: AtomicUsize,
    fail: AtomicBool,
    non_finite: AtomicBool,
    last_template: Mutex<Option<String>>,
}

impl FakeQuery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_template(&self) -> Option<String> {
        self.last_template
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make task PROGRESS report an unusable (NaN) evaluated workload.
    pub fn set_non_finite(&self, non_finite: bool) {
        self.non_finite.store(non_finite, Ordering::SeqCst);
    }

    fn answer<C: Clone, R: DetailSchema + Populated>(
        &self,
        template: &str,
        p: &OverviewParams,
        total: C,
        groups: &[&str],
    ) -> QueryResult<OverviewReport<C, R>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_template.lock().unwrap_or_else(|e| e.into_inner()) = Some(template.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueryError::new(template, "collaborator unavailable"));
        }
        Ok(report(p, total, groups))
    }
}

#[async_trait]
impl TaskQuery for FakeQuery {
    async fn progress(&self, p: &OverviewParams) -> QueryResult<ProgressOverview> {
        let evaluated = if self.non_finite.load(Ordering::SeqCst) {
            f64::NAN
        } else {
            16.0
        };
        let total = ProgressCount::new(8, 6, evaluated, 12.0);
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_template.lock().unwrap_or_else(|e| e.into_inner()) =
            Some("PROGRESS".to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueryError::new("PROGRESS", "collaborator unavailable"));
        }
        let mut report = ProgressOverview::new(total.clone());
        if p.contains_user_analysis {
            report = report.with_assignees(ASSIGNEES.iter().map(|id| (*id, total.clone())));
        }
        if p.contains_data_detail {
            report = report.with_details(progress_rows(&["T-3", "T-1", "T-2"]));
        }
        Ok(report)
    }
    async fn burndown(&self, p: &OverviewParams) -> QueryResult<BurnDownOverview> {
        self.answer("BURNDOWN", p, BurnDownCount::new(10, 4, 20.0, 12.0), SERIES)
    }
    async fn workload(&self, p: &OverviewParams) -> QueryResult<WorkloadOverview> {
        self.answer("WORKLOAD", p, WorkloadCount::new(10.0, 12.0, 8.0, 1.0), &[])
    }
    async fn overdue_assessment(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<OverdueAssessmentOverview> {
        let total = OverdueAssessmentCount::new(10, 3, 20.0, 6.0, 30.0, 8.0);
        self.answer("OVERDUE_ASSESSMENT", p, total, &[])
    }
    async fn bugs(&self, p: &OverviewParams) -> QueryResult<BugOverview> {
        let total = BugCount::new(5, 1, 2, 4.0, 20.0, SeverityCount::default());
        self.answer("BUGS", p, total, &[])
    }
    async fn handling_efficiency(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<HandlingEfficiencyOverview> {
        let total = HandlingEfficiencyCount::new(10, 8, 6, 2, 10);
        self.answer("HANDLING_EFFICIENCY", p, total, &[])
    }
    async fn core_kpi(&self, p: &OverviewParams) -> QueryResult<TaskCoreKpiOverview> {
        let progress = ProgressCount::new(10, 8, 20.0, 16.0);
        self.answer("CORE_KPI", p, CoreKpiCount::new(&progress, 2, 6, 10), &[])
    }
    async fn failures(&self, p: &OverviewParams) -> QueryResult<FailureOverview> {
        self.answer("FAILURES", p, FailureCount::new(10, 6, 2, 2, 14, 5.0), &[])
    }
    async fn backlog_tasks(&self, p: &OverviewParams) -> QueryResult<BacklogTaskOverview> {
        self.answer("BACKLOG_TASKS", p, BacklogCount::new(10, 4, 20.0, 9.0, 3.0), &[])
    }
    async fn recent_delivery(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<RecentDeliveryTaskOverview> {
        self.answer("RECENT_DELIVERY", p, RecentDeliveryCount::default(), WINDOWS)
    }
    async fn lead_time(&self, p: &OverviewParams) -> QueryResult<TaskLeadTimeOverview> {
        let total = LeadTimeCount::from_samples(&[4.0, 8.0, 30.0]);
        self.answer("LEAD_TIME", p, total, &[])
    }
    async fn unplanned_tasks(&self, p: &OverviewParams) -> QueryResult<UnplannedTaskOverview> {
        let total = UnplannedWorkCount::new(10, 2, 1, 20.0, 3.0);
        self.answer("UNPLANNED_TASKS", p, total, &[])
    }
    async fn growth_trend(&self, p: &OverviewParams) -> QueryResult<TaskGrowthTrendOverview> {
        self.answer("TASK_GROWTH_TREND", p, GrowthTrendCount::new(12, 2, 7), TREND)
    }
    async fn resource_creation(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<ResourceCreationOverview> {
        let total = ResourceCreationCount {
            task_num: 4,
            case_num: 2,
            ..Default::default()
        }
        .with_total();
        self.answer("RESOURCE_CREATION", p, total, &[])
    }
}

#[async_trait]
impl FuncCaseQuery for FakeQuery {
    async fn progress(&self, p: &OverviewParams) -> QueryResult<CaseProgressOverview> {
        self.answer("PROGRESS", p, ProgressCount::new(20, 5, 10.0, 2.5), &[])
    }
    async fn burndown(&self, p: &OverviewParams) -> QueryResult<CaseBurnDownOverview> {
        self.answer("BURNDOWN", p, BurnDownCount::new(20, 5, 10.0, 7.5), SERIES)
    }
    async fn workload(&self, p: &OverviewParams) -> QueryResult<CaseWorkloadOverview> {
        self.answer("WORKLOAD", p, WorkloadCount::new(5.0, 4.0, 4.0, 0.0), &[])
    }
    async fn overdue_assessment(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<CaseOverdueAssessmentOverview> {
        let total = OverdueAssessmentCount::new(20, 1, 10.0, 0.5, 4.0, 2.0);
        self.answer("OVERDUE_ASSESSMENT", p, total, &[])
    }
    async fn submitted_bugs(&self, p: &OverviewParams) -> QueryResult<TesterSubmittedBugOverview> {
        let total = SubmittedBugCount::new(20, 4, 3, 1, SeverityCount::default());
        self.answer("SUBMITTED_BUGS", p, total, &[])
    }
    async fn testing_efficiency(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<TestingEfficiencyOverview> {
        self.answer("TESTING_EFFICIENCY", p, TestingEfficiencyCount::default(), &[])
    }
    async fn core_kpi(&self, p: &OverviewParams) -> QueryResult<CaseCoreKpiOverview> {
        let progress = ProgressCount::new(20, 5, 10.0, 2.5);
        self.answer("CORE_KPI", p, CoreKpiCount::new(&progress, 1, 4, 6), &[])
    }
    async fn review_efficiency(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<ReviewEfficiencyOverview> {
        self.answer("REVIEW_EFFICIENCY", p, ReviewEfficiencyCount::default(), &[])
    }
    async fn backlog_cases(&self, p: &OverviewParams) -> QueryResult<BacklogCaseOverview> {
        self.answer("BACKLOG_CASES", p, BacklogCount::new(20, 15, 10.0, 7.5, 2.0), &[])
    }
    async fn recent_delivery(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<RecentDeliveryCaseOverview> {
        self.answer("RECENT_DELIVERY", p, RecentDeliveryCount::default(), WINDOWS)
    }
    async fn lead_time(&self, p: &OverviewParams) -> QueryResult<CaseLeadTimeOverview> {
        self.answer("LEAD_TIME", p, LeadTimeCount::from_samples(&[2.0, 5.0]), &[])
    }
    async fn unplanned_cases(&self, p: &OverviewParams) -> QueryResult<UnplannedCaseOverview> {
        let total = UnplannedWorkCount::new(20, 3, 3, 10.0, 1.5);
        self.answer("UNPLANNED_CASES", p, total, &[])
    }
    async fn growth_trend(&self, p: &OverviewParams) -> QueryResult<CaseGrowthTrendOverview> {
        self.answer("CASE_GROWTH_TREND", p, GrowthTrendCount::new(20, 5, 5), TREND)
    }
    async fn resource_creation(
        &self,
        p: &OverviewParams,
    ) -> QueryResult<ResourceCreationOverview> {
        let total = ResourceCreationCount {
            case_num: 5,
            review_num: 1,
            ..Default::default()
        }
        .with_total();
        self.answer("RESOURCE_CREATION", p, total, &[])
    }
}

pub fn computer(query: &Arc<FakeQuery>) -> OverviewComputer {
    OverviewComputer::new(
        query.clone() as Arc<dyn TaskQuery>,
        query.clone() as Arc<dyn FuncCaseQuery>,
    )
}

pub struct Harness {
    pub repo: Arc<LocalRepository>,
    pub query: Arc<FakeQuery>,
    pub service: AnalysisService<LocalRepository>,
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let repo = Arc::new(LocalRepository::new());
    let query = FakeQuery::new();
    let service = AnalysisService::new(repo.clone(), computer(&query), config);
    Harness {
        repo,
        query,
        service,
    }
}

pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}
