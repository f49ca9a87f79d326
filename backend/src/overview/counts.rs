//! Aggregate count blocks.
//!
//! Each block is a flat record of counts, workloads and rates. Rates are
//! percentages derived in the constructors, so a block that went through
//! `new` (or `from_*`) always carries consistent rates, including after a
//! snapshot round trip. Builders take raw numbers only.

use serde::{Deserialize, Serialize};

/// `numerator / denominator` as a percentage rounded to two decimals,
/// or 0 when the denominator is 0.
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round2(numerator * 100.0 / denominator)
}

/// Integer-count flavour of [`rate`].
pub fn count_rate(numerator: i64, denominator: i64) -> f64 {
    rate(numerator as f64, denominator as f64)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Completion progress (PROGRESS).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressCount {
    pub total_num: i64,
    pub completed_num: i64,
    pub completed_rate: f64,
    pub evaluate_workload: f64,
    pub completed_workload: f64,
    pub completed_workload_rate: f64,
}

impl ProgressCount {
    pub fn new(
        total_num: i64,
        completed_num: i64,
        evaluate_workload: f64,
        completed_workload: f64,
    ) -> Self {
        Self {
            total_num,
            completed_num,
            completed_rate: count_rate(completed_num, total_num),
            evaluate_workload,
            completed_workload,
            completed_workload_rate: rate(completed_workload, evaluate_workload),
        }
    }
}

/// Burn-down summary (BURNDOWN).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BurnDownCount {
    pub total_num: i64,
    pub completed_num: i64,
    pub remaining_num: i64,
    pub remaining_rate: f64,
    pub total_workload: f64,
    pub remaining_workload: f64,
    pub remaining_workload_rate: f64,
}

impl BurnDownCount {
    pub fn new(
        total_num: i64,
        completed_num: i64,
        total_workload: f64,
        remaining_workload: f64,
    ) -> Self {
        let remaining_num = (total_num - completed_num).max(0);
        Self {
            total_num,
            completed_num,
            remaining_num,
            remaining_rate: count_rate(remaining_num, total_num),
            total_workload,
            remaining_workload,
            remaining_workload_rate: rate(remaining_workload, total_workload),
        }
    }
}

/// Workload accounting (WORKLOAD).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadCount {
    pub evaluate_workload: f64,
    pub actual_workload: f64,
    pub completed_workload: f64,
    pub completed_workload_rate: f64,
    pub invalid_workload: f64,
    pub invalid_workload_rate: f64,
    pub saving_workload: f64,
    pub saving_workload_rate: f64,
}

impl WorkloadCount {
    pub fn new(
        evaluate_workload: f64,
        actual_workload: f64,
        completed_workload: f64,
        invalid_workload: f64,
    ) -> Self {
        let saving_workload = (evaluate_workload - actual_workload).max(0.0);
        Self {
            evaluate_workload,
            actual_workload,
            completed_workload,
            completed_workload_rate: rate(completed_workload, evaluate_workload),
            invalid_workload,
            invalid_workload_rate: rate(invalid_workload, evaluate_workload),
            saving_workload,
            saving_workload_rate: rate(saving_workload, evaluate_workload),
        }
    }
}

/// Overdue risk grading.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverdueRisk {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl OverdueRisk {
    /// Grade by overdue rate: 0 none, below 10% low, below 30% medium.
    pub fn from_rate(overdue_rate: f64) -> Self {
        if overdue_rate <= 0.0 {
            OverdueRisk::None
        } else if overdue_rate < 10.0 {
            OverdueRisk::Low
        } else if overdue_rate < 30.0 {
            OverdueRisk::Medium
        } else {
            OverdueRisk::High
        }
    }
}

/// Overdue assessment (OVERDUE_ASSESSMENT).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverdueAssessmentCount {
    pub total_num: i64,
    pub overdue_num: i64,
    pub overdue_rate: f64,
    pub total_workload: f64,
    pub overdue_workload: f64,
    pub overdue_workload_rate: f64,
    pub overdue_time_hours: f64,
    pub daily_processed_workload: f64,
    /// Days needed to clear the overdue workload at the daily pace.
    pub overdue_processing_days: f64,
    pub risk_level: OverdueRisk,
}

impl OverdueAssessmentCount {
    pub fn new(
        total_num: i64,
        overdue_num: i64,
        total_workload: f64,
        overdue_workload: f64,
        overdue_time_hours: f64,
        daily_processed_workload: f64,
    ) -> Self {
        let overdue_rate = count_rate(overdue_num, total_num);
        let overdue_processing_days = if daily_processed_workload > 0.0 {
            round2(overdue_workload / daily_processed_workload)
        } else {
            0.0
        };
        Self {
            total_num,
            overdue_num,
            overdue_rate,
            total_workload,
            overdue_workload,
            overdue_workload_rate: rate(overdue_workload, total_workload),
            overdue_time_hours,
            daily_processed_workload,
            overdue_processing_days,
            risk_level: OverdueRisk::from_rate(overdue_rate),
        }
    }
}

/// Bug counts by validity and severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityCount {
    pub critical_num: i64,
    pub major_num: i64,
    pub minor_num: i64,
    pub trivial_num: i64,
}

impl SeverityCount {
    pub fn total(&self) -> i64 {
        self.critical_num + self.major_num + self.minor_num + self.trivial_num
    }
}

/// Bug quality on the task side (BUGS).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BugCount {
    pub total_bug_num: i64,
    pub valid_bug_num: i64,
    pub valid_bug_rate: f64,
    pub invalid_bug_num: i64,
    pub invalid_bug_rate: f64,
    pub missing_bug_num: i64,
    pub missing_bug_rate: f64,
    pub bug_workload: f64,
    pub total_workload: f64,
    pub bug_workload_rate: f64,
    pub severity: SeverityCount,
}

impl BugCount {
    pub fn new(
        valid_bug_num: i64,
        invalid_bug_num: i64,
        missing_bug_num: i64,
        bug_workload: f64,
        total_workload: f64,
        severity: SeverityCount,
    ) -> Self {
        let total_bug_num = valid_bug_num + invalid_bug_num;
        Self {
            total_bug_num,
            valid_bug_num,
            valid_bug_rate: count_rate(valid_bug_num, total_bug_num),
            invalid_bug_num,
            invalid_bug_rate: count_rate(invalid_bug_num, total_bug_num),
            missing_bug_num,
            missing_bug_rate: count_rate(missing_bug_num, total_bug_num),
            bug_workload,
            total_workload,
            bug_workload_rate: rate(bug_workload, total_workload),
            severity,
        }
    }
}

/// Bugs submitted by testers while executing cases (SUBMITTED_BUGS).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmittedBugCount {
    pub tested_case_num: i64,
    pub submitted_bug_num: i64,
    pub valid_bug_num: i64,
    pub valid_bug_rate: f64,
    pub missing_bug_num: i64,
    pub missing_bug_rate: f64,
    /// Valid bugs found per hundred tested cases.
    pub bug_discovery_rate: f64,
    pub severity: SeverityCount,
}

impl SubmittedBugCount {
    pub fn new(
        tested_case_num: i64,
        submitted_bug_num: i64,
        valid_bug_num: i64,
        missing_bug_num: i64,
        severity: SeverityCount,
    ) -> Self {
        Self {
            tested_case_num,
            submitted_bug_num,
            valid_bug_num,
            valid_bug_rate: count_rate(valid_bug_num, submitted_bug_num),
            missing_bug_num,
            missing_bug_rate: count_rate(missing_bug_num, submitted_bug_num),
            bug_discovery_rate: count_rate(valid_bug_num, tested_case_num),
            severity,
        }
    }
}

/// Task handling efficiency (HANDLING_EFFICIENCY).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlingEfficiencyCount {
    pub total_num: i64,
    pub completed_num: i64,
    pub completed_rate: f64,
    pub one_time_passed_num: i64,
    pub one_time_passed_rate: f64,
    pub two_time_passed_num: i64,
    pub two_time_passed_rate: f64,
    pub total_processing_times: i64,
    pub avg_processing_times: f64,
}

impl HandlingEfficiencyCount {
    pub fn new(
        total_num: i64,
        completed_num: i64,
        one_time_passed_num: i64,
        two_time_passed_num: i64,
        total_processing_times: i64,
    ) -> Self {
        let avg_processing_times = if completed_num > 0 {
            round2(total_processing_times as f64 / completed_num as f64)
        } else {
            0.0
        };
        Self {
            total_num,
            completed_num,
            completed_rate: count_rate(completed_num, total_num),
            one_time_passed_num,
            one_time_passed_rate: count_rate(one_time_passed_num, completed_num),
            two_time_passed_num,
            two_time_passed_rate: count_rate(two_time_passed_num, completed_num),
            total_processing_times,
            avg_processing_times,
        }
    }
}

/// Case testing efficiency (TESTING_EFFICIENCY).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestingEfficiencyCount {
    pub total_case_num: i64,
    pub passed_test_num: i64,
    pub passed_test_rate: f64,
    pub one_time_passed_num: i64,
    pub one_time_passed_rate: f64,
    pub two_time_passed_num: i64,
    pub two_time_passed_rate: f64,
    pub total_test_times: i64,
    pub avg_test_times: f64,
}

impl TestingEfficiencyCount {
    pub fn new(
        total_case_num: i64,
        passed_test_num: i64,
        one_time_passed_num: i64,
        two_time_passed_num: i64,
        total_test_times: i64,
    ) -> Self {
        let avg_test_times = if total_case_num > 0 {
            round2(total_test_times as f64 / total_case_num as f64)
        } else {
            0.0
        };
        Self {
            total_case_num,
            passed_test_num,
            passed_test_rate: count_rate(passed_test_num, total_case_num),
            one_time_passed_num,
            one_time_passed_rate: count_rate(one_time_passed_num, passed_test_num),
            two_time_passed_num,
            two_time_passed_rate: count_rate(two_time_passed_num, passed_test_num),
            total_test_times,
            avg_test_times,
        }
    }
}

/// Case review efficiency (REVIEW_EFFICIENCY).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewEfficiencyCount {
    pub total_case_num: i64,
    pub reviewed_case_num: i64,
    pub review_coverage_rate: f64,
    pub passed_review_num: i64,
    pub passed_review_rate: f64,
    pub one_time_passed_review_num: i64,
    pub one_time_passed_review_rate: f64,
    pub total_review_times: i64,
}

impl ReviewEfficiencyCount {
    pub fn new(
        total_case_num: i64,
        reviewed_case_num: i64,
        passed_review_num: i64,
        one_time_passed_review_num: i64,
        total_review_times: i64,
    ) -> Self {
        Self {
            total_case_num,
            reviewed_case_num,
            review_coverage_rate: count_rate(reviewed_case_num, total_case_num),
            passed_review_num,
            passed_review_rate: count_rate(passed_review_num, reviewed_case_num),
            one_time_passed_review_num,
            one_time_passed_review_rate: count_rate(one_time_passed_review_num, reviewed_case_num),
            total_review_times,
        }
    }
}

/// Headline indicators (CORE_KPI).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreKpiCount {
    pub total_num: i64,
    pub completed_num: i64,
    pub completed_rate: f64,
    pub evaluate_workload: f64,
    pub completed_workload: f64,
    pub completed_workload_rate: f64,
    pub overdue_num: i64,
    pub overdue_rate: f64,
    pub one_time_passed_num: i64,
    pub one_time_passed_rate: f64,
    pub total_processing_times: i64,
}

impl CoreKpiCount {
    pub fn new(
        progress: &ProgressCount,
        overdue_num: i64,
        one_time_passed_num: i64,
        total_processing_times: i64,
    ) -> Self {
        Self {
            total_num: progress.total_num,
            completed_num: progress.completed_num,
            completed_rate: progress.completed_rate,
            evaluate_workload: progress.evaluate_workload,
            completed_workload: progress.completed_workload,
            completed_workload_rate: progress.completed_workload_rate,
            overdue_num,
            overdue_rate: count_rate(overdue_num, progress.total_num),
            one_time_passed_num,
            one_time_passed_rate: count_rate(one_time_passed_num, progress.completed_num),
            total_processing_times,
        }
    }
}

/// Task failure/rework assessment (FAILURES).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailureCount {
    pub total_num: i64,
    pub failure_num: i64,
    pub failure_rate: f64,
    pub one_time_failure_num: i64,
    pub one_time_failure_rate: f64,
    pub two_time_failure_num: i64,
    pub two_time_failure_rate: f64,
    pub total_failure_times: i64,
    pub failure_workload: f64,
}

impl FailureCount {
    pub fn new(
        total_num: i64,
        one_time_failure_num: i64,
        two_time_failure_num: i64,
        failure_num: i64,
        total_failure_times: i64,
        failure_workload: f64,
    ) -> Self {
        Self {
            total_num,
            failure_num,
            failure_rate: count_rate(failure_num, total_num),
            one_time_failure_num,
            one_time_failure_rate: count_rate(one_time_failure_num, total_num),
            two_time_failure_num,
            two_time_failure_rate: count_rate(two_time_failure_num, total_num),
            total_failure_times,
            failure_workload,
        }
    }
}

/// Backlog size and burn pace (BACKLOG_TASKS, BACKLOG_CASES).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacklogCount {
    pub total_num: i64,
    pub backlog_num: i64,
    pub backlog_rate: f64,
    pub total_workload: f64,
    pub backlog_workload: f64,
    pub backlog_workload_rate: f64,
    pub daily_processed_num: f64,
    /// Days needed to clear the backlog at the daily pace.
    pub backlog_processing_days: f64,
}

impl BacklogCount {
    pub fn new(
        total_num: i64,
        backlog_num: i64,
        total_workload: f64,
        backlog_workload: f64,
        daily_processed_num: f64,
    ) -> Self {
        let backlog_processing_days = if daily_processed_num > 0.0 {
            round2(backlog_num as f64 / daily_processed_num)
        } else {
            0.0
        };
        Self {
            total_num,
            backlog_num,
            backlog_rate: count_rate(backlog_num, total_num),
            total_workload,
            backlog_workload,
            backlog_workload_rate: rate(backlog_workload, total_workload),
            daily_processed_num,
            backlog_processing_days,
        }
    }
}

/// Delivery figures for one time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryCount {
    pub total_num: i64,
    pub completed_num: i64,
    pub completed_rate: f64,
    pub overdue_num: i64,
    pub overdue_rate: f64,
    pub total_workload: f64,
    pub completed_workload: f64,
    pub completed_workload_rate: f64,
}

impl DeliveryCount {
    pub fn new(
        total_num: i64,
        completed_num: i64,
        overdue_num: i64,
        total_workload: f64,
        completed_workload: f64,
    ) -> Self {
        Self {
            total_num,
            completed_num,
            completed_rate: count_rate(completed_num, total_num),
            overdue_num,
            overdue_rate: count_rate(overdue_num, total_num),
            total_workload,
            completed_workload,
            completed_workload_rate: rate(completed_workload, total_workload),
        }
    }
}

/// Recent delivery windows (RECENT_DELIVERY).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecentDeliveryCount {
    pub today: DeliveryCount,
    pub last_week: DeliveryCount,
    pub last_month: DeliveryCount,
}

/// Lead time distribution in hours (LEAD_TIME).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeadTimeCount {
    pub completed_num: i64,
    pub total_lead_time_hours: f64,
    pub avg_lead_time_hours: f64,
    pub min_lead_time_hours: f64,
    pub max_lead_time_hours: f64,
    pub p50_lead_time_hours: f64,
    pub p75_lead_time_hours: f64,
    pub p90_lead_time_hours: f64,
    pub p95_lead_time_hours: f64,
}

impl LeadTimeCount {
    /// Summarize completed-item lead times (hours, any order). Non-finite
    /// samples are skipped.
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|s| s.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);
        let total: f64 = sorted.iter().sum();
        Self {
            completed_num: sorted.len() as i64,
            total_lead_time_hours: round2(total),
            avg_lead_time_hours: round2(total / sorted.len() as f64),
            min_lead_time_hours: sorted[0],
            max_lead_time_hours: sorted[sorted.len() - 1],
            p50_lead_time_hours: percentile(&sorted, 50.0),
            p75_lead_time_hours: percentile(&sorted, 75.0),
            p90_lead_time_hours: percentile(&sorted, 90.0),
            p95_lead_time_hours: percentile(&sorted, 95.0),
        }
    }
}

/// Nearest-rank percentile over ascending samples.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Work added after planning (UNPLANNED_TASKS, UNPLANNED_CASES).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnplannedWorkCount {
    pub total_num: i64,
    pub unplanned_num: i64,
    pub unplanned_rate: f64,
    pub unplanned_completed_num: i64,
    pub unplanned_completed_rate: f64,
    pub total_workload: f64,
    pub unplanned_workload: f64,
    pub unplanned_workload_rate: f64,
}

impl UnplannedWorkCount {
    pub fn new(
        total_num: i64,
        unplanned_num: i64,
        unplanned_completed_num: i64,
        total_workload: f64,
        unplanned_workload: f64,
    ) -> Self {
        Self {
            total_num,
            unplanned_num,
            unplanned_rate: count_rate(unplanned_num, total_num),
            unplanned_completed_num,
            unplanned_completed_rate: count_rate(unplanned_completed_num, unplanned_num),
            total_workload,
            unplanned_workload,
            unplanned_workload_rate: rate(unplanned_workload, total_workload),
        }
    }
}

/// Growth across the calculation window (TASK_GROWTH_TREND, CASE_GROWTH_TREND).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrowthTrendCount {
    pub total_num: i64,
    pub added_num: i64,
    pub growth_rate: f64,
    pub avg_daily_added_num: f64,
}

impl GrowthTrendCount {
    /// `total_num` is the size at the end of a window of `days` days.
    pub fn new(total_num: i64, added_num: i64, days: i64) -> Self {
        let avg_daily_added_num = if days > 0 {
            round2(added_num as f64 / days as f64)
        } else {
            0.0
        };
        Self {
            total_num,
            added_num,
            growth_rate: count_rate(added_num, total_num - added_num),
            avg_daily_added_num,
        }
    }
}

/// Resources created in the window, by kind (RESOURCE_CREATION).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceCreationCount {
    pub total_num: i64,
    pub plan_num: i64,
    pub sprint_num: i64,
    pub task_num: i64,
    pub case_num: i64,
    pub review_num: i64,
    pub baseline_num: i64,
    pub meeting_num: i64,
    pub analysis_num: i64,
}

impl ResourceCreationCount {
    /// Recompute `total_num` from the per-kind counts.
    pub fn with_total(mut self) -> Self {
        self.total_num = self.plan_num
            + self.sprint_num
            + self.task_num
            + self.case_num
            + self.review_num
            + self.baseline_num
            + self.meeting_num
            + self.analysis_num;
        self
    }
}
