//! Row-level detail records.
//!
//! Every row renders itself as an ordered array of string cells matching the
//! titles its type declares. The export projector only ever sees rows through
//! [`DetailRow`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserId;

/// Render self as an ordered array of string cells.
pub trait DetailRow {
    fn cells(&self) -> Vec<String>;
}

/// A row type with a fixed column layout.
pub trait DetailSchema: DetailRow {
    const TITLES: &'static [&'static str];

    fn titles() -> Vec<String> {
        Self::TITLES.iter().map(|t| t.to_string()).collect()
    }
}

/// Conversion of a single field into its cell text.
pub trait Cell {
    fn cell(&self) -> String;
}

impl Cell for String {
    fn cell(&self) -> String {
        self.clone()
    }
}

impl Cell for i64 {
    fn cell(&self) -> String {
        self.to_string()
    }
}

impl Cell for f64 {
    fn cell(&self) -> String {
        self.to_string()
    }
}

impl Cell for bool {
    fn cell(&self) -> String {
        if *self { "Yes" } else { "No" }.to_string()
    }
}

impl Cell for UserId {
    fn cell(&self) -> String {
        self.to_string()
    }
}

impl Cell for NaiveDate {
    fn cell(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl Cell for DateTime<Utc> {
    fn cell(&self) -> String {
        self.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl<T: Cell> Cell for Option<T> {
    fn cell(&self) -> String {
        self.as_ref().map(Cell::cell).unwrap_or_default()
    }
}

/// Declares a detail row struct whose column order is its field order.
macro_rules! detail_row {
    (
        $(#[$meta:meta])*
        $name:ident { $($title:literal => $field:ident: $ty:ty),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl DetailRow for $name {
            fn cells(&self) -> Vec<String> {
                vec![$(Cell::cell(&self.$field)),+]
            }
        }

        impl DetailSchema for $name {
            const TITLES: &'static [&'static str] = &[$($title),+];
        }
    };
}

detail_row!(
    /// One task in a progress-style listing.
    TaskProgressDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Type" => task_type: String,
        "Status" => status: String,
        "Assignee" => assignee_name: Option<String>,
        "Evaluated Workload" => evaluate_workload: f64,
        "Actual Workload" => actual_workload: f64,
        "Completed" => completed: bool,
        "Overdue" => overdue: bool,
        "Start Date" => start_date: Option<DateTime<Utc>>,
        "Deadline" => deadline: Option<DateTime<Utc>>,
        "Completed Date" => completed_date: Option<DateTime<Utc>>,
    }
);

detail_row!(
    /// One day of a burn-down series.
    BurnDownPoint {
        "Date" => time: Option<NaiveDate>,
        "Remaining" => remaining: f64,
        "Ideal" => ideal: f64,
        "Completed" => completed: f64,
    }
);

detail_row!(
    TaskWorkloadDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Assignee" => assignee_name: Option<String>,
        "Evaluated Workload" => evaluate_workload: f64,
        "Actual Workload" => actual_workload: f64,
        "Remaining Workload" => remaining_workload: f64,
        "Invalid" => invalid: bool,
    }
);

detail_row!(
    TaskOverdueDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Assignee" => assignee_name: Option<String>,
        "Deadline" => deadline: Option<DateTime<Utc>>,
        "Overdue Hours" => overdue_hours: f64,
        "Evaluated Workload" => evaluate_workload: f64,
    }
);

detail_row!(
    /// A bug task with its quality classification.
    BugDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Severity" => severity: String,
        "Valid" => valid: bool,
        "Missing" => missing: bool,
        "Assignee" => assignee_name: Option<String>,
        "Actual Workload" => actual_workload: f64,
    }
);

detail_row!(
    TaskEfficiencyDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Assignee" => assignee_name: Option<String>,
        "Processing Times" => processing_times: i64,
        "Failure Times" => failure_times: i64,
        "Completed" => completed: bool,
        "Evaluated Workload" => evaluate_workload: f64,
        "Actual Workload" => actual_workload: f64,
    }
);

detail_row!(
    LeadTimeDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Assignee" => assignee_name: Option<String>,
        "Created Date" => created_date: Option<DateTime<Utc>>,
        "Completed Date" => completed_date: Option<DateTime<Utc>>,
        "Lead Time (h)" => lead_time_hours: f64,
    }
);

detail_row!(
    /// One period of a growth series.
    TrendPoint {
        "Date" => time: Option<NaiveDate>,
        "Total" => total_num: i64,
        "Added" => added_num: i64,
    }
);

detail_row!(
    ResourceCreationDetail {
        "Resource Type" => resource_type: String,
        "Name" => name: String,
        "Creator" => creator_id: Option<UserId>,
        "Created Date" => created_date: Option<DateTime<Utc>>,
    }
);

detail_row!(
    /// One test case in a progress-style listing.
    CaseProgressDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Module" => module_name: Option<String>,
        "Tester" => tester_name: Option<String>,
        "Test Result" => test_result: String,
        "Review Status" => review_status: String,
        "Evaluated Workload" => evaluate_workload: f64,
        "Overdue" => overdue: bool,
        "Deadline" => deadline: Option<DateTime<Utc>>,
        "Completed Date" => completed_date: Option<DateTime<Utc>>,
    }
);

detail_row!(
    CaseWorkloadDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Tester" => tester_name: Option<String>,
        "Evaluated Workload" => evaluate_workload: f64,
        "Actual Workload" => actual_workload: f64,
        "Invalid" => invalid: bool,
    }
);

detail_row!(
    /// A bug raised by a tester against a case run.
    SubmittedBugDetail {
        "Bug Code" => bug_code: String,
        "Bug Name" => bug_name: String,
        "Case Code" => case_code: String,
        "Tester" => tester_name: Option<String>,
        "Severity" => severity: String,
        "Valid" => valid: bool,
        "Missing" => missing: bool,
        "Submitted Date" => submitted_date: Option<DateTime<Utc>>,
    }
);

detail_row!(
    CaseTestingDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Tester" => tester_name: Option<String>,
        "Test Times" => test_times: i64,
        "Passed" => passed: bool,
        "Last Result" => last_result: String,
    }
);

detail_row!(
    CaseReviewDetail {
        "Code" => code: String,
        "Name" => name: String,
        "Reviewer" => reviewer_name: Option<String>,
        "Review Times" => review_times: i64,
        "Review Status" => review_status: String,
        "Reviewed Date" => reviewed_date: Option<DateTime<Utc>>,
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cells_follow_titles() {
        let row = TaskProgressDetail {
            code: "T-1".to_string(),
            name: "Login".to_string(),
            task_type: "STORY".to_string(),
            status: "DONE".to_string(),
            assignee_name: None,
            evaluate_workload: 2.5,
            completed: true,
            deadline: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
            ..Default::default()
        };
        let cells = row.cells();
        assert_eq!(cells.len(), TaskProgressDetail::TITLES.len());
        assert_eq!(cells[0], "T-1");
        assert_eq!(cells[4], "");
        assert_eq!(cells[5], "2.5");
        assert_eq!(cells[7], "Yes");
        assert_eq!(cells[10], "2024-03-01 09:30:00");
    }

    #[test]
    fn test_every_row_type_matches_its_titles() {
        fn check<R: DetailSchema + Default>() {
            assert_eq!(R::default().cells().len(), R::TITLES.len());
        }
        check::<TaskProgressDetail>();
        check::<BurnDownPoint>();
        check::<TaskWorkloadDetail>();
        check::<TaskOverdueDetail>();
        check::<BugDetail>();
        check::<TaskEfficiencyDetail>();
        check::<LeadTimeDetail>();
        check::<TrendPoint>();
        check::<ResourceCreationDetail>();
        check::<CaseProgressDetail>();
        check::<CaseWorkloadDetail>();
        check::<SubmittedBugDetail>();
        check::<CaseTestingDetail>();
        check::<CaseReviewDetail>();
    }

    #[test]
    fn test_date_cells() {
        let point = TrendPoint {
            time: NaiveDate::from_ymd_opt(2024, 5, 17),
            total_num: 12,
            added_num: 3,
        };
        assert_eq!(point.cells(), vec!["2024-05-17", "12", "3"]);
    }
}
