//! Overview model.
//!
//! An overview is the computed report for one template: an aggregate count
//! block, optional per-assignee blocks of the same shape, and optional
//! row-level details. Every concrete report is an [`OverviewReport`] over a
//! count block `C` and a detail row `R`; the per-resource enums
//! [`TaskOverview`] and [`CaseOverview`] name which pairing each template uses.

pub mod case;
pub mod counts;
pub mod details;
pub mod task;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{AnalysisTemplate, UserId};

pub use case::*;
pub use counts::*;
pub use details::*;
pub use task::*;

/// A named, ordered group of detail rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailGroup<R> {
    pub name: String,
    pub rows: Vec<R>,
}

impl<R> DetailGroup<R> {
    pub fn new(name: impl Into<String>, rows: Vec<R>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Detail payload: either one flat list or an ordered list of named groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataDetails<R> {
    Flat(Vec<R>),
    Grouped(Vec<DetailGroup<R>>),
}

impl<R> DataDetails<R> {
    pub fn is_empty(&self) -> bool {
        match self {
            DataDetails::Flat(rows) => rows.is_empty(),
            DataDetails::Grouped(groups) => groups.is_empty(),
        }
    }
}

/// Borrowed, type-erased view of a detail payload.
pub enum DetailPayload<'a> {
    Flat(Vec<&'a dyn DetailRow>),
    Grouped(Vec<(&'a str, Vec<&'a dyn DetailRow>)>),
}

/// Accessors the export projector works through.
pub trait TabularOverview {
    fn titles(&self) -> &[String];
    fn details(&self) -> Option<DetailPayload<'_>>;
}

/// One computed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverviewReport<C, R> {
    pub total_overview: C,
    #[serde(default = "BTreeMap::new")]
    pub assignees_overview: BTreeMap<UserId, C>,
    #[serde(default)]
    pub data_detail_titles: Vec<String>,
    #[serde(default = "none")]
    pub data_details: Option<DataDetails<R>>,
}

fn none<T>() -> Option<T> {
    None
}

impl<C, R: DetailSchema> OverviewReport<C, R> {
    pub fn new(total_overview: C) -> Self {
        Self {
            total_overview,
            assignees_overview: BTreeMap::new(),
            data_detail_titles: Vec::new(),
            data_details: None,
        }
    }

    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = (UserId, C)>) -> Self {
        self.assignees_overview = assignees.into_iter().collect();
        self
    }

    /// Attach a flat detail list, titled by the row type.
    pub fn with_details(mut self, rows: Vec<R>) -> Self {
        self.data_detail_titles = R::titles();
        self.data_details = Some(DataDetails::Flat(rows));
        self
    }

    /// Attach grouped details; group order is kept as given.
    pub fn with_groups(mut self, groups: Vec<DetailGroup<R>>) -> Self {
        self.data_detail_titles = R::titles();
        self.data_details = Some(DataDetails::Grouped(groups));
        self
    }
}

impl<C, R: DetailRow> TabularOverview for OverviewReport<C, R> {
    fn titles(&self) -> &[String] {
        &self.data_detail_titles
    }

    fn details(&self) -> Option<DetailPayload<'_>> {
        let details = self.data_details.as_ref()?;
        Some(match details {
            DataDetails::Flat(rows) => {
                DetailPayload::Flat(rows.iter().map(|r| r as &dyn DetailRow).collect())
            }
            DataDetails::Grouped(groups) => DetailPayload::Grouped(
                groups
                    .iter()
                    .map(|g| {
                        (
                            g.name.as_str(),
                            g.rows.iter().map(|r| r as &dyn DetailRow).collect(),
                        )
                    })
                    .collect(),
            ),
        })
    }
}

/// Declares a per-resource overview enum whose variants mirror the template
/// enum one to one.
macro_rules! overview_enum {
    (
        $(#[$meta:meta])*
        $name:ident for $template:ident { $($variant:ident($ty:ty)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum $name {
            $($variant($ty),)+
        }

        impl $name {
            pub fn template(&self) -> $template {
                match self {
                    $($name::$variant(_) => $template::$variant,)+
                }
            }

            pub fn tabular(&self) -> &dyn $crate::overview::TabularOverview {
                match self {
                    $($name::$variant(report) => report,)+
                }
            }
        }
    };
}
pub(crate) use overview_enum;

/// A resolved overview of either resource kind.
///
/// Serializes as the bare report; the template it belongs to is carried
/// out of band.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Overview {
    Task(TaskOverview),
    Case(CaseOverview),
}

impl Overview {
    pub fn template(&self) -> AnalysisTemplate {
        match self {
            Overview::Task(o) => AnalysisTemplate::Task(o.template()),
            Overview::Case(o) => AnalysisTemplate::Case(o.template()),
        }
    }

    pub fn tabular(&self) -> &dyn TabularOverview {
        match self {
            Overview::Task(o) => o.tabular(),
            Overview::Case(o) => o.tabular(),
        }
    }
}

impl TabularOverview for Overview {
    fn titles(&self) -> &[String] {
        self.tabular().titles()
    }

    fn details(&self) -> Option<DetailPayload<'_>> {
        self.tabular().details()
    }
}

impl From<TaskOverview> for Overview {
    fn from(o: TaskOverview) -> Self {
        Overview::Task(o)
    }
}

impl From<CaseOverview> for Overview {
    fn from(o: CaseOverview) -> Self {
        Overview::Case(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaseTemplate, TaskTemplate};

    fn progress() -> ProgressOverview {
        ProgressOverview::new(ProgressCount::new(3, 1, 6.0, 2.0))
            .with_assignees([(UserId(1), ProgressCount::new(1, 1, 2.0, 2.0))])
            .with_details(vec![
                TaskProgressDetail {
                    code: "T-2".to_string(),
                    ..Default::default()
                },
                TaskProgressDetail {
                    code: "T-1".to_string(),
                    ..Default::default()
                },
            ])
    }

    #[test]
    fn test_with_details_sets_titles() {
        let report = progress();
        assert_eq!(report.data_detail_titles.len(), TaskProgressDetail::TITLES.len());
        assert_eq!(report.data_detail_titles[0], "Code");
    }

    #[test]
    fn test_tabular_flat_keeps_order() {
        let report = progress();
        match report.details() {
            Some(DetailPayload::Flat(rows)) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].cells()[0], "T-2");
                assert_eq!(rows[1].cells()[0], "T-1");
            }
            _ => panic!("expected flat details"),
        }
    }

    #[test]
    fn test_tabular_absent_details() {
        let report = ProgressOverview::new(ProgressCount::default());
        assert!(report.details().is_none());
        assert!(report.titles().is_empty());
    }

    #[test]
    fn test_overview_reports_its_template() {
        let task: Overview = TaskOverview::Progress(progress()).into();
        assert_eq!(task.template(), AnalysisTemplate::Task(TaskTemplate::Progress));

        let bugs = TesterSubmittedBugOverview::new(SubmittedBugCount::default());
        let case: Overview = CaseOverview::SubmittedBugs(bugs).into();
        assert_eq!(case.template(), AnalysisTemplate::Case(CaseTemplate::SubmittedBugs));
    }

    #[test]
    fn test_overview_serializes_without_tag() {
        let overview: Overview = TaskOverview::Progress(progress()).into();
        let json = serde_json::to_value(&overview).unwrap();
        assert!(json.get("total_overview").is_some());
        assert_eq!(json["total_overview"]["completed_rate"], 33.33);
        assert_eq!(json["assignees_overview"]["1"]["total_num"], 1);
        assert!(json["data_details"]["FLAT"].is_array());
    }
}
