//! Report templates for the two resource families.
//!
//! Each resource kind owns a closed template enumeration. A template name is
//! only meaningful together with its resource: `PROGRESS` exists on both
//! axes but selects different report types, and the two tables are never
//! consulted across axes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level axis separating the two template enumerations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisResource {
    Task,
    Case,
}

impl AnalysisResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisResource::Task => "TASK",
            AnalysisResource::Case => "CASE",
        }
    }
}

impl fmt::Display for AnalysisResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisResource {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TASK" => Ok(AnalysisResource::Task),
            "CASE" | "FUNC_CASE" => Ok(AnalysisResource::Case),
            _ => Err(TemplateError::UnknownResource(s.to_string())),
        }
    }
}

/// Errors raised while resolving a template name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unknown analysis resource: {0}")]
    UnknownResource(String),

    #[error("Template '{template}' is not defined for resource {resource}")]
    InvalidPairing {
        resource: AnalysisResource,
        template: String,
    },
}

/// Defines a template enum with its wire names and the full member list.
macro_rules! template_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $resource:expr, { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn resource(&self) -> AnalysisResource {
                $resource
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TemplateError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(TemplateError::InvalidPairing {
                        resource: $resource,
                        template: other.to_string(),
                    }),
                }
            }
        }
    };
}

template_enum!(
    /// Templates available for task analyses.
    TaskTemplate, AnalysisResource::Task, {
        Progress => "PROGRESS",
        Burndown => "BURNDOWN",
        Workload => "WORKLOAD",
        OverdueAssessment => "OVERDUE_ASSESSMENT",
        Bugs => "BUGS",
        HandlingEfficiency => "HANDLING_EFFICIENCY",
        CoreKpi => "CORE_KPI",
        Failures => "FAILURES",
        BacklogTasks => "BACKLOG_TASKS",
        RecentDelivery => "RECENT_DELIVERY",
        LeadTime => "LEAD_TIME",
        UnplannedTasks => "UNPLANNED_TASKS",
        TaskGrowthTrend => "TASK_GROWTH_TREND",
        ResourceCreation => "RESOURCE_CREATION",
    }
);

template_enum!(
    /// Templates available for functional test case analyses.
    CaseTemplate, AnalysisResource::Case, {
        Progress => "PROGRESS",
        Burndown => "BURNDOWN",
        Workload => "WORKLOAD",
        OverdueAssessment => "OVERDUE_ASSESSMENT",
        SubmittedBugs => "SUBMITTED_BUGS",
        TestingEfficiency => "TESTING_EFFICIENCY",
        CoreKpi => "CORE_KPI",
        ReviewEfficiency => "REVIEW_EFFICIENCY",
        BacklogCases => "BACKLOG_CASES",
        RecentDelivery => "RECENT_DELIVERY",
        LeadTime => "LEAD_TIME",
        UnplannedCases => "UNPLANNED_CASES",
        CaseGrowthTrend => "CASE_GROWTH_TREND",
        ResourceCreation => "RESOURCE_CREATION",
    }
);

/// A template bound to its resource axis.
///
/// This is the only way the rest of the crate refers to a template, so a
/// case template can never be looked up in the task tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AnalysisTemplate {
    Task(TaskTemplate),
    Case(CaseTemplate),
}

impl AnalysisTemplate {
    /// Resolve a stored `(resource, template)` pair.
    pub fn parse(resource: AnalysisResource, template: &str) -> Result<Self, TemplateError> {
        match resource {
            AnalysisResource::Task => template.parse().map(AnalysisTemplate::Task),
            AnalysisResource::Case => template.parse().map(AnalysisTemplate::Case),
        }
    }

    pub fn resource(&self) -> AnalysisResource {
        match self {
            AnalysisTemplate::Task(t) => t.resource(),
            AnalysisTemplate::Case(t) => t.resource(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisTemplate::Task(t) => t.as_str(),
            AnalysisTemplate::Case(t) => t.as_str(),
        }
    }

    /// Every template on both axes.
    pub fn all() -> impl Iterator<Item = AnalysisTemplate> {
        TaskTemplate::ALL
            .iter()
            .copied()
            .map(AnalysisTemplate::Task)
            .chain(CaseTemplate::ALL.iter().copied().map(AnalysisTemplate::Case))
    }
}

impl fmt::Display for AnalysisTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource(), self.name())
    }
}

impl From<TaskTemplate> for AnalysisTemplate {
    fn from(t: TaskTemplate) -> Self {
        AnalysisTemplate::Task(t)
    }
}

impl From<CaseTemplate> for AnalysisTemplate {
    fn from(t: CaseTemplate) -> Self {
        AnalysisTemplate::Case(t)
    }
}
