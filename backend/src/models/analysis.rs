//! Analysis configuration records and their persisted snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::template::{AnalysisResource, AnalysisTemplate, TemplateError};
use super::{AnalysisId, OrgId, PlanId, ProjectId, UserId};
use crate::overview::Overview;

/// Organization scope an analysis is restricted to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgType {
    User,
    Dept,
    Group,
}

impl OrgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgType::User => "USER",
            OrgType::Dept => "DEPT",
            OrgType::Group => "GROUP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Some(OrgType::User),
            "DEPT" => Some(OrgType::Dept),
            "GROUP" => Some(OrgType::Group),
            _ => None,
        }
    }
}

/// Where `detail()` reads the overview from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisDataSource {
    /// Recompute on every read.
    #[default]
    Live,
    /// Serve the stored snapshot, computing it on first read.
    SnapshotData,
}

impl AnalysisDataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisDataSource::Live => "LIVE",
            AnalysisDataSource::SnapshotData => "SNAPSHOT_DATA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LIVE" | "REAL_TIME_DATA" => Some(AnalysisDataSource::Live),
            "SNAPSHOT_DATA" => Some(AnalysisDataSource::SnapshotData),
            _ => None,
        }
    }
}

/// Long-lived analysis configuration.
///
/// `template` is kept as the stored string; [`Analysis::template`] binds it to
/// the resource axis and fails for pairs that do not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Option<AnalysisId>,
    pub project_id: ProjectId,
    pub plan_id: Option<PlanId>,
    pub name: String,
    pub description: Option<String>,
    pub resource: AnalysisResource,
    #[serde(rename = "template")]
    pub template_name: String,
    pub org_type: Option<OrgType>,
    pub org_id: Option<OrgId>,
    pub calc_start_time: Option<DateTime<Utc>>,
    pub calc_end_time: Option<DateTime<Utc>>,
    pub contains_user_analysis: bool,
    pub contains_data_detail: bool,
    pub datasource: AnalysisDataSource,
    pub created_by: UserId,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    /// Resolved overview; populated on read and never persisted.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub data_obj: Option<Overview>,
}

impl Analysis {
    /// Start a new analysis with no scope filters.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        template: AnalysisTemplate,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            project_id,
            plan_id: None,
            name: name.into(),
            description: None,
            resource: template.resource(),
            template_name: template.name().to_string(),
            org_type: None,
            org_id: None,
            calc_start_time: None,
            calc_end_time: None,
            contains_user_analysis: false,
            contains_data_detail: false,
            datasource: AnalysisDataSource::Live,
            created_by,
            created_date: now,
            last_modified_date: now,
            data_obj: None,
        }
    }

    /// Bind the stored template name to this analysis's resource axis.
    pub fn template(&self) -> Result<AnalysisTemplate, TemplateError> {
        AnalysisTemplate::parse(self.resource, &self.template_name)
    }

    /// Replace resource and template together.
    pub fn set_template(&mut self, template: AnalysisTemplate) {
        self.resource = template.resource();
        self.template_name = template.name().to_string();
    }

    pub fn is_snapshot(&self) -> bool {
        self.datasource == AnalysisDataSource::SnapshotData
    }

    /// Whether a snapshot taken under `other`'s configuration would still
    /// describe this analysis.
    pub fn same_computation(&self, other: &Analysis) -> bool {
        self.resource == other.resource
            && self.template_name == other.template_name
            && self.project_id == other.project_id
            && self.plan_id == other.plan_id
            && self.org_type == other.org_type
            && self.org_id == other.org_id
            && self.calc_start_time == other.calc_start_time
            && self.calc_end_time == other.calc_end_time
            && self.contains_user_analysis == other.contains_user_analysis
            && self.contains_data_detail == other.contains_data_detail
    }

    /// Copy of this record without the resolved overview.
    pub fn without_data(&self) -> Analysis {
        Analysis {
            data_obj: None,
            ..self.clone()
        }
    }
}

/// Listing filter for analyses. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFilter {
    pub project_id: Option<ProjectId>,
    pub created_by: Option<UserId>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub resource: Option<AnalysisResource>,
    pub name_contains: Option<String>,
}

impl AnalysisFilter {
    pub fn matches(&self, analysis: &Analysis) -> bool {
        if let Some(project_id) = self.project_id {
            if analysis.project_id != project_id {
                return false;
            }
        }
        if let Some(created_by) = self.created_by {
            if analysis.created_by != created_by {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if analysis.created_date < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if analysis.created_date > before {
                return false;
            }
        }
        if let Some(resource) = self.resource {
            if analysis.resource != resource {
                return false;
            }
        }
        if let Some(ref needle) = self.name_contains {
            if !analysis
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    /// `LIKE` pattern matching `name_contains` as a literal substring, with
    /// `\`, `%` and `_` escaped.
    pub fn name_pattern(&self) -> Option<String> {
        self.name_contains.as_ref().map(|needle| {
            let mut pattern = String::with_capacity(needle.len() + 2);
            pattern.push('%');
            for c in needle.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

/// Serialized overview cached for one analysis.
///
/// The blob carries no type tag of its own, so the `(resource, template)` it
/// was written under is stored beside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub analysis_id: AnalysisId,
    pub resource: AnalysisResource,
    pub template: String,
    pub data: String,
    /// SHA-256 hex of `data`.
    pub checksum: String,
    pub created_date: DateTime<Utc>,
}

impl AnalysisSnapshot {
    pub fn template(&self) -> Result<AnalysisTemplate, TemplateError> {
        AnalysisTemplate::parse(self.resource, &self.template)
    }

    /// Whether this snapshot was written under `template`.
    pub fn written_under(&self, template: AnalysisTemplate) -> bool {
        self.resource == template.resource() && self.template == template.name()
    }
}
