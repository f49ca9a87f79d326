use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{analyses, analysis_snapshots};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    Analysis, AnalysisDataSource, AnalysisId, AnalysisResource, AnalysisSnapshot, OrgId, OrgType,
    PlanId, ProjectId, UserId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = analyses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AnalysisRow {
    pub id: i64,
    pub project_id: i64,
    pub plan_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub resource: String,
    pub template: String,
    pub org_type: Option<String>,
    pub org_id: Option<i64>,
    pub calc_start_time: Option<DateTime<Utc>>,
    pub calc_end_time: Option<DateTime<Utc>>,
    pub contains_user_analysis: bool,
    pub contains_data_detail: bool,
    pub datasource: String,
    pub created_by: i64,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

/// Column values written on insert and update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = analyses)]
#[diesel(treat_none_as_null = true)]
pub struct AnalysisChanges {
    pub project_id: i64,
    pub plan_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub resource: String,
    pub template: String,
    pub org_type: Option<String>,
    pub org_id: Option<i64>,
    pub calc_start_time: Option<DateTime<Utc>>,
    pub calc_end_time: Option<DateTime<Utc>>,
    pub contains_user_analysis: bool,
    pub contains_data_detail: bool,
    pub datasource: String,
    pub created_by: i64,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl From<&Analysis> for AnalysisChanges {
    fn from(a: &Analysis) -> Self {
        Self {
            project_id: a.project_id.value(),
            plan_id: a.plan_id.map(|p| p.value()),
            name: a.name.clone(),
            description: a.description.clone(),
            resource: a.resource.as_str().to_string(),
            template: a.template_name.clone(),
            org_type: a.org_type.map(|o| o.as_str().to_string()),
            org_id: a.org_id.map(|o| o.value()),
            calc_start_time: a.calc_start_time,
            calc_end_time: a.calc_end_time,
            contains_user_analysis: a.contains_user_analysis,
            contains_data_detail: a.contains_data_detail,
            datasource: a.datasource.as_str().to_string(),
            created_by: a.created_by.value(),
            created_date: a.created_date,
            last_modified_date: a.last_modified_date,
        }
    }
}

fn corrupt_column(entity: &str, id: i64, column: &str, value: &str) -> RepositoryError {
    RepositoryError::internal_with_context(
        format!("Unrecognised {} value '{}'", column, value),
        ErrorContext::new("decode_row")
            .with_entity(entity)
            .with_entity_id(id),
    )
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = RepositoryError;

    fn try_from(row: AnalysisRow) -> RepositoryResult<Self> {
        let resource: AnalysisResource = row
            .resource
            .parse()
            .map_err(|_| corrupt_column("analysis", row.id, "resource", &row.resource))?;
        let datasource = AnalysisDataSource::parse(&row.datasource)
            .ok_or_else(|| corrupt_column("analysis", row.id, "datasource", &row.datasource))?;
        let org_type = match row.org_type.as_deref() {
            Some(raw) => Some(
                OrgType::parse(raw)
                    .ok_or_else(|| corrupt_column("analysis", row.id, "org_type", raw))?,
            ),
            None => None,
        };

        Ok(Analysis {
            id: Some(AnalysisId(row.id)),
            project_id: ProjectId(row.project_id),
            plan_id: row.plan_id.map(PlanId),
            name: row.name,
            description: row.description,
            resource,
            template_name: row.template,
            org_type,
            org_id: row.org_id.map(OrgId),
            calc_start_time: row.calc_start_time,
            calc_end_time: row.calc_end_time,
            contains_user_analysis: row.contains_user_analysis,
            contains_data_detail: row.contains_data_detail,
            datasource,
            created_by: UserId(row.created_by),
            created_date: row.created_date,
            last_modified_date: row.last_modified_date,
            data_obj: None,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = analysis_snapshots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SnapshotRow {
    pub analysis_id: i64,
    pub resource: String,
    pub template: String,
    pub data: String,
    pub checksum: String,
    pub created_date: DateTime<Utc>,
}

impl From<&AnalysisSnapshot> for SnapshotRow {
    fn from(s: &AnalysisSnapshot) -> Self {
        Self {
            analysis_id: s.analysis_id.value(),
            resource: s.resource.as_str().to_string(),
            template: s.template.clone(),
            data: s.data.clone(),
            checksum: s.checksum.clone(),
            created_date: s.created_date,
        }
    }
}

impl TryFrom<SnapshotRow> for AnalysisSnapshot {
    type Error = RepositoryError;

    fn try_from(row: SnapshotRow) -> RepositoryResult<Self> {
        let resource: AnalysisResource = row
            .resource
            .parse()
            .map_err(|_| corrupt_column("snapshot", row.analysis_id, "resource", &row.resource))?;
        Ok(AnalysisSnapshot {
            analysis_id: AnalysisId(row.analysis_id),
            resource,
            template: row.template,
            data: row.data,
            checksum: row.checksum,
            created_date: row.created_date,
        })
    }
}
