//! Snapshot codec.
//!
//! Blobs are plain JSON of the report, with no type tag. The concrete type
//! to decode into comes from the `(resource, template)` pair stored next to
//! the blob, resolved through the registry's decode table.

use chrono::Utc;
use log::debug;

use super::error::{AnalysisError, CodecError};
use crate::db::{calculate_checksum, verify_checksum};
use crate::models::{AnalysisId, AnalysisResource, AnalysisSnapshot, AnalysisTemplate};
use crate::overview::Overview;
use crate::registry;

/// Serialize `overview` to its snapshot blob.
///
/// The blob is decoded once under the overview's own template before it is
/// returned. serde_json writes non-finite floats as `null`, which no report
/// type reads back, so such an overview fails here with
/// [`CodecError::Unreadable`] instead of being stored.
pub fn encode(overview: &Overview) -> Result<String, CodecError> {
    let template = overview.template();
    let blob = serde_json::to_string(overview).map_err(|source| CodecError::Encode {
        template: template.to_string(),
        source,
    })?;
    registry::decode(template, &blob).map_err(|source| CodecError::Unreadable {
        template: template.to_string(),
        source,
    })?;
    Ok(blob)
}

/// Decode `blob` as the report type bound to `template`.
///
/// ```
/// use analysis_overview::models::TaskTemplate;
/// use analysis_overview::overview::{Overview, ProgressCount, ProgressOverview, TaskOverview};
/// use analysis_overview::services::codec;
///
/// let overview: Overview =
///     TaskOverview::Progress(ProgressOverview::new(ProgressCount::new(4, 1, 8.0, 6.0))).into();
/// let blob = codec::encode(&overview).unwrap();
///
/// assert_eq!(codec::decode(TaskTemplate::Progress.into(), &blob).unwrap(), overview);
/// assert!(codec::decode(TaskTemplate::CoreKpi.into(), &blob).is_err());
/// ```
pub fn decode(template: AnalysisTemplate, blob: &str) -> Result<Overview, CodecError> {
    registry::decode(template, blob).map_err(|source| CodecError::Decode {
        resource: template.resource(),
        template: template.name().to_string(),
        source,
    })
}

/// Decode using a stored `(resource, template)` pair.
///
/// An unknown template name is a validation error; a blob that does not
/// match the bound report type is [`CodecError::Decode`].
pub fn decode_stored(
    resource: AnalysisResource,
    template: &str,
    blob: &str,
) -> Result<Overview, AnalysisError> {
    let template = AnalysisTemplate::parse(resource, template)?;
    Ok(decode(template, blob)?)
}

/// Encode `overview` into a snapshot record for `analysis_id`.
///
/// The stored pair and checksum are derived from the overview itself, so a
/// record built here always decodes under the template it names.
pub fn to_snapshot(
    analysis_id: AnalysisId,
    overview: &Overview,
) -> Result<AnalysisSnapshot, CodecError> {
    let template = overview.template();
    let data = encode(overview)?;
    debug!(
        "Encoded {} snapshot for analysis {} ({} bytes)",
        template,
        analysis_id,
        data.len()
    );
    Ok(AnalysisSnapshot {
        analysis_id,
        resource: template.resource(),
        template: template.name().to_string(),
        checksum: calculate_checksum(&data),
        data,
        created_date: Utc::now(),
    })
}

/// Verify and decode a stored snapshot under the pair it was written with.
///
/// The checksum is checked first; a mismatch never reaches the decoder.
pub fn from_snapshot(snapshot: &AnalysisSnapshot) -> Result<Overview, AnalysisError> {
    if !verify_checksum(&snapshot.data, &snapshot.checksum) {
        return Err(CodecError::ChecksumMismatch {
            analysis_id: snapshot.analysis_id,
        }
        .into());
    }
    decode_stored(snapshot.resource, &snapshot.template, &snapshot.data)
}
