//! Live vs snapshot resolution through the overview computer.

mod support;

use analysis_overview::config::SnapshotSettings;
use analysis_overview::db::{
    calculate_checksum, AnalysisRepository, AnalysisSnapshotRepository, LocalRepository,
};
use analysis_overview::models::{
    Analysis, AnalysisId, AnalysisResource, AnalysisSnapshot, AnalysisTemplate, CaseTemplate,
    TaskTemplate,
};
use analysis_overview::overview::{Overview, ProgressCount, ProgressOverview, TaskOverview};
use analysis_overview::services::{codec, AnalysisError, CodecError};
use chrono::Utc;

use support::{analysis, computer, snapshot_analysis, FakeQuery};

async fn stored(repo: &LocalRepository, a: Analysis) -> Analysis {
    repo.insert_analysis(&a).await.unwrap()
}

fn raw_snapshot(id: AnalysisId, template: AnalysisTemplate, data: &str) -> AnalysisSnapshot {
    AnalysisSnapshot {
        analysis_id: id,
        resource: template.resource(),
        template: template.name().to_string(),
        data: data.to_string(),
        checksum: calculate_checksum(data),
        created_date: Utc::now(),
    }
}

#[tokio::test]
async fn test_live_analysis_never_touches_snapshots() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, analysis("live", TaskTemplate::Progress)).await;

    let computer = computer(&query);
    computer.resolve(&repo, &a).await.unwrap();
    computer.resolve(&repo, &a).await.unwrap();

    assert_eq!(query.calls(), 2);
    assert_eq!(repo.snapshot_count(), 0);
}

#[tokio::test]
async fn test_snapshot_miss_computes_and_writes_back() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Progress)).await;
    let id = a.id.unwrap();
    let computer = computer(&query);

    let first = computer.resolve(&repo, &a).await.unwrap();
    assert_eq!(query.calls(), 1);
    assert!(repo.has_snapshot(id).await.unwrap());

    let snapshot = repo.fetch_snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.resource, AnalysisResource::Task);
    assert_eq!(snapshot.template, "PROGRESS");

    let second = computer.resolve(&repo, &a).await.unwrap();
    assert_eq!(query.calls(), 1, "hit must not recompute");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_write_back_disabled_leaves_store_untouched() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", CaseTemplate::Workload)).await;
    let computer = computer(&query).with_settings(SnapshotSettings { write_back: false });

    computer.resolve(&repo, &a).await.unwrap();
    computer.resolve(&repo, &a).await.unwrap();

    assert_eq!(query.calls(), 2);
    assert_eq!(repo.snapshot_count(), 0);
}

#[tokio::test]
async fn test_stale_pair_is_recomputed_and_overwritten() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let mut a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Progress)).await;
    let id = a.id.unwrap();
    let computer = computer(&query);
    computer.resolve(&repo, &a).await.unwrap();

    // Switch template behind the service's back so the old snapshot survives.
    a.set_template(TaskTemplate::Bugs.into());
    let a = repo.update_analysis(&a).await.unwrap();
    assert!(repo.has_snapshot(id).await.unwrap());

    let overview = computer.resolve(&repo, &a).await.unwrap();
    assert!(matches!(overview, Overview::Task(TaskOverview::Bugs(_))));
    assert_eq!(query.calls(), 2);

    let snapshot = repo.fetch_snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.template, "BUGS");
}

#[tokio::test]
async fn test_resource_switch_with_same_template_name_is_stale() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let mut a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Progress)).await;
    let computer = computer(&query);
    computer.resolve(&repo, &a).await.unwrap();

    a.set_template(CaseTemplate::Progress.into());
    let a = repo.update_analysis(&a).await.unwrap();

    let overview = computer.resolve(&repo, &a).await.unwrap();
    assert_eq!(overview.template(), AnalysisTemplate::Case(CaseTemplate::Progress));
    assert_eq!(query.calls(), 2);
}

#[tokio::test]
async fn test_checksum_mismatch_is_codec_error_without_recompute() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Progress)).await;
    let id = a.id.unwrap();
    let computer = computer(&query);
    computer.resolve(&repo, &a).await.unwrap();

    let mut snapshot = repo.fetch_snapshot(id).await.unwrap().unwrap();
    snapshot.data = snapshot.data.replace("T-1", "T-9");
    repo.put_raw_snapshot(snapshot);

    let err = computer.resolve(&repo, &a).await.unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Codec(CodecError::ChecksumMismatch { analysis_id }) if analysis_id == id
    ));
    assert_eq!(query.calls(), 1);
}

#[tokio::test]
async fn test_undecodable_blob_is_codec_error_without_recompute() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", CaseTemplate::SubmittedBugs)).await;
    let id = a.id.unwrap();
    repo.put_raw_snapshot(raw_snapshot(
        id,
        CaseTemplate::SubmittedBugs.into(),
        r#"{"total_overview":{"valid_bug_num":1}}"#,
    ));

    let err = computer(&query).resolve(&repo, &a).await.unwrap_err();
    match err {
        AnalysisError::Codec(CodecError::Decode {
            resource, template, ..
        }) => {
            assert_eq!(resource, AnalysisResource::Case);
            assert_eq!(template, "SUBMITTED_BUGS");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(query.calls(), 0);
}

#[tokio::test]
async fn test_empty_blob_is_a_miss() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Failures)).await;
    let id = a.id.unwrap();
    repo.put_raw_snapshot(raw_snapshot(id, TaskTemplate::Failures.into(), "  "));

    let overview = computer(&query).resolve(&repo, &a).await.unwrap();
    assert_eq!(overview.template(), AnalysisTemplate::Task(TaskTemplate::Failures));
    assert_eq!(query.calls(), 1);

    let snapshot = repo.fetch_snapshot(id).await.unwrap().unwrap();
    assert_eq!(codec::from_snapshot(&snapshot).unwrap(), overview);
}

#[tokio::test]
async fn test_valid_raw_snapshot_is_served_as_is() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Progress)).await;
    let id = a.id.unwrap();

    let frozen = codec::encode(&Overview::Task(TaskOverview::Progress(
        ProgressOverview::new(ProgressCount::new(100, 1, 0.0, 0.0)),
    )))
    .unwrap();
    repo.put_raw_snapshot(raw_snapshot(id, TaskTemplate::Progress.into(), &frozen));

    let overview = computer(&query).resolve(&repo, &a).await.unwrap();
    match overview {
        Overview::Task(TaskOverview::Progress(report)) => {
            assert_eq!(report.total_overview.total_num, 100);
            assert_eq!(report.total_overview.completed_rate, 1.0);
        }
        other => panic!("unexpected variant {}", other.template()),
    }
    assert_eq!(query.calls(), 0);
}

#[tokio::test]
async fn test_unsaved_snapshot_analysis_computes_live() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = snapshot_analysis("draft", TaskTemplate::Progress);

    computer(&query).resolve(&repo, &a).await.unwrap();
    assert_eq!(query.calls(), 1);
    assert_eq!(repo.snapshot_count(), 0);
}

#[tokio::test]
async fn test_refresh_overwrites_existing_snapshot() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", TaskTemplate::LeadTime)).await;
    let id = a.id.unwrap();
    repo.put_raw_snapshot(raw_snapshot(id, TaskTemplate::LeadTime.into(), "{}"));

    let overview = computer(&query).refresh(&repo, &a).await.unwrap();
    assert_eq!(query.calls(), 1);

    let snapshot = repo.fetch_snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.data, codec::encode(&overview).unwrap());
    assert_eq!(snapshot.checksum, calculate_checksum(&snapshot.data));
}

#[tokio::test]
async fn test_storage_failure_is_repository_error() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Progress)).await;
    repo.set_healthy(false);

    let err = computer(&query).resolve(&repo, &a).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Repository(_)));
    assert_eq!(query.calls(), 0);
}

#[tokio::test]
async fn test_unreadable_overview_is_not_written_back() {
    let repo = LocalRepository::new();
    let query = FakeQuery::new();
    let a = stored(&repo, snapshot_analysis("snap", TaskTemplate::Progress)).await;
    query.set_non_finite(true);

    let err = computer(&query).resolve(&repo, &a).await.unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Codec(CodecError::Unreadable { .. })
    ));
    assert_eq!(repo.snapshot_count(), 0);

    query.set_non_finite(false);
    computer(&query).resolve(&repo, &a).await.unwrap();
    assert_eq!(repo.snapshot_count(), 1);
}
