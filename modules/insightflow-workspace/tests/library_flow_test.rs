//! Sources, insight runs and exports against MockBackend, with the cache
//! keys each mutation is expected to drop.

use std::path::PathBuf;

use chrono::NaiveDate;
use insightflow_workspace::testing::{
    project, run_with_themes, source, MockBackend, MockFailure,
};
use insightflow_workspace::{Collection, QueryKey, Scope, UploadOptions, Workspace};

fn p1(collection: Collection) -> QueryKey {
    QueryKey::new(collection, Scope::Id("p1".into()))
}

fn seeded() -> Workspace<MockBackend> {
    let backend = MockBackend::new()
        .with_project(project("p1", "Pilot"))
        .with_project(project("p2", "Other"))
        .with_source(source("s1", "p1", "Interview 1"))
        .with_source(source("s9", "p2", "Elsewhere"))
        .with_run(run_with_themes("r1", "p1", &[]));
    let mut ws = Workspace::new(backend);
    ws.select_project(Some("p1".into()));
    ws
}

#[tokio::test]
async fn listings_are_scoped_to_the_selected_project() {
    let mut ws = seeded();
    let sources = ws.sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, "s1");

    ws.select_project(None);
    assert_eq!(ws.sources().await.unwrap().len(), 2);
    assert_eq!(ws.backend().call_count("list_sources"), 2);
}

#[tokio::test]
async fn upload_invalidates_project_sources() {
    let mut ws = seeded();
    ws.sources().await.unwrap();

    let options = UploadOptions::builder()
        .kind("interview")
        .title("Interview 2")
        .tags(vec!["q3".into()])
        .build();
    let uploaded = ws
        .upload_source(PathBuf::from("notes/interview-2.md"), options)
        .await
        .unwrap();
    assert_eq!(uploaded.title.as_deref(), Some("Interview 2"));
    assert_eq!(uploaded.kind, "interview");
    assert!(!ws.cache().contains(&p1(Collection::Sources)));

    assert_eq!(ws.sources().await.unwrap().len(), 2);
}

#[tokio::test]
async fn upload_without_project_is_rejected_locally() {
    let mut ws = seeded();
    ws.select_project(None);
    let err = ws
        .upload_source(PathBuf::from("a.md"), UploadOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(ws.backend().call_count("upload_source"), 0);
}

#[tokio::test]
async fn obsidian_import_and_delete_refresh_sources() {
    let mut ws = seeded();
    let imported = ws.import_obsidian(Some("Research".into()), None, Some(1)).await.unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(ws.sources().await.unwrap().len(), 2);

    ws.delete_source("s1").await.unwrap();
    assert!(!ws.cache().contains(&p1(Collection::Sources)));
    assert_eq!(ws.sources().await.unwrap().len(), 1);
}

#[tokio::test]
async fn starting_a_run_refreshes_runs_and_closes_dialog() {
    let mut ws = seeded();
    ws.runs().await.unwrap();
    ws.ui_mut().open_dialog(insightflow_workspace::Dialog::Analyze);

    let run = ws.start_insight_run(Some("What slows onboarding?".into())).await.unwrap();
    assert_eq!(run.project_id, "p1");
    assert!(!ws.cache().contains(&p1(Collection::InsightRuns)));
    assert_eq!(ws.ui().active_dialog(), None);
    assert_eq!(ws.runs().await.unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_a_run_drops_list_and_detail() {
    let mut ws = seeded();
    ws.runs().await.unwrap();
    ws.run("r1").await.unwrap();
    let detail = QueryKey::new(Collection::Run, Scope::Id("r1".into()));
    assert!(ws.cache().contains(&detail));

    ws.delete_insight_run("r1").await.unwrap();
    assert!(!ws.cache().contains(&detail));
    assert!(!ws.cache().contains(&p1(Collection::InsightRuns)));
    assert!(ws.runs().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_run_start_keeps_cached_runs() {
    let mut ws = seeded();
    ws.backend()
        .set_failure("create_insight_run", Some(MockFailure::Api(500)));
    ws.runs().await.unwrap();

    assert!(ws.start_insight_run(None).await.is_err());
    assert!(ws.cache().contains(&p1(Collection::InsightRuns)));
}

#[tokio::test]
async fn exports_use_selected_project() {
    let ws = seeded();
    let markdown = ws.export_markdown().await.unwrap();
    assert!(markdown.starts_with("# Pilot"));

    let digest = ws
        .daily_digest(NaiveDate::from_ymd_opt(2024, 5, 1))
        .await
        .unwrap();
    assert!(digest.contains("2024-05-01"));
    assert_eq!(ws.backend().calls().last().map(String::as_str), Some("daily_digest(p1)"));
}

#[tokio::test]
async fn refreshing_a_run_refetches_run_and_themes() {
    let mut ws = seeded();
    ws.themes("r1").await.unwrap();
    let themes = QueryKey::new(Collection::Themes, Scope::Id("r1".into()));
    assert!(ws.cache().contains(&themes));
    assert_eq!(ws.backend().call_count("get_insight_run"), 1);

    ws.refresh_run("r1").await.unwrap();
    assert!(!ws.cache().contains(&themes));
    assert_eq!(ws.backend().call_count("get_insight_run"), 2);

    ws.themes("r1").await.unwrap();
    assert_eq!(ws.backend().call_count("get_insight_run"), 2);
}

#[tokio::test]
async fn updating_run_status_drops_cached_copies() {
    let mut ws = seeded();
    ws.runs().await.unwrap();
    ws.run("r1").await.unwrap();

    let run = ws
        .update_insight_run("r1", Some("failed".into()), None)
        .await
        .unwrap();
    assert_eq!(run.status, "failed");
    assert!(!ws.cache().contains(&p1(Collection::InsightRuns)));
    assert!(!ws
        .cache()
        .contains(&QueryKey::new(Collection::Run, Scope::Id("r1".into()))));
    assert_eq!(ws.run("r1").await.unwrap().status, "failed");
}

#[tokio::test]
async fn empty_run_update_is_rejected_locally() {
    let mut ws = seeded();
    let err = ws.update_insight_run("r1", None, None).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(ws.backend().call_count("update_insight_run"), 0);
}
