//! Integration tests for the batch runner.
//!
//! These tests drive whole manifests through `BatchRunner` against mock HTTP servers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use manifest_fetch::download::{
    BatchRunner, DownloadError, HttpClient, Pacer, PacingPolicy, RowOutcome, RowSkip,
    StatusPolicy,
};
use manifest_fetch::manifest::{ColumnRequirements, ColumnRole, ManifestError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a mock server with a file endpoint.
async fn setup_mock_file(path_str: &str, content: &[u8]) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;

    mock_server
}

fn unpaced_runner(output_dir: &Path) -> BatchRunner {
    BatchRunner::new(
        HttpClient::new().expect("client should build"),
        Arc::new(Pacer::disabled()),
        output_dir,
    )
}

fn write_manifest(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let manifest_path = dir.join(name);
    std::fs::write(&manifest_path, contents).expect("should write manifest");
    manifest_path
}

#[tokio::test]
async fn test_batch_single_row_downloads_sanitized_name() {
    let mock_server = setup_mock_file("/a.bin", b"AAA").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "videos.csv",
        &format!(
            "ITEM_NAME,DOWNLOAD,ENTRY_ID\nMy:Clip, {}/a.bin, 42\n",
            mock_server.uri()
        ),
    );
    let output_dir = temp_dir.path().join("out");
    std::fs::create_dir(&output_dir).expect("should create output dir");

    let summary = unpaced_runner(&output_dir)
        .run(&manifest_path)
        .await
        .expect("batch should run");

    assert_eq!(summary.downloaded(), 1);
    assert_eq!(summary.failed(), 0);
    let saved = output_dir.join("MyClip(42).mp4");
    assert_eq!(std::fs::read(&saved).expect("should read file"), b"AAA");
    assert_eq!(
        std::fs::read_dir(&output_dir).expect("read dir").count(),
        1,
        "exactly one file expected"
    );
}

#[tokio::test]
async fn test_batch_missing_download_column_is_fatal_without_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "videos.csv",
        &format!("ITEM_NAME,URL\nClip,{}/a.bin\n", mock_server.uri()),
    );

    let result = unpaced_runner(temp_dir.path()).run(&manifest_path).await;

    match result {
        Err(err @ ManifestError::MissingColumn { role, .. }) => {
            assert_eq!(role, ColumnRole::DownloadUrl);
            assert!(err.to_string().contains("DOWNLOAD"), "got: {err}");
        }
        other => panic!("Expected MissingColumn error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_header_only_manifest_does_nothing() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "empty.csv",
        "ITEM_NAME,DOWNLOAD,ENTRY_ID\n",
    );

    let summary = unpaced_runner(temp_dir.path())
        .run(&manifest_path)
        .await
        .expect("header-only manifest is valid");

    assert_eq!(summary.total(), 0);
    assert_eq!(summary.downloaded(), 0);
    assert_eq!(summary.failed(), 0);
}

#[tokio::test]
async fn test_batch_failing_row_does_not_stop_later_rows() {
    let mock_server = MockServer::start().await;
    for n in [1, 2, 4, 5] {
        Mock::given(method("GET"))
            .and(path(format!("/clip{n}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("body {n}")))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/clip3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut manifest = String::from("DOWNLOAD,ITEM_NAME,ENTRY_ID\n");
    for n in 1..=5 {
        manifest.push_str(&format!("{}/clip{n},Clip,{n}\n", mock_server.uri()));
    }
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(temp_dir.path(), "clips.csv", &manifest);
    let output_dir = temp_dir.path().join("out");
    std::fs::create_dir(&output_dir).expect("should create output dir");

    let summary = unpaced_runner(&output_dir)
        .run(&manifest_path)
        .await
        .expect("batch should run");

    assert_eq!(summary.downloaded(), 4);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.total(), 5);

    let failed = &summary.reports()[2];
    assert_eq!(failed.row, 3);
    assert!(matches!(
        failed.outcome,
        RowOutcome::Failed(DownloadError::HttpStatus { status: 500, .. })
    ));
    assert!(!output_dir.join("Clip(3).mp4").exists());

    for n in [1, 2, 4, 5] {
        let saved = output_dir.join(format!("Clip({n}).mp4"));
        assert_eq!(
            std::fs::read_to_string(&saved).expect("should read file"),
            format!("body {n}")
        );
    }
}

#[tokio::test]
async fn test_batch_accept_any_status_saves_error_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "m.csv",
        &format!("DOWNLOAD,ITEM_NAME\n{}/x,Locked\n", mock_server.uri()),
    );

    let client = HttpClient::new()
        .expect("client should build")
        .with_status_policy(StatusPolicy::AcceptAny);
    let runner = BatchRunner::new(client, Arc::new(Pacer::disabled()), temp_dir.path());

    let summary = runner.run(&manifest_path).await.expect("batch should run");

    assert_eq!(summary.downloaded(), 1);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("Locked.mp4")).expect("should read file"),
        "forbidden"
    );
}

#[tokio::test]
async fn test_batch_short_rows_skipped_and_not_written() {
    let mock_server = setup_mock_file("/ok", b"ok").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "m.csv",
        &format!(
            "ITEM_NAME,DOWNLOAD,ENTRY_ID\nBroken\nGood,{}/ok,1\n",
            mock_server.uri()
        ),
    );
    let output_dir = temp_dir.path().join("out");
    std::fs::create_dir(&output_dir).expect("should create output dir");

    let summary = unpaced_runner(&output_dir)
        .run(&manifest_path)
        .await
        .expect("batch should run");

    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.downloaded(), 1);
    assert!(matches!(
        summary.reports()[0].outcome,
        RowOutcome::Skipped(RowSkip::ShortRow { .. })
    ));
    assert_eq!(
        std::fs::read_dir(&output_dir).expect("read dir").count(),
        1,
        "only the good row should be written"
    );
}

#[tokio::test]
async fn test_batch_require_entry_id_rejects_manifest_without_it() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "m.csv",
        "ITEM_NAME,DOWNLOAD\nClip,http://127.0.0.1:9/a\n",
    );

    let result = unpaced_runner(temp_dir.path())
        .with_requirements(ColumnRequirements {
            require_entry_id: true,
        })
        .run(&manifest_path)
        .await;

    assert!(matches!(
        result,
        Err(ManifestError::MissingColumn {
            role: ColumnRole::EntryId,
            ..
        })
    ));
}

#[tokio::test]
async fn test_batch_rejects_non_csv_manifest_path() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "videos.txt",
        "ITEM_NAME,DOWNLOAD\nClip,http://127.0.0.1:9/a\n",
    );

    let result = unpaced_runner(temp_dir.path()).run(&manifest_path).await;

    assert!(matches!(
        result,
        Err(ManifestError::UnsupportedExtension { .. })
    ));
}

#[tokio::test]
async fn test_batch_paces_between_downloads_only() {
    let mock_server = setup_mock_file("/v", b"v").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let delay = Duration::from_millis(300);

    // One downloadable row surrounded by skipped rows: nothing to wait for.
    let pacer = Arc::new(Pacer::new(PacingPolicy::Fixed(delay)));
    let manifest_path = write_manifest(
        temp_dir.path(),
        "one.csv",
        &format!(
            "ITEM_NAME,DOWNLOAD,ENTRY_ID\nshort\nA,{}/v,1\nshort\n",
            mock_server.uri()
        ),
    );
    let runner = BatchRunner::new(
        HttpClient::new().expect("client should build"),
        Arc::clone(&pacer),
        temp_dir.path(),
    );
    runner.run(&manifest_path).await.expect("batch should run");
    assert_eq!(pacer.total_waited().await, Duration::ZERO);

    // Two downloadable rows: the second waits for the remainder of the delay.
    let pacer = Arc::new(Pacer::new(PacingPolicy::Fixed(delay)));
    let manifest_path = write_manifest(
        temp_dir.path(),
        "two.csv",
        &format!(
            "ITEM_NAME,DOWNLOAD,ENTRY_ID\nA,{0}/v,1\nB,{0}/v,2\n",
            mock_server.uri()
        ),
    );
    let runner = BatchRunner::new(
        HttpClient::new().expect("client should build"),
        Arc::clone(&pacer),
        temp_dir.path(),
    );
    runner.run(&manifest_path).await.expect("batch should run");
    let waited = pacer.total_waited().await;
    assert!(waited > Duration::ZERO && waited <= delay, "waited {waited:?}");
}

#[tokio::test]
async fn test_batch_fixed_delay_follows_slow_downloads() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = write_manifest(
        temp_dir.path(),
        "slow.csv",
        &format!(
            "ITEM_NAME,DOWNLOAD,ENTRY_ID\nA,{0}/slow,1\nB,{0}/slow,2\n",
            mock_server.uri()
        ),
    );

    // Each download outlasts the delay; the pause must still happen in between.
    let delay = Duration::from_millis(300);
    let pacer = Arc::new(Pacer::new(PacingPolicy::Fixed(delay)));
    let runner = BatchRunner::new(
        HttpClient::new().expect("client should build"),
        Arc::clone(&pacer),
        temp_dir.path(),
    );

    let summary = runner.run(&manifest_path).await.expect("batch should run");

    assert_eq!(summary.downloaded(), 2);
    let waited = pacer.total_waited().await;
    assert!(
        waited >= Duration::from_millis(250) && waited <= delay,
        "waited {waited:?}"
    );
}
