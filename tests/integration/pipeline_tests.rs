use roster_harvest::config::{Config, CredentialsConfig, SourceKind};
use roster_harvest::ingest::{ShutdownToken, TargetStatus};
use roster_harvest::output::ExportRow;
use roster_harvest::pipeline::{harvest, Pipeline, EXIT_OK};
use roster_harvest::source::{FixtureClient, RawRecord, SourceClient};
use roster_harvest::storage::{open_store, MemberStore, RunStatus, SqliteStorage};
use roster_harvest::{HarvestError, PipelineState};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Creates a configuration storing and exporting under `dir`
fn create_test_config(dir: &TempDir, max_members: u32) -> Config {
    let mut config = Config::default();
    config.storage.database_path = dir.path().join("roster.db").display().to_string();
    config.export.directory = dir.path().to_path_buf();
    config.export.base_name = "results".to_string();
    config.ingest.max_members = max_members;
    config.ingest.workers = 3;
    config.ingest.queue_capacity = 8;
    config
}

fn write_fixture(dir: &TempDir, json: &str) -> std::path::PathBuf {
    let path = dir.path().join("fixture.json");
    fs::write(&path, json).unwrap();
    path
}

fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn fixture_client(batches: Vec<(&str, Vec<RawRecord>)>) -> Box<dyn SourceClient> {
    Box::new(FixtureClient::from_batches(batches))
}

fn read_json(path: &Path) -> Vec<ExportRow> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_missing_target_is_reported_and_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(
        &dir,
        r#"{"@present": [{"id": 1, "username": "bob"}, {"id": 2, "first_name": "Ann"}]}"#,
    );
    let mut config = create_test_config(&dir, 50);
    config.source.kind = SourceKind::Fixture;
    config.source.fixture_path = Some(fixture);

    let summary = harvest(
        config,
        "defaults",
        &targets(&["@missing", "t.me/present"]),
        ShutdownToken::new(),
    )
    .await
    .unwrap();

    let missing = summary.report.target("@missing").unwrap();
    assert_eq!(missing.requested, 50);
    assert_eq!(missing.received, 0);
    assert_eq!(missing.persisted, 0);
    assert_eq!(missing.skipped, 0);
    assert_eq!(missing.failed, 0);
    assert!(matches!(missing.status, TargetStatus::FetchFailed(_)));

    let present = summary.report.target("@present").unwrap();
    assert_eq!(present.persisted, 2);

    assert_eq!(summary.state, PipelineState::Done);
    assert_eq!(summary.exit_code(), EXIT_OK);
}

#[tokio::test]
async fn test_record_without_entity_id_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let client = fixture_client(vec![(
        "@a",
        vec![
            RawRecord::default().with_username("no_id"),
            RawRecord::new(5).with_username("has_id"),
        ],
    )]);

    let summary = Pipeline::new(create_test_config(&dir, 10), client)
        .run(&targets(&["@a"]))
        .await
        .unwrap();

    let a = &summary.report.targets[0];
    assert_eq!(a.received, 2);
    assert_eq!(a.skipped, 1);
    assert_eq!(a.persisted, 1);
    assert_eq!(summary.stored_rows, Some(1));
}

#[tokio::test]
async fn test_accounting_holds_for_every_target() {
    let dir = tempfile::tempdir().unwrap();
    let mixed: Vec<RawRecord> = (0..40)
        .map(|i| match i % 4 {
            0 => RawRecord::default(),
            1 => RawRecord::new(-(i as i64)),
            _ => RawRecord::new(i as i64 + 1).with_phone("+15550000000"),
        })
        .collect();
    let client = fixture_client(vec![
        ("@mixed", mixed),
        ("@clean", (1..=25).map(RawRecord::new).collect()),
        ("@empty", vec![]),
    ]);

    let summary = Pipeline::new(create_test_config(&dir, 30), client)
        .run(&targets(&["@mixed", "@clean", "@empty", "@absent", "bad target"]))
        .await
        .unwrap();

    assert_eq!(summary.report.targets.len(), 5);
    for target in &summary.report.targets {
        assert!(target.is_balanced(), "unbalanced: {:?}", target);
        assert!(target.received <= target.requested as u64);
    }

    let mixed = summary.report.target("@mixed").unwrap();
    assert_eq!(mixed.received, 30);
    assert_eq!(mixed.skipped, 8);
    assert_eq!(mixed.persisted, 22);
    assert!(matches!(
        summary.report.targets[4].status,
        TargetStatus::InvalidTarget(_)
    ));
    assert_eq!(summary.stored_rows, Some(22 + 25));
}

#[tokio::test]
async fn test_zero_max_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let client = fixture_client(vec![("@a", vec![RawRecord::new(1)])]);

    let summary = Pipeline::new(create_test_config(&dir, 0), client)
        .run(&targets(&["@a"]))
        .await
        .unwrap();

    let a = &summary.report.targets[0];
    assert_eq!(a.received, 0);
    assert_eq!(a.status, TargetStatus::Completed);
    assert_eq!(summary.stored_rows, Some(0));
}

#[tokio::test]
async fn test_exported_json_matches_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let client = fixture_client(vec![(
        "@a",
        vec![
            RawRecord::new(3)
                .with_username("@carol")
                .with_first_name("Carol")
                .with_premium(true)
                .with_last_online(1_700_000_000),
            RawRecord::new(1).with_last_name("Comma, \"Quoted\""),
            RawRecord::new(2).with_phone("  "),
        ],
    )]);
    let mut config = create_test_config(&dir, 10);
    config.ingest.workers = 1;

    let summary = Pipeline::new(config, client)
        .run(&targets(&["@a"]))
        .await
        .unwrap();

    let store = open_store(&dir.path().join("roster.db")).unwrap();
    let snapshot = store.snapshot().unwrap();
    let expected: Vec<ExportRow> = snapshot.iter().map(ExportRow::from).collect();

    let json_path = summary
        .exported
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    assert_eq!(read_json(json_path), expected);

    let carol = expected.iter().find(|r| r.entity_id == 3).unwrap();
    assert_eq!(carol.username.as_deref(), Some("carol"));
    assert!(carol.is_premium);
    let blank_phone = expected.iter().find(|r| r.entity_id == 2).unwrap();
    assert_eq!(blank_phone.phone, None);

    let csv_path = summary
        .exported
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "csv"))
        .unwrap();
    let mut reader = csv::Reader::from_path(csv_path).unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), expected.len());
    for (record, row) in records.iter().zip(&expected) {
        assert_eq!(&record[0], row.entity_id.to_string());
        assert_eq!(&record[3], row.last_name.clone().unwrap_or_default());
        assert_eq!(&record[5], row.is_premium.to_string());
        assert_eq!(&record[8], row.internal_id.to_string());
    }
}

#[tokio::test]
async fn test_second_run_updates_existing_member() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn MemberStore> =
        Arc::new(SqliteStorage::open(&dir.path().join("shared.db")).unwrap());

    let first = fixture_client(vec![("@a", vec![RawRecord::new(1).with_username("bob")])]);
    Pipeline::with_store(create_test_config(&dir, 10), first, Arc::clone(&store))
        .run(&targets(&["@a"]))
        .await
        .unwrap();
    let before = store.get(1, "@a").unwrap().unwrap();

    let second = fixture_client(vec![("@a", vec![RawRecord::new(1).with_username("bobby")])]);
    let summary = Pipeline::with_store(create_test_config(&dir, 10), second, Arc::clone(&store))
        .run(&targets(&["https://t.me/A"]))
        .await
        .unwrap();

    assert_eq!(summary.report.targets[0].updated, 1);
    assert_eq!(store.count().unwrap(), 1);

    let after = store.get(1, "@a").unwrap().unwrap();
    assert_eq!(after.record.handle.as_deref(), Some("bobby"));
    assert_eq!(after.internal_id, before.internal_id);
    assert_eq!(after.scraped_at, before.scraped_at);
}

#[tokio::test]
async fn test_bad_credentials_fail_before_store_is_opened() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&dir, 10);
    config.credentials = Some(CredentialsConfig {
        api_id: 0,
        api_hash: "not-a-hash".to_string(),
        session_file: dir.path().join("s.session"),
    });
    let mut pipeline = Pipeline::new(config, fixture_client(vec![]));

    let result = pipeline.run(&targets(&["@a"])).await;

    assert!(matches!(result, Err(HarvestError::Auth(_))));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(!dir.path().join("roster.db").exists());
}

#[tokio::test]
async fn test_corrupt_store_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("roster.db"), vec![0xab; 4096]).unwrap();
    let mut pipeline = Pipeline::new(
        create_test_config(&dir, 10),
        fixture_client(vec![("@a", vec![RawRecord::new(1)])]),
    );

    let result = pipeline.run(&targets(&["@a"])).await;

    assert!(matches!(result, Err(HarvestError::StorageUnavailable(_))));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_run_is_recorded_with_config_hash() {
    let dir = tempfile::tempdir().unwrap();
    let client = fixture_client(vec![("@a", vec![RawRecord::new(1)])]);

    let summary = Pipeline::new(create_test_config(&dir, 10), client)
        .config_hash("0123abcd")
        .run(&targets(&["@a"]))
        .await
        .unwrap();

    let store = open_store(&dir.path().join("roster.db")).unwrap();
    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.id, summary.run_id);
    assert_eq!(run.config_hash, "0123abcd");
    assert_eq!(run.status, RunStatus::Completed);
}
