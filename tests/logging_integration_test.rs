// Integration test for file logging
// Installs the global subscriber, so this binary holds a single test.

use std::fs;
use std::time::Duration;

use geoembed::domain::models::LoggingConfig;
use geoembed::infrastructure::logging::{LogConfig, LoggerImpl};
use geoembed::SqliteEmbeddingStore;

#[tokio::test]
async fn test_file_logging_captures_store_events() {
    let temp_dir = tempfile::tempdir().unwrap();

    let settings = LoggingConfig {
        level: "info".to_string(),
        format: "json".to_string(),
        log_dir: Some(temp_dir.path().to_string_lossy().into_owned()),
        enable_console: false,
        rotation: "never".to_string(),
    };
    let config = LogConfig::try_from(&settings).unwrap();
    let logger = LoggerImpl::init(&config).unwrap();

    let mut db = geoembed::domain::models::DatabaseConfig::in_memory();
    db.spatial.enabled = false;
    let store = SqliteEmbeddingStore::initialize(&db).await.unwrap();
    geoembed::domain::ports::EmbeddingRepository::close(&store)
        .await
        .unwrap();

    // Dropping the guard flushes the non-blocking writer
    drop(logger);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let contents = fs::read_to_string(temp_dir.path().join("geoembed.log")).unwrap();
    let events: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a JSON event"))
        .collect();

    assert!(events
        .iter()
        .any(|e| e["fields"]["message"] == "embedding store initialized"));
    assert!(events
        .iter()
        .any(|e| e["fields"]["message"] == "embedding store closed"));
    assert!(events.iter().all(|e| e["level"] != "DEBUG"));
}
