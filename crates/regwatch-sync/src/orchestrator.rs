//! Sequential fetch → normalize → upsert pipeline over all sources.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use regwatch_core::{Config, Level};
use regwatch_store::RegulationStore;

use crate::{FetchWindow, Source, SyncError};

/// Outcome of one source within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// No API key configured; never contacted over the network.
    Skipped,
    Ok,
    Failed,
}

/// Per-source status and counts, one entry of the caller-facing summary.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub level: Level,
    pub status: SourceStatus,
    pub fetched: u64,
    pub written: u64,
    pub dropped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-row persistence failures; the source still counts as ok.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub write_failures: Vec<String>,
}

impl SourceReport {
    fn skipped(level: Level) -> Self {
        Self {
            level,
            status: SourceStatus::Skipped,
            fetched: 0,
            written: 0,
            dropped: 0,
            error: None,
            write_failures: Vec::new(),
        }
    }

    fn failed(level: Level, err: &SyncError) -> Self {
        Self {
            level,
            status: SourceStatus::Failed,
            fetched: 0,
            written: 0,
            dropped: 0,
            error: Some(err.to_string()),
            write_failures: Vec::new(),
        }
    }
}

/// Complete summary of one aggregation run.
///
/// Always complete: a failed source is an entry here, not an abort. This
/// is the sole output the web layer or CLI wrapper consumes.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
    /// Rows written (new or overwritten) across all sources.
    pub total_written: u64,
}

impl RunSummary {
    pub fn report(&self, level: Level) -> Option<&SourceReport> {
        self.sources.iter().find(|report| report.level == level)
    }
}

/// Run the full pipeline: every source in fixed level order, one at a
/// time. Sources without a key are skipped before any network I/O; a
/// failed source is recorded and iteration continues.
pub async fn run(config: &Config, store: &RegulationStore) -> RunSummary {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build();
    let window = FetchWindow::from_config(config);

    let mut summary = RunSummary {
        sources: Vec::new(),
        total_written: 0,
    };
    for level in Level::ALL {
        let source_config = config.source(level);
        if !source_config.enabled() {
            info!(%level, "no API key configured; skipping");
            summary.sources.push(SourceReport::skipped(level));
            continue;
        }

        let report = match &client {
            Ok(client) => {
                let source = Source::for_level(level, source_config, client.clone());
                run_source(&source, &window, store).await
            }
            Err(err) => SourceReport::failed(
                level,
                &SyncError::SourceUnavailable(format!("http client init: {err}")),
            ),
        };
        summary.total_written += report.written;
        summary.sources.push(report);
    }

    info!(total_written = summary.total_written, "aggregation complete");
    summary
}

async fn run_source(source: &Source, window: &FetchWindow, store: &RegulationStore) -> SourceReport {
    let level = source.level();
    let raw = match source.fetch(window).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%level, %err, "fetch failed");
            return SourceReport::failed(level, &err);
        }
    };

    let fetched = raw.len() as u64;
    let mut records = Vec::with_capacity(raw.len());
    let mut dropped = 0u64;
    for item in &raw {
        match source.normalize(item) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(%level, %err, "dropping record");
                dropped += 1;
            }
        }
    }

    let outcome = store.upsert_all(&records);
    SourceReport {
        level,
        status: SourceStatus::Ok,
        fetched,
        written: outcome.written,
        dropped,
        error: None,
        write_failures: outcome
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.id, failure.message))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use regwatch_core::SourceConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with(server_url: &str, federal_key: Option<&str>) -> Config {
        let source = |key: Option<&str>| SourceConfig {
            base_url: server_url.to_string(),
            api_key: key.map(str::to_string),
        };
        Config {
            federal: source(federal_key),
            state: source(None),
            local: source(None),
            days_back: 7,
            page_size: 10,
            search_term: None,
            request_timeout_secs: 5,
            db_path: PathBuf::from("unused.db"),
        }
    }

    fn federal_page() -> serde_json::Value {
        json!({
            "data": [
                {
                    "id": "FED-001",
                    "attributes": {
                        "documentId": "FED-001-0001",
                        "title": "Doc 1",
                        "summary": "First",
                        "postedDate": "2026-01-20"
                    }
                },
                {
                    "id": "FED-002",
                    "attributes": {
                        "title": "Doc 2",
                        "postedDate": "2026-01-21"
                    }
                },
                {
                    "attributes": {
                        "title": "No id at all"
                    }
                }
            ]
        })
    }

    #[tokio::test]
    async fn federal_page_with_unmappable_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .and(query_param("api_key", "fed-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(federal_page()))
            .mount(&server)
            .await;

        let store = RegulationStore::open_in_memory().unwrap();
        let config = config_with(&server.uri(), Some("fed-key"));
        let summary = run(&config, &store).await;

        let federal = summary.report(Level::Federal).unwrap();
        assert_eq!(federal.status, SourceStatus::Ok);
        assert_eq!(federal.fetched, 3);
        assert_eq!(federal.written, 2);
        assert_eq!(federal.dropped, 1);
        assert_eq!(summary.report(Level::State).unwrap().status, SourceStatus::Skipped);
        assert_eq!(summary.report(Level::Local).unwrap().status, SourceStatus::Skipped);
        assert_eq!(summary.total_written, 2);

        assert_eq!(store.count().unwrap(), 2);
        let stored = store.get("FED-001-0001").unwrap().unwrap();
        assert_eq!(stored.regulation.level, Level::Federal);
        assert_eq!(stored.regulation.title, "Doc 1");
        assert_eq!(store.get("FED-002").unwrap().unwrap().regulation.title, "Doc 2");
    }

    #[tokio::test]
    async fn sources_without_keys_never_touch_the_network() {
        let server = MockServer::start().await;
        let store = RegulationStore::open_in_memory().unwrap();
        let config = config_with(&server.uri(), None);

        let summary = run(&config, &store).await;

        for level in Level::ALL {
            assert_eq!(summary.report(level).unwrap().status, SourceStatus::Skipped);
        }
        assert_eq!(summary.total_written, 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_marks_source_failed_and_run_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = RegulationStore::open_in_memory().unwrap();
        let summary = run(&config_with(&server.uri(), Some("fed-key")), &store).await;

        let federal = summary.report(Level::Federal).unwrap();
        assert_eq!(federal.status, SourceStatus::Failed);
        assert!(federal.error.as_deref().unwrap().contains("source unavailable"));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_body_marks_source_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "not a list"})))
            .mount(&server)
            .await;

        let store = RegulationStore::open_in_memory().unwrap();
        let summary = run(&config_with(&server.uri(), Some("fed-key")), &store).await;

        let federal = summary.report(Level::Federal).unwrap();
        assert_eq!(federal.status, SourceStatus::Failed);
        assert!(federal.error.as_deref().unwrap().contains("malformed response"));
    }

    #[tokio::test]
    async fn timeout_counts_as_source_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(federal_page())
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let store = RegulationStore::open_in_memory().unwrap();
        let mut config = config_with(&server.uri(), Some("fed-key"));
        config.request_timeout_secs = 1;
        let summary = run(&config, &store).await;

        let federal = summary.report(Level::Federal).unwrap();
        assert_eq!(federal.status, SourceStatus::Failed);
        assert!(federal.error.as_deref().unwrap().contains("source unavailable"));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn row_write_failure_is_reported_but_source_stays_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(federal_page()))
            .mount(&server)
            .await;

        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("regulations.db");
        let store = RegulationStore::open(&db_path).unwrap();
        // A second connection plants a trigger that rejects one of the
        // page's ids, so a single row fails mid-batch.
        {
            let conn = rusqlite::Connection::open(&db_path).unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_fed BEFORE INSERT ON regulations
                 WHEN NEW.id = 'FED-002' BEGIN
                     SELECT RAISE(ABORT, 'rejected by trigger');
                 END",
            )
            .unwrap();
        }

        let summary = run(&config_with(&server.uri(), Some("fed-key")), &store).await;

        let federal = summary.report(Level::Federal).unwrap();
        assert_eq!(federal.status, SourceStatus::Ok);
        assert_eq!(federal.fetched, 3);
        assert_eq!(federal.written, 1);
        assert_eq!(federal.dropped, 1);
        assert_eq!(federal.write_failures.len(), 1);
        assert!(federal.write_failures[0].contains("FED-002"));
        assert_eq!(summary.total_written, 1);

        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get("FED-001-0001").unwrap().is_some());
        assert!(store.get("FED-002").unwrap().is_none());
    }

    #[tokio::test]
    async fn rerunning_with_unchanged_data_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(federal_page()))
            .mount(&server)
            .await;

        let store = RegulationStore::open_in_memory().unwrap();
        let config = config_with(&server.uri(), Some("fed-key"));

        run(&config, &store).await;
        let first = store.get("FED-001-0001").unwrap().unwrap();

        let second_summary = run(&config, &store).await;
        let second = store.get("FED-001-0001").unwrap().unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(second_summary.report(Level::Federal).unwrap().written, 2);
        assert_eq!(first.regulation, second.regulation);
        assert!(second.last_updated >= first.last_updated);
    }

    #[tokio::test]
    async fn state_and_local_pages_land_with_their_levels() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/api/3/bills/\d+/search$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "items": [{
                        "result": {
                            "basePrintNo": "S42",
                            "session": 2026,
                            "title": "Restaurant grading",
                            "summary": "Updates letter grading.",
                            "status": {"actionDate": "2026-02-10"}
                        }
                    }]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/resource/.+\.json$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "record_id": "2026-7",
                    "title": "Vendor permits",
                    "summary": "Expands permit caps.",
                    "publication_date": "2026-02-11"
                }
            ])))
            .mount(&server)
            .await;

        let store = RegulationStore::open_in_memory().unwrap();
        let mut config = config_with(&server.uri(), None);
        config.state.api_key = Some("state-key".to_string());
        config.local.api_key = Some("local-token".to_string());

        let summary = run(&config, &store).await;

        assert_eq!(summary.report(Level::Federal).unwrap().status, SourceStatus::Skipped);
        assert_eq!(summary.report(Level::State).unwrap().written, 1);
        assert_eq!(summary.report(Level::Local).unwrap().written, 1);
        assert_eq!(summary.total_written, 2);

        let state = store.get("nys-2026-S42").unwrap().unwrap();
        assert_eq!(state.regulation.level, Level::State);
        let local = store.get("nyc-2026-7").unwrap().unwrap();
        assert_eq!(local.regulation.level, Level::Local);
    }

    #[tokio::test]
    async fn summary_serializes_for_the_caller() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(federal_page()))
            .mount(&server)
            .await;

        let store = RegulationStore::open_in_memory().unwrap();
        let summary = run(&config_with(&server.uri(), Some("fed-key")), &store).await;

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["total_written"], 2);
        assert_eq!(value["sources"][0]["level"], "federal");
        assert_eq!(value["sources"][0]["status"], "ok");
        assert_eq!(value["sources"][1]["status"], "skipped");
        assert!(value["sources"][0].get("error").is_none());
    }
}
