//! # bStat Recorder
//!
//! Reads raw events as JSON lines and records each one as a footstep in an
//! append-only JSON Lines log. Intended for hosts that can shell out but
//! cannot link the recorder directly.
//!
//! Each input line is one event:
//!
//! ```json
//! {"action": "plugin", "user_id": 42, "info": ["activated", "akismet/akismet.php"]}
//! ```

mod config;

pub use config::{
    AppConfig, ConfigError, ContextConfig, DEFAULT_CONFIG_PATH, StoreConfig, load_config,
    load_config_or_default, parse_config,
};

use bstat_adapter_file::JsonlStore;
use bstat_adapter_memory::StaticContext;
use bstat_core::{FootstepRecorder, RawEvent, RecordError, RecordId, StoreError};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Error that stops the recorder service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to open footstep log: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Outcome of processing a single input line.
#[derive(Debug)]
pub enum LineOutcome {
    /// The line was blank.
    Skipped,
    /// The line was recorded under this id.
    Recorded(RecordId),
    /// The line was not valid event JSON.
    Malformed(String),
    /// The recorder refused or failed to store the event.
    Failed(RecordError),
}

/// Counters for one run over an input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub recorded: usize,
    pub malformed: usize,
    pub failed: usize,
}

/// Records events read from a line-oriented input.
pub struct RecorderService {
    recorder: FootstepRecorder,
    store: Arc<JsonlStore>,
}

impl RecorderService {
    /// Opens the footstep log and builds the recorder from configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let store = Arc::new(
            JsonlStore::open(&config.store.path)
                .await?
                .with_sync_writes(config.store.sync_writes),
        );

        let session = config
            .context
            .session
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let context = Arc::new(
            StaticContext::new(config.context.blog, session)
                .with_variations(config.context.variations.clone()),
        );

        let recorder =
            FootstepRecorder::new(store.clone(), context).with_config(config.recorder.clone());

        tracing::info!(
            path = %store.path().display(),
            component = recorder.component(),
            "Recorder ready"
        );

        Ok(Self { recorder, store })
    }

    /// Returns the footstep log.
    pub fn store(&self) -> &JsonlStore {
        &self.store
    }

    /// Parses and records one input line.
    pub async fn process_line(&self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Skipped;
        }

        let raw: RawEvent = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(err) => return LineOutcome::Malformed(err.to_string()),
        };

        match self.recorder.record(raw).await {
            Ok(id) => LineOutcome::Recorded(id),
            Err(err) => LineOutcome::Failed(err),
        }
    }

    /// Records every line of `input` until end of stream.
    ///
    /// Bad lines are logged and counted; only read errors stop the run.
    pub async fn run<R>(&self, input: R) -> Result<RunSummary, ServiceError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = RunSummary::default();
        let mut lines = input.lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            match self.process_line(&line).await {
                LineOutcome::Skipped => {}
                LineOutcome::Recorded(id) => {
                    tracing::debug!(line = line_no, record_id = %id, "Recorded line");
                    summary.recorded += 1;
                }
                LineOutcome::Malformed(reason) => {
                    tracing::warn!(line = line_no, error = %reason, "Skipping malformed line");
                    summary.malformed += 1;
                }
                LineOutcome::Failed(err) => {
                    tracing::warn!(line = line_no, error = %err, "Failed to record line");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service(dir: &tempfile::TempDir, config: &str) -> RecorderService {
        let mut config = parse_config(config).unwrap();
        config.store.path = dir.path().join("footsteps.jsonl");
        RecorderService::from_config(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_run_records_lines() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(
            &dir,
            r#"
            [context]
            blog = 9
            session = "cli"
            variations = { x2 = "b" }
            "#,
        )
        .await;

        let input = concat!(
            r#"{"action":"plugin","user_id":42,"info":["activated","sample-plugin/sample-plugin.php"]}"#,
            "\n\n",
            r#"{"action":"newuser","user_id":3}"#,
            "\n",
        );
        let summary = service.run(input.as_bytes()).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                recorded: 2,
                malformed: 0,
                failed: 0
            }
        );

        let stored = service.store().read_all().await.unwrap();
        assert_eq!(stored.len(), 2);
        let plugin = &stored[0].record;
        assert_eq!(plugin.info(), "activated|sample-plugin/sample-plugin.php");
        assert_eq!(plugin.user(), Some(42));
        assert_eq!(plugin.blog(), Some(9));
        assert_eq!(plugin.session(), "cli");
        assert_eq!(plugin.variation("x2"), Some("b"));
        assert_eq!(stored[1].record.info(), "");
    }

    #[tokio::test]
    async fn test_bad_lines_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "").await;

        let input = concat!(
            "not json\n",
            r#"{"action":""}"#,
            "\n",
            r#"{"action":"widget","user_id":-1}"#,
            "\n",
            r#"{"action":"widget","info":["update","text","2"]}"#,
            "\n",
        );
        let summary = service.run(input.as_bytes()).await.unwrap();

        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(service.store().read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generated_session_is_stable_within_run() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "").await;

        service.process_line(r#"{"action":"a"}"#).await;
        service.process_line(r#"{"action":"b"}"#).await;

        let stored = service.store().read_all().await.unwrap();
        assert!(!stored[0].record.session().is_empty());
        assert_eq!(stored[0].record.session(), stored[1].record.session());
    }

    #[tokio::test]
    async fn test_process_line_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "").await;

        assert!(matches!(service.process_line("   ").await, LineOutcome::Skipped));
        assert!(matches!(
            service.process_line("{").await,
            LineOutcome::Malformed(_)
        ));
        assert!(matches!(
            service.process_line(r#"{"action":"x","user_id":-2}"#).await,
            LineOutcome::Failed(RecordError::InvalidEvent(_))
        ));
    }
}
