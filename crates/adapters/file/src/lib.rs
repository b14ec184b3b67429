//! # bStat File Adapter
//!
//! An append-only JSON Lines footstep store. Every insert becomes one line
//! holding the [`StoredFootstep`] (id, record, stored-at time).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bstat_adapter_file::JsonlStore;
//!
//! let store = Arc::new(JsonlStore::open("/var/log/bstat/footsteps.jsonl").await?);
//! let recorder = FootstepRecorder::new(store, context);
//! ```

use async_trait::async_trait;
use bstat_core::{BackingStore, FootstepRecord, RecordId, StoreError, StoreResult, StoredFootstep};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Append-only JSON Lines footstep store.
///
/// The line for a record is written by a blocking task with a single
/// `write_all`. Once an insert has been issued, dropping the caller's future
/// does not stop that task, so a line is never left half written by
/// cancellation. A write or sync that fails part way truncates the log back
/// to its previous length before the error is returned.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
    file: Arc<Mutex<File>>,
    sync_writes: bool,
}

impl JsonlStore {
    /// Opens (or creates) the log at `path`, creating parent directories.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let open_path = path.clone();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new().create(true).append(true).open(open_path)
        })
        .await
        .map_err(|e| StoreError::Io(e.to_string()))??;

        tracing::debug!(path = %path.display(), "Opened footstep log");

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
            sync_writes: false,
        })
    }

    /// Flushes every line to disk before `insert` returns.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Returns the log path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored footstep back, in append order.
    ///
    /// An unterminated final line that does not parse is a torn write from a
    /// crashed process; it is logged and skipped. Any other malformed line is
    /// an error.
    pub async fn read_all(&self) -> StoreResult<Vec<StoredFootstep>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        parse_log(&content)
    }
}

fn parse_log(content: &str) -> StoreResult<Vec<StoredFootstep>> {
    let (complete, tail) = match content.rfind('\n') {
        Some(end) => content.split_at(end + 1),
        None => ("", content),
    };

    let mut footsteps = complete
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(StoreError::from))
        .collect::<StoreResult<Vec<StoredFootstep>>>()?;

    if !tail.trim().is_empty() {
        match serde_json::from_str(tail) {
            Ok(footstep) => footsteps.push(footstep),
            Err(err) => {
                tracing::warn!(
                    bytes = tail.len(),
                    error = %err,
                    "Skipping torn final line in footstep log"
                );
            }
        }
    }

    Ok(footsteps)
}

/// The operations an insert needs from the log file.
trait LogFile: Write {
    fn len(&self) -> std::io::Result<u64>;
    fn truncate(&mut self, len: u64) -> std::io::Result<()>;
    fn sync(&mut self) -> std::io::Result<()>;
}

impl LogFile for File {
    fn len(&self) -> std::io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_data()
    }
}

/// Appends `line` in full or not at all.
fn append_line<F: LogFile>(file: &mut F, line: &[u8], sync_writes: bool) -> StoreResult<()> {
    let prev_len = file.len()?;

    let written = file
        .write_all(line)
        .and_then(|_| if sync_writes { file.sync() } else { Ok(()) });

    if let Err(err) = written {
        if let Err(truncate_err) = file.truncate(prev_len) {
            tracing::error!(
                len = prev_len,
                error = %truncate_err,
                "Failed to roll back partial footstep line"
            );
        }
        return Err(err.into());
    }

    Ok(())
}

#[async_trait]
impl BackingStore for JsonlStore {
    async fn insert(&self, record: &FootstepRecord) -> StoreResult<RecordId> {
        let stored = StoredFootstep::new(record.clone());
        let id = stored.id;

        let mut line = serde_json::to_vec(&stored)?;
        line.push(b'\n');

        let file = self.file.clone();
        let sync_writes = self.sync_writes;
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let mut file = file
                .lock()
                .map_err(|_| StoreError::Io("footstep log lock poisoned".to_string()))?;
            append_line(&mut *file, &line, sync_writes)
        })
        .await
        .map_err(|e| StoreError::Io(e.to_string()))??;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstat_adapter_memory::StaticContext;
    use bstat_core::{FootstepRecorder, RawEvent};

    async fn sample_record(action: &str, info: &[&str]) -> FootstepRecord {
        let recorder = FootstepRecorder::new(
            Arc::new(bstat_adapter_memory::MemoryStore::new()),
            Arc::new(StaticContext::new(2, "sess").with_variation("x1", "a")),
        );
        recorder
            .footstep(&RawEvent::new(action).with_info(info.iter().copied()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("footsteps.jsonl"))
            .await
            .unwrap();

        let record = sample_record("widget", &["update", "text", "2"]).await;
        let id = store.insert(&record).await.unwrap();

        let stored = store.read_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].record, record);
        assert_eq!(stored[0].record.info(), "update|text|2");
    }

    #[tokio::test]
    async fn test_one_line_per_insert() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("nested/dir/log.jsonl"))
            .await
            .unwrap()
            .with_sync_writes(true);

        let record = sample_record("plugin", &["activated", "a/a.php"]).await;
        let first = store.insert(&record).await.unwrap();
        let second = store.insert(&record).await.unwrap();
        assert_ne!(first, second);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let record = sample_record("newuser", &[""]).await;

        JsonlStore::open(&path).await.unwrap().insert(&record).await.unwrap();
        let reopened = JsonlStore::open(&path).await.unwrap();
        reopened.insert(&record).await.unwrap();

        assert_eq!(reopened.read_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_line_is_flat_footstep() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("log.jsonl")).await.unwrap();
        store
            .insert(&sample_record("userauth", &["https://example.com/"]).await)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(value["record"]["action"], "userauth");
        assert_eq!(value["record"]["x1"], "a");
        assert_eq!(value["record"]["blog"], 2);
        assert!(value["id"].is_string());
    }

    /// In-memory log file that accepts `capacity` bytes, then fails.
    struct ShortFile {
        data: Vec<u8>,
        capacity: usize,
        fail_sync: bool,
    }

    impl ShortFile {
        fn new(capacity: usize) -> Self {
            Self {
                data: Vec::new(),
                capacity,
                fail_sync: false,
            }
        }
    }

    impl Write for ShortFile {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let room = self.capacity - self.data.len();
            if room == 0 {
                return Err(std::io::Error::other("File too large"));
            }
            let n = room.min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogFile for ShortFile {
        fn len(&self) -> std::io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn truncate(&mut self, len: u64) -> std::io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }

        fn sync(&mut self) -> std::io::Result<()> {
            if self.fail_sync {
                return Err(std::io::Error::other("sync failed"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_partial_write_is_rolled_back() {
        let mut file = ShortFile::new(20);

        append_line(&mut file, b"{\"first\":1}\n", false).unwrap();
        let err = append_line(&mut file, b"{\"second\":\"too long\"}\n", false).unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(file.data, b"{\"first\":1}\n");

        file.capacity = 1024;
        append_line(&mut file, b"{\"third\":3}\n", false).unwrap();
        assert_eq!(file.data, b"{\"first\":1}\n{\"third\":3}\n");
    }

    #[test]
    fn test_failed_sync_is_rolled_back() {
        let mut file = ShortFile::new(1024);
        file.fail_sync = true;

        assert!(append_line(&mut file, b"line\n", true).is_err());
        assert!(file.data.is_empty());
        assert!(append_line(&mut file, b"line\n", false).is_ok());
    }

    #[tokio::test]
    async fn test_torn_final_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("log.jsonl")).await.unwrap();
        let id = store.insert(&sample_record("plugin", &["x"]).await).await.unwrap();

        let mut raw = std::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .unwrap();
        raw.write_all(br#"{"id":"5f0c","record":{"post":1,"x3":nu"#).unwrap();

        let stored = store.read_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
    }

    #[test]
    fn test_malformed_middle_line_is_an_error() {
        let result = parse_log("not json\n");
        assert!(matches!(result, Err(StoreError::Serialization(_))));
        assert!(parse_log("").unwrap().is_empty());
    }
}
