//! FileSink - appends events to a JSON Lines file

use chrono::{DateTime, Utc};
use contracts::{AuditEvent, ContractError, EventSink};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file, created if missing
    pub path: PathBuf,
    /// `sync_data` after every batch
    pub fsync: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;

        let fsync = match params.get("fsync").map(|s| s.to_ascii_lowercase()) {
            None => true,
            Some(v) if v == "true" || v == "1" => true,
            Some(v) if v == "false" || v == "0" => false,
            Some(v) => return Err(format!("invalid 'fsync' value '{v}'")),
        };

        Ok(Self { path, fsync })
    }
}

/// One line of output
#[derive(Serialize)]
struct StoredEvent<'a> {
    #[serde(flatten)]
    event: &'a AuditEvent,
    created_at: DateTime<Utc>,
}

/// Sink that appends one JSON object per line
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    file: Option<File>,
}

impl FileSink {
    /// Open (or create) the output file
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            file: Some(file),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Self::new(name, config)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Serialize the whole batch first so a bad event writes nothing
    fn encode_batch(batch: &[AuditEvent]) -> serde_json::Result<Vec<u8>> {
        let created_at = Utc::now();
        let mut buf = Vec::with_capacity(batch.len() * 256);
        for event in batch {
            serde_json::to_writer(&mut buf, &StoredEvent { event, created_at })?;
            buf.push(b'\n');
        }
        Ok(buf)
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("file sink closed"))?;
        append_whole(file, bytes, self.config.fsync)
    }

    fn persist_batch(&mut self, batch: &[AuditEvent]) -> Result<(), ContractError> {
        let bytes = Self::encode_batch(batch)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        self.append(&bytes).map_err(|e| {
            error!(sink = %self.name, events = batch.len(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

/// Append-only output that can be cut back to a previous length
trait AppendTarget: Write {
    fn len(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&self) -> io::Result<()>;
}

impl AppendTarget for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Append `bytes` as a unit: a failed write leaves the target at its old length
fn append_whole<T: AppendTarget>(target: &mut T, bytes: &[u8], fsync: bool) -> io::Result<()> {
    let start = target.len()?;
    let written = target
        .write_all(bytes)
        .and_then(|()| if fsync { target.sync() } else { Ok(()) });

    if let Err(e) = written {
        if let Err(rollback) = target.truncate(start) {
            error!(error = %rollback, len = start, "Failed to truncate partial batch");
        }
        return Err(e);
    }
    Ok(())
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, events = batch.len())
    )]
    async fn write_batch(&mut self, batch: &[AuditEvent]) -> Result<(), ContractError> {
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(file) = self.file.take() {
            file.sync_all()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        debug!(sink = %self.name, path = %self.config.path.display(), "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EventType, Severity};
    use tempfile::tempdir;

    fn sample(n: u8) -> AuditEvent {
        let mut event = AuditEvent::new(
            EventType::ConfigChange,
            Severity::Medium,
            std::net::IpAddr::from([172, 16, 0, n]),
            Utc::now(),
        );
        event.user_id = Some(format!("user-{n}"));
        event
    }

    #[tokio::test]
    async fn test_file_sink_appends_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let config = FileSinkConfig {
            path: path.clone(),
            fsync: false,
        };

        let mut sink = FileSink::new("test_file", config).unwrap();
        let first = vec![sample(1), sample(2)];
        let second = vec![sample(3)];
        sink.write_batch(&first).await.unwrap();
        sink.write_batch(&second).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], first[0].id.to_string());
        assert_eq!(lines[0]["event_type"], "config_change");
        assert_eq!(lines[2]["user_id"], "user-3");
        assert!(lines[0].get("created_at").is_some());
        assert!(lines[0].get("ingested_at").is_some());
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("events.jsonl"),
            fsync: true,
        };

        let mut sink = FileSink::new("closed_file", config).unwrap();
        sink.close().await.unwrap();

        let err = sink.write_batch(&[sample(1)]).await.unwrap_err();
        assert!(err.to_string().contains("closed_file"));
    }

    /// Accepts bytes up to `capacity`, then fails like a full disk
    struct ShortDevice {
        data: Vec<u8>,
        capacity: usize,
    }

    impl Write for ShortDevice {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity.saturating_sub(self.data.len());
            if room == 0 {
                return Err(io::Error::other("no space left on device"));
            }
            let n = room.min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl AppendTarget for ShortDevice {
        fn len(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }

        fn sync(&self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_short_write_leaves_no_partial_batch() {
        let mut device = ShortDevice {
            data: b"{\"n\":1}\n".to_vec(),
            capacity: 32,
        };
        let batch = FileSink::encode_batch(&[sample(2), sample(3)]).unwrap();
        assert!(batch.len() > 32);

        let err = append_whole(&mut device, &batch, true).unwrap_err();
        assert!(err.to_string().contains("no space"));
        assert_eq!(device.data, b"{\"n\":1}\n");

        device.capacity = usize::MAX;
        append_whole(&mut device, &batch, false).unwrap();
        assert_eq!(device.data.len(), 8 + batch.len());
        assert!(device.data.ends_with(b"\n"));
    }

    #[test]
    fn test_config_from_params() {
        let mut params = HashMap::new();
        assert!(FileSinkConfig::from_params(&params).is_err());

        params.insert("path".to_string(), "/tmp/audit.jsonl".to_string());
        let config = FileSinkConfig::from_params(&params).unwrap();
        assert!(config.fsync);

        params.insert("fsync".to_string(), "FALSE".to_string());
        assert!(!FileSinkConfig::from_params(&params).unwrap().fsync);

        params.insert("fsync".to_string(), "sometimes".to_string());
        assert!(FileSinkConfig::from_params(&params).is_err());
    }
}
