//! JSONL file writer for consensus events.
//!
//! Each [`ConsensusEvent`] is serialized as a single JSON line carrying its
//! `type` tag and a `timestamp`, appended to the file via a buffered writer.

use hive_application::{ConsensusEvent, ConsensusObserver};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Consensus event log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Existing content is kept;
/// new events are appended. Flushes after every line and on `Drop`.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Create a new event log appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConsensusObserver for JsonlEventLog {
    fn on_event(&self, event: &ConsensusEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut record = match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => return,
            Err(e) => {
                warn!("Could not serialize {} event: {}", event.event_type(), e);
                return;
            }
        };
        record.insert(
            "timestamp".to_string(),
            serde_json::Value::String(timestamp),
        );

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_domain::{AgentId, Participation, RoundId};
    use std::io::Read;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_event_log_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = JsonlEventLog::new(&path).unwrap();

        log.on_event(&ConsensusEvent::VotingStarted {
            round_id: RoundId::new("round-1"),
            topic_id: "topic-1".to_string(),
            question: "Expand?".to_string(),
        });
        log.on_event(&ConsensusEvent::VoteCast {
            round_id: RoundId::new("round-1"),
            agent_id: AgentId::new("a1"),
        });
        drop(log);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(line.get("timestamp").is_some());
        }
        assert_eq!(lines[0]["type"], "voting-started");
        assert_eq!(lines[0]["round_id"], "round-1");
        assert_eq!(lines[0]["question"], "Expand?");
        assert_eq!(lines[1]["type"], "vote-cast");
        assert_eq!(lines[1]["agent_id"], "a1");
    }

    #[test]
    fn test_event_log_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");

        for _ in 0..2 {
            let log = JsonlEventLog::new(&path).unwrap();
            log.on_event(&ConsensusEvent::DecisionDeferred {
                round_id: RoundId::new("round-9"),
                participation: Participation::new(6, 2),
            });
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["type"], "decision-deferred");
        assert_eq!(lines[1]["participation"]["actual_voters"], 2);
    }
}
