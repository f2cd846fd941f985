//! JSON lines decision memory.
//!
//! Each stored decision and each piece of outcome feedback is appended as
//! one JSON object with an `entry` tag:
//!
//! ```text
//! {"entry":"decision","record":{...}}
//! {"entry":"outcome","decision_id":"decision-...","success":true,"recorded_at":"..."}
//! ```
//!
//! The file is replayed on open. Malformed lines are skipped with a warning.

use super::DecisionLog;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hive_application::{DecisionMemory, MemoryError, MemoryHealth};
use hive_domain::DecisionRecord;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{info, warn};

const BACKEND: &str = "jsonl";

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
enum MemoryEntry {
    Decision {
        record: DecisionRecord,
    },
    Outcome {
        decision_id: String,
        success: bool,
        recorded_at: DateTime<Utc>,
    },
}

/// Append-only decision log backed by a JSON lines file.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Every entry is flushed as soon
/// as it is written.
pub struct JsonlDecisionMemory {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    log: RwLock<DecisionLog>,
    /// Last write failure, reported through health checks
    last_error: Mutex<Option<String>>,
}

impl JsonlDecisionMemory {
    /// Open (or create) the log at `path` and replay its entries.
    ///
    /// Creates parent directories if they don't exist.
    pub fn open(path: impl AsRef<Path>, retention_days: Option<u32>) -> Result<Self, MemoryError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Io(format!(
                    "could not create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut log = DecisionLog::new(retention_days);
        if path.exists() {
            Self::replay(path, &mut log)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| MemoryError::Io(format!("could not open {}: {}", path.display(), e)))?;

        info!(
            "Decision memory at {} ({} decisions loaded)",
            path.display(),
            log.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
            log: RwLock::new(log),
            last_error: Mutex::new(None),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(path: &Path, log: &mut DecisionLog) -> Result<(), MemoryError> {
        let file = File::open(path)
            .map_err(|e| MemoryError::Io(format!("could not read {}: {}", path.display(), e)))?;

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| MemoryError::Io(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MemoryEntry>(&line) {
                Ok(MemoryEntry::Decision { record }) => log.append(record),
                Ok(MemoryEntry::Outcome {
                    decision_id,
                    success,
                    ..
                }) => {
                    if log.contains(&decision_id) {
                        log.set_outcome(&decision_id, success);
                    } else {
                        warn!(
                            "{}:{}: outcome for unknown decision {}, ignoring",
                            path.display(),
                            index + 1,
                            decision_id
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        "{}:{}: skipping malformed entry: {}",
                        path.display(),
                        index + 1,
                        e
                    );
                }
            }
        }
        Ok(())
    }

    fn append(&self, entry: &MemoryEntry) -> Result<(), MemoryError> {
        let line =
            serde_json::to_string(entry).map_err(|e| MemoryError::Serialization(e.to_string()))?;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let written = writeln!(writer, "{}", line).and_then(|_| writer.flush());

        let mut last_error = self.last_error.lock().unwrap_or_else(PoisonError::into_inner);
        match written {
            Ok(()) => {
                *last_error = None;
                Ok(())
            }
            Err(e) => {
                let message = format!("write to {} failed: {}", self.path.display(), e);
                warn!("{}", message);
                *last_error = Some(message.clone());
                Err(MemoryError::Io(message))
            }
        }
    }
}

#[async_trait]
impl DecisionMemory for JsonlDecisionMemory {
    async fn store_decision(&self, record: &DecisionRecord) -> Result<(), MemoryError> {
        self.append(&MemoryEntry::Decision {
            record: record.clone(),
        })?;
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .append(record.clone());
        Ok(())
    }

    async fn record_outcome(&self, decision_id: &str, success: bool) -> Result<(), MemoryError> {
        if !self
            .log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(decision_id)
        {
            return Err(MemoryError::UnknownDecision(decision_id.to_string()));
        }

        self.append(&MemoryEntry::Outcome {
            decision_id: decision_id.to_string(),
            success,
            recorded_at: Utc::now(),
        })?;
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_outcome(decision_id, success);
        Ok(())
    }

    async fn get_decision_history(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<DecisionRecord>, MemoryError> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        Ok(log.history(limit, Utc::now()))
    }

    async fn get_health_status(&self) -> MemoryHealth {
        let last_error = self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(detail) = last_error {
            return MemoryHealth::unhealthy(BACKEND, detail);
        }

        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        let mut health = MemoryHealth::healthy(BACKEND, log.visible_count(Utc::now()));
        health.detail = Some(self.path.display().to_string());
        health
    }
}

impl Drop for JsonlDecisionMemory {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
