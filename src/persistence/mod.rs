//! Session result hand-off
//!
//! The engine delivers one `SessionRecord` per completed session to a
//! `ScoreSink`. Delivery is fire-and-forget: a failure is reported and logged,
//! never retried here.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::SessionSummary;
use crate::settings::GameKind;

/// Persistence failures
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// A finished session tagged with its game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub game: GameKind,
    pub summary: SessionSummary,
    /// Host clock at completion
    pub completed_at_ms: u64,
}

/// Receives completed sessions
pub trait ScoreSink {
    fn submit(&mut self, record: &SessionRecord) -> Result<(), PersistError>;
}

/// Appends one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the log, skipping lines that fail to parse
    pub fn read_all(&self) -> Result<Vec<SessionRecord>, PersistError> {
        let text = std::fs::read_to_string(&self.path)?;
        let records = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping corrupt session line: {}", e);
                    None
                }
            })
            .collect();
        Ok(records)
    }
}

impl ScoreSink for JsonLinesSink {
    fn submit(&mut self, record: &SessionRecord) -> Result<(), PersistError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        log::info!(
            "Session saved to {} ({} {}/{})",
            self.path.display(),
            record.game.as_str(),
            record.summary.correct,
            record.summary.total_rounds
        );
        Ok(())
    }
}

/// Keeps records in memory; optionally rejects everything
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<SessionRecord>,
    /// Reject submissions with this reason
    pub reject: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that fails every submission
    pub fn rejecting(reason: &str) -> Self {
        Self {
            records: Vec::new(),
            reject: Some(reason.to_string()),
        }
    }
}

impl ScoreSink for MemorySink {
    fn submit(&mut self, record: &SessionRecord) -> Result<(), PersistError> {
        if let Some(reason) = &self.reject {
            return Err(PersistError::Rejected(reason.clone()));
        }
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(correct: u32) -> SessionRecord {
        SessionRecord {
            game: GameKind::SnakeSlide,
            summary: SessionSummary {
                total_rounds: 5,
                correct,
                incorrect: 5 - correct,
                accuracy_pct: correct as f32 * 20.0,
                xp_awarded: correct * 10,
            },
            completed_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_json_lines_appends() {
        let path = std::env::temp_dir().join(format!("trace_trainer_sessions_{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut sink = JsonLinesSink::new(&path);
        sink.submit(&record(3)).unwrap();
        sink.submit(&record(5)).unwrap();

        let records = sink.read_all().unwrap();
        assert_eq!(records, vec![record(3), record(5)]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with(r#"{"game":"snake_slide""#));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_memory_sink_rejects() {
        let mut sink = MemorySink::rejecting("offline");
        let err = sink.submit(&record(1)).unwrap_err();
        assert!(matches!(err, PersistError::Rejected(ref r) if r == "offline"));
        assert!(sink.records.is_empty());

        let mut sink = MemorySink::new();
        sink.submit(&record(1)).unwrap();
        assert_eq!(sink.records.len(), 1);
    }
}
