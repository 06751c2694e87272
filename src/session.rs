//! Session records and the append-only JSONL sink.
//!
//! The engine emits one structured record per verification; a sink persists
//! it. Persistence is best-effort: a failed append must never fail the
//! verification response, so sink errors are logged and swallowed by the
//! caller.

use crate::scoring::MetricScore;
use crate::types::{InputMethod, Mode, VerdictClass};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedSessionInfo {
    pub hover_time_ms: f64,
    pub unique_elements: usize,
    pub plausible: bool,
}

/// One line of the session log.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub verified_at: DateTime<Utc>,
    pub mode: Mode,
    pub challenge_id: String,
    pub input_method: InputMethod,
    pub score: f64,
    pub verdict: String,
    pub verdict_class: VerdictClass,
    pub metrics: BTreeMap<String, MetricScore>,
    pub sample_rate_hz: f64,
    pub sample_count: usize,
    pub valid_metric_count: usize,
    pub ip_hash: String,
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<EmbedSessionInfo>,
}

pub trait SessionSink: Send + Sync {
    fn append(&self, record: &SessionRecord) -> anyhow::Result<()>;
}

/// No-op sink (tests, embedding without persistence).
#[derive(Clone, Debug, Default)]
pub struct NoopSessionSink;

impl SessionSink for NoopSessionSink {
    fn append(&self, _record: &SessionRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Line-delimited JSON appender. One `writeln!` per record under a mutex;
/// readers tolerate torn lines by skipping anything that fails to parse.
pub struct JsonlSessionSink {
    file: Mutex<File>,
}

impl JsonlSessionSink {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SessionSink for JsonlSessionSink {
    fn append(&self, record: &SessionRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = self.file.lock();
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            verified_at: Utc::now(),
            mode: Mode::Standalone,
            challenge_id: "c0ffee".into(),
            input_method: InputMethod::Mouse,
            score: 0.8,
            verdict: "BIOLOGICAL CONTROLLER DETECTED".into(),
            verdict_class: VerdictClass::Biological,
            metrics: BTreeMap::new(),
            sample_rate_hz: 98.5,
            sample_count: 1_900,
            valid_metric_count: 7,
            ip_hash: "a1b2c3d4e5f60718".into(),
            user_agent: "test".into(),
            embed: None,
        }
    }

    #[test]
    fn jsonl_sink_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.jsonl");
        let sink = JsonlSessionSink::open(&path).unwrap();
        sink.append(&record("s1")).unwrap();
        sink.append(&record("s2")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let back: SessionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(back.id, "s1");
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut r = record("s3");
        r.embed = Some(EmbedSessionInfo {
            hover_time_ms: 9_000.0,
            unique_elements: 3,
            plausible: true,
        });
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"verdictClass\":\"BIOLOGICAL\""));
        assert!(json.contains("\"ipHash\""));
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.embed.unwrap().unique_elements, 3);
    }
}
