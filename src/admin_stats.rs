//! Aggregation over the JSONL session log.
//!
//! The log is the only persistent artifact of the service, so everything
//! here streams it line by line and skips anything that fails to parse; a
//! torn tail line from a crashed writer must not poison the dashboard.

use crate::session::SessionRecord;
use crate::types::{InputMethod, Mode, VerdictClass};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const SCORE_BUCKETS: usize = 10;
const DAY_WINDOW: i64 = 30;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCount {
    pub date: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total: u64,
    pub today: u64,
    pub last_hour: u64,
    pub days: Vec<DayCount>,
    pub devices: BTreeMap<String, u64>,
    pub verdicts: BTreeMap<String, u64>,
    pub modes: BTreeMap<String, u64>,
    pub score_histogram: [u64; SCORE_BUCKETS],
    /// device type -> metric name -> mean sub-score.
    pub metric_averages: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub id: String,
    pub verified_at: DateTime<Utc>,
    pub mode: Mode,
    pub input_method: InputMethod,
    pub score: f64,
    pub verdict_class: VerdictClass,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionPage {
    pub total: usize,
    pub rows: Vec<SessionRow>,
}

fn read_records(path: &Path) -> Vec<SessionRecord> {
    let Ok(file) = File::open(path) else {
        return Vec::new();
    };
    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect()
}

pub fn compute(path: &Path) -> AdminStats {
    compute_at(path, Utc::now())
}

pub fn compute_at(path: &Path, now: DateTime<Utc>) -> AdminStats {
    let records = read_records(path);
    let mut stats = AdminStats::default();

    let today = now.date_naive();
    let hour_ago = now - Duration::hours(1);
    let window_start = today - Duration::days(DAY_WINDOW - 1);

    let mut day_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut metric_sums: BTreeMap<String, BTreeMap<String, (f64, u64)>> = BTreeMap::new();

    for r in &records {
        stats.total += 1;
        let day = r.verified_at.date_naive();
        if day == today {
            stats.today += 1;
        }
        if r.verified_at >= hour_ago {
            stats.last_hour += 1;
        }
        if day >= window_start {
            *day_counts.entry(day.format("%Y-%m-%d").to_string()).or_default() += 1;
        }

        *stats.devices.entry(r.input_method.as_str().to_string()).or_default() += 1;
        *stats.verdicts.entry(r.verdict_class.as_str().to_string()).or_default() += 1;
        *stats.modes.entry(r.mode.as_str().to_string()).or_default() += 1;

        let bucket = ((r.score * SCORE_BUCKETS as f64) as usize).min(SCORE_BUCKETS - 1);
        stats.score_histogram[bucket] += 1;

        let device = metric_sums.entry(r.input_method.as_str().to_string()).or_default();
        for (name, metric) in &r.metrics {
            let slot = device.entry(name.clone()).or_insert((0.0, 0));
            slot.0 += metric.score;
            slot.1 += 1;
        }
    }

    // Emit every day of the window, zeros included, oldest first.
    for offset in (0..DAY_WINDOW).rev() {
        let day = today - Duration::days(offset);
        let key = day.format("%Y-%m-%d").to_string();
        let count = day_counts.get(&key).copied().unwrap_or(0);
        stats.days.push(DayCount { date: key, count });
    }

    for (device, metrics) in metric_sums {
        let averaged = metrics
            .into_iter()
            .map(|(name, (sum, n))| (name, sum / n as f64))
            .collect();
        stats.metric_averages.insert(device, averaged);
    }

    stats
}

/// Newest-first page of lightweight rows.
pub fn list_sessions(path: &Path, limit: usize, offset: usize) -> SessionPage {
    let mut records = read_records(path);
    records.reverse();
    let total = records.len();
    let rows = records
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|r| SessionRow {
            id: r.id,
            verified_at: r.verified_at,
            mode: r.mode,
            input_method: r.input_method,
            score: r.score,
            verdict_class: r.verdict_class,
        })
        .collect();
    SessionPage { total, rows }
}

pub fn find_session(path: &Path, id: &str) -> Option<SessionRecord> {
    read_records(path).into_iter().find(|r| r.id == id)
}
