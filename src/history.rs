//! Day-keyed history of completed focus intervals.
//!
//! The whole mapping lives under a single store key as a JSON object of
//! `YYYY-MM-DD -> count`, so every increment or prune is one atomic replace.

use crate::clock::Clock;
use crate::models::DayCount;
use crate::persistence::{DatabaseError, KeyValueStore};
use chrono::{Days, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Store key holding the serialized history mapping.
pub const HISTORY_KEY: &str = "pomodoroHistory";

/// Days of history kept by the startup prune.
pub const RETENTION_DAYS: u32 = 30;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Fixed-format key for a calendar day.
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT).ok()
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct HistoryRecord(BTreeMap<String, u32>);

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Completed focus intervals on `day`; zero when nothing is recorded.
    pub fn count(&self, day: NaiveDate) -> u32 {
        self.load().0.get(&day_key(day)).copied().unwrap_or(0)
    }

    /// Adds one completion to `day` and returns the new count.
    pub fn increment(&self, day: NaiveDate) -> Result<u32, DatabaseError> {
        let mut record = self.load();
        let count = record.0.entry(day_key(day)).or_insert(0);
        *count += 1;
        let count = *count;
        self.save(&record)?;
        Ok(count)
    }

    /// The last `days` calendar days ending today, oldest first, with zero
    /// entries for days that have no record.
    pub fn recent(&self, days: u32) -> Vec<DayCount> {
        let today = self.clock.today();
        let record = self.load();

        // Walks back from today and stops early at the earliest representable date.
        let mut recent: Vec<DayCount> =
            std::iter::successors(Some(today), |date| date.checked_sub_days(Days::new(1)))
                .take(days as usize)
                .map(|date| {
                    let count = record.0.get(&day_key(date)).copied().unwrap_or(0);
                    DayCount::new(date, count)
                })
                .collect();
        recent.reverse();
        recent
    }

    /// Sum of [`recent`](Self::recent) counts.
    pub fn total(&self, days: u32) -> u32 {
        self.recent(days).iter().map(|d| d.count).sum()
    }

    /// Drops every entry dated strictly before `today - retention_days`, and
    /// any entry whose key is not a valid date. Returns how many were removed.
    ///
    /// A retention reaching past the earliest representable date keeps every
    /// dated entry.
    pub fn prune(&self, retention_days: u32) -> Result<usize, DatabaseError> {
        let cutoff = self
            .clock
            .today()
            .checked_sub_days(Days::new(retention_days.into()));
        let mut record = self.load();
        let before = record.0.len();

        record.0.retain(|key, _| match (parse_day_key(key), cutoff) {
            (Some(date), Some(cutoff)) => date >= cutoff,
            (Some(_), None) => true,
            (None, _) => false,
        });

        let removed = before - record.0.len();
        if removed > 0 {
            self.save(&record)?;
        }
        debug!("Pruned {removed} history entries older than {cutoff:?}");
        Ok(removed)
    }

    fn load(&self) -> HistoryRecord {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HistoryRecord::default(),
            Err(e) => {
                warn!("Failed to read history: {e}");
                return HistoryRecord::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding unreadable history: {e}");
            HistoryRecord::default()
        })
    }

    fn save(&self, record: &HistoryRecord) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(record)?;
        self.store.set(HISTORY_KEY, &json)
    }
}
