//! Key-value persistence for settings and history.

use crate::models::{
    Settings, SettingChange, KEY_AUTO_START_NEXT, KEY_FOCUS_MINUTES, KEY_LONG_BREAK_INTERVAL,
    KEY_LONG_BREAK_MINUTES, KEY_SHORT_BREAK_MINUTES,
};
use directories::ProjectDirs;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

/// Process-local string key-value storage.
///
/// Every `set` replaces the stored value in a single write, so a crash never
/// leaves a partially written value behind.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
}

/// SQLite-backed store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens the database in the platform data directory, creating it if needed.
    pub fn new() -> Result<Self, DatabaseError> {
        let db_path = Self::db_path();

        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
        }

        Self::open(&db_path)
    }

    /// Opens (or creates) a database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing).
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    pub fn db_path() -> PathBuf {
        ProjectDirs::from("com", "tomabar", "Tomabar")
            .map(|dirs| dirs.data_dir().join("tomabar.db"))
            .unwrap_or_else(|| PathBuf::from("tomabar.db"))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock still guards a valid connection.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory store used as a fake in tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads settings, substituting the default for any missing or malformed
/// value and clamping the rest into range.
pub fn load_settings(store: &dyn KeyValueStore) -> Settings {
    let defaults = Settings::default();
    Settings {
        focus_mins: read_number(store, KEY_FOCUS_MINUTES, defaults.focus_mins),
        short_break_mins: read_number(store, KEY_SHORT_BREAK_MINUTES, defaults.short_break_mins),
        long_break_mins: read_number(store, KEY_LONG_BREAK_MINUTES, defaults.long_break_mins),
        long_break_interval: read_number(
            store,
            KEY_LONG_BREAK_INTERVAL,
            defaults.long_break_interval,
        ),
        auto_start_next: read_or(store, KEY_AUTO_START_NEXT, defaults.auto_start_next),
    }
    .clamped()
}

/// Persists a single applied setting change.
pub fn save_setting(store: &dyn KeyValueStore, change: &SettingChange) -> Result<(), DatabaseError> {
    store.set(change.key(), &change.value())
}

/// Reads any well-formed integer, saturating it into `u32` so that negative
/// or huge values reach the range clamp instead of the default.
fn read_number(store: &dyn KeyValueStore, key: &str, default: u32) -> u32 {
    let value: i64 = read_or(store, key, i64::from(default));
    value.clamp(0, i64::from(u32::MAX)) as u32
}

fn read_or<T: FromStr>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    match store.get(key) {
        Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed setting {key}={raw:?}, using default");
            default
        }),
        Ok(None) => default,
        Err(e) => {
            warn!("Failed to read setting {key}: {e}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::new_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_get_missing_key() {
        let db = Database::new_in_memory().unwrap();
        assert_eq!(db.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_value() {
        let db = Database::new_in_memory().unwrap();
        db.set("k", "v1").unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("v1"));

        db.set("k", "v2").unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tomabar.db");

        {
            let db = Database::open(&path).unwrap();
            db.set(KEY_FOCUS_MINUTES, "40").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(load_settings(&db).focus_mins, 40);
    }

    #[test]
    fn test_settings_defaults_when_empty() {
        let store = MemoryStore::new();
        assert_eq!(load_settings(&store), Settings::default());
    }

    #[test]
    fn test_settings_save_and_load() {
        let db = Database::new_in_memory().unwrap();

        let mut settings = Settings::default();
        for change in [
            SettingChange::FocusMinutes(30),
            SettingChange::ShortBreakMinutes(10),
            SettingChange::LongBreakMinutes(20),
            SettingChange::LongBreakInterval(3),
            SettingChange::AutoStartNext(true),
        ] {
            let applied = settings.apply(change);
            save_setting(&db, &applied).unwrap();
        }

        assert_eq!(load_settings(&db), settings);
    }

    #[test]
    fn test_malformed_setting_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set(KEY_FOCUS_MINUTES, "twenty").unwrap();
        store.set(KEY_AUTO_START_NEXT, "maybe").unwrap();
        store.set(KEY_SHORT_BREAK_MINUTES, "8").unwrap();

        let settings = load_settings(&store);
        assert_eq!(settings.focus_mins, 25);
        assert!(!settings.auto_start_next);
        assert_eq!(settings.short_break_mins, 8);
    }

    #[test]
    fn test_out_of_range_setting_is_clamped() {
        let store = MemoryStore::new();
        store.set(KEY_LONG_BREAK_MINUTES, "600").unwrap();
        store.set(KEY_LONG_BREAK_INTERVAL, "0").unwrap();

        let settings = load_settings(&store);
        assert_eq!(settings.long_break_mins, 120);
        assert_eq!(settings.long_break_interval, 2);
    }

    #[test]
    fn test_negative_setting_is_clamped() {
        let store = MemoryStore::new();
        store.set(KEY_FOCUS_MINUTES, "-5").unwrap();
        store.set(KEY_LONG_BREAK_INTERVAL, "-3").unwrap();
        store.set(KEY_SHORT_BREAK_MINUTES, "99999999999").unwrap();

        let settings = load_settings(&store);
        assert_eq!(settings.focus_mins, 1);
        assert_eq!(settings.long_break_interval, 2);
        assert_eq!(settings.short_break_mins, 120);
    }

    #[test]
    fn test_settings_overwrite() {
        let db = Database::new_in_memory().unwrap();
        save_setting(&db, &SettingChange::FocusMinutes(30)).unwrap();
        save_setting(&db, &SettingChange::FocusMinutes(45)).unwrap();

        assert_eq!(load_settings(&db).focus_mins, 45);
    }
}
