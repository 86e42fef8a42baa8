use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::model::UserStatistics;
use crate::error::StorageError;

const STATS_KEY: &str = "user_statistics";
const UNREADABLE_KEY: &str = "user_statistics.corrupt";

/// Durable home of the statistics blob
pub trait StatsBackend {
    /// `Ok(None)` when nothing has been stored yet
    fn load(&self) -> Result<Option<UserStatistics>, StorageError>;
    fn save(&self, stats: &UserStatistics) -> Result<(), StorageError>;

    /// Move an unreadable blob out of the way so the next save starts
    /// fresh without destroying it. Returns where it went.
    fn set_aside(&self) -> Result<String, StorageError>;
}

/// Pretty-printed JSON file, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl StatsBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<UserStatistics>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, stats: &UserStatistics) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(stats)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn set_aside(&self) -> Result<String, StorageError> {
        let mut target = self.path.with_extension("json.corrupt");
        let mut n = 1;
        while target.exists() {
            target = self.path.with_extension(format!("json.corrupt.{n}"));
            n += 1;
        }
        fs::rename(&self.path, &target)?;
        Ok(target.display().to_string())
    }
}

/// Key-value table in a SQLite database holding the JSON blob
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl StatsBackend for SqliteBackend {
    fn load(&self) -> Result<Option<UserStatistics>, StorageError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [STATS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, stats: &UserStatistics) -> Result<(), StorageError> {
        let json = serde_json::to_string(stats)?;
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![STATS_KEY, json, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn set_aside(&self) -> Result<String, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) SELECT ?2, value, ?3 FROM kv WHERE key = ?1",
            params![STATS_KEY, UNREADABLE_KEY, Local::now().to_rfc3339()],
        )?;
        tx.execute("DELETE FROM kv WHERE key = ?1", [STATS_KEY])?;
        tx.commit()?;
        Ok(format!("key {UNREADABLE_KEY}"))
    }
}

/// In-process backend. Clones share the same blob, so a test can reopen
/// a store and observe exactly what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    blob: Rc<RefCell<Option<String>>>,
    set_aside: Rc<RefCell<Option<String>>>,
    fail_saves: Rc<Cell<bool>>,
    saves: Rc<Cell<usize>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves (and set-asides) fail with an I/O error
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn raw(&self) -> Option<String> {
        self.blob.borrow().clone()
    }

    pub fn set_raw(&self, json: &str) {
        *self.blob.borrow_mut() = Some(json.to_string());
    }

    /// Blob moved away by the last `set_aside`
    pub fn set_aside_raw(&self) -> Option<String> {
        self.set_aside.borrow().clone()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_saves.get() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "storage unavailable",
            )));
        }
        Ok(())
    }
}

impl StatsBackend for MemoryBackend {
    fn load(&self) -> Result<Option<UserStatistics>, StorageError> {
        match self.blob.borrow().as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, stats: &UserStatistics) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.blob.borrow_mut() = Some(serde_json::to_string(stats)?);
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn set_aside(&self) -> Result<String, StorageError> {
        self.check_writable()?;
        *self.set_aside.borrow_mut() = self.blob.borrow_mut().take();
        Ok("memory".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::model::{Category, CourseType};
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn sample() -> UserStatistics {
        let mut stats = UserStatistics {
            words_learned: 15,
            lessons_completed: 1,
            accuracy_percent: 75,
            accuracy_samples: 1,
            day_streak: 2,
            ..Default::default()
        };
        stats.time_by_category.insert(Category::Phrases, 12);
        stats
            .lesson_progress
            .entry(CourseType::Beginner)
            .or_default()
            .insert(1, 100);
        stats
    }

    #[test]
    fn json_file_missing_loads_none() {
        let dir = tempdir().unwrap();
        let backend = JsonFileBackend::with_path(dir.path().join("stats.json"));
        assert_matches!(backend.load(), Ok(None));
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.json");
        let backend = JsonFileBackend::with_path(&path);

        backend.save(&sample()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(backend.load().unwrap(), Some(sample()));
    }

    #[test]
    fn json_file_corrupt_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, b"not json").unwrap();

        let backend = JsonFileBackend::with_path(&path);
        assert_matches!(backend.load(), Err(StorageError::Serialize(_)));
    }

    #[test]
    fn json_file_set_aside_keeps_every_copy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let backend = JsonFileBackend::with_path(&path);

        fs::write(&path, b"first").unwrap();
        let first = backend.set_aside().unwrap();
        fs::write(&path, b"second").unwrap();
        let second = backend.set_aside().unwrap();

        assert!(!path.exists());
        assert_matches!(backend.load(), Ok(None));
        assert_eq!(fs::read(dir.path().join("stats.json.corrupt")).unwrap(), b"first");
        assert_eq!(fs::read(dir.path().join("stats.json.corrupt.1")).unwrap(), b"second");
        assert_ne!(first, second);
    }

    #[test]
    fn sqlite_set_aside_moves_blob_to_another_key() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, '{ broken', 'then')",
                [STATS_KEY],
            )
            .unwrap();
        assert_matches!(backend.load(), Err(StorageError::Serialize(_)));

        backend.set_aside().unwrap();
        assert_matches!(backend.load(), Ok(None));
        let kept: String = backend
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [UNREADABLE_KEY], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(kept, "{ broken");
    }

    #[test]
    fn sqlite_roundtrip_and_overwrite() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert_matches!(backend.load(), Ok(None));

        backend.save(&sample()).unwrap();
        let mut changed = sample();
        changed.words_learned = 99;
        backend.save(&changed).unwrap();

        assert_eq!(backend.load().unwrap(), Some(changed));
        let rows: i64 = backend
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn sqlite_file_persists_across_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.db");

        SqliteBackend::open(&path).unwrap().save(&sample()).unwrap();
        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(sample()));
    }

    #[test]
    fn memory_backend_shares_blob_between_clones() {
        let backend = MemoryBackend::new();
        let other = backend.clone();

        backend.save(&sample()).unwrap();
        assert_eq!(other.load().unwrap(), Some(sample()));
        assert_eq!(other.save_count(), 1);
    }

    #[test]
    fn memory_backend_failure_injection() {
        let backend = MemoryBackend::new();
        backend.fail_saves(true);
        assert_matches!(backend.save(&sample()), Err(StorageError::Io(_)));
        assert!(backend.raw().is_none());

        backend.set_raw("{ broken");
        assert_matches!(backend.set_aside(), Err(StorageError::Io(_)));
        assert_eq!(backend.raw().as_deref(), Some("{ broken"));
    }
}
