//! File-backed stores shared by the scanner, classifier and isolator.
//!
//! - [`BoundedLog`]: append-only JSONL history keeping the newest `cap`
//!   entries. Appends write whole lines under the store lock; once the
//!   file holds more than twice the cap it is compacted back down to the
//!   cap with an atomic rename. Reads never return more than `cap`.
//! - [`JsonDocument`]: a single JSON document updated read-modify-write
//!   under the store lock and replaced atomically.
//!
//! Corrupted JSONL lines are skipped on read, never fatal.

use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{GuardError, Result};
use crate::concurrency::StoreLock;

/// Append-only, capped JSONL history.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    path: PathBuf,
    lock: StoreLock,
    cap: usize,
    _entry: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> BoundedLog<T> {
    pub fn new(path: impl Into<PathBuf>, lock: StoreLock, cap: usize) -> Self {
        Self {
            path: path.into(),
            lock,
            cap: cap.max(1),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn append(&self, entry: &T) -> Result<()> {
        self.append_all(std::slice::from_ref(entry))
    }

    /// Append entries in order. Either every line is written or an error
    /// is returned; callers treat an error as "not recorded".
    pub fn append_all(&self, entries: &[T]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        for entry in entries {
            buf.push_str(&serde_json::to_string(entry).map_err(GuardError::storage(&self.path))?);
            buf.push('\n');
        }

        let _guard = self.lock.acquire().map_err(GuardError::storage(&self.path))?;
        ensure_parent(&self.path)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(GuardError::storage(&self.path))?;
        file.write_all(buf.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(GuardError::storage(&self.path))?;
        drop(file);

        self.compact_if_needed()
    }

    /// Every retained entry, oldest first (at most `cap`).
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let _guard = self.lock.acquire().map_err(GuardError::storage(&self.path))?;
        let content = fs::read_to_string(&self.path).map_err(GuardError::storage(&self.path))?;

        let mut entries: Vec<T> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect();

        if entries.len() > self.cap {
            entries.drain(..entries.len() - self.cap);
        }
        Ok(entries)
    }

    /// The newest `limit` entries, oldest first. Reporting path: a store
    /// that cannot be read yields an empty list and a warning.
    pub fn recent(&self, limit: usize) -> Vec<T> {
        match self.read_all() {
            Ok(mut entries) => {
                if entries.len() > limit {
                    entries.drain(..entries.len() - limit);
                }
                entries
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Caller must hold the store lock.
    fn compact_if_needed(&self) -> Result<()> {
        let content = fs::read_to_string(&self.path).map_err(GuardError::storage(&self.path))?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

        if lines.len() <= self.cap * 2 {
            return Ok(());
        }

        let keep = &lines[lines.len() - self.cap..];
        let mut out = keep.join("\n");
        out.push('\n');
        write_atomic(&self.path, out.as_bytes())?;
        debug!(
            "Compacted {} from {} to {} entries",
            self.path.display(),
            lines.len(),
            keep.len()
        );
        Ok(())
    }
}

/// A JSON document replaced atomically on every update.
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    lock: StoreLock,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonDocument<T> {
    pub fn new(path: impl Into<PathBuf>, lock: StoreLock) -> Self {
        Self {
            path: path.into(),
            lock,
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; `Ok(None)` if it does not exist yet. A document
    /// that exists but cannot be parsed is an error, not a silent reset.
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let _guard = self.lock.acquire().map_err(GuardError::storage(&self.path))?;
        self.read_unlocked()
    }

    /// Read-modify-write under the store lock. `init` supplies the
    /// document when none exists yet.
    pub fn update<R>(&self, init: impl FnOnce() -> T, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let _guard = self.lock.acquire().map_err(GuardError::storage(&self.path))?;
        let mut doc = self.read_unlocked()?.unwrap_or_else(init);
        let out = f(&mut doc);
        self.write_unlocked(&doc)?;
        Ok(out)
    }

    /// Replace the document wholesale.
    pub fn save(&self, doc: &T) -> Result<()> {
        let _guard = self.lock.acquire().map_err(GuardError::storage(&self.path))?;
        self.write_unlocked(doc)
    }

    fn read_unlocked(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(GuardError::storage(&self.path))?;
        let doc = serde_json::from_str(&content).map_err(GuardError::storage(&self.path))?;
        Ok(Some(doc))
    }

    fn write_unlocked(&self, doc: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(doc).map_err(GuardError::storage(&self.path))?;
        write_atomic(&self.path, json.as_bytes())
    }
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(GuardError::storage(path))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(GuardError::storage(path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        n: usize,
    }

    fn log_in(dir: &Path, cap: usize) -> BoundedLog<Entry> {
        let path = dir.join("history.jsonl");
        BoundedLog::new(&path, StoreLock::for_store(&path, None), cap)
    }

    #[test]
    fn append_and_read_back_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path(), 10);

        for n in 0..3 {
            log.append(&Entry { n }).unwrap();
        }

        let entries = log.read_all().unwrap();
        assert_eq!(entries, vec![Entry { n: 0 }, Entry { n: 1 }, Entry { n: 2 }]);
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path(), 5);

        for n in 0..23 {
            log.append(&Entry { n }).unwrap();
        }

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries.first().unwrap().n, 18);
        assert_eq!(entries.last().unwrap().n, 22);

        // The file itself is compacted, not just the read view
        let lines = fs::read_to_string(log.path()).unwrap().lines().count();
        assert!(lines <= 10, "file holds {lines} lines");
    }

    #[test]
    fn corrupted_lines_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path(), 10);

        log.append(&Entry { n: 1 }).unwrap();
        let mut file = fs::OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file, "{{not json").unwrap();
        drop(file);
        log.append(&Entry { n: 2 }).unwrap();

        assert_eq!(log.read_all().unwrap().len(), 2);
    }

    #[test]
    fn recent_limits_and_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path(), 10);
        assert!(log.recent(5).is_empty());

        log.append_all(&(0..6).map(|n| Entry { n }).collect::<Vec<_>>())
            .unwrap();
        let recent = log.recent(2);
        assert_eq!(recent, vec![Entry { n: 4 }, Entry { n: 5 }]);
    }

    #[test]
    fn json_document_update_and_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.json");
        let doc: JsonDocument<Vec<u32>> =
            JsonDocument::new(&path, StoreLock::for_store(&path, None));

        assert!(doc.load().unwrap().is_none());
        doc.update(Vec::new, |v| v.push(7)).unwrap();
        doc.update(Vec::new, |v| v.push(8)).unwrap();
        assert_eq!(doc.load().unwrap().unwrap(), vec![7, 8]);

        fs::write(&path, "garbage").unwrap();
        assert!(matches!(doc.load(), Err(GuardError::Storage { .. })));
    }
}
