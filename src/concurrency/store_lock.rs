//! Cross-process store lock using advisory file locking (fs2 flock).
//!
//! Serializes every read-modify-write and append on a JSON/JSONL store
//! across processes (agent runtime, CLI, hooks) so concurrent callers
//! never lose updates or interleave partial lines.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Advisory lock guarding one store file.
///
/// The lock file is separate from the store so that atomic
/// rename-over-write of the store never invalidates a held lock.
#[derive(Debug, Clone)]
pub struct StoreLock {
    path: PathBuf,
}

/// RAII guard that releases the lock on drop.
pub struct StoreLockGuard {
    file: File,
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl StoreLock {
    /// Lock at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lock file for `store`, placed in `lock_dir` when given, otherwise
    /// next to the store as `<store>.lock`.
    pub fn for_store(store: &Path, lock_dir: Option<&Path>) -> Self {
        let name = store
            .file_name()
            .map(|n| format!("{}.lock", n.to_string_lossy()))
            .unwrap_or_else(|| "store.lock".to_string());
        let path = match lock_dir {
            Some(dir) => dir.join(name),
            None => store.with_file_name(name),
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking acquire: waits until the lock is available.
    pub fn acquire(&self) -> io::Result<StoreLockGuard> {
        let file = self.open()?;
        file.lock_exclusive()?;
        Ok(StoreLockGuard { file })
    }

    /// Non-blocking acquire. `None` if another holder has it.
    pub fn try_acquire(&self) -> io::Result<Option<StoreLockGuard>> {
        let file = self.open()?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(StoreLockGuard { file })),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            #[cfg(unix)]
            Err(ref e) if e.raw_os_error() == Some(35) || e.raw_os_error() == Some(11) => {
                // EAGAIN(11) / EWOULDBLOCK(35 on macOS): contention
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn open(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn acquire_and_release() {
        let tmp = tempfile::tempdir().unwrap();
        let lock = StoreLock::new(tmp.path().join("test.lock"));

        let guard = lock.acquire().unwrap();
        drop(guard);

        let _guard2 = lock.acquire().unwrap();
    }

    #[test]
    fn try_acquire_returns_none_when_held() {
        let tmp = tempfile::tempdir().unwrap();
        let lock = StoreLock::new(tmp.path().join("test.lock"));

        let held = lock.acquire().unwrap();
        let other = StoreLock::new(lock.path().to_path_buf());
        assert!(other.try_acquire().unwrap().is_none());

        drop(held);
        assert!(other.try_acquire().unwrap().is_some());
    }

    #[test]
    fn lock_file_placement() {
        let store = Path::new("/state/outbound_findings.jsonl");
        assert_eq!(
            StoreLock::for_store(store, None).path(),
            Path::new("/state/outbound_findings.jsonl.lock")
        );
        assert_eq!(
            StoreLock::for_store(store, Some(Path::new("/run/locks"))).path(),
            Path::new("/run/locks/outbound_findings.jsonl.lock")
        );
    }

    #[test]
    fn concurrent_threads_serialize() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.lock");
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let barrier = Arc::new(Barrier::new(3));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let p = path.clone();
                let c = counter.clone();
                let b = barrier.clone();
                std::thread::spawn(move || {
                    let lock = StoreLock::new(p);
                    b.wait();
                    let _guard = lock.acquire().unwrap();
                    c.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 3);
    }
}
