use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use super::error::{GuardError, Result, StorageError};

/// Shared SQLite connection for one store file.
#[derive(Clone)]
pub(crate) struct Db {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Db {
    /// Open (creating if needed) and apply `schema`.
    pub fn open(path: &Path, schema: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(GuardError::storage(path))?;
        }
        let created = !path.exists();

        let conn = Connection::open(path).map_err(GuardError::storage(path))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(GuardError::storage(path))?;
        conn.execute_batch(schema).map_err(GuardError::storage(path))?;

        if created {
            info!("Created {}", path.display());
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            self.err()(std::io::Error::other(format!("Lock poisoned: {}", e)))
        })
    }

    /// `map_err` adapter tagging errors with this store.
    pub fn err<E: Into<StorageError>>(&self) -> impl FnOnce(E) -> GuardError + '_ {
        GuardError::storage(&self.path)
    }
}
