//! Audit trail of external actions (SQLite).
//!
//! Content is never stored. Each entry keeps:
//! - `content_hash`: SHA-256 hex of the full content
//! - `content_preview`: `[HASHED:<12 hex of SHA-256 of the first 200 chars>|len:<chars>]`
//!
//! Rows are hash-chained: `prev_hash` is the previous row's `entry_hash`
//! (genesis: 64 zeros) and `entry_hash` covers every other column, so
//! edits and deletions show up in [`AuditLog::verify_chain`].
//!
//! Query methods are reporting paths: on a storage failure they log a
//! warning and return empty results.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::db::Db;
use super::error::Result;

/// `prev_hash` of the first entry.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Characters of content covered by the preview hash.
const PREVIEW_CHARS: usize = 200;

const COLUMNS: &str = "id, timestamp, action_type, target, content_hash, content_preview, \
                       metadata, session_key, success, notes, prev_hash, entry_hash";

/// An action about to be logged.
#[derive(Debug, Clone)]
pub struct NewAction {
    pub action_type: String,
    pub target: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub session_key: Option<String>,
    pub success: bool,
    pub notes: Option<String>,
}

impl NewAction {
    /// `action_type` is free-form: email, post, api, file, message, browser, ...
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            target: None,
            content: None,
            metadata: None,
            session_key: None,
            success: true,
            notes: None,
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Hashed on insert, never stored.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action_type: String,
    pub target: Option<String>,
    pub content_hash: Option<String>,
    pub content_preview: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub session_key: Option<String>,
    pub success: bool,
    pub notes: Option<String>,
    pub prev_hash: String,
    pub entry_hash: String,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let metadata: Option<String> = row.get(6)?;
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            action_type: row.get(2)?,
            target: row.get(3)?,
            content_hash: row.get(4)?,
            content_preview: row.get(5)?,
            metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
            session_key: row.get(7)?,
            success: row.get::<_, i64>(8)? != 0,
            notes: row.get(9)?,
            prev_hash: row.get(10)?,
            entry_hash: row.get(11)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub total: u64,
    /// Action types by count, most frequent first.
    pub by_type: Vec<(String, u64)>,
    pub last_24h: u64,
    pub failures: u64,
}

/// Column values covered by `entry_hash`, in hashing order.
struct HashedFields<'a> {
    timestamp: &'a str,
    action_type: &'a str,
    target: Option<&'a str>,
    content_hash: Option<&'a str>,
    content_preview: Option<&'a str>,
    metadata: Option<&'a str>,
    session_key: Option<&'a str>,
    success: bool,
    notes: Option<&'a str>,
}

impl HashedFields<'_> {
    fn entry_hash(&self, prev_hash: &str) -> String {
        let mut hasher = Sha256::new();
        for field in [
            Some(prev_hash),
            Some(self.timestamp),
            Some(self.action_type),
            self.target,
            self.content_hash,
            self.content_preview,
            self.metadata,
            self.session_key,
            Some(if self.success { "1" } else { "0" }),
            self.notes,
        ] {
            // Distinguish NULL from the empty string
            match field {
                Some(v) => {
                    hasher.update([1u8]);
                    hasher.update((v.len() as u64).to_le_bytes());
                    hasher.update(v.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        hex(&hasher.finalize())
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        action_type TEXT NOT NULL,
        target TEXT,
        content_hash TEXT,
        content_preview TEXT,
        metadata TEXT,
        session_key TEXT,
        success INTEGER NOT NULL DEFAULT 1,
        notes TEXT,
        prev_hash TEXT NOT NULL,
        entry_hash TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
    CREATE INDEX IF NOT EXISTS idx_audit_action_type ON audit_log(action_type);
"#;

/// Append-only audit log.
#[derive(Clone)]
pub struct AuditLog {
    db: Db,
}

impl AuditLog {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            db: Db::open(db_path, SCHEMA)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Record an action and return its id.
    pub fn log_action(&self, action: NewAction) -> Result<i64> {
        let (content_hash, content_preview) = match action.content.as_deref() {
            Some(c) if !c.is_empty() => (Some(sha256_hex(c.as_bytes())), Some(preview_hash(c))),
            _ => (None, None),
        };
        let metadata = action
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(self.db.err())?;
        let timestamp = now();

        let fields = HashedFields {
            timestamp: &timestamp,
            action_type: &action.action_type,
            target: action.target.as_deref(),
            content_hash: content_hash.as_deref(),
            content_preview: content_preview.as_deref(),
            metadata: metadata.as_deref(),
            session_key: action.session_key.as_deref(),
            success: action.success,
            notes: action.notes.as_deref(),
        };

        let mut conn = self.db.lock()?;
        let tx = conn.transaction().map_err(self.db.err())?;

        let prev_hash: String = tx
            .query_row(
                "SELECT entry_hash FROM audit_log ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(self.db.err())?
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let entry_hash = fields.entry_hash(&prev_hash);

        tx.execute(
            "INSERT INTO audit_log (timestamp, action_type, target, content_hash, content_preview, \
             metadata, session_key, success, notes, prev_hash, entry_hash) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                fields.timestamp,
                fields.action_type,
                fields.target,
                fields.content_hash,
                fields.content_preview,
                fields.metadata,
                fields.session_key,
                fields.success as i64,
                fields.notes,
                prev_hash,
                entry_hash,
            ],
        )
        .map_err(self.db.err())?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(self.db.err())?;

        debug!(
            "Logged [{}] -> {} (id: {})",
            action.action_type,
            action.target.as_deref().unwrap_or("N/A"),
            id
        );
        Ok(id)
    }

    /// Newest entries first, optionally of one action type.
    pub fn recent(&self, limit: usize, action_type: Option<&str>) -> Vec<AuditEntry> {
        self.degrade("recent", || {
            let conn = self.db.lock()?;
            let entries = match action_type {
                Some(t) => query_entries(
                    &conn,
                    &format!(
                        "SELECT {COLUMNS} FROM audit_log WHERE action_type = ?1 \
                         ORDER BY id DESC LIMIT ?2"
                    ),
                    params![t, limit as i64],
                ),
                None => query_entries(
                    &conn,
                    &format!("SELECT {COLUMNS} FROM audit_log ORDER BY id DESC LIMIT ?1"),
                    params![limit as i64],
                ),
            };
            entries.map_err(self.db.err())
        })
    }

    pub fn stats(&self) -> AuditStats {
        self.degrade("stats", || {
            let conn = self.db.lock()?;
            let cutoff = (Utc::now() - chrono::Duration::hours(24))
                .to_rfc3339_opts(SecondsFormat::Micros, true);

            let count = |sql: &str, p: &[&dyn rusqlite::ToSql]| -> rusqlite::Result<u64> {
                conn.query_row(sql, p, |row| row.get::<_, i64>(0))
                    .map(|n| n as u64)
            };

            let stats = (|| -> rusqlite::Result<AuditStats> {
                let mut stmt = conn.prepare(
                    "SELECT action_type, COUNT(*) AS n FROM audit_log \
                     GROUP BY action_type ORDER BY n DESC, action_type",
                )?;
                let by_type = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(AuditStats {
                    total: count("SELECT COUNT(*) FROM audit_log", &[])?,
                    by_type,
                    last_24h: count(
                        "SELECT COUNT(*) FROM audit_log WHERE timestamp > ?1",
                        &[&cutoff],
                    )?,
                    failures: count("SELECT COUNT(*) FROM audit_log WHERE success = 0", &[])?,
                })
            })();
            stats.map_err(self.db.err())
        })
    }

    /// Substring search over target, notes, action type and the preview
    /// hash. Newest first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<AuditEntry> {
        let pattern = format!("%{}%", escape_like(query));
        self.degrade("search", || {
            let conn = self.db.lock()?;
            query_entries(
                &conn,
                &format!(
                    "SELECT {COLUMNS} FROM audit_log \
                     WHERE target LIKE ?1 ESCAPE '\\' OR notes LIKE ?1 ESCAPE '\\' \
                     OR action_type LIKE ?1 ESCAPE '\\' OR content_preview LIKE ?1 ESCAPE '\\' \
                     ORDER BY id DESC LIMIT ?2"
                ),
                params![pattern, limit as i64],
            )
            .map_err(self.db.err())
        })
    }

    /// Ids of entries whose link or hash does not verify. Empty means the
    /// chain is intact.
    pub fn verify_chain(&self) -> Result<Vec<i64>> {
        let conn = self.db.lock()?;
        let entries = query_entries(
            &conn,
            &format!("SELECT {COLUMNS} FROM audit_log ORDER BY id ASC"),
            [],
        )
        .map_err(self.db.err())?;

        // Metadata is re-read raw so its hash covers the stored bytes
        let mut raw_meta = (|| -> rusqlite::Result<BTreeMap<i64, Option<String>>> {
            let mut stmt = conn.prepare("SELECT id, metadata FROM audit_log")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
            Ok(rows)
        })()
        .map_err(self.db.err())?;

        let mut broken = Vec::new();
        let mut expected_prev = GENESIS_HASH.to_string();
        for entry in &entries {
            let metadata = raw_meta.remove(&entry.id).flatten();
            let fields = HashedFields {
                timestamp: &entry.timestamp,
                action_type: &entry.action_type,
                target: entry.target.as_deref(),
                content_hash: entry.content_hash.as_deref(),
                content_preview: entry.content_preview.as_deref(),
                metadata: metadata.as_deref(),
                session_key: entry.session_key.as_deref(),
                success: entry.success,
                notes: entry.notes.as_deref(),
            };
            if entry.prev_hash != expected_prev
                || fields.entry_hash(&entry.prev_hash) != entry.entry_hash
            {
                warn!("Audit chain broken at entry {}", entry.id);
                broken.push(entry.id);
            }
            expected_prev = entry.entry_hash.clone();
        }
        Ok(broken)
    }

    fn degrade<T: Default>(&self, what: &str, f: impl FnOnce() -> Result<T>) -> T {
        f().unwrap_or_else(|e| {
            warn!("Audit {} query failed: {}", what, e);
            T::default()
        })
    }
}

fn query_entries<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let entries = stmt
        .query_map(params, AuditEntry::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `[HASHED:<12 hex>|len:<chars>]`
fn preview_hash(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    let digest = sha256_hex(head.as_bytes());
    format!("[HASHED:{}|len:{}]", &digest[..12], content.chars().count())
}

fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex(&Sha256::digest(data))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_in(dir: &Path) -> AuditLog {
        AuditLog::open(&dir.join("audit.sqlite")).unwrap()
    }

    #[test]
    fn content_is_never_stored() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());
        let content = "Dear Bob, the launch code is PLAINTEXT-LAUNCH-7781";

        let id = log
            .log_action(
                NewAction::new("email")
                    .target("bob@corp.io")
                    .content(content)
                    .session_key("agent:main:main"),
            )
            .unwrap();

        let entry = &log.recent(1, None)[0];
        assert_eq!(entry.id, id);
        let expected = sha256_hex(content.as_bytes());
        assert_eq!(entry.content_hash.as_deref(), Some(expected.as_str()));
        let preview = entry.content_preview.as_deref().unwrap();
        assert!(preview.starts_with("[HASHED:"));
        assert!(preview.ends_with(&format!("|len:{}]", content.chars().count())));

        let dump = serde_json::to_string(entry).unwrap();
        for needle in ["PLAINTEXT", "launch code", "Dear Bob"] {
            assert!(!dump.contains(needle), "{needle} leaked");
        }
        drop(log);
        let raw = std::fs::read(tmp.path().join("audit.sqlite")).unwrap();
        assert!(!raw.windows(9).any(|w| w == b"PLAINTEXT"));
    }

    #[test]
    fn empty_content_has_no_fingerprint() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());
        log.log_action(NewAction::new("api").content("")).unwrap();
        let entry = &log.recent(1, None)[0];
        assert!(entry.content_hash.is_none());
        assert!(entry.content_preview.is_none());
    }

    #[test]
    fn preview_covers_first_200_chars() {
        let a = format!("{}{}", "x".repeat(200), "tail-one");
        let b = format!("{}{}", "x".repeat(200), "tail-two");
        let (pa, pb) = (preview_hash(&a), preview_hash(&b));
        assert_eq!(pa[..21], pb[..21]);
        assert!(pa.ends_with("|len:208]"));
    }

    #[test]
    fn recent_stats_and_search() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        log.log_action(NewAction::new("email").target("alice@corp.io")).unwrap();
        log.log_action(NewAction::new("post").target("twitter").notes("launch 100%")).unwrap();
        log.log_action(NewAction::new("post").target("mastodon").success(false)).unwrap();

        let recent = log.recent(10, None);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].target.as_deref(), Some("mastodon"));
        assert_eq!(log.recent(10, Some("email")).len(), 1);

        let stats = log.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type[0], ("post".to_string(), 2));
        assert_eq!(stats.last_24h, 3);
        assert_eq!(stats.failures, 1);

        assert_eq!(log.search("corp.io", 10).len(), 1);
        assert_eq!(log.search("100%", 10).len(), 1);
        // A bare wildcard is literal, not "match everything"
        assert_eq!(log.search("%", 10).len(), 1);
        assert_eq!(log.search("_", 10).len(), 0);
    }

    #[test]
    fn chain_detects_tampering() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        for target in ["a", "b", "c"] {
            log.log_action(
                NewAction::new("file")
                    .target(target)
                    .metadata(serde_json::json!({"bytes": 12})),
            )
            .unwrap();
        }
        assert!(log.verify_chain().unwrap().is_empty());

        let first = &log.recent(3, None)[2];
        assert_eq!(first.prev_hash, GENESIS_HASH);

        let id_of = |target: &str| {
            log.recent(10, None)
                .into_iter()
                .find(|e| e.target.as_deref() == Some(target))
                .unwrap()
                .id
        };
        let (id_b, id_c) = (id_of("b"), id_of("c"));

        log.db.lock()
            .unwrap()
            .execute("UPDATE audit_log SET target = 'evil' WHERE target = 'b'", [])
            .unwrap();
        assert_eq!(log.verify_chain().unwrap(), vec![id_b]);

        // Deleting a row breaks the link of its successor
        log.db.lock()
            .unwrap()
            .execute("DELETE FROM audit_log WHERE target = 'evil'", [])
            .unwrap();
        assert_eq!(log.verify_chain().unwrap(), vec![id_c]);
    }

    #[test]
    fn reopen_continues_chain() {
        let tmp = tempfile::tempdir().unwrap();
        log_in(tmp.path()).log_action(NewAction::new("api")).unwrap();
        let log = log_in(tmp.path());
        log.log_action(NewAction::new("api")).unwrap();
        assert_eq!(log.stats().total, 2);
        assert!(log.verify_chain().unwrap().is_empty());
    }
}
