//! Secret rotation tracker.
//!
//! An inventory of credentials (names and locations only, never values)
//! with a rotation period per secret. Periods default by [`SecretType`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::db::Db;
use super::error::{GuardError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default warning window for [`SecretTracker::check_due`].
pub const DEFAULT_WARNING_DAYS: i64 = 14;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS secrets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        secret_type TEXT NOT NULL,
        service TEXT,
        location TEXT,
        created_date TEXT NOT NULL,
        last_rotated TEXT NOT NULL,
        rotation_days INTEGER NOT NULL,
        notes TEXT,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS rotation_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        secret_id INTEGER NOT NULL REFERENCES secrets(id),
        rotated_date TEXT NOT NULL,
        notes TEXT
    );
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    ApiKey,
    OauthToken,
    Password,
    SshKey,
    DatabaseUrl,
    WebhookSecret,
    EncryptionKey,
    Other,
}

impl SecretType {
    pub const ALL: [SecretType; 8] = [
        Self::ApiKey,
        Self::OauthToken,
        Self::Password,
        Self::SshKey,
        Self::DatabaseUrl,
        Self::WebhookSecret,
        Self::EncryptionKey,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::OauthToken => "oauth_token",
            Self::Password => "password",
            Self::SshKey => "ssh_key",
            Self::DatabaseUrl => "database_url",
            Self::WebhookSecret => "webhook_secret",
            Self::EncryptionKey => "encryption_key",
            Self::Other => "other",
        }
    }

    /// Default rotation period in days.
    pub fn rotation_days(self) -> u32 {
        match self {
            Self::OauthToken | Self::SshKey | Self::EncryptionKey => 365,
            Self::DatabaseUrl => 180,
            Self::ApiKey | Self::Password | Self::WebhookSecret | Self::Other => 90,
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretType {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                GuardError::configuration("secret type", s, &names)
            })
    }
}

/// A secret to start tracking.
#[derive(Debug, Clone)]
pub struct NewSecret {
    pub name: String,
    pub secret_type: SecretType,
    pub service: Option<String>,
    pub location: Option<String>,
    /// Defaults to today.
    pub created: Option<NaiveDate>,
    /// Defaults to the type's period.
    pub rotation_days: Option<u32>,
    pub notes: Option<String>,
}

impl NewSecret {
    pub fn new(name: impl Into<String>, secret_type: SecretType) -> Self {
        Self {
            name: name.into(),
            secret_type,
            service: None,
            location: None,
            created: None,
            rotation_days: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedSecret {
    pub id: i64,
    pub name: String,
    pub secret_type: String,
    pub service: Option<String>,
    pub location: Option<String>,
    pub created_date: String,
    pub last_rotated: String,
    pub rotation_days: u32,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl TrackedSecret {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            secret_type: row.get(2)?,
            service: row.get(3)?,
            location: row.get(4)?,
            created_date: row.get(5)?,
            last_rotated: row.get(6)?,
            rotation_days: row.get(7)?,
            notes: row.get(8)?,
            is_active: row.get::<_, i64>(9)? != 0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueItem {
    pub name: String,
    pub secret_type: String,
    pub service: Option<String>,
    pub last_rotated: String,
    pub due_date: String,
    /// Negative when overdue.
    pub days_until: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RotationStatus {
    pub overdue: Vec<DueItem>,
    pub upcoming: Vec<DueItem>,
    pub healthy: Vec<DueItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationRecord {
    pub rotated_date: String,
    pub notes: Option<String>,
}

const SECRET_COLUMNS: &str = "id, name, secret_type, service, location, created_date, \
                              last_rotated, rotation_days, notes, is_active";

#[derive(Clone)]
pub struct SecretTracker {
    db: Db,
}

impl SecretTracker {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            db: Db::open(db_path, SCHEMA)?,
        })
    }

    pub fn add_secret(&self, secret: NewSecret) -> Result<i64> {
        let created = secret
            .created
            .unwrap_or_else(today)
            .format(DATE_FORMAT)
            .to_string();
        let rotation_days = secret
            .rotation_days
            .unwrap_or_else(|| secret.secret_type.rotation_days());

        let conn = self.db.lock()?;
        let inserted = conn.execute(
            "INSERT INTO secrets (name, secret_type, service, location, created_date, \
             last_rotated, rotation_days, notes) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7)",
            params![
                secret.name,
                secret.secret_type.as_str(),
                secret.service,
                secret.location,
                created,
                rotation_days,
                secret.notes,
            ],
        );

        match inserted {
            Ok(_) => {
                info!(
                    "Tracking secret {} ({}), rotate every {} days",
                    secret.name, secret.secret_type, rotation_days
                );
                Ok(conn.last_insert_rowid())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(GuardError::AlreadyExists(format!("secret '{}'", secret.name)))
            }
            Err(e) => Err(self.db.err()(e)),
        }
    }

    /// Mark `name` rotated today.
    pub fn rotate_secret(&self, name: &str, notes: Option<&str>) -> Result<NaiveDate> {
        self.rotate_secret_on(name, today(), notes)
    }

    pub fn rotate_secret_on(
        &self,
        name: &str,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<NaiveDate> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let mut conn = self.db.lock()?;
        let tx = conn.transaction().map_err(self.db.err())?;

        let id: i64 = tx
            .query_row("SELECT id FROM secrets WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()
            .map_err(self.db.err())?
            .ok_or_else(|| GuardError::NotFound(format!("secret '{}'", name)))?;

        tx.execute(
            "UPDATE secrets SET last_rotated = ?1 WHERE id = ?2",
            params![date_str, id],
        )
        .map_err(self.db.err())?;
        tx.execute(
            "INSERT INTO rotation_history (secret_id, rotated_date, notes) VALUES (?1, ?2, ?3)",
            params![id, date_str, notes],
        )
        .map_err(self.db.err())?;
        tx.commit().map_err(self.db.err())?;

        info!("Rotated {} on {}", name, date_str);
        Ok(date)
    }

    /// Stop tracking `name` without deleting its history.
    pub fn deactivate_secret(&self, name: &str) -> Result<()> {
        let conn = self.db.lock()?;
        let changed = conn
            .execute("UPDATE secrets SET is_active = 0 WHERE name = ?1", params![name])
            .map_err(self.db.err())?;
        if changed == 0 {
            return Err(GuardError::NotFound(format!("secret '{}'", name)));
        }
        info!("Deactivated {}", name);
        Ok(())
    }

    pub fn check_due(&self, warning_days: i64) -> Result<RotationStatus> {
        self.check_due_on(today(), warning_days)
    }

    /// Bucket active secrets by days until their next rotation, as seen
    /// from `today`. Each bucket is sorted soonest first.
    pub fn check_due_on(&self, today: NaiveDate, warning_days: i64) -> Result<RotationStatus> {
        let mut status = RotationStatus::default();

        for secret in self.list(false)? {
            let Ok(last) = NaiveDate::parse_from_str(&secret.last_rotated, DATE_FORMAT) else {
                debug!("Skipping {}: unparseable date {}", secret.name, secret.last_rotated);
                continue;
            };
            let due = last + chrono::Duration::days(i64::from(secret.rotation_days));
            let days_until = (due - today).num_days();

            let item = DueItem {
                name: secret.name,
                secret_type: secret.secret_type,
                service: secret.service,
                last_rotated: secret.last_rotated,
                due_date: due.format(DATE_FORMAT).to_string(),
                days_until,
            };

            if days_until < 0 {
                status.overdue.push(item);
            } else if days_until <= warning_days {
                status.upcoming.push(item);
            } else {
                status.healthy.push(item);
            }
        }

        for bucket in [&mut status.overdue, &mut status.upcoming, &mut status.healthy] {
            bucket.sort_by_key(|i| i.days_until);
        }
        Ok(status)
    }

    pub fn list(&self, include_inactive: bool) -> Result<Vec<TrackedSecret>> {
        let conn = self.db.lock()?;
        let sql = if include_inactive {
            format!("SELECT {SECRET_COLUMNS} FROM secrets ORDER BY name")
        } else {
            format!("SELECT {SECRET_COLUMNS} FROM secrets WHERE is_active = 1 ORDER BY name")
        };
        let mut stmt = conn.prepare(&sql).map_err(self.db.err())?;
        let secrets = stmt
            .query_map([], TrackedSecret::from_row)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(self.db.err())?;
        Ok(secrets)
    }

    /// Rotation history for `name`, newest first.
    pub fn history(&self, name: &str) -> Result<Vec<RotationRecord>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT rh.rotated_date, rh.notes FROM rotation_history rh \
                 JOIN secrets s ON s.id = rh.secret_id \
                 WHERE s.name = ?1 ORDER BY rh.rotated_date DESC, rh.id DESC",
            )
            .map_err(self.db.err())?;
        let records = stmt
            .query_map(params![name], |row| {
                Ok(RotationRecord {
                    rotated_date: row.get(0)?,
                    notes: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(self.db.err())?;
        Ok(records)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
