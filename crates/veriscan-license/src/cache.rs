// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local license verdict cache backed by SQLite.
//
// Schema:
//   license_verdicts(
//     key_fingerprint TEXT    PRIMARY KEY,  -- SHA-256 hex of the license key
//     validated       INTEGER NOT NULL,     -- 0 = rejected, 1 = validated
//     reason          TEXT,                 -- rejection reason, if any
//     checked_at      TEXT    NOT NULL      -- RFC 3339
//   )
//
// The cache lets activation short-circuit the network round trip when a
// fresh verdict for the same key already exists on device.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, instrument, warn};

use veriscan_core::LicenseVerdict;
use veriscan_core::error::VeriscanError;

use crate::fingerprint::fingerprint_key;

/// Convert a `rusqlite::Error` into a `VeriscanError::Database`.
fn db_err(e: rusqlite::Error) -> VeriscanError {
    VeriscanError::Database(e.to_string())
}

/// Persistent verdict cache keyed by license-key fingerprint.
pub struct VerdictCache {
    conn: Connection,
}

impl VerdictCache {
    /// Open (or create) the verdict cache at `path`.
    ///
    /// WAL mode is enabled for better concurrent-read behaviour on mobile
    /// devices; the table is created if it does not already exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VeriscanError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        Self::create_table(&conn)?;
        debug!("verdict cache opened");
        Ok(Self { conn })
    }

    /// Open an in-memory verdict cache (useful for tests and as a fallback
    /// when no on-disk location is configured).
    pub fn open_in_memory() -> Result<Self, VeriscanError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::create_table(&conn)?;
        debug!("in-memory verdict cache opened");
        Ok(Self { conn })
    }

    fn create_table(conn: &Connection) -> Result<(), VeriscanError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS license_verdicts (
                key_fingerprint TEXT    PRIMARY KEY,
                validated       INTEGER NOT NULL,
                reason          TEXT,
                checked_at      TEXT    NOT NULL
            );",
        )
        .map_err(db_err)
    }

    /// Record the verdict for `key`, replacing any previous entry.
    pub fn store(&self, key: &str, verdict: &LicenseVerdict) -> Result<(), VeriscanError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO license_verdicts
                 (key_fingerprint, validated, reason, checked_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    fingerprint_key(key),
                    verdict.validated as i64,
                    verdict.reason,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(db_err)?;
        debug!(validated = verdict.validated, "verdict cached");
        Ok(())
    }

    /// Look up a verdict for `key` no older than `max_age`.
    ///
    /// Stale entries are treated as absent (and left in place — a fresh
    /// verdict overwrites them on the next store).
    pub fn lookup(
        &self,
        key: &str,
        max_age: Duration,
    ) -> Result<Option<LicenseVerdict>, VeriscanError> {
        let row: Option<(i64, Option<String>, String)> = self
            .conn
            .query_row(
                "SELECT validated, reason, checked_at FROM license_verdicts
                 WHERE key_fingerprint = ?1",
                params![fingerprint_key(key)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(db_err)?;

        let Some((validated, reason, checked_at)) = row else {
            return Ok(None);
        };

        let checked_at = match DateTime::parse_from_rfc3339(&checked_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!("unreadable checked_at in verdict cache: {e}");
                return Ok(None);
            }
        };
        if Utc::now() - checked_at > max_age {
            debug!("cached verdict is stale");
            return Ok(None);
        }

        Ok(Some(LicenseVerdict {
            validated: validated != 0,
            reason,
        }))
    }

    /// Drop any cached verdict for `key`.
    pub fn forget(&self, key: &str) -> Result<(), VeriscanError> {
        self.conn
            .execute(
                "DELETE FROM license_verdicts WHERE key_fingerprint = ?1",
                params![fingerprint_key(key)],
            )
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_returns_none() {
        let cache = VerdictCache::open_in_memory().unwrap();
        assert_eq!(cache.lookup("ABSENT", Duration::hours(24)).unwrap(), None);
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let cache = VerdictCache::open_in_memory().unwrap();
        cache.store("KEY-1", &LicenseVerdict::valid()).unwrap();

        let verdict = cache.lookup("KEY-1", Duration::hours(24)).unwrap().unwrap();
        assert!(verdict.validated);
        assert_eq!(verdict.reason, None);
    }

    #[test]
    fn rejection_reason_survives() {
        let cache = VerdictCache::open_in_memory().unwrap();
        cache
            .store("KEY-2", &LicenseVerdict::rejected("expired"))
            .unwrap();

        let verdict = cache.lookup("KEY-2", Duration::hours(24)).unwrap().unwrap();
        assert!(!verdict.validated);
        assert_eq!(verdict.reason.as_deref(), Some("expired"));
    }

    #[test]
    fn stale_entries_are_ignored() {
        let cache = VerdictCache::open_in_memory().unwrap();
        cache.store("KEY-3", &LicenseVerdict::valid()).unwrap();

        // A zero-width freshness window makes any stored entry stale.
        assert_eq!(cache.lookup("KEY-3", Duration::zero()).unwrap(), None);
    }

    #[test]
    fn replace_overwrites_previous_verdict() {
        let cache = VerdictCache::open_in_memory().unwrap();
        cache.store("KEY-4", &LicenseVerdict::valid()).unwrap();
        cache
            .store("KEY-4", &LicenseVerdict::rejected("revoked"))
            .unwrap();

        let verdict = cache.lookup("KEY-4", Duration::hours(24)).unwrap().unwrap();
        assert!(!verdict.validated);
    }

    #[test]
    fn forget_removes_entry() {
        let cache = VerdictCache::open_in_memory().unwrap();
        cache.store("KEY-5", &LicenseVerdict::valid()).unwrap();
        cache.forget("KEY-5").unwrap();
        assert_eq!(cache.lookup("KEY-5", Duration::hours(24)).unwrap(), None);
    }

    #[test]
    fn on_disk_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.db");

        {
            let cache = VerdictCache::open(&path).unwrap();
            cache.store("KEY-6", &LicenseVerdict::valid()).unwrap();
        }

        let cache = VerdictCache::open(&path).unwrap();
        let verdict = cache.lookup("KEY-6", Duration::hours(24)).unwrap().unwrap();
        assert!(verdict.validated);
    }
}
