//! Build cache: checker summaries keyed by the set of usernames.
//!
//! The key is the sorted, lowercased, pipe-joined list of usernames. Editing
//! a profile without adding or removing one keeps the key, so cached
//! summaries stay in use until they expire.
//!
//! Entries live in one `SQLite` file, addressed by the SHA-256 digest of
//! the key, with the summaries stored as zstd-compressed JSON.

use std::fs;
use std::path::Path;

use jiff::{SignedDuration, Timestamp};
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::model::{ProfileConfig, Summary};

use super::{Result, StorageError};

pub const DEFAULT_CACHE_HOURS: u32 = 3;

const CACHE_FILE: &str = "summaries.sqlite";
const ZSTD_LEVEL: i32 = 3;

/// The cache key of a set of profile configs.
pub fn cache_key(configs: &[ProfileConfig]) -> String {
    let mut usernames: Vec<String> = configs.iter().map(|c| c.username.to_lowercase()).collect();
    usernames.sort();
    usernames.join("|")
}

/// Expiring store of summary sets.
pub struct BuildCache {
    conn: Connection,
    ttl: SignedDuration,
}

impl BuildCache {
    /// Opens (or creates) the cache in `dir`. Entries expire `ttl_hours` after being set.
    pub fn open(dir: &Path, ttl_hours: u32) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(CACHE_FILE))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS summaries (
                digest     TEXT PRIMARY KEY,
                key        TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                payload    BLOB NOT NULL
            )",
        )?;
        Ok(Self {
            conn,
            ttl: SignedDuration::from_hours(i64::from(ttl_hours)),
        })
    }

    /// Cached summaries for `key`, unless missing or expired.
    pub fn get(&self, key: &str) -> Result<Option<Vec<Summary>>> {
        self.get_at(key, Timestamp::now())
    }

    /// Stores summaries under `key`, dropping expired entries on the way.
    pub fn set(&self, key: &str, summaries: &[Summary]) -> Result<()> {
        self.set_at(key, summaries, Timestamp::now())
    }

    fn get_at(&self, key: &str, now: Timestamp) -> Result<Option<Vec<Summary>>> {
        let row = self
            .conn
            .query_row(
                "SELECT key, expires_at, payload FROM summaries WHERE digest = ?1",
                [digest(key)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((stored_key, expires_at, payload)) = row else {
            return Ok(None);
        };
        if stored_key != key {
            return Err(StorageError::Corrupt(format!(
                "digest collision between {stored_key:?} and {key:?}"
            )));
        }
        if expires_at <= now.as_second() {
            return Ok(None);
        }
        let json = zstd::decode_all(payload.as_slice())?;
        Ok(Some(serde_json::from_slice(&json)?))
    }

    fn set_at(&self, key: &str, summaries: &[Summary], now: Timestamp) -> Result<()> {
        let json = serde_json::to_vec(summaries)?;
        let payload = zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?;
        let expires_at = now.as_second().saturating_add(self.ttl.as_secs());

        self.conn.execute(
            "DELETE FROM summaries WHERE expires_at <= ?1",
            [now.as_second()],
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO summaries (digest, key, expires_at, payload)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![digest(key), key, expires_at, payload],
        )?;
        Ok(())
    }
}

fn digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}
