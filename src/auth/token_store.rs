// Session token persistence backed by SQLite

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::storage::open_database;

/// Key under which the bearer token is kept in `session_kv`
const TOKEN_KEY: &str = "token";

const BEARER_PREFIX: &str = "Bearer ";

/// Normalize a token so it carries exactly one `Bearer ` prefix.
/// Returns None for empty input (including a bare prefix).
pub fn normalize_bearer(token: &str) -> Option<String> {
    let mut raw = token.trim_start();
    while let Some(rest) = strip_bearer_prefix(raw) {
        raw = rest.trim_start();
    }

    let raw = raw.trim_end();
    if raw.is_empty() {
        return None;
    }

    Some(format!("{}{}", BEARER_PREFIX, raw))
}

/// Strip one case-insensitive `Bearer ` prefix, if present
fn strip_bearer_prefix(s: &str) -> Option<&str> {
    let head = s.get(..BEARER_PREFIX.len())?;
    if head.eq_ignore_ascii_case(BEARER_PREFIX) {
        s.get(BEARER_PREFIX.len()..)
    } else {
        None
    }
}

/// Holder of the single active bearer credential.
///
/// Cloning yields another handle to the same storage, so a token written
/// through one handle is immediately visible through every other.
#[derive(Clone)]
pub struct TokenStore {
    conn: Arc<Mutex<Connection>>,
}

impl TokenStore {
    /// Open (or create) a persisted session store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(open_database(path)?)
    }

    /// Store that lives only as long as the process; every call yields an independent instance
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory session store")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to initialize session table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))
    }

    /// Replace the stored credential. `None` or an empty token clears it.
    pub fn set(&self, token: Option<&str>) -> Result<()> {
        let normalized = token.and_then(normalize_bearer);
        let conn = self.lock()?;

        match normalized {
            Some(value) => {
                conn.execute(
                    "INSERT INTO session_kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    [TOKEN_KEY, value.as_str()],
                )
                .context("Failed to persist session token")?;
                tracing::debug!("Session token stored");
            }
            None => {
                conn.execute("DELETE FROM session_kv WHERE key = ?1", [TOKEN_KEY])
                    .context("Failed to clear session token")?;
                tracing::debug!("Session token cleared");
            }
        }

        Ok(())
    }

    /// Current credential with exactly one `Bearer ` prefix, or None
    pub fn get(&self) -> Result<Option<String>> {
        let conn = self.lock()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM session_kv WHERE key = ?1",
                [TOKEN_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read session token")?;

        // Values written by older clients may lack the prefix
        Ok(stored.as_deref().and_then(normalize_bearer))
    }

    pub fn clear(&self) -> Result<()> {
        self.set(None)
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get()?.is_some())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
