// SQLite persistence layer for the draft action log and snapshots.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// What a logged action did to its player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Draft,
    Return,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Draft => "draft",
            ActionKind::Return => "return",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ActionKind::Draft),
            "return" => Some(ActionKind::Return),
            _ => None,
        }
    }
}

/// One persisted draft action. Return actions carry owner 0, amount 0 and
/// no position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seq: u32,
    pub kind: ActionKind,
    pub player_id: u32,
    pub owner_id: u32,
    pub amount_paid: u32,
    pub position: Option<String>,
}

/// Default database location: the platform data directory, or the working
/// directory when none can be determined.
pub fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "rotobid")
        .map(|dirs| dirs.data_dir().join("rotobid.db"))
        .unwrap_or_else(|| PathBuf::from("rotobid.db"))
}

/// SQLite-backed persistence for the draft action log and key-value draft
/// state (snapshots, current draft id).
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_actions (
                seq         INTEGER NOT NULL,
                draft_id    TEXT NOT NULL,
                kind        TEXT NOT NULL,
                player_id   INTEGER NOT NULL,
                owner_id    INTEGER NOT NULL,
                amount_paid INTEGER NOT NULL,
                position    TEXT,
                timestamp   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (seq, draft_id)
            );

            CREATE INDEX IF NOT EXISTS idx_draft_actions_draft_id ON draft_actions(draft_id);

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Append an action to the log. Re-recording the same `seq` within a
    /// draft is a no-op.
    pub fn record_action(&self, action: &ActionRecord, draft_id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO draft_actions
                (seq, draft_id, kind, player_id, owner_id, amount_paid, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                action.seq,
                draft_id,
                action.kind.as_str(),
                action.player_id,
                action.owner_id,
                action.amount_paid,
                action.position,
            ],
        )
        .context("failed to record draft action")?;
        Ok(())
    }

    /// Load the action log for a draft, ordered by sequence number.
    pub fn load_actions(&self, draft_id: &str) -> Result<Vec<ActionRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT seq, kind, player_id, owner_id, amount_paid, position
                 FROM draft_actions WHERE draft_id = ?1 ORDER BY seq",
            )
            .context("failed to prepare load_actions query")?;

        let rows = stmt
            .query_map(params![draft_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })
            .context("failed to query draft actions")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft action rows")?;

        let mut actions = Vec::with_capacity(rows.len());
        for (seq, kind, player_id, owner_id, amount_paid, position) in rows {
            let Some(kind) = ActionKind::parse(&kind) else {
                bail!("unknown action kind '{kind}' at seq {seq}");
            };
            actions.push(ActionRecord {
                seq,
                kind,
                player_id,
                owner_id,
                amount_paid,
                position,
            });
        }
        Ok(actions)
    }

    /// Number of actions logged for the given draft.
    pub fn action_count(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM draft_actions WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count draft actions")?;
        Ok(count as usize)
    }

    /// Next free sequence number for the given draft.
    pub fn next_seq(&self, draft_id: &str) -> Result<u32> {
        let conn = self.conn();
        let max: Option<u32> = conn
            .query_row(
                "SELECT MAX(seq) FROM draft_actions WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to read max action seq")?;
        Ok(max.map_or(1, |m| m + 1))
    }

    /// Returns `true` if at least one action has been logged for `draft_id`.
    pub fn has_draft_in_progress(&self, draft_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_actions WHERE draft_id = ?1)",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to check draft_actions existence")?;
        Ok(exists)
    }

    /// Persist an arbitrary JSON value under `key`, replacing any previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM draft_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query draft state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Delete the action log and all draft state in one transaction.
    pub fn clear_draft(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM draft_actions", [])
            .context("failed to delete draft actions")?;
        tx.execute("DELETE FROM draft_state", [])
            .context("failed to delete draft state")?;
        tx.commit().context("failed to commit clear_draft")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Draft ID management
    // ------------------------------------------------------------------

    const DRAFT_ID_KEY: &'static str = "current_draft_id";

    /// Retrieve the stored draft ID, if one has been set.
    pub fn get_draft_id(&self) -> Result<Option<String>> {
        let value = self.load_state(Self::DRAFT_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    pub fn set_draft_id(&self, draft_id: &str) -> Result<()> {
        self.save_state(
            Self::DRAFT_ID_KEY,
            &serde_json::Value::String(draft_id.to_string()),
        )
    }

    /// Return the stored draft ID, generating and storing a fresh one if needed.
    pub fn current_or_new_draft_id(&self) -> Result<String> {
        if let Some(id) = self.get_draft_id()? {
            return Ok(id);
        }
        let id = Self::generate_draft_id();
        self.set_draft_id(&id)?;
        Ok(id)
    }

    /// Generate a draft ID from the current UTC time.
    ///
    /// Format: `draft_YYYYMMDD_HHMMSS_SSS` (e.g. `draft_20260228_143022_123`).
    pub fn generate_draft_id() -> String {
        chrono::Utc::now()
            .format("draft_%Y%m%d_%H%M%S_%3f")
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
