//! SQLite-backed player record store.
//!
//! One `players` row per player id, replaced wholesale on every update and read back only for
//! the leaderboard. The schema only ever grows: optional columns are added on startup and an
//! "already exists" failure is ignored, so older databases keep working.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::{LeaderboardEntry, PlayerRecord};
use crate::error::StoreError;

/// Columns present since the first release.
const BASE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id TEXT PRIMARY KEY,
    name TEXT,
    state TEXT,
    wallet REAL,
    savings REAL,
    net REAL,
    rep REAL,
    updated TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_players_net ON players(net DESC);
"#;

/// A column added after the first release.
#[derive(Debug, Clone, Copy)]
pub struct OptionalColumn {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub default: Option<&'static str>,
}

impl OptionalColumn {
    const fn new(name: &'static str, sql_type: &'static str, default: Option<&'static str>) -> Self {
        Self {
            name,
            sql_type,
            default,
        }
    }

    fn add_column_sql(&self) -> String {
        match self.default {
            Some(default) => format!(
                "ALTER TABLE players ADD COLUMN {} {} DEFAULT {}",
                self.name, self.sql_type, default
            ),
            None => format!("ALTER TABLE players ADD COLUMN {} {}", self.name, self.sql_type),
        }
    }
}

/// Applied in order on every startup.
pub const OPTIONAL_COLUMNS: [OptionalColumn; 8] = [
    OptionalColumn::new("goal", "TEXT", None),
    OptionalColumn::new("day", "INTEGER", Some("1")),
    OptionalColumn::new("lifestyle", "REAL", Some("0")),
    OptionalColumn::new("happiness", "REAL", Some("50")),
    OptionalColumn::new("high_net", "REAL", Some("0")),
    OptionalColumn::new("taxes_paid", "REAL", Some("0")),
    OptionalColumn::new("charity_given", "REAL", Some("0")),
    OptionalColumn::new("last_state", "TEXT", None),
];

const UPSERT_SQL: &str = r#"
INSERT INTO players (
    id, name, state, wallet, savings, net, rep, updated,
    goal, day, lifestyle, happiness, high_net, taxes_paid, charity_given, last_state
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    state = excluded.state,
    wallet = excluded.wallet,
    savings = excluded.savings,
    net = excluded.net,
    rep = excluded.rep,
    updated = excluded.updated,
    goal = excluded.goal,
    day = excluded.day,
    lifestyle = excluded.lifestyle,
    happiness = excluded.happiness,
    high_net = excluded.high_net,
    taxes_paid = excluded.taxes_paid,
    charity_given = excluded.charity_given,
    last_state = excluded.last_state
"#;

const SELECT_COLUMNS: &str = "id, name, state, wallet, savings, net, rep, updated, \
     goal, day, lifestyle, happiness, high_net, taxes_paid, charity_given, last_state";

pub struct PlayerStore {
    conn: Mutex<Connection>,
}

impl PlayerStore {
    /// Open or create the player database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!("Opening player database at {:?}", path);

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory player database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Adopt an existing connection, migrating its schema first.
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Runs `op` on tokio's blocking pool, off the async worker threads.
    pub async fn blocking<T, F>(self: &Arc<Self>, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&PlayerStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&store)).await?
    }

    /// Insert or fully replace the row for `record.id`. Returns the id written.
    pub fn upsert(&self, record: &PlayerRecord) -> Result<String, StoreError> {
        let updated = Utc::now();
        let conn = self.lock()?;

        conn.execute(
            UPSERT_SQL,
            params![
                record.id,
                record.name,
                record.jurisdiction,
                record.wallet,
                record.savings,
                record.net,
                record.reputation,
                updated,
                record.goal,
                record.day,
                record.lifestyle_score,
                record.happiness,
                record.high_net,
                record.taxes_paid,
                record.charity_given,
                record.last_state,
            ],
        )?;

        debug!("Upserted player {} (net {:.2})", record.id, record.net);
        Ok(record.id.clone())
    }

    /// Up to `limit` players, richest first.
    pub fn top_n(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM players ORDER BY net DESC LIMIT ?1"
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit], read_player)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(player, updated)| LeaderboardEntry::new(player, updated))
            .collect())
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Result<Option<(PlayerRecord, Option<DateTime<Utc>>)>, StoreError> {
        use rusqlite::OptionalExtension;

        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM players WHERE id = ?1"),
                [id],
                read_player,
            )
            .optional()?;
        Ok(row)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Creates the base table and ensures every optional column exists.
fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(BASE_SCHEMA)?;

    let mut added = 0;
    for column in OPTIONAL_COLUMNS {
        match conn.execute(&column.add_column_sql(), []) {
            Ok(_) => {
                added += 1;
                debug!("Added column players.{}", column.name);
            }
            Err(e) if is_duplicate_column(&e) => {}
            Err(e) => return Err(e.into()),
        }
    }

    conn.execute_batch(INDEXES_SCHEMA)?;

    if added > 0 {
        info!("Player schema migrated ({} columns added)", added);
    } else {
        debug!("Player schema is up to date");
    }
    Ok(())
}

fn is_duplicate_column(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.contains("duplicate column name"),
        _ => false,
    }
}

// NULLs in rows written by older schemas fall back to the column defaults
fn read_player(row: &Row<'_>) -> rusqlite::Result<(PlayerRecord, Option<DateTime<Utc>>)> {
    let real = |name: &str, default: f64| -> rusqlite::Result<f64> {
        Ok(row.get::<_, Option<f64>>(name)?.unwrap_or(default))
    };

    let wallet = real("wallet", 0.0)?;
    let savings = real("savings", 0.0)?;
    let net = real("net", 0.0)?;

    let player = PlayerRecord {
        id: row.get("id")?,
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        jurisdiction: row.get::<_, Option<String>>("state")?.unwrap_or_default(),
        wallet,
        savings,
        net,
        reputation: real("rep", 0.0)?,
        goal: row.get::<_, Option<String>>("goal")?.filter(|g| !g.is_empty()),
        day: row.get::<_, Option<i64>>("day")?.unwrap_or(1),
        lifestyle_score: real("lifestyle", 0.0)?,
        happiness: real("happiness", 50.0)?,
        high_net: real("high_net", 0.0)?,
        taxes_paid: real("taxes_paid", 0.0)?,
        charity_given: real("charity_given", 0.0)?,
        last_state: row.get("last_state")?,
    };

    let updated = row.get::<_, Option<DateTime<Utc>>>("updated").ok().flatten();
    Ok((player, updated))
}
