//! SQLite persistence for purses.
//!
//! RULE: Only store.rs talks to the database.
//! The purse calls the PersistenceAdapter methods — it never executes SQL.

use rusqlite::{params, Connection, OptionalExtension};
use crate::{
    adapter::{PersistenceAdapter, PurseSnapshot},
    error::{PurseError, PurseResult},
    level::Level,
    types::{Amount, PurseId},
};

/// One row of `purse_save_log`.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveLogEntry {
    pub id:       i64,
    pub purse_id: PurseId,
    pub snapshot: PurseSnapshot,
    pub saved_at: String,
}

pub struct SqliteAdapter {
    conn:     Connection,
    purse_id: PurseId,
}

impl SqliteAdapter {
    /// Open (or create) the database at `path`, bound to one purse id.
    pub fn open(path: &str, purse_id: impl Into<PurseId>) -> PurseResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn, purse_id: purse_id.into() })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory(purse_id: impl Into<PurseId>) -> PurseResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, purse_id: purse_id.into() })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PurseResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_purse.sql"))?;
        Ok(())
    }

    pub fn purse_id(&self) -> &str {
        &self.purse_id
    }

    /// The stored snapshot, or `None` if this purse was never saved.
    pub fn stored_snapshot(&self) -> PurseResult<Option<PurseSnapshot>> {
        let row = self.conn.query_row(
            "SELECT amount, level FROM purse WHERE purse_id = ?1",
            params![self.purse_id],
            |row| Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?)),
        ).optional()?;

        match row {
            Some((amount, ordinal)) => Ok(Some(PurseSnapshot::new(amount, level_from_row(ordinal)?))),
            None => Ok(None),
        }
    }

    /// Every save recorded for this purse, oldest first.
    pub fn save_history(&self) -> PurseResult<Vec<SaveLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, purse_id, amount, level, saved_at
             FROM purse_save_log WHERE purse_id = ?1
             ORDER BY id ASC"
        )?;
        let rows = stmt.query_map(params![self.purse_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?.collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, purse_id, amount, ordinal, saved_at)| {
                Ok(SaveLogEntry {
                    id,
                    purse_id,
                    snapshot: PurseSnapshot::new(amount, level_from_row(ordinal)?),
                    saved_at,
                })
            })
            .collect()
    }
}

impl PersistenceAdapter for SqliteAdapter {
    fn save(&mut self, amount: Amount, level: Level) -> PurseResult<()> {
        if !amount.is_finite() {
            return Err(PurseError::InvalidAmount { value: amount });
        }
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO purse (purse_id, amount, level, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(purse_id) DO UPDATE SET
                amount = excluded.amount,
                level = excluded.level,
                updated_at = excluded.updated_at",
            params![self.purse_id, amount, level.ordinal(), now],
        )?;
        tx.execute(
            "INSERT INTO purse_save_log (purse_id, amount, level, saved_at) VALUES (?1, ?2, ?3, ?4)",
            params![self.purse_id, amount, level.ordinal(), now],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_amount(&mut self) -> PurseResult<Amount> {
        Ok(self.stored_snapshot()?.map(|s| s.amount).unwrap_or(0.0))
    }

    fn load_level(&mut self) -> PurseResult<Level> {
        Ok(self.stored_snapshot()?.map(|s| s.level).unwrap_or_default())
    }
}

fn level_from_row(ordinal: i64) -> PurseResult<Level> {
    Level::from_ordinal(ordinal).ok_or(PurseError::InvalidLevel(ordinal))
}
