use std::path::Path;
use std::time::Duration;

use contracts::{ChangeLogEntry, Facility};
use rusqlite::{params, Connection, OptionalExtension};
use sim_core::OccupancyChange;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("facility {0} not found")]
    FacilityNotFound(i64),
}

/// One active row as read at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilitySnapshot {
    pub id: i64,
    pub total_capacity: i64,
    pub occupied: i64,
}

/// Result of writing one facility's tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Updated,
    /// The row was deactivated between the snapshot and the write.
    SkippedInactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetSummary {
    pub facilities_zeroed: usize,
    pub log_entries_deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFacility {
    pub hospital_code: Option<String>,
    pub name: String,
    pub total_capacity: i64,
    pub occupied: i64,
    pub status: String,
}

impl NewFacility {
    pub fn new(name: impl Into<String>, total_capacity: i64) -> Self {
        Self {
            hospital_code: None,
            name: name.into(),
            total_capacity,
            occupied: 0,
            status: "OPEN".to_string(),
        }
    }
}

/// Shared carpark database. Table and column names are those the carpark query
/// and admin services read, so all three can point at the same file.
#[derive(Debug)]
pub struct SqliteFacilityStore {
    conn: Connection,
}

impl SqliteFacilityStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    /// Active rows only. The statement is finalized before returning so no
    /// read cursor is held across the writes that follow.
    pub fn load_active_snapshot(&self) -> Result<Vec<FacilitySnapshot>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT carpark_id, total_spaces, IFNULL(occupied_spaces, 0)
             FROM carpark
             WHERE is_active = 1
             ORDER BY carpark_id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FacilitySnapshot {
                id: row.get(0)?,
                total_capacity: row.get(1)?,
                occupied: row.get(2)?,
            })
        })?;

        let mut snapshot = Vec::new();
        for row in rows {
            snapshot.push(row?);
        }

        Ok(snapshot)
    }

    /// Persists a tick result and its log entry as one unit of work.
    ///
    /// The update is guarded by `is_active = 1`; if the row was archived after
    /// the snapshot was taken nothing is written and no log entry is appended.
    pub fn record_tick_change(
        &mut self,
        facility_id: i64,
        change: OccupancyChange,
        stamp: &str,
    ) -> Result<RowOutcome, PersistenceError> {
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE carpark
             SET occupied_spaces = ?1,
                 last_updated = ?2
             WHERE carpark_id = ?3
               AND is_active = 1",
            params![change.next, stamp, facility_id],
        )?;

        if updated == 0 {
            tx.rollback()?;
            return Ok(RowOutcome::SkippedInactive);
        }

        tx.execute(
            "INSERT INTO carpark_log (carpark_id, action, detail, admin_id, created_at)
             VALUES (?1, ?2, ?3, NULL, ?4)",
            params![facility_id, change.action().as_str(), change.detail(), stamp],
        )?;

        tx.commit()?;
        Ok(RowOutcome::Updated)
    }

    /// Zeroes every active facility and clears the change log.
    pub fn reset_all(&mut self, stamp: &str) -> Result<ResetSummary, PersistenceError> {
        let tx = self.conn.transaction()?;

        let facilities_zeroed = tx.execute(
            "UPDATE carpark
             SET occupied_spaces = 0,
                 last_updated = ?1
             WHERE is_active = 1",
            params![stamp],
        )?;
        let log_entries_deleted = tx.execute("DELETE FROM carpark_log", [])?;

        tx.commit()?;
        Ok(ResetSummary {
            facilities_zeroed,
            log_entries_deleted,
        })
    }

    pub fn insert_facility(
        &mut self,
        facility: &NewFacility,
        stamp: &str,
    ) -> Result<i64, PersistenceError> {
        self.conn.execute(
            "INSERT INTO carpark (
                heorg_id,
                carpark_name,
                total_spaces,
                occupied_spaces,
                status,
                is_active,
                last_updated
             ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                facility.hospital_code.as_deref(),
                facility.name.as_str(),
                facility.total_capacity,
                facility.occupied.clamp(0, facility.total_capacity.max(0)),
                facility.status.as_str(),
                stamp,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Flips the active flag, guarded on the current value so an archived row
    /// is never touched by a second archive.
    pub fn set_active(
        &mut self,
        facility_id: i64,
        active: bool,
        stamp: &str,
    ) -> Result<bool, PersistenceError> {
        let changed = self.conn.execute(
            "UPDATE carpark
             SET is_active = ?1,
                 last_updated = ?2
             WHERE carpark_id = ?3
               AND is_active = ?4",
            params![i64::from(active), stamp, facility_id, i64::from(!active)],
        )?;

        if changed == 0 && self.facility(facility_id)?.is_none() {
            return Err(PersistenceError::FacilityNotFound(facility_id));
        }

        Ok(changed == 1)
    }

    pub fn facility(&self, facility_id: i64) -> Result<Option<Facility>, PersistenceError> {
        let facility = self
            .conn
            .query_row(
                &format!("{FACILITY_SELECT} WHERE carpark_id = ?1"),
                params![facility_id],
                facility_from_row,
            )
            .optional()?;

        Ok(facility)
    }

    pub fn list_active_facilities(&self) -> Result<Vec<Facility>, PersistenceError> {
        let mut stmt = self.conn.prepare(&format!(
            "{FACILITY_SELECT} WHERE is_active = 1 ORDER BY carpark_name ASC, carpark_id ASC"
        ))?;

        let rows = stmt.query_map([], facility_from_row)?;

        let mut facilities = Vec::new();
        for row in rows {
            facilities.push(row?);
        }

        Ok(facilities)
    }

    /// Most recent entries first.
    pub fn recent_log(&self, limit: usize) -> Result<Vec<ChangeLogEntry>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT log_id, carpark_id, action, IFNULL(detail, ''), IFNULL(created_at, '')
             FROM carpark_log
             ORDER BY log_id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(
            params![i64::try_from(limit).unwrap_or(i64::MAX)],
            |row| {
                Ok(ChangeLogEntry {
                    log_id: row.get(0)?,
                    facility_id: row.get(1)?,
                    action: row.get(2)?,
                    detail: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }

    pub fn log_count(&self) -> Result<usize, PersistenceError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM carpark_log", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS carpark (
                carpark_id INTEGER PRIMARY KEY,
                heorg_id TEXT,
                carpark_name TEXT NOT NULL,
                total_spaces INTEGER NOT NULL,
                occupied_spaces INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'OPEN',
                is_active INTEGER NOT NULL DEFAULT 1,
                last_updated TEXT
            );

            CREATE TABLE IF NOT EXISTS carpark_log (
                log_id INTEGER PRIMARY KEY AUTOINCREMENT,
                carpark_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                detail TEXT,
                admin_id INTEGER,
                created_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_carpark_active ON carpark(is_active);
            CREATE INDEX IF NOT EXISTS idx_carpark_log_carpark ON carpark_log(carpark_id);
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'carpark_v1', datetime('now'))",
            [],
        )?;

        Ok(())
    }
}

const FACILITY_SELECT: &str = "SELECT
        carpark_id,
        heorg_id,
        carpark_name,
        total_spaces,
        IFNULL(occupied_spaces, 0),
        IFNULL(status, 'UNKNOWN'),
        is_active,
        last_updated
     FROM carpark";

fn facility_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Facility> {
    let total_capacity: i64 = row.get(3)?;
    let occupied: i64 = row.get(4)?;
    Ok(Facility {
        id: row.get(0)?,
        hospital_code: row.get(1)?,
        name: row.get(2)?,
        total_capacity,
        occupied,
        free: (total_capacity - occupied).max(0),
        status: row.get(5)?,
        active: row.get::<_, i64>(6)? != 0,
        last_updated: row.get(7)?,
    })
}
