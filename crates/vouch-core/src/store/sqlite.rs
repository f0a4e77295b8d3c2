//! SQLite-backed store.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::TransferStore;
use crate::error::StoreError;
use crate::models::transfer::{Extras, TransferRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transfers (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    bank TEXT NOT NULL,
    operation_number TEXT,
    beneficiary TEXT NOT NULL,
    destination_account_suffix TEXT NOT NULL,
    amount TEXT NOT NULL,
    extras TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    exported_at TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_transfers_bank_operation
    ON transfers (bank, operation_number);

CREATE INDEX IF NOT EXISTS idx_transfers_fallback
    ON transfers (date, amount, destination_account_suffix);
";

const COLUMNS: &str = "id, date, time, bank, operation_number, beneficiary, destination_account_suffix, \
                       amount, extras, created_at, updated_at, exported_at";

/// Transfer store persisted in a SQLite database file.
///
/// `(bank, operation_number)` uniqueness is enforced by a unique index;
/// SQLite treats NULLs as distinct, so records without an operation number
/// can coexist.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (and create if needed) a database file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!("Opened transfer database at {}", path.display());
        Self::init(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<TransferRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawRow::read)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

impl TransferStore for SqliteStore {
    fn get_by_id(&self, id: Uuid) -> Result<Option<TransferRecord>, StoreError> {
        let sql = format!("SELECT {} FROM transfers WHERE id = ?1", COLUMNS);
        self.conn
            .query_row(&sql, params![id.to_string()], RawRow::read)
            .optional()?
            .map(RawRow::into_record)
            .transpose()
    }

    fn find_by_bank_and_operation(
        &self,
        bank: &str,
        operation_number: &str,
    ) -> Result<Option<TransferRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM transfers WHERE bank = ?1 AND operation_number = ?2 LIMIT 1",
            COLUMNS
        );
        self.conn
            .query_row(&sql, params![bank, operation_number], RawRow::read)
            .optional()?
            .map(RawRow::into_record)
            .transpose()
    }

    fn find_possible_duplicates(
        &self,
        date: &str,
        amount: &str,
        destination_account_suffix: &str,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM transfers WHERE date = ?1 AND amount = ?2 AND destination_account_suffix = ?3 \
             ORDER BY time DESC",
            COLUMNS
        );
        self.query(&sql, params![date, amount, destination_account_suffix])
    }

    fn upsert(&mut self, record: &TransferRecord) -> Result<(), StoreError> {
        let extras = record.extras.as_ref().map(serde_json::to_string).transpose()?;

        let result = self.conn.execute(
            "INSERT INTO transfers (id, date, time, bank, operation_number, beneficiary, \
                 destination_account_suffix, amount, extras, created_at, updated_at, exported_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
             ON CONFLICT(id) DO UPDATE SET \
                 date = excluded.date, time = excluded.time, bank = excluded.bank, \
                 operation_number = excluded.operation_number, beneficiary = excluded.beneficiary, \
                 destination_account_suffix = excluded.destination_account_suffix, \
                 amount = excluded.amount, extras = excluded.extras, \
                 created_at = excluded.created_at, updated_at = excluded.updated_at, \
                 exported_at = excluded.exported_at",
            params![
                record.id.to_string(),
                record.date,
                record.time,
                record.bank,
                record.operation_number,
                record.beneficiary,
                record.destination_account_suffix,
                record.amount,
                extras,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
                record.exported_at.map(|t| t.to_rfc3339()),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::UniqueViolation {
                    bank: record.bank.clone(),
                    operation_number: record.operation_number.clone().unwrap_or_default(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.conn.execute("DELETE FROM transfers WHERE id = ?1", params![id.to_string()])?;
        Ok(removed > 0)
    }

    fn list_all(&self) -> Result<Vec<TransferRecord>, StoreError> {
        let sql = format!("SELECT {} FROM transfers ORDER BY date DESC, time DESC", COLUMNS);
        self.query(&sql, params![])
    }
}

/// Row as stored, before decoding text columns.
struct RawRow {
    id: String,
    date: String,
    time: String,
    bank: String,
    operation_number: Option<String>,
    beneficiary: String,
    destination_account_suffix: String,
    amount: String,
    extras: Option<String>,
    created_at: String,
    updated_at: String,
    exported_at: Option<String>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            time: row.get(2)?,
            bank: row.get(3)?,
            operation_number: row.get(4)?,
            beneficiary: row.get(5)?,
            destination_account_suffix: row.get(6)?,
            amount: row.get(7)?,
            extras: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            exported_at: row.get(11)?,
        })
    }

    fn into_record(self) -> Result<TransferRecord, StoreError> {
        let id = Uuid::parse_str(&self.id).map_err(|_| StoreError::Corrupt {
            column: "id",
            value: self.id.clone(),
        })?;
        let extras: Option<Extras> = self.extras.as_deref().map(serde_json::from_str).transpose()?;

        Ok(TransferRecord {
            id,
            date: self.date,
            time: self.time,
            bank: self.bank,
            operation_number: self.operation_number,
            beneficiary: self.beneficiary,
            destination_account_suffix: self.destination_account_suffix,
            amount: self.amount,
            extras,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
            exported_at: self
                .exported_at
                .as_deref()
                .map(|t| parse_timestamp("exported_at", t))
                .transpose()?,
        })
    }
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt {
            column,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn record(op: Option<&str>, time: &str) -> TransferRecord {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let mut extras = Extras::new();
        extras.insert("origin_account_suffix".to_string(), Value::from("0035"));

        TransferRecord {
            id: Uuid::new_v4(),
            date: "2024-03-05".to_string(),
            time: time.to_string(),
            bank: "INTERBANK".to_string(),
            operation_number: op.map(str::to_string),
            beneficiary: "Rosa Diaz".to_string(),
            destination_account_suffix: "1188".to_string(),
            amount: "PEN 1250.50".to_string(),
            extras: Some(extras),
            created_at: created,
            updated_at: created,
            exported_at: None,
        }
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transfers.db");

        let original = record(Some("4455667"), "09:05");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.upsert(&original).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_by_id(original.id).unwrap(), Some(original.clone()));
        assert_eq!(
            store.find_by_bank_and_operation("INTERBANK", "4455667").unwrap().map(|r| r.id),
            Some(original.id)
        );
        assert!(store.find_by_bank_and_operation("BCP", "4455667").unwrap().is_none());
    }

    #[test]
    fn test_unique_index() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&record(Some("4455667"), "09:05")).unwrap();

        let err = store.upsert(&record(Some("4455667"), "10:00")).unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));

        store.upsert(&record(None, "09:05")).unwrap();
        store.upsert(&record(None, "09:05")).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 3);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut r = record(Some("4455667"), "09:05");
        store.upsert(&r).unwrap();

        r.beneficiary = "Ana Lopez".to_string();
        r.exported_at = Some(Utc::now());
        store.upsert(&r).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].beneficiary, "Ana Lopez");
        assert!(all[0].exported_at.is_some());
    }

    #[test]
    fn test_duplicates_ordered_by_time() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let early = record(None, "08:00");
        let late = record(None, "18:00");
        store.upsert(&early).unwrap();
        store.upsert(&late).unwrap();

        let dups = store.find_possible_duplicates("2024-03-05", "PEN 1250.50", "1188").unwrap();
        let ids: Vec<Uuid> = dups.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);

        assert!(store.find_possible_duplicates("2024-03-05", "PEN 1250.50", "0000").unwrap().is_empty());
    }

    #[test]
    fn test_search_and_delete() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let r = record(Some("4455667"), "09:05");
        store.upsert(&r).unwrap();

        assert_eq!(store.search("ROSA").unwrap().len(), 1);
        assert_eq!(store.search("1250").unwrap().len(), 1);
        assert!(store.search("bbva").unwrap().is_empty());

        assert!(store.delete(r.id).unwrap());
        assert!(!store.delete(r.id).unwrap());
        assert!(store.get_by_id(r.id).unwrap().is_none());
    }
}
