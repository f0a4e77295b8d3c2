//! Persistence collaborators for transfer records.
//!
//! The ledger only talks to storage through [`TransferStore`], so it makes
//! no assumption about the backing technology. Two stores ship with the
//! crate: an in-process [`MemoryStore`] and, behind the `sqlite` feature,
//! a [`SqliteStore`].

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use std::cmp::Ordering;

use uuid::Uuid;

use crate::error::StoreError;
use crate::models::transfer::TransferRecord;

/// Storage operations the ledger depends on.
///
/// Implementations must enforce that `(bank, operation_number)` is unique
/// among records with an operation number.
pub trait TransferStore {
    fn get_by_id(&self, id: Uuid) -> Result<Option<TransferRecord>, StoreError>;

    /// The record holding this `(bank, operation_number)` pair, if any.
    fn find_by_bank_and_operation(
        &self,
        bank: &str,
        operation_number: &str,
    ) -> Result<Option<TransferRecord>, StoreError>;

    /// Records sharing date, amount string and destination suffix, most
    /// recent time first.
    fn find_possible_duplicates(
        &self,
        date: &str,
        amount: &str,
        destination_account_suffix: &str,
    ) -> Result<Vec<TransferRecord>, StoreError>;

    /// Insert the record, or overwrite the record with the same id.
    fn upsert(&mut self, record: &TransferRecord) -> Result<(), StoreError>;

    /// Remove a record. Returns `false` when no record had that id.
    fn delete(&mut self, id: Uuid) -> Result<bool, StoreError>;

    /// Every record, newest date first, then newest time first.
    fn list_all(&self) -> Result<Vec<TransferRecord>, StoreError>;

    /// Case-insensitive substring search over beneficiary, bank, amount and
    /// operation number, in `list_all` order.
    fn search(&self, query: &str) -> Result<Vec<TransferRecord>, StoreError> {
        let needle = query.trim().to_lowercase();
        let records = self.list_all()?;
        if needle.is_empty() {
            return Ok(records);
        }
        Ok(records.into_iter().filter(|r| matches_query(r, &needle)).collect())
    }
}

/// Listing order: date desc, then time desc.
pub(crate) fn newest_first(a: &TransferRecord, b: &TransferRecord) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.time.cmp(&a.time))
}

fn matches_query(record: &TransferRecord, needle: &str) -> bool {
    let fields = [
        Some(record.beneficiary.as_str()),
        Some(record.bank.as_str()),
        Some(record.amount.as_str()),
        record.operation_number.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}
