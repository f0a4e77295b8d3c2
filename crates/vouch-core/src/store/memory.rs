//! In-process store.

use std::collections::HashMap;

use uuid::Uuid;

use super::{newest_first, TransferStore};
use crate::error::StoreError;
use crate::models::transfer::TransferRecord;

/// Transfer store kept in a `HashMap`. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<Uuid, TransferRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TransferStore for MemoryStore {
    fn get_by_id(&self, id: Uuid) -> Result<Option<TransferRecord>, StoreError> {
        Ok(self.records.get(&id).cloned())
    }

    fn find_by_bank_and_operation(
        &self,
        bank: &str,
        operation_number: &str,
    ) -> Result<Option<TransferRecord>, StoreError> {
        Ok(self
            .records
            .values()
            .find(|r| r.bank == bank && r.operation_number.as_deref() == Some(operation_number))
            .cloned())
    }

    fn find_possible_duplicates(
        &self,
        date: &str,
        amount: &str,
        destination_account_suffix: &str,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        let mut found: Vec<TransferRecord> = self
            .records
            .values()
            .filter(|r| r.date == date && r.amount == amount && r.destination_account_suffix == destination_account_suffix)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(found)
    }

    fn upsert(&mut self, record: &TransferRecord) -> Result<(), StoreError> {
        if let Some(op) = &record.operation_number {
            let taken = self
                .records
                .values()
                .any(|r| r.id != record.id && r.bank == record.bank && r.operation_number.as_ref() == Some(op));
            if taken {
                return Err(StoreError::UniqueViolation {
                    bank: record.bank.clone(),
                    operation_number: op.clone(),
                });
            }
        }

        self.records.insert(record.id, record.clone());
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.remove(&id).is_some())
    }

    fn list_all(&self) -> Result<Vec<TransferRecord>, StoreError> {
        let mut all: Vec<TransferRecord> = self.records.values().cloned().collect();
        all.sort_by(newest_first);
        Ok(all)
    }
}
