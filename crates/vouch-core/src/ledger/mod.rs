//! Deduplicating ledger of transfer records.
//!
//! A submission goes through validation, normalization, a primary duplicate
//! check on `(bank, operation_number)`, a fallback check on
//! `(date, amount, destination suffix)` and finally a create or update.
//! Writes are serialized behind one lock so two submissions of the same
//! receipt cannot both observe "no duplicate".

mod validate;

pub use validate::{normalize_bank, normalize_beneficiary, ValidationError};

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::transfer::{Extras, TransferForm, TransferRecord};
use crate::store::TransferStore;

use validate::{clean_form, CleanForm};

/// The existing record a submission collided with, tagged by which key matched.
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateMatch {
    /// Same bank and operation number.
    Primary(TransferRecord),
    /// Same date, amount and destination suffix.
    Fallback(TransferRecord),
}

impl DuplicateMatch {
    pub fn existing(&self) -> &TransferRecord {
        match self {
            DuplicateMatch::Primary(record) | DuplicateMatch::Fallback(record) => record,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DuplicateMatch::Primary(_) => "primary",
            DuplicateMatch::Fallback(_) => "fallback",
        }
    }
}

/// Result of a form submission. Storage failures are returned as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The record was stored. `replaced` is set when it overwrote a duplicate.
    Success { id: Uuid, replaced: bool },
    /// The form was rejected; storage is untouched.
    ValidationError(ValidationError),
    /// A duplicate exists and replacing was not requested; storage is untouched.
    DuplicateFound(DuplicateMatch),
}

/// Selection of records for an export run.
///
/// Both date bounds are inclusive and optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Skip records that already carry `exported_at`.
    pub pending_only: bool,
}

impl ExportFilter {
    pub fn matches(&self, record: &TransferRecord) -> bool {
        if self.pending_only && record.exported_at.is_some() {
            return false;
        }
        if self.from.is_none() && self.to.is_none() {
            return true;
        }

        let Ok(date) = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d") else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Transfer ledger over a storage collaborator.
pub struct TransferLedger<S> {
    store: Mutex<S>,
    updates: watch::Sender<Vec<TransferRecord>>,
}

impl<S: TransferStore> TransferLedger<S> {
    pub fn new(store: S) -> Result<Self, StoreError> {
        let initial = store.list_all()?;
        let (updates, _) = watch::channel(initial);
        Ok(Self {
            store: Mutex::new(store),
            updates,
        })
    }

    /// Validate, deduplicate and store a form submission.
    pub fn submit(&self, form: &TransferForm, replace_if_duplicate: bool) -> Result<SubmitOutcome, StoreError> {
        self.submit_at(form, replace_if_duplicate, Local::now())
    }

    /// [`submit`](Self::submit) with an explicit clock. Future dates are
    /// judged against the local calendar day of `now`.
    pub fn submit_at(
        &self,
        form: &TransferForm,
        replace_if_duplicate: bool,
        now: DateTime<Local>,
    ) -> Result<SubmitOutcome, StoreError> {
        let clean = match clean_form(form, now.date_naive()) {
            Ok(clean) => clean,
            Err(e) => {
                debug!("Rejected submission: {}", e);
                return Ok(SubmitOutcome::ValidationError(e));
            }
        };
        let now = now.with_timezone(&Utc);
        let extras = form.extras.clone().filter(|e| !e.is_empty());

        let mut store = self.lock()?;

        if let Some(found) = find_duplicate(&*store, &clean, form.id)? {
            if !replace_if_duplicate {
                info!(
                    "Duplicate ({}) of transfer {} found, not replacing",
                    found.kind(),
                    found.existing().id
                );
                return Ok(SubmitOutcome::DuplicateFound(found));
            }

            let existing = found.existing();
            let record = build_record(existing.id, clean, extras, existing.created_at, now, existing.exported_at);
            store.upsert(&record)?;
            info!("Replaced transfer {} ({} duplicate)", record.id, found.kind());

            self.publish(&*store)?;
            return Ok(SubmitOutcome::Success {
                id: record.id,
                replaced: true,
            });
        }

        let (id, created_at, exported_at) = match form.id {
            Some(id) => match store.get_by_id(id)? {
                Some(prior) => (id, prior.created_at, prior.exported_at),
                None => (id, now, None),
            },
            None => (Uuid::new_v4(), now, None),
        };

        let record = build_record(id, clean, extras, created_at, now, exported_at);
        store.upsert(&record)?;
        info!("Stored transfer {}", record.id);

        self.publish(&*store)?;
        Ok(SubmitOutcome::Success { id, replaced: false })
    }

    pub fn get(&self, id: Uuid) -> Result<TransferRecord, StoreError> {
        self.lock()?.get_by_id(id)?.ok_or(StoreError::NotFound(id))
    }

    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut store = self.lock()?;
        if !store.delete(id)? {
            return Err(StoreError::NotFound(id));
        }
        info!("Deleted transfer {}", id);
        self.publish(&*store)
    }

    /// Every record, newest date then newest time first.
    pub fn list_all(&self) -> Result<Vec<TransferRecord>, StoreError> {
        self.lock()?.list_all()
    }

    pub fn search(&self, query: &str) -> Result<Vec<TransferRecord>, StoreError> {
        self.lock()?.search(query)
    }

    /// Records matching an export selection, in `list_all` order.
    pub fn select_for_export(&self, filter: &ExportFilter) -> Result<Vec<TransferRecord>, StoreError> {
        let mut records = self.list_all()?;
        records.retain(|r| filter.matches(r));
        debug!("Selected {} transfers for export", records.len());
        Ok(records)
    }

    /// Stamp `exported_at` (and `updated_at`) on the given records. Returns
    /// how many were updated; unknown ids are skipped.
    pub fn mark_exported(&self, ids: &[Uuid], at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut store = self.lock()?;
        let mut marked = 0;

        for &id in ids {
            if let Some(mut record) = store.get_by_id(id)? {
                record.exported_at = Some(at);
                record.updated_at = at;
                store.upsert(&record)?;
                marked += 1;
            }
        }

        if marked > 0 {
            self.publish(&*store)?;
        }
        Ok(marked)
    }

    /// Live view of `list_all`, refreshed after every successful write.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TransferRecord>> {
        self.updates.subscribe()
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, StoreError> {
        self.store.lock().map_err(|_| StoreError::Poisoned)
    }

    fn publish(&self, store: &S) -> Result<(), StoreError> {
        let all = store.list_all()?;
        self.updates.send_replace(all);
        Ok(())
    }
}

/// Primary key first; the fallback key is only consulted when the primary
/// check found nothing. A record never collides with itself.
fn find_duplicate<S: TransferStore>(
    store: &S,
    clean: &CleanForm,
    own_id: Option<Uuid>,
) -> Result<Option<DuplicateMatch>, StoreError> {
    if let Some(op) = &clean.operation_number {
        if let Some(existing) = store.find_by_bank_and_operation(&clean.bank, op)? {
            if Some(existing.id) != own_id {
                debug!("Primary duplicate on {} / {}", clean.bank, op);
                return Ok(Some(DuplicateMatch::Primary(existing)));
            }
        }
    }

    let fallback = store
        .find_possible_duplicates(&clean.date, &clean.amount, &clean.destination_account_suffix)?
        .into_iter()
        .find(|r| Some(r.id) != own_id);

    if fallback.is_some() {
        debug!(
            "Fallback duplicate on {} / {} / {}",
            clean.date, clean.amount, clean.destination_account_suffix
        );
    }
    Ok(fallback.map(DuplicateMatch::Fallback))
}

fn build_record(
    id: Uuid,
    clean: CleanForm,
    extras: Option<Extras>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    exported_at: Option<DateTime<Utc>>,
) -> TransferRecord {
    TransferRecord {
        id,
        date: clean.date,
        time: clean.time,
        bank: clean.bank,
        operation_number: clean.operation_number,
        beneficiary: clean.beneficiary,
        destination_account_suffix: clean.destination_account_suffix,
        amount: clean.amount,
        extras,
        created_at,
        updated_at,
        exported_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn ledger() -> TransferLedger<MemoryStore> {
        TransferLedger::new(MemoryStore::new()).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn form(op: Option<&str>) -> TransferForm {
        TransferForm {
            id: None,
            date: "2024-03-05".to_string(),
            time: "09:05".to_string(),
            bank: "bcp".to_string(),
            operation_number: op.map(str::to_string),
            beneficiary: "juan perez".to_string(),
            destination_account_suffix: "7042".to_string(),
            amount: "PEN 921.88".to_string(),
            extras: None,
        }
    }

    fn success_id(outcome: SubmitOutcome) -> Uuid {
        match outcome {
            SubmitOutcome::Success { id, .. } => id,
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_same_operation_twice_is_primary_duplicate() {
        let ledger = ledger();
        let first = ledger.submit_at(&form(Some("000111222")), false, at(10, 9)).unwrap();
        let id = success_id(first);

        let mut again = form(Some("000111222"));
        again.date = "2024-03-06".to_string();
        match ledger.submit_at(&again, false, at(10, 10)).unwrap() {
            SubmitOutcome::DuplicateFound(DuplicateMatch::Primary(existing)) => assert_eq!(existing.id, id),
            other => panic!("expected primary duplicate, got {:?}", other),
        }
        assert_eq!(ledger.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_replace_keeps_original_id_and_created_at() {
        let ledger = ledger();
        let id = success_id(ledger.submit_at(&form(Some("000111222")), false, at(10, 9)).unwrap());
        let created_at = ledger.get(id).unwrap().created_at;

        let mut again = form(Some("000111222"));
        again.beneficiary = "ana lopez".to_string();
        let outcome = ledger.submit_at(&again, true, at(11, 9)).unwrap();
        assert_eq!(outcome, SubmitOutcome::Success { id, replaced: true });

        let all = ledger.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].beneficiary, "Ana Lopez");
        assert_eq!(all[0].created_at, created_at);
        assert!(all[0].updated_at > created_at);
    }

    #[test]
    fn test_fallback_duplicate_without_operation_number() {
        let ledger = ledger();
        let id = success_id(ledger.submit_at(&form(None), false, at(10, 9)).unwrap());

        let mut again = form(None);
        again.time = "10:30".to_string();
        match ledger.submit_at(&again, false, at(10, 10)).unwrap() {
            SubmitOutcome::DuplicateFound(DuplicateMatch::Fallback(existing)) => assert_eq!(existing.id, id),
            other => panic!("expected fallback duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_primary_checked_before_fallback() {
        let ledger = ledger();
        let by_op = success_id(ledger.submit_at(&form(Some("000111222")), false, at(10, 9)).unwrap());

        let mut other = form(None);
        other.destination_account_suffix = "9999".to_string();
        success_id(ledger.submit_at(&other, false, at(10, 9)).unwrap());

        let mut colliding = form(Some("000111222"));
        colliding.destination_account_suffix = "9999".to_string();
        match ledger.submit_at(&colliding, false, at(10, 10)).unwrap() {
            SubmitOutcome::DuplicateFound(found) => {
                assert_eq!(found.kind(), "primary");
                assert_eq!(found.existing().id, by_op);
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_edit_never_collides_with_itself() {
        let ledger = ledger();
        let id = success_id(ledger.submit_at(&form(Some("000111222")), false, at(10, 9)).unwrap());
        ledger.mark_exported(&[id], Utc::now()).unwrap();
        let before = ledger.get(id).unwrap();

        let mut edit = form(Some("000111222"));
        edit.id = Some(id);
        edit.time = "09:45".to_string();
        let outcome = ledger.submit_at(&edit, false, at(12, 9)).unwrap();
        assert_eq!(outcome, SubmitOutcome::Success { id, replaced: false });

        let after = ledger.get(id).unwrap();
        assert_eq!(after.time, "09:45");
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.exported_at, before.exported_at);
    }

    #[test]
    fn test_validation_error_leaves_storage_alone() {
        let ledger = ledger();
        let mut bad = form(None);
        bad.date = "2024-03-20".to_string();

        let outcome = ledger.submit_at(&bad, true, at(10, 9)).unwrap();
        assert!(matches!(outcome, SubmitOutcome::ValidationError(ValidationError::Date(_))));
        assert!(ledger.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_normalizes_bank_and_beneficiary() {
        let ledger = ledger();
        let id = success_id(ledger.submit_at(&form(Some("000111222")), false, at(10, 9)).unwrap());
        let record = ledger.get(id).unwrap();
        assert_eq!(record.bank, "BCP");
        assert_eq!(record.beneficiary, "Juan Perez");
    }

    #[test]
    fn test_delete_unknown_id_is_not_found() {
        let ledger = ledger();
        let id = Uuid::new_v4();
        assert!(matches!(ledger.delete(id), Err(StoreError::NotFound(missing)) if missing == id));
        assert!(matches!(ledger.get(id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_subscribers_see_writes() {
        let ledger = ledger();
        let mut rx = ledger.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        let id = success_id(ledger.submit_at(&form(None), false, at(10, 9)).unwrap());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update()[0].id, id);

        ledger.delete(id).unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn test_search_and_mark_exported() {
        let ledger = ledger();
        let id = success_id(ledger.submit_at(&form(Some("000111222")), false, at(10, 9)).unwrap());

        assert_eq!(ledger.search("perez").unwrap().len(), 1);
        let stamp = Utc.with_ymd_and_hms(2024, 3, 11, 8, 30, 0).unwrap();
        assert_eq!(ledger.mark_exported(&[id, Uuid::new_v4()], stamp).unwrap(), 1);

        let record = ledger.get(id).unwrap();
        assert_eq!(record.exported_at, Some(stamp));
        assert_eq!(record.updated_at, stamp);
    }

    fn dated(date: &str, op: &str) -> TransferForm {
        let mut dated = form(Some(op));
        dated.date = date.to_string();
        dated
    }

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, d)
    }

    #[test]
    fn test_select_for_export_by_inclusive_range() {
        let ledger = ledger();
        let first = success_id(ledger.submit_at(&dated("2024-03-01", "000000001"), false, at(10, 9)).unwrap());
        let middle = success_id(ledger.submit_at(&dated("2024-03-05", "000000002"), false, at(10, 9)).unwrap());
        let last = success_id(ledger.submit_at(&dated("2024-03-09", "000000003"), false, at(10, 9)).unwrap());

        let ids = |filter: ExportFilter| -> Vec<Uuid> {
            ledger.select_for_export(&filter).unwrap().into_iter().map(|r| r.id).collect()
        };

        let range = ExportFilter {
            from: day(1),
            to: day(5),
            pending_only: false,
        };
        assert_eq!(ids(range), vec![middle, first]);

        let open_start = ExportFilter {
            to: day(4),
            ..ExportFilter::default()
        };
        assert_eq!(ids(open_start), vec![first]);

        assert_eq!(ids(ExportFilter::default()), vec![last, middle, first]);

        ledger.mark_exported(&[middle], Utc::now()).unwrap();
        let pending = ExportFilter {
            from: day(1),
            to: day(9),
            pending_only: true,
        };
        assert_eq!(ids(pending), vec![last, first]);
    }

    #[test]
    fn test_concurrent_submissions_store_one_record() {
        use std::sync::Arc;
        use std::thread;

        let ledger = Arc::new(ledger());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let mut submission = form(Some("000111222"));
                    submission.time = format!("09:{:02}", i);
                    ledger.submit_at(&submission, false, at(10, 9)).unwrap()
                })
            })
            .collect();

        let outcomes: Vec<SubmitOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = outcomes
            .iter()
            .filter(|o| matches!(o, SubmitOutcome::Success { replaced: false, .. }))
            .count();
        let duplicates = outcomes
            .iter()
            .filter(|o| matches!(o, SubmitOutcome::DuplicateFound(DuplicateMatch::Primary(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, outcomes.len() - 1);
        assert_eq!(ledger.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_extras_are_stored() {
        let ledger = ledger();
        let mut with_extras = form(None);
        let mut extras = Extras::new();
        extras.insert("origin_account_suffix".to_string(), serde_json::Value::from("0035"));
        with_extras.extras = Some(extras.clone());

        let id = success_id(ledger.submit_at(&with_extras, false, at(10, 9)).unwrap());
        assert_eq!(ledger.get(id).unwrap().extras, Some(extras));
    }
}
