//! Read-only access to a user's expense history

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::models::{ExpenseRecord, UserId};

/// Source of expense records for forecasting
///
/// Implementations return only amount and date. The database-backed
/// implementation lives on [`crate::db::Database`].
pub trait ExpenseRepository: Send + Sync {
    /// All expense records belonging to `user`, in no particular order
    fn expenses_for_user(&self, user: &UserId) -> Result<Vec<ExpenseRecord>>;
}

/// In-memory repository for tests and local experiments
///
/// A writer that panicked mid-push leaves the map consistent, so both
/// reads and writes carry on through a poisoned lock.
#[derive(Default)]
pub struct InMemoryRepository {
    records: RwLock<HashMap<UserId, Vec<ExpenseRecord>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserId, record: ExpenseRecord) {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.entry(user).or_default().push(record);
    }

    pub fn extend(&self, user: UserId, new_records: impl IntoIterator<Item = ExpenseRecord>) {
        for record in new_records {
            self.insert(user, record);
        }
    }
}

impl ExpenseRepository for InMemoryRepository {
    fn expenses_for_user(&self, user: &UserId) -> Result<Vec<ExpenseRecord>> {
        let records = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(records.get(user).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_in_memory_repository_scopes_by_user() {
        let repo = InMemoryRepository::new();
        let alice: UserId = "aaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap();
        let bob: UserId = "bbbbbbbbbbbbbbbbbbbbbbbb".parse().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        repo.extend(
            alice,
            [
                ExpenseRecord::on_day(10.0, day),
                ExpenseRecord::on_day(4.5, day),
            ],
        );
        repo.insert(bob, ExpenseRecord::on_day(99.0, day));

        assert_eq!(repo.expenses_for_user(&alice).unwrap().len(), 2);
        assert_eq!(repo.expenses_for_user(&bob).unwrap().len(), 1);

        let nobody: UserId = "cccccccccccccccccccccccc".parse().unwrap();
        assert!(repo.expenses_for_user(&nobody).unwrap().is_empty());
    }

    #[test]
    fn test_poisoned_lock_still_serves_reads_and_writes() {
        let repo = InMemoryRepository::new();
        let user: UserId = "aaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        repo.insert(user, ExpenseRecord::on_day(1.0, day));

        std::thread::scope(|s| {
            let result = s
                .spawn(|| {
                    let _guard = repo.records.write().unwrap();
                    panic!("writer died holding the lock");
                })
                .join();
            assert!(result.is_err());
        });
        assert!(repo.records.is_poisoned());

        repo.insert(user, ExpenseRecord::on_day(2.0, day));
        let records = repo.expenses_for_user(&user).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].amount, 2.0);
    }
}
