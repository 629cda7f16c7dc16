//! Daily aggregation of expense records

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailyAggregate, ExpenseRecord};

/// Sum expenses per calendar day, ascending by date
///
/// The time-of-day component of each record is discarded, so every record
/// on the same day lands in one aggregate.
pub fn aggregate_daily(records: &[ExpenseRecord]) -> Vec<DailyAggregate> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for record in records {
        *by_day.entry(record.date.date()).or_insert(0.0) += record.amount;
    }

    by_day
        .into_iter()
        .map(|(date, total_amount)| DailyAggregate { date, total_amount })
        .collect()
}
