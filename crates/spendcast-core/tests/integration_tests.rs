//! Integration tests for spendcast-core
//!
//! These tests exercise the full import → store → forecast workflow.

use std::io::Write;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use spendcast_core::{
    db::Database,
    import::parse_expenses_csv,
    models::UserId,
    predict::{round2, Forecaster, PredictError, HORIZON_DAYS},
};

const USER: &str = "65a1f0c2e4b0a1b2c3d4e5f6";
const OTHER_USER: &str = "65a1f0c2e4b0a1b2c3d4e5f7";

/// Two weeks of expenses for one user, with two purchases on some days,
/// plus a couple of rows for a second user
fn expenses_csv() -> String {
    let mut csv = String::from("user,amount,date,title,category,payment_mode\n");
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for day in 0..14 {
        let date = start + Duration::days(day);
        csv.push_str(&format!(
            "{USER},\"₹{}\",{},Lunch,Food,upi\n",
            150 + day * 10,
            date.format("%Y-%m-%d")
        ));
        if day % 3 == 0 {
            csv.push_str(&format!(
                "{USER},60,{}T18:30:00.000Z,Auto,Transport,cash\n",
                date.format("%Y-%m-%d")
            ));
        }
    }
    csv.push_str(&format!("{OTHER_USER},999,2024-01-02,Rent,Housing,net banking\n"));
    csv.push_str(&format!("{OTHER_USER},12,2024-01-03,Tea,Food,\n"));
    csv
}

fn import(db: &Database, csv: &str) -> usize {
    let expenses = parse_expenses_csv(csv.as_bytes()).expect("Failed to parse CSV");
    let mut imported = 0;
    for expense in &expenses {
        if db.insert_expense(expense).unwrap().is_some() {
            imported += 1;
        }
    }
    imported
}

// =============================================================================
// Database Integration Tests
// =============================================================================

#[test]
fn test_full_import_workflow() {
    let db = Database::in_memory().expect("Failed to create in-memory database");

    // 14 lunches + 5 auto rides + 2 rows for the other user
    assert_eq!(import(&db, &expenses_csv()), 21);

    let user: UserId = USER.parse().unwrap();
    assert_eq!(db.count_expenses(&user).unwrap(), 19);

    let users = db.list_users().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0], (user, 19));

    let newest = db.list_expenses(&user, 1).unwrap();
    assert_eq!(newest[0].date.date(), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
}

#[test]
fn test_reimport_is_deduplicated() {
    let db = Database::in_memory().unwrap();

    assert_eq!(import(&db, &expenses_csv()), 21);
    assert_eq!(import(&db, &expenses_csv()), 0);
}

#[test]
fn test_import_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(expenses_csv().as_bytes()).unwrap();

    let reader = std::fs::File::open(file.path()).unwrap();
    let expenses = parse_expenses_csv(reader).unwrap();

    assert_eq!(expenses.len(), 21);
}

// =============================================================================
// Forecast Integration Tests
// =============================================================================

#[test]
fn test_forecast_from_database() {
    let db = Database::in_memory().unwrap();
    import(&db, &expenses_csv());
    let forecaster = Forecaster::with_default_engine(Arc::new(db));

    let response = forecaster.predict(USER).unwrap();

    assert_eq!(response.forecast.len(), HORIZON_DAYS as usize);
    let first = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    for (i, point) in response.forecast.iter().enumerate() {
        assert_eq!(point.date, first + Duration::days(i as i64));
        assert!(point.lower_bound <= point.predicted_amount);
        assert!(point.predicted_amount <= point.upper_bound);
    }

    let sum: f64 = response.forecast.iter().map(|p| p.predicted_amount).sum();
    assert_eq!(response.total_predicted_spend, round2(sum));
}

#[test]
fn test_forecast_rejects_sparse_user() {
    let db = Database::in_memory().unwrap();
    import(&db, &expenses_csv());
    let forecaster = Forecaster::with_default_engine(Arc::new(db));

    let err = forecaster.predict(OTHER_USER).unwrap_err();

    assert!(matches!(err, PredictError::InsufficientData { found: 2 }));
    assert_eq!(err.to_string(), "Not enough data. Found 2 items. Need 5.");
}

#[test]
fn test_forecast_unknown_user_has_no_data() {
    let db = Database::in_memory().unwrap();
    let forecaster = Forecaster::with_default_engine(Arc::new(db));

    let err = forecaster.predict("000000000000000000000000").unwrap_err();

    assert!(matches!(err, PredictError::InsufficientData { found: 0 }));
}

#[test]
fn test_forecast_is_repeatable() {
    let db = Database::in_memory().unwrap();
    import(&db, &expenses_csv());
    let forecaster = Forecaster::with_default_engine(Arc::new(db));

    assert_eq!(
        forecaster.predict(USER).unwrap(),
        forecaster.predict(USER).unwrap()
    );
}

#[test]
fn test_response_serializes_dates_as_calendar_days() {
    let db = Database::in_memory().unwrap();
    import(&db, &expenses_csv());
    let forecaster = Forecaster::with_default_engine(Arc::new(db));

    let json = serde_json::to_value(forecaster.predict(USER).unwrap()).unwrap();

    assert_eq!(json["forecast"][0]["date"], "2024-01-15");
    assert!(json["total_predicted_spend"].is_number());
}
