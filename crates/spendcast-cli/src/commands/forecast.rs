//! Forecast command implementation

use std::sync::Arc;

use anyhow::Result;
use spendcast_core::db::Database;
use spendcast_core::models::ForecastResponse;
use spendcast_core::predict::Forecaster;

/// Run a forecast against the local database
pub fn run_forecast(db: &Database, user: &str) -> Result<ForecastResponse> {
    let forecaster = Forecaster::with_default_engine(Arc::new(db.clone()));
    Ok(forecaster.predict(user)?)
}

pub fn cmd_forecast(db: &Database, user: &str, json: bool) -> Result<()> {
    let response = run_forecast(db, user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!();
    println!("🔮 30-Day Spending Forecast for {}", user);
    println!("   ─────────────────────────────────────────────");
    println!(
        "   {:<10} │ {:>10} │ {:>10} │ {:>10}",
        "Date", "Predicted", "Low", "High"
    );

    for point in &response.forecast {
        println!(
            "   {:<10} │ {:>10.2} │ {:>10.2} │ {:>10.2}",
            point.date.to_string(),
            point.predicted_amount,
            point.lower_bound,
            point.upper_bound
        );
    }

    println!("   ─────────────────────────────────────────────");
    println!(
        "   💰 Total predicted spend: {:.2}",
        response.total_predicted_spend
    );

    Ok(())
}
