//! Forecast request handling
//!
//! Validates the user identifier, loads the user's expenses, aggregates them
//! per day, fits the forecasting engine and shapes the 30-day result.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate_daily;
use crate::error::Error;
use crate::forecast::{AdditiveEngine, EngineConfig, EngineError, ForecastingEngine};
use crate::models::{ForecastPoint, ForecastResponse, UserId, UserIdError};
use crate::repository::ExpenseRepository;

/// Minimum number of stored expenses before a forecast is attempted
pub const MIN_RECORDS: usize = 5;

/// Number of future days in every forecast
pub const HORIZON_DAYS: u32 = 30;

/// Why a forecast could not be produced
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid User ID format")]
    InvalidIdentifier(#[source] UserIdError),

    #[error("Not enough data. Found {found} items. Need {min}.", min = MIN_RECORDS)]
    InsufficientData { found: usize },

    #[error("{0}")]
    Repository(#[source] Error),

    #[error("{0}")]
    Engine(#[from] EngineError),
}

impl PredictError {
    /// Expected conditions caused by the request itself, rather than a failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier(_) | Self::InsufficientData { .. }
        )
    }
}

/// Round to two decimal places
///
/// Rounds the exact binary value, with exact ties going to the even
/// hundredth. `0.015` is stored slightly below the tie and rounds to `0.01`;
/// `0.125` is an exact tie and rounds to `0.12`.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    // value = mantissa * 2^exponent, exactly
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    // Integers carry no hundredths
    if exponent >= 0 || mantissa == 0 {
        return value;
    }

    let shift = -exponent;
    let hundredths = i128::from(mantissa) * 100;
    // Below half a hundredth in magnitude
    if shift >= 127 || hundredths < (1i128 << (shift - 1)) {
        return 0.0_f64.copysign(value);
    }

    let quotient = hundredths >> shift;
    let remainder = hundredths - (quotient << shift);
    let half = 1i128 << (shift - 1);
    let rounded = if remainder > half || (remainder == half && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };

    (rounded as f64 / 100.0).copysign(value)
}

/// Produces spending forecasts from a repository and an engine
#[derive(Clone)]
pub struct Forecaster {
    repository: Arc<dyn ExpenseRepository>,
    engine: Arc<dyn ForecastingEngine>,
}

impl Forecaster {
    pub fn new(
        repository: Arc<dyn ExpenseRepository>,
        engine: Arc<dyn ForecastingEngine>,
    ) -> Self {
        Self { repository, engine }
    }

    /// Forecaster using the additive engine with daily seasonality and
    /// Indian holidays
    pub fn with_default_engine(repository: Arc<dyn ExpenseRepository>) -> Self {
        Self::new(
            repository,
            Arc::new(AdditiveEngine::new(EngineConfig::default())),
        )
    }

    /// Forecast the next 30 days of spending for `raw_user_id`
    pub fn predict(&self, raw_user_id: &str) -> Result<ForecastResponse, PredictError> {
        let user: UserId = raw_user_id
            .parse()
            .map_err(PredictError::InvalidIdentifier)?;

        let records = self
            .repository
            .expenses_for_user(&user)
            .map_err(PredictError::Repository)?;
        info!(user = %user, count = records.len(), "Loaded expenses");

        if records.len() < MIN_RECORDS {
            warn!(user = %user, found = records.len(), "Not enough expenses to forecast");
            return Err(PredictError::InsufficientData {
                found: records.len(),
            });
        }

        let series = aggregate_daily(&records);
        debug!(user = %user, days = series.len(), "Aggregated daily series");

        let model = self.engine.fit(&series)?;
        let rows = model.predict(HORIZON_DAYS)?;

        let future = &rows[rows.len().saturating_sub(HORIZON_DAYS as usize)..];
        let forecast: Vec<ForecastPoint> = future
            .iter()
            .map(|row| ForecastPoint {
                date: row.date,
                predicted_amount: round2(row.yhat),
                lower_bound: round2(row.yhat_lower),
                upper_bound: round2(row.yhat_upper),
            })
            .collect();

        let total_predicted_spend = round2(forecast.iter().map(|p| p.predicted_amount).sum());

        Ok(ForecastResponse {
            forecast,
            total_predicted_spend,
        })
    }
}
