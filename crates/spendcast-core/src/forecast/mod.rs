//! Forecasting engine
//!
//! The request handler only sees two operations:
//! - [`ForecastingEngine::fit`] turns a daily series into a [`FittedModel`]
//! - [`FittedModel::predict`] extends the fitted range by a horizon
//!
//! [`AdditiveEngine`] is the built-in implementation: a ridge-regularised
//! additive regression (trend + Fourier seasonalities + holiday effects)
//! with residual-based uncertainty intervals.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::holidays::Country;
use crate::models::DailyAggregate;

mod additive;
mod linalg;

pub use additive::AdditiveEngine;

/// One predicted row, covering either a fitted (historical) day or a future day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Errors raised while fitting or predicting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Series has fewer than 2 distinct dates ({0} found)")]
    DegenerateSeries(usize),

    #[error("Series contains a non-finite amount on {0}")]
    NonFinite(NaiveDate),

    #[error("Series dates must be strictly ascending ({0} follows {1})")]
    Unordered(NaiveDate, NaiveDate),

    #[error("Model fit failed: normal equations are singular")]
    Singular,

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seasonality {
    /// Enabled when the history is long enough to observe it twice
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl Seasonality {
    fn resolve(self, span_days: i64, min_span_days: i64) -> bool {
        match self {
            Self::Auto => span_days >= min_span_days,
            Self::Enabled => true,
            Self::Disabled => false,
        }
    }
}

impl From<bool> for Seasonality {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub daily_seasonality: Seasonality,
    pub weekly_seasonality: Seasonality,
    pub yearly_seasonality: Seasonality,
    /// Calendar whose holidays become regressors
    pub holidays: Option<Country>,
    /// Coverage of the lower/upper band, in (0, 1)
    pub interval_width: f64,
}

impl Default for EngineConfig {
    /// Daily seasonality on, Indian holidays, 80% intervals
    fn default() -> Self {
        Self {
            daily_seasonality: Seasonality::Enabled,
            weekly_seasonality: Seasonality::Auto,
            yearly_seasonality: Seasonality::Auto,
            holidays: Some(Country::India),
            interval_width: 0.8,
        }
    }
}

impl EngineConfig {
    pub fn with_holidays(mut self, country: Option<Country>) -> Self {
        self.holidays = country;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), EngineError> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "interval_width must be between 0 and 1, got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// A model fitted to one series
pub trait FittedModel: Send {
    /// Predictions for every fitted date followed by `horizon_days`
    /// consecutive days after the last fitted date
    fn predict(&self, horizon_days: u32) -> Result<Vec<ForecastRow>, EngineError>;

    /// Last date seen during fitting
    fn last_date(&self) -> NaiveDate;

    /// Names of the fitted components, for diagnostics
    fn components(&self) -> Vec<String>;
}

/// Something that can fit a daily series
pub trait ForecastingEngine: Send + Sync {
    /// Fit to a series whose dates are distinct and ascending
    fn fit(&self, series: &[DailyAggregate]) -> Result<Box<dyn FittedModel>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seasonality_resolve() {
        assert!(Seasonality::Auto.resolve(14, 14));
        assert!(!Seasonality::Auto.resolve(13, 14));
        assert!(Seasonality::Enabled.resolve(1, 14));
        assert!(!Seasonality::Disabled.resolve(1000, 14));
        assert_eq!(Seasonality::from(true), Seasonality::Enabled);
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.daily_seasonality, Seasonality::Enabled);
        assert_eq!(config.holidays, Some(Country::India));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_interval_width() {
        for width in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let config = EngineConfig::default().with_interval_width(width);
            assert!(matches!(
                config.validate(),
                Err(EngineError::InvalidConfig(_))
            ));
        }
    }
}
