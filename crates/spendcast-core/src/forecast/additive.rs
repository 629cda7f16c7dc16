//! Additive regression engine
//!
//! `y(t) = trend(t) + Σ seasonality(t) + Σ holiday(t) + ε`
//!
//! Amounts are scaled by their absolute maximum and time by the history span
//! before fitting. Every coefficient except the intercept carries a ridge
//! penalty, which keeps the normal equations solvable for short histories
//! and collinear components (daily seasonality on day-granular data).

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::linalg::{normal_equations, normal_quantile, solve};
use super::{EngineConfig, EngineError, FittedModel, ForecastRow, ForecastingEngine};
use crate::holidays::{Country, HolidayCalendar};
use crate::models::DailyAggregate;

/// Prior scale for the trend slope
const TREND_PRIOR_SCALE: f64 = 5.0;

/// Prior scale for seasonal and holiday coefficients
const COMPONENT_PRIOR_SCALE: f64 = 10.0;

/// Weekly seasonality needs two full weeks of history in `Auto` mode
const WEEKLY_MIN_SPAN_DAYS: i64 = 14;

/// Yearly seasonality needs two full years of history in `Auto` mode
const YEARLY_MIN_SPAN_DAYS: i64 = 730;

/// A Fourier seasonal component
#[derive(Debug, Clone, Copy)]
struct FourierTerm {
    name: &'static str,
    period_days: f64,
    order: usize,
}

const DAILY: FourierTerm = FourierTerm {
    name: "daily",
    period_days: 1.0,
    order: 4,
};

const WEEKLY: FourierTerm = FourierTerm {
    name: "weekly",
    period_days: 7.0,
    order: 3,
};

const YEARLY: FourierTerm = FourierTerm {
    name: "yearly",
    period_days: 365.25,
    order: 10,
};

/// Engine that fits an [`AdditiveModel`]
#[derive(Debug, Clone, Default)]
pub struct AdditiveEngine {
    config: EngineConfig,
}

impl AdditiveEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn check_series(series: &[DailyAggregate]) -> Result<(), EngineError> {
        if series.len() < 2 {
            return Err(EngineError::DegenerateSeries(series.len()));
        }
        for point in series {
            if !point.total_amount.is_finite() {
                return Err(EngineError::NonFinite(point.date));
            }
        }
        for pair in series.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(EngineError::Unordered(pair[1].date, pair[0].date));
            }
        }
        Ok(())
    }
}

impl ForecastingEngine for AdditiveEngine {
    fn fit(&self, series: &[DailyAggregate]) -> Result<Box<dyn FittedModel>, EngineError> {
        self.config.validate()?;
        Self::check_series(series)?;

        let start = series[0].date;
        let end = series[series.len() - 1].date;
        let span_days = (end - start).num_days();

        let mut seasonalities = Vec::new();
        if self.config.daily_seasonality.resolve(span_days, 0) {
            seasonalities.push(DAILY);
        }
        if self
            .config
            .weekly_seasonality
            .resolve(span_days, WEEKLY_MIN_SPAN_DAYS)
        {
            seasonalities.push(WEEKLY);
        }
        if self
            .config
            .yearly_seasonality
            .resolve(span_days, YEARLY_MIN_SPAN_DAYS)
        {
            seasonalities.push(YEARLY);
        }

        // Only holidays observed in training get a coefficient
        let holiday_names: Vec<&'static str> = match self.config.holidays {
            Some(country) => {
                let mut seen = BTreeSet::new();
                country
                    .holidays_between(start, end)
                    .into_iter()
                    .filter(|h| seen.insert(h.name))
                    .map(|h| h.name)
                    .collect()
            }
            None => Vec::new(),
        };
        debug!(holidays = ?holiday_names, "Holidays found in training window");

        let y_scale = series
            .iter()
            .map(|p| p.total_amount.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let mut model = AdditiveModel {
            start,
            end,
            span_days: span_days as f64,
            y_scale,
            seasonalities,
            holiday_names,
            country: self.config.holidays,
            history: series.iter().map(|p| p.date).collect(),
            coefficients: Vec::new(),
            sigma: 0.0,
            z: normal_quantile(0.5 + self.config.interval_width / 2.0),
        };

        let holiday_index = model.holiday_index(end);
        let rows: Vec<Vec<f64>> = series
            .iter()
            .map(|p| model.features(p.date, &holiday_index))
            .collect();
        let y: Vec<f64> = series.iter().map(|p| p.total_amount / y_scale).collect();

        let (mut xtx, xty) = normal_equations(&rows, &y);
        for (i, penalty) in model.penalties().into_iter().enumerate() {
            xtx[i][i] += penalty;
        }
        let coefficients = solve(xtx, xty).ok_or(EngineError::Singular)?;

        let sse: f64 = rows
            .iter()
            .zip(&y)
            .map(|(row, target)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
                (target - fitted).powi(2)
            })
            .sum();
        model.sigma = (sse / y.len() as f64).sqrt();
        model.coefficients = coefficients;

        debug!(
            components = ?model.components(),
            observations = series.len(),
            sigma = model.sigma * y_scale,
            "Fitted additive model"
        );

        Ok(Box::new(model))
    }
}

/// A fitted additive model
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    start: NaiveDate,
    end: NaiveDate,
    span_days: f64,
    y_scale: f64,
    seasonalities: Vec<FourierTerm>,
    holiday_names: Vec<&'static str>,
    country: Option<Country>,
    history: Vec<NaiveDate>,
    coefficients: Vec<f64>,
    /// Residual standard deviation, in scaled units
    sigma: f64,
    z: f64,
}

impl AdditiveModel {
    /// Holiday names per date, from the first fitted date through `until`
    fn holiday_index(&self, until: NaiveDate) -> BTreeMap<NaiveDate, Vec<&'static str>> {
        let mut index: BTreeMap<NaiveDate, Vec<&'static str>> = BTreeMap::new();
        if let Some(country) = self.country {
            for holiday in country.holidays_between(self.start, until) {
                index.entry(holiday.date).or_default().push(holiday.name);
            }
        }
        index
    }

    fn features(
        &self,
        date: NaiveDate,
        holiday_index: &BTreeMap<NaiveDate, Vec<&'static str>>,
    ) -> Vec<f64> {
        let t = (date - self.start).num_days() as f64 / self.span_days;
        let mut row = vec![1.0, t];

        // Anchored to the epoch so weekly terms line up with weekdays
        let epoch_days = (date - NaiveDate::default()).num_days() as f64;
        for term in &self.seasonalities {
            for k in 1..=term.order {
                let angle = 2.0 * PI * k as f64 * epoch_days / term.period_days;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }

        let todays = holiday_index.get(&date);
        for name in &self.holiday_names {
            let hit = todays.is_some_and(|names| names.contains(name));
            row.push(if hit { 1.0 } else { 0.0 });
        }

        row
    }

    fn penalties(&self) -> Vec<f64> {
        let seasonal: usize = self.seasonalities.iter().map(|s| s.order * 2).sum();
        let component = 1.0 / COMPONENT_PRIOR_SCALE.powi(2);

        let mut penalties = vec![0.0, 1.0 / TREND_PRIOR_SCALE.powi(2)];
        penalties.extend(std::iter::repeat(component).take(seasonal + self.holiday_names.len()));
        penalties
    }

    fn row_for(
        &self,
        date: NaiveDate,
        steps_ahead: u32,
        holiday_index: &BTreeMap<NaiveDate, Vec<&'static str>>,
    ) -> ForecastRow {
        let features = self.features(date, holiday_index);
        let yhat: f64 = features
            .iter()
            .zip(&self.coefficients)
            .map(|(x, b)| x * b)
            .sum();

        // Uncertainty widens with distance past the last observation
        let n = self.history.len() as f64;
        let half_width = self.z * self.sigma * (1.0 + f64::from(steps_ahead) / n).sqrt();

        ForecastRow {
            date,
            yhat: yhat * self.y_scale,
            yhat_lower: (yhat - half_width) * self.y_scale,
            yhat_upper: (yhat + half_width) * self.y_scale,
        }
    }
}

impl FittedModel for AdditiveModel {
    fn predict(&self, horizon_days: u32) -> Result<Vec<ForecastRow>, EngineError> {
        let last = self.end + Duration::days(i64::from(horizon_days));
        let holiday_index = self.holiday_index(last);

        let mut rows = Vec::with_capacity(self.history.len() + horizon_days as usize);
        for &date in &self.history {
            rows.push(self.row_for(date, 0, &holiday_index));
        }
        for step in 1..=horizon_days {
            let date = self.end + Duration::days(i64::from(step));
            rows.push(self.row_for(date, step, &holiday_index));
        }

        Ok(rows)
    }

    fn last_date(&self) -> NaiveDate {
        self.end
    }

    fn components(&self) -> Vec<String> {
        let mut names = vec!["trend".to_string()];
        names.extend(self.seasonalities.iter().map(|s| s.name.to_string()));
        names.extend(self.holiday_names.iter().map(|h| format!("holiday:{}", h)));
        names
    }
}
