//! Spendcast Core Library
//!
//! Shared functionality for the Spendcast spending forecaster:
//! - Database access and migrations
//! - CSV import for expense exports
//! - Daily aggregation of expense records
//! - Additive forecasting engine with holiday effects
//! - Forecast request handling behind a pluggable repository

pub mod aggregate;
pub mod db;
pub mod error;
pub mod forecast;
pub mod holidays;
pub mod import;
pub mod models;
pub mod predict;
pub mod repository;

pub use aggregate::aggregate_daily;
pub use db::Database;
pub use error::{Error, Result};
pub use forecast::{AdditiveEngine, EngineConfig, EngineError, ForecastingEngine, Seasonality};
pub use holidays::{Country, HolidayCalendar};
pub use models::{
    DailyAggregate, Expense, ExpenseRecord, ForecastPoint, ForecastResponse, NewExpense,
    PaymentMode, UserId, UserIdError,
};
pub use predict::{Forecaster, PredictError, HORIZON_DAYS, MIN_RECORDS};
pub use repository::{ExpenseRepository, InMemoryRepository};
