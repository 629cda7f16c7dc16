//! Domain models for Spendcast

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a user identifier in raw bytes (ObjectId layout)
pub const USER_ID_BYTES: usize = 12;

/// Storage-native user identifier: 12 bytes written as 24 hex characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId([u8; USER_ID_BYTES]);

/// Why a string was rejected as a user identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    #[error("expected 24 hex characters, got {0}")]
    Length(usize),

    #[error("invalid hex character in identifier")]
    Hex,
}

impl UserId {
    pub fn bytes(&self) -> &[u8; USER_ID_BYTES] {
        &self.0
    }

    /// Lowercase hex form, as stored in the database
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() != USER_ID_BYTES * 2 {
            return Err(UserIdError::Length(s.len()));
        }
        let mut bytes = [0u8; USER_ID_BYTES];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| UserIdError::Hex)?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for UserId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Amount and timestamp of a stored expense, the only fields forecasting reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseRecord {
    pub amount: f64,
    pub date: NaiveDateTime,
}

impl ExpenseRecord {
    pub fn new(amount: f64, date: NaiveDateTime) -> Self {
        Self { amount, date }
    }

    /// Record at midnight of the given day
    pub fn on_day(amount: f64, day: NaiveDate) -> Self {
        Self {
            amount,
            date: day.and_time(chrono::NaiveTime::MIN),
        }
    }
}

/// Sum of all expenses on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total_amount: f64,
}

/// One future day of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_amount: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Response body for a successful forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastPoint>,
    pub total_predicted_spend: f64,
}

/// How an expense was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    #[default]
    Cash,
    Card,
    Upi,
    NetBanking,
    Other,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Upi => "upi",
            Self::NetBanking => "net_banking",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "cash" => Ok(Self::Cash),
            "card" | "credit_card" | "debit_card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "net_banking" | "netbanking" => Ok(Self::NetBanking),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment mode: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored expense
#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: UserId,
    pub title: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
    pub date: NaiveDateTime,
    pub payment_mode: PaymentMode,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new expense to insert
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub user_id: UserId,
    pub title: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
    pub date: NaiveDateTime,
    pub payment_mode: PaymentMode,
    pub description: Option<String>,
    /// Deduplication key; rows with an existing hash are skipped
    pub import_hash: String,
}
