//! Regional holiday calendars used as calendar effects by the forecasting engine
//!
//! A calendar only answers "which named holidays fall between two dates".
//! The engine turns each holiday name seen in the training window into its
//! own regressor.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single occurrence of a named holiday
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub name: &'static str,
    pub date: NaiveDate,
}

/// Source of holiday dates
pub trait HolidayCalendar: Send + Sync {
    /// Holidays falling within `start..=end`, ascending by date
    fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Holiday>;
}

/// Countries with a built-in holiday calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "IN")]
    India,
}

impl Country {
    /// ISO 3166-1 alpha-2 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::India => "IN",
        }
    }

    /// Years for which lunisolar festival dates are tabulated
    ///
    /// Outside this range only fixed-date holidays are reported.
    pub fn lunar_table_years(&self) -> RangeInclusive<i32> {
        match self {
            Self::India => 2020..=2030,
        }
    }
}

impl std::str::FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IN" | "IND" | "INDIA" => Ok(Self::India),
            _ => Err(format!("No holiday calendar for country: {}", s)),
        }
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// National holidays on the same Gregorian date every year
const INDIA_FIXED: &[(&str, u32, u32)] = &[
    ("Republic Day", 1, 26),
    ("Independence Day", 8, 15),
    ("Gandhi Jayanti", 10, 2),
    ("Christmas", 12, 25),
];

/// Lunisolar festivals, (year, month, day)
const INDIA_HOLI: &[(i32, u32, u32)] = &[
    (2020, 3, 10),
    (2021, 3, 29),
    (2022, 3, 18),
    (2023, 3, 8),
    (2024, 3, 25),
    (2025, 3, 14),
    (2026, 3, 4),
    (2027, 3, 22),
    (2028, 3, 11),
    (2029, 3, 1),
    (2030, 3, 20),
];

const INDIA_DIWALI: &[(i32, u32, u32)] = &[
    (2020, 11, 14),
    (2021, 11, 4),
    (2022, 10, 24),
    (2023, 11, 12),
    (2024, 10, 31),
    (2025, 10, 20),
    (2026, 11, 8),
    (2027, 10, 29),
    (2028, 10, 17),
    (2029, 11, 5),
    (2030, 10, 26),
];

impl HolidayCalendar for Country {
    fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Holiday> {
        if end < start {
            return Vec::new();
        }

        let mut found = Vec::new();
        let in_range = |d: &NaiveDate| *d >= start && *d <= end;

        match self {
            Self::India => {
                let covered = self.lunar_table_years();
                if !covered.contains(&start.year()) || !covered.contains(&end.year()) {
                    debug!(
                        start = %start,
                        end = %end,
                        "Range extends past tabulated festival years {}..={}, Holi and Diwali may be missing",
                        covered.start(),
                        covered.end()
                    );
                }

                for year in start.year()..=end.year() {
                    for &(name, month, day) in INDIA_FIXED {
                        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                            if in_range(&date) {
                                found.push(Holiday { name, date });
                            }
                        }
                    }
                }

                for (name, table) in [("Holi", INDIA_HOLI), ("Diwali", INDIA_DIWALI)] {
                    for &(year, month, day) in table {
                        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                            if in_range(&date) {
                                found.push(Holiday { name, date });
                            }
                        }
                    }
                }
            }
        }

        found.sort_by_key(|h| h.date);
        found
    }
}
