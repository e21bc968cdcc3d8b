//! Raw block listings and per-day fetch outcomes

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// One block as reported by the day listing. Fields the server omitted or
/// sent malformed stay `None`; aggregation skips such records.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlockRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub transaction_count: Option<u64>,
    pub size_bytes: Option<u64>,
}

/// A day whose fetch stopped early. Pages collected before the failure are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialFailure {
    pub day: NaiveDate,
    pub status: Option<u16>,
    pub reason: String,
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}: HTTP {} - {}", self.day, status, self.reason),
            None => write!(f, "{}: {}", self.day, self.reason),
        }
    }
}

/// Everything one day's fetch produced
#[derive(Debug, Clone, Default)]
pub struct DayFetch {
    pub records: Vec<RawBlockRecord>,
    pub failure: Option<PartialFailure>,
    pub pages: usize,
}
