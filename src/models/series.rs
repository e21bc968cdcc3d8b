//! Daily time series models

use chrono::NaiveDate;

/// One UTC day's totals across every block mined that day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub transaction_count: u64,
    pub size_mb: f64,
}

/// Daily points, strictly increasing by date. Days without blocks are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    points: Vec<DailyPoint>,
}

impl TimeSeries {
    /// Sorts by date; callers guarantee dates are unique
    pub fn from_points(mut points: Vec<DailyPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep only points inside `[start, end]`
    pub fn clip(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.points.retain(|p| p.date >= start && p.date <= end);
        self
    }
}
