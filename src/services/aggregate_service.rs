use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{DailyPoint, RawBlockRecord, TimeSeries};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Sum blocks into one point per UTC day.
///
/// Returns the series and how many records were skipped for missing fields.
pub fn aggregate_counted(records: &[RawBlockRecord]) -> (TimeSeries, usize) {
    let mut by_day: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    let mut skipped = 0;

    for record in records {
        let (Some(timestamp), Some(transactions), Some(size_bytes)) =
            (record.timestamp, record.transaction_count, record.size_bytes)
        else {
            skipped += 1;
            continue;
        };

        let totals = by_day.entry(timestamp.date_naive()).or_insert((0, 0));
        totals.0 = totals.0.saturating_add(transactions);
        totals.1 = totals.1.saturating_add(size_bytes);
    }

    let points = by_day
        .into_iter()
        .map(|(date, (transaction_count, size_bytes))| DailyPoint {
            date,
            transaction_count,
            size_mb: size_bytes as f64 / BYTES_PER_MB,
        })
        .collect();

    (TimeSeries::from_points(points), skipped)
}

/// Daily series over `records`; malformed records are skipped and counted in the log
pub fn aggregate(records: &[RawBlockRecord]) -> TimeSeries {
    let (series, skipped) = aggregate_counted(records);
    if skipped > 0 {
        debug!("Skipped {} block records with missing fields", skipped);
    }
    series
}
