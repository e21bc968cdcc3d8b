use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use futures::stream::{self, StreamExt};
use rand::Rng;
use tracing::{debug, warn};

use crate::api::bitaps::{ApiError, BitapsClient, BlockPage};
use crate::config::AppConfig;
use crate::models::{DayFetch, PartialFailure, MAX_DAYS};
use crate::utils::ChartError;

/// Blocks per page
pub const PAGE_LIMIT: u32 = 100;
/// Stops a server that always reports another page
pub const MAX_PAGES_PER_DAY: usize = 50;
/// Extra attempts for a page answered with 429
pub const MAX_RATE_LIMIT_RETRIES: u32 = 2;
const DEFAULT_RETRY_AFTER_MS: u64 = 1000;
/// Longest server-requested wait honoured before giving up on the page
pub const MAX_RETRY_WAIT_MS: u64 = AppConfig::REQUEST_TIMEOUT_SECS * 1000;

/// Paged access to one day's block listing
#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn fetch_page(&self, day: NaiveDate, limit: u32, offset: u32) -> Result<BlockPage, ApiError>;
}

#[async_trait]
impl BlockSource for BitapsClient {
    async fn fetch_page(&self, day: NaiveDate, limit: u32, offset: u32) -> Result<BlockPage, ApiError> {
        self.get_day_blocks(day, limit, offset).await
    }
}

/// The `days` UTC calendar days ending on `today`, inclusive.
/// Rejected before any request when `days` exceeds the supported history.
pub fn day_window(days: u64, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ChartError> {
    if days > MAX_DAYS {
        return Err(ChartError::RangeTooLarge { days, max: MAX_DAYS });
    }
    if days == 0 {
        return Err(ChartError::InvalidData("at least one day must be requested".to_string()));
    }
    let start = today - Duration::days(days as i64 - 1);
    Ok((start, today))
}

/// Every calendar day from `start` to `end`, inclusive
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Walks a day's listing page by page. Expected failures never escape as
/// errors: they end the day with a `PartialFailure` and keep earlier pages.
pub struct DailyBlockFetcher<S: BlockSource> {
    source: S,
}

impl<S: BlockSource> DailyBlockFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    async fn fetch_page_with_retry(&self, day: NaiveDate, offset: u32) -> Result<BlockPage, ApiError> {
        let mut attempt = 0;
        loop {
            match self.source.fetch_page(day, PAGE_LIMIT, offset).await {
                Err(ApiError::RateLimited { retry_after_ms, message }) if attempt < MAX_RATE_LIMIT_RETRIES => {
                    let requested = retry_after_ms.unwrap_or(DEFAULT_RETRY_AFTER_MS);
                    if requested > MAX_RETRY_WAIT_MS {
                        warn!("{} offset {} rate limited for {}ms, not retrying", day, offset, requested);
                        return Err(ApiError::RateLimited { retry_after_ms, message });
                    }
                    attempt += 1;
                    let jitter = rand::thread_rng().gen_range(0..250);
                    let wait = requested.saturating_add(jitter);
                    debug!("{} offset {} rate limited, retry {} in {}ms", day, offset, attempt, wait);
                    tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
                }
                other => return other,
            }
        }
    }

    pub async fn fetch_day(&self, day: NaiveDate) -> DayFetch {
        let mut fetched = DayFetch::default();
        let mut offset: u32 = 0;

        loop {
            if fetched.pages >= MAX_PAGES_PER_DAY {
                warn!("{}: stopping after {} pages", day, fetched.pages);
                fetched.failure = Some(PartialFailure {
                    day,
                    status: None,
                    reason: format!("stopped after {} pages", MAX_PAGES_PER_DAY),
                });
                break;
            }

            match self.fetch_page_with_retry(day, offset).await {
                Ok(page) => {
                    fetched.pages += 1;
                    let received = page.records.len();
                    fetched.records.extend(page.records);

                    if !page.has_next || received == 0 {
                        break;
                    }
                    offset += PAGE_LIMIT;
                }
                Err(e) => {
                    warn!("{}: fetch failed at offset {}: {}", day, offset, e);
                    fetched.failure = Some(PartialFailure {
                        day,
                        status: e.status(),
                        reason: e.message().to_string(),
                    });
                    break;
                }
            }
        }

        debug!("{}: {} blocks over {} pages", day, fetched.records.len(), fetched.pages);
        fetched
    }

    /// Fetch every day in `days`, at most `workers` at a time.
    /// Results come back in the same order as `days`.
    pub async fn fetch_days(&self, days: &[NaiveDate], workers: usize) -> Vec<DayFetch> {
        stream::iter(days.iter().copied())
            .map(|day| self.fetch_day(day))
            .buffered(workers.max(1))
            .collect()
            .await
    }
}
