use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{ChartIntent, PartialFailure, RenderableChart, TimeSeries};
use crate::services::aggregate_service::aggregate;
use crate::services::chart_service::render;
use crate::services::fetch_service::{day_window, days_between, BlockSource, DailyBlockFetcher};
use crate::services::intent_service::{CompletionClient, IntentResolver};
use crate::utils::ChartError;

/// What one request produced
#[derive(Debug)]
pub enum ChartOutcome {
    Chart {
        chart: RenderableChart,
        /// Present on the Bitcoin path only
        series: Option<TimeSeries>,
        failures: Vec<PartialFailure>,
    },
    /// Nothing to draw; shown as a warning instead of a chart
    NoData { failures: Vec<PartialFailure> },
}

/// resolve -> fetch -> aggregate -> render, one request at a time
pub struct ChartPipeline<C: CompletionClient, S: BlockSource> {
    resolver: IntentResolver<C>,
    fetcher: DailyBlockFetcher<S>,
    day_workers: usize,
}

impl<C: CompletionClient, S: BlockSource> ChartPipeline<C, S> {
    pub fn new(completion: C, blocks: S, day_workers: usize) -> Self {
        Self {
            resolver: IntentResolver::new(completion),
            fetcher: DailyBlockFetcher::new(blocks),
            day_workers: day_workers.max(1),
        }
    }

    pub async fn run(&self, user_text: &str) -> Result<ChartOutcome, ChartError> {
        self.run_on(user_text, Utc::now().date_naive()).await
    }

    /// Like `run`, with the window ending on `today`
    pub async fn run_on(&self, user_text: &str, today: NaiveDate) -> Result<ChartOutcome, ChartError> {
        let request_id = Uuid::new_v4();
        info!("[{}] Resolving request: {:?}", request_id, user_text);

        let intent = self.resolver.resolve(user_text).await?;

        let ChartIntent::Bitcoin(bitcoin) = &intent else {
            let chart = render(&intent, None)?;
            info!("[{}] Rendered {} chart", request_id, chart.figure.kind_name());
            return Ok(ChartOutcome::Chart {
                chart,
                series: None,
                failures: Vec::new(),
            });
        };

        let (start, end) = day_window(bitcoin.days, today)?;
        let days = days_between(start, end);
        info!("[{}] Fetching {} days of blocks ({} to {})", request_id, days.len(), start, end);

        let fetched = self.fetcher.fetch_days(&days, self.day_workers).await;

        let mut records = Vec::new();
        let mut failures = Vec::new();
        for day in fetched {
            records.extend(day.records);
            if let Some(failure) = day.failure {
                warn!("[{}] Partial failure {}", request_id, failure);
                failures.push(failure);
            }
        }

        let series = aggregate(&records).clip(start, end);
        info!(
            "[{}] {} blocks aggregated into {} daily points, {} days failed",
            request_id,
            records.len(),
            series.len(),
            failures.len()
        );

        match render(&intent, Some(&series)) {
            Ok(chart) => Ok(ChartOutcome::Chart {
                chart,
                series: Some(series),
                failures,
            }),
            Err(ChartError::EmptySeries) => {
                warn!("[{}] No block data in range", request_id);
                Ok(ChartOutcome::NoData { failures })
            }
            Err(e) => Err(e),
        }
    }
}
