use std::path::Path;

use crate::models::{PartialFailure, TimeSeries};
use crate::services::chart_service::save_chart;
use crate::services::fetch_service::BlockSource;
use crate::services::intent_service::CompletionClient;
use crate::services::pipeline_service::{ChartOutcome, ChartPipeline};
use crate::utils::Table;

pub async fn execute<C: CompletionClient, S: BlockSource>(
    pipeline: &ChartPipeline<C, S>,
    output_dir: &Path,
    request: &str,
) -> Result<String, String> {
    let outcome = pipeline.run(request).await.map_err(|e| e.to_string())?;

    match outcome {
        ChartOutcome::Chart {
            chart,
            series,
            failures,
        } => {
            let kind = chart.figure.kind_name();
            let path = save_chart(chart, output_dir).await.map_err(|e| e.to_string())?;

            let mut lines = vec![format!("📊 {} chart saved to {}", kind, path.display())];
            if let Some(series) = &series {
                lines.push(series_table(series));
            }
            lines.extend(failure_lines(&failures));
            Ok(lines.join("\n"))
        }
        ChartOutcome::NoData { failures } => {
            let mut lines = vec!["⚠️ No data available for the selected date range".to_string()];
            lines.extend(failure_lines(&failures));
            Ok(lines.join("\n"))
        }
    }
}

pub fn series_table(series: &TimeSeries) -> String {
    let mut table = Table::new(&["Date", "Transactions", "Size (MB)"]);
    for point in series.points() {
        table.add_row(vec![
            point.date.format("%Y-%m-%d").to_string(),
            point.transaction_count.to_string(),
            format!("{:.2}", point.size_mb),
        ]);
    }
    table.render()
}

pub fn failure_lines(failures: &[PartialFailure]) -> Vec<String> {
    failures
        .iter()
        .map(|failure| format!("⚠️ Missing data for {}", failure))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyPoint;
    use crate::services::fetch_service::tests::{day, FakeSource};
    use crate::services::intent_service::tests::ScriptedModel;

    #[test]
    fn test_series_table_has_one_row_per_day() {
        let series = TimeSeries::from_points(vec![
            DailyPoint {
                date: day(2024, 5, 2),
                transaction_count: 412_000,
                size_mb: 1.5,
            },
            DailyPoint {
                date: day(2024, 5, 1),
                transaction_count: 7,
                size_mb: 0.125,
            },
        ]);

        let rendered = series_table(&series);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[2].starts_with("2024-05-01"));
        assert!(lines[2].ends_with("0.13") || lines[2].ends_with("0.12"));
        assert!(lines[3].contains("412000"));
        assert!(lines[3].ends_with("1.50"));
    }

    #[test]
    fn test_failure_lines() {
        let failures = vec![PartialFailure {
            day: day(2024, 5, 3),
            status: Some(500),
            reason: "internal error".to_string(),
        }];
        assert_eq!(
            failure_lines(&failures),
            vec!["⚠️ Missing data for 2024-05-03: HTTP 500 - internal error".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fatal_error_becomes_message() {
        let pipeline = ChartPipeline::new(ScriptedModel::answering("not json"), FakeSource::default(), 1);
        let err = execute(&pipeline, Path::new("unused"), "chart please")
            .await
            .expect_err("fails");
        assert!(err.starts_with("Could not understand the request"));
    }
}
