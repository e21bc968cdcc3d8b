use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::chart::{FONT_LARGE, FONT_MEDIUM, FONT_SMALL};
use crate::models::{
    BitcoinChartKind, BitcoinIntent, ChartData, ChartIntent, ChartKind, Figure, GenericIntent, HoverLabel, HoverMode,
    Layout, Metric, RenderableChart, TimeSeries,
};
use crate::utils::ChartError;

pub const CHART_WIDTH: u32 = 1400;
pub const CHART_HEIGHT: u32 = 700;

/// Pixels per font tier point on the 1400x700 canvas
const FONT_SCALE: f64 = 1.5;

const PALETTE: [RGBColor; 6] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
];

fn render_bitcoin(intent: &BitcoinIntent, series: Option<&TimeSeries>) -> Result<RenderableChart, ChartError> {
    let series = series.filter(|s| !s.is_empty()).ok_or(ChartError::EmptySeries)?;

    if intent.chart_kind == BitcoinChartKind::Bar {
        debug!("Bar requested for bitcoin data, drawing a line chart");
    }

    let x = series.points().iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect();
    let y = series
        .points()
        .iter()
        .map(|p| match intent.metric {
            Metric::Transactions => p.transaction_count as f64,
            Metric::BlockSize => p.size_mb,
        })
        .collect();

    let title = if intent.layout.title.trim().is_empty() {
        format!("Bitcoin {} (last {} days)", intent.metric, intent.days)
    } else {
        intent.layout.title.clone()
    };

    Ok(RenderableChart {
        figure: Figure::Line { x, y },
        layout: Layout {
            xaxis_title: "Date".to_string(),
            yaxis_title: intent.metric.axis_label().to_string(),
            hovermode: HoverMode::XUnified,
            ..Layout::titled(&title)
        },
    })
}

fn check_lengths(kind: &str, lengths: &[(&str, usize)]) -> Result<(), ChartError> {
    let Some(&(_, expected)) = lengths.first() else {
        return Ok(());
    };
    if expected == 0 {
        return Err(ChartError::InvalidData(format!("{} chart has no data points", kind)));
    }
    if lengths.iter().any(|&(_, len)| len != expected) {
        let detail = lengths
            .iter()
            .map(|(name, len)| format!("{}={}", name, len))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ChartError::InvalidData(format!("{} chart arrays differ in length ({})", kind, detail)));
    }
    Ok(())
}

fn render_generic(intent: &GenericIntent) -> Result<RenderableChart, ChartError> {
    let figure = match (intent.chart_kind, &intent.data) {
        (ChartKind::Line | ChartKind::Bar | ChartKind::Scatter, ChartData::Xy { x, y }) => {
            check_lengths("xy", &[("x", x.len()), ("y", y.len())])?;
            let x: Vec<String> = x.iter().map(ToString::to_string).collect();
            let y = y.clone();
            match intent.chart_kind {
                ChartKind::Line => Figure::Line { x, y },
                ChartKind::Bar => Figure::Bar { x, y },
                _ => Figure::Scatter { x, y },
            }
        }
        (ChartKind::Pie, ChartData::Slices { labels, values }) => {
            check_lengths("pie", &[("labels", labels.len()), ("values", values.len())])?;
            if values.iter().any(|v| *v < 0.0) || values.iter().sum::<f64>() <= 0.0 {
                return Err(ChartError::InvalidData(
                    "pie values must be non-negative with a positive total".to_string(),
                ));
            }
            Figure::Pie {
                labels: labels.clone(),
                values: values.clone(),
            }
        }
        (ChartKind::Scatter3d, ChartData::Xyz { x, y, z }) => {
            check_lengths("3d", &[("x", x.len()), ("y", y.len()), ("z", z.len())])?;
            Figure::Scatter3d {
                x: x.clone(),
                y: y.clone(),
                z: z.clone(),
            }
        }
        (kind, _) => {
            return Err(ChartError::InvalidData(format!("data does not match chart type {:?}", kind)));
        }
    };

    Ok(RenderableChart {
        figure,
        layout: Layout::titled(&intent.layout.title),
    })
}

/// Applied to every chart whichever branch built it: layout axis titles win
/// when given, and the shared hover styling is attached.
fn apply_common_layout(mut chart: RenderableChart, intent: &ChartIntent) -> RenderableChart {
    let requested = intent.layout();
    if let Some(title) = requested.xaxis_title.as_deref().filter(|t| !t.trim().is_empty()) {
        chart.layout.xaxis_title = title.to_string();
    }
    if let Some(title) = requested.yaxis_title.as_deref().filter(|t| !t.trim().is_empty()) {
        chart.layout.yaxis_title = title.to_string();
    }
    chart.layout.hoverlabel = Some(HoverLabel::default());
    chart
}

/// Pick the chart family for an intent and build the figure.
///
/// Bitcoin intents are always drawn as a line over the daily series, even
/// when a bar chart was asked for. An empty series is `EmptySeries`.
pub fn render(intent: &ChartIntent, series: Option<&TimeSeries>) -> Result<RenderableChart, ChartError> {
    let chart = match intent {
        ChartIntent::Bitcoin(bitcoin) => render_bitcoin(bitcoin, series)?,
        ChartIntent::Generic(generic) => render_generic(generic)?,
    };
    Ok(apply_common_layout(chart, intent))
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

fn font_px(tier: u32) -> f64 {
    f64::from(tier) * FONT_SCALE
}

/// Padded range covering `values`; bars always include zero
fn value_range(values: &[f64], include_zero: bool) -> (f64, f64) {
    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    let padding = ((max - min) * 0.1).max(1e-9);
    let padding = if max == min { 1.0 } else { padding };
    (min - padding, max + padding)
}

fn format_value(v: f64) -> String {
    if v.abs() >= 1000.0 {
        let whole = v.round() as i64;
        let digits = whole.abs().to_string();
        let mut grouped = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        if whole < 0 {
            format!("-{}", grouped)
        } else {
            grouped
        }
    } else {
        format!("{:.2}", v)
    }
}

/// All-numeric x values go on a continuous axis; anything else is categorical
fn x_positions(x: &[String]) -> (Vec<f64>, bool) {
    let numeric: Option<Vec<f64>> = x
        .iter()
        .map(|v| v.parse::<f64>().ok().filter(|f| f.is_finite()))
        .collect();
    match numeric {
        Some(values) if !values.is_empty() => (values, true),
        _ => ((0..x.len()).map(|i| i as f64).collect(), false),
    }
}

/// Bars take 80% of the narrowest gap between neighbouring positions
fn bar_half_width(positions: &[f64]) -> f64 {
    let mut sorted = positions.to_vec();
    sorted.sort_by(f64::total_cmp);
    let gap = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(f64::INFINITY, f64::min);
    if gap.is_finite() {
        gap * 0.4
    } else {
        0.4
    }
}

fn draw_cartesian(
    root: &DrawingArea<BitMapBackend, Shift>,
    figure: &Figure,
    layout: &Layout,
    style: &HoverLabel,
    x: &[String],
    y: &[f64],
) -> Result<(), ChartError> {
    let is_bar = matches!(figure, Figure::Bar { .. });
    let (y_min, y_max) = value_range(y, is_bar);
    let (positions, continuous) = x_positions(x);
    let half_width = bar_half_width(&positions);
    let (x_min, x_max) = if continuous {
        let (lo, hi) = value_range(&positions, false);
        let first = positions.iter().copied().fold(f64::INFINITY, f64::min);
        let last = positions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lo.min(first - half_width), hi.max(last + half_width))
    } else {
        (-0.5, x.len().max(1) as f64 - 0.5)
    };
    let text_color = rgb(style.font_color);
    let line_color = PALETTE[0];

    let mut chart = ChartBuilder::on(root)
        .caption(&layout.title, ("sans-serif", font_px(FONT_LARGE)).into_font().color(&text_color))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(render_err)?;

    let label_at = |v: &f64| {
        if continuous {
            return format_value(*v);
        }
        let index = v.round();
        if (v - index).abs() < 1e-6 && index >= 0.0 && (index as usize) < x.len() {
            x[index as usize].clone()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .x_desc(layout.xaxis_title.as_str())
        .y_desc(layout.yaxis_title.as_str())
        .x_labels(if continuous { 10 } else { x.len().min(12) })
        .y_labels(10)
        .x_label_formatter(&label_at)
        .y_label_formatter(&|v| format_value(*v))
        .label_style(("sans-serif", font_px(FONT_SMALL)).into_font().color(&text_color))
        .axis_desc_style(("sans-serif", font_px(FONT_MEDIUM)).into_font().color(&text_color))
        .axis_style(ShapeStyle::from(&rgb(style.bordercolor)).stroke_width(2))
        .light_line_style(ShapeStyle::from(&rgb(style.bgcolor)).stroke_width(1))
        .draw()
        .map_err(render_err)?;

    let points = positions.iter().zip(y).map(|(&px, &v)| (px, v));

    match figure {
        Figure::Line { .. } => {
            chart
                .draw_series(LineSeries::new(points.clone(), ShapeStyle::from(&line_color).stroke_width(3)))
                .map_err(render_err)?;
            if layout.hovermode == HoverMode::XUnified {
                chart
                    .draw_series(points.map(|p| Circle::new(p, 3, line_color.filled())))
                    .map_err(render_err)?;
            }
        }
        Figure::Bar { .. } => {
            let baseline = 0.0f64.clamp(y_min, y_max);
            chart
                .draw_series(points.map(|(px, v)| {
                    Rectangle::new([(px - half_width, baseline), (px + half_width, v)], line_color.filled())
                }))
                .map_err(render_err)?;
        }
        _ => {
            chart
                .draw_series(points.map(|p| Circle::new(p, 5, line_color.filled())))
                .map_err(render_err)?;
        }
    }

    Ok(())
}

fn draw_pie(
    root: &DrawingArea<BitMapBackend, Shift>,
    layout: &Layout,
    style: &HoverLabel,
    labels: &[String],
    values: &[f64],
) -> Result<(), ChartError> {
    let text_color = rgb(style.font_color);
    let area = root
        .titled(&layout.title, ("sans-serif", font_px(FONT_LARGE)).into_font().color(&text_color))
        .map_err(render_err)?;

    let (width, height) = area.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);
    let radius = f64::from(width.min(height)) * 0.38;
    let colors: Vec<RGBColor> = (0..values.len()).map(|i| PALETTE[i % PALETTE.len()]).collect();

    let mut pie = Pie::new(&center, &radius, values, &colors, labels);
    pie.label_style(("sans-serif", font_px(FONT_MEDIUM)).into_font().color(&text_color));
    area.draw(&pie).map_err(render_err)?;
    Ok(())
}

fn draw_scatter3d(
    root: &DrawingArea<BitMapBackend, Shift>,
    layout: &Layout,
    style: &HoverLabel,
    x: &[f64],
    y: &[f64],
    z: &[f64],
) -> Result<(), ChartError> {
    let (x_min, x_max) = value_range(x, false);
    let (y_min, y_max) = value_range(y, false);
    let (z_min, z_max) = value_range(z, false);

    let mut chart = ChartBuilder::on(root)
        .caption(&layout.title, ("sans-serif", font_px(FONT_LARGE)).into_font().color(&rgb(style.font_color)))
        .margin(20)
        .build_cartesian_3d(x_min..x_max, y_min..y_max, z_min..z_max)
        .map_err(render_err)?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.3;
        pb.scale = 0.8;
        pb.into_matrix()
    });

    chart.configure_axes().draw().map_err(render_err)?;

    chart
        .draw_series(
            x.iter()
                .zip(y)
                .zip(z)
                .map(|((&a, &b), &c)| Circle::new((a, b, c), 5, PALETTE[0].filled())),
        )
        .map_err(render_err)?;

    Ok(())
}

/// Draw a chart to a PNG at `path`
pub fn draw_png(chart: &RenderableChart, path: &Path, width: u32, height: u32) -> Result<(), ChartError> {
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let style = chart.layout.hoverlabel.clone().unwrap_or_default();
    match &chart.figure {
        Figure::Line { x, y } | Figure::Bar { x, y } | Figure::Scatter { x, y } => {
            draw_cartesian(&root, &chart.figure, &chart.layout, &style, x, y)?
        }
        Figure::Pie { labels, values } => draw_pie(&root, &chart.layout, &style, labels, values)?,
        Figure::Scatter3d { x, y, z } => draw_scatter3d(&root, &chart.layout, &style, x, y, z)?,
    }

    root.present().map_err(render_err)?;
    Ok(())
}

/// Write the chart to `<output_dir>/chart_<uuid>.png` and return the path
pub async fn save_chart(chart: RenderableChart, output_dir: &Path) -> Result<PathBuf, ChartError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ChartError::Render(format!("cannot create {}: {}", output_dir.display(), e)))?;

    let path = output_dir.join(format!("chart_{}.png", Uuid::new_v4()));
    let target = path.clone();

    tokio::task::spawn_blocking(move || draw_png(&chart, &target, CHART_WIDTH, CHART_HEIGHT))
        .await
        .map_err(|e| ChartError::Render(format!("drawing task failed: {}", e)))??;

    info!("Chart written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AxisValue, ChartLayout, DailyPoint};
    use crate::services::fetch_service::tests::day;

    fn bitcoin(metric: Metric, kind: BitcoinChartKind, layout: ChartLayout) -> ChartIntent {
        ChartIntent::Bitcoin(BitcoinIntent {
            metric,
            days: 3,
            chart_kind: kind,
            layout,
        })
    }

    fn series() -> TimeSeries {
        TimeSeries::from_points(vec![
            DailyPoint {
                date: day(2024, 1, 1),
                transaction_count: 10,
                size_mb: 1.25,
            },
            DailyPoint {
                date: day(2024, 1, 2),
                transaction_count: 20,
                size_mb: 2.5,
            },
        ])
    }

    fn generic(kind: ChartKind, data: ChartData) -> ChartIntent {
        ChartIntent::Generic(GenericIntent {
            chart_kind: kind,
            data,
            layout: ChartLayout {
                title: "T".to_string(),
                xaxis_title: Some("X".to_string()),
                yaxis_title: None,
            },
        })
    }

    #[test]
    fn test_bitcoin_renders_line_over_dates() {
        let chart = render(
            &bitcoin(Metric::BlockSize, BitcoinChartKind::Line, ChartLayout::default()),
            Some(&series()),
        )
        .expect("renders");

        assert_eq!(
            chart.figure,
            Figure::Line {
                x: vec!["2024-01-01".to_string(), "2024-01-02".to_string()],
                y: vec![1.25, 2.5],
            }
        );
        assert_eq!(chart.layout.xaxis_title, "Date");
        assert_eq!(chart.layout.yaxis_title, "Block size (MB)");
        assert_eq!(chart.layout.hovermode, HoverMode::XUnified);
        assert_eq!(chart.layout.title, "Bitcoin block_size (last 3 days)");
    }

    #[test]
    fn test_bitcoin_bar_request_still_draws_a_line() {
        let chart = render(
            &bitcoin(Metric::Transactions, BitcoinChartKind::Bar, ChartLayout::default()),
            Some(&series()),
        )
        .expect("renders");

        assert!(matches!(chart.figure, Figure::Line { .. }));
        assert_eq!(chart.layout.yaxis_title, "Transaction count");
    }

    #[test]
    fn test_bitcoin_empty_series_is_reported() {
        let intent = bitcoin(Metric::Transactions, BitcoinChartKind::Line, ChartLayout::default());
        assert_eq!(render(&intent, Some(&TimeSeries::default())), Err(ChartError::EmptySeries));
        assert_eq!(render(&intent, None), Err(ChartError::EmptySeries));
    }

    #[test]
    fn test_axis_titles_override_only_when_given() {
        let layout = ChartLayout {
            title: "Daily tx".to_string(),
            xaxis_title: Some("Day".to_string()),
            yaxis_title: Some("".to_string()),
        };
        let chart = render(&bitcoin(Metric::Transactions, BitcoinChartKind::Line, layout), Some(&series()))
            .expect("renders");

        assert_eq!(chart.layout.title, "Daily tx");
        assert_eq!(chart.layout.xaxis_title, "Day");
        assert_eq!(chart.layout.yaxis_title, "Transaction count");
    }

    #[test]
    fn test_pie_keeps_pairs_and_title() {
        let chart = render(
            &generic(
                ChartKind::Pie,
                ChartData::Slices {
                    labels: vec!["A".to_string(), "B".to_string()],
                    values: vec![1.0, 2.0],
                },
            ),
            None,
        )
        .expect("renders");

        assert_eq!(
            chart.figure,
            Figure::Pie {
                labels: vec!["A".to_string(), "B".to_string()],
                values: vec![1.0, 2.0],
            }
        );
        assert_eq!(chart.layout.title, "T");
    }

    #[test]
    fn test_styling_is_identical_across_branches() {
        let pie = render(
            &generic(
                ChartKind::Pie,
                ChartData::Slices {
                    labels: vec!["A".to_string()],
                    values: vec![1.0],
                },
            ),
            None,
        )
        .expect("renders");
        let line = render(
            &bitcoin(Metric::Transactions, BitcoinChartKind::Line, ChartLayout::default()),
            Some(&series()),
        )
        .expect("renders");

        let expected = Some(HoverLabel {
            font_size: 14,
            font_color: (0x2c, 0x3e, 0x50),
            bgcolor: (0xec, 0xf0, 0xf1),
            bordercolor: (0xbd, 0xc3, 0xc7),
        });
        assert_eq!(pie.layout.hoverlabel, expected);
        assert_eq!(line.layout.hoverlabel, expected);
        assert_eq!(pie.layout.xaxis_title, "X");
        assert_eq!(pie.layout.yaxis_title, "");
    }

    #[test]
    fn test_generic_kinds_map_to_figures() {
        let xy = ChartData::Xy {
            x: vec![AxisValue::Text("a".into()), AxisValue::Number(2.0)],
            y: vec![1.0, 2.0],
        };
        assert!(matches!(
            render(&generic(ChartKind::Bar, xy.clone()), None).map(|c| c.figure),
            Ok(Figure::Bar { x, .. }) if x == vec!["a".to_string(), "2".to_string()]
        ));
        assert!(matches!(
            render(&generic(ChartKind::Scatter, xy), None).map(|c| c.figure),
            Ok(Figure::Scatter { .. })
        ));

        let xyz = ChartData::Xyz {
            x: vec![1.0],
            y: vec![2.0],
            z: vec![3.0],
        };
        assert!(matches!(
            render(&generic(ChartKind::Scatter3d, xyz), None).map(|c| c.figure),
            Ok(Figure::Scatter3d { .. })
        ));
    }

    #[test]
    fn test_generic_length_mismatch_is_rejected() {
        let data = ChartData::Xy {
            x: vec![AxisValue::Number(1.0)],
            y: vec![1.0, 2.0],
        };
        assert!(matches!(
            render(&generic(ChartKind::Line, data), None),
            Err(ChartError::InvalidData(_))
        ));

        let empty = ChartData::Slices {
            labels: vec![],
            values: vec![],
        };
        assert!(matches!(
            render(&generic(ChartKind::Pie, empty), None),
            Err(ChartError::InvalidData(_))
        ));
    }

    #[test]
    fn test_numeric_x_is_continuous() {
        let x: Vec<String> = ["1", "5", "100"].iter().map(|s| s.to_string()).collect();
        assert_eq!(x_positions(&x), (vec![1.0, 5.0, 100.0], true));
        assert_eq!(bar_half_width(&[1.0, 5.0, 100.0]), 1.6);

        let x: Vec<String> = ["Mon", "2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(x_positions(&x), (vec![0.0, 1.0], false));
        assert_eq!(bar_half_width(&[0.0, 1.0]), 0.4);
        assert_eq!(bar_half_width(&[3.0]), 0.4);
    }

    #[test]
    fn test_value_range_and_format() {
        assert_eq!(value_range(&[5.0, 5.0], false), (4.0, 6.0));
        let (lo, hi) = value_range(&[10.0, 20.0], true);
        assert!(lo < 0.0 && hi > 20.0);
        assert_eq!(format_value(1234567.0), "1,234,567");
        assert_eq!(format_value(-1500.0), "-1,500");
        assert_eq!(format_value(12.3456), "12.35");
    }
}
