//! Structured chart intents resolved from free text

use serde::Deserialize;
use std::fmt;

/// Days of history requested when the model does not say
pub const DEFAULT_DAYS: u64 = 30;
/// Furthest back the blockchain endpoint can go
pub const MAX_DAYS: u64 = 730;

/// Block statistic plotted on the Bitcoin path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Transactions,
    BlockSize,
}

impl Metric {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "transactions" => Some(Metric::Transactions),
            "block_size" => Some(Metric::BlockSize),
            _ => None,
        }
    }

    /// Y-axis label for this metric
    pub fn axis_label(&self) -> &'static str {
        match self {
            Metric::Transactions => "Transaction count",
            Metric::BlockSize => "Block size (MB)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Transactions => write!(f, "transactions"),
            Metric::BlockSize => write!(f, "block_size"),
        }
    }
}

/// Chart families the Bitcoin path accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitcoinChartKind {
    Line,
    Bar,
}

impl BitcoinChartKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "line" => Some(BitcoinChartKind::Line),
            "bar" => Some(BitcoinChartKind::Bar),
            _ => None,
        }
    }
}

/// Chart families the generic path accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    /// "3d" on the wire
    Scatter3d,
}

impl ChartKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "line" => Some(ChartKind::Line),
            "bar" => Some(ChartKind::Bar),
            "pie" => Some(ChartKind::Pie),
            "scatter" => Some(ChartKind::Scatter),
            "3d" => Some(ChartKind::Scatter3d),
            _ => None,
        }
    }
}

/// Title and axis labels the model asked for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartLayout {
    pub title: String,
    pub xaxis_title: Option<String>,
    pub yaxis_title: Option<String>,
}

/// An x-axis value; the model sends categories or numbers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            AxisValue::Number(n) => write!(f, "{}", n),
            AxisValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Data arrays for a generic chart, shaped by its chart kind.
/// Array lengths are not checked here; rendering does that.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// line, bar and scatter
    Xy { x: Vec<AxisValue>, y: Vec<f64> },
    /// pie
    Slices { labels: Vec<String>, values: Vec<f64> },
    /// 3d
    Xyz { x: Vec<f64>, y: Vec<f64>, z: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitcoinIntent {
    pub metric: Metric,
    pub days: u64,
    pub chart_kind: BitcoinChartKind,
    pub layout: ChartLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericIntent {
    pub chart_kind: ChartKind,
    pub data: ChartData,
    pub layout: ChartLayout,
}

/// What to draw: real Bitcoin block data, or data the model supplied itself
#[derive(Debug, Clone, PartialEq)]
pub enum ChartIntent {
    Bitcoin(BitcoinIntent),
    Generic(GenericIntent),
}

impl ChartIntent {
    pub fn layout(&self) -> &ChartLayout {
        match self {
            ChartIntent::Bitcoin(intent) => &intent.layout,
            ChartIntent::Generic(intent) => &intent.layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_kind_parse() {
        assert_eq!(ChartKind::parse("3d"), Some(ChartKind::Scatter3d));
        assert_eq!(ChartKind::parse(" Pie "), Some(ChartKind::Pie));
        assert_eq!(ChartKind::parse("heatmap"), None);
        assert_eq!(BitcoinChartKind::parse("pie"), None);
    }

    #[test]
    fn test_metric_labels() {
        assert_eq!(Metric::parse("block_size"), Some(Metric::BlockSize));
        assert_eq!(Metric::parse("hashrate"), None);
        assert_eq!(Metric::Transactions.axis_label(), "Transaction count");
        assert_eq!(Metric::BlockSize.to_string(), "block_size");
    }

    #[test]
    fn test_axis_value_display() {
        assert_eq!(AxisValue::Number(3.0).to_string(), "3");
        assert_eq!(AxisValue::Number(2.5).to_string(), "2.5");
        assert_eq!(AxisValue::Text("Mon".into()).to_string(), "Mon");
    }
}
