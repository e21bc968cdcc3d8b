//! Data models shared by the chart pipeline
//!
//! Every value here is created fresh for one request and dropped once the
//! chart has been written.

pub mod block;
pub mod chart;
pub mod intent;
pub mod series;

pub use block::{DayFetch, PartialFailure, RawBlockRecord};
pub use chart::{Figure, HoverLabel, HoverMode, Layout, RenderableChart};
pub use intent::{
    AxisValue, BitcoinChartKind, BitcoinIntent, ChartData, ChartIntent, ChartKind, ChartLayout,
    GenericIntent, Metric, DEFAULT_DAYS, MAX_DAYS,
};
pub use series::{DailyPoint, TimeSeries};
