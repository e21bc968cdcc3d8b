use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::models::{
    AxisValue, BitcoinChartKind, BitcoinIntent, ChartData, ChartIntent, ChartKind, ChartLayout, GenericIntent,
    Metric, DEFAULT_DAYS,
};
use crate::utils::ResolutionError;

/// A language model that answers a prompt with one JSON object as text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete_json(&self, prompt: &str) -> Result<String, ResolutionError>;
}

/// Embed the user's words and the two-branch answer contract into one prompt
pub fn build_prompt(user_text: &str) -> String {
    format!(
        r#"User request: {user_text}

Answer with exactly one JSON object and nothing else.

A. If the request is about real historical Bitcoin blockchain data, return:
{{
    "data_type": "bitcoin",
    "chart_type": "line|bar",
    "metric": "transactions|block_size",
    "days": 30,
    "layout": {{"title": "Chart title", "xaxis_title": "X axis label", "yaxis_title": "Y axis label"}}
}}

B. Otherwise invent suitable data and return:
{{
    "chart_type": "line|bar|pie|scatter|3d",
    "data": {{
        "x": [...],
        "y": [...],
        "z": [...],
        "labels": [...],
        "values": [...]
    }},
    "layout": {{"title": "Chart title", "xaxis_title": "X axis label", "yaxis_title": "Y axis label"}}
}}
Use x/y for line, bar and scatter; labels/values for pie; x/y/z for 3d."#
    )
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ResolutionError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ResolutionError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ResolutionError::InvalidValue {
            field,
            value: other.to_string(),
        }),
    }
}

fn optional_text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_layout(root: &Map<String, Value>) -> ChartLayout {
    let Some(Value::Object(layout)) = root.get("layout") else {
        return ChartLayout::default();
    };

    ChartLayout {
        title: optional_text(layout, "title").unwrap_or_default(),
        xaxis_title: optional_text(layout, "xaxis_title"),
        yaxis_title: optional_text(layout, "yaxis_title"),
    }
}

/// `1000.0` and `1e4` count as whole numbers; `45.5` does not
fn whole_number(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then(|| value as i64)
}

/// Missing, null or non-integer `days` falls back to the default
fn parse_days(root: &Map<String, Value>) -> Result<u64, ResolutionError> {
    let days = match root.get("days") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|v| v.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().and_then(whole_number)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    };

    match days {
        None => Ok(DEFAULT_DAYS),
        Some(d) if d > 0 => Ok(d as u64),
        Some(d) => Err(ResolutionError::InvalidValue {
            field: "days",
            value: d.to_string(),
        }),
    }
}

fn array<'a>(data: &'a Map<String, Value>, field: &'static str) -> Result<&'a Vec<Value>, ResolutionError> {
    match data.get(field) {
        None | Some(Value::Null) => Err(ResolutionError::MissingField(field)),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ResolutionError::InvalidValue {
            field,
            value: other.to_string(),
        }),
    }
}

fn numbers(data: &Map<String, Value>, field: &'static str) -> Result<Vec<f64>, ResolutionError> {
    array(data, field)?
        .iter()
        .map(|v| {
            let number = match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            number.ok_or_else(|| ResolutionError::InvalidValue {
                field,
                value: v.to_string(),
            })
        })
        .collect()
}

fn axis_values(data: &Map<String, Value>, field: &'static str) -> Result<Vec<AxisValue>, ResolutionError> {
    array(data, field)?
        .iter()
        .map(|v| {
            serde_json::from_value::<AxisValue>(v.clone()).map_err(|_| ResolutionError::InvalidValue {
                field,
                value: v.to_string(),
            })
        })
        .collect()
}

fn labels(data: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, ResolutionError> {
    Ok(axis_values(data, field)?.iter().map(ToString::to_string).collect())
}

fn parse_bitcoin(root: &Map<String, Value>) -> Result<ChartIntent, ResolutionError> {
    let chart_type = required_str(root, "chart_type")?;
    let chart_kind =
        BitcoinChartKind::parse(chart_type).ok_or_else(|| ResolutionError::UnsupportedChartKind(chart_type.to_string()))?;

    let metric_raw = required_str(root, "metric")?;
    let metric = Metric::parse(metric_raw).ok_or_else(|| ResolutionError::InvalidValue {
        field: "metric",
        value: metric_raw.to_string(),
    })?;

    Ok(ChartIntent::Bitcoin(BitcoinIntent {
        metric,
        days: parse_days(root)?,
        chart_kind,
        layout: parse_layout(root),
    }))
}

fn parse_generic(root: &Map<String, Value>) -> Result<ChartIntent, ResolutionError> {
    let chart_type = required_str(root, "chart_type")?;
    let chart_kind =
        ChartKind::parse(chart_type).ok_or_else(|| ResolutionError::UnsupportedChartKind(chart_type.to_string()))?;

    let data = match root.get("data") {
        None | Some(Value::Null) => return Err(ResolutionError::MissingField("data")),
        Some(Value::Object(data)) => data,
        Some(other) => {
            return Err(ResolutionError::InvalidValue {
                field: "data",
                value: other.to_string(),
            })
        }
    };

    let data = match chart_kind {
        ChartKind::Line | ChartKind::Bar | ChartKind::Scatter => ChartData::Xy {
            x: axis_values(data, "x")?,
            y: numbers(data, "y")?,
        },
        ChartKind::Pie => ChartData::Slices {
            labels: labels(data, "labels")?,
            values: numbers(data, "values")?,
        },
        ChartKind::Scatter3d => ChartData::Xyz {
            x: numbers(data, "x")?,
            y: numbers(data, "y")?,
            z: numbers(data, "z")?,
        },
    };

    Ok(ChartIntent::Generic(GenericIntent {
        chart_kind,
        data,
        layout: parse_layout(root),
    }))
}

/// Validate the model's answer into a typed intent.
///
/// Only shape and enum values are checked here; whether arrays line up is
/// the renderer's concern.
pub fn parse_intent(content: &str) -> Result<ChartIntent, ResolutionError> {
    let value: Value = serde_json::from_str(content.trim()).map_err(|e| ResolutionError::InvalidJson(e.to_string()))?;

    let Value::Object(root) = value else {
        return Err(ResolutionError::InvalidJson("expected a JSON object".to_string()));
    };

    let is_bitcoin = matches!(
        root.get("data_type"),
        Some(Value::String(kind)) if kind.trim().eq_ignore_ascii_case("bitcoin")
    );

    if is_bitcoin {
        parse_bitcoin(&root)
    } else {
        parse_generic(&root)
    }
}

/// Turns free text into a chart intent through a language model
pub struct IntentResolver<C: CompletionClient> {
    client: C,
}

impl<C: CompletionClient> IntentResolver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, user_text: &str) -> Result<ChartIntent, ResolutionError> {
        let prompt = build_prompt(user_text);
        let content = self.client.complete_json(&prompt).await?;
        debug!("Model answered with {} bytes", content.len());

        let intent = parse_intent(&content)?;
        match &intent {
            ChartIntent::Bitcoin(b) => info!("Resolved bitcoin intent: metric={} days={}", b.metric, b.days),
            ChartIntent::Generic(g) => info!("Resolved generic intent: {:?}", g.chart_kind),
        }
        Ok(intent)
    }
}
