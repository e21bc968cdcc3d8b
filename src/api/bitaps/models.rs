use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::RawBlockRecord;

/// Body of GET /blocks/day/{YYYYMMDD}
#[derive(Debug, Clone, Deserialize)]
pub struct DayBlocksResponse {
    pub data: Option<DayBlocksData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayBlocksData {
    /// Kept as raw JSON so one malformed block does not sink the page
    #[serde(default)]
    pub blocks: Vec<Value>,
    pub pagination: Option<Pagination>,
    /// Some deployments put the flag next to `blocks`
    pub next_page: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub next_page: Option<bool>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub message: Option<String>,
    pub error: Option<String>,
    pub retry_after: Option<u64>,
}

/// One page of a day's listing
#[derive(Debug, Clone)]
pub struct BlockPage {
    pub records: Vec<RawBlockRecord>,
    pub has_next: bool,
}

impl DayBlocksResponse {
    /// Converts to a page. Without an explicit flag, a full page implies another one.
    pub fn into_page(self, limit: u32) -> BlockPage {
        let Some(data) = self.data else {
            return BlockPage {
                records: Vec::new(),
                has_next: false,
            };
        };

        let explicit = data
            .pagination
            .as_ref()
            .and_then(|p| p.next_page)
            .or(data.next_page);
        let has_next = explicit.unwrap_or(data.blocks.len() >= limit as usize);

        BlockPage {
            records: data.blocks.iter().map(block_from_value).collect(),
            has_next,
        }
    }
}

fn field<'a>(block: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| block.get(*name)).filter(|v| !v.is_null())
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts unix seconds, or an RFC 3339 / `YYYY-MM-DD HH:MM:SS` string in UTC
fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return Utc.timestamp_opt(secs, 0).single();
            }
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(|naive| Utc.from_utc_datetime(&naive))
                })
        }
        _ => None,
    }
}

/// Map a block JSON object to a record; unknown shapes become empty fields
pub fn block_from_value(block: &Value) -> RawBlockRecord {
    RawBlockRecord {
        timestamp: field(block, &["timestamp", "time", "blockTime"]).and_then(as_timestamp),
        transaction_count: field(block, &["transaction_count", "transactions", "transactionsCount", "tx_count"])
            .and_then(as_count),
        size_bytes: field(block, &["size", "size_bytes"]).and_then(as_count),
    }
}
