use chrono::NaiveDate;
use reqwest::Client as HttpClient;
use std::fmt;
use tracing::{debug, warn};

use super::models::{BlockPage, DayBlocksResponse, ErrorResponse};
use crate::utils::RateLimiter;

/// Failure of a single page request
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 404 Not Found
    NotFound(String),
    /// 429 Too Many Requests
    RateLimited { retry_after_ms: Option<u64>, message: String },
    /// 5xx Server Error
    ServerError(u16, String),
    /// Other HTTP errors
    HttpError(u16, String),
    /// Network failure or timeout
    RequestError(String),
    /// Body did not match the expected shape
    DeserializationError(String),
}

impl ApiError {
    /// HTTP status behind this error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::ServerError(code, _) | ApiError::HttpError(code, _) => Some(*code),
            ApiError::RequestError(_) | ApiError::DeserializationError(_) => None,
        }
    }

    /// Server-provided message, or a description of what went wrong
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServerError(_, msg)
            | ApiError::HttpError(_, msg)
            | ApiError::RequestError(msg)
            | ApiError::DeserializationError(msg) => msg,
            ApiError::RateLimited { message, .. } => message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::RateLimited { retry_after_ms, message } => match retry_after_ms {
                Some(ms) => write!(f, "Rate Limited: {} (retry after {} ms)", message, ms),
                None => write!(f, "Rate Limited: {}", message),
            },
            ApiError::ServerError(code, msg) => write!(f, "Server Error ({}): {}", code, msg),
            ApiError::HttpError(code, msg) => write!(f, "HTTP Error ({}): {}", code, msg),
            ApiError::RequestError(msg) => write!(f, "Request Error: {}", msg),
            ApiError::DeserializationError(msg) => write!(f, "Deserialization Error: {}", msg),
        }
    }
}

/// Client for the per-day block listing of the Bitaps blockchain API
pub struct BitapsClient {
    http_client: HttpClient,
    base_url: String,
    limiter: RateLimiter,
}

impl BitapsClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.bitaps.com/btc/v1/blockchain";

    /// `http_client` carries the timeout and proxy settings
    pub fn with_base_url(http_client: HttpClient, base_url: String, requests_per_second: usize) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::per_second(requests_per_second),
        }
    }

    fn day_url(&self, day: NaiveDate) -> String {
        format!("{}/blocks/day/{}", self.base_url, day.format("%Y%m%d"))
    }

    /// Map a non-2xx response to an error, keeping the server's `message`
    async fn handle_error_response(status: reqwest::StatusCode, response: reqwest::Response) -> ApiError {
        let status_code = status.as_u16();
        let header_retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        let body_text = response.text().await.unwrap_or_default();

        let parsed = serde_json::from_str::<ErrorResponse>(&body_text).ok();
        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone().or_else(|| e.error.clone()))
            .unwrap_or_else(|| {
                if body_text.trim().is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    body_text.clone()
                }
            });

        match status_code {
            400 => ApiError::BadRequest(message),
            404 => ApiError::NotFound(message),
            429 => {
                let retry_after_ms = header_retry_after.or_else(|| parsed.and_then(|e| e.retry_after));
                warn!("Rate limited by blockchain API, retry after {:?} ms", retry_after_ms);
                ApiError::RateLimited { retry_after_ms, message }
            }
            500..=599 => {
                warn!("Server error {}: {}", status_code, message);
                ApiError::ServerError(status_code, message)
            }
            _ => ApiError::HttpError(status_code, message),
        }
    }

    /// GET /blocks/day/{YYYYMMDD}?limit={limit}&offset={offset}
    ///
    /// Retrieves one page of the blocks mined on a UTC calendar day.
    ///
    /// # Arguments
    /// * `day` - The UTC day to list
    /// * `limit` - Maximum blocks in the page
    /// * `offset` - Blocks to skip, a multiple of `limit` when walking the day
    ///
    /// # Returns
    /// * `Ok(BlockPage)` - Parsed records and whether another page follows
    /// * `Err(ApiError)` - Status-mapped error, with retry-after on 429
    pub async fn get_day_blocks(&self, day: NaiveDate, limit: u32, offset: u32) -> Result<BlockPage, ApiError> {
        self.limiter.acquire().await;

        let url = self.day_url(day);
        debug!("GET {} limit={} offset={}", url, limit, offset);

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::RequestError(format!("Request timed out: {}", e))
                } else {
                    ApiError::RequestError(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        response
            .json::<DayBlocksResponse>()
            .await
            .map(|body| body.into_page(limit))
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_url_is_path_encoded() {
        let client = BitapsClient::with_base_url(HttpClient::new(), "http://localhost:9/btc/".to_string(), 5);
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
        assert_eq!(client.day_url(day), "http://localhost:9/btc/blocks/day/20240309");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError::ServerError(503, "down".into()).status(), Some(503));
        assert_eq!(ApiError::RequestError("timeout".into()).status(), None);
        let limited = ApiError::RateLimited {
            retry_after_ms: Some(1000),
            message: "slow down".into(),
        };
        assert_eq!(limited.status(), Some(429));
        assert_eq!(limited.message(), "slow down");
    }

    fn response(status: u16, retry_after: Option<&str>, body: &str) -> reqwest::Response {
        let mut builder = http::Response::builder().status(status);
        if let Some(value) = retry_after {
            builder = builder.header("Retry-After", value);
        }
        reqwest::Response::from(builder.body(body.to_string()).expect("valid response"))
    }

    async fn map_error(status: u16, retry_after: Option<&str>, body: &str) -> ApiError {
        let response = response(status, retry_after, body);
        BitapsClient::handle_error_response(response.status(), response).await
    }

    #[tokio::test]
    async fn test_server_message_takes_precedence() {
        assert_eq!(
            map_error(400, None, r#"{"message": "invalid date", "error": "bad"}"#).await,
            ApiError::BadRequest("invalid date".to_string())
        );
        assert_eq!(
            map_error(404, None, r#"{"error": "no blocks"}"#).await,
            ApiError::NotFound("no blocks".to_string())
        );
        assert_eq!(
            map_error(502, None, "<html>bad gateway</html>").await,
            ApiError::ServerError(502, "<html>bad gateway</html>".to_string())
        );
        assert_eq!(
            map_error(418, None, "").await,
            ApiError::HttpError(418, "I'm a teapot".to_string())
        );
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        assert_eq!(
            map_error(429, Some("2"), r#"{"message": "too many requests", "retry_after": 9}"#).await,
            ApiError::RateLimited {
                retry_after_ms: Some(2000),
                message: "too many requests".to_string(),
            }
        );
        assert_eq!(
            map_error(429, None, r#"{"message": "slow", "retry_after": 750}"#).await,
            ApiError::RateLimited {
                retry_after_ms: Some(750),
                message: "slow".to_string(),
            }
        );
        assert_eq!(
            map_error(429, Some("18446744073709551615"), "").await,
            ApiError::RateLimited {
                retry_after_ms: Some(u64::MAX),
                message: "Too Many Requests".to_string(),
            }
        );
    }
}
