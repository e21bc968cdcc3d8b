//! Clients for the external services

use reqwest::Client as HttpClient;
use std::time::Duration;

pub mod bitaps;
pub mod deepseek;

/// Build an HTTP client with the request timeout and optional outbound proxy
pub fn build_http_client(timeout: Duration, proxy_url: Option<&str>) -> Result<HttpClient, reqwest::Error> {
    let mut builder = HttpClient::builder().timeout(timeout);
    if let Some(proxy_url) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }
    builder.build()
}
