//! Runtime configuration, read once at startup and passed by value

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::ChartError;

const API_KEY_PREFIX: &str = "sk-";

/// Language-model API key. Held for the session only; `Debug` never prints it.
#[derive(Clone, PartialEq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Prefix check only; the endpoint is the real judge
    pub fn parse(raw: &str) -> Result<Self, ChartError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ChartError::Credential("no API key provided".to_string()));
        }
        if !key.starts_with(API_KEY_PREFIX) {
            return Err(ChartError::Credential(format!(
                "key must start with '{}'",
                API_KEY_PREFIX
            )));
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: ApiKey,
    pub completion_base_url: String,
    pub blockchain_base_url: String,
    /// `scheme://host:port`, applied to every outbound request
    pub proxy_url: Option<String>,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    /// 1 keeps the sequential day-by-day behaviour
    pub day_workers: usize,
    pub requests_per_second: usize,
}

impl AppConfig {
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;

    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            completion_base_url: crate::api::deepseek::DeepSeekClient::DEFAULT_BASE_URL.to_string(),
            blockchain_base_url: crate::api::bitaps::BitapsClient::DEFAULT_BASE_URL.to_string(),
            proxy_url: None,
            output_dir: PathBuf::from("charts"),
            request_timeout: Duration::from_secs(Self::REQUEST_TIMEOUT_SECS),
            day_workers: 1,
            requests_per_second: 5,
        }
    }

    /// Read the process environment (after `.env` has been loaded)
    pub fn from_env() -> Result<Self, ChartError> {
        let api_key = ApiKey::parse(&std::env::var("DEEPSEEK_API_KEY").unwrap_or_default())?;
        Self::with_key(api_key)
    }

    /// Like `from_env`, for a key typed in at the session prompt
    pub fn with_key(api_key: ApiKey) -> Result<Self, ChartError> {
        Self::from_lookup(api_key, |name| std::env::var(name).ok())
    }

    fn from_lookup(api_key: ApiKey, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChartError> {
        let mut config = Self::new(api_key);

        config.proxy_url = lookup("CHARTWRIGHT_PROXY_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(proxy) = &config.proxy_url {
            validate_proxy_url(proxy)?;
        }

        if let Some(dir) = lookup("CHARTWRIGHT_OUTPUT_DIR").filter(|s| !s.trim().is_empty()) {
            config.output_dir = PathBuf::from(dir.trim());
        }
        if let Some(workers) = lookup("CHARTWRIGHT_DAY_WORKERS") {
            config.day_workers = parse_positive("CHARTWRIGHT_DAY_WORKERS", &workers)?;
        }
        if let Some(rps) = lookup("CHARTWRIGHT_REQUESTS_PER_SECOND") {
            config.requests_per_second = parse_positive("CHARTWRIGHT_REQUESTS_PER_SECOND", &rps)?;
        }

        Ok(config)
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize, ChartError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ChartError::Config(format!("{} must be a positive integer, got '{}'", name, value))),
    }
}

/// Expects `scheme://host:port`
fn validate_proxy_url(proxy: &str) -> Result<(), ChartError> {
    let invalid = || ChartError::Config(format!("proxy must look like scheme://host:port, got '{}'", proxy));

    let (scheme, rest) = proxy.split_once("://").ok_or_else(invalid)?;
    if !matches!(scheme, "http" | "https" | "socks5" | "socks5h") {
        return Err(invalid());
    }
    let authority = rest.split('/').next().unwrap_or_default();
    let (host, port) = authority.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn key() -> ApiKey {
        ApiKey::parse("sk-abc").expect("valid key")
    }

    #[test]
    fn test_api_key_prefix_check() {
        assert!(ApiKey::parse("sk-123").is_ok());
        assert!(matches!(ApiKey::parse(""), Err(ChartError::Credential(_))));
        assert!(matches!(ApiKey::parse("pk-123"), Err(ChartError::Credential(_))));
    }

    #[test]
    fn test_api_key_is_redacted() {
        assert_eq!(format!("{:?}", key()), "ApiKey(***)");
        assert!(!format!("{:?}", AppConfig::new(key())).contains("sk-abc"));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(key(), |_| None).expect("defaults");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.day_workers, 1);
        assert!(config.proxy_url.is_none());
        assert_eq!(config.output_dir, PathBuf::from("charts"));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CHARTWRIGHT_PROXY_URL", "http://127.0.0.1:7890"),
            ("CHARTWRIGHT_DAY_WORKERS", "4"),
            ("CHARTWRIGHT_OUTPUT_DIR", "/tmp/out"),
        ]);
        let config = AppConfig::from_lookup(key(), |name| vars.get(name).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(config.proxy_url.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(config.day_workers, 4);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_bad_proxy_and_workers_are_rejected() {
        for proxy in ["127.0.0.1:7890", "ftp://host:1", "http://host", "http://:80"] {
            let result = AppConfig::from_lookup(key(), |name| {
                (name == "CHARTWRIGHT_PROXY_URL").then(|| proxy.to_string())
            });
            assert!(matches!(result, Err(ChartError::Config(_))), "accepted {}", proxy);
        }

        let result = AppConfig::from_lookup(key(), |name| {
            (name == "CHARTWRIGHT_DAY_WORKERS").then(|| "0".to_string())
        });
        assert!(matches!(result, Err(ChartError::Config(_))));
    }
}
