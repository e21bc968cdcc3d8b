use thiserror::Error;

/// Why the language-model call or the parse of its answer failed
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolutionError {
    #[error("Request to language model failed: {0}")]
    Request(String),
    #[error("Language model rejected the API key: {0}")]
    Unauthorized(String),
    #[error("Language model returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Language model response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Language model response is missing field '{0}'")]
    MissingField(&'static str),
    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("Language model returned an empty response")]
    EmptyResponse,
    #[error("Unsupported chart type '{0}'")]
    UnsupportedChartKind(String),
}

/// Request-level failures. Every variant renders as one user-facing line.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChartError {
    #[error("Invalid API key: {0}")]
    Credential(String),
    #[error("Could not understand the request: {0}")]
    Resolution(ResolutionError),
    #[error("Requested {days} days but at most {max} days of history are supported")]
    RangeTooLarge { days: u64, max: u64 },
    #[error("Unsupported chart type '{0}'")]
    UnsupportedChartKind(String),
    #[error("No data available for the selected date range")]
    EmptySeries,
    #[error("Chart data is invalid: {0}")]
    InvalidData(String),
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ResolutionError> for ChartError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::UnsupportedChartKind(kind) => ChartError::UnsupportedChartKind(kind),
            other => ChartError::Resolution(other),
        }
    }
}

/// Collapse an error message to its first line for display
pub fn one_line(error_msg: &str) -> String {
    error_msg
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("An unknown error occurred")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_kind_is_lifted_out_of_resolution() {
        let err: ChartError = ResolutionError::UnsupportedChartKind("heatmap".to_string()).into();
        assert_eq!(err, ChartError::UnsupportedChartKind("heatmap".to_string()));

        let err: ChartError = ResolutionError::EmptyResponse.into();
        assert!(matches!(err, ChartError::Resolution(ResolutionError::EmptyResponse)));
    }

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("first\nsecond"), "first");
        assert_eq!(one_line("\n  padded  \n"), "padded");
        assert_eq!(one_line(""), "An unknown error occurred");
    }
}
