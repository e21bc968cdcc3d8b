use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope, ResponseFormat};
use crate::config::ApiKey;
use crate::services::intent_service::CompletionClient;
use crate::utils::ResolutionError;

/// OpenAI-compatible chat completion client for DeepSeek
pub struct DeepSeekClient {
    http_client: HttpClient,
    api_key: ApiKey,
    base_url: String,
    model: String,
}

impl DeepSeekClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.deepseek.com/";
    pub const DEFAULT_MODEL: &'static str = "deepseek-chat";

    pub fn with_base_url(http_client: HttpClient, api_key: ApiKey, base_url: String) -> Self {
        Self {
            http_client,
            api_key,
            base_url,
            model: Self::DEFAULT_MODEL.to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn handle_error_response(status: reqwest::StatusCode, response: reqwest::Response) -> ResolutionError {
        let body_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body_text)
            .ok()
            .and_then(|e| e.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| {
                if body_text.trim().is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    body_text
                }
            });

        match status.as_u16() {
            401 | 403 => ResolutionError::Unauthorized(message),
            code => {
                warn!("Completion endpoint returned {}: {}", code, message);
                ResolutionError::Status { status: code, message }
            }
        }
    }
}

#[async_trait]
impl CompletionClient for DeepSeekClient {
    /// POST /chat/completions with `response_format = json_object`
    ///
    /// Sends the prompt as a single user message and asks for a JSON object back.
    ///
    /// # Arguments
    /// * `prompt` - The full prompt, user text included
    ///
    /// # Returns
    /// * `Ok(String)` - The first non-empty answer, trimmed
    /// * `Err(ResolutionError)` - `Unauthorized` on 401/403, `Status` on other
    ///   non-2xx, `Request` on network failure, `EmptyResponse` on no content
    async fn complete_json(&self, prompt: &str) -> Result<String, ResolutionError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            response_format: ResponseFormat::json_object(),
        };

        debug!("POST {} model={}", self.completions_url(), self.model);

        let response = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ResolutionError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let payload = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ResolutionError::InvalidJson(format!("Failed to parse completion envelope: {}", e)))?;

        payload
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or(ResolutionError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_joins_cleanly() {
        let key = ApiKey::parse("sk-test").expect("valid key");
        let client = DeepSeekClient::with_base_url(HttpClient::new(), key, DeepSeekClient::DEFAULT_BASE_URL.to_string());
        assert_eq!(client.completions_url(), "https://api.deepseek.com/chat/completions");
    }

    #[test]
    fn test_request_asks_for_json_object() {
        let body = ChatCompletionRequest {
            model: DeepSeekClient::DEFAULT_MODEL.to_string(),
            messages: vec![],
            response_format: ResponseFormat::json_object(),
        };
        let value = serde_json::to_value(&body).expect("serializable");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["model"], "deepseek-chat");
    }

    fn response(status: u16, body: &str) -> reqwest::Response {
        let response = http::Response::builder()
            .status(status)
            .body(body.to_string())
            .expect("valid response");
        reqwest::Response::from(response)
    }

    async fn map_error(status: u16, body: &str) -> ResolutionError {
        let response = response(status, body);
        DeepSeekClient::handle_error_response(response.status(), response).await
    }

    #[tokio::test]
    async fn test_rejected_key_maps_to_unauthorized() {
        let body = r#"{"error": {"message": "Authentication Fails (no such user)", "type": "authentication_error"}}"#;
        assert_eq!(
            map_error(401, body).await,
            ResolutionError::Unauthorized("Authentication Fails (no such user)".to_string())
        );
        assert!(matches!(map_error(403, "").await, ResolutionError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_other_statuses_keep_server_message() {
        assert_eq!(
            map_error(402, r#"{"error": {"message": "Insufficient Balance"}}"#).await,
            ResolutionError::Status {
                status: 402,
                message: "Insufficient Balance".to_string(),
            }
        );
        assert_eq!(
            map_error(503, "upstream overloaded").await,
            ResolutionError::Status {
                status: 503,
                message: "upstream overloaded".to_string(),
            }
        );
        assert_eq!(
            map_error(500, "").await,
            ResolutionError::Status {
                status: 500,
                message: "Internal Server Error".to_string(),
            }
        );
    }
}
