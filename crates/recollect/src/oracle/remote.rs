//! Remote oracle adapter for OpenAI-compatible APIs
//!
//! Implements the [`Oracle`] trait against any OpenAI-compatible
//! chat-completions endpoint with configurable URL, model, and API key
//! via environment variable. One request per call, no retry: a failed
//! call degrades the caller's round to its empty-result policy, so
//! retrying here would only stall the turn.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::OracleConfig;
use crate::oracle::{Oracle, OracleError};

/// Remote oracle using OpenAI-compatible HTTP APIs
#[derive(Debug)]
pub struct RemoteOracle {
    client: Client,
    config: OracleConfig,
    api_key: String,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

/// Message in the chat completion request
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

/// Choice in the chat completion response
#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Message in the response choice
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl RemoteOracle {
    /// Create a new remote oracle with the given configuration
    ///
    /// Reads the API key from the environment variable specified in
    /// `config.api_key_env`. Returns an error if the variable is not set.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            OracleError::ConfigError(format!("API key env var '{}' not set", config.api_key_env))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::ApiError(e.to_string()))?;

        info!(
            "RemoteOracle initialized with model: {}, api_url: {}",
            config.model, config.api_url
        );

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Oracle for RemoteOracle {
    async fn complete(
        &self,
        prompt: &str,
        system_instruction: &str,
        temperature: f32,
    ) -> Result<String, OracleError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_instruction.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        );
        debug!("Calling oracle at: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::ApiError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::ApiError(format!(
                "API returned {status}: {error_text}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::ApiError(format!("Failed to parse response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OracleError::Empty)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Each test owns a distinct env var: tests in one binary run in
    // parallel and share the process environment.
    fn create_test_config(api_url: String, api_key_env: &str) -> OracleConfig {
        OracleConfig {
            api_url,
            api_key_env: api_key_env.to_string(),
            model: "gemma2-9b-it".to_string(),
            timeout_secs: 30,
        }
    }

    #[tokio::test]
    async fn test_remote_oracle_new_missing_api_key() {
        unsafe { env::remove_var("RECOLLECT_TEST_KEY_MISSING") };

        let config = create_test_config(
            "https://api.example.com/v1".to_string(),
            "RECOLLECT_TEST_KEY_MISSING",
        );
        let result = RemoteOracle::new(&config);

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("RECOLLECT_TEST_KEY_MISSING"));
    }

    #[tokio::test]
    async fn test_remote_oracle_complete() {
        let mock_server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "<keys>\nfamily\n</keys>"
                }
            }]
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        unsafe { env::set_var("RECOLLECT_TEST_KEY_COMPLETE", "test-key") };
        let config = create_test_config(mock_server.uri(), "RECOLLECT_TEST_KEY_COMPLETE");
        let oracle = RemoteOracle::new(&config).unwrap();

        let result = oracle
            .complete("pick domains", "You are a helpful friend.", 0.2)
            .await;
        assert!(result.is_ok());
        assert!(result.unwrap().contains("family"));
    }

    #[tokio::test]
    async fn test_remote_oracle_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        unsafe { env::set_var("RECOLLECT_TEST_KEY_APIERR", "test-key") };
        let config = create_test_config(mock_server.uri(), "RECOLLECT_TEST_KEY_APIERR");
        let oracle = RemoteOracle::new(&config).unwrap();

        let result = oracle.complete("prompt", "system", 0.2).await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("500"));
    }

    #[tokio::test]
    async fn test_remote_oracle_empty_choices() {
        let mock_server = MockServer::start().await;

        let response_body = serde_json::json!({ "choices": [] });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        unsafe { env::set_var("RECOLLECT_TEST_KEY_EMPTY", "test-key") };
        let config = create_test_config(mock_server.uri(), "RECOLLECT_TEST_KEY_EMPTY");
        let oracle = RemoteOracle::new(&config).unwrap();

        let result = oracle.complete("prompt", "system", 0.2).await;
        assert!(matches!(result, Err(OracleError::Empty)));
    }

    #[tokio::test]
    async fn test_remote_oracle_name() {
        unsafe { env::set_var("RECOLLECT_TEST_KEY_NAME", "test-key") };
        let config = create_test_config(
            "https://api.example.com/v1".to_string(),
            "RECOLLECT_TEST_KEY_NAME",
        );
        let oracle = RemoteOracle::new(&config).unwrap();

        assert_eq!(oracle.name(), "remote");
    }
}
