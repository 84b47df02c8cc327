//! DashScope (Alibaba Cloud Qwen) provider implementation.
//!
//! Uses the text-generation endpoint with a plain prompt input.

use std::time::Duration;

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::{DASHSCOPE_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use mingyu_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct DashScopeRequest {
    model: String,
    input: DashScopeInput,
    parameters: DashScopeParameters,
}

#[derive(Debug, Serialize)]
struct DashScopeInput {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct DashScopeParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DashScopeResponse {
    output: DashScopeOutput,
    #[serde(default)]
    usage: DashScopeUsage,
}

#[derive(Debug, Deserialize)]
struct DashScopeOutput {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize, Default)]
struct DashScopeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// DashScope error body, e.g. `{"code":"InvalidApiKey","message":"..."}`.
#[derive(Debug, Deserialize)]
struct DashScopeError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// DashScope LLM client.
pub struct DashScopeClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl DashScopeClient {
    /// Create a client for the public endpoint with the default timeout.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_options(
            DASHSCOPE_ENDPOINT,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client with a custom endpoint and request timeout.
    pub fn with_options(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Llm(
                "DashScope provider requires API key".to_string(),
            ));
        }

        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client: super::http_client(timeout)?,
        })
    }

    fn to_dashscope_request(&self, request: &LlmRequest) -> DashScopeRequest {
        let prompt = match request.system {
            Some(ref system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        };

        DashScopeRequest {
            model: request.model.clone(),
            input: DashScopeInput { prompt },
            parameters: DashScopeParameters {
                temperature: request.temperature,
                top_p: request.top_p,
                max_tokens: request.max_tokens,
            },
        }
    }

    fn convert_response(&self, model: &str, response: DashScopeResponse) -> LlmResponse {
        LlmResponse {
            content: response.output.text,
            model: model.to_string(),
            usage: LlmUsage::new(response.usage.input_tokens, response.usage.output_tokens),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for DashScopeClient {
    fn provider_name(&self) -> &str {
        "dashscope"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to DashScope ({})", request.model);

        let body = self.to_dashscope_request(request);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to DashScope: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = match serde_json::from_str::<DashScopeError>(&error_text) {
                Ok(err) => format!("{}: {}", err.code, err.message),
                Err(_) => error_text,
            };
            return Err(AppError::Llm(format!(
                "DashScope API error ({}): {}",
                status, detail
            )));
        }

        let parsed: DashScopeResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse DashScope response: {}", e)))?;

        tracing::info!("Received completion from DashScope");
        tracing::debug!("Usage: {:?}", parsed.usage);

        Ok(self.convert_response(&request.model, parsed))
    }
}
