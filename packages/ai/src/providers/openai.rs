//! `OpenAI` chat completions provider.
//!
//! Also works with `OpenAI`-compatible servers (Ollama, vLLM, llama.cpp,
//! LM Studio) by pointing `base_url` at them.

use flood_risk_assessment_models::GenerationRequest;
use serde::{Deserialize, Serialize};

use super::{TextGenerator, non_empty_completion};
use crate::AiError;

/// `OpenAI` API provider.
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
    ///
    /// `api_key` may be `None` for local servers that don't check it.
    #[must_use]
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn build_request<'a>(model: &'a str, request: &'a GenerationRequest) -> OpenAiRequest<'a> {
    OpenAiRequest {
        model,
        messages: vec![OpenAiMessage {
            role: "user",
            content: &request.prompt,
        }],
        temperature: request.temperature,
        max_tokens: request.max_output_tokens,
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiProvider {
    fn name(&self) -> String {
        format!("openai/{}", self.model)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, AiError> {
        let body = build_request(&self.model, request);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: OpenAiError = serde_json::from_str(&body).unwrap_or_else(|_| OpenAiError {
                error: OpenAiErrorDetail {
                    message: format!("HTTP {status}: {body}"),
                },
            });
            return Err(AiError::Provider {
                message: err.error.message,
            });
        }

        let response: OpenAiResponse = serde_json::from_str(&body)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Provider {
                message: "No choices in OpenAI response".to_string(),
            })?;

        non_empty_completion(choice.message.content, request)
    }
}
