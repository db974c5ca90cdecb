//! LLM provider abstraction and implementations.
//!
//! Supports Anthropic Claude, `OpenAI`, and AWS Bedrock via a common trait.

pub mod anthropic;
#[cfg(feature = "bedrock")]
pub mod bedrock;
pub mod openai;

use std::time::Duration;

use flood_risk_assessment_models::GenerationRequest;

use crate::AiError;

/// Default `OpenAI` API root.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Trait for text generation backends.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider and model, for logs (e.g. `"openai/gpt-4o-mini"`).
    fn name(&self) -> String;

    /// Generates text for a single prompt.
    ///
    /// Returns the completion with surrounding whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the completion is empty.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AiError>;
}

/// Trims a completion and rejects empty ones.
pub(crate) fn non_empty_completion(
    text: Option<String>,
    request: &GenerationRequest,
) -> Result<String, AiError> {
    text.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AiError::EmptyCompletion { kind: request.kind })
}

/// Builds a `reqwest` client whose requests are bounded by `timeout`.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, AiError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?)
}

/// Creates a text generator based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `AWS_BEARER_TOKEN_BEDROCK` set -> Bedrock
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 3. `OPENAI_API_KEY` or `AI_BASE_URL` set -> `OpenAI` (or compatible)
/// 4. AWS credentials available (`AWS_ACCESS_KEY_ID`, `AWS_PROFILE`,
///    or IAM role on EC2/ECS) -> Bedrock
///
/// Every request is bounded by `timeout`.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
#[allow(clippy::unused_async)] // async is needed when bedrock feature is enabled
pub async fn create_generator_from_env(
    timeout: Duration,
) -> Result<Box<dyn TextGenerator>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());

    match provider.to_lowercase().as_str() {
        "anthropic" | "claude" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| AiError::Config {
                message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
            })?;
            let model = std::env::var("AI_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(
                api_key,
                model,
                http_client(timeout)?,
            )))
        }
        "openai" | "gpt" => {
            let base_url = std::env::var("AI_BASE_URL").ok();
            // Local OpenAI-compatible servers usually don't need a key
            let api_key = match (std::env::var("OPENAI_API_KEY"), &base_url) {
                (Ok(key), _) => Some(key),
                (Err(_), Some(_)) => None,
                (Err(_), None) => {
                    return Err(AiError::Config {
                        message: "OPENAI_API_KEY environment variable not set".to_string(),
                    });
                }
            };
            let model = std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key,
                model,
                base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                http_client(timeout)?,
            )))
        }
        #[cfg(feature = "bedrock")]
        "bedrock" | "aws" => {
            let model = std::env::var("AI_MODEL")
                .unwrap_or_else(|_| "us.anthropic.claude-sonnet-4-20250514-v1:0".to_string());
            let region = std::env::var("AWS_REGION")
                .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
                .ok()
                .or_else(|| {
                    // Bearer token auth requires a region for endpoint resolution.
                    // Default to us-east-1 when no region is configured.
                    if std::env::var("AWS_BEARER_TOKEN_BEDROCK").is_ok() {
                        log::info!(
                            "No AWS_REGION set; defaulting to us-east-1 for Bedrock bearer token auth"
                        );
                        Some("us-east-1".to_string())
                    } else {
                        None
                    }
                });
            let provider = bedrock::BedrockProvider::new(model, region, timeout).await;
            Ok(Box::new(provider))
        }
        #[cfg(not(feature = "bedrock"))]
        "bedrock" | "aws" => Err(AiError::Config {
            message: "Bedrock support not compiled. Rebuild with --features bedrock".to_string(),
        }),
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'anthropic', 'openai', or 'bedrock'."
            ),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_generator_from_env`].
fn detect_provider() -> String {
    if std::env::var("AWS_BEARER_TOKEN_BEDROCK").is_ok() {
        log::info!("Auto-detected AI provider: Bedrock (AWS_BEARER_TOKEN_BEDROCK found)");
        return "bedrock".to_string();
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    if std::env::var("OPENAI_API_KEY").is_ok() || std::env::var("AI_BASE_URL").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI-compatible");
        return "openai".to_string();
    }

    // Check for AWS credentials; any of these indicate Bedrock is available
    let has_aws_keys = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
    let has_aws_profile = std::env::var("AWS_PROFILE").is_ok();
    let has_aws_role = std::env::var("AWS_ROLE_ARN").is_ok()
        || std::env::var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI").is_ok();

    if has_aws_keys || has_aws_profile || has_aws_role {
        log::info!("Auto-detected AI provider: Bedrock (AWS credentials found)");
        return "bedrock".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set one of: OPENAI_API_KEY, ANTHROPIC_API_KEY, \
         AWS_BEARER_TOKEN_BEDROCK, or AWS credentials (AWS_ACCESS_KEY_ID/AWS_PROFILE). \
         You can also set AI_PROVIDER explicitly."
    );

    // Fall back to openai, which produces a clear error about missing key
    "openai".to_string()
}
