//! AWS Bedrock provider implementation using the Converse API.

use std::time::Duration;

use aws_sdk_bedrockruntime::types::{
    self as bedrock, ContentBlock as BedrockContent, ConversationRole, Message as BedrockMessage,
};
use aws_smithy_types::timeout::TimeoutConfig;
use flood_risk_assessment_models::GenerationRequest;

use super::{TextGenerator, non_empty_completion};
use crate::AiError;

/// AWS Bedrock provider using the Converse API.
///
/// Works with any text model available on Bedrock (Claude, Llama,
/// Mistral, etc.). Authentication uses the standard AWS credential chain
/// (env vars, IAM role, `~/.aws/credentials`).
pub struct BedrockProvider {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

impl BedrockProvider {
    /// Creates a new Bedrock provider.
    ///
    /// Loads AWS configuration from the environment (region, credentials).
    /// The `model_id` should be a Bedrock model ID such as
    /// `us.anthropic.claude-sonnet-4-20250514-v1:0`. Each call is bounded
    /// by `timeout`.
    pub async fn new(model_id: String, region: Option<String>, timeout: Duration) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(timeout)
                    .operation_timeout(timeout)
                    .build(),
            );

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }

        let config = config_loader.load().await;
        let client = aws_sdk_bedrockruntime::Client::new(&config);

        Self { client, model_id }
    }
}

#[async_trait::async_trait]
impl TextGenerator for BedrockProvider {
    fn name(&self) -> String {
        format!("bedrock/{}", self.model_id)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, AiError> {
        let message = BedrockMessage::builder()
            .role(ConversationRole::User)
            .content(BedrockContent::Text(request.prompt.clone()))
            .build()
            .map_err(|e| AiError::Provider {
                message: format!("Failed to build Bedrock Message: {e}"),
            })?;

        let max_tokens = i32::try_from(request.max_output_tokens).unwrap_or(i32::MAX);

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .messages(message)
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .max_tokens(max_tokens)
                    .temperature(request.temperature)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| AiError::Provider {
                message: format!("Bedrock Converse error: {e}"),
            })?;

        let output = response.output().ok_or_else(|| AiError::Provider {
            message: "No output in Bedrock response".to_string(),
        })?;

        let bedrock::ConverseOutput::Message(response_msg) = output else {
            return Err(AiError::Provider {
                message: "Unexpected Bedrock output variant".to_string(),
            });
        };

        let parts: Vec<&str> = response_msg
            .content()
            .iter()
            .filter_map(|block| match block {
                BedrockContent::Text(text) => Some(text.as_str()),
                // Skip unsupported block types (reasoning, image, etc.)
                _ => None,
            })
            .collect();

        let text = if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        };

        non_empty_completion(text, request)
    }
}
