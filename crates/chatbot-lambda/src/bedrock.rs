// Bedrock Runtime adapter
//
// Sends a prepared JSON body to InvokeModel and hands back the raw reply.
// Request and response formats live in chatbot-core.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_bedrockruntime::primitives::Blob;
use chatbot_core::ChatError;
use tracing::{debug, warn};

#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Invoke `model_id` with a JSON request body, returning the JSON response body
    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, ChatError>;
}

pub struct BedrockInvoker {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockInvoker {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_bedrockruntime::Client::new(config),
        }
    }
}

#[async_trait]
impl ModelInvoker for BedrockInvoker {
    async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, ChatError> {
        debug!(model_id, bytes = body.len(), "Calling Bedrock model");

        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|err| {
                warn!(model_id, error = %DisplayErrorContext(&err), "Bedrock InvokeModel failed");
                classify_error(
                    err.code(),
                    err.message(),
                    DisplayErrorContext(&err).to_string(),
                )
            })?;

        Ok(output.body.into_inner())
    }
}

/// Service errors keep their AWS error code; transport failures have none
pub(crate) fn classify_error(code: Option<&str>, message: Option<&str>, detail: String) -> ChatError {
    match code {
        Some(code) => ChatError::ModelAccess {
            code: code.to_string(),
            message: message.map(str::to_string).unwrap_or(detail),
        },
        None => ChatError::Internal(format!("model invocation failed: {}", detail)),
    }
}
