// AWS Lambda runtime adapter for the Bedrock chatbot
//
// Receives API Gateway events, runs one chat turn against Bedrock and keeps
// per-session history in DynamoDB when a table is configured.
//
// lambda_runtime provides the tokio runtime; we don't start our own.

use chatbot_config::{ChatbotConfig, LogConfig, LogFormat, Platform, RuntimeConfig};
use chatbot_core::RequestDefaults;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;

mod bedrock;
mod handlers;
mod history;
mod response;
#[cfg(test)]
mod testing;

pub use bedrock::{BedrockInvoker, ModelInvoker};
pub use history::{ConversationStore, DynamoDbStore};

use handlers::handle_http_request;
use response::{build_api_gateway_v1_response, build_api_gateway_v2_response};
pub(crate) use response::{HttpLambdaResponse, HttpRequestEvent, HttpResponseData};

/// Lambda handler for chat requests
async fn handle_request(
    event: LambdaEvent<HttpRequestEvent>,
    state: Arc<LambdaState>,
) -> Result<HttpLambdaResponse, Error> {
    let (request, _context) = event.into_parts();

    match request {
        HttpRequestEvent::ApiGatewayV1(boxed_request) => {
            let request = &*boxed_request;
            let response = handle_http_request(
                request.http_method.as_str(),
                request.body.as_deref(),
                request.is_base64_encoded,
                &state,
            )
            .await;
            Ok(build_api_gateway_v1_response(response))
        }
        HttpRequestEvent::ApiGatewayV2(boxed_request) => {
            let request = &*boxed_request;
            let response = handle_http_request(
                request.request_context.http.method.as_str(),
                request.body.as_deref(),
                request.is_base64_encoded,
                &state,
            )
            .await;
            Ok(build_api_gateway_v2_response(response))
        }
    }
}

pub(crate) struct LambdaState {
    pub model: Arc<dyn ModelInvoker>,
    /// None when no DynamoDB table is configured (session-less mode)
    pub store: Option<Arc<dyn ConversationStore>>,
    pub config: ChatbotConfig,
}

impl LambdaState {
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            model_id: self.config.default_model_id.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            max_message_chars: self.config.max_message_chars,
        }
    }
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    let config = RuntimeConfig::load_for_platform(Platform::Lambda)
        .map_err(|e| Error::from(format!("Failed to load configuration: {:#}", e)))?;
    init_tracing(&config.log);

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.chatbot.bedrock_region.clone()))
        .load()
        .await;

    let store = match &config.chatbot.table_name {
        Some(table) => {
            info!(table = %table, "Conversation history enabled");
            Some(Arc::new(DynamoDbStore::new(&sdk_config, table.as_str())) as Arc<dyn ConversationStore>)
        }
        None => {
            info!("DynamoDB table not configured, running session-less");
            None
        }
    };

    info!(
        region = %config.chatbot.bedrock_region,
        model = %config.chatbot.default_model_id,
        max_tokens = config.chatbot.max_tokens,
        "Chatbot handler ready"
    );

    let state = Arc::new(LambdaState {
        model: Arc::new(BedrockInvoker::new(&sdk_config)),
        store,
        config: config.chatbot,
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<HttpRequestEvent>| {
        let state = state.clone();
        async move { handle_request(event, state).await }
    }))
    .await
}

/// Lambda logs go to CloudWatch via stdout; JSON by default
fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let _ = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().without_time()),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().without_time().with_ansi(false)),
        ),
    };
}
