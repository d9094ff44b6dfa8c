// AWS Lambda binary entry point
//
// Build with: sam build (or cargo build -p chatbot-lambda)
//
// The lambda_runtime crate provides the tokio runtime, so we use #[tokio::main]

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    chatbot_lambda::run().await
}
