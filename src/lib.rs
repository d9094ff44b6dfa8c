//! bedrock-chatbot deployment CLI
//!
//! Builds and deploys the serverless Bedrock chatbot stack with the SAM and
//! AWS command-line tools, then prints the stack outputs with example
//! requests and console links.

pub mod deploy;
mod init;

pub use init::init_tracing;
