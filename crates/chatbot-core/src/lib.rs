// chatbot-core - platform-agnostic chatbot logic
//
// Everything here is pure: parsing and validating chat requests, building
// model request bodies, extracting model replies and trimming history.
// I/O (Bedrock, DynamoDB, HTTP events) lives in the runtime crates.

pub mod error;
pub mod message;
pub mod model;
pub mod request;

pub use error::ChatError;
pub use message::{ChatMessage, Conversation, Role};
pub use model::ModelFamily;
pub use request::{ChatRequest, RequestDefaults};
