pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiClient;
pub use provider::{Llm, LlmError};
pub use types::{ChatMessage, FunctionCall, ResponseFormat, Role, ToolCall};
