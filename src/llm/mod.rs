//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{MockLlmClient, RecordedCall};
pub use openai::{OpenAiClient, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use traits::{
    render_completion, CompletionOptions, LlmClient, LlmError, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
