//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：一次非流式补全，返回首个 choice 的文本。
//! 失败以 LlmError 返回，只有最外层打印时才渲染成 `Error: ...` 文本。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// 默认模型
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// 默认采样温度：偏低，让编码回答更聚焦
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// 补全调用失败的原因（网络、鉴权、配额、响应格式等）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("{0}")]
    Api(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("response contained no choices")]
    EmptyResponse,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// 单次补全的采样参数
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// LLM 客户端 trait：有序消息进，单条文本出
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}

/// 面向用户的渲染：成功为原文，失败为 `Error: <message>`
pub fn render_completion(result: &Result<String, LlmError>) -> String {
    match result {
        Ok(text) => text.clone(),
        Err(e) => format!("Error: {}", e),
    }
}
