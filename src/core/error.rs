//! Agent 错误类型
//!
//! 配置类错误（缺 API Key、缺 system prompt）在任何远程调用之前抛出，只终止当前这一轮；
//! 远程调用失败不在这里，而是以 LlmError 留在 AgentReply 中。

use std::path::PathBuf;

use thiserror::Error;

/// 单轮流水线可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("OpenAI API key must be provided or set in OPENAI_API_KEY environment variable")]
    MissingApiKey,

    #[error("System prompt file not found: {0}")]
    MissingSystemPrompt(PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 单轮处理中出现 panic，被交互循环捕获
    #[error("Turn panicked: {0}")]
    TurnPanicked(String),
}

impl AgentError {
    /// 是否为配置错误（在远程调用前即失败）
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey | Self::MissingSystemPrompt(_) | Self::Config(_)
        )
    }
}
