//! Coda - 分层记忆编码助手
//!
//! 模块划分：
//! - **agent**: 单轮流水线（记忆选层 → Prompt 组装 → 补全 → 可选反思）
//! - **config**: 应用配置加载（TOML + 环境变量）与启动时解析
//! - **core**: 错误类型
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **memory**: 消息模型、文本加载、分层静态记忆
//! - **observability**: tracing 日志
//! - **prompt**: 消息组装与反思 prompt
//! - **ui**: 行式交互循环

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod prompt;
pub mod ui;

pub use agent::{Agent, AgentReply, TurnHandler};
pub use config::{load_config, AgentSettings, AppConfig, SettingsOverrides};
