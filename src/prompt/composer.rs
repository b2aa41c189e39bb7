//! Prompt 组装：system prompt + 记忆 + 用户问题 → 有序消息
//!
//! 记忆块即使为空也作为 system 消息保留，消息形状固定为 [system, system, user]。

use crate::memory::Message;

/// 记忆消息的前缀
pub const MEMORY_HEADER: &str = "Relevant memory:\n";

pub fn compose_messages(system_prompt: &str, memory: &str, query: &str) -> Vec<Message> {
    vec![
        Message::system(system_prompt),
        Message::system(format!("{}{}", MEMORY_HEADER, memory)),
        Message::user(query),
    ]
}
