//! Prompt 层：主回答的消息组装与反思 prompt

pub mod composer;
pub mod reflection;

pub use composer::{compose_messages, MEMORY_HEADER};
pub use reflection::{
    build_reflection_prompt, Reflector, FALLBACK_REFLECTION_TEMPLATE, REFLECTION_SYSTEM_PROMPT,
    SOLUTION_SEPARATOR,
};
