//! Reflection：对首个回答做一次代码评审式反思
//!
//! 模板从 prompts/reflection_prompt.md 读取，缺失时用内置四点模板；不读取记忆层。

use std::path::PathBuf;
use std::sync::Arc;

use crate::llm::{CompletionOptions, LlmClient, LlmError};
use crate::memory::{load_text_file, Message};

/// 反思调用的 system 角色
pub const REFLECTION_SYSTEM_PROMPT: &str =
    "You are a code review assistant performing a reflection analysis.";

/// 模板与待分析方案之间的分隔行
pub const SOLUTION_SEPARATOR: &str = "Solution to analyze:";

/// prompts/reflection_prompt.md 缺失时使用
pub const FALLBACK_REFLECTION_TEMPLATE: &str = "\
Please reflect on the following solution and evaluate it on these points:

1. Soundness of approach: is the overall approach correct and well reasoned?
2. Patterns and principles: does it apply appropriate design patterns and principles?
3. Implementation details: are the implementation details complete and correct?
4. Edge cases: are edge cases identified and handled?

Then summarize:
- Strengths of the solution
- Concrete improvements that should be made
- Any additional context needed to give a better answer";

/// 拼接反思 prompt：模板 + 分隔行 + 原样的方案文本
pub fn build_reflection_prompt(template: &str, solution: &str) -> String {
    let template = if template.trim().is_empty() {
        FALLBACK_REFLECTION_TEMPLATE
    } else {
        template
    };
    format!("{}\n\n{}\n{}", template.trim_end(), SOLUTION_SEPARATOR, solution)
}

/// Reflector：持有 LLM 与模板路径，reflect(solution) 返回反思文本
pub struct Reflector {
    llm: Arc<dyn LlmClient>,
    template_path: PathBuf,
}

impl Reflector {
    pub fn new(llm: Arc<dyn LlmClient>, template_path: impl Into<PathBuf>) -> Self {
        Self {
            llm,
            template_path: template_path.into(),
        }
    }

    /// 每次调用重新读取模板；缺失或读取失败都退回内置模板
    pub fn messages_for(&self, solution: &str) -> Vec<Message> {
        let template = match load_text_file(&self.template_path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(
                    path = %self.template_path.display(),
                    error = %e,
                    "reflection template unreadable, using built-in template"
                );
                String::new()
            }
        };
        if template.trim().is_empty() {
            tracing::debug!(path = %self.template_path.display(), "using built-in reflection template");
        }
        vec![
            Message::system(REFLECTION_SYSTEM_PROMPT),
            Message::user(build_reflection_prompt(&template, solution)),
        ]
    }

    pub async fn reflect(&self, solution: &str, options: &CompletionOptions) -> Result<String, LlmError> {
        let messages = self.messages_for(solution);
        self.llm.complete(&messages, options).await
    }
}
