//! Agent 流水线
//!
//! 单轮流程：检查 API Key → 读取 system prompt → 选层并加载记忆 → 组装消息 → 补全，
//! 开启反思时对成功的回答再做一次反思补全。每轮重新读取文件，轮与轮之间不共享状态。

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AgentSettings;
use crate::core::AgentError;
use crate::llm::{render_completion, LlmClient, LlmError, OpenAiClient};
use crate::memory::{gather_memory, load_text_file, select_layers};
use crate::prompt::{compose_messages, Reflector};

/// 单轮输出：首个回答，以及（开启反思时）反思结果
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub response: Result<String, LlmError>,
    pub reflection: Option<Result<String, LlmError>>,
}

impl AgentReply {
    /// 首个回答的展示文本（失败时为 `Error: ...`）
    pub fn response_text(&self) -> String {
        render_completion(&self.response)
    }

    pub fn reflection_text(&self) -> Option<String> {
        self.reflection.as_ref().map(render_completion)
    }
}

/// 交互循环调用的单轮处理器
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn handle(&self, input: &str) -> Result<AgentReply, AgentError>;
}

/// 根据配置创建 LLM 客户端（OpenAI 兼容端点，可配 base_url）
pub fn create_llm_from_settings(settings: &AgentSettings) -> Arc<dyn LlmClient> {
    tracing::info!(
        model = %settings.completion.model,
        base_url = settings.base_url.as_deref().unwrap_or("default"),
        "using OpenAI-compatible LLM"
    );
    Arc::new(OpenAiClient::new(
        settings.base_url.as_deref(),
        settings.api_key.as_deref(),
        settings.request_timeout_secs,
    ))
}

/// Agent：持有 LLM、解析后的配置与可选的 Reflector
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    settings: AgentSettings,
    reflector: Option<Reflector>,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        let reflector = settings
            .reflection
            .then(|| Reflector::new(llm.clone(), settings.workspace.reflection_prompt_path()));
        Self {
            llm,
            settings,
            reflector,
        }
    }

    pub fn reflection_enabled(&self) -> bool {
        self.reflector.is_some()
    }

    /// 对单条用户输入跑完整流水线
    pub async fn run(&self, query: &str) -> Result<AgentReply, AgentError> {
        self.settings.require_api_key()?;

        let system_path = self.settings.workspace.system_prompt_path();
        let system_prompt = load_text_file(&system_path)?;
        if system_prompt.is_empty() {
            return Err(AgentError::MissingSystemPrompt(system_path));
        }

        let layers = select_layers(query);
        tracing::debug!(?layers, "memory layers selected");
        let memory = gather_memory(&self.settings.workspace.memory_dir(), &layers)?;

        let messages = compose_messages(&system_prompt, &memory, query);
        let response = self.llm.complete(&messages, &self.settings.completion).await;
        if let Err(e) = &response {
            tracing::warn!(error = %e, "completion failed");
        }

        let reflection = match (&self.reflector, &response) {
            (Some(reflector), Ok(solution)) => {
                let result = reflector.reflect(solution, &self.settings.completion).await;
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "reflection failed");
                }
                Some(result)
            }
            _ => None,
        };

        Ok(AgentReply {
            response,
            reflection,
        })
    }
}

#[async_trait]
impl TurnHandler for Agent {
    async fn handle(&self, input: &str) -> Result<AgentReply, AgentError> {
        self.run(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, SettingsOverrides};
    use crate::llm::MockLlmClient;
    use crate::memory::Role;

    fn settings_for(root: &std::path::Path, reflection: bool) -> AgentSettings {
        let overrides = SettingsOverrides {
            api_key: Some("sk-test".into()),
            workspace_root: Some(root.to_path_buf()),
            reflection,
            ..Default::default()
        };
        AgentSettings::resolve(&AppConfig::default(), overrides, |_| None).unwrap()
    }

    fn write_system_prompt(root: &std::path::Path, text: &str) {
        std::fs::create_dir_all(root.join("prompts")).unwrap();
        std::fs::write(root.join("prompts/system_prompt.md"), text).unwrap();
    }

    #[tokio::test]
    async fn test_missing_system_prompt_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::new());
        let agent = Agent::new(mock.clone(), settings_for(dir.path(), false));

        let err = agent.run("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::MissingSystemPrompt(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_legacy_query_pulls_layer_four() {
        let dir = tempfile::tempdir().unwrap();
        write_system_prompt(dir.path(), "sys");
        std::fs::create_dir_all(dir.path().join("memory")).unwrap();
        std::fs::write(dir.path().join("memory/layer_4_arbitrary.md"), "py2 quirks").unwrap();

        let mock = Arc::new(MockLlmClient::with_replies(["a", "b"]));
        let agent = Agent::new(mock.clone(), settings_for(dir.path(), false));

        agent.run("plain question").await.unwrap();
        agent.run("LEGACY question").await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].messages[1].content, "Relevant memory:\n");
        assert_eq!(
            calls[1].messages[1].content,
            "Relevant memory:\n=== Layer 4 Knowledge ===\npy2 quirks\n"
        );
    }

    #[tokio::test]
    async fn test_failed_completion_skips_reflection() {
        let dir = tempfile::tempdir().unwrap();
        write_system_prompt(dir.path(), "sys");
        let mock = Arc::new(MockLlmClient::failing(LlmError::Api("401 Unauthorized".into())));
        let agent = Agent::new(mock.clone(), settings_for(dir.path(), true));

        let reply = agent.run("q").await.unwrap();
        assert_eq!(reply.response_text(), "Error: 401 Unauthorized");
        assert!(reply.reflection.is_none());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_reflection_template_keeps_answer() {
        let dir = tempfile::tempdir().unwrap();
        write_system_prompt(dir.path(), "sys");
        std::fs::create_dir(dir.path().join("prompts/reflection_prompt.md")).unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(["Use slicing.", "Reasonable."]));
        let agent = Agent::new(mock.clone(), settings_for(dir.path(), true));

        let reply = agent.run("How do I reverse a string?").await.unwrap();
        assert_eq!(reply.response, Ok("Use slicing.".to_string()));
        assert_eq!(reply.reflection, Some(Ok("Reasonable.".to_string())));
        assert!(mock.calls()[1].messages[1]
            .content
            .starts_with(crate::prompt::FALLBACK_REFLECTION_TEMPLATE));
    }

    #[tokio::test]
    async fn test_reflection_runs_on_success() {
        let dir = tempfile::tempdir().unwrap();
        write_system_prompt(dir.path(), "sys");
        let mock = Arc::new(MockLlmClient::with_replies(["Use slicing.", "Sound approach."]));
        let agent = Agent::new(mock.clone(), settings_for(dir.path(), true));
        assert!(agent.reflection_enabled());

        let reply = agent.run("How do I reverse a string?").await.unwrap();
        assert_eq!(reply.response, Ok("Use slicing.".to_string()));
        assert_eq!(reply.reflection_text().as_deref(), Some("Sound approach."));

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].messages.len(), 2);
        assert_eq!(calls[1].messages[1].role, Role::User);
        assert!(calls[1].messages[1].content.ends_with("Solution to analyze:\nUse slicing."));
    }
}
