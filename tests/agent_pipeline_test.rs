//! 流水线集成测试：Mock LLM + 临时工作目录

use std::path::Path;
use std::sync::Arc;

use coda::config::{AppConfig, SettingsOverrides};
use coda::core::AgentError;
use coda::llm::{LlmError, MockLlmClient};
use coda::memory::Role;
use coda::ui::{run_repl, ExitReason};
use coda::{Agent, AgentSettings};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn settings(root: &Path, api_key: Option<&str>, env_key: Option<&str>) -> AgentSettings {
    let overrides = SettingsOverrides {
        api_key: api_key.map(String::from),
        workspace_root: Some(root.to_path_buf()),
        ..Default::default()
    };
    let env_key = env_key.map(String::from);
    AgentSettings::resolve(&AppConfig::default(), overrides, move |_| env_key.clone()).unwrap()
}

#[tokio::test]
async fn test_reverse_string_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prompts/system_prompt.md", "You are a helpful coding agent.");

    let mock = Arc::new(MockLlmClient::with_replies(["Use slicing."]));
    let agent = Agent::new(mock.clone(), settings(dir.path(), Some("sk-test"), None));

    let reply = agent.run("How do I reverse a string?").await.unwrap();
    assert_eq!(reply.response, Ok("Use slicing.".to_string()));
    assert_eq!(reply.response_text(), "Use slicing.");
    assert!(reply.reflection.is_none());

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    let msgs = &calls[0].messages;
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[0].role, Role::System);
    assert_eq!(msgs[0].content, "You are a helpful coding agent.");
    assert_eq!(msgs[1].role, Role::System);
    assert_eq!(msgs[1].content, "Relevant memory:\n");
    assert_eq!(msgs[2].role, Role::User);
    assert_eq!(msgs[2].content, "How do I reverse a string?");
    assert_eq!(calls[0].options.model, "gpt-4o");
    assert_eq!(calls[0].options.temperature, 0.3);
}

#[tokio::test]
async fn test_missing_api_key_never_calls_llm() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prompts/system_prompt.md", "sys");

    let mock = Arc::new(MockLlmClient::new());
    let agent = Agent::new(mock.clone(), settings(dir.path(), None, None));

    let err = agent.run("anything").await.unwrap_err();
    assert!(matches!(err, AgentError::MissingApiKey));
    assert!(err.is_config_error());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_env_api_key_is_used_when_not_supplied() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prompts/system_prompt.md", "sys");

    let mock = Arc::new(MockLlmClient::with_replies(["ok"]));
    let agent = Agent::new(mock.clone(), settings(dir.path(), None, Some("sk-env")));

    assert!(agent.run("q").await.is_ok());
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_memory_layers_in_prompt() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prompts/system_prompt.md", "sys");
    write(dir.path(), "memory/layer_1_logic.md", "L1");
    write(dir.path(), "memory/layer_2_concepts.md", "L2");
    write(dir.path(), "memory/layer_3_important_details.md", "L3");
    write(dir.path(), "memory/layer_4_arbitrary.md", "L4");

    let mock = Arc::new(MockLlmClient::new());
    let agent = Agent::new(mock.clone(), settings(dir.path(), Some("sk-test"), None));

    agent.run("Handle this Edge Case please").await.unwrap();
    let memory = &mock.calls()[0].messages[1].content;
    assert_eq!(
        memory,
        "Relevant memory:\n\
         === Layer 1 Knowledge ===\nL1\n\n\
         === Layer 2 Knowledge ===\nL2\n\n\
         === Layer 3 Knowledge ===\nL3\n\n\
         === Layer 4 Knowledge ===\nL4\n"
    );
}

#[tokio::test]
async fn test_completion_failure_renders_error_prefix() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prompts/system_prompt.md", "sys");

    let mock = Arc::new(MockLlmClient::failing(LlmError::Api("Incorrect API key provided".into())));
    let agent = Agent::new(mock, settings(dir.path(), Some("sk-bad"), None));

    let reply = agent.run("q").await.unwrap();
    let text = reply.response_text();
    assert!(text.starts_with("Error: "));
    assert!(text.contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_repl_session_over_agent() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prompts/system_prompt.md", "sys");

    let mock = Arc::new(MockLlmClient::with_replies(["first answer"]));
    let agent = Agent::new(mock.clone(), settings(dir.path(), Some("sk-test"), None));

    let mut out = Vec::new();
    let outcome = run_repl(&agent, "how?\nQUIT\nnever sent\n".as_bytes(), &mut out, std::future::pending())
        .await
        .unwrap();

    assert_eq!(outcome.reason, ExitReason::ExitCommand);
    assert_eq!(outcome.turns, 1);
    assert_eq!(mock.call_count(), 1);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("=== Agent's Response ===\nfirst answer\n"));
}

#[tokio::test]
async fn test_repl_survives_missing_system_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLlmClient::new());
    let agent = Agent::new(mock.clone(), settings(dir.path(), Some("sk-test"), None));

    let mut out = Vec::new();
    let outcome = run_repl(&agent, "a\nb\n".as_bytes(), &mut out, std::future::pending())
        .await
        .unwrap();

    assert_eq!(outcome.reason, ExitReason::EndOfInput);
    assert_eq!(outcome.turns, 2);
    assert_eq!(mock.call_count(), 0);
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.matches("\nError: System prompt file not found").count(), 2);
}
