//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CODA__*` 覆盖（双下划线表示嵌套，如 `CODA__LLM__MODEL=gpt-4o-mini`）。
//! 启动时解析一次得到 [`AgentSettings`]，之后作为参数传递，不再读取环境。

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::AgentError;
use crate::llm::{CompletionOptions, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TEMPERATURE};

/// 未显式提供 API Key 时读取的环境变量
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
}

/// [app] 段：工作目录与日志级别
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// prompts/ 与 memory/ 所在目录，未设置时用当前目录
    pub workspace_root: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            workspace_root: None,
            log_level: "warn".to_string(),
        }
    }
}

/// [llm] 段：模型、温度、端点与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub temperature: f32,
    pub base_url: Option<String>,
    /// 优先于 OPENAI_API_KEY
    pub api_key: Option<String>,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: None,
            api_key: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// [agent] 段：是否在首个回答后追加一次反思
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AgentSection {
    pub reflection: bool,
}

/// 从 config 目录加载配置，环境变量 CODA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path，则追加该文件（可覆盖前面的键；显式指定的文件必须存在）
/// 3. 最后叠加环境变量 CODA__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CODA")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

/// 工作目录布局：prompts/ 与 memory/ 下的固定文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// prompts/system_prompt.md（必需）
    pub fn system_prompt_path(&self) -> PathBuf {
        self.root.join("prompts").join("system_prompt.md")
    }

    /// prompts/reflection_prompt.md（可选，缺失时用内置模板）
    pub fn reflection_prompt_path(&self) -> PathBuf {
        self.root.join("prompts").join("reflection_prompt.md")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.root.join("memory")
    }
}

/// 命令行等外部来源的覆盖项，优先级高于配置文件
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub workspace_root: Option<PathBuf>,
    pub reflection: bool,
}

/// 启动时解析一次的运行参数
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub api_key: Option<String>,
    pub completion: CompletionOptions,
    pub workspace: Workspace,
    pub reflection: bool,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl AgentSettings {
    /// 合并配置、覆盖项与环境；env 由调用方注入（进程入口传 `std::env::var`，测试传闭包）
    ///
    /// API Key 优先级：覆盖项 > 配置文件 > 环境变量 OPENAI_API_KEY；空串视为未设置。
    pub fn resolve<F>(cfg: &AppConfig, overrides: SettingsOverrides, env: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = overrides
            .api_key
            .or_else(|| cfg.llm.api_key.clone())
            .or_else(|| env(API_KEY_ENV))
            .filter(|k| !k.trim().is_empty());

        let temperature = overrides.temperature.unwrap_or(cfg.llm.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AgentError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                temperature
            )));
        }

        let model = overrides.model.unwrap_or_else(|| cfg.llm.model.clone());
        if model.trim().is_empty() {
            return Err(AgentError::Config("model name must not be empty".to_string()));
        }

        let root = overrides
            .workspace_root
            .or_else(|| cfg.app.workspace_root.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            api_key,
            completion: CompletionOptions { model, temperature },
            workspace: Workspace::new(root),
            reflection: overrides.reflection || cfg.agent.reflection,
            base_url: cfg.llm.base_url.clone(),
            request_timeout_secs: cfg.llm.timeouts.request,
        })
    }

    /// 发起远程调用前检查 API Key
    pub fn require_api_key(&self) -> Result<&str, AgentError> {
        self.api_key.as_deref().ok_or(AgentError::MissingApiKey)
    }
}
