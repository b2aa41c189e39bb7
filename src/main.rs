//! Coda - 分层记忆编码助手
//!
//! 入口：解析参数、加载配置、初始化日志，创建 Agent 后进入交互循环（或单条消息模式）。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use coda::{
    agent::create_llm_from_settings,
    load_config,
    ui::{print_banner, print_reply, run_repl, ExitReason},
    Agent, AgentSettings, SettingsOverrides,
};

#[derive(Parser, Debug)]
#[command(name = "coda", about = "Layered-memory coding agent", version)]
struct Cli {
    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// prompts/ 与 memory/ 所在目录
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    /// 优先于配置文件与 OPENAI_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// 在回答后追加一次反思
    #[arg(short, long)]
    reflect: bool,

    /// 只处理一条消息后退出
    #[arg(short, long)]
    message: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = load_config(cli.config.as_deref()).context("Failed to load config")?;

    coda::observability::init(&cfg.app.log_level, cli.verbose).context("Failed to init logging")?;

    let overrides = SettingsOverrides {
        api_key: cli.api_key,
        model: cli.model,
        temperature: cli.temperature,
        workspace_root: cli.workspace,
        reflection: cli.reflect,
    };
    let settings = AgentSettings::resolve(&cfg, overrides, |k| std::env::var(k).ok())
        .context("Invalid configuration")?;
    if settings.api_key.is_none() {
        tracing::warn!("no API key configured; every turn will fail until one is provided");
    }

    let llm = create_llm_from_settings(&settings);
    let agent = Agent::new(llm, settings);
    let mut stdout = std::io::stdout();

    if let Some(message) = cli.message {
        let reply = agent.run(&message).await?;
        print_reply(&mut stdout, &reply)?;
        return Ok(());
    }

    print_banner(&mut stdout, agent.reflection_enabled())?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let outcome = run_repl(&agent, stdin, &mut stdout, interrupt)
        .await
        .context("Interactive loop failed")?;
    tracing::info!(turns = outcome.turns, reason = ?outcome.reason, "session ended");

    // 中断时 stdin 上仍有挂起的阻塞读，运行时关闭会等它返回，直接退出进程
    if outcome.reason == ExitReason::Interrupted {
        std::process::exit(0);
    }

    Ok(())
}
