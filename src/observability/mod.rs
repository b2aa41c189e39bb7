//! 可观测性：tracing 日志初始化
//!
//! 日志写到 stderr，避免与交互输出混在 stdout。
//! 级别优先级：force_debug > RUST_LOG > 配置中的默认级别。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(default_level: &str, force_debug: bool) -> anyhow::Result<()> {
    let filter = if force_debug {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}
