//! 交互循环：逐行读取问题，交给 TurnHandler，打印分段输出
//!
//! 两个状态：Prompting（读取下一行）/ Terminated（带 ExitReason）。`exit` / `quit`（不区分大小写）、Ctrl+C 或输入结束都会终止；
//! 单轮出错（含 panic）只打印错误，循环继续。

use std::future::Future;
use std::io::{self, Write};
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::agent::{AgentReply, TurnHandler};
use crate::core::AgentError;

/// 终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// 输入 exit / quit
    ExitCommand,
    /// Ctrl+C
    Interrupted,
    /// 输入流结束（EOF）
    EndOfInput,
}

/// 循环结束时的统计：实际交给 handler 的轮数与终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplOutcome {
    pub turns: usize,
    pub reason: ExitReason,
}

pub fn is_exit_command(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

pub fn print_banner<W: Write>(out: &mut W, reflection: bool) -> io::Result<()> {
    writeln!(out, "=== Coding Agent ===")?;
    if reflection {
        writeln!(out, "Reflection: enabled")?;
    }
    writeln!(out, "Enter your coding questions (Ctrl+C to exit)")?;
    writeln!(out, "Example: 'How do I implement a REST API with Flask?'")
}

/// 打印单轮回答（反思开启时追加 Reflection 段）
pub fn print_reply<W: Write>(out: &mut W, reply: &AgentReply) -> io::Result<()> {
    writeln!(out, "\n=== Agent's Response ===")?;
    writeln!(out, "{}", reply.response_text())?;
    if let Some(reflection) = reply.reflection_text() {
        writeln!(out, "\n=== Reflection ===")?;
        writeln!(out, "{}", reflection)?;
    }
    Ok(())
}

/// panic 负载转成可读文本
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 运行交互循环
///
/// - input：逐行读取（进程入口传 stdin，测试传字节切片）
/// - out：输出目标
/// - interrupt：完成即视为中断信号（进程入口传 Ctrl+C，测试传 `std::future::pending()`）
pub async fn run_repl<H, R, W, S>(
    handler: &H,
    input: R,
    out: &mut W,
    interrupt: S,
) -> io::Result<ReplOutcome>
where
    H: TurnHandler + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut lines = input.lines();
    let mut turns = 0;

    // Prompting 状态；每个 break 都是一次到 Terminated 的转移
    let reason = loop {
        writeln!(out, "\nEnter your question:")?;
        write!(out, "> ")?;
        out.flush()?;

        let line = tokio::select! {
            biased;
            _ = &mut interrupt => break ExitReason::Interrupted,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break ExitReason::EndOfInput,
            // 非 UTF-8 的一行只算一轮失败，读取器已越过该行
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(error = %e, "unreadable input line");
                writeln!(out, "\nError: {}", e)?;
                continue;
            }
            Err(e) => return Err(e),
        };

        if is_exit_command(&line) {
            break ExitReason::ExitCommand;
        }

        turns += 1;
        let turn = AssertUnwindSafe(handler.handle(&line)).catch_unwind();
        let result = tokio::select! {
            biased;
            _ = &mut interrupt => break ExitReason::Interrupted,
            result = turn => result.unwrap_or_else(|p| Err(AgentError::TurnPanicked(panic_message(p)))),
        };

        match result {
            Ok(reply) => print_reply(out, &reply)?,
            Err(e) => {
                tracing::warn!(error = %e, "turn failed");
                writeln!(out, "\nError: {}", e)?;
            }
        }
    };

    if reason == ExitReason::Interrupted {
        writeln!(out, "\nExiting...")?;
    }
    out.flush()?;

    Ok(ReplOutcome { turns, reason })
}
