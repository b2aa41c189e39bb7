//! UI 层：行式交互循环

pub mod repl;

pub use repl::{is_exit_command, print_banner, print_reply, run_repl, ExitReason, ReplOutcome};
