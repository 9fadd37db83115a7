//! cmd, cmd_init, cmd_kill: Run and cancel system commands.
//!
//! # Examples
//!
//! ```text
//! cmd("pip list")
//! cmd ls -la            (shorthand, no parentheses)
//! cmd_init()
//! cmd_init("Windows")
//! cmd_kill()
//! ```

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandResult, ExecContext};
use crate::value::Value;

/// cmd command: runs one shell command line through the process runner.
pub struct Cmd;

#[async_trait]
impl Command for Cmd {
    fn name(&self) -> &str {
        "cmd"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn help(&self) -> &str {
        "cmd(\"command\"): run a system command"
    }

    async fn execute(&self, args: Vec<Value>, ctx: &ExecContext) -> CommandResult {
        let line = args.into_iter().next().unwrap_or(Value::None).to_string();
        Ok(ctx.runner.run(&line).await?)
    }
}

/// cmd_init command: reports the platform the command line targets.
pub struct CmdInit;

#[async_trait]
impl Command for CmdInit {
    fn name(&self) -> &str {
        "cmd_init"
    }

    fn arity(&self) -> Arity {
        Arity::Between(0, 1)
    }

    fn help(&self) -> &str {
        "initialize the command line"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &ExecContext) -> CommandResult {
        Ok(init_message(args.first()))
    }
}

/// Text for `cmd_init`, optionally for an explicitly named platform.
pub(crate) fn init_message(platform: Option<&Value>) -> String {
    if let Some(platform) = platform {
        return format!("command line initialized for {platform}");
    }
    match detect_platform() {
        Some(name) => format!("command line initialized for {name}"),
        None => "command line initialized (unknown system)".to_string(),
    }
}

fn detect_platform() -> Option<&'static str> {
    match std::env::consts::OS {
        "windows" => Some("Windows"),
        "linux" => Some("Linux"),
        "macos" => Some("macOS"),
        _ => None,
    }
}

/// cmd_kill command: cancels the running system command.
pub struct CmdKill;

#[async_trait]
impl Command for CmdKill {
    fn name(&self) -> &str {
        "cmd_kill"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn help(&self) -> &str {
        "interrupt the running command"
    }

    async fn execute(&self, _args: Vec<Value>, ctx: &ExecContext) -> CommandResult {
        Ok(ctx.runner.kill().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::NOTHING_TO_CANCEL;

    #[test]
    fn init_message_for_named_platform() {
        assert_eq!(
            init_message(Some(&Value::Str("Windows".into()))),
            "command line initialized for Windows"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn init_message_detects_linux() {
        assert_eq!(init_message(None), "command line initialized for Linux");
    }

    #[tokio::test]
    async fn kill_with_nothing_running() {
        let out = CmdKill
            .execute(vec![], &ExecContext::for_tests())
            .await
            .expect("succeeds");
        assert_eq!(out, NOTHING_TO_CANCEL);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cmd_runs_shell_line() {
        let out = Cmd
            .execute(vec![Value::Str("echo hi".into())], &ExecContext::for_tests())
            .await
            .expect("runs");
        assert_eq!(out, "hi");
    }
}
