//! program_init: Prepare the machine for the editor's assistant.
//!
//! Runs `cmd_init`, then each configured setup command in order, and returns
//! a transcript of everything that happened. A failing step is recorded in
//! the transcript and the remaining steps still run.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandResult, ExecContext};
use crate::value::Value;

use super::cmd::init_message;

pub const DONE_BANNER: &str = "============= done =============";

pub struct ProgramInit;

#[async_trait]
impl Command for ProgramInit {
    fn name(&self) -> &str {
        "program_init"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn help(&self) -> &str {
        "install dependencies and start the assistant service"
    }

    async fn execute(&self, _args: Vec<Value>, ctx: &ExecContext) -> CommandResult {
        let mut transcript = vec![init_message(None)];

        for line in &ctx.config.setup_commands {
            tracing::info!(command = %line, "setup step");
            let result = match ctx.runner.run(line).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(command = %line, error = %e, "setup step failed");
                    e.to_string()
                }
            };
            transcript.push(format!("$  cmd {line}\n{result}"));
        }

        transcript.push(DONE_BANNER.to_string());
        Ok(transcript.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn ctx_with_steps(steps: &[&str]) -> ExecContext {
        ExecContext::new(EngineConfig {
            setup_commands: steps.iter().map(|s| s.to_string()).collect(),
            ..EngineConfig::default()
        })
    }

    #[tokio::test]
    async fn no_steps_still_initializes() {
        let out = ProgramInit
            .execute(vec![], &ctx_with_steps(&[]))
            .await
            .expect("succeeds");
        assert!(out.starts_with("command line initialized"));
        assert!(out.ends_with(DONE_BANNER));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn transcript_lists_each_step_in_order() {
        let out = ProgramInit
            .execute(vec![], &ctx_with_steps(&["echo one", "tcode_missing_tool", "echo two"]))
            .await
            .expect("succeeds");

        let one = out.find("$  cmd echo one\none").expect("first step");
        let missing = out.find("command not found: tcode_missing_tool").expect("failed step");
        let two = out.find("$  cmd echo two\ntwo").expect("last step");
        assert!(one < missing && missing < two);
    }
}
