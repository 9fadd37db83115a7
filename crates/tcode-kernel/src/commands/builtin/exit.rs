//! exit: Ask the front-end to terminate.
//!
//! The engine never exits the process itself; it raises a flag the host
//! checks after each result.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandResult, ExecContext};
use crate::value::Value;

pub struct Exit;

#[async_trait]
impl Command for Exit {
    fn name(&self) -> &str {
        "exit"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn help(&self) -> &str {
        "leave the program"
    }

    async fn execute(&self, _args: Vec<Value>, ctx: &ExecContext) -> CommandResult {
        tracing::info!("exit requested");
        ctx.request_exit();
        Ok("exiting".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sets_exit_flag() {
        let ctx = ExecContext::for_tests();
        let out = Exit.execute(vec![], &ctx).await.expect("succeeds");
        assert_eq!(out, "exiting");
        assert!(ctx.exit_requested());
    }
}
