//! sys_dia: Show the system diagnostic script.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandError, CommandResult, ExecContext};
use crate::value::Value;

/// sys_dia command: returns the configured diagnostic script's contents.
pub struct SysDia;

#[async_trait]
impl Command for SysDia {
    fn name(&self) -> &str {
        "sys_dia"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn help(&self) -> &str {
        "show the system diagnostic script"
    }

    async fn execute(&self, _args: Vec<Value>, ctx: &ExecContext) -> CommandResult {
        let path = &ctx.config.diagnostic_script;
        tokio::fs::read_to_string(path).await.map_err(|e| {
            CommandError::failed(format!("failed to read file {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn ctx_with_script(path: std::path::PathBuf) -> ExecContext {
        ExecContext::new(EngineConfig {
            diagnostic_script: path,
            ..EngineConfig::default()
        })
    }

    #[tokio::test]
    async fn reads_script() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("test_sys.bat");
        std::fs::write(&path, "@echo off\nsysteminfo\n").expect("write");

        let out = SysDia
            .execute(vec![], &ctx_with_script(path))
            .await
            .expect("reads");
        assert_eq!(out, "@echo off\nsysteminfo\n");
    }

    #[tokio::test]
    async fn missing_script_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = SysDia
            .execute(vec![], &ctx_with_script(dir.path().join("absent.bat")))
            .await
            .expect_err("missing file");
        assert!(err.to_string().starts_with("failed to read file"));
    }
}
