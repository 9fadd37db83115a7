//! Execution context for commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::EngineConfig;
use crate::interpreter::Scope;
use crate::process::ProcessRunner;
use crate::value::Value;

/// Engine state a command handler may touch.
///
/// Cheap to clone; every field is shared with the owning engine.
#[derive(Debug, Clone)]
pub struct ExecContext {
    /// Variable store shared with fallback code.
    pub scope: Arc<RwLock<Scope>>,
    /// External process runner (`cmd`, `cmd_kill`).
    pub runner: Arc<ProcessRunner>,
    pub config: Arc<EngineConfig>,
    exit: Arc<AtomicBool>,
}

impl ExecContext {
    pub fn new(config: EngineConfig) -> Self {
        let runner = ProcessRunner::new(config.process.clone());
        Self {
            scope: Arc::new(RwLock::new(Scope::new())),
            runner: Arc::new(runner),
            config: Arc::new(config),
            exit: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn set_var(&self, name: impl Into<String>, value: Value) {
        self.scope.write().await.set(name, value);
    }

    pub async fn get_var(&self, name: &str) -> Option<Value> {
        self.scope.read().await.get(name).cloned()
    }

    /// Ask the front-end to terminate.
    pub fn request_exit(&self) {
        self.exit.store(true, Ordering::SeqCst);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_state() {
        let ctx = ExecContext::for_tests();
        let other = ctx.clone();
        ctx.set_var("x", Value::Int(1)).await;
        assert_eq!(other.get_var("x").await, Some(Value::Int(1)));

        assert!(!other.exit_requested());
        ctx.request_exit();
        assert!(other.exit_requested());
    }
}
