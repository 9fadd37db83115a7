//! The Engine: one interpreter session.
//!
//! Owns the command registry and the execution context (variables, process
//! runner, configuration). Everything the front-end does goes through here.
//!
//! ```text
//! text ──► partition ──► command line ──► match ──► invoke ──► Outcome
//!                   └──► code run ─────► match ──► fallback ─► Outcome
//! ```
//!
//! All entry points take `&self`, so one `Arc<Engine>` can run `cmd` on one
//! task while another issues `cmd_kill`.

use std::sync::Arc;

use crate::commands::{
    register_builtins, Arity, Command, CommandRegistry, CommandResult, ExecContext, FnCommand,
};
use crate::compiler::{self, BlockOutput, Segment};
use crate::config::EngineConfig;
use crate::dispatch::{self, Invocation};
use crate::error::{EngineError, Outcome};
use crate::interpreter;
use crate::process::ProcessRunner;
use crate::value::Value;

pub struct Engine {
    registry: CommandRegistry,
    ctx: ExecContext,
}

impl Engine {
    /// Create an engine with the built-in commands installed.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let mut engine = Self::bare(config);
        let prefix = engine.ctx.config.command_prefix.clone();
        register_builtins(&mut engine.registry, &prefix).map_err(|e| {
            EngineError::Registration {
                name: "builtins".to_string(),
                message: e.to_string(),
            }
        })?;
        tracing::debug!(commands = ?engine.registry.names(), "engine ready");
        Ok(engine)
    }

    /// Create an engine with an empty registry.
    pub fn bare(config: EngineConfig) -> Self {
        Self {
            registry: CommandRegistry::new(),
            ctx: ExecContext::new(config),
        }
    }

    /// Register a command implementation. `start` and `end` are literal
    /// delimiters required around `name(args)`; either may be empty.
    pub fn register(
        &mut self,
        command: Arc<dyn Command>,
        start: &str,
        end: &str,
    ) -> Result<(), EngineError> {
        let name = command.name().to_string();
        self.registry
            .register(command, start, end)
            .map_err(|e| EngineError::Registration {
                name,
                message: e.to_string(),
            })
    }

    /// Register a closure as a command.
    pub fn register_command<F>(
        &mut self,
        name: &str,
        arity: Arity,
        handler: F,
        start: &str,
        end: &str,
    ) -> Result<(), EngineError>
    where
        F: Fn(Vec<Value>, &ExecContext) -> CommandResult + Send + Sync + 'static,
    {
        self.register(Arc::new(FnCommand::new(name, arity, handler)), start, end)
    }

    /// Compile a whole block: command lines one by one, each run of
    /// ordinary code as a unit, results in source order.
    pub async fn compile_block(&self, text: &str) -> Result<BlockOutput, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let prefix = self.ctx.config.command_prefix.as_str();
        let mut output = BlockOutput::default();
        for segment in compiler::partition(text, prefix) {
            let outcome = match segment {
                Segment::Command(line) => self.dispatch_command_line(line, prefix).await,
                Segment::Code(code) => self.dispatch(&code).await,
            };
            output.segments.push(outcome);
        }
        Ok(output)
    }

    /// [`Engine::compile_block`] rendered to text, errors included.
    pub async fn compile(&self, text: &str) -> String {
        match self.compile_block(text).await {
            Ok(output) => output.render(),
            Err(e) => e.to_string(),
        }
    }

    /// Dispatch one unit: a matching command if there is one, otherwise
    /// fallback execution.
    pub async fn dispatch(&self, input: &str) -> Outcome {
        let input = input.trim();
        if input.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        match dispatch::match_input(&self.registry, input) {
            Some(invocation) => self.invoke(invocation).await,
            None => self.execute_fallback(input).await,
        }
    }

    /// A prefixed line is matched as written, then with the prefix removed.
    async fn dispatch_command_line(&self, line: &str, prefix: &str) -> Outcome {
        let invocation = dispatch::match_input(&self.registry, line).or_else(|| {
            let bare = line.strip_prefix(prefix)?;
            dispatch::match_input(&self.registry, bare)
        });
        match invocation {
            Some(invocation) => self.invoke(invocation).await,
            None => {
                tracing::debug!(%line, "no command matched prefixed line");
                self.execute_fallback(line).await
            }
        }
    }

    /// Invoke a registered command by name with already-coerced arguments.
    pub async fn call_command(&self, name: &str, args: Vec<Value>) -> Outcome {
        let registration = self
            .registry
            .get(name)
            .ok_or_else(|| EngineError::UnknownCommand(name.to_string()))?;
        let invocation = Invocation {
            command: Arc::clone(registration.command()),
            args,
        };
        self.invoke(invocation).await
    }

    /// Run ordinary code against the session's variables.
    pub async fn execute_fallback(&self, code: &str) -> Outcome {
        tracing::debug!(bytes = code.len(), "fallback execution");
        let mut scope = self.ctx.scope.write().await;
        Ok(interpreter::run_fallback(code, &mut scope)?)
    }

    async fn invoke(&self, invocation: Invocation) -> Outcome {
        dispatch::invoke(invocation, &self.ctx).await
    }

    pub async fn get_var(&self, name: &str) -> Option<Value> {
        self.ctx.get_var(name).await
    }

    pub async fn set_var(&self, name: &str, value: Value) {
        self.ctx.set_var(name, value).await;
    }

    /// All variables, sorted by name.
    pub async fn list_vars(&self) -> Vec<(String, Value)> {
        self.ctx.scope.read().await.all()
    }

    /// Whether `exit()` has been called.
    pub fn exit_requested(&self) -> bool {
        self.ctx.exit_requested()
    }

    pub fn runner(&self) -> &Arc<ProcessRunner> {
        &self.ctx.runner
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    pub fn context(&self) -> &ExecContext {
        &self.ctx
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("prefix", &self.ctx.config.command_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtin::HELP_TEXT;
    use crate::error::ErrorKind;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).expect("builtins register")
    }

    #[tokio::test]
    async fn blank_block_is_empty_input() {
        let err = engine().compile_block("  \n ").await.expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
        assert_eq!(engine().compile("").await, "empty command");
    }

    #[tokio::test]
    async fn prefixed_line_reaches_undecorated_command() {
        assert_eq!(engine().compile("!help()").await, HELP_TEXT.trim());
    }

    #[tokio::test]
    async fn unprefixed_code_run_reaches_commands() {
        assert_eq!(engine().compile("help()").await, HELP_TEXT.trim());
    }

    #[tokio::test]
    async fn unmatched_prefixed_line_goes_to_fallback() {
        let out = engine().compile("!nothing_here(1)").await;
        assert!(out.starts_with("python error: SyntaxError"), "{out}");
    }

    #[tokio::test]
    async fn code_run_executes_as_one_unit() {
        let engine = engine();
        let output = engine.compile_block("a = 2\nb = a * 3\nprint(b)").await.expect("runs");
        assert_eq!(output.segments.len(), 1);
        assert_eq!(output.render(), "6");
        assert_eq!(engine.get_var("b").await, Some(Value::Int(6)));
    }

    #[tokio::test]
    async fn call_command_by_name() {
        let engine = engine();
        let out = engine
            .call_command("var.create", vec![Value::Str("n".into()), Value::Int(3)])
            .await
            .expect("creates");
        assert_eq!(out, "created n = 3");

        let err = engine.call_command("nope", vec![]).await.expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::UnknownCommand);
    }

    #[tokio::test]
    async fn closure_commands_can_be_registered() {
        let mut engine = Engine::bare(EngineConfig::default());
        engine
            .register_command(
                "shout",
                Arity::Exact(1),
                |args: Vec<Value>, _: &ExecContext| Ok(args[0].to_string().to_uppercase()),
                "<",
                ">",
            )
            .expect("registers");
        assert_eq!(engine.compile("<shout('hey')>").await, "HEY");
        assert_eq!(engine.registry().names(), vec!["shout"]);
    }

    #[tokio::test]
    async fn exit_sets_the_flag() {
        let engine = engine();
        assert!(!engine.exit_requested());
        assert_eq!(engine.compile("exit()").await, "exiting");
        assert!(engine.exit_requested());
    }
}
