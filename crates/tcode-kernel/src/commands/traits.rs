//! The command trait and its supporting types.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::process::ProcessError;
use crate::value::Value;

use super::ExecContext;

/// What a command handler returns.
pub type CommandResult = Result<String, CommandError>;

/// A failure inside a command handler.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl CommandError {
    pub fn failed(message: impl Into<String>) -> Self {
        CommandError::Failed(message.into())
    }
}

/// How many arguments a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive range.
    Between(usize, usize),
    /// Any count; the handler checks for itself.
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Between(min, max) => write!(f, "{min} to {max}"),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

/// A command invocable from engine input.
#[async_trait]
pub trait Command: Send + Sync {
    /// Name matched in `name(args)` invocations.
    fn name(&self) -> &str;

    fn arity(&self) -> Arity;

    /// One-line summary.
    fn help(&self) -> &str {
        ""
    }

    /// Run with coerced positional arguments. The arity has already been
    /// checked by the dispatcher.
    async fn execute(&self, args: Vec<Value>, ctx: &ExecContext) -> CommandResult;
}

/// Adapts a plain closure into a [`Command`].
pub struct FnCommand<F> {
    name: String,
    arity: Arity,
    help: String,
    func: F,
}

impl<F> FnCommand<F>
where
    F: Fn(Vec<Value>, &ExecContext) -> CommandResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, arity: Arity, func: F) -> Self {
        Self {
            name: name.into(),
            arity,
            help: String::new(),
            func,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

#[async_trait]
impl<F> Command for FnCommand<F>
where
    F: Fn(Vec<Value>, &ExecContext) -> CommandResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn help(&self) -> &str {
        &self.help
    }

    async fn execute(&self, args: Vec<Value>, ctx: &ExecContext) -> CommandResult {
        (self.func)(args, ctx)
    }
}

impl<F> fmt::Debug for FnCommand<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCommand")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}
