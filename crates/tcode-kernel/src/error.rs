//! Error types surfaced by the engine.
//!
//! Every failure the engine reports carries a human-readable message and an
//! [`ErrorKind`] callers can branch on. Front-ends render both uniformly.

use thiserror::Error;

use crate::commands::{Arity, CommandError};
use crate::interpreter::EvalError;
use crate::process::ProcessError;

/// Result of dispatching one line or block.
pub type Outcome = Result<String, EngineError>;

/// Machine-readable category of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input was empty or whitespace only.
    EmptyInput,
    /// Argument count did not fit the command's arity.
    Arity,
    /// `call_command` named a command that is not registered.
    UnknownCommand,
    /// A command handler failed.
    Handler,
    /// Fallback code failed to parse or raised at runtime.
    Fallback,
    /// The process runner could not find the requested program.
    ProcessNotFound,
    /// The process runner is already tracking a running command.
    ProcessBusy,
    /// Any other process runner failure.
    Process,
    /// A command could not be registered.
    Registration,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("empty command")]
    EmptyInput,

    #[error("{name}: expected {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: Arity,
        got: usize,
    },

    #[error("command '{0}' not found")]
    UnknownCommand(String),

    #[error("{name} failed: {message}")]
    Handler { name: String, message: String },

    #[error("python error: {0}")]
    Fallback(#[from] EvalError),

    #[error("{name}: command not found: {program}")]
    ProcessNotFound { name: String, program: String },

    #[error("{name}: {message}")]
    ProcessBusy { name: String, message: String },

    #[error("{name}: process error: {message}")]
    Process { name: String, message: String },

    #[error("cannot register '{name}': {message}")]
    Registration { name: String, message: String },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EmptyInput => ErrorKind::EmptyInput,
            EngineError::Arity { .. } => ErrorKind::Arity,
            EngineError::UnknownCommand(_) => ErrorKind::UnknownCommand,
            EngineError::Handler { .. } => ErrorKind::Handler,
            EngineError::Fallback(_) => ErrorKind::Fallback,
            EngineError::ProcessNotFound { .. } => ErrorKind::ProcessNotFound,
            EngineError::ProcessBusy { .. } => ErrorKind::ProcessBusy,
            EngineError::Process { .. } => ErrorKind::Process,
            EngineError::Registration { .. } => ErrorKind::Registration,
        }
    }

    /// Attach the failing command's name to a handler error.
    pub fn from_command(name: &str, err: CommandError) -> Self {
        let name = name.to_string();
        match err {
            CommandError::Failed(message) => EngineError::Handler { name, message },
            CommandError::Process(ProcessError::NotFound(program)) => {
                EngineError::ProcessNotFound { name, program }
            }
            CommandError::Process(err @ ProcessError::Busy { .. }) => EngineError::ProcessBusy {
                name,
                message: err.to_string(),
            },
            CommandError::Process(err) => EngineError::Process {
                name,
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_message_names_both_counts() {
        let err = EngineError::Arity {
            name: "var.create".into(),
            expected: Arity::Exact(2),
            got: 1,
        };
        assert_eq!(err.kind(), ErrorKind::Arity);
        assert_eq!(err.to_string(), "var.create: expected 2 argument(s), got 1");
    }

    #[test]
    fn process_errors_keep_distinct_kinds() {
        let not_found =
            EngineError::from_command("cmd", ProcessError::NotFound("nosuch".into()).into());
        assert_eq!(not_found.kind(), ErrorKind::ProcessNotFound);
        assert!(not_found.to_string().contains("nosuch"));

        let busy = EngineError::from_command(
            "cmd",
            ProcessError::Busy {
                running: "sleep 5".into(),
            }
            .into(),
        );
        assert_eq!(busy.kind(), ErrorKind::ProcessBusy);
    }

    #[test]
    fn fallback_errors_render_with_kind() {
        let err = EngineError::from(EvalError::Name("x".into()));
        assert_eq!(err.kind(), ErrorKind::Fallback);
        assert_eq!(err.to_string(), "python error: NameError: name 'x' is not defined");
    }

    #[test]
    fn handler_failure_names_command() {
        let err = EngineError::from_command("sys_dia", CommandError::Failed("boom".into()));
        assert_eq!(err.kind(), ErrorKind::Handler);
        assert_eq!(err.to_string(), "sys_dia failed: boom");
    }
}
