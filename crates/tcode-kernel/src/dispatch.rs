//! Matching input against the registry and invoking the winner.
//!
//! Matching is pure: it looks at the registry and the text only. Invocation
//! checks the arity and runs the handler.

use std::sync::Arc;

use crate::args::split_args;
use crate::commands::{Command, CommandRegistry, ExecContext};
use crate::error::{EngineError, Outcome};
use crate::literal::coerce;
use crate::value::Value;

/// Name of the command that `cmd <rest>` shorthand resolves to.
pub const SHELL_COMMAND: &str = "cmd";

/// A command selected for some input, with its coerced arguments.
pub struct Invocation {
    pub command: Arc<dyn Command>,
    pub args: Vec<Value>,
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("command", &self.command.name())
            .field("args", &self.args)
            .finish()
    }
}

/// Resolve `input` to a command invocation, if any registration matches.
///
/// The `cmd <rest>` shorthand is tried before the structural patterns.
pub fn match_input(registry: &CommandRegistry, input: &str) -> Option<Invocation> {
    let input = input.trim();
    if let Some(invocation) = shorthand(registry, input) {
        return Some(invocation);
    }

    let (registration, interior) = registry.find_match(input)?;
    let args = split_args(interior.trim()).iter().map(|t| coerce(t)).collect();
    Some(Invocation {
        command: Arc::clone(registration.command()),
        args,
    })
}

/// `cmd <rest>` on a single line with no parentheses. `rest` becomes the
/// sole argument as written, commas and quotes included.
pub fn shorthand(registry: &CommandRegistry, input: &str) -> Option<Invocation> {
    if input.contains(['\n', '(', ')']) {
        return None;
    }
    let rest = input.strip_prefix(SHELL_COMMAND)?;
    if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
        return None;
    }
    let registration = registry.get(SHELL_COMMAND)?;
    Some(Invocation {
        command: Arc::clone(registration.command()),
        args: vec![Value::Str(rest.trim().to_string())],
    })
}

/// Check the arity and run the handler.
pub async fn invoke(invocation: Invocation, ctx: &ExecContext) -> Outcome {
    let Invocation { command, args } = invocation;
    let name = command.name();
    let expected = command.arity();
    if !expected.accepts(args.len()) {
        tracing::debug!(name, %expected, got = args.len(), "arity mismatch");
        return Err(EngineError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }

    tracing::debug!(name, args = args.len(), "dispatching command");
    command
        .execute(args, ctx)
        .await
        .map_err(|e| EngineError::from_command(name, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::commands::{Arity, CommandError, FnCommand};
    use crate::error::ErrorKind;

    fn echo(name: &str, arity: Arity) -> Arc<dyn Command> {
        Arc::new(FnCommand::new(name, arity, |args: Vec<Value>, _: &ExecContext| {
            Ok(args
                .iter()
                .map(Value::repr)
                .collect::<Vec<_>>()
                .join(" "))
        }))
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(echo("var.create", Arity::Exact(2)), "!", "").expect("valid");
        registry.register(echo("help", Arity::Exact(0)), "", "").expect("valid");
        registry.register(echo("cmd", Arity::Exact(1)), "", "").expect("valid");
        registry
    }

    #[test]
    fn coerces_matched_arguments() {
        let inv = match_input(&registry(), "!var.create(x, 10)").expect("matches");
        assert_eq!(inv.command.name(), "var.create");
        assert_eq!(inv.args, vec![Value::Str("x".into()), Value::Int(10)]);
    }

    #[test]
    fn empty_parens_give_no_arguments() {
        let inv = match_input(&registry(), "  help()  ").expect("matches");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn blank_parens_give_no_arguments() {
        let inv = match_input(&registry(), "help( )").expect("matches");
        assert!(inv.args.is_empty());
        let inv = match_input(&registry(), "help(\t \n)").expect("matches");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn unmatched_input_is_none() {
        assert!(match_input(&registry(), "x = 1").is_none());
        assert!(match_input(&registry(), "var.create(x, 1)").is_none());
    }

    #[test]
    fn shorthand_keeps_rest_verbatim() {
        let inv = match_input(&registry(), "cmd echo 'a, b'").expect("matches");
        assert_eq!(inv.command.name(), "cmd");
        assert_eq!(inv.args, vec![Value::Str("echo 'a, b'".into())]);
    }

    #[test]
    fn shorthand_needs_a_separated_rest() {
        let registry = registry();
        assert!(shorthand(&registry, "cmd").is_none());
        assert!(shorthand(&registry, "cmdx ls").is_none());
        assert!(shorthand(&registry, "cmd ls\ncmd pwd").is_none());
        // With parentheses the structural pattern applies instead.
        assert!(shorthand(&registry, "cmd echo (hi)").is_none());
    }

    #[test]
    fn shorthand_requires_registered_cmd() {
        assert!(shorthand(&CommandRegistry::new(), "cmd ls").is_none());
    }

    #[tokio::test]
    async fn arity_mismatch_skips_handler() {
        static CALLED: AtomicBool = AtomicBool::new(false);
        let mut registry = CommandRegistry::new();
        registry
            .register(
                Arc::new(FnCommand::new("pair", Arity::Exact(2), |_: Vec<Value>, _: &ExecContext| {
                    CALLED.store(true, Ordering::SeqCst);
                    Ok(String::new())
                })),
                "",
                "",
            )
            .expect("valid");

        let inv = match_input(&registry, "pair(1)").expect("matches");
        let err = invoke(inv, &ExecContext::for_tests()).await.expect_err("arity");
        assert_eq!(err.kind(), ErrorKind::Arity);
        assert_eq!(err.to_string(), "pair: expected 2 argument(s), got 1");
        assert!(!CALLED.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn handler_failure_names_the_command() {
        let inv = Invocation {
            command: Arc::new(FnCommand::new("boom", Arity::Variadic, |_: Vec<Value>, _: &ExecContext| {
                Err(CommandError::failed("bad input"))
            })),
            args: vec![],
        };
        let err = invoke(inv, &ExecContext::for_tests()).await.expect_err("fails");
        assert_eq!(err.kind(), ErrorKind::Handler);
        assert_eq!(err.to_string(), "boom failed: bad input");
    }
}
