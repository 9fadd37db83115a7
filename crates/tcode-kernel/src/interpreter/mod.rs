//! Fallback execution of ordinary (non-command) code.
//!
//! A block is first parsed as a single expression. If that parses, its value
//! is rendered (unless it is `None`) ahead of anything `print` wrote. If it
//! does not parse as an expression, the block runs as statements and only
//! `print` output is returned. An empty result becomes `OK`.

mod builtins;
mod eval;
mod scope;

pub use builtins::{is_builtin, BUILTINS};
pub use eval::{EvalError, EvalResult, Evaluator};
pub use scope::Scope;

use crate::parser;
use crate::value::Value;

/// Sentinel returned when fallback code produced neither a value nor output.
pub const OK: &str = "OK";

/// Run a block of fallback code against `scope`.
///
/// Bindings made before a runtime error stay in `scope`.
pub fn run_fallback(code: &str, scope: &mut Scope) -> EvalResult<String> {
    let mut out = String::new();

    let rendered = match parser::parse_expression(code) {
        Ok(expr) => {
            let value = Evaluator::new(scope, &mut out).eval(&expr)?;
            let mut text = match value {
                Value::None => String::new(),
                value => format!("{value}\n"),
            };
            text.push_str(&out);
            text
        }
        Err(_) => {
            let program = parser::parse(code)
                .map_err(|errs| EvalError::Syntax(parser::describe(&errs)))?;
            Evaluator::new(scope, &mut out).run(&program)?;
            out
        }
    };

    let trimmed = rendered.trim();
    Ok(if trimmed.is_empty() {
        OK.to_string()
    } else {
        trimmed.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str, scope: &mut Scope) -> String {
        run_fallback(code, scope).expect("runs")
    }

    #[test]
    fn expression_value_is_rendered() {
        assert_eq!(run("1 + 2", &mut Scope::new()), "3");
    }

    #[test]
    fn none_value_with_no_output_is_ok() {
        assert_eq!(run("None", &mut Scope::new()), OK);
    }

    #[test]
    fn print_output_follows_value() {
        assert_eq!(run("print('hi')", &mut Scope::new()), "hi");
    }

    #[test]
    fn assignment_runs_as_statement() {
        let mut scope = Scope::new();
        assert_eq!(run("x = 1", &mut scope), OK);
        assert_eq!(scope.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn statement_block_returns_only_printed_text() {
        let mut scope = Scope::new();
        let out = run("a = 2\nb = a * 3\nprint(a, b)\nb", &mut scope);
        assert_eq!(out, "2 6");
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = run_fallback("x = = 1", &mut Scope::new()).expect_err("bad syntax");
        assert_eq!(err.kind_name(), "SyntaxError");
    }

    #[test]
    fn partial_effects_survive_runtime_error() {
        let mut scope = Scope::new();
        let err = run_fallback("y = 5\nz = y / 0", &mut scope).expect_err("division");
        assert_eq!(err.kind_name(), "ZeroDivisionError");
        assert_eq!(scope.get("y"), Some(&Value::Int(5)));
        assert!(!scope.contains("z"));
    }
}
