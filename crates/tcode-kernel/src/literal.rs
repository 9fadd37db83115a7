//! Literal coercion for command arguments.
//!
//! Each raw field from [`crate::args::split_args`] becomes a typed [`Value`]:
//! quoted text is taken verbatim, literal syntax is evaluated, and anything
//! else passes through unchanged as a string.

use crate::interpreter::{Evaluator, Scope};
use crate::parser;
use crate::value::Value;

/// Coerce one trimmed argument token. Never fails.
pub fn coerce(token: &str) -> Value {
    if let Some(inner) = strip_quotes(token) {
        return Value::Str(inner.to_string());
    }
    literal(token).unwrap_or_else(|| Value::Str(token.to_string()))
}

/// Inner text of a token fully wrapped in matching `"` or `'` quotes.
///
/// No escape processing happens here; `"a\"b"` keeps its backslash.
pub fn strip_quotes(token: &str) -> Option<&str> {
    if token.len() < 2 {
        return None;
    }
    ['"', '\'']
        .into_iter()
        .find(|&q| token.starts_with(q) && token.ends_with(q))
        .map(|_| &token[1..token.len() - 1])
}

/// Evaluate `token` if it is made only of literals.
fn literal(token: &str) -> Option<Value> {
    let expr = parser::parse_expression(token).ok()?;
    if !expr.is_constant() {
        return None;
    }
    let mut scope = Scope::new();
    let mut sink = String::new();
    Evaluator::new(&mut scope, &mut sink).eval(&expr).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::quoted_number(r#""5""#, Value::Str("5".into()))]
    #[case::single_quoted("'hi there'", Value::Str("hi there".into()))]
    #[case::int("5", Value::Int(5))]
    #[case::negative("-3", Value::Int(-3))]
    #[case::float("2.5", Value::Float(2.5))]
    #[case::bool_true("True", Value::Bool(true))]
    #[case::none("None", Value::None)]
    #[case::identifier("foo", Value::Str("foo".into()))]
    #[case::dotted_name("var.x", Value::Str("var.x".into()))]
    #[case::list("[1, 'a']", Value::List(vec![Value::Int(1), Value::Str("a".into())]))]
    #[case::tuple("(1, 2)", Value::Tuple(vec![Value::Int(1), Value::Int(2)]))]
    #[case::dict("{'k': 1}", Value::Dict(vec![(Value::Str("k".into()), Value::Int(1))]))]
    #[case::set("{1, 1, 2}", Value::Set(vec![Value::Int(1), Value::Int(2)]))]
    #[case::arithmetic_rejected("1 + 2", Value::Str("1 + 2".into()))]
    #[case::call_rejected("len([])", Value::Str("len([])".into()))]
    #[case::name_in_list_rejected("[x]", Value::Str("[x]".into()))]
    #[case::empty("", Value::Str(String::new()))]
    #[case::lone_quote("\"", Value::Str("\"".into()))]
    #[case::mismatched_quotes("'a\"", Value::Str("'a\"".into()))]
    fn coercion(#[case] token: &str, #[case] expected: Value) {
        assert_eq!(coerce(token), expected);
    }

    #[test]
    fn quoted_text_keeps_escapes_verbatim() {
        assert_eq!(coerce(r#""a\nb""#), Value::Str(r"a\nb".into()));
    }
}
