//! Argument tokenizer for command invocations.
//!
//! Splits the text between a command's parentheses into top-level fields:
//!
//! ```text
//! a, "b,c", [1,2]   →   a | "b,c" | [1,2]
//! ```
//!
//! A comma separates fields only outside string literals and outside any
//! `()`, `[]` or `{}` nesting. Quotes stay part of the field; literal
//! coercion strips them later.

/// Scanner state shared by [`split_args`] and [`is_balanced`].
#[derive(Debug, Default)]
struct Scanner {
    /// Active quote character while inside a string literal.
    quote: Option<char>,
    paren: i32,
    brace: i32,
    bracket: i32,
    /// Set once any closing bracket appears without a matching opener.
    underflow: bool,
}

impl Scanner {
    fn at_top_level(&self) -> bool {
        self.quote.is_none() && self.paren == 0 && self.brace == 0 && self.bracket == 0
    }

    /// Track nesting for one character outside a string.
    fn track_bracket(&mut self, ch: char) {
        let counter = match ch {
            '(' | ')' => &mut self.paren,
            '{' | '}' => &mut self.brace,
            '[' | ']' => &mut self.bracket,
            _ => return,
        };
        if matches!(ch, '(' | '{' | '[') {
            *counter += 1;
        } else {
            *counter -= 1;
            if *counter < 0 {
                self.underflow = true;
            }
        }
    }
}

/// Split a parenthesized argument string into trimmed top-level fields.
///
/// An escaped quote (`\"` inside a `"`-string) is kept as a literal quote and
/// the backslash is dropped. Unbalanced brackets are not an error here; an
/// unclosed opener simply keeps later commas from splitting.
pub fn split_args(params: &str) -> Vec<String> {
    let params = params.trim();
    if params.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut scanner = Scanner::default();

    for ch in params.chars() {
        match scanner.quote {
            Some(q) if ch == q => {
                if current.ends_with('\\') {
                    current.pop();
                } else {
                    scanner.quote = None;
                }
                current.push(ch);
            }
            Some(_) => current.push(ch),
            None => {
                if ch == '"' || ch == '\'' {
                    scanner.quote = Some(ch);
                    current.push(ch);
                } else if ch == ',' && scanner.at_top_level() {
                    parts.push(current.trim().to_string());
                    current.clear();
                } else {
                    scanner.track_bracket(ch);
                    current.push(ch);
                }
            }
        }
    }

    if !current.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// True when every bracket in `params` closes in order and no string is
/// left open.
///
/// The matcher uses this to reject a "structural" match whose captured
/// interior actually spans two calls, e.g. `)\nhelp(` out of
/// `help()\nhelp()`.
pub fn is_balanced(params: &str) -> bool {
    let mut scanner = Scanner::default();
    let mut prev = None;
    for ch in params.chars() {
        match scanner.quote {
            Some(q) if ch == q && prev != Some('\\') => scanner.quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => scanner.quote = Some(ch),
            None => scanner.track_bracket(ch),
        }
        if scanner.underflow {
            return false;
        }
        prev = Some(ch);
    }
    scanner.at_top_level()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn splits_quoted_and_bracketed_fields() {
        assert_eq!(split_args(r#"a, "b,c", [1,2]"#), vec!["a", r#""b,c""#, "[1,2]"]);
    }

    #[test]
    fn empty_input_yields_no_fields() {
        assert!(split_args("").is_empty());
    }

    #[rstest]
    #[case::nested_call("f(a, b), c", &["f(a, b)", "c"])]
    #[case::dict("{'k': 1, 'j': 2}, x", &["{'k': 1, 'j': 2}", "x"])]
    #[case::single_quotes("'a,b', 'c'", &["'a,b'", "'c'"])]
    #[case::brackets_inside_string(r#""(", x"#, &[r#""(""#, "x"])]
    #[case::trailing_comma("a,", &["a"])]
    #[case::whitespace_after_comma("a, ", &["a"])]
    #[case::whitespace_only("  \t ", &[])]
    #[case::empty_middle_field("a, , b", &["a", "", "b"])]
    #[case::surrounding_whitespace("  x  ,\ty ", &["x", "y"])]
    fn split_cases(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(split_args(input), expected);
    }

    #[test]
    fn escaped_quote_is_literal_content() {
        assert_eq!(split_args(r#""say \"hi\", ok", 2"#), vec![r#""say "hi", ok""#, "2"]);
    }

    #[test]
    fn unbalanced_opener_swallows_later_commas() {
        assert_eq!(split_args("[1, 2, 3"), vec!["[1, 2, 3"]);
    }

    #[rstest]
    #[case::empty("", true)]
    #[case::simple("a, [1, (2)]", true)]
    #[case::two_calls(")\nhelp(", false)]
    #[case::unclosed("[1, 2", false)]
    #[case::open_string("'abc", false)]
    #[case::bracket_in_string("')'", true)]
    fn balance(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_balanced(input), expected);
    }

    /// A field that never contains a top-level comma.
    fn field() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z0-9_.]{1,8}",
            "[a-z ,]{0,8}".prop_map(|s| format!("\"{s}\"")),
            "[a-z ,]{0,8}".prop_map(|s| format!("'{s}'")),
            prop::collection::vec("[0-9]{1,3}", 0..4).prop_map(|v| format!("[{}]", v.join(", "))),
            prop::collection::vec("[a-z]{1,3}", 0..3).prop_map(|v| format!("({})", v.join(","))),
        ]
    }

    proptest! {
        #[test]
        fn split_then_join_preserves_fields(fields in prop::collection::vec(field(), 1..6)) {
            let joined = fields.join(" ,  ");
            let split = split_args(&joined);
            prop_assert_eq!(split, fields);
        }

        #[test]
        fn balanced_fields_stay_balanced(fields in prop::collection::vec(field(), 0..6)) {
            prop_assert!(is_balanced(&fields.join(",")));
        }
    }
}
