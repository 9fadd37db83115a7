//! Parser for the fallback scripting language.
//!
//! Transforms the token stream from the lexer into an AST using chumsky
//! combinators. Two entry points mirror how fallback code is executed: a
//! block is first tried as one expression ([`parse_expression`]) and only
//! then as a sequence of statements ([`parse`]).

use crate::ast::{AssignOp, BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::lexer::{self, Token};
use crate::value::Value;
use chumsky::{input::ValueInput, prelude::*};

/// Span type used throughout the parser.
pub type Span = SimpleSpan;

/// Parse error with location and context.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message, self.span.start)
    }
}

impl std::error::Error for ParseError {}

/// Render a batch of parse errors as one line.
pub fn describe(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Lex `source` into the `(Token, Span)` pairs chumsky consumes.
fn lex(source: &str) -> Result<Vec<(Token, Span)>, Vec<ParseError>> {
    let tokens = lexer::tokenize(source).map_err(|errs| {
        errs.into_iter()
            .map(|e| ParseError {
                span: (e.span.start..e.span.end).into(),
                message: format!("invalid syntax: unexpected {:?}", e.text),
            })
            .collect::<Vec<_>>()
    })?;

    Ok(tokens
        .into_iter()
        .map(|spanned| (spanned.token, (spanned.span.start..spanned.span.end).into()))
        .collect())
}

fn convert_errors(errs: Vec<Rich<'_, Token, Span>>) -> Vec<ParseError> {
    errs.into_iter()
        .map(|e| ParseError {
            span: *e.span(),
            message: e.to_string(),
        })
        .collect()
}

/// Parse a block of statements.
pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let tokens = lex(source)?;
    let end_span: Span = (source.len()..source.len()).into();

    program_parser()
        .parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)))
        .into_result()
        .map_err(convert_errors)
}

/// Parse the whole of `source` as a single expression.
///
/// Surrounding blank lines are tolerated; anything else after the expression
/// is an error.
pub fn parse_expression(source: &str) -> Result<Expr, Vec<ParseError>> {
    let tokens = lex(source)?;
    let end_span: Span = (source.len()..source.len()).into();
    let blank = just(Token::Newline).repeated();

    blank
        .clone()
        .ignore_then(expr_parser())
        .then_ignore(blank)
        .then_ignore(end())
        .parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)))
        .into_result()
        .map_err(convert_errors)
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// Top-level program parser: statements separated by newlines or `;`.
fn program_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Program, extra::Err<Rich<'tokens, Token, Span>>>
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let terminator = choice((just(Token::Newline), just(Token::Semi)));

    terminator
        .clone()
        .repeated()
        .ignore_then(
            statement_parser()
                .separated_by(terminator.repeated().at_least(1))
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
        .map(|statements| Program { statements })
}

/// Statement: assignment or bare expression.
fn statement_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Stmt, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let assign_op = select! {
        Token::Eq => AssignOp::Set,
        Token::PlusEq => AssignOp::Add,
        Token::MinusEq => AssignOp::Sub,
        Token::StarEq => AssignOp::Mul,
        Token::SlashEq => AssignOp::Div,
    };

    let assignment = ident_parser()
        .then(assign_op)
        .then(expr_parser())
        .map(|((target, op), value)| Stmt::Assign { target, op, value })
        .labelled("assignment");

    choice((assignment, expr_parser().map(Stmt::Expr)))
        .labelled("statement")
        .boxed()
}

fn ident_parser<'tokens, I>(
) -> impl Parser<'tokens, I, String, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(name) => name,
    }
    .labelled("identifier")
}

fn literal_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Value, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::True => Value::Bool(true),
        Token::False => Value::Bool(false),
        Token::None => Value::None,
        Token::Int(n) => Value::Int(n),
        Token::Float(x) => Value::Float(x),
        Token::Str(s) => Value::Str(s),
    }
    .labelled("literal")
}

/// Call or subscript applied to an atom.
enum Postfix {
    Call(Vec<Expr>),
    Index(Expr),
}

fn binary(left: Expr, (op, right): (BinaryOp, Expr)) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// Expression parser.
///
/// Grammar, loosest binding first:
///   or      = and { "or" and }
///   and     = not { "and" not }
///   not     = "not" not | cmp
///   cmp     = sum [ cmp_op sum ]
///   sum     = term { ("+" | "-") term }
///   term    = unary { ("*" | "/" | "//" | "%") unary }
///   unary   = ("-" | "+") unary | power
///   power   = postfix [ "**" unary ]
///   postfix = atom { "(" args ")" | "[" expr "]" }
fn expr_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let items = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>();

        let list = items
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Expr::List)
            .labelled("list");

        // `(e)` groups; `()`, `(e,)` and `(e, f)` build tuples.
        let paren = expr
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .then(just(Token::Comma).or_not())
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|(mut elems, trailing): (Vec<Expr>, _)| {
                if elems.len() == 1 && trailing.is_none() {
                    if let Some(single) = elems.pop() {
                        return single;
                    }
                }
                Expr::Tuple(elems)
            })
            .labelled("parenthesized expression");

        let dict = expr
            .clone()
            .then_ignore(just(Token::Colon))
            .then(expr.clone())
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map(Expr::Dict)
            .labelled("dict");

        let set = expr
            .clone()
            .separated_by(just(Token::Comma))
            .at_least(1)
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map(Expr::Set)
            .labelled("set");

        let atom = choice((
            literal_parser().map(Expr::Literal),
            ident_parser().map(Expr::Name),
            paren,
            list,
            dict,
            set,
        ))
        .boxed();

        let call = items
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(Postfix::Call);
        let index = expr
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Postfix::Index);

        let postfix = atom
            .foldl(choice((call, index)).repeated(), |target, op| match op {
                Postfix::Call(args) => Expr::Call {
                    func: Box::new(target),
                    args,
                },
                Postfix::Index(index) => Expr::Index {
                    target: Box::new(target),
                    index: Box::new(index),
                },
            })
            .boxed();

        let unary = recursive(|unary| {
            let sign = select! {
                Token::Minus => UnaryOp::Neg,
                Token::Plus => UnaryOp::Pos,
            };

            let power = postfix
                .clone()
                .then(just(Token::StarStar).ignore_then(unary.clone()).or_not())
                .map(|(base, exponent)| match exponent {
                    Some(exponent) => binary(base, (BinaryOp::Pow, exponent)),
                    None => base,
                });

            sign.then(unary)
                .map(|(op, operand)| Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
                .or(power)
        })
        .boxed();

        let product_op = select! {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::SlashSlash => BinaryOp::FloorDiv,
            Token::Percent => BinaryOp::Mod,
        };
        let term = unary
            .clone()
            .foldl(product_op.then(unary).repeated(), binary)
            .boxed();

        let sum_op = select! {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
        };
        let sum = term
            .clone()
            .foldl(sum_op.then(term).repeated(), binary)
            .boxed();

        let comparison_op = select! {
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            Token::LtEq => BinaryOp::LtEq,
            Token::GtEq => BinaryOp::GtEq,
        };
        let comparison = sum
            .clone()
            .then(comparison_op.then(sum).or_not())
            .map(|(left, rest)| match rest {
                Some(rest) => binary(left, rest),
                None => left,
            });

        let negation = recursive(|negation| {
            just(Token::Not)
                .ignore_then(negation)
                .map(|operand| Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
                .or(comparison)
        })
        .boxed();

        let conjunction = negation
            .clone()
            .foldl(
                just(Token::And).to(BinaryOp::And).then(negation).repeated(),
                binary,
            )
            .boxed();

        conjunction
            .clone()
            .foldl(
                just(Token::Or).to(BinaryOp::Or).then(conjunction).repeated(),
                binary,
            )
            .labelled("expression")
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        parse_expression(source).expect("parses as expression")
    }

    fn int(n: i64) -> Expr {
        Expr::Literal(Value::Int(n))
    }

    fn bin(left: Expr, op: BinaryOp, right: Expr) -> Expr {
        binary(left, (op, right))
    }

    #[test]
    fn parse_empty_program() {
        let program = parse("").expect("ok");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn parse_newlines_only() {
        assert!(parse("\n\n;\n").expect("ok").statements.is_empty());
    }

    #[test]
    fn precedence_of_arithmetic() {
        assert_eq!(
            expr("1 + 2 * 3"),
            bin(int(1), BinaryOp::Add, bin(int(2), BinaryOp::Mul, int(3)))
        );
    }

    #[test]
    fn power_binds_tighter_than_unary_minus() {
        assert_eq!(
            expr("-2 ** 2"),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(bin(int(2), BinaryOp::Pow, int(2))),
            }
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            expr("2 ** 3 ** 2"),
            bin(int(2), BinaryOp::Pow, bin(int(3), BinaryOp::Pow, int(2)))
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            expr("5 - 2 - 1"),
            bin(bin(int(5), BinaryOp::Sub, int(2)), BinaryOp::Sub, int(1))
        );
    }

    #[test]
    fn grouping_versus_tuples() {
        assert_eq!(expr("(1)"), int(1));
        assert_eq!(expr("(1,)"), Expr::Tuple(vec![int(1)]));
        assert_eq!(expr("()"), Expr::Tuple(vec![]));
        assert_eq!(expr("(1, 2)"), Expr::Tuple(vec![int(1), int(2)]));
    }

    #[test]
    fn braces_build_dicts_and_sets() {
        assert_eq!(expr("{}"), Expr::Dict(vec![]));
        assert_eq!(
            expr("{'a': 1}"),
            Expr::Dict(vec![(Expr::Literal(Value::Str("a".into())), int(1))])
        );
        assert_eq!(expr("{1, 2}"), Expr::Set(vec![int(1), int(2)]));
    }

    #[test]
    fn calls_and_indexing_chain() {
        assert_eq!(
            expr("f(1)[0]"),
            Expr::Index {
                target: Box::new(Expr::Call {
                    func: Box::new(Expr::Name("f".into())),
                    args: vec![int(1)],
                }),
                index: Box::new(int(0)),
            }
        );
    }

    #[test]
    fn boolean_operators() {
        assert_eq!(
            expr("not a or b and c"),
            bin(
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(Expr::Name("a".into())),
                },
                BinaryOp::Or,
                bin(Expr::Name("b".into()), BinaryOp::And, Expr::Name("c".into())),
            )
        );
    }

    #[test]
    fn assignment_is_not_an_expression() {
        assert!(parse_expression("x = 1").is_err());
        let program = parse("x = 1").expect("ok");
        assert_eq!(program.statements, vec![Stmt::Assign {
            target: "x".into(),
            op: AssignOp::Set,
            value: int(1),
        }]);
    }

    #[test]
    fn multiple_statements() {
        let program = parse("x = 1\ny += 2; print(x)\n").expect("ok");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(
            program.statements[1],
            Stmt::Assign { op: AssignOp::Add, .. }
        ));
    }

    #[test]
    fn two_expressions_need_a_separator() {
        assert!(parse("1 2").is_err());
    }

    #[test]
    fn multi_line_container() {
        assert_eq!(expr("[1,\n 2]"), Expr::List(vec![int(1), int(2)]));
    }

    #[test]
    fn errors_carry_a_message() {
        let errs = parse("x = (1").expect_err("unclosed paren");
        assert!(!describe(&errs).is_empty());
    }
}
