//! Lexer for the fallback scripting language.
//!
//! Produces tokens with byte spans. Newlines are significant statement
//! separators at the top level; inside `()`, `[]` or `{}` they are dropped so
//! container literals may span lines.

use logos::Logos;
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
#[logos(skip r"\\\r?\n")]
pub enum Token {
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    Float(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\\n]|\\.)*""#, unescape)]
    #[regex(r"'([^'\\\n]|\\.)*'", unescape)]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("**")]
    StarStar,
    #[token("//")]
    SlashSlash,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,

    #[token("\n")]
    Newline,
}

fn parse_float(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Strip the delimiters and resolve backslash escapes.
fn unescape(lex: &mut logos::Lexer<Token>) -> String {
    let raw = lex.slice();
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => write!(f, "True"),
            Token::False => write!(f, "False"),
            Token::None => write!(f, "None"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Float(x) => write!(f, "{x}"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::StarStar => write!(f, "**"),
            Token::SlashSlash => write!(f, "//"),
            Token::PlusEq => write!(f, "+="),
            Token::MinusEq => write!(f, "-="),
            Token::StarEq => write!(f, "*="),
            Token::SlashEq => write!(f, "/="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Eq => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Semi => write!(f, ";"),
            Token::Newline => write!(f, "newline"),
        }
    }
}

/// A token with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Text the lexer could not turn into a token.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Range<usize>,
    pub text: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected {:?} at {}", self.text, self.span.start)
    }
}

/// Tokenize `source`, collecting every unrecognized span.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, Vec<LexError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut depth: usize = 0;
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => {
                match token {
                    Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                    Token::RParen | Token::RBracket | Token::RBrace => {
                        depth = depth.saturating_sub(1)
                    }
                    Token::Newline if depth > 0 => continue,
                    _ => {}
                }
                tokens.push(Spanned { token, span });
            }
            Err(()) => errors.push(LexError {
                text: source[span.clone()].to_string(),
                span,
            }),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("lexes")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("42 1.5 1e3 .5"), vec![
            Token::Int(42),
            Token::Float(1.5),
            Token::Float(1000.0),
            Token::Float(0.5),
        ]);
    }

    #[test]
    fn keywords_beat_identifiers() {
        assert_eq!(kinds("True Truth not nothing"), vec![
            Token::True,
            Token::Ident("Truth".into()),
            Token::Not,
            Token::Ident("nothing".into()),
        ]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r#""a\"b\n" 'it\'s'"#), vec![
            Token::Str("a\"b\n".into()),
            Token::Str("it's".into()),
        ]);
    }

    #[test]
    fn operators_prefer_longest() {
        assert_eq!(kinds("a ** b // c += 1"), vec![
            Token::Ident("a".into()),
            Token::StarStar,
            Token::Ident("b".into()),
            Token::SlashSlash,
            Token::Ident("c".into()),
            Token::PlusEq,
            Token::Int(1),
        ]);
    }

    #[test]
    fn comments_skipped() {
        assert_eq!(kinds("x # note\ny"), vec![
            Token::Ident("x".into()),
            Token::Newline,
            Token::Ident("y".into()),
        ]);
    }

    #[test]
    fn newlines_inside_brackets_dropped() {
        assert_eq!(kinds("[1,\n2]\n"), vec![
            Token::LBracket,
            Token::Int(1),
            Token::Comma,
            Token::Int(2),
            Token::RBracket,
            Token::Newline,
        ]);
    }

    #[test]
    fn unknown_characters_reported() {
        let errs = tokenize("x = $y").expect_err("dollar is not a token");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].text, "$");
    }

    #[test]
    fn oversized_integer_is_an_error() {
        assert!(tokenize("99999999999999999999").is_err());
    }
}
