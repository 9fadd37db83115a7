//! Runtime values shared by command arguments and the fallback interpreter.
//!
//! Two renderings exist, mirroring the scripting language the editor users
//! write in:
//!
//! - `Display` is the "str" form: strings appear bare (`hello`).
//! - [`Value::repr`] is the "repr" form: strings are quoted (`'hello'`).
//!
//! Containers always render their elements with `repr`.

use std::fmt;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered key/value pairs. Keys are unique under [`Value::loose_eq`].
    Dict(Vec<(Value, Value)>),
    /// Ordered, deduplicated elements.
    Set(Vec<Value>),
}

impl Value {
    /// Build a set, dropping duplicates while keeping first-seen order.
    pub fn set_from(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.iter().any(|seen| seen.loose_eq(&item)) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Build a dict; a repeated key overwrites the earlier value in place.
    pub fn dict_from(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut entries: Vec<(Value, Value)> = Vec::new();
        for (key, value) in pairs {
            match entries.iter_mut().find(|(k, _)| k.loose_eq(&key)) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Value::Dict(entries)
    }

    /// Type name as reported in error messages and by `type()`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
        }
    }

    /// Truthiness: `None`, `False`, zero, and empty strings/containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
        }
    }

    /// Borrow the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Equality with numeric promotion: `1 == 1.0 == True`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => return a.eq(b),
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.loose_eq(y)))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(bk, bv)| k.loose_eq(bk) && v.loose_eq(bv))
                    })
            }
            _ => false,
        }
    }

    /// Numeric view of the value; booleans count as integers.
    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// The quoted, unambiguous rendering.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            other => other.to_string(),
        }
    }
}

/// A number after bool promotion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => write!(f, "[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Value::Tuple(items) => write!(f, "({})", join_repr(items)),
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => write!(f, "{{{}}}", join_repr(items)),
            Value::Dict(entries) => {
                let body: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                write!(f, "{{{}}}", body.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Floats always show a fractional part or an exponent, so `3.0` stays `3.0`.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        let text = if x > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{x:.1}")
    } else if x.abs() >= 1e16 || (x != 0.0 && x.abs() < 1e-4) {
        format!("{x:e}")
    } else {
        x.to_string()
    }
}

/// Quote a string the way the editor's scripting language prints it:
/// single quotes unless the text contains a single quote and no double quote.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::none(Value::None, "None")]
    #[case::bool_true(Value::Bool(true), "True")]
    #[case::int(Value::Int(-7), "-7")]
    #[case::whole_float(Value::Float(3.0), "3.0")]
    #[case::float(Value::Float(2.5), "2.5")]
    #[case::string_bare(Value::Str("hi".into()), "hi")]
    #[case::list(Value::List(vec![Value::Int(1), Value::Str("a".into())]), "[1, 'a']")]
    #[case::single_tuple(Value::Tuple(vec![Value::Int(1)]), "(1,)")]
    #[case::empty_set(Value::Set(vec![]), "set()")]
    #[case::dict(
        Value::Dict(vec![(Value::Str("k".into()), Value::Bool(false))]),
        "{'k': False}"
    )]
    fn display_forms(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn repr_quotes_strings() {
        assert_eq!(Value::Str("it's".into()).repr(), "\"it's\"");
        assert_eq!(Value::Str("a\nb".into()).repr(), "'a\\nb'");
    }

    #[test]
    fn loose_eq_promotes_numbers() {
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Int(1)));
        assert!(!Value::Int(1).loose_eq(&Value::Str("1".into())));
    }

    #[test]
    fn set_from_deduplicates_in_order() {
        let set = Value::set_from(vec![Value::Int(2), Value::Int(1), Value::Float(2.0)]);
        assert_eq!(set, Value::Set(vec![Value::Int(2), Value::Int(1)]));
    }

    #[test]
    fn dict_from_last_key_wins() {
        let dict = Value::dict_from(vec![
            (Value::Str("a".into()), Value::Int(1)),
            (Value::Str("a".into()), Value::Int(2)),
        ]);
        assert_eq!(dict, Value::Dict(vec![(Value::Str("a".into()), Value::Int(2))]));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::List(vec![Value::None]).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
    }
}
