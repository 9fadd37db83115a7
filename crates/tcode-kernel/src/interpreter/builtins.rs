//! Built-in functions callable from fallback code.

use std::cmp::Ordering;

use crate::value::{Number, Value};

use super::eval::{binary_op, compare, EvalError, EvalResult};
use crate::ast::BinaryOp;

/// Names resolvable as built-in functions.
pub const BUILTINS: &[&str] = &[
    "abs", "bool", "float", "int", "len", "max", "min", "print", "range", "repr", "round", "sorted",
    "str", "sum", "type",
];

/// Upper bound on the number of elements `range` may materialize.
const MAX_RANGE_LEN: i64 = 10_000_000;

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Call the builtin `name`, or `None` if no such builtin exists.
pub(super) fn call(name: &str, args: Vec<Value>, out: &mut String) -> Option<EvalResult<Value>> {
    let result = match name {
        "print" => Ok(print(&args, out)),
        "len" => one(name, args).and_then(len),
        "str" => optional(name, args).map(|v| Value::Str(v.map(|v| v.to_string()).unwrap_or_default())),
        "repr" => one(name, args).map(|v| Value::Str(v.repr())),
        "int" => optional(name, args).and_then(|v| v.map_or(Ok(Value::Int(0)), to_int)),
        "float" => optional(name, args).and_then(|v| v.map_or(Ok(Value::Float(0.0)), to_float)),
        "bool" => optional(name, args).map(|v| Value::Bool(v.is_some_and(|v| v.is_truthy()))),
        "abs" => one(name, args).and_then(abs),
        "min" => extremum(name, args, Ordering::Less),
        "max" => extremum(name, args, Ordering::Greater),
        "sum" => one(name, args).and_then(sum),
        "round" => round(args),
        "range" => range(args),
        "type" => one(name, args).map(|v| Value::Str(format!("<class '{}'>", v.type_name()))),
        "sorted" => one(name, args).and_then(sorted),
        _ => return None,
    };
    Some(result)
}

fn print(args: &[Value], out: &mut String) -> Value {
    let line: Vec<String> = args.iter().map(ToString::to_string).collect();
    out.push_str(&line.join(" "));
    out.push('\n');
    Value::None
}

fn arg_count_error(name: &str, expected: &str, got: usize) -> EvalError {
    EvalError::Type(format!("{name}() takes {expected} argument(s) ({got} given)"))
}

fn one(name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let got = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(arg_count_error(name, "exactly one", got)),
    }
}

fn optional(name: &str, args: Vec<Value>) -> EvalResult<Option<Value>> {
    let got = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (value, None) => Ok(value),
        _ => Err(arg_count_error(name, "at most one", got)),
    }
}

/// Elements of an iterable value; dicts yield their keys.
fn iterate(value: Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => Ok(items),
        Value::Dict(entries) => Ok(entries.into_iter().map(|(k, _)| k).collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(EvalError::Type(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

fn len(value: Value) -> EvalResult<Value> {
    let n = match &value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.len(),
        Value::Dict(entries) => entries.len(),
        other => {
            return Err(EvalError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn to_int(value: Value) -> EvalResult<Value> {
    match value.as_number() {
        Some(Number::Int(i)) => return Ok(Value::Int(i)),
        Some(Number::Float(x)) => return float_to_int(x).map(Value::Int),
        None => {}
    }
    match &value {
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            EvalError::Value(format!("invalid literal for int() with base 10: {}", value.repr()))
        }),
        other => Err(EvalError::Type(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn float_to_int(x: f64) -> EvalResult<i64> {
    if x.is_nan() {
        return Err(EvalError::Value("cannot convert float NaN to integer".into()));
    }
    let truncated = x.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(EvalError::Overflow("cannot convert float to integer".into()));
    }
    Ok(truncated as i64)
}

fn to_float(value: Value) -> EvalResult<Value> {
    if let Some(n) = value.as_number() {
        return Ok(Value::Float(n.as_f64()));
    }
    match &value {
        Value::Str(s) => {
            let text = s.trim();
            let parsed = match text.to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
                "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
                "nan" => Some(f64::NAN),
                _ => text.parse::<f64>().ok(),
            };
            parsed.map(Value::Float).ok_or_else(|| {
                EvalError::Value(format!("could not convert string to float: {}", value.repr()))
            })
        }
        other => Err(EvalError::Type(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn abs(value: Value) -> EvalResult<Value> {
    match value.as_number() {
        Some(Number::Int(i)) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| EvalError::Overflow("integer result out of range".into())),
        Some(Number::Float(x)) => Ok(Value::Float(x.abs())),
        None => Err(EvalError::Type(format!(
            "bad operand type for abs(): '{}'",
            value.type_name()
        ))),
    }
}

/// `min`/`max` over one iterable argument or over several arguments.
fn extremum(name: &str, args: Vec<Value>, want: Ordering) -> EvalResult<Value> {
    let items = if args.len() == 1 {
        iterate(one(name, args)?)?
    } else {
        args
    };
    let mut items = items.into_iter();
    let mut best = items
        .next()
        .ok_or_else(|| EvalError::Value(format!("{name}() arg is an empty sequence")))?;
    for item in items {
        let ordering = compare(&item, &best).ok_or_else(|| {
            EvalError::Type(format!(
                "'<' not supported between instances of '{}' and '{}'",
                item.type_name(),
                best.type_name()
            ))
        })?;
        if ordering == want {
            best = item;
        }
    }
    Ok(best)
}

fn sum(value: Value) -> EvalResult<Value> {
    iterate(value)?
        .into_iter()
        .try_fold(Value::Int(0), |acc, item| binary_op(BinaryOp::Add, acc, item))
}

/// Round half to even, like the scripting language users expect.
fn round(args: Vec<Value>) -> EvalResult<Value> {
    let got = args.len();
    let mut args = args.into_iter();
    let (value, digits) = match (args.next(), args.next(), args.next()) {
        (Some(value), digits, None) => (value, digits),
        _ => return Err(arg_count_error("round", "one or two", got)),
    };
    let number = value.as_number().ok_or_else(|| {
        EvalError::Type(format!(
            "type {} doesn't define __round__ method",
            value.type_name()
        ))
    })?;
    match digits {
        None | Some(Value::None) => match number {
            Number::Int(i) => Ok(Value::Int(i)),
            Number::Float(x) => float_to_int(x.round_ties_even()).map(Value::Int),
        },
        Some(Value::Int(places)) => match number {
            Number::Int(i) => Ok(Value::Int(i)),
            Number::Float(x) => {
                let places = i32::try_from(places.clamp(-308, 308)).unwrap_or(0);
                let scale = 10f64.powi(places);
                Ok(Value::Float((x * scale).round_ties_even() / scale))
            }
        },
        Some(other) => Err(EvalError::Type(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

fn range(args: Vec<Value>) -> EvalResult<Value> {
    let mut bounds = Vec::with_capacity(args.len());
    for arg in &args {
        match arg.as_number() {
            Some(Number::Int(i)) => bounds.push(i),
            _ => {
                return Err(EvalError::Type(format!(
                    "'{}' object cannot be interpreted as an integer",
                    arg.type_name()
                )));
            }
        }
    }
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(arg_count_error("range", "one to three", args.len())),
    };
    if step == 0 {
        return Err(EvalError::Value("range() arg 3 must not be zero".into()));
    }

    let span = if step > 0 {
        stop.saturating_sub(start)
    } else {
        start.saturating_sub(stop)
    };
    let count = if span <= 0 {
        0
    } else {
        (span - 1) / step.saturating_abs() + 1
    };
    if count > MAX_RANGE_LEN {
        return Err(EvalError::Overflow("range is too large to materialize".into()));
    }

    let mut items = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    let mut current = start;
    for _ in 0..count {
        items.push(Value::Int(current));
        current = current.saturating_add(step);
    }
    Ok(Value::List(items))
}

fn sorted(value: Value) -> EvalResult<Value> {
    let mut items = iterate(value)?;
    let mut failure = None;
    items.sort_by(|a, b| {
        compare(a, b).unwrap_or_else(|| {
            failure.get_or_insert_with(|| {
                EvalError::Type(format!(
                    "'<' not supported between instances of '{}' and '{}'",
                    a.type_name(),
                    b.type_name()
                ))
            });
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(Value::List(items)),
    }
}
