//! Expression evaluation for the fallback scripting language.
//!
//! The evaluator reduces AST nodes to values against a [`Scope`]. Anything
//! `print` writes goes to an explicit output buffer owned by the caller.

use std::cmp::Ordering;

use thiserror::Error;

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::value::{Number, Value};

use super::builtins;
use super::scope::Scope;

/// Runtime errors raised by fallback code, named after their script-level kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("NameError: name '{0}' is not defined")]
    Name(String),
    #[error("TypeError: {0}")]
    Type(String),
    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(String),
    #[error("IndexError: {0}")]
    Index(String),
    #[error("KeyError: {0}")]
    Key(String),
    #[error("ValueError: {0}")]
    Value(String),
    #[error("OverflowError: {0}")]
    Overflow(String),
    #[error("SyntaxError: {0}")]
    Syntax(String),
}

impl EvalError {
    /// The script-level error kind, e.g. `"TypeError"`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EvalError::Name(_) => "NameError",
            EvalError::Type(_) => "TypeError",
            EvalError::ZeroDivision(_) => "ZeroDivisionError",
            EvalError::Index(_) => "IndexError",
            EvalError::Key(_) => "KeyError",
            EvalError::Value(_) => "ValueError",
            EvalError::Overflow(_) => "OverflowError",
            EvalError::Syntax(_) => "SyntaxError",
        }
    }

    pub(crate) fn unsupported(op: impl std::fmt::Display, left: &Value, right: &Value) -> Self {
        EvalError::Type(format!(
            "unsupported operand type(s) for {op}: '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluates statements and expressions against a scope.
pub struct Evaluator<'a> {
    scope: &'a mut Scope,
    out: &'a mut String,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator writing `print` output into `out`.
    pub fn new(scope: &'a mut Scope, out: &'a mut String) -> Self {
        Self { scope, out }
    }

    /// Execute every statement in order, stopping at the first error.
    pub fn run(&mut self, program: &Program) -> EvalResult<()> {
        for stmt in &program.statements {
            self.exec(stmt)?;
        }
        Ok(())
    }

    pub fn exec(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Assign { target, op, value } => {
                let value = self.eval(value)?;
                let value = match op.binary() {
                    None => value,
                    Some(bin) => {
                        let current = self
                            .scope
                            .get(target)
                            .cloned()
                            .ok_or_else(|| EvalError::Name(target.clone()))?;
                        binary_op(bin, current, value)?
                    }
                };
                self.scope.set(target.clone(), value);
                Ok(())
            }
            Stmt::Expr(expr) => self.eval(expr).map(drop),
        }
    }

    /// Evaluate an expression to a value.
    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            Expr::Set(items) => Ok(Value::set_from(self.eval_all(items)?)),
            Expr::Dict(pairs) => {
                let mut entries = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    entries.push((self.eval(key)?, self.eval(value)?));
                }
                Ok(Value::dict_from(entries))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary_op(*op, value)
            }
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right),
            Expr::Call { func, args } => self.eval_call(func, args),
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                subscript(&target, &index)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.scope.get(name) {
            return Ok(value.clone());
        }
        if builtins::is_builtin(name) {
            return Ok(Value::Str(format!("<built-in function {name}>")));
        }
        Err(EvalError::Name(name.to_string()))
    }

    /// `and`/`or` short-circuit and yield an operand, not a bool.
    fn eval_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> EvalResult<Value> {
        let left = self.eval(left)?;
        match op {
            BinaryOp::And if !left.is_truthy() => Ok(left),
            BinaryOp::Or if left.is_truthy() => Ok(left),
            BinaryOp::And | BinaryOp::Or => self.eval(right),
            _ => {
                let right = self.eval(right)?;
                binary_op(op, left, right)
            }
        }
    }

    fn eval_call(&mut self, func: &Expr, args: &[Expr]) -> EvalResult<Value> {
        let name = match func {
            Expr::Name(name) if !self.scope.contains(name) => name,
            other => {
                let value = self.eval(other)?;
                return Err(EvalError::Type(format!(
                    "'{}' object is not callable",
                    value.type_name()
                )));
            }
        };
        let args = self.eval_all(args)?;
        builtins::call(name, args, self.out)
            .unwrap_or_else(|| Err(EvalError::Name(name.clone())))
    }
}

fn unary_op(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match (op, value.as_number()) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Pos, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Number::Float(x))) => Ok(Value::Float(x)),
        (UnaryOp::Neg, Some(Number::Int(i))) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::Overflow("integer negation overflows".into())),
        (UnaryOp::Neg, Some(Number::Float(x))) => Ok(Value::Float(-x)),
        (op, None) => Err(EvalError::Type(format!(
            "bad operand type for unary {op}: '{}'",
            value.type_name()
        ))),
    }
}

/// Apply a non-short-circuit binary operator.
pub(crate) fn binary_op(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left.loose_eq(&right))),
        BinaryOp::NotEq => return Ok(Value::Bool(!left.loose_eq(&right))),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
            let ordering = compare(&left, &right).ok_or_else(|| {
                EvalError::Type(format!(
                    "'{op}' not supported between instances of '{}' and '{}'",
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            let holds = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Gt => ordering == Ordering::Greater,
                BinaryOp::LtEq => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Bool(holds));
        }
        _ => {}
    }

    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return arithmetic(op, a, b);
    }

    match (op, &left, &right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Sub, Value::Set(a), Value::Set(b)) => Ok(Value::Set(
            a.iter()
                .filter(|x| !b.iter().any(|y| y.loose_eq(x)))
                .cloned()
                .collect(),
        )),
        (BinaryOp::Mul, seq, count) | (BinaryOp::Mul, count, seq)
            if matches!(count, Value::Int(_) | Value::Bool(_))
                && matches!(seq, Value::Str(_) | Value::List(_) | Value::Tuple(_)) =>
        {
            repeat(seq, count)
        }
        _ => Err(EvalError::unsupported(op, &left, &right)),
    }
}

/// Upper bound on elements produced by sequence repetition.
const MAX_REPEAT_LEN: usize = 10_000_000;

fn repeat(seq: &Value, count: &Value) -> EvalResult<Value> {
    let times = match count.as_number() {
        Some(Number::Int(n)) => usize::try_from(n).unwrap_or(0),
        _ => 0,
    };
    let len = match seq {
        Value::Str(s) => s.len(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len.saturating_mul(times) > MAX_REPEAT_LEN {
        return Err(EvalError::Overflow("repeated sequence is too long".into()));
    }
    Ok(match seq {
        Value::Str(s) => Value::Str(s.repeat(times)),
        Value::List(items) => Value::List(repeat_items(items, times)),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, times)),
        other => other.clone(),
    })
}

fn repeat_items(items: &[Value], times: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    out
}

fn overflow() -> EvalError {
    EvalError::Overflow("integer result out of range".into())
}

fn arithmetic(op: BinaryOp, a: Number, b: Number) -> EvalResult<Value> {
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        return int_arithmetic(op, x, y);
    }
    let (x, y) = (a.as_f64(), b.as_f64());
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision("float division by zero".into()));
            }
            x / y
        }
        BinaryOp::FloorDiv => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision("float floor division by zero".into()));
            }
            (x / y).floor()
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision("float modulo".into()));
            }
            let r = x % y;
            if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }
        }
        BinaryOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(EvalError::ZeroDivision(
                    "0.0 cannot be raised to a negative power".into(),
                ));
            }
            x.powf(y)
        }
        _ => return Err(EvalError::Type(format!("unsupported operator {op}"))),
    };
    Ok(Value::Float(result))
}

fn int_arithmetic(op: BinaryOp, x: i64, y: i64) -> EvalResult<Value> {
    let zero_division = |msg: &str| EvalError::ZeroDivision(msg.to_string());
    let result = match op {
        BinaryOp::Add => x.checked_add(y).ok_or_else(overflow)?,
        BinaryOp::Sub => x.checked_sub(y).ok_or_else(overflow)?,
        BinaryOp::Mul => x.checked_mul(y).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if y == 0 {
                return Err(zero_division("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            let q = x.checked_div(y).ok_or_else(overflow)?;
            if x % y != 0 && (x < 0) != (y < 0) { q - 1 } else { q }
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(zero_division("integer modulo by zero"));
            }
            let r = x.checked_rem(y).ok_or_else(overflow)?;
            if r != 0 && (r < 0) != (y < 0) { r + y } else { r }
        }
        BinaryOp::Pow => {
            if y < 0 {
                return arithmetic(op, Number::Float(x as f64), Number::Float(y as f64));
            }
            let exp = u32::try_from(y).map_err(|_| overflow())?;
            x.checked_pow(exp).ok_or_else(overflow)?
        }
        _ => return Err(EvalError::Type(format!("unsupported operator {op}"))),
    };
    Ok(Value::Int(result))
}

/// Ordering for `<`-style comparisons; `None` when the types are unordered.
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return match (a, b) {
            (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        };
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !x.loose_eq(y) {
                    return compare(x, y);
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => None,
    }
}

fn subscript(target: &Value, index: &Value) -> EvalResult<Value> {
    if let Value::Dict(entries) = target {
        return entries
            .iter()
            .find(|(k, _)| k.loose_eq(index))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| EvalError::Key(index.repr()));
    }

    let len = match target {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        other => {
            return Err(EvalError::Type(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            )));
        }
    };
    let position = match index.as_number() {
        Some(Number::Int(i)) => i,
        _ => {
            return Err(EvalError::Type(format!(
                "{} indices must be integers, not {}",
                target.type_name(),
                index.type_name()
            )));
        }
    };
    let resolved = if position < 0 {
        i64::try_from(len).ok().and_then(|l| usize::try_from(l + position).ok())
    } else {
        usize::try_from(position).ok()
    }
    .filter(|&i| i < len)
    .ok_or_else(|| EvalError::Index(format!("{} index out of range", target.type_name())))?;

    Ok(match target {
        Value::Str(s) => Value::Str(s.chars().nth(resolved).map(String::from).unwrap_or_default()),
        Value::List(items) | Value::Tuple(items) => items[resolved].clone(),
        _ => Value::None,
    })
}
