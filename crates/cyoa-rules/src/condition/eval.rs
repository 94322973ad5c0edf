//! Expression evaluation with JSON-logic semantics.

use std::cmp::Ordering;

use cyoa_core::logic::{ArithOp, CompareOp, Expr};
use serde_json::Value as Json;

use super::{PredicateTable, Projection};
use crate::error::{EvalError, EvalResult};

pub(super) struct Scope<'a> {
    pub(super) data: &'a Projection,
    pub(super) predicates: &'a PredicateTable,
}

impl Scope<'_> {
    pub(super) fn eval(&self, expr: &Expr) -> EvalResult<Json> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Array(items) => Ok(Json::Array(self.eval_all(items)?)),
            Expr::Var { path, default } => self.var(path, default.as_deref()),
            Expr::Compare { op, args } => {
                let args = self.eval_all(args)?;
                Ok(Json::Bool(compare(*op, &args)))
            }
            Expr::And(args) => self.short_circuit(args, false),
            Expr::Or(args) => self.short_circuit(args, true),
            Expr::Not(inner) => Ok(Json::Bool(!truthy(&self.eval(inner)?))),
            Expr::Truthy(inner) => Ok(Json::Bool(truthy(&self.eval(inner)?))),
            Expr::If(args) => self.branch(args),
            Expr::In { needle, haystack } => {
                let needle = self.eval(needle)?;
                let haystack = self.eval(haystack)?;
                Ok(Json::Bool(contains(&haystack, &needle)))
            }
            Expr::Arith { op, args } => {
                let args = self.eval_all(args)?;
                arith(*op, &args)
            }
            Expr::Cat(args) => {
                let parts = self.eval_all(args)?;
                Ok(Json::String(parts.iter().map(display).collect()))
            }
            Expr::Call { name, args } => {
                let args = self.eval_all(args)?;
                self.predicates.call(name, &args, self.data)
            }
        }
    }

    fn eval_all(&self, items: &[Expr]) -> EvalResult<Vec<Json>> {
        items.iter().map(|e| self.eval(e)).collect()
    }

    fn var(&self, path: &Expr, default: Option<&Expr>) -> EvalResult<Json> {
        let path = match self.eval(path)? {
            Json::String(s) => s,
            Json::Null => String::new(),
            Json::Number(n) => n.to_string(),
            other => return Err(EvalError::bad_args("var", format!("path must be a string, got {other}"))),
        };
        match self.data.lookup(&path) {
            Some(v) if !v.is_null() => Ok(v.clone()),
            _ => match default {
                Some(d) => self.eval(d),
                None => Ok(Json::Null),
            },
        }
    }

    /// `and` stops at the first falsy value, `or` at the first truthy one.
    fn short_circuit(&self, args: &[Expr], stop_when: bool) -> EvalResult<Json> {
        let mut last = Json::Null;
        for arg in args {
            last = self.eval(arg)?;
            if truthy(&last) == stop_when {
                break;
            }
        }
        Ok(last)
    }

    fn branch(&self, args: &[Expr]) -> EvalResult<Json> {
        let mut pairs = args.chunks_exact(2);
        for pair in pairs.by_ref() {
            if truthy(&self.eval(&pair[0])?) {
                return self.eval(&pair[1]);
            }
        }
        match pairs.remainder() {
            [otherwise] => self.eval(otherwise),
            _ => Ok(Json::Null),
        }
    }
}

/// JSON-logic truthiness: `false`, `null`, `0`, `""`, and `[]` are falsy.
pub(crate) fn truthy(v: &Json) -> bool {
    match v {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Json::String(s) => !s.is_empty(),
        Json::Array(items) => !items.is_empty(),
        Json::Object(_) => true,
    }
}

fn to_number(v: &Json) -> f64 {
    match v {
        Json::Null => 0.0,
        Json::Bool(b) => f64::from(u8::from(*b)),
        Json::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Json::String(s) => {
            let s = s.trim();
            if s.is_empty() { 0.0 } else { s.parse().unwrap_or(f64::NAN) }
        }
        Json::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Json::Object(_) => f64::NAN,
    }
}

fn loose_eq(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Null, Json::Null) => true,
        (Json::Null, _) | (_, Json::Null) => false,
        (Json::Number(_), Json::Number(_)) => to_number(a) == to_number(b),
        (Json::String(x), Json::String(y)) => x == y,
        (Json::Bool(x), Json::Bool(y)) => x == y,
        (Json::Bool(_), _) | (_, Json::Bool(_)) | (Json::Number(_), Json::String(_)) | (Json::String(_), Json::Number(_)) => {
            to_number(a) == to_number(b)
        }
        _ => a == b,
    }
}

fn strict_eq(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Number(_), Json::Number(_)) => to_number(a) == to_number(b),
        _ => a == b,
    }
}

fn order(a: &Json, b: &Json) -> Option<Ordering> {
    match (a, b) {
        (Json::String(x), Json::String(y)) => Some(x.cmp(y)),
        _ => to_number(a).partial_cmp(&to_number(b)),
    }
}

fn compare(op: CompareOp, args: &[Json]) -> bool {
    let holds = |a: &Json, b: &Json| -> bool {
        match op {
            CompareOp::Eq => loose_eq(a, b),
            CompareOp::NotEq => !loose_eq(a, b),
            CompareOp::StrictEq => strict_eq(a, b),
            CompareOp::StrictNotEq => !strict_eq(a, b),
            CompareOp::Lt => order(a, b) == Some(Ordering::Less),
            CompareOp::Le => matches!(order(a, b), Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Gt => order(a, b) == Some(Ordering::Greater),
            CompareOp::Ge => matches!(order(a, b), Some(Ordering::Greater | Ordering::Equal)),
        }
    };
    // Three operands on `<`/`<=` test that the middle one lies between the others.
    args.windows(2).all(|w| holds(&w[0], &w[1]))
}

fn contains(haystack: &Json, needle: &Json) -> bool {
    match haystack {
        Json::String(s) => s.contains(&display(needle)),
        Json::Array(items) => items.iter().any(|item| strict_eq(item, needle)),
        Json::Object(map) => needle.as_str().is_some_and(|key| map.contains_key(key)),
        _ => false,
    }
}

fn numbers(op: ArithOp, args: &[Json]) -> EvalResult<Vec<f64>> {
    args.iter()
        .map(|a| {
            let n = to_number(a);
            if n.is_nan() {
                Err(EvalError::bad_args(op.symbol(), format!("{a} is not a number")))
            } else {
                Ok(n)
            }
        })
        .collect()
}

fn arith(op: ArithOp, args: &[Json]) -> EvalResult<Json> {
    let nums = numbers(op, args)?;
    let result: f64 = match (op, nums.as_slice()) {
        (ArithOp::Add, ns) => ns.iter().sum(),
        (ArithOp::Mul, []) => return Err(EvalError::bad_args("*", "needs at least one operand")),
        (ArithOp::Mul, ns) => ns.iter().product(),
        (ArithOp::Sub, [a]) => -a,
        (ArithOp::Sub, [a, b]) => a - b,
        (ArithOp::Div | ArithOp::Rem, [_, b]) if *b == 0.0 => {
            return Err(EvalError::DivisionByZero(op.symbol().to_string()));
        }
        (ArithOp::Div, [a, b]) => a / b,
        (ArithOp::Rem, [a, b]) => a % b,
        (ArithOp::Min, ns) => ns.iter().copied().fold(f64::INFINITY, f64::min),
        (ArithOp::Max, ns) => ns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        (_, ns) => {
            return Err(EvalError::bad_args(op.symbol(), format!("unexpected operand count {}", ns.len())));
        }
    };
    Ok(number_json(result))
}

/// Whole results become JSON integers so `{"var": ...}` comparisons stay exact.
fn number_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Json::from(n as i64)
    } else {
        Json::from(n)
    }
}

fn display(v: &Json) -> String {
    match v {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        Json::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
