use serde_json::{Map, Value as Json};

use super::{ArithOp, CompareOp, Expr};
use crate::error::{LogicError, LogicResult};

pub(super) fn parse(doc: &Json) -> LogicResult<Expr> {
    match doc {
        Json::Object(map) => parse_operation(map),
        Json::Array(items) => parse_all(items).map(Expr::Array),
        scalar => Ok(Expr::Literal(scalar.clone())),
    }
}

fn parse_all(items: &[Json]) -> LogicResult<Vec<Expr>> {
    items.iter().map(parse).collect()
}

fn parse_operation(map: &Map<String, Json>) -> LogicResult<Expr> {
    let mut entries = map.iter();
    let (op, raw) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err(LogicError::EmptyOperation),
        (Some(_), Some(_)) => {
            return Err(LogicError::AmbiguousOperation(map.keys().cloned().collect()));
        }
    };

    // A non-array argument is shorthand for a one-element list.
    let args = match raw {
        Json::Array(items) => parse_all(items)?,
        single => vec![parse(single)?],
    };

    let expr = match op.as_str() {
        "var" => {
            arity(op, &args, 0, 2, "0 to 2")?;
            let mut it = args.into_iter();
            let path = it.next().unwrap_or(Expr::Literal(Json::String(String::new())));
            Expr::Var {
                path: Box::new(path),
                default: it.next().map(Box::new),
            }
        }
        "and" => {
            arity(op, &args, 1, usize::MAX, "at least 1")?;
            Expr::And(args)
        }
        "or" => {
            arity(op, &args, 1, usize::MAX, "at least 1")?;
            Expr::Or(args)
        }
        "!" => {
            let [inner] = exactly(op, args, "exactly 1")?;
            Expr::Not(Box::new(inner))
        }
        "!!" => {
            let [inner] = exactly(op, args, "exactly 1")?;
            Expr::Truthy(Box::new(inner))
        }
        "if" => {
            arity(op, &args, 1, usize::MAX, "at least 1")?;
            Expr::If(args)
        }
        "?:" => {
            arity(op, &args, 3, 3, "exactly 3")?;
            Expr::If(args)
        }
        "in" => {
            let [needle, haystack] = exactly(op, args, "exactly 2")?;
            Expr::In {
                needle: Box::new(needle),
                haystack: Box::new(haystack),
            }
        }
        "cat" => Expr::Cat(args),
        other => {
            if let Some(cmp) = CompareOp::from_symbol(other) {
                match cmp {
                    CompareOp::Lt | CompareOp::Le => arity(op, &args, 2, 3, "2 or 3")?,
                    _ => arity(op, &args, 2, 2, "exactly 2")?,
                }
                Expr::Compare { op: cmp, args }
            } else if let Some(arith) = ArithOp::from_symbol(other) {
                match arith {
                    ArithOp::Add | ArithOp::Mul => {}
                    ArithOp::Sub => arity(op, &args, 1, 2, "1 or 2")?,
                    ArithOp::Div | ArithOp::Rem => arity(op, &args, 2, 2, "exactly 2")?,
                    ArithOp::Min | ArithOp::Max => arity(op, &args, 1, usize::MAX, "at least 1")?,
                }
                Expr::Arith { op: arith, args }
            } else {
                Expr::Call {
                    name: other.to_string(),
                    args,
                }
            }
        }
    };
    Ok(expr)
}

fn arity(op: &str, args: &[Expr], min: usize, max: usize, expected: &'static str) -> LogicResult<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(LogicError::Arity {
            op: op.to_string(),
            expected,
            found: args.len(),
        })
    }
}

fn exactly<const N: usize>(op: &str, args: Vec<Expr>, expected: &'static str) -> LogicResult<[Expr; N]> {
    args.try_into().map_err(|args: Vec<Expr>| LogicError::Arity {
        op: op.to_string(),
        expected,
        found: args.len(),
    })
}
