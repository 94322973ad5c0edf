//! The condition mini-language.
//!
//! Conditions are authored as JSON-logic documents such as
//! `{">=": [{"var": "wallets.gold"}, 80]}`. A document is parsed once into a
//! closed [`Expr`] tree. Operators the language does not know become
//! [`Expr::Call`] nodes, which the evaluator dispatches through its
//! predicate table (`hasItem`, `walletBalance`, ...).

mod parse;

use std::fmt;

use serde_json::Value as Json;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==` (loose equality).
    Eq,
    /// `===` (strict equality).
    StrictEq,
    /// `!=` (loose inequality).
    NotEq,
    /// `!==` (strict inequality).
    StrictNotEq,
    /// `<`, or "strictly between" with three arguments.
    Lt,
    /// `<=`, or "between inclusive" with three arguments.
    Le,
    /// `>`.
    Gt,
    /// `>=`.
    Ge,
}

impl CompareOp {
    /// Parse an operator symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Eq),
            "===" => Some(Self::StrictEq),
            "!=" => Some(Self::NotEq),
            "!==" => Some(Self::StrictNotEq),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// The operator's symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::StrictEq => "===",
            Self::NotEq => "!=",
            Self::StrictNotEq => "!==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    /// `+` (sum of all arguments).
    Add,
    /// `-` (difference, or negation with one argument).
    Sub,
    /// `*` (product of all arguments).
    Mul,
    /// `/`.
    Div,
    /// `%`.
    Rem,
    /// `min`.
    Min,
    /// `max`.
    Max,
}

impl ArithOp {
    /// Parse an operator symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            "%" => Some(Self::Rem),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// The operator's symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal JSON scalar (or `null`).
    Literal(Json),
    /// An array whose elements are themselves expressions.
    Array(Vec<Expr>),
    /// Look up a dotted path in the evaluation data.
    Var {
        /// Expression producing the path (usually a string literal).
        path: Box<Expr>,
        /// Value returned when the path does not resolve.
        default: Option<Box<Expr>>,
    },
    /// A comparison between two (or, for `<` and `<=`, three) operands.
    Compare {
        /// The comparison operator.
        op: CompareOp,
        /// The operands.
        args: Vec<Expr>,
    },
    /// Short-circuit AND; yields the first falsy operand or the last one.
    And(Vec<Expr>),
    /// Short-circuit OR; yields the first truthy operand or the last one.
    Or(Vec<Expr>),
    /// Logical negation of the operand's truthiness.
    Not(Box<Expr>),
    /// The operand's truthiness as a boolean.
    Truthy(Box<Expr>),
    /// `if`/`?:` chain: `[cond, then, cond, then, ..., else]`.
    If(Vec<Expr>),
    /// Membership: substring, array element, or object key.
    In {
        /// The value searched for.
        needle: Box<Expr>,
        /// The string, array, or object searched in.
        haystack: Box<Expr>,
    },
    /// Arithmetic over numeric operands.
    Arith {
        /// The arithmetic operator.
        op: ArithOp,
        /// The operands.
        args: Vec<Expr>,
    },
    /// String concatenation.
    Cat(Vec<Expr>),
    /// A named predicate resolved through the evaluator's predicate table.
    Call {
        /// The operator name as written in the document.
        name: String,
        /// The arguments.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Parse a JSON-logic document into an expression tree.
    pub fn parse(doc: &Json) -> crate::LogicResult<Self> {
        parse::parse(doc)
    }

    /// Names of every [`Expr::Call`] in the tree, in document order.
    pub fn called_predicates(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_calls(&mut names);
        names
    }

    fn collect_calls<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::Call { name, args } => {
                names.push(name);
                args.iter().for_each(|a| a.collect_calls(names));
            }
            Self::Var { path, default } => {
                path.collect_calls(names);
                if let Some(d) = default {
                    d.collect_calls(names);
                }
            }
            Self::Not(inner) | Self::Truthy(inner) => inner.collect_calls(names),
            Self::In { needle, haystack } => {
                needle.collect_calls(names);
                haystack.collect_calls(names);
            }
            Self::Array(args)
            | Self::And(args)
            | Self::Or(args)
            | Self::If(args)
            | Self::Cat(args)
            | Self::Compare { args, .. }
            | Self::Arith { args, .. } => args.iter().for_each(|a| a.collect_calls(names)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_symbols_round_trip() {
        for symbol in ["==", "===", "!=", "!==", "<", "<=", ">", ">="] {
            assert_eq!(CompareOp::from_symbol(symbol).unwrap().symbol(), symbol);
        }
        for symbol in ["+", "-", "*", "/", "%", "min", "max"] {
            assert_eq!(ArithOp::from_symbol(symbol).unwrap().symbol(), symbol);
        }
        assert_eq!(CompareOp::from_symbol("=>"), None);
    }

    #[test]
    fn collects_called_predicates() {
        let expr = Expr::parse(&json!({
            "and": [
                {"hasItem": "key"},
                {">=": [{"walletBalance": "gold"}, 10]},
                {"!": {"hasStatusEffect": "cursed"}}
            ]
        }))
        .unwrap();
        assert_eq!(
            expr.called_predicates(),
            vec!["hasItem", "walletBalance", "hasStatusEffect"]
        );
    }
}
