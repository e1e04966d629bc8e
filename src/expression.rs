use core::fmt;
use std::sync::Arc;

use crate::{context::EvaluationContext, environment::ScopeId, error::YalError};

pub type EvaluationResult = Result<Expr, YalError>;

/// Native operation registered in the constants table. Receives its arguments
/// already evaluated, the scope of the call site and the evaluation context.
pub type BuiltinFn = fn(Vec<Expr>, ScopeId, &mut EvaluationContext) -> EvaluationResult;

/// Handle to a cell in the [`CellStore`](crate::CellStore).
///
/// Handles are only ever produced by the store that owns the cell, and stay
/// valid until that store is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub(crate) u32);

impl CellId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub(crate) name: &'static str,
    pub(crate) function: BuiltinFn,
}

impl Builtin {
    pub fn new(name: &'static str, function: BuiltinFn) -> Self {
        Self { name, function }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

// Expressions are the single value type of yal. Atoms are stored inline, while
// pairs and callables live in the cell store and are referred to by handle.
#[derive(Debug, Clone)]
pub enum Expr {
    Nil,
    Integer(i64),
    Float(f64),
    Symbol(Arc<str>),
    String(Arc<str>),
    Pair(CellId),
    Builtin(Builtin),
    Lambda(CellId),
    Macro(CellId),
}

impl Expr {
    pub fn symbol(name: &str) -> Self {
        Self::Symbol(Arc::from(name))
    }

    pub fn string(text: &str) -> Self {
        Self::String(Arc::from(text))
    }

    pub fn truth() -> Self {
        Self::symbol("T")
    }

    pub fn boolean(value: bool) -> Self {
        if value { Self::truth() } else { Self::Nil }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Self::Symbol(symbol) if &**symbol == name)
    }

    pub fn as_symbol(&self) -> Option<&Arc<str>> {
        match self {
            Self::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Builtin(_) | Self::Lambda(_) | Self::Macro(_))
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "NIL",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Symbol(_) => "symbol",
            Self::String(_) => "string",
            Self::Pair(_) => "cons",
            Self::Builtin(_) => "buildin",
            Self::Lambda(_) => "lambda",
            Self::Macro(_) => "macro",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truth_and_nil() {
        assert!(Expr::boolean(true).is_symbol("T"));
        assert!(Expr::boolean(false).is_nil());
        assert!(!Expr::Integer(0).is_nil());
    }

    #[test]
    fn type_names() {
        assert_eq!(Expr::Float(1.5).type_name(), "float");
        assert_eq!(Expr::string("x").type_name(), "string");
        assert_eq!(Expr::Pair(CellId(0)).type_name(), "cons");
    }
}
