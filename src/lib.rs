mod builtin;
mod cells;
mod config;
mod context;
mod environment;
mod error;
mod expression;
mod interpreter;
mod parser;
mod printer;

#[cfg(test)]
mod test_utils;

pub use cells::CellStore;
pub use config::Config;
pub use context::EvaluationContext;
pub use environment::{Environment, ScopeId};
pub use error::YalError;
pub use expression::{Builtin, BuiltinFn, CellId, EvaluationResult, Expr};
pub use parser::{read, read_all};
pub use printer::Printed;
