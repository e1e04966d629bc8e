use thiserror::Error;

use crate::expression::Expr;

#[derive(Debug, Clone, Error)]
pub enum YalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    /// An error raised by the interpreter itself. `origin` names the form or
    /// builtin that failed and `irritant` is the offending expression, if any.
    #[error("[{origin}] {message}")]
    Program {
        origin: String,
        message: String,
        irritant: Option<Expr>,
    },

    /// A value raised by `throw`, already shaped as an error value.
    #[error("thrown value")]
    Thrown(Expr),

    /// Early exit from the innermost lambda call.
    #[error("return outside of a function body")]
    Return(Expr),

    #[error("cell store exhausted ({0} cells in use)")]
    Exhausted(usize),
}

impl YalError {
    pub(crate) fn program(origin: &str, message: &str, irritant: impl Into<Option<Expr>>) -> Self {
        Self::Program {
            origin: origin.to_owned(),
            message: message.to_owned(),
            irritant: irritant.into(),
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_error_message() {
        let error = YalError::program("/", "divide by zero", None);
        assert_eq!(error.to_string(), "[/] divide by zero");
    }

    #[test]
    fn syntax_error_message() {
        assert_eq!(YalError::syntax("unexpected ')'").to_string(), "syntax error: unexpected ')'");
    }
}
