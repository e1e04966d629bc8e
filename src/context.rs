use std::{sync::Arc, thread};

use log::{debug, warn};

use crate::{
    builtin::load_core,
    cells::CellStore,
    config::Config,
    environment::Environment,
    error::YalError,
    expression::{Builtin, BuiltinFn, EvaluationResult, Expr},
    interpreter::evaluate,
    parser,
    printer::Printed,
};

// Host stack reserved per level of evaluation depth
const STACK_PER_LEVEL: usize = 16 * 1024;
const MIN_STACK: usize = 1 << 20;

/// An evaluation context owns everything a yal program touches: the cell
/// store, the environment and the output buffer.
///
/// Evaluation errors never escape [`EvaluationContext::eval`] and
/// [`EvaluationContext::evaluate_str`]; they are turned into error values of
/// the form `(error "[origin] message" irritant)`. All cells are released
/// together when the context is dropped.
pub struct EvaluationContext {
    pub(crate) cells: CellStore,
    pub(crate) environment: Environment,
    output: String,
    depth: usize,
    max_depth: usize,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut context = Self {
            cells: CellStore::with_capacity(config.cell_capacity),
            environment: Environment::new(),
            output: String::new(),
            depth: 0,
            max_depth: config.max_depth,
        };
        load_core(&mut context);
        context
    }

    pub(crate) fn enter(&mut self) -> Result<(), YalError> {
        if self.depth >= self.max_depth {
            return Err(YalError::program("eval", "maximum recursion depth exceeded", None));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Reads the first expression of `input`.
    pub fn read(&mut self, input: &str) -> EvaluationResult {
        parser::read(input, &mut self.cells)
    }

    pub fn read_all(&mut self, input: &str) -> Result<Vec<Expr>, YalError> {
        parser::read_all(input, &mut self.cells)
    }

    /// Runs `run` on a thread whose stack fits `max_depth` levels of
    /// evaluation, so running out of depth is an error value and never a
    /// host stack overflow.
    fn on_evaluation_stack(&mut self, run: impl FnOnce(&mut Self) -> EvaluationResult + Send) -> EvaluationResult {
        let stack_size = self.max_depth.saturating_mul(STACK_PER_LEVEL).max(MIN_STACK);
        debug!("evaluating on a {} byte stack", stack_size);

        let context = self;
        thread::scope(move |scope| {
            let handle = thread::Builder::new()
                .name("yal-eval".to_owned())
                .stack_size(stack_size)
                .spawn_scoped(scope, move || run(context))
                .map_err(|error| {
                    YalError::program("eval", &format!("cannot start evaluation thread: {}", error), None)
                })?;
            handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    }

    fn evaluate_global(&mut self, expr: &Expr) -> EvaluationResult {
        self.depth = 0;
        let global = self.environment.global();
        evaluate(expr, global, self)
    }

    /// Evaluates `expr` in the global scope, keeping errors as `Err`.
    pub fn evaluate(&mut self, expr: &Expr) -> EvaluationResult {
        self.on_evaluation_stack(|context| context.evaluate_global(expr))
    }

    /// Evaluates `expr` in the global scope. Errors become error values.
    pub fn eval(&mut self, expr: &Expr) -> Expr {
        match self.evaluate(expr) {
            Ok(value) => value,
            Err(error) => self.report(error),
        }
    }

    /// Reads and evaluates every expression of `input` in order, stopping at
    /// the first error. Returns the value of the last expression.
    pub fn evaluate_str(&mut self, input: &str) -> Expr {
        let result = self.on_evaluation_stack(|context| {
            let exprs = context.read_all(input)?;
            exprs.iter().try_fold(Expr::Nil, |_, expr| context.evaluate_global(expr))
        });

        match result {
            Ok(value) => value,
            Err(error) => self.report(error),
        }
    }

    fn report(&mut self, error: YalError) -> Expr {
        warn!("{}", error);
        self.error_value(error)
    }

    /// Converts an error into the value a yal program sees.
    pub(crate) fn error_value(&mut self, error: YalError) -> Expr {
        let (message, irritant) = match error {
            YalError::Thrown(value) | YalError::Return(value) => return value,
            YalError::Program { origin, message, irritant } => (format!("[{}] {}", origin, message), irritant),
            error @ YalError::Syntax(_) => (format!("[read] {}", error), None),
            error @ YalError::Exhausted(_) => (format!("[alloc] {}", error), None),
        };

        let mut items = vec![Expr::symbol("error"), Expr::string(&message)];
        items.extend(irritant);
        self.cells.list_unbounded(items)
    }

    pub fn is_error(&self, expr: &Expr) -> bool {
        self.cells.car(expr).is_symbol("error")
    }

    pub fn print(&self, expr: &Expr) -> String {
        self.display(expr).to_string()
    }

    pub fn display<'a>(&'a self, expr: &'a Expr) -> Printed<'a> {
        Printed::new(expr, &self.cells)
    }

    pub fn car(&self, expr: &Expr) -> Expr {
        self.cells.car(expr)
    }

    pub fn cdr(&self, expr: &Expr) -> Expr {
        self.cells.cdr(expr)
    }

    pub fn equal(&self, a: &Expr, b: &Expr) -> bool {
        self.cells.equal(a, b)
    }

    /// Value of `name` as seen from the global scope, `Nil` if unbound.
    pub fn lookup(&self, name: &str) -> Expr {
        self.environment.lookup(self.environment.global(), name).unwrap_or(Expr::Nil)
    }

    pub fn add_constant(&mut self, name: &str, value: Expr) {
        self.environment.define_constant(Arc::from(name), value);
    }

    pub fn add_builtin(&mut self, name: &'static str, function: BuiltinFn) {
        self.add_constant(name, Expr::Builtin(Builtin::new(name, function)));
    }

    pub(crate) fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Drains everything written by `write` and `newline` so far.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn cells_in_use(&self) -> usize {
        self.cells.len()
    }
}

impl Drop for EvaluationContext {
    fn drop(&mut self) {
        debug!(
            "releasing {} cells and {} frames",
            self.cells.len(),
            self.environment.frames_in_use()
        );
    }
}
