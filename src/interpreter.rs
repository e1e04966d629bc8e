use std::{collections::HashMap, sync::Arc};

use log::{debug, trace};

use crate::{
    cells::Callable,
    context::EvaluationContext,
    environment::ScopeId,
    error::YalError,
    expression::{CellId, EvaluationResult, Expr},
};

pub(crate) fn list_elements(list: &Expr, origin: &str, ctx: &EvaluationContext) -> Result<Vec<Expr>, YalError> {
    ctx.cells.elements(list)
        .ok_or_else(|| YalError::program(origin, "expected a proper list, got", list.clone()))
}

fn evaluate_list(list: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> Result<Vec<Expr>, YalError> {
    list_elements(list, "eval", ctx)?.iter()
        .map(|expr| evaluate(expr, scope, ctx))
        .collect()
}

/// Evaluates every form of `body` in order and returns the last value.
pub(crate) fn evaluate_body(body: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let mut result = Expr::Nil;
    for form in list_elements(body, "progn", ctx)? {
        result = evaluate(&form, scope, ctx)?;
    }
    Ok(result)
}

fn evaluate_symbol(name: &str, scope: ScopeId, ctx: &EvaluationContext) -> Expr {
    if name == "t" || name == "T" {
        return Expr::truth();
    }
    ctx.environment.lookup(scope, name).unwrap_or(Expr::Nil)
}

fn evaluate_quote(arguments: &Expr, ctx: &mut EvaluationContext) -> EvaluationResult {
    match list_elements(arguments, "quote", ctx)?.as_slice() {
        [quoted] => Ok(quoted.clone()),
        _ => Err(YalError::program("quote", "expected 1 argument, got", arguments.clone())),
    }
}

fn evaluate_if(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (if condition then [else])

    let items = list_elements(arguments, "if", ctx)?;
    if !(2..=3).contains(&items.len()) {
        return Err(YalError::program("if", "expected required condition and true body, got", arguments.clone()));
    }

    if !evaluate(&items[0], scope, ctx)?.is_nil() {
        evaluate(&items[1], scope, ctx)
    } else {
        match items.get(2) {
            Some(otherwise) => evaluate(otherwise, scope, ctx),
            None => Ok(Expr::Nil),
        }
    }
}

fn make_callable(
    name: Arc<str>,
    params: Expr,
    body: Expr,
    scope: Option<ScopeId>,
    ctx: &mut EvaluationContext,
) -> Result<CellId, YalError> {
    let Some(binds) = ctx.cells.elements(&params) else {
        return Err(YalError::program(&name, "expected a parameter list, got", params));
    };
    if let Some(bind) = binds.iter().find(|bind| !matches!(bind, Expr::Symbol(_))) {
        return Err(YalError::program(&name, "expected parameters to be symbols, not", bind.clone()));
    }

    if let Some(scope) = scope {
        ctx.environment.pin(scope);
    }
    ctx.cells.callable(Callable { name, params, body, scope })
}

fn evaluate_lambda(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (lambda (params...) body...) captures the scope it is created in

    let params = ctx.cells.car(arguments);
    let body = ctx.cells.cdr(arguments);
    Ok(Expr::Lambda(make_callable(Arc::from("lambda"), params, body, Some(scope), ctx)?))
}

fn definition_name(origin: &str, name: &Expr, ctx: &EvaluationContext) -> Result<Arc<str>, YalError> {
    let Expr::Symbol(name) = name else {
        return Err(YalError::program(origin, "expects name to be a symbol, got", name.clone()));
    };
    if ctx.environment.is_constant(name) {
        return Err(YalError::program(origin, "cannot redefine constant", Expr::Symbol(name.clone())));
    }
    Ok(name.clone())
}

fn parse_named_callable(
    origin: &str,
    arguments: &Expr,
    scope: ScopeId,
    ctx: &mut EvaluationContext,
) -> Result<(Arc<str>, Expr, Expr), YalError> {
    let items = list_elements(arguments, origin, ctx)?;
    if items.len() < 2 {
        return Err(YalError::program(origin, "expected arguments to be name, binds and body, got", arguments.clone()));
    }

    let name = definition_name(origin, &items[0], ctx)?;
    let body = ctx.cells.cdr(&ctx.cells.cdr(arguments));
    trace!("defining {} {} in frame {:?}", origin, name, scope);
    Ok((name, items[1].clone(), body))
}

fn evaluate_fn(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (fn! name (params...) body...)

    let (name, params, body) = parse_named_callable("fn!", arguments, scope, ctx)?;
    let function = Expr::Lambda(make_callable(name.clone(), params, body, Some(scope), ctx)?);
    ctx.environment.define_local(scope, name.clone(), function);
    Ok(Expr::Symbol(name))
}

fn evaluate_macro(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (macro! name (params...) body...), macros capture no scope

    let (name, params, body) = parse_named_callable("macro!", arguments, scope, ctx)?;
    let function = Expr::Macro(make_callable(name.clone(), params, body, None, ctx)?);
    ctx.environment.define_local(scope, name.clone(), function);
    Ok(Expr::Symbol(name))
}

fn evaluate_scope(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let frame = ctx.environment.push(scope);
    let result = evaluate_body(arguments, frame, ctx);
    ctx.environment.pop(frame);
    result
}

fn evaluate_try(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (try body [err handler...]). A return is not an error and passes through.

    let items = list_elements(arguments, "try", ctx)?;
    let body = items.first().cloned().unwrap_or(Expr::Nil);

    let error = match evaluate(&body, scope, ctx) {
        Ok(value) => return Ok(value),
        Err(error @ YalError::Return(_)) => return Err(error),
        Err(error) => error,
    };
    debug!("try caught {}", error);
    let value = ctx.error_value(error);

    let Some(binding) = items.get(1) else {
        return Ok(value);
    };
    let Expr::Symbol(name) = binding else {
        return Err(YalError::program("try", "arg 2 expected symbol for error, not", binding.clone()));
    };

    let frame = ctx.environment.push(scope);
    ctx.environment.define_local(frame, name.clone(), value);
    let handler = ctx.cells.cdr(&ctx.cells.cdr(arguments));
    let result = evaluate_body(&handler, frame, ctx);
    ctx.environment.pop(frame);
    result
}

fn evaluate_throw(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let mut values = evaluate_list(arguments, scope, ctx)?;
    values.insert(0, Expr::symbol("error"));
    Err(YalError::Thrown(ctx.cells.list(values)?))
}

fn evaluate_return(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let mut values = evaluate_list(arguments, scope, ctx)?;
    match values.len() {
        0 => Err(YalError::Return(Expr::Nil)),
        1 => Err(YalError::Return(values.remove(0))),
        _ => {
            let irritant = ctx.cells.list(values)?;
            Err(YalError::program("return", "can only have 0-1 argument, got", irritant))
        }
    }
}

fn evaluate_set(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (set! name value) overwrites an existing, non-constant binding

    let items = list_elements(arguments, "set!", ctx)?;
    let [name, value] = items.as_slice() else {
        return Err(YalError::program("set!", "expects symbol and value, got", arguments.clone()));
    };
    let Expr::Symbol(name) = name else {
        return Err(YalError::program("set!", "expects name to be a symbol, got", name.clone()));
    };
    if ctx.environment.is_constant(name) {
        return Err(YalError::program("set!", "cannot modify constant", Expr::Symbol(name.clone())));
    }

    let value = evaluate(value, scope, ctx)?;
    if !ctx.environment.set(scope, name, value.clone()) {
        return Err(YalError::program("set!", "could not find existing symbol called", Expr::Symbol(name.clone())));
    }
    Ok(value)
}

#[derive(Clone, Copy)]
enum Definition {
    Local,
    Global,
    Constant,
}

fn evaluate_definition(
    definition: Definition,
    arguments: &Expr,
    scope: ScopeId,
    ctx: &mut EvaluationContext,
) -> EvaluationResult {
    let origin = match definition {
        Definition::Local => "local!",
        Definition::Global => "global!",
        Definition::Constant => "const!",
    };

    let items = list_elements(arguments, origin, ctx)?;
    let [name, value] = items.as_slice() else {
        return Err(YalError::program(origin, "expects symbol and value, got", arguments.clone()));
    };
    let name = definition_name(origin, name, ctx)?;

    let value = evaluate(value, scope, ctx)?;
    match definition {
        Definition::Local => ctx.environment.define_local(scope, name.clone(), value),
        Definition::Global => ctx.environment.define_global(name.clone(), value),
        Definition::Constant => ctx.environment.define_constant(name.clone(), value),
    }
    Ok(Expr::Symbol(name))
}

fn evaluate_equal(arguments: &Expr, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (equal a b ...) compares its arguments as written, without evaluating them

    let items = list_elements(arguments, "equal", ctx)?;
    let equal = items.windows(2).all(|pair| ctx.cells.equal(&pair[0], &pair[1]));
    Ok(Expr::boolean(equal))
}

// Rewrites a quasiquote template into the list/append/quote calls that build it.
// A list template becomes one flat (append (list ...) spliced ... tail) call.
fn quasiquote(template: &Expr, ctx: &mut EvaluationContext) -> EvaluationResult {
    let Expr::Pair(id) = template else {
        return match template {
            Expr::Symbol(_) => ctx.cells.list(vec![Expr::symbol("quote"), template.clone()]),
            other => Ok(other.clone()),
        };
    };

    let car = ctx.cells.pair(*id).0.clone();
    if car.is_symbol("unquote") {
        return Ok(ctx.cells.car(&ctx.cells.cdr(template)));
    }
    if car.is_symbol("unquote-splicing") {
        return Err(YalError::program("quasiquote", "cannot splice outside of a list", template.clone()));
    }

    ctx.enter()?;
    let result = quasiquote_list(template, ctx);
    ctx.leave();
    result
}

fn quasiquote_list(template: &Expr, ctx: &mut EvaluationContext) -> EvaluationResult {
    let mut segments = vec![Expr::symbol("append")];
    let mut run = vec![Expr::symbol("list")];
    let mut current = template.clone();
    let mut steps = 0;

    let tail = loop {
        let Expr::Pair(id) = current else {
            break quasiquote(&current, ctx)?;
        };
        let (car, cdr) = {
            let (car, cdr) = ctx.cells.pair(id);
            (car.clone(), cdr.clone())
        };

        // (a b . ,c) reads as (a b unquote c)
        if car.is_symbol("unquote") {
            break ctx.cells.car(&cdr);
        }

        if ctx.cells.car(&car).is_symbol("unquote-splicing") {
            if run.len() > 1 {
                let items = std::mem::replace(&mut run, vec![Expr::symbol("list")]);
                segments.push(ctx.cells.list(items)?);
            }
            segments.push(ctx.cells.car(&ctx.cells.cdr(&car)));
        } else {
            run.push(quasiquote(&car, ctx)?);
        }

        steps += 1;
        if steps > ctx.cells.len() {
            return Err(YalError::program("quasiquote", "cannot expand a cyclic template", None));
        }
        current = cdr;
    };

    if run.len() > 1 {
        segments.push(ctx.cells.list(run)?);
    }
    segments.push(tail);
    ctx.cells.list(segments)
}

fn evaluate_quasiquote(arguments: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let template = match list_elements(arguments, "quasiquote", ctx)?.as_slice() {
        [template] => template.clone(),
        _ => return Err(YalError::program("quasiquote", "expected 1 argument, got", arguments.clone())),
    };

    let expansion = quasiquote(&template, ctx)?;
    evaluate(&expansion, scope, ctx)
}

fn bind_arguments(
    callable: &Callable,
    arguments: Vec<Expr>,
    ctx: &mut EvaluationContext,
) -> Result<Vec<(Arc<str>, Expr)>, YalError> {
    // Missing arguments bind to nil. A parameter spelled &name takes the rest.

    let params = list_elements(&callable.params, &callable.name, ctx)?;
    let mut arguments = arguments.into_iter();
    let mut bindings = Vec::with_capacity(params.len());

    for param in params {
        let name = match param {
            Expr::Symbol(name) => name,
            other => return Err(YalError::program(&callable.name, "expected parameters to be symbols, not", other)),
        };

        if let Some(rest) = name.strip_prefix('&').filter(|rest| !rest.is_empty()) {
            let remaining = ctx.cells.list(arguments.by_ref().collect())?;
            bindings.push((Arc::from(rest), remaining));
            return Ok(bindings);
        }
        bindings.push((name, arguments.next().unwrap_or(Expr::Nil)));
    }

    let surplus: Vec<Expr> = arguments.collect();
    if !surplus.is_empty() {
        let irritant = ctx.cells.list(surplus)?;
        return Err(YalError::program(&callable.name, "too many inputs given", irritant));
    }
    Ok(bindings)
}

fn call_lambda(id: CellId, arguments: Vec<Expr>, ctx: &mut EvaluationContext) -> EvaluationResult {
    let callable = ctx.cells.callable_of(id).clone();
    let outer = callable.scope.unwrap_or_else(|| ctx.environment.global());
    let bindings = bind_arguments(&callable, arguments, ctx)?;

    let frame = ctx.environment.push(outer);
    for (name, value) in bindings {
        ctx.environment.define_local(frame, name, value);
    }
    let result = evaluate_body(&callable.body, frame, ctx);
    ctx.environment.pop(frame);

    match result {
        Err(YalError::Return(value)) => Ok(value),
        result => result,
    }
}

fn substitute(body: &Expr, bindings: &HashMap<Arc<str>, Expr>, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Walks list spines iteratively and recurses only into elements

    match body {
        Expr::Symbol(name) => match bindings.get(name) {
            Some(value) => ctx.cells.list(vec![Expr::symbol("quote"), value.clone()]),
            None => Ok(body.clone()),
        },
        Expr::Pair(_) => {
            ctx.enter()?;
            let mut items = vec![];
            let mut current = body.clone();
            let result = loop {
                let Expr::Pair(id) = current else {
                    break substitute(&current, bindings, ctx);
                };
                let (car, cdr) = {
                    let (car, cdr) = ctx.cells.pair(id);
                    (car.clone(), cdr.clone())
                };
                match substitute(&car, bindings, ctx) {
                    Ok(car) => items.push(car),
                    Err(error) => break Err(error),
                }
                if items.len() > ctx.cells.len() {
                    break Err(YalError::program("macro", "cannot expand a cyclic body", None));
                }
                current = cdr;
            };
            ctx.leave();
            ctx.cells.list_with_tail(items, result?)
        }
        other => Ok(other.clone()),
    }
}

/// Expands a macro call without evaluating the expansion.
///
/// Every parameter occurring in a fresh copy of the macro body is replaced by
/// its quoted, unevaluated argument, and the copy is evaluated in `scope`.
pub(crate) fn expand_macro(id: CellId, arguments: Vec<Expr>, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let callable = ctx.cells.callable_of(id).clone();
    let bindings: HashMap<_, _> = bind_arguments(&callable, arguments, ctx)?.into_iter().collect();

    let body = substitute(&callable.body, &bindings, ctx)?;
    let expansion = evaluate_body(&body, scope, ctx)?;
    debug!("expanded macro {} into {}", callable.name, ctx.display(&expansion));
    Ok(expansion)
}

/// Applies a callable to arguments that are already in their final form:
/// evaluated values for builtins and lambdas, raw expressions for macros.
pub(crate) fn call(function: &Expr, arguments: Vec<Expr>, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    match function {
        Expr::Builtin(builtin) => {
            trace!("calling builtin {}", builtin.name);
            (builtin.function)(arguments, scope, ctx)
        }
        Expr::Lambda(id) => call_lambda(*id, arguments, ctx),
        Expr::Macro(id) => {
            let expansion = expand_macro(*id, arguments, scope, ctx)?;
            evaluate(&expansion, scope, ctx)
        }
        other => Err(YalError::program("apply", "not a callable", other.clone())),
    }
}

fn evaluate_expression(id: CellId, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Special forms are recognised by name before the operator is evaluated

    let (operator, arguments) = {
        let (car, cdr) = ctx.cells.pair(id);
        (car.clone(), cdr.clone())
    };

    if let Expr::Symbol(name) = &operator {
        match &**name {
            "quote" => return evaluate_quote(&arguments, ctx),
            "if" => return evaluate_if(&arguments, scope, ctx),
            "lambda" => return evaluate_lambda(&arguments, scope, ctx),
            "fn!" => return evaluate_fn(&arguments, scope, ctx),
            "macro!" => return evaluate_macro(&arguments, scope, ctx),
            "progn" => return evaluate_body(&arguments, scope, ctx),
            "scope" => return evaluate_scope(&arguments, scope, ctx),
            "try" => return evaluate_try(&arguments, scope, ctx),
            "throw" => return evaluate_throw(&arguments, scope, ctx),
            "return" => return evaluate_return(&arguments, scope, ctx),
            "set!" => return evaluate_set(&arguments, scope, ctx),
            "local!" => return evaluate_definition(Definition::Local, &arguments, scope, ctx),
            "global!" => return evaluate_definition(Definition::Global, &arguments, scope, ctx),
            "const!" => return evaluate_definition(Definition::Constant, &arguments, scope, ctx),
            "equal" => return evaluate_equal(&arguments, ctx),
            "quasiquote" => return evaluate_quasiquote(&arguments, scope, ctx),
            "unquote" | "unquote-splicing" => {
                return Err(YalError::program(name, "not inside a quasiquote", Expr::Pair(id)))
            }
            _ => {}
        }
    }

    let function = evaluate(&operator, scope, ctx)?;
    let arguments = match &function {
        Expr::Macro(_) => list_elements(&arguments, "eval", ctx)?,
        Expr::Builtin(_) | Expr::Lambda(_) => evaluate_list(&arguments, scope, ctx)?,
        Expr::Nil => return Err(YalError::program("eval", "could not evaluate unknown function", operator)),
        other => return Err(YalError::program("eval", "could not find function called", other.clone())),
    };

    call(&function, arguments, scope, ctx)
}

pub(crate) fn evaluate(expr: &Expr, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    ctx.enter()?;
    trace!("evaluating {}", ctx.display(expr));

    let result = match expr {
        Expr::Symbol(name) => Ok(evaluate_symbol(name, scope, ctx)),
        Expr::Pair(id) => evaluate_expression(*id, scope, ctx),
        other => Ok(other.clone()),
    };

    ctx.leave();
    result
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use itertools::Itertools;

    use crate::{
        config::Config,
        context::EvaluationContext,
        test_utils::{all_testcases, load_test_pair, Expected},
    };

    fn assert_run(testcase: usize, entries: &[(String, Expected)]) -> anyhow::Result<()> {
        let mut context = EvaluationContext::new();
        for (lineno, (source, expected)) in entries.iter().enumerate() {
            let result = context.evaluate_str(source);
            let printed = context.print(&result);
            let is_error = context.is_error(&result);

            println!("{} => {}", source, printed);
            if is_error == expected.ok {
                bail!("Testcase({}, {}): {} gave {}, expected ok = {}", testcase, lineno, source, printed, expected.ok);
            }
            if let Some(output) = &expected.output {
                if &printed != output {
                    bail!("Testcase({}, {}): {} gave {}, expected {}", testcase, lineno, source, printed, output);
                }
            }
        }

        Ok(())
    }

    #[test]
    fn evaluate_testcase() -> anyhow::Result<()> {
        for testcase in all_testcases() {
            println!("Running testcase {}", testcase);
            let entries = load_test_pair(testcase)?;
            assert_run(testcase, &entries)?;
        }

        Ok(())
    }

    fn run(context: &mut EvaluationContext, source: &str) -> String {
        let result = context.evaluate_str(source);
        context.print(&result)
    }

    fn fails(context: &mut EvaluationContext, source: &str) -> bool {
        let result = context.evaluate_str(source);
        context.is_error(&result)
    }

    #[test]
    fn locals_do_not_escape_lambdas() {
        let mut context = EvaluationContext::new();
        assert_eq!(run(&mut context, "((lambda () (local! x 5) x))"), "5");
        assert_eq!(run(&mut context, "x"), "NIL");
    }

    #[test]
    fn closures_keep_their_scope() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(fn! counter () (local! n 0) (lambda () (set! n (+ n 1))))");
        run(&mut context, "(global! tick (counter))");
        run(&mut context, "(tick)");
        assert_eq!(run(&mut context, "(tick)"), "2");
        assert_eq!(run(&mut context, "(global! other (counter))"), "other");
        assert_eq!(run(&mut context, "(other)"), "1");
    }

    #[test]
    fn frames_are_released_after_calls() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(fn! square (x) (* x x))");
        let before = context.environment.frames_in_use();
        assert_eq!(run(&mut context, "(square (square 3))"), "81");
        assert_eq!(context.environment.frames_in_use(), before);
    }

    #[test]
    fn macros_receive_unevaluated_arguments() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(macro! unless (c body) (list 'if c nil body))");
        assert_eq!(run(&mut context, "(unless nil (+ 1 2))"), "3");
        assert_eq!(run(&mut context, "(unless t (undefined-function))"), "NIL");
        assert_eq!(run(&mut context, "(macro-expand '(unless x y))"), "(if x NIL y)");
    }

    #[test]
    fn macro_templates_are_not_mutated() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(macro! twice (e) (list 'progn e e))");
        assert_eq!(run(&mut context, "(macro-expand '(twice a))"), "(progn a a)");
        assert_eq!(run(&mut context, "(macro-expand '(twice b))"), "(progn b b)");
    }

    #[test]
    fn rest_parameters() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(fn! tail (a &rest) rest)");
        assert_eq!(run(&mut context, "(tail 1 2 3)"), "(2 3)");
        assert_eq!(run(&mut context, "(tail 1)"), "NIL");
        assert_eq!(run(&mut context, "((lambda (a b) b) 1)"), "NIL");
        assert_eq!(
            run(&mut context, "((lambda (a) a) 1 2)"),
            r#"(error "[lambda] too many inputs given" (2))"#
        );
    }

    #[test]
    fn quasiquote_splices() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(global! L '(3 4 5))");
        assert_eq!(run(&mut context, "`(1 2 ,@L)"), "(1 2 3 4 5)");
        assert_eq!(run(&mut context, "`(a ,(car L) ,@L b)"), "(a 3 3 4 5 b)");
        assert_eq!(run(&mut context, "`(a . ,(car L))"), "(a . 3)");
        assert!(fails(&mut context, "(unquote L)"));
    }

    #[test]
    fn long_quasiquote_templates_are_flat() {
        let mut context = EvaluationContext::with_config(Config { cell_capacity: 1 << 16, max_depth: 32 });
        let numbers = (0..300).join(" ");

        let result = run(&mut context, &format!("`({} ,(+ 1 1))", numbers));
        assert_eq!(result, format!("({} 2)", numbers));
        assert_eq!(run(&mut context, &format!("(len `({}))", numbers)), "300");
    }

    #[test]
    fn try_throw_and_return() {
        let mut context = EvaluationContext::new();
        assert_eq!(run(&mut context, "(try (throw \"x\") err ['caught err])"), "(caught (error \"x\"))");
        assert_eq!(run(&mut context, "(try (/ 1 0))"), r#"(error "[/] divide by zero" (1 0))"#);
        assert_eq!(run(&mut context, "(try 5 err 6)"), "5");
        assert_eq!(run(&mut context, "((lambda () (try (return 1) e 2) 3))"), "1");
        assert_eq!(run(&mut context, "err"), "NIL");
    }

    #[test]
    fn failed_definitions_leave_bindings_untouched() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(global! x 1)");
        assert!(fails(&mut context, "(set! x (/ 1 0))"));
        assert_eq!(run(&mut context, "x"), "1");
        assert!(fails(&mut context, "(set! car 1)"));
        assert!(fails(&mut context, "(local! car 1)"));
        assert!(fails(&mut context, "(set! unbound 1)"));
    }

    #[test]
    fn recursion_depth_is_bounded() {
        let mut context = EvaluationContext::new();
        run(&mut context, "(fn! forever (n) (+ 1 (forever n)))");
        assert_eq!(
            run(&mut context, "(forever 0)"),
            r#"(error "[eval] maximum recursion depth exceeded")"#
        );
        assert_eq!(run(&mut context, "(+ 1 2)"), "3");
    }

    #[test]
    fn unknown_functions() {
        let mut context = EvaluationContext::new();
        assert_eq!(
            run(&mut context, "(nope 1)"),
            r#"(error "[eval] could not evaluate unknown function" nope)"#
        );
        assert!(fails(&mut context, "(1 2)"));
    }
}
