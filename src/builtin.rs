use itertools::Itertools;

use crate::{
    context::EvaluationContext,
    environment::ScopeId,
    error::YalError,
    expression::{EvaluationResult, Expr},
    interpreter::{call, evaluate, expand_macro, list_elements},
    parser,
    printer::Printed,
};

fn expect_arguments<const N: usize>(
    origin: &str,
    values: Vec<Expr>,
    ctx: &mut EvaluationContext,
) -> Result<[Expr; N], YalError> {
    <[Expr; N]>::try_from(values).map_err(|values| {
        let message = match N {
            1 => "expected 1 argument, got".to_owned(),
            n => format!("expected {} arguments, got", n),
        };
        YalError::program(origin, &message, ctx.cells.list_unbounded(values))
    })
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn of(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Integer(value) => Some(Self::Integer(*value)),
            Expr::Float(value) => Some(Self::Float(*value)),
            _ => None,
        }
    }

    fn from_expr(origin: &str, message: &str, expr: &Expr) -> Result<Self, YalError> {
        Self::of(expr).ok_or_else(|| YalError::program(origin, message, expr.clone()))
    }

    fn as_float(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Integer(value) => value == 0,
            Self::Float(value) => value == 0.0,
        }
    }
}

impl From<Number> for Expr {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(value) => Expr::Integer(value),
            Number::Float(value) => Expr::Float(value),
        }
    }
}

fn numbers(origin: &str, message: &str, values: &[Expr]) -> Result<Vec<Number>, YalError> {
    values.iter()
        .map(|value| Number::from_expr(origin, message, value))
        .collect()
}

fn overflow(origin: &str) -> YalError {
    YalError::program(origin, "integer overflow", None)
}

// Floats never hold infinities or NaN, so every printed float reads back as one
fn finite(origin: &str, value: f64) -> Result<f64, YalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(YalError::program(origin, "result is not a finite number", None))
    }
}

// Integers stay integers until they meet a float
fn combine(
    origin: &str,
    a: Number,
    b: Number,
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Number, YalError> {
    match (a, b) {
        (Number::Integer(a), Number::Integer(b)) => integer(a, b).map(Number::Integer).ok_or_else(|| overflow(origin)),
        (a, b) => finite(origin, float(a.as_float(), b.as_float())).map(Number::Float),
    }
}

fn fold_numbers(
    origin: &str,
    values: Vec<Expr>,
    identity: i64,
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> EvaluationResult {
    numbers(origin, "cannot do math on non-value", &values)?
        .into_iter()
        .try_fold(Number::Integer(identity), |accumulator, number| combine(origin, accumulator, number, integer, float))
        .map(Expr::from)
}

fn builtin_add(values: Vec<Expr>, _scope: ScopeId, _ctx: &mut EvaluationContext) -> EvaluationResult {
    fold_numbers("+", values, 0, i64::checked_add, |a, b| a + b)
}

fn builtin_mul(values: Vec<Expr>, _scope: ScopeId, _ctx: &mut EvaluationContext) -> EvaluationResult {
    fold_numbers("*", values, 1, i64::checked_mul, |a, b| a * b)
}

fn builtin_sub(values: Vec<Expr>, _scope: ScopeId, _ctx: &mut EvaluationContext) -> EvaluationResult {
    // (- x) negates, (- x y z) subtracts y and z from x

    let numbers = numbers("-", "cannot do math on non-value", &values)?;
    let subtract = |a, b| combine("-", a, b, i64::checked_sub, |a, b| a - b);

    match numbers.split_first() {
        None => Ok(Expr::Integer(0)),
        Some((&only, [])) => subtract(Number::Integer(0), only).map(Expr::from),
        Some((&first, rest)) => rest.iter()
            .try_fold(first, |accumulator, &number| subtract(accumulator, number))
            .map(Expr::from),
    }
}

fn divide(a: Number, b: Number, ctx: &mut EvaluationContext) -> Result<Number, YalError> {
    if b.is_zero() {
        let irritant = ctx.cells.list_unbounded(vec![a.into(), b.into()]);
        return Err(YalError::program("/", "divide by zero", irritant));
    }

    match (a, b) {
        (Number::Integer(a), Number::Integer(b)) => {
            let remainder = a.checked_rem(b).ok_or_else(|| overflow("/"))?;
            if remainder == 0 {
                a.checked_div(b).map(Number::Integer).ok_or_else(|| overflow("/"))
            } else {
                finite("/", a as f64 / b as f64).map(Number::Float)
            }
        }
        (a, b) => finite("/", a.as_float() / b.as_float()).map(Number::Float),
    }
}

fn builtin_div(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (/) is 1 and (/ x) is x. Exact integer quotients stay integers.

    let numbers = numbers("/", "cannot do math on non-value", &values)?;
    let Some((&first, rest)) = numbers.split_first() else {
        return Ok(Expr::Integer(1));
    };

    rest.iter()
        .try_fold(first, |accumulator, &number| divide(accumulator, number, ctx))
        .map(Expr::from)
}

fn less_than(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Integer(a), Number::Integer(b)) => a < b,
        (a, b) => a.as_float() < b.as_float(),
    }
}

fn builtin_compare(origin: &str, values: Vec<Expr>, ordered: fn(Number, Number) -> bool) -> EvaluationResult {
    let numbers = numbers(origin, "can only compare values, not", &values)?;
    Ok(Expr::boolean(numbers.into_iter().tuple_windows().all(|(a, b)| ordered(a, b))))
}

fn builtin_less(values: Vec<Expr>, _scope: ScopeId, _ctx: &mut EvaluationContext) -> EvaluationResult {
    builtin_compare("<", values, less_than)
}

fn builtin_greater(values: Vec<Expr>, _scope: ScopeId, _ctx: &mut EvaluationContext) -> EvaluationResult {
    builtin_compare(">", values, |a, b| less_than(b, a))
}

// Numbers compare by value across integer and float, everything else structurally
fn values_equal(a: &Expr, b: &Expr, ctx: &EvaluationContext) -> bool {
    match (Number::of(a), Number::of(b)) {
        (Some(Number::Integer(a)), Some(Number::Integer(b))) => a == b,
        (Some(a), Some(b)) => a.as_float() == b.as_float(),
        _ => ctx.cells.equal(a, b),
    }
}

fn builtin_math_equal(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    Ok(Expr::boolean(values.iter().tuple_windows().all(|(a, b)| values_equal(a, b, ctx))))
}

fn builtin_eq(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    Ok(Expr::boolean(values.iter().tuple_windows().all(|(a, b)| ctx.cells.equal(a, b))))
}

fn builtin_list(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    ctx.cells.list(values)
}

fn builtin_cons(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [car, cdr] = expect_arguments("cons", values, ctx)?;
    ctx.cells.cons(car, cdr)
}

fn builtin_car(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [list] = expect_arguments("car", values, ctx)?;
    Ok(ctx.cells.car(&list))
}

fn builtin_cdr(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [list] = expect_arguments("cdr", values, ctx)?;
    Ok(ctx.cells.cdr(&list))
}

fn index(origin: &str, value: Expr) -> Result<usize, YalError> {
    match value {
        Expr::Integer(index) if index >= 0 => Ok(usize::try_from(index).unwrap_or(usize::MAX)),
        other => Err(YalError::program(origin, "expected a non-negative integer index, got", other)),
    }
}

fn nthcdr(list: Expr, index: usize, ctx: &EvaluationContext) -> Expr {
    let mut current = list;
    for step in 0..index {
        if !matches!(current, Expr::Pair(_)) || step > ctx.cells.len() {
            return Expr::Nil;
        }
        current = ctx.cells.cdr(&current);
    }
    current
}

fn builtin_nthcdr(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [n, list] = expect_arguments("nthcdr", values, ctx)?;
    let n = index("nthcdr", n)?;
    Ok(nthcdr(list, n, ctx))
}

fn builtin_nth(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [n, list] = expect_arguments("nth", values, ctx)?;
    let n = index("nth", n)?;
    Ok(ctx.cells.car(&nthcdr(list, n, ctx)))
}

fn builtin_len(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Counts the pairs of a list. Any other atom than nil has length 1.

    let [list] = expect_arguments("len", values, ctx)?;
    let mut length = 0;
    let mut current = match list {
        Expr::Nil => return Ok(Expr::Integer(0)),
        Expr::Pair(_) => list,
        _ => return Ok(Expr::Integer(1)),
    };

    while matches!(current, Expr::Pair(_)) {
        if length > ctx.cells.len() {
            return Err(YalError::program("len", "cannot measure a cyclic list", None));
        }
        length += 1;
        current = ctx.cells.cdr(&current);
    }
    Ok(Expr::Integer(length as i64))
}

fn builtin_range(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Inclusive on both ends, descending when the first bound is larger

    let [from, to] = expect_arguments("range", values, ctx)?;
    let (&Expr::Integer(low), &Expr::Integer(high)) = (&from, &to) else {
        let irritant = ctx.cells.list_unbounded(vec![from, to]);
        return Err(YalError::program("range", "expected integer bounds, got", irritant));
    };

    let count = (i128::from(high) - i128::from(low)).unsigned_abs() + 1;
    let available = ctx.cells.capacity().saturating_sub(ctx.cells.len());
    if count > available as u128 {
        return Err(YalError::Exhausted(ctx.cells.len()));
    }

    let items = if low <= high {
        (low..=high).map(Expr::Integer).collect()
    } else {
        (high..=low).rev().map(Expr::Integer).collect()
    };
    ctx.cells.list(items)
}

fn builtin_apply(values: Vec<Expr>, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (apply f list) calls f with the elements of list, without evaluating them again

    let [function, arguments] = expect_arguments("apply", values, ctx)?;
    let function = match function {
        Expr::Symbol(name) => ctx.environment.lookup(scope, &name).unwrap_or(Expr::Nil),
        other => other,
    };
    if !function.is_callable() {
        return Err(YalError::program("apply", "expected a function, got", function));
    }

    let arguments = list_elements(&arguments, "apply", ctx)?;
    call(&function, arguments, scope, ctx)
}

fn builtin_reverse(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Reverses a list in place by relinking its pairs

    let [list] = expect_arguments("reverse!", values, ctx)?;
    if ctx.cells.elements(&list).is_none() {
        return Err(YalError::program("reverse!", "expected a proper list, got", list));
    }

    let mut reversed = Expr::Nil;
    let mut current = list;
    while let Expr::Pair(id) = current {
        let next = ctx.cells.cdr(&current);
        ctx.cells.set_cdr(id, reversed);
        reversed = Expr::Pair(id);
        current = next;
    }
    Ok(reversed)
}

fn builtin_append(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // Every list but the last is copied, the last one becomes the shared tail

    let Some((last, init)) = values.split_last() else {
        return Ok(Expr::Nil);
    };

    let mut items = vec![];
    for list in init {
        items.extend(list_elements(list, "append", ctx)?);
    }
    ctx.cells.list_with_tail(items, last.clone())
}

fn builtin_not(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = expect_arguments("not", values, ctx)?;
    Ok(Expr::boolean(value.is_nil()))
}

fn builtin_is_nil(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = expect_arguments("nil?", values, ctx)?;
    Ok(Expr::boolean(value.is_nil()))
}

fn builtin_and(values: Vec<Expr>, _scope: ScopeId, _ctx: &mut EvaluationContext) -> EvaluationResult {
    Ok(Expr::boolean(values.iter().all(|value| !value.is_nil())))
}

fn builtin_or(values: Vec<Expr>, _scope: ScopeId, _ctx: &mut EvaluationContext) -> EvaluationResult {
    Ok(Expr::boolean(values.iter().any(|value| !value.is_nil())))
}

fn builtin_typeof(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = expect_arguments("typeof", values, ctx)?;
    match value {
        Expr::Nil => Ok(Expr::Nil),
        value => Ok(Expr::symbol(value.type_name())),
    }
}

fn builtin_eval(values: Vec<Expr>, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [expr] = expect_arguments("eval", values, ctx)?;
    evaluate(&expr, scope, ctx)
}

fn builtin_read(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [source] = expect_arguments("read", values, ctx)?;
    match source {
        Expr::String(text) => parser::read(&text, &mut ctx.cells),
        other => Err(YalError::program("read", "expects string as argument, not", other)),
    }
}

fn builtin_macro_expand(values: Vec<Expr>, scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    // (macro-expand '(name args...)) returns the expansion without evaluating it

    let [form] = expect_arguments("macro-expand", values, ctx)?;
    let function = match ctx.cells.car(&form) {
        Expr::Symbol(name) => ctx.environment.lookup(scope, &name).unwrap_or(Expr::Nil),
        other => other,
    };
    let Expr::Macro(id) = function else {
        return Err(YalError::program("macro-expand", "expected macro call as list, got", form));
    };

    let arguments = list_elements(&ctx.cells.cdr(&form), "macro-expand", ctx)?;
    expand_macro(id, arguments, scope, ctx)
}

fn builtin_stringify(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = expect_arguments("stringify", values, ctx)?;
    Ok(Expr::string(&ctx.print(&value)))
}

fn builtin_concat(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let text = values.iter()
        .map(|value| Printed::new(value, &ctx.cells).raw())
        .join("");
    Ok(Expr::string(&text))
}

fn builtin_write(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [value] = expect_arguments("write", values, ctx)?;
    let text = ctx.print(&value);
    ctx.write_output(&text);
    Ok(value)
}

fn builtin_newline(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    expect_arguments::<0>("newline", values, ctx)?;
    ctx.write_output("\n");
    Ok(Expr::Nil)
}

fn builtin_setcar(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [pair, value] = expect_arguments("setcar!", values, ctx)?;
    let Expr::Pair(id) = pair else {
        return Err(YalError::program("setcar!", "expected cons to modify, got", pair));
    };
    ctx.cells.set_car(id, value.clone());
    Ok(value)
}

fn builtin_setcdr(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let [pair, value] = expect_arguments("setcdr!", values, ctx)?;
    let Expr::Pair(id) = pair else {
        return Err(YalError::program("setcdr!", "expected cons to modify, got", pair));
    };
    ctx.cells.set_cdr(id, value.clone());
    Ok(value)
}

fn single_number(origin: &str, values: Vec<Expr>, ctx: &mut EvaluationContext) -> Result<Number, YalError> {
    let [value] = expect_arguments(origin, values, ctx)?;
    Number::from_expr(origin, "cannot do math on non-value", &value)
}

fn rounded(origin: &str, values: Vec<Expr>, ctx: &mut EvaluationContext, round: fn(f64) -> f64) -> EvaluationResult {
    // Rounding yields an integer whenever the result fits one

    match single_number(origin, values, ctx)? {
        Number::Integer(value) => Ok(Expr::Integer(value)),
        Number::Float(value) => {
            let value = round(value);
            if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
                Ok(Expr::Integer(value as i64))
            } else {
                Ok(Expr::Float(value))
            }
        }
    }
}

fn builtin_floor(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    rounded("floor", values, ctx, f64::floor)
}

fn builtin_ceil(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    rounded("ceil", values, ctx, f64::ceil)
}

fn float_function(origin: &str, values: Vec<Expr>, ctx: &mut EvaluationContext, function: fn(f64) -> f64) -> EvaluationResult {
    let value = single_number(origin, values, ctx)?.as_float();
    finite(origin, function(value)).map(Expr::Float)
}

fn builtin_sqrt(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("sqrt", values, ctx, f64::sqrt)
}

fn builtin_sin(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("sin", values, ctx, f64::sin)
}

fn builtin_cos(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("cos", values, ctx, f64::cos)
}

fn builtin_tan(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("tan", values, ctx, f64::tan)
}

fn builtin_log(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("log", values, ctx, f64::ln)
}

fn builtin_exp(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("exp", values, ctx, f64::exp)
}

fn builtin_log10(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("log10", values, ctx, f64::log10)
}

fn builtin_asin(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("asin", values, ctx, f64::asin)
}

fn builtin_acos(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("acos", values, ctx, f64::acos)
}

fn builtin_atan(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("atan", values, ctx, f64::atan)
}

fn builtin_sinh(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("sinh", values, ctx, f64::sinh)
}

fn builtin_cosh(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("cosh", values, ctx, f64::cosh)
}

fn builtin_tanh(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    float_function("tanh", values, ctx, f64::tanh)
}

fn builtin_pow(values: Vec<Expr>, _scope: ScopeId, ctx: &mut EvaluationContext) -> EvaluationResult {
    let values = expect_arguments::<2>("pow", values, ctx)?;
    let numbers = numbers("pow", "cannot do math on non-value", &values)?;

    match (numbers[0], numbers[1]) {
        (Number::Integer(base), Number::Integer(exponent)) if exponent >= 0 => u32::try_from(exponent)
            .ok()
            .and_then(|exponent| base.checked_pow(exponent))
            .map(Expr::Integer)
            .ok_or_else(|| overflow("pow")),
        (base, exponent) => finite("pow", base.as_float().powf(exponent.as_float())).map(Expr::Float),
    }
}

pub(crate) fn load_core(ctx: &mut EvaluationContext) {
    ctx.add_builtin("+", builtin_add);
    ctx.add_builtin("-", builtin_sub);
    ctx.add_builtin("*", builtin_mul);
    ctx.add_builtin("/", builtin_div);
    ctx.add_builtin("<", builtin_less);
    ctx.add_builtin(">", builtin_greater);
    ctx.add_builtin("=", builtin_math_equal);
    ctx.add_builtin("eq", builtin_eq);

    ctx.add_builtin("list", builtin_list);
    ctx.add_builtin("cons", builtin_cons);
    ctx.add_builtin("car", builtin_car);
    ctx.add_builtin("cdr", builtin_cdr);
    ctx.add_builtin("nth", builtin_nth);
    ctx.add_builtin("nthcdr", builtin_nthcdr);
    ctx.add_builtin("len", builtin_len);
    ctx.add_builtin("range", builtin_range);
    ctx.add_builtin("apply", builtin_apply);
    ctx.add_builtin("reverse!", builtin_reverse);
    ctx.add_builtin("append", builtin_append);
    ctx.add_builtin("setcar!", builtin_setcar);
    ctx.add_builtin("setcdr!", builtin_setcdr);

    ctx.add_builtin("not", builtin_not);
    ctx.add_builtin("nil?", builtin_is_nil);
    ctx.add_builtin("and", builtin_and);
    ctx.add_builtin("or", builtin_or);
    ctx.add_builtin("typeof", builtin_typeof);

    ctx.add_builtin("eval", builtin_eval);
    ctx.add_builtin("read", builtin_read);
    ctx.add_builtin("macro-expand", builtin_macro_expand);
    ctx.add_builtin("stringify", builtin_stringify);
    ctx.add_builtin("concat", builtin_concat);
    ctx.add_builtin("write", builtin_write);
    ctx.add_builtin("newline", builtin_newline);

    ctx.add_builtin("floor", builtin_floor);
    ctx.add_builtin("ceil", builtin_ceil);
    ctx.add_builtin("sqrt", builtin_sqrt);
    ctx.add_builtin("pow", builtin_pow);
    ctx.add_builtin("sin", builtin_sin);
    ctx.add_builtin("cos", builtin_cos);
    ctx.add_builtin("tan", builtin_tan);
    ctx.add_builtin("log", builtin_log);
    ctx.add_builtin("exp", builtin_exp);
    ctx.add_builtin("log10", builtin_log10);
    ctx.add_builtin("asin", builtin_asin);
    ctx.add_builtin("acos", builtin_acos);
    ctx.add_builtin("atan", builtin_atan);
    ctx.add_builtin("sinh", builtin_sinh);
    ctx.add_builtin("cosh", builtin_cosh);
    ctx.add_builtin("tanh", builtin_tanh);

    ctx.add_constant("integer-max", Expr::Integer(i64::MAX));
    ctx.add_constant("integer-min", Expr::Integer(i64::MIN));
    ctx.add_constant("float-max", Expr::Float(f64::MAX));
    ctx.add_constant("float-min", Expr::Float(f64::MIN_POSITIVE));
}
