#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};
use yal::{Config, EvaluationContext};

// Builtins, constants and references to variables
#[derive(Arbitrary, Debug)]
enum YalAtom {
    Add, Sub, Mul, Div,
    Less, Greater, MathEqual, Eq,
    T, Nil,

    List, Car, Cdr, Cons, Len,
    Nth, Range, Apply, Append,
    Reverse, SetCar, SetCdr,
    Eval, MacroExpand, Typeof,

    Identifier(String),
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for YalAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            YalAtom::Add => "+",
            YalAtom::Sub => "-",
            YalAtom::Mul => "*",
            YalAtom::Div => "/",
            YalAtom::Less => "<",
            YalAtom::Greater => ">",
            YalAtom::MathEqual => "=",
            YalAtom::Eq => "eq",
            YalAtom::T => "t",
            YalAtom::Nil => "nil",
            YalAtom::List => "list",
            YalAtom::Car => "car",
            YalAtom::Cdr => "cdr",
            YalAtom::Cons => "cons",
            YalAtom::Len => "len",
            YalAtom::Nth => "nth",
            YalAtom::Range => "range",
            YalAtom::Apply => "apply",
            YalAtom::Append => "append",
            YalAtom::Reverse => "reverse!",
            YalAtom::SetCar => "setcar!",
            YalAtom::SetCdr => "setcdr!",
            YalAtom::Eval => "eval",
            YalAtom::MacroExpand => "macro-expand",
            YalAtom::Typeof => "typeof",
            YalAtom::Identifier(identifier) => identifier,
            YalAtom::Text(text) => return write!(f, "{:?}", text),
            YalAtom::Integer(value) => return write!(f, "{}", value),
            YalAtom::Float(value) => return write!(f, "{:?}", value),
        })
    }
}

#[derive(Arbitrary, Debug)]
enum YalCommand {
    Quote(Box<YalCommand>),
    Quasiquote(Box<YalCommand>),
    Unquote(Box<YalCommand>),
    Splice(Box<YalCommand>),

    Lambda(Vec<YalCommand>),
    Function(Vec<YalCommand>),
    Macro(Vec<YalCommand>),
    If(Vec<YalCommand>),
    Progn(Vec<YalCommand>),
    Scope(Vec<YalCommand>),
    Try(Vec<YalCommand>),
    Throw(Vec<YalCommand>),
    Return(Vec<YalCommand>),
    Set(Vec<YalCommand>),
    Local(Vec<YalCommand>),
    Global(Vec<YalCommand>),
    Constant(Vec<YalCommand>),
    Equal(Vec<YalCommand>),
    Call(Vec<YalCommand>),

    Atom(YalAtom),
}

fn stringify_arguments(values: &[YalCommand]) -> String {
    values.iter()
        .map(YalCommand::to_string)
        .join(" ")
}

impl fmt::Display for YalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YalCommand::Atom(atom) => return atom.fmt(f),
            YalCommand::Quote(inner) => return write!(f, "'{}", inner),
            YalCommand::Quasiquote(inner) => return write!(f, "`{}", inner),
            YalCommand::Unquote(inner) => return write!(f, ",{}", inner),
            YalCommand::Splice(inner) => return write!(f, ",@{}", inner),
            YalCommand::Call(args) => return write!(f, "({})", stringify_arguments(args)),
            _ => {}
        }

        let (form, args) = match self {
            YalCommand::Lambda(args) => ("lambda", args),
            YalCommand::Function(args) => ("fn!", args),
            YalCommand::Macro(args) => ("macro!", args),
            YalCommand::If(args) => ("if", args),
            YalCommand::Progn(args) => ("progn", args),
            YalCommand::Scope(args) => ("scope", args),
            YalCommand::Try(args) => ("try", args),
            YalCommand::Throw(args) => ("throw", args),
            YalCommand::Return(args) => ("return", args),
            YalCommand::Set(args) => ("set!", args),
            YalCommand::Local(args) => ("local!", args),
            YalCommand::Global(args) => ("global!", args),
            YalCommand::Constant(args) => ("const!", args),
            YalCommand::Equal(args) => ("equal", args),
            _ => unreachable!("Handled separately at the start"),
        };

        write!(f, "({} {})", form, stringify_arguments(args))
    }
}

fuzz_target!(|commands: Vec<YalCommand>| {
    let config = Config { cell_capacity: 1 << 16, max_depth: 128 };
    let mut context = EvaluationContext::with_config(config);

    for command in commands {
        let command = command.to_string();
        let result = context.evaluate_str(&command);
        let _ = context.print(&result);
    }
});
