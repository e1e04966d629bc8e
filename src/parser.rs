use core::fmt;

use logos::Logos;

use crate::{
    cells::CellStore,
    error::YalError,
    expression::{EvaluationResult, Expr},
};

#[derive(Debug, PartialEq, Logos)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token("'")]
    Quote,

    #[token("`")]
    Quasiquote,

    #[token(",")]
    Unquote,

    #[token(",@")]
    UnquoteSplicing,

    #[token(".", priority = 10)]
    Dot,

    // An unterminated string runs to the end of the input, dangling escape included
    #[regex(r#""([^"\\]|\\(.|\n))*("|\\)?"#, |lex| lex.slice())]
    String(&'a str),

    #[regex(r#"[^ \t\r\n\f()\[\]'`,"]+"#, |lex| lex.slice())]
    Atom(&'a str),
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftParen => write!(f, "'('"),
            Self::RightParen => write!(f, "')'"),
            Self::LeftBracket => write!(f, "'['"),
            Self::RightBracket => write!(f, "']'"),
            Self::Quote => write!(f, "'''"),
            Self::Quasiquote => write!(f, "'`'"),
            Self::Unquote => write!(f, "','"),
            Self::UnquoteSplicing => write!(f, "',@'"),
            Self::Dot => write!(f, "'.'"),
            Self::String(literal) | Self::Atom(literal) => write!(f, "'{}'", literal),
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Literal<'a> {
    Nil,
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(&'a str),
}

// Syntax tree of the reader, before it is moved into the cell store
#[derive(Debug, PartialEq)]
pub(crate) enum Sexp<'a> {
    Atom(Literal<'a>),
    List(Vec<Self>),
    Dotted(Vec<Self>, Box<Self>),
}

type ParseResult<O> = Result<O, YalError>;

/// Deepest nesting of lists and quote prefixes the reader accepts.
pub(crate) const MAX_NESTING: usize = 256;

fn lexer(input: &str) -> ParseResult<Vec<Token<'_>>> {
    let mut tokens = vec![];
    let mut tokenizer = Token::lexer(input);

    while let Some(result) = tokenizer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(_) => return Err(YalError::syntax(format!("unrecognized input '{}'", tokenizer.slice()))),
        }
    }

    Ok(tokens)
}

// Rejects input nested deeper than MAX_NESTING before the recursive parser sees it.
// A quote prefix opens a level that closes with the expression it quotes.
fn check_nesting(tokens: &[Token<'_>]) -> ParseResult<()> {
    let mut levels: Vec<bool> = vec![];
    let close_quotes = |levels: &mut Vec<bool>| {
        while levels.last() == Some(&true) {
            levels.pop();
        }
    };

    for token in tokens {
        match token {
            Token::LeftParen | Token::LeftBracket => levels.push(false),
            Token::Quote | Token::Quasiquote | Token::Unquote | Token::UnquoteSplicing => levels.push(true),
            Token::RightParen | Token::RightBracket => {
                levels.pop();
                close_quotes(&mut levels);
            }
            Token::String(_) | Token::Atom(_) => close_quotes(&mut levels),
            Token::Dot => {}
        }

        if levels.len() > MAX_NESTING {
            return Err(YalError::syntax("nesting too deep"));
        }
    }
    Ok(())
}

fn unexpected(tokens: &[Token<'_>]) -> YalError {
    match tokens.first() {
        Some(token) => YalError::syntax(format!("unexpected {}", token)),
        None => YalError::syntax("unexpected end of input"),
    }
}

fn parse_token<'a, 'b: 'a>(
    token_recognizer: impl Fn(&'a Token<'b>) -> bool,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], &'a Token<'b>)> {
    move |tokens| match tokens.first() {
        Some(token) if token_recognizer(token) => Ok((&tokens[1..], token)),
        _ => Err(unexpected(tokens)),
    }
}

// A missing closing token at the end of the input closes the list
fn parse_closing<'a, 'b: 'a>(
    token_recognizer: impl Fn(&'a Token<'b>) -> bool,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], ())> {
    move |tokens| match tokens.first() {
        None => Ok((tokens, ())),
        Some(token) if token_recognizer(token) => Ok((&tokens[1..], ())),
        Some(_) => Err(unexpected(tokens)),
    }
}

fn parse_surrounds<'a, 'b: 'a, O>(
    start_recognizer: impl Fn(&'a Token<'b>) -> bool,
    internal_parser: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>,
    end_recognizer: impl Fn(&'a Token<'b>) -> bool,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)> {
    let start_parser = parse_token(start_recognizer);
    let end_parser = parse_closing(end_recognizer);

    move |tokens| {
        let (tokens, _) = start_parser(tokens)?;
        let (tokens, internal) = internal_parser(tokens)?;
        let (tokens, _) = end_parser(tokens)?;

        Ok((tokens, internal))
    }
}

fn parse_list<'a, 'b: 'a, O>(
    parser: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Vec<O>)> {
    move |mut tokens| {
        let mut result = vec![];

        while let Ok((new_tokens, value)) = parser(tokens) {
            result.push(value);
            tokens = new_tokens
        }

        Ok((tokens, result))
    }
}

fn parse_either<'a, 'b: 'a, O>(
    a: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>,
    b: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)> {
    move |tokens| {
        if let Ok(a) = a(tokens) {
            return Ok(a);
        }
        b(tokens)
    }
}

fn parser_map<'a, 'b: 'a, I, O>(
    parser: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], I)>,
    f: impl Fn(I) -> O,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)> {
    move |tokens| {
        let (tokens, value) = parser(tokens)?;
        Ok((tokens, f(value)))
    }
}

fn unescape(literal: &str) -> String {
    let mut text = String::with_capacity(literal.len());
    let mut chars = literal.chars().skip(1);

    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => match chars.next() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some(other) => text.push(other),
                None => break,
            },
            c => text.push(c),
        }
    }

    text
}

fn classify(atom: &str) -> ParseResult<Literal<'_>> {
    if atom == "nil" || atom == "NIL" {
        return Ok(Literal::Nil);
    }

    let unsigned = atom.strip_prefix(&['+', '-'][..]).unwrap_or(atom);
    if unsigned.starts_with(|c: char| c.is_ascii_digit()) {
        if !atom.contains('.') {
            if let Ok(value) = atom.parse() {
                return Ok(Literal::Integer(value));
            }
        }
        if let Ok(value) = atom.parse::<f64>() {
            if !value.is_finite() {
                return Err(YalError::syntax(format!("number out of range '{}'", atom)));
            }
            return Ok(Literal::Float(value));
        }
    }

    Ok(Literal::Symbol(atom))
}

fn parse_atom<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp<'b>)> {
    let (tokens, token) = parse_token(|token| matches!(token, Token::Atom(_) | Token::String(_)))(tokens)?;
    let literal = match token {
        Token::String(literal) => Literal::String(unescape(literal)),
        Token::Atom(atom) => classify(*atom)?,
        _ => unreachable!(),
    };
    Ok((tokens, Sexp::Atom(literal)))
}

fn parse_elements<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp<'b>)> {
    let (tokens, elements) = parse_list(parse_sexp)(tokens)?;

    match tokens {
        [Token::Dot, rest @ ..] if !elements.is_empty() => {
            let (rest, tail) = parse_sexp(rest)?;
            Ok((rest, Sexp::Dotted(elements, Box::new(tail))))
        }
        _ => Ok((tokens, Sexp::List(elements))),
    }
}

fn parse_expression<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp<'b>)> {
    parse_surrounds(
        |token| matches!(token, Token::LeftParen),
        parse_elements,
        |token| matches!(token, Token::RightParen),
    )(tokens)
}

// [a b c] is shorthand for (list a b c)
fn parse_vector<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp<'b>)> {
    parse_surrounds(
        |token| matches!(token, Token::LeftBracket),
        parser_map(parse_list(parse_sexp), |mut elements| {
            if !elements.is_empty() {
                elements.insert(0, Sexp::Atom(Literal::Symbol("list")));
            }
            Sexp::List(elements)
        }),
        |token| matches!(token, Token::RightBracket),
    )(tokens)
}

fn parse_quoted<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp<'b>)> {
    let (tokens, token) = parse_token(|token| {
        matches!(token, Token::Quote | Token::Quasiquote | Token::Unquote | Token::UnquoteSplicing)
    })(tokens)?;
    let name = match token {
        Token::Quote => "quote",
        Token::Quasiquote => "quasiquote",
        Token::Unquote => "unquote",
        Token::UnquoteSplicing => "unquote-splicing",
        _ => unreachable!(),
    };

    let (tokens, quoted) = parse_sexp(tokens)?;
    Ok((tokens, Sexp::List(vec![Sexp::Atom(Literal::Symbol(name)), quoted])))
}

fn parse_sexp<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp<'b>)> {
    parse_either(
        parse_atom,
        parse_either(parse_expression, parse_either(parse_vector, parse_quoted)),
    )(tokens)
}

pub(crate) fn parse(input: &str) -> ParseResult<Vec<Sexp<'_>>> {
    let tokens = lexer(input)?;
    check_nesting(&tokens)?;

    let mut remaining = tokens.as_slice();
    let mut sexps = vec![];
    while !remaining.is_empty() {
        let (tokens, sexp) = parse_sexp(remaining)?;
        sexps.push(sexp);
        remaining = tokens;
    }

    Ok(sexps)
}

fn into_expr(sexp: Sexp<'_>, cells: &mut CellStore) -> EvaluationResult {
    match sexp {
        Sexp::Atom(literal) => Ok(match literal {
            Literal::Nil => Expr::Nil,
            Literal::Integer(value) => Expr::Integer(value),
            Literal::Float(value) => Expr::Float(value),
            Literal::String(text) => Expr::string(&text),
            Literal::Symbol(name) => Expr::symbol(name),
        }),
        Sexp::List(elements) => {
            let items = elements.into_iter()
                .map(|sexp| into_expr(sexp, cells))
                .collect::<Result<Vec<_>, _>>()?;
            cells.list(items)
        }
        Sexp::Dotted(elements, tail) => {
            let items = elements.into_iter()
                .map(|sexp| into_expr(sexp, cells))
                .collect::<Result<Vec<_>, _>>()?;
            let tail = into_expr(*tail, cells)?;
            cells.list_with_tail(items, tail)
        }
    }
}

/// Reads every top-level expression of `input` into `cells`.
pub fn read_all(input: &str, cells: &mut CellStore) -> Result<Vec<Expr>, YalError> {
    parse(input)?.into_iter()
        .map(|sexp| into_expr(sexp, cells))
        .collect()
}

/// Reads the first expression of `input`, or `Nil` if there is none.
pub fn read(input: &str, cells: &mut CellStore) -> EvaluationResult {
    Ok(read_all(input, cells)?.into_iter().next().unwrap_or(Expr::Nil))
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    fn symbol(name: &str) -> Sexp<'_> {
        Sexp::Atom(Literal::Symbol(name))
    }

    fn integer(value: i64) -> Sexp<'static> {
        Sexp::Atom(Literal::Integer(value))
    }

    fn parse_one(input: &str) -> anyhow::Result<Sexp<'_>> {
        let mut sexps = parse(input)?;
        if sexps.len() != 1 {
            bail!("expected a single expression in {:?}, got {:?}", input, sexps);
        }
        Ok(sexps.remove(0))
    }

    #[test]
    fn atoms() -> anyhow::Result<()> {
        assert_eq!(parse_one("42")?, integer(42));
        assert_eq!(parse_one("-7")?, integer(-7));
        assert_eq!(parse_one("+3")?, integer(3));
        assert_eq!(parse_one("2.5")?, Sexp::Atom(Literal::Float(2.5)));
        assert_eq!(parse_one("1e3")?, Sexp::Atom(Literal::Float(1000.0)));
        assert_eq!(parse_one("-")?, symbol("-"));
        assert_eq!(parse_one("1+")?, symbol("1+"));
        assert_eq!(parse_one("set!")?, symbol("set!"));
        assert_eq!(parse_one("nil")?, Sexp::Atom(Literal::Nil));
        assert_eq!(parse_one("NIL")?, Sexp::Atom(Literal::Nil));
        Ok(())
    }

    #[test]
    fn strings() -> anyhow::Result<()> {
        assert_eq!(parse_one(r#""hello world""#)?, Sexp::Atom(Literal::String("hello world".into())));
        assert_eq!(parse_one(r#""a\"b\\c\n""#)?, Sexp::Atom(Literal::String("a\"b\\c\n".into())));
        assert_eq!(parse_one(r#""(not a list)""#)?, Sexp::Atom(Literal::String("(not a list)".into())));
        assert_eq!(parse_one(r#""unterminated"#)?, Sexp::Atom(Literal::String("unterminated".into())));
        Ok(())
    }

    #[test]
    fn lists() -> anyhow::Result<()> {
        assert_eq!(
            parse_one("(1 2 (3 4))")?,
            Sexp::List(vec![integer(1), integer(2), Sexp::List(vec![integer(3), integer(4)])])
        );
        assert_eq!(parse_one("()")?, Sexp::List(vec![]));
        assert_eq!(parse_one("[]")?, Sexp::List(vec![]));
        assert_eq!(parse_one("[1 2]")?, Sexp::List(vec![symbol("list"), integer(1), integer(2)]));
        assert_eq!(
            parse_one("(1 . 2)")?,
            Sexp::Dotted(vec![integer(1)], Box::new(integer(2)))
        );
        Ok(())
    }

    #[test]
    fn missing_closing_paren_is_tolerated() -> anyhow::Result<()> {
        assert_eq!(parse_one("(+ 1 (* 2 3")?, Sexp::List(vec![
            symbol("+"),
            integer(1),
            Sexp::List(vec![symbol("*"), integer(2), integer(3)]),
        ]));
        Ok(())
    }

    #[test]
    fn quote_sugar() -> anyhow::Result<()> {
        assert_eq!(parse_one("'a")?, Sexp::List(vec![symbol("quote"), symbol("a")]));
        assert_eq!(
            parse_one("`(a ,b ,@c)")?,
            Sexp::List(vec![
                symbol("quasiquote"),
                Sexp::List(vec![
                    symbol("a"),
                    Sexp::List(vec![symbol("unquote"), symbol("b")]),
                    Sexp::List(vec![symbol("unquote-splicing"), symbol("c")]),
                ]),
            ])
        );
        Ok(())
    }

    #[test]
    fn dangling_escape_stays_inside_the_string() -> anyhow::Result<()> {
        let sexps = parse("\"abc\\")?;
        assert_eq!(sexps, vec![Sexp::Atom(Literal::String("abc".into()))]);
        Ok(())
    }

    #[test]
    fn nesting_is_bounded() -> anyhow::Result<()> {
        let nested = |depth: usize| "(".repeat(depth) + &")".repeat(depth);
        parse(&nested(MAX_NESTING))?;
        parse(&format!("({})", "'".repeat(MAX_NESTING - 1) + "a"))?;

        for input in [nested(MAX_NESTING + 1), nested(100_000), "(".repeat(100_000), "'".repeat(100_000) + "a"] {
            match parse(&input) {
                Err(YalError::Syntax(message)) if message == "nesting too deep" => {}
                other => bail!("deep input of {} bytes gave {:?}", input.len(), other.map(|sexps| sexps.len())),
            }
        }
        Ok(())
    }

    #[test]
    fn sibling_lists_do_not_add_up() -> anyhow::Result<()> {
        let wide = format!("({})", "(a) '(b) ".repeat(10_000));
        assert_eq!(parse(&wide)?.len(), 1);
        Ok(())
    }

    #[test]
    fn syntax_errors() {
        for input in [")", "(1 2]", "[1 2)", "(. 1)", "'", "(1 . )", "1e999", "(+ 1 -1e400)"] {
            assert!(matches!(parse(input), Err(YalError::Syntax(_))), "{:?} should not parse", input);
        }
    }

    #[test]
    fn read_into_store() -> anyhow::Result<()> {
        let mut cells = CellStore::with_capacity(64);
        let exprs = read_all("(a b) 3 ()", &mut cells)?;
        assert_eq!(exprs.len(), 3);
        assert!(matches!(exprs[0], Expr::Pair(_)));
        assert!(exprs[2].is_nil());
        assert!(read("", &mut cells)?.is_nil());
        Ok(())
    }
}
