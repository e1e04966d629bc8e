use core::fmt;
use std::collections::HashSet;

use crate::{
    cells::CellStore,
    expression::{CellId, Expr},
    parser::MAX_NESTING,
};

/// Display adapter for an expression living in a cell store.
///
/// The printed form reads back into a structurally equal expression, as long
/// as the expression holds no callables and no cycles. A pair that is
/// revisited on the current printing path prints as `#<cycle>`, and lists
/// nested deeper than the reader accepts print as `...`.
pub struct Printed<'a> {
    expr: &'a Expr,
    cells: &'a CellStore,
    quote_strings: bool,
}

impl<'a> Printed<'a> {
    pub fn new(expr: &'a Expr, cells: &'a CellStore) -> Self {
        Self { expr, cells, quote_strings: true }
    }

    /// Strings print as their bare text, without quotes or escapes.
    pub fn raw(mut self) -> Self {
        self.quote_strings = false;
        self
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, expr: &Expr, path: &mut HashSet<CellId>, depth: usize) -> fmt::Result {
        match expr {
            Expr::Nil => write!(f, "NIL"),
            Expr::Integer(value) => write!(f, "{}", value),
            Expr::Float(value) => write!(f, "{:?}", value),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::String(text) if self.quote_strings => write_escaped(f, text),
            Expr::String(text) => write!(f, "{}", text),
            Expr::Builtin(_) => write!(f, "#<buildin>"),
            Expr::Lambda(_) => write!(f, "#<lambda>"),
            Expr::Macro(_) => write!(f, "#<macro>"),
            Expr::Pair(_) if depth >= MAX_NESTING => write!(f, "..."),
            Expr::Pair(id) => self.write_list(f, *id, path, depth + 1),
        }
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, first: CellId, path: &mut HashSet<CellId>, depth: usize) -> fmt::Result {
        if path.contains(&first) {
            return write!(f, "#<cycle>");
        }

        let mut entered = Vec::new();
        let mut current = first;
        write!(f, "(")?;
        loop {
            path.insert(current);
            entered.push(current);

            let (car, cdr) = self.cells.pair(current);
            self.write(f, car, path, depth)?;
            match cdr {
                Expr::Nil => break,
                Expr::Pair(next) if path.contains(next) => {
                    write!(f, " . #<cycle>")?;
                    break;
                }
                Expr::Pair(next) => {
                    write!(f, " ")?;
                    current = *next;
                }
                tail => {
                    write!(f, " . ")?;
                    self.write(f, tail, path, depth)?;
                    break;
                }
            }
        }

        for id in entered {
            path.remove(&id);
        }
        write!(f, ")")
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in text.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

impl<'a> fmt::Display for Printed<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.expr, &mut HashSet::new(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms() {
        let cells = CellStore::with_capacity(0);
        let print = |expr: Expr| Printed::new(&expr, &cells).to_string();

        assert_eq!(print(Expr::Nil), "NIL");
        assert_eq!(print(Expr::Integer(-4)), "-4");
        assert_eq!(print(Expr::Float(2.0)), "2.0");
        assert_eq!(print(Expr::Float(0.25)), "0.25");
        assert_eq!(print(Expr::symbol("foo")), "foo");
        assert_eq!(print(Expr::string("a \"b\"\n")), r#""a \"b\"\n""#);
    }

    #[test]
    fn raw_strings() {
        let cells = CellStore::with_capacity(0);
        let text = Expr::string("a \"b\"");
        assert_eq!(Printed::new(&text, &cells).raw().to_string(), "a \"b\"");
    }

    #[test]
    fn lists_and_dotted_pairs() {
        let mut cells = CellStore::with_capacity(16);
        let inner = cells.list(vec![Expr::Integer(3), Expr::Integer(4)]).unwrap();
        let list = cells.list(vec![Expr::Integer(1), Expr::Integer(2), inner]).unwrap();
        assert_eq!(Printed::new(&list, &cells).to_string(), "(1 2 (3 4))");

        let dotted = cells.list_with_tail(vec![Expr::Integer(1), Expr::Integer(2)], Expr::Integer(3)).unwrap();
        assert_eq!(Printed::new(&dotted, &cells).to_string(), "(1 2 . 3)");
    }

    #[test]
    fn cycles_are_cut() {
        let mut cells = CellStore::with_capacity(16);
        let list = cells.list(vec![Expr::Integer(1), Expr::Integer(2)]).unwrap();
        let Expr::Pair(first) = list else { panic!("expected a pair") };
        let Expr::Pair(second) = cells.cdr(&list) else { panic!("expected a pair") };
        cells.set_cdr(second, Expr::Pair(first));
        assert_eq!(Printed::new(&list, &cells).to_string(), "(1 2 . #<cycle>)");

        cells.set_car(first, Expr::Pair(first));
        assert_eq!(Printed::new(&list, &cells).to_string(), "(#<cycle> 2 . #<cycle>)");
    }

    #[test]
    fn deep_nesting_is_elided() {
        let mut cells = CellStore::with_capacity(200_000);
        let mut nested = Expr::Nil;
        for _ in 0..100_000 {
            nested = cells.cons(nested, Expr::Nil).unwrap();
        }

        let printed = Printed::new(&nested, &cells).to_string();
        assert!(printed.starts_with(&"(".repeat(MAX_NESTING)));
        assert!(printed.contains("(...)"));
        assert_eq!(printed.len(), 2 * MAX_NESTING + 3);
    }

    #[test]
    fn printed_form_reads_back_equal() -> anyhow::Result<()> {
        let mut cells = CellStore::with_capacity(1024);
        let mut corpus = crate::parser::read_all(
            r#"42 -7 0.5 -2.25 1e300 "a \"quoted\" \\ string\n\t" sym set! NIL
               (1 2 (3 4)) (a . b) (1 2 . 3) ((a . b) (c (d . e))) (quote (x "y" 1.5))
               (quasiquote (a (unquote b) (unquote-splicing c))) (((((deep)))))"#,
            &mut cells,
        )?;
        corpus.extend([f64::MAX, f64::MIN_POSITIVE, -0.0, 0.1, 1e-7, 123456789.125].map(Expr::Float));

        for expr in &corpus {
            let printed = Printed::new(expr, &cells).to_string();
            let read = crate::parser::read(&printed, &mut cells)?;
            if !cells.equal(expr, &read) {
                anyhow::bail!("{} read back as {}", printed, Printed::new(&read, &cells));
            }
        }
        Ok(())
    }

    #[test]
    fn shared_structure_is_not_a_cycle() {
        let mut cells = CellStore::with_capacity(16);
        let shared = cells.list(vec![Expr::Integer(1)]).unwrap();
        let list = cells.list(vec![shared.clone(), shared]).unwrap();
        assert_eq!(Printed::new(&list, &cells).to_string(), "((1) (1))");
    }
}
