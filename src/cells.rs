use std::{collections::HashSet, sync::Arc};

use crate::{
    environment::ScopeId,
    error::YalError,
    expression::{CellId, EvaluationResult, Expr},
};

/// Shared payload of lambdas and macros.
#[derive(Debug, Clone)]
pub(crate) struct Callable {
    pub(crate) name: Arc<str>,
    pub(crate) params: Expr,
    pub(crate) body: Expr,
    /// Scope captured at creation. Macros capture nothing.
    pub(crate) scope: Option<ScopeId>,
}

#[derive(Debug, Clone)]
enum Cell {
    Pair { car: Expr, cdr: Expr },
    Callable(Callable),
}

/// Fixed-capacity pool of expression cells.
///
/// Cells are handed out on every `cons` and never freed one by one; all of
/// them are released together when the store is dropped. Error values are
/// still allocated once the capacity is reached, so that an exhausted store
/// can report its own exhaustion.
#[derive(Debug)]
pub struct CellStore {
    cells: Vec<Cell>,
    capacity: usize,
}

impl CellStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { cells: Vec::new(), capacity }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn allocate(&mut self, cell: Cell) -> Result<CellId, YalError> {
        if self.cells.len() >= self.capacity {
            return Err(YalError::Exhausted(self.cells.len()));
        }
        Ok(self.allocate_unbounded(cell))
    }

    fn allocate_unbounded(&mut self, cell: Cell) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(cell);
        id
    }

    pub fn cons(&mut self, car: Expr, cdr: Expr) -> EvaluationResult {
        Ok(Expr::Pair(self.allocate(Cell::Pair { car, cdr })?))
    }

    pub(crate) fn cons_unbounded(&mut self, car: Expr, cdr: Expr) -> Expr {
        Expr::Pair(self.allocate_unbounded(Cell::Pair { car, cdr }))
    }

    pub fn list(&mut self, items: Vec<Expr>) -> EvaluationResult {
        self.list_with_tail(items, Expr::Nil)
    }

    pub fn list_with_tail(&mut self, mut items: Vec<Expr>, tail: Expr) -> EvaluationResult {
        let mut list = tail;
        while let Some(item) = items.pop() {
            list = self.cons(item, list)?;
        }
        Ok(list)
    }

    pub(crate) fn list_unbounded(&mut self, mut items: Vec<Expr>) -> Expr {
        let mut list = Expr::Nil;
        while let Some(item) = items.pop() {
            list = self.cons_unbounded(item, list);
        }
        list
    }

    pub(crate) fn callable(&mut self, callable: Callable) -> Result<CellId, YalError> {
        self.allocate(Cell::Callable(callable))
    }

    /// Both halves of a pair. Panics if `id` does not name a pair of this store.
    pub fn pair(&self, id: CellId) -> (&Expr, &Expr) {
        match &self.cells[id.index()] {
            Cell::Pair { car, cdr } => (car, cdr),
            Cell::Callable(_) => panic!("cell {:?} is a callable, not a pair", id),
        }
    }

    pub(crate) fn callable_of(&self, id: CellId) -> &Callable {
        match &self.cells[id.index()] {
            Cell::Callable(callable) => callable,
            Cell::Pair { .. } => panic!("cell {:?} is a pair, not a callable", id),
        }
    }

    pub fn car(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Pair(id) => self.pair(*id).0.clone(),
            _ => Expr::Nil,
        }
    }

    pub fn cdr(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Pair(id) => self.pair(*id).1.clone(),
            _ => Expr::Nil,
        }
    }

    pub(crate) fn set_car(&mut self, id: CellId, value: Expr) {
        match &mut self.cells[id.index()] {
            Cell::Pair { car, .. } => *car = value,
            Cell::Callable(_) => panic!("cell {:?} is a callable, not a pair", id),
        }
    }

    pub(crate) fn set_cdr(&mut self, id: CellId, value: Expr) {
        match &mut self.cells[id.index()] {
            Cell::Pair { cdr, .. } => *cdr = value,
            Cell::Callable(_) => panic!("cell {:?} is a callable, not a pair", id),
        }
    }

    /// Elements of a proper list. `None` for dotted or cyclic lists and for
    /// atoms other than `Nil`.
    pub fn elements<'a>(&'a self, list: &'a Expr) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        let mut current = list;
        loop {
            match current {
                Expr::Nil => return Some(items),
                Expr::Pair(id) => {
                    if items.len() > self.cells.len() {
                        return None;
                    }
                    let (car, cdr) = self.pair(*id);
                    items.push(car.clone());
                    current = cdr;
                }
                _ => return None,
            }
        }
    }

    /// Deep structural comparison. Numbers compare within their own type,
    /// lambdas and macros by identity. Terminates on cyclic structure.
    pub fn equal(&self, a: &Expr, b: &Expr) -> bool {
        let mut pending = vec![(a.clone(), b.clone())];
        let mut visited = HashSet::new();

        while let Some((a, b)) = pending.pop() {
            match (&a, &b) {
                (Expr::Pair(x), Expr::Pair(y)) => {
                    if !visited.insert((*x, *y)) {
                        continue;
                    }
                    let (x_car, x_cdr) = self.pair(*x);
                    let (y_car, y_cdr) = self.pair(*y);
                    pending.push((x_cdr.clone(), y_cdr.clone()));
                    pending.push((x_car.clone(), y_car.clone()));
                }
                _ if !atoms_equal(&a, &b) => return false,
                _ => {}
            }
        }

        true
    }
}

fn atoms_equal(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (Expr::Nil, Expr::Nil) => true,
        (Expr::Integer(a), Expr::Integer(b)) => a == b,
        (Expr::Float(a), Expr::Float(b)) => a == b,
        (Expr::Symbol(a), Expr::Symbol(b)) => a == b,
        (Expr::String(a), Expr::String(b)) => a == b,
        (Expr::Builtin(a), Expr::Builtin(b)) => a.name == b.name,
        (Expr::Lambda(a), Expr::Lambda(b)) => a == b,
        (Expr::Macro(a), Expr::Macro(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(store: &mut CellStore, values: &[i64]) -> Expr {
        store.list(values.iter().map(|v| Expr::Integer(*v)).collect()).unwrap()
    }

    #[test]
    fn list_and_elements() {
        let mut store = CellStore::with_capacity(16);
        let list = numbers(&mut store, &[1, 2, 3]);
        assert_eq!(store.len(), 3);

        let items = store.elements(&list).unwrap();
        assert!(matches!(items.as_slice(), [Expr::Integer(1), Expr::Integer(2), Expr::Integer(3)]));
        assert!(matches!(store.car(&list), Expr::Integer(1)));
        assert!(store.car(&Expr::Nil).is_nil());
    }

    #[test]
    fn dotted_list_has_no_elements() {
        let mut store = CellStore::with_capacity(16);
        let dotted = store.cons(Expr::Integer(1), Expr::Integer(2)).unwrap();
        assert!(store.elements(&dotted).is_none());
        assert!(store.elements(&Expr::Integer(3)).is_none());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut store = CellStore::with_capacity(2);
        numbers(&mut store, &[1, 2]);
        let error = store.cons(Expr::Nil, Expr::Nil).unwrap_err();
        assert!(matches!(error, YalError::Exhausted(2)));

        // error values may still be built
        store.cons_unbounded(Expr::Nil, Expr::Nil);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn structural_equality() {
        let mut store = CellStore::with_capacity(64);
        let a = numbers(&mut store, &[1, 2, 3]);
        let b = numbers(&mut store, &[1, 2, 3]);
        let c = numbers(&mut store, &[1, 2]);
        assert!(store.equal(&a, &b));
        assert!(!store.equal(&a, &c));
        assert!(!store.equal(&Expr::Integer(2), &Expr::Float(2.0)));
    }

    #[test]
    fn cyclic_structures_terminate() {
        let mut store = CellStore::with_capacity(64);
        let a = numbers(&mut store, &[1, 2]);
        let b = numbers(&mut store, &[1, 2]);
        for list in [&a, &b] {
            if let Expr::Pair(id) = list {
                let last = store.cdr(list);
                if let Expr::Pair(last) = last {
                    store.set_cdr(last, Expr::Pair(*id));
                }
            }
        }
        assert!(store.equal(&a, &b));
        assert!(store.elements(&a).is_none());
    }
}
