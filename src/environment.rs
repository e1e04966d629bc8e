use std::{collections::HashMap, sync::Arc};

use log::debug;

use crate::expression::Expr;

/// Handle to a scope frame of an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

#[derive(Debug)]
struct Frame {
    bindings: HashMap<Arc<str>, Expr>,
    outer: Option<ScopeId>,
    // Set once a closure captured this frame. Pinned frames are never reclaimed.
    pinned: bool,
    live: bool,
}

impl Frame {
    fn new(outer: Option<ScopeId>) -> Self {
        Self { bindings: HashMap::new(), outer, pinned: false, live: true }
    }
}

/// Constants table plus the chain of mutable scope frames.
///
/// Frames are pushed on entry to a lambda body, a `scope` form or a `try`
/// handler, and popped when it is left. A popped frame is reclaimed once it is
/// at the top of the frame stack, unless a closure captured it.
#[derive(Debug)]
pub struct Environment {
    constants: HashMap<Arc<str>, Expr>,
    frames: Vec<Frame>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self { constants: HashMap::new(), frames: vec![Frame::new(None)] }
    }

    /// The outermost frame, which lives as long as the environment.
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn frames_in_use(&self) -> usize {
        self.frames.len()
    }

    fn frame(&self, scope: ScopeId) -> &Frame {
        &self.frames[scope.0]
    }

    fn frame_mut(&mut self, scope: ScopeId) -> &mut Frame {
        &mut self.frames[scope.0]
    }

    pub(crate) fn push(&mut self, outer: ScopeId) -> ScopeId {
        let scope = ScopeId(self.frames.len());
        self.frames.push(Frame::new(Some(outer)));
        debug!("pushed frame {} (outer {})", scope.0, outer.0);
        scope
    }

    pub(crate) fn pop(&mut self, scope: ScopeId) {
        if scope == self.global() {
            return;
        }
        self.frame_mut(scope).live = false;

        while let Some(frame) = self.frames.last() {
            if frame.live || frame.pinned {
                break;
            }
            self.frames.pop();
        }
        debug!("popped frame {} ({} frames in use)", scope.0, self.frames.len());
    }

    /// Keeps `scope` alive for the lifetime of the environment.
    ///
    /// Outer frames always sit below their inner frames on the stack, so
    /// pinning a frame also keeps every frame it can reach.
    pub(crate) fn pin(&mut self, scope: ScopeId) {
        self.frame_mut(scope).pinned = true;
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    /// Resolves `name` against the constants first, then the scope chain from
    /// `scope` outwards.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<Expr> {
        if let Some(value) = self.constants.get(name) {
            return Some(value.clone());
        }

        let mut current = Some(scope);
        while let Some(scope) = current {
            let frame = self.frame(scope);
            if let Some(value) = frame.bindings.get(name) {
                return Some(value.clone());
            }
            current = frame.outer;
        }
        None
    }

    pub(crate) fn define_constant(&mut self, name: Arc<str>, value: Expr) {
        self.constants.insert(name, value);
    }

    pub(crate) fn define_local(&mut self, scope: ScopeId, name: Arc<str>, value: Expr) {
        self.frame_mut(scope).bindings.insert(name, value);
    }

    pub(crate) fn define_global(&mut self, name: Arc<str>, value: Expr) {
        let global = self.global();
        self.define_local(global, name, value);
    }

    /// Overwrites the innermost existing binding of `name`. Returns `false` if
    /// `name` is not bound anywhere in the chain.
    pub(crate) fn set(&mut self, scope: ScopeId, name: &str, value: Expr) -> bool {
        let mut current = Some(scope);
        while let Some(scope) = current {
            let frame = self.frame_mut(scope);
            if let Some(binding) = frame.bindings.get_mut(name) {
                *binding = value;
                return true;
            }
            current = frame.outer;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    #[test]
    fn lookup_walks_outwards() -> anyhow::Result<()> {
        let mut environment = Environment::new();
        let global = environment.global();
        environment.define_global("x".into(), Expr::Integer(1));

        let inner = environment.push(global);
        environment.define_local(inner, "y".into(), Expr::Integer(2));

        match (environment.lookup(inner, "x"), environment.lookup(inner, "y")) {
            (Some(Expr::Integer(1)), Some(Expr::Integer(2))) => {}
            other => bail!("unexpected bindings {:?}", other),
        }
        assert!(environment.lookup(global, "y").is_none());
        Ok(())
    }

    #[test]
    fn constants_shadow_frames() {
        let mut environment = Environment::new();
        let global = environment.global();
        environment.define_global("pi".into(), Expr::Integer(3));
        environment.define_constant("pi".into(), Expr::Float(3.14));

        assert!(matches!(environment.lookup(global, "pi"), Some(Expr::Float(_))));
        assert!(environment.is_constant("pi"));
    }

    #[test]
    fn set_requires_existing_binding() {
        let mut environment = Environment::new();
        let global = environment.global();
        let inner = environment.push(global);

        assert!(!environment.set(inner, "z", Expr::Nil));
        environment.define_global("z".into(), Expr::Nil);
        assert!(environment.set(inner, "z", Expr::Integer(7)));
        assert!(matches!(environment.lookup(global, "z"), Some(Expr::Integer(7))));
    }

    #[test]
    fn popped_frames_are_reclaimed_unless_pinned() {
        let mut environment = Environment::new();
        let global = environment.global();

        let a = environment.push(global);
        let b = environment.push(a);
        environment.pin(b);
        environment.pop(b);
        environment.pop(a);
        assert_eq!(environment.frames_in_use(), 3);

        let c = environment.push(global);
        environment.pop(c);
        assert_eq!(environment.frames_in_use(), 3);
    }

    #[test]
    fn out_of_order_pop_is_reclaimed_later() {
        let mut environment = Environment::new();
        let global = environment.global();

        let a = environment.push(global);
        let b = environment.push(global);
        environment.pop(a);
        assert_eq!(environment.frames_in_use(), 3);
        environment.pop(b);
        assert_eq!(environment.frames_in_use(), 1);
    }
}
