//! Ancestor scoping.
//!
//! An [`AncestorContext`] is the ordered list of path segments under which
//! keys are derived and queries are scoped. Each call chain owns its own
//! context and passes it to repository operations; two chains never share
//! one.

use std::ops::{Deref, DerefMut};

use kindred_types::PathSegment;
use tracing::trace;

/// Ordered ancestor segments, outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AncestorContext {
    segments: Vec<PathSegment>,
}

impl AncestorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one segment for the lifetime of the returned scope.
    pub fn with(&mut self, segment: PathSegment) -> AncestorScope<'_> {
        self.with_all([segment])
    }

    /// Push segments, in order, for the lifetime of the returned scope.
    ///
    /// Dropping the scope pops exactly the segments this call pushed, also
    /// when unwinding.
    pub fn with_all<I>(&mut self, segments: I) -> AncestorScope<'_>
    where
        I: IntoIterator<Item = PathSegment>,
    {
        let before = self.segments.len();
        self.segments.extend(segments);
        let pushed = self.segments.len() - before;
        trace!(pushed, depth = self.segments.len(), "entered ancestor scope");
        AncestorScope {
            context: self,
            pushed,
        }
    }

    /// Run `f` with `segments` pushed, popping them afterwards.
    pub fn scoped<I, R, F>(&mut self, segments: I, f: F) -> R
    where
        I: IntoIterator<Item = PathSegment>,
        F: FnOnce(&mut AncestorContext) -> R,
    {
        let mut scope = self.with_all(segments);
        f(&mut scope)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Snapshot of the current segments.
    pub fn current_segments(&self) -> Vec<PathSegment> {
        self.segments.clone()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromIterator<PathSegment> for AncestorContext {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

/// Guard returned by [`AncestorContext::with`]; derefs to the context.
#[must_use = "segments are popped as soon as the scope is dropped"]
#[derive(Debug)]
pub struct AncestorScope<'a> {
    context: &'a mut AncestorContext,
    pushed: usize,
}

impl AncestorScope<'_> {
    /// Number of segments this scope pushed.
    pub fn pushed(&self) -> usize {
        self.pushed
    }
}

impl Deref for AncestorScope<'_> {
    type Target = AncestorContext;

    fn deref(&self) -> &AncestorContext {
        self.context
    }
}

impl DerefMut for AncestorScope<'_> {
    fn deref_mut(&mut self) -> &mut AncestorContext {
        self.context
    }
}

impl Drop for AncestorScope<'_> {
    fn drop(&mut self) {
        let segments = &mut self.context.segments;
        segments.truncate(segments.len().saturating_sub(self.pushed));
        trace!(popped = self.pushed, depth = segments.len(), "left ancestor scope");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seg(kind: &str, id: i64) -> PathSegment {
        PathSegment::new(kind, id)
    }

    // -----------------------------------------------------------------------
    // Push / pop
    // -----------------------------------------------------------------------

    #[test]
    fn scope_pushes_and_pops() {
        let mut ctx = AncestorContext::new();
        {
            let scope = ctx.with(seg("Kind", 1));
            assert_eq!(scope.segments(), &[seg("Kind", 1)]);
            assert_eq!(scope.pushed(), 1);
        }
        assert!(ctx.is_empty());
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let mut ctx = AncestorContext::new();
        let mut outer = ctx.with_all(vec![seg("A", 1), seg("B", 2)]);
        {
            let inner = outer.with(seg("C", 3));
            assert_eq!(inner.depth(), 3);
            assert_eq!(inner.segments()[2], seg("C", 3));
        }
        assert_eq!(outer.current_segments(), vec![seg("A", 1), seg("B", 2)]);
        drop(outer);
        assert!(ctx.is_empty());
    }

    #[test]
    fn empty_push_is_a_no_op() {
        let mut ctx: AncestorContext = vec![seg("Root", 1)].into_iter().collect();
        {
            let scope = ctx.with_all(Vec::new());
            assert_eq!(scope.pushed(), 0);
            assert_eq!(scope.depth(), 1);
        }
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn scope_pops_only_its_own_segments() {
        let mut ctx: AncestorContext = vec![seg("Root", 1)].into_iter().collect();
        {
            let _scope = ctx.with(seg("Child", 2));
        }
        assert_eq!(ctx.segments(), &[seg("Root", 1)]);
    }

    #[test]
    fn scoped_closure_pops_on_return() {
        let mut ctx = AncestorContext::new();
        let depth = ctx.scoped(vec![seg("A", 1), seg("B", 2)], |inner| inner.depth());
        assert_eq!(depth, 2);
        assert!(ctx.is_empty());
    }

    #[test]
    fn scope_pops_on_unwind() {
        let mut ctx = AncestorContext::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ctx.scoped(vec![seg("A", 1)], |_| -> () { panic!("boom") })
        }));
        assert!(result.is_err());
        assert!(ctx.is_empty());
    }

    #[test]
    fn contexts_are_independent() {
        let mut a = AncestorContext::new();
        let b = AncestorContext::new();
        let _scope = a.with(seg("A", 1));
        assert!(b.is_empty());
    }

    // -----------------------------------------------------------------------
    // Scoping law
    // -----------------------------------------------------------------------

    fn nest(ctx: &mut AncestorContext, pushes: &[usize], expected: &mut Vec<PathSegment>) {
        let Some((&count, rest)) = pushes.split_first() else {
            return;
        };
        let before = expected.clone();
        let segments: Vec<_> = (0..count)
            .map(|i| seg("Level", (expected.len() + i) as i64 + 1))
            .collect();
        expected.extend(segments.iter().cloned());
        {
            let mut scope = ctx.with_all(segments);
            assert_eq!(scope.segments(), expected.as_slice());
            nest(&mut scope, rest, expected);
            assert_eq!(scope.segments(), expected.as_slice());
        }
        *expected = before;
        assert_eq!(ctx.segments(), expected.as_slice());
    }

    proptest! {
        #[test]
        fn nested_scopes_restore_outer_segments(pushes in prop::collection::vec(0usize..4, 0..8)) {
            let mut ctx = AncestorContext::new();
            let mut expected = Vec::new();
            nest(&mut ctx, &pushes, &mut expected);
            prop_assert!(ctx.is_empty());
        }
    }
}
