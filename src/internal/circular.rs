//! Circular dependency detection infrastructure.
//!
//! Resolution is async and fans out across tasks, so the in-progress markers
//! travel with each branch of the walk instead of living in thread-local
//! storage. Every branch owns its own path; two concurrent branches never see
//! each other's markers.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Identity of a scope inside one resolver tree.
pub(crate) type ScopeId = u64;

#[derive(Debug)]
struct Frame {
    key: Key,
    scope: ScopeId,
    parent: Option<Arc<Frame>>,
    depth: usize,
}

/// The chain of `(key, owning scope)` markers currently being constructed
/// along one call stack.
///
/// Cloning is cheap: frames are shared, pushing allocates one node.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionPath {
    head: Option<Arc<Frame>>,
}

impl ResolutionPath {
    pub(crate) fn new() -> Self {
        Self { head: None }
    }

    pub(crate) fn depth(&self) -> usize {
        self.head.as_ref().map_or(0, |f| f.depth)
    }

    /// Returns the path extended with `(key, scope)`.
    ///
    /// Fails with `Cycle` when the marker is already on the path, and with
    /// `DepthExceeded` once the path is longer than `max_depth`.
    pub(crate) fn enter(&self, key: Key, scope: ScopeId, max_depth: usize) -> DiResult<Self> {
        if self.contains(key, scope) {
            return Err(DiError::Cycle { path: self.cycle_through(key) });
        }

        let depth = self.depth();
        if depth >= max_depth {
            return Err(DiError::DepthExceeded(depth));
        }

        Ok(Self {
            head: Some(Arc::new(Frame {
                key,
                scope,
                parent: self.head.clone(),
                depth: depth + 1,
            })),
        })
    }

    fn contains(&self, key: Key, scope: ScopeId) -> bool {
        self.frames().any(|f| f.key == key && f.scope == scope)
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.head.as_deref(), |f| f.parent.as_deref())
    }

    /// Names along the path from the first occurrence of `key` down to the
    /// re-entry, e.g. `A -> B -> A`.
    fn cycle_through(&self, key: Key) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for frame in self.frames() {
            names.push(frame.key.display_name());
            if frame.key == key {
                break;
            }
        }
        names.reverse();
        names.push(key.display_name());
        names
    }
}
