//! Coverage: the set of keys a provider answers for.
//!
//! Rust has no nominal supertypes, so a provider of `T` declares the extra keys
//! it satisfies together with a projection from `Arc<T>`. The usual case is a
//! trait object: `covers::<dyn Store>(|db| db as Arc<dyn Store>)` makes a `Database` provider
//! answer requests for `dyn Store` with the same instance.

use std::sync::Arc;

use crate::key::Key;
use crate::provider::{erase, AnyArc};

type Projection = Arc<dyn Fn(&AnyArc) -> Option<AnyArc> + Send + Sync>;

/// One covered key and how to produce its value from the provider's instance.
#[derive(Clone)]
pub(crate) struct CoverageEntry {
    pub(crate) key: Key,
    project: Projection,
}

impl CoverageEntry {
    /// The provider's own value type.
    pub(crate) fn identity<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            key: Key::of::<T>(),
            project: Arc::new(|value: &AnyArc| Some(value.clone())),
        }
    }

    /// A key reached through `project`.
    pub(crate) fn projected<T, U, F>(project: F) -> Self
    where
        T: Send + Sync + 'static,
        U: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        Self {
            key: Key::of::<U>(),
            project: Arc::new(move |value: &AnyArc| {
                value
                    .downcast_ref::<Arc<T>>()
                    .map(|inner| erase(project(inner.clone())))
            }),
        }
    }

    pub(crate) fn project(&self, value: &AnyArc) -> Option<AnyArc> {
        (self.project)(value)
    }
}

impl std::fmt::Debug for CoverageEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CoverageEntry").field(&self.key).finish()
    }
}

/// Computes the keys a provider covers.
///
/// With `explicit` coverage, exactly those entries are used. Otherwise the
/// declared type is covered, plus `supertypes` when `include_supertypes` is
/// set. Duplicate keys keep their first entry.
pub(crate) fn coverage_of(
    declared: CoverageEntry,
    explicit: Option<Vec<CoverageEntry>>,
    supertypes: Vec<CoverageEntry>,
    include_supertypes: bool,
) -> Vec<CoverageEntry> {
    let candidates = match explicit {
        Some(entries) => entries,
        None => {
            let mut entries = vec![declared];
            if include_supertypes {
                entries.extend(supertypes);
            }
            entries
        }
    };

    let mut coverage: Vec<CoverageEntry> = Vec::with_capacity(candidates.len());
    for entry in candidates {
        if !coverage.iter().any(|e| e.key == entry.key) {
            coverage.push(entry);
        }
    }
    coverage
}
