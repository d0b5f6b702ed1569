//! Preset values attached to a scope when it is created.

use std::collections::HashMap;
use std::sync::Arc;

use crate::key::Key;
use crate::provider::{erase, AnyArc};

/// Values a scope starts with.
///
/// A seed answers requests for its key in the scope it was given to and in
/// every descendant, ahead of any provider. The nearest seed wins, so a child
/// can shadow a seed of its parent. Seeds are never released by the scope.
///
/// # Examples
///
/// ```
/// use tiered_di::{Resolver, Seeds};
/// use std::sync::Arc;
///
/// struct RequestId(u64);
/// trait Clock: Send + Sync {}
/// struct Fixed;
/// impl Clock for Fixed {}
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seeds = Seeds::new()
///     .with(RequestId(7))
///     .with_arc::<dyn Clock>(Arc::new(Fixed));
/// assert_eq!(seeds.len(), 2);
///
/// let resolver = Resolver::new();
/// let request = resolver.child_scope_with(resolver.root_scope(), seeds).unwrap();
/// assert_eq!(request.get::<RequestId>().await.unwrap().0, 7);
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Seeds {
    values: HashMap<Key, AnyArc>,
}

impl Seeds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `value` under its own type.
    pub fn with<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.with_arc(Arc::new(value))
    }

    /// Seeds a shared value, possibly unsized (`Arc<dyn Trait>`), under `T`.
    pub fn with_arc<T: ?Sized + Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.values.insert(Key::of::<T>(), erase(value));
        self
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&AnyArc> {
        self.values.get(key)
    }
}

impl std::fmt::Debug for Seeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}
