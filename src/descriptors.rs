//! Provider descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::level::Level;
use crate::provider::{CachePolicy, ExecutionMode, Provider, ProviderKind};

/// A snapshot of one registered provider.
///
/// Returned by [`Resolver::descriptors`](crate::Resolver::descriptors) in
/// registration order. Useful for health checks at startup and for dumping the
/// provider graph while debugging.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Provider, ProviderKind, Resolver};
/// use std::sync::Arc;
///
/// struct Config;
/// struct Session;
///
/// let resolver = Resolver::builder()
///     .add_provider(Provider::instance(Config))
///     .add_provider(Provider::value(|(_c,): (Arc<Config>,)| Ok(Session)).at_level(2))
///     .build()
///     .unwrap();
///
/// let descriptors = resolver.descriptors();
/// assert_eq!(descriptors.len(), 2);
///
/// let session = descriptors.iter().find(|d| d.name.ends_with("Session")).unwrap();
/// assert_eq!(session.level.get(), 2);
/// assert_eq!(session.kind, ProviderKind::Value);
/// assert_eq!(session.dependencies.len(), 1);
/// assert!(session.depends_on_level_below());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Declared value type name.
    pub name: &'static str,
    /// Keys the provider answers for.
    pub coverage: Vec<Key>,
    pub level: Level,
    /// Dependency keys in declaration order.
    pub dependencies: Vec<Key>,
    /// Levels the dependencies resolve at, parallel to `dependencies`.
    /// `None` for a dependency with no provider (it must be seeded).
    pub dependency_levels: Vec<Option<Level>>,
    pub kind: ProviderKind,
    pub mode: ExecutionMode,
    pub cache: CachePolicy,
}

impl ProviderDescriptor {
    pub(crate) fn new(provider: &Provider, dependency_levels: Vec<Option<Level>>) -> Self {
        Self {
            name: provider.name(),
            coverage: provider.coverage(),
            level: provider.level(),
            dependencies: provider.dependencies().to_vec(),
            dependency_levels,
            kind: provider.kind(),
            mode: provider.mode(),
            cache: provider.cache_policy(),
        }
    }

    /// True when at least one dependency lives in an ancestor scope.
    pub fn depends_on_level_below(&self) -> bool {
        self.dependency_levels
            .iter()
            .flatten()
            .any(|level| *level < self.level)
    }

    /// Dependencies with no provider registered, which must be seeded.
    pub fn unprovided(&self) -> Vec<Key> {
        self.dependencies
            .iter()
            .zip(&self.dependency_levels)
            .filter(|(_, level)| level.is_none())
            .map(|(key, _)| *key)
            .collect()
    }
}
