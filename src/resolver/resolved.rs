//! The result of resolving a signature.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::provider::{downcast, AnyArc};

/// Resolved values by parameter name, in signature order.
///
/// Untyped parameters and optional parameters nothing provided are absent.
///
/// # Examples
///
/// ```
/// use tiered_di::{Provider, Resolver, signature};
///
/// struct Config { name: &'static str }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let resolver = Resolver::builder()
///     .add_provider(Provider::instance(Config { name: "prod" }))
///     .build()
///     .unwrap();
///
/// let resolved = resolver
///     .resolve(resolver.root_scope(), &signature!(config: Config, verbose))
///     .await
///     .unwrap();
///
/// assert_eq!(resolved.get::<Config>("config").unwrap().name, "prod");
/// assert!(!resolved.contains("verbose"));
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Resolved {
    values: Vec<(String, Key, AnyArc)>,
}

impl Resolved {
    pub(crate) fn new(values: Vec<(String, Key, AnyArc)>) -> Self {
        Self { values }
    }

    /// The value injected for `name`.
    ///
    /// Fails with `MissingArgument` when nothing was injected under that name
    /// and with `TypeMismatch` when `T` differs from the parameter's type.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        let (_, _, value) = self
            .values
            .iter()
            .find(|(n, _, _)| n == name)
            .ok_or_else(|| DiError::MissingArgument { name: name.to_string() })?;
        downcast::<T>(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|(n, _, _)| n == name)
    }

    /// The key a parameter was resolved for.
    pub fn key_of(&self, name: &str) -> Option<Key> {
        self.values.iter().find(|(n, _, _)| n == name).map(|(_, k, _)| *k)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|(n, _, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(n, k, _)| (n, k)))
            .finish()
    }
}
