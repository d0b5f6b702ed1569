//! Dependency lists handed to factories.
//!
//! A factory states what it needs through the type of its argument: a tuple
//! of `Arc`s. That tuple type is the provider's signature. Its keys become the
//! provider's dependency list, and its values are pulled out of [`Deps`] right
//! before the factory runs.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::provider::{downcast, AnyArc};

/// Resolved dependency values for one factory invocation, in declaration
/// order.
///
/// # Examples
///
/// ```
/// use tiered_di::{Provider, Deps};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Database { url: String }
///
/// // Tuple form: dependencies are inferred from the argument type.
/// let db = Provider::value(|(config,): (Arc<Config>,)| {
///     Ok(Database { url: config.url.clone() })
/// });
/// assert_eq!(db.build().dependencies().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Deps {
    values: Vec<(Key, AnyArc)>,
}

impl Deps {
    pub(crate) fn new(values: Vec<(Key, AnyArc)>) -> Self {
        Self { values }
    }

    /// Returns the dependency resolved for `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of::<T>();
        let value = self
            .values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| DiError::MissingArgument {
                name: key.display_name().to_string(),
            })?;
        downcast::<T>(value)
    }

    /// Number of resolved dependencies.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A factory's argument type: the ordered set of dependencies it needs.
///
/// Implemented for `()` and for tuples of up to eight `Arc<T>` elements, where
/// each `T` may be unsized (`Arc<dyn Store>`).
pub trait DepList: Sized + Send + 'static {
    /// Keys of every element, in order.
    fn keys() -> Vec<Key>;

    /// Builds the tuple from resolved values.
    fn from_deps(deps: &Deps) -> DiResult<Self>;
}

impl DepList for () {
    fn keys() -> Vec<Key> {
        Vec::new()
    }

    fn from_deps(_deps: &Deps) -> DiResult<Self> {
        Ok(())
    }
}

macro_rules! impl_dep_list_tuple {
    ($($T:ident),+) => {
        impl<$($T: ?Sized + Send + Sync + 'static),+> DepList for ($(Arc<$T>,)+) {
            fn keys() -> Vec<Key> {
                vec![$(Key::of::<$T>()),+]
            }

            fn from_deps(deps: &Deps) -> DiResult<Self> {
                Ok(($(deps.get::<$T>()?,)+))
            }
        }
    };
}

impl_dep_list_tuple!(A);
impl_dep_list_tuple!(A, B);
impl_dep_list_tuple!(A, B, C);
impl_dep_list_tuple!(A, B, C, D);
impl_dep_list_tuple!(A, B, C, D, E);
impl_dep_list_tuple!(A, B, C, D, E, F);
impl_dep_list_tuple!(A, B, C, D, E, F, G);
impl_dep_list_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::erase;

    struct Config(u32);
    trait Store: Send + Sync {}
    struct Memory;
    impl Store for Memory {}

    #[test]
    fn tuple_keys_keep_declaration_order() {
        let keys = <(Arc<Config>, Arc<dyn Store>)>::keys();
        assert_eq!(keys, vec![Key::of::<Config>(), Key::of::<dyn Store>()]);
        assert!(<()>::keys().is_empty());
    }

    #[test]
    fn from_deps_extracts_sized_and_unsized() {
        let store: Arc<dyn Store> = Arc::new(Memory);
        let deps = Deps::new(vec![
            (Key::of::<dyn Store>(), erase(store)),
            (Key::of::<Config>(), erase(Arc::new(Config(7)))),
        ]);

        let (config, _store) = <(Arc<Config>, Arc<dyn Store>)>::from_deps(&deps).unwrap();
        assert_eq!(config.0, 7);
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn undeclared_dependency_is_reported() {
        let deps = Deps::default();
        assert!(deps.is_empty());
        match deps.get::<Config>() {
            Err(DiError::MissingArgument { name }) => assert!(name.ends_with("Config")),
            _ => panic!("expected MissingArgument"),
        }
    }
}
