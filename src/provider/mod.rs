//! Providers: registered units of construction.
//!
//! A provider binds a factory to the keys it covers and to the level its
//! single instance lives at. Providers are built with the constructors on
//! [`Provider`] and refined with [`ProviderBuilder`]:
//!
//! | constructor                  | kind     | mode       |
//! |------------------------------|----------|------------|
//! | [`Provider::value`]          | Value    | Direct     |
//! | [`Provider::value_async`]    | Value    | Suspending |
//! | [`Provider::resource`]       | Resource | Direct     |
//! | [`Provider::resource_async`] | Resource | Suspending |
//! | [`Provider::instance`]       | Value    | Direct     |

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::coverage::{coverage_of, CoverageEntry};
use crate::error::{BoxError, DiError, DiResult};
use crate::internal::ReleaseFn;
use crate::key::Key;
use crate::level::Level;

pub mod deps;
pub mod resource;

pub use deps::{DepList, Deps};
pub use resource::Resource;

// Type-erased storage. The erased value is always an `Arc<T>` wrapped once
// more, so unsized `T` (trait objects) share one code path with sized ones.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

#[inline]
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    Arc::new(value)
}

#[inline]
pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(value: &AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(DiError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

pub(crate) type ProviderId = u64;

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

type DirectFactory = dyn Fn(&Deps) -> Result<Constructed, BoxError> + Send + Sync;
type SuspendingFactory = dyn Fn(Deps) -> BoxFuture<'static, Result<Constructed, BoxError>> + Send + Sync;

#[derive(Clone)]
pub(crate) enum Factory {
    Direct(Arc<DirectFactory>),
    Suspending(Arc<SuspendingFactory>),
}

/// What a factory produced: the erased value and, for resources, the action
/// that releases it.
pub(crate) struct Constructed {
    pub(crate) value: AnyArc,
    pub(crate) release: Option<ReleaseFn>,
}

/// Whether a provider's value needs teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Plain value, dropped with its owning scope.
    Value,
    /// Value paired with a release action run when its owning scope closes.
    Resource,
}

/// Whether invoking the factory may suspend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Completes synchronously.
    Direct,
    /// Returns a future that may yield at await points.
    Suspending,
}

/// Whether the owning scope memoizes the provider's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// One instance per owning scope.
    Cached,
    /// A fresh instance on every request.
    NeverCache,
}

/// A registered unit of construction.
///
/// Providers are immutable and cheap to clone. See the [module
/// docs](self) for the available constructors.
///
/// # Examples
///
/// ```
/// use tiered_di::{BoxError, Provider, ProviderKind, ExecutionMode, Key, Level};
/// use std::sync::Arc;
///
/// struct Config { dsn: String }
/// struct Database { dsn: String }
/// struct User { name: String }
///
/// let config = Provider::value(|()| Ok(Config { dsn: "postgres://localhost".into() })).build();
/// let database = Provider::value(|(config,): (Arc<Config>,)| {
///     Ok(Database { dsn: config.dsn.clone() })
/// })
/// .build();
/// let user = Provider::value_async(|(_db,): (Arc<Database>,)| async move {
///     Ok::<_, BoxError>(User { name: "ada".into() })
/// })
/// .at_level(2)
/// .build();
///
/// assert_eq!(config.level(), Level::ROOT);
/// assert_eq!(database.dependencies(), &[Key::of::<Config>()]);
/// assert_eq!(user.level().get(), 2);
/// assert_eq!(user.mode(), ExecutionMode::Suspending);
/// assert_eq!(user.kind(), ProviderKind::Value);
/// ```
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    id: ProviderId,
    name: &'static str,
    coverage: Vec<CoverageEntry>,
    level: Level,
    dependencies: Vec<Key>,
    kind: ProviderKind,
    mode: ExecutionMode,
    cache: CachePolicy,
    factory: Factory,
}

impl Provider {
    /// A value provider with a synchronous factory.
    ///
    /// The factory's argument tuple declares the dependencies.
    pub fn value<T, D, F>(factory: F) -> ProviderBuilder<T>
    where
        T: Send + Sync + 'static,
        D: DepList,
        F: Fn(D) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let direct: Arc<DirectFactory> = Arc::new(move |deps: &Deps| -> Result<Constructed, BoxError> {
            let value = factory(D::from_deps(deps)?)?;
            Ok(Constructed {
                value: erase(Arc::new(value)),
                release: None,
            })
        });
        ProviderBuilder::new(D::keys(), ProviderKind::Value, Factory::Direct(direct))
    }

    /// A value provider whose factory suspends.
    pub fn value_async<T, D, F, Fut>(factory: F) -> ProviderBuilder<T>
    where
        T: Send + Sync + 'static,
        D: DepList,
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let suspending: Arc<SuspendingFactory> = Arc::new(move |deps: Deps| -> BoxFuture<'static, Result<Constructed, BoxError>> {
            match D::from_deps(&deps) {
                Ok(args) => {
                    let pending = factory(args);
                    Box::pin(async move {
                        let value = pending.await?;
                        Ok::<_, BoxError>(Constructed {
                            value: erase(Arc::new(value)),
                            release: None,
                        })
                    })
                }
                Err(e) => Box::pin(async move { Err::<Constructed, BoxError>(e.into()) }),
            }
        });
        ProviderBuilder::new(D::keys(), ProviderKind::Value, Factory::Suspending(suspending))
    }

    /// A resource provider with a synchronous factory.
    pub fn resource<T, D, F>(factory: F) -> ProviderBuilder<T>
    where
        T: Send + Sync + 'static,
        D: DepList,
        F: Fn(D) -> Result<Resource<T>, BoxError> + Send + Sync + 'static,
    {
        let direct: Arc<DirectFactory> = Arc::new(move |deps: &Deps| -> Result<Constructed, BoxError> {
            let (value, release) = factory(D::from_deps(deps)?)?.into_parts();
            Ok(Constructed {
                value: erase(value),
                release: Some(release),
            })
        });
        ProviderBuilder::new(D::keys(), ProviderKind::Resource, Factory::Direct(direct))
    }

    /// A resource provider whose factory suspends.
    pub fn resource_async<T, D, F, Fut>(factory: F) -> ProviderBuilder<T>
    where
        T: Send + Sync + 'static,
        D: DepList,
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resource<T>, BoxError>> + Send + 'static,
    {
        let suspending: Arc<SuspendingFactory> = Arc::new(move |deps: Deps| -> BoxFuture<'static, Result<Constructed, BoxError>> {
            match D::from_deps(&deps) {
                Ok(args) => {
                    let pending = factory(args);
                    Box::pin(async move {
                        let (value, release) = pending.await?.into_parts();
                        Ok::<_, BoxError>(Constructed {
                            value: erase(value),
                            release: Some(release),
                        })
                    })
                }
                Err(e) => Box::pin(async move { Err::<Constructed, BoxError>(e.into()) }),
            }
        });
        ProviderBuilder::new(D::keys(), ProviderKind::Resource, Factory::Suspending(suspending))
    }

    /// A provider that always hands out `value`.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> ProviderBuilder<T> {
        let shared = erase(Arc::new(value));
        let direct: Arc<DirectFactory> = Arc::new(move |_deps: &Deps| -> Result<Constructed, BoxError> {
            Ok(Constructed {
                value: shared.clone(),
                release: None,
            })
        });
        ProviderBuilder::new(Vec::new(), ProviderKind::Value, Factory::Direct(direct))
    }

    /// Name of the declared value type.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Every key this provider satisfies.
    pub fn coverage(&self) -> Vec<Key> {
        self.inner.coverage.iter().map(|e| e.key).collect()
    }

    pub fn covers(&self, key: &Key) -> bool {
        self.inner.coverage.iter().any(|e| e.key == *key)
    }

    pub fn level(&self) -> Level {
        self.inner.level
    }

    /// Dependency keys in factory argument order.
    pub fn dependencies(&self) -> &[Key] {
        &self.inner.dependencies
    }

    pub fn kind(&self) -> ProviderKind {
        self.inner.kind
    }

    pub fn mode(&self) -> ExecutionMode {
        self.inner.mode
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.inner.cache
    }

    pub(crate) fn id(&self) -> ProviderId {
        self.inner.id
    }

    /// The first covered key, standing for the provider in cycle paths.
    pub(crate) fn primary_key(&self) -> Key {
        self.inner.coverage[0].key
    }

    /// Produces the value stored for `key` from the provider's instance.
    pub(crate) fn project(&self, key: &Key, value: &AnyArc) -> DiResult<AnyArc> {
        self.inner
            .coverage
            .iter()
            .find(|e| e.key == *key)
            .and_then(|e| e.project(value))
            .ok_or(DiError::TypeMismatch {
                expected: key.display_name(),
            })
    }

    /// Runs the factory, awaiting it when it suspends.
    pub(crate) async fn invoke(&self, deps: Deps) -> Result<Constructed, BoxError> {
        let factory = self.inner.factory.clone();
        match factory {
            Factory::Direct(f) => f(&deps),
            Factory::Suspending(f) => f(deps).await,
        }
    }

    /// Checks the provider's own shape: level, coverage, dependency list.
    pub(crate) fn validate(&self) -> DiResult<()> {
        let invalid = |reason: String| DiError::InvalidProvider {
            key: self.name(),
            reason,
        };

        if !self.level().is_valid() {
            return Err(invalid(format!("level must be at least 1, got {}", self.level())));
        }
        if self.inner.coverage.is_empty() {
            return Err(invalid("coverage is empty".to_string()));
        }
        for (i, dep) in self.dependencies().iter().enumerate() {
            if self.dependencies()[..i].contains(dep) {
                return Err(invalid(format!("dependency {} is declared twice", dep)));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("coverage", &self.coverage())
            .field("level", &self.level())
            .field("dependencies", &self.dependencies())
            .field("kind", &self.kind())
            .field("mode", &self.mode())
            .field("cache", &self.cache_policy())
            .finish()
    }
}

/// Refines a provider before registration.
///
/// Converts into a [`Provider`] with [`build`](Self::build) or `Into`.
pub struct ProviderBuilder<T> {
    level: Level,
    dependencies: Vec<Key>,
    kind: ProviderKind,
    factory: Factory,
    cache: CachePolicy,
    supertypes: Vec<CoverageEntry>,
    explicit: Option<Vec<CoverageEntry>>,
    include_supertypes: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ProviderBuilder<T> {
    fn new(dependencies: Vec<Key>, kind: ProviderKind, factory: Factory) -> Self {
        Self {
            level: Level::ROOT,
            dependencies,
            kind,
            factory,
            cache: CachePolicy::Cached,
            supertypes: Vec::new(),
            explicit: None,
            include_supertypes: true,
            _marker: PhantomData,
        }
    }

    /// Sets the level the provider's instance lives at. Defaults to 1.
    pub fn at_level(mut self, level: u32) -> Self {
        self.level = Level::from(level);
        self
    }

    /// Also answer requests for `U`, projecting the instance with `project`.
    ///
    /// ```
    /// use tiered_di::Provider;
    /// use std::sync::Arc;
    ///
    /// trait Store: Send + Sync {}
    /// struct Database;
    /// impl Store for Database {}
    ///
    /// let provider = Provider::value(|()| Ok(Database))
    ///     .covers::<dyn Store>(|db| db as Arc<dyn Store>)
    ///     .build();
    /// assert_eq!(provider.coverage().len(), 2);
    /// ```
    pub fn covers<U>(mut self, project: impl Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        self.supertypes.push(CoverageEntry::projected::<T, U, _>(project));
        self
    }

    /// Cover exactly the keys given through `only_covers`, not `T` itself
    /// unless it is listed too (`only_covers::<T>(|t| t)`).
    pub fn only_covers<U>(mut self, project: impl Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        self.explicit
            .get_or_insert_with(Vec::new)
            .push(CoverageEntry::projected::<T, U, _>(project));
        self
    }

    /// Whether `covers` entries take part in coverage. Defaults to true.
    pub fn include_supertypes(mut self, include: bool) -> Self {
        self.include_supertypes = include;
        self
    }

    /// Invoke the factory on every request instead of once per scope.
    pub fn never_cache(mut self) -> Self {
        self.cache = CachePolicy::NeverCache;
        self
    }

    pub fn build(self) -> Provider {
        let mode = match self.factory {
            Factory::Direct(_) => ExecutionMode::Direct,
            Factory::Suspending(_) => ExecutionMode::Suspending,
        };
        let coverage = coverage_of(
            CoverageEntry::identity::<T>(),
            self.explicit,
            self.supertypes,
            self.include_supertypes,
        );

        Provider {
            inner: Arc::new(ProviderInner {
                id: NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed),
                name: std::any::type_name::<T>(),
                coverage,
                level: self.level,
                dependencies: self.dependencies,
                kind: self.kind,
                mode,
                cache: self.cache,
                factory: self.factory,
            }),
        }
    }
}

impl<T: Send + Sync + 'static> From<ProviderBuilder<T>> for Provider {
    fn from(builder: ProviderBuilder<T>) -> Self {
        builder.build()
    }
}
