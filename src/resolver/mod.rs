//! The resolver: entry point owning the registry and the root scope.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ResolverOptions;
use crate::descriptors::ProviderDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::ScopeId;
use crate::observer::{Observers, ResolutionObserver};
use crate::provider::Provider;
use crate::registry::Registry;
use crate::signature::Injectable;

mod resolved;
mod scope;
mod seeds;
mod walker;

pub use resolved::Resolved;
pub use scope::Scope;
pub use seeds::Seeds;

/// State shared by the resolver and every scope it created.
pub(crate) struct Shared {
    registry: RwLock<Arc<Registry>>,
    sealed: AtomicBool,
    pub(crate) options: ResolverOptions,
    pub(crate) observers: Observers,
    next_scope: AtomicU64,
}

impl Shared {
    /// The registry snapshot used for resolution. Registration is closed from
    /// here on.
    pub(crate) fn seal(&self) -> Arc<Registry> {
        let registry = self.registry.read();
        self.sealed.store(true, Ordering::Release);
        registry.clone()
    }

    fn register<I>(&self, providers: I) -> DiResult<()>
    where
        I: IntoIterator<Item = Provider>,
    {
        let mut registry = self.registry.write();
        if self.sealed.load(Ordering::Acquire) {
            return Err(DiError::RegistrationClosed);
        }
        let mut staged = Registry::clone(&registry);
        staged.register_all(providers)?;
        *registry = Arc::new(staged);
        Ok(())
    }

    pub(crate) fn next_scope_id(&self) -> ScopeId {
        self.next_scope.fetch_add(1, Ordering::Relaxed)
    }
}

/// Owns the provider registry and the level-1 root scope.
///
/// Build one with [`Resolver::builder`], create child scopes per unit of work
/// (a request, a job), and resolve signatures against them. Registration is
/// closed by the first resolution.
///
/// # Examples
///
/// ```
/// use tiered_di::{BoxError, Provider, Resolver, signature};
/// use std::sync::Arc;
///
/// struct Config { dsn: &'static str }
/// struct Database { dsn: &'static str }
/// struct User { name: String }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), BoxError> {
/// let resolver = Resolver::builder()
///     .add_provider(Provider::instance(Config { dsn: "postgres://localhost" }))
///     .add_provider(Provider::value(|(c,): (Arc<Config>,)| Ok(Database { dsn: c.dsn })))
///     .add_provider(
///         Provider::value_async(|(_db,): (Arc<Database>,)| async move {
///             Ok::<_, BoxError>(User { name: "ada".into() })
///         })
///         .at_level(2),
///     )
///     .build()?;
///
/// let name = resolver
///     .resolve_in_child(resolver.root_scope(), &signature!(user: User, db: Database), |resolved| async move {
///         let user = resolved.get::<User>("user")?;
///         let db = resolved.get::<Database>("db")?;
///         assert_eq!(db.dsn, "postgres://localhost");
///         Ok::<_, BoxError>(user.name.clone())
///     })
///     .await??;
/// assert_eq!(name, "ada");
///
/// resolver.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Resolver {
    shared: Arc<Shared>,
    root: Scope,
}

impl Resolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// An empty resolver with default options.
    pub fn new() -> Self {
        Self::from_parts(Registry::new(), ResolverOptions::default(), Observers::default(), Seeds::default())
    }

    fn from_parts(registry: Registry, options: ResolverOptions, observers: Observers, seeds: Seeds) -> Self {
        let shared = Arc::new(Shared {
            registry: RwLock::new(Arc::new(registry)),
            sealed: AtomicBool::new(false),
            options,
            observers,
            next_scope: AtomicU64::new(1),
        });
        let root = Scope::root(shared.clone(), seeds);
        Self { shared, root }
    }

    /// Registers one provider.
    pub fn add_provider(&self, provider: impl Into<Provider>) -> DiResult<()> {
        self.shared.register(std::iter::once(provider.into()))
    }

    /// Registers providers atomically: all of them or, on error, none.
    ///
    /// Fails with `RegistrationClosed` once anything has been resolved.
    pub fn add_providers<I, P>(&self, providers: I) -> DiResult<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<Provider>,
    {
        self.shared.register(providers.into_iter().map(Into::into))
    }

    /// The level-1 scope.
    pub fn root_scope(&self) -> &Scope {
        &self.root
    }

    /// A new scope one level above `parent`.
    pub fn child_scope(&self, parent: &Scope) -> DiResult<Scope> {
        parent.child()
    }

    pub fn child_scope_with(&self, parent: &Scope, seeds: Seeds) -> DiResult<Scope> {
        parent.child_with(seeds)
    }

    /// Resolves `callable`'s injected parameters in `scope`.
    ///
    /// Nothing is torn down afterwards; the values live until their owning
    /// scopes close.
    pub async fn resolve<C: Injectable + ?Sized>(&self, scope: &Scope, callable: &C) -> DiResult<Resolved> {
        scope.resolve(callable).await
    }

    /// Resolves in a fresh child of `parent`, runs `body`, then closes the
    /// child.
    ///
    /// The child is closed on every path. When resolution fails its error is
    /// returned; a teardown failure on that path is logged. When resolution
    /// succeeds, a teardown failure is returned in place of the body's output.
    pub async fn resolve_in_child<C, F, Fut, R>(&self, parent: &Scope, callable: &C, body: F) -> DiResult<R>
    where
        C: Injectable + ?Sized,
        F: FnOnce(Resolved) -> Fut,
        Fut: Future<Output = R>,
    {
        self.resolve_in_child_with(parent, Seeds::default(), callable, body).await
    }

    /// [`resolve_in_child`](Self::resolve_in_child) with seeds for the child.
    pub async fn resolve_in_child_with<C, F, Fut, R>(
        &self,
        parent: &Scope,
        seeds: Seeds,
        callable: &C,
        body: F,
    ) -> DiResult<R>
    where
        C: Injectable + ?Sized,
        F: FnOnce(Resolved) -> Fut,
        Fut: Future<Output = R>,
    {
        let child = parent.child_with(seeds)?;

        let resolved = match child.resolve(callable).await {
            Ok(resolved) => resolved,
            Err(error) => {
                if let Err(teardown) = child.close().await {
                    tracing::error!(
                        level = %child.level(),
                        error = %teardown,
                        "teardown failed after resolution error"
                    );
                }
                return Err(error);
            }
        };

        let output = body(resolved).await;
        child.close().await?;
        Ok(output)
    }

    /// Closes the root scope, releasing every level-1 resource.
    pub async fn shutdown(&self) -> DiResult<()> {
        self.root.close().await
    }

    /// Every registered provider, in registration order.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.shared.registry.read().descriptors()
    }

    /// Number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.shared.registry.read().len()
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.shared.options
    }

    /// True once a resolution has closed registration.
    pub fn is_sealed(&self) -> bool {
        self.shared.sealed.load(Ordering::Acquire)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("providers", &self.provider_count())
            .field("sealed", &self.is_sealed())
            .field("options", &self.shared.options)
            .finish()
    }
}

/// Collects providers, observers and options, then validates everything at
/// once in [`build`](Self::build).
///
/// ```
/// use tiered_di::{Provider, Resolver, ResolverOptions, Seeds, TracingObserver};
/// use std::sync::Arc;
///
/// struct Region(&'static str);
/// struct Cache;
///
/// let resolver = Resolver::builder()
///     .options(ResolverOptions::default().max_depth(32))
///     .observer(Arc::new(TracingObserver::new()))
///     .seeds(Seeds::new().with(Region("eu-west-1")))
///     .add_providers([Provider::value(|(_r,): (Arc<Region>,)| Ok(Cache))])
///     .build()
///     .unwrap();
/// assert_eq!(resolver.provider_count(), 1);
/// ```
#[derive(Default)]
pub struct ResolverBuilder {
    providers: Vec<Provider>,
    observers: Observers,
    options: ResolverOptions,
    seeds: Seeds,
}

impl ResolverBuilder {
    pub fn add_provider(mut self, provider: impl Into<Provider>) -> Self {
        self.providers.push(provider.into());
        self
    }

    pub fn add_providers<I, P>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Provider>,
    {
        self.providers.extend(providers.into_iter().map(Into::into));
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Seeds for the root scope.
    pub fn seeds(mut self, seeds: Seeds) -> Self {
        self.seeds = seeds;
        self
    }

    /// Validates the providers and creates the resolver.
    ///
    /// Fails with `InvalidProvider`, `Conflict` or `LevelOrder`.
    pub fn build(self) -> DiResult<Resolver> {
        let mut registry = Registry::new();
        registry.register_all(self.providers)?;
        tracing::debug!(
            providers = registry.len(),
            observers = self.observers.has_observers(),
            "resolver built"
        );
        Ok(Resolver::from_parts(registry, self.options, self.observers, self.seeds))
    }
}
