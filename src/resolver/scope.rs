//! Scopes: lifetime containers bound to a level.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::resolved::Resolved;
use super::seeds::Seeds;
use super::walker;
use super::Shared;
use crate::error::{DiError, DiResult, TeardownFailures};
use crate::internal::{DisposeBag, ReleaseAction, ScopeId};
use crate::key::Key;
use crate::level::Level;
use crate::provider::{downcast, AnyArc, ProviderId};
use crate::signature::Injectable;

/// A lifetime container at one level.
///
/// The root scope sits at level 1; every child sits one level above its
/// parent. A scope caches one instance per provider declared at its own
/// level, and delegates requests for lower-level providers to the ancestor at
/// that level. Sibling scopes share their ancestors' values but nothing else.
///
/// Resources constructed for a scope are released, last completed first, when
/// the scope is [closed](Scope::close). Parents must outlive their children:
/// a request that reaches a closed ancestor fails with `ScopeClosed`.
///
/// `Scope` is a cheap handle; clones refer to the same scope.
///
/// # Examples
///
/// ```
/// use tiered_di::{Provider, Resolver};
/// use std::sync::Arc;
///
/// struct Pool;
/// struct Session;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let resolver = Resolver::builder()
///     .add_provider(Provider::value(|()| Ok(Pool)))
///     .add_provider(Provider::value(|(_p,): (Arc<Pool>,)| Ok(Session)).at_level(2))
///     .build()
///     .unwrap();
///
/// let first = resolver.child_scope(resolver.root_scope()).unwrap();
/// let second = resolver.child_scope(resolver.root_scope()).unwrap();
///
/// let a = first.get::<Session>().await.unwrap();
/// let b = first.get::<Session>().await.unwrap();
/// let c = second.get::<Session>().await.unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(!Arc::ptr_eq(&a, &c));
///
/// // Both sessions share the level-1 pool.
/// assert!(Arc::ptr_eq(
///     &first.get::<Pool>().await.unwrap(),
///     &second.get::<Pool>().await.unwrap(),
/// ));
///
/// first.close().await.unwrap();
/// second.close().await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    id: ScopeId,
    level: Level,
    parent: Option<Scope>,
    shared: Arc<Shared>,
    seeds: Seeds,
    cache: RwLock<HashMap<ProviderId, AnyArc>>,
    locks: Mutex<HashMap<ProviderId, Arc<tokio::sync::Mutex<()>>>>,
    teardown: Mutex<DisposeBag>,
    closed: AtomicBool,
}

/// Outcome of handing a release action to a scope.
pub(crate) enum Adopted {
    Pushed,
    /// The scope closed in the meantime; nothing was cached and the action
    /// is handed back.
    Rejected(Option<ReleaseAction>),
}

impl Scope {
    pub(crate) fn root(shared: Arc<Shared>, seeds: Seeds) -> Self {
        Self::create(shared, None, Level::ROOT, seeds)
    }

    fn create(shared: Arc<Shared>, parent: Option<Scope>, level: Level, seeds: Seeds) -> Self {
        let id = shared.next_scope_id();
        tracing::trace!(scope = id, %level, seeds = seeds.len(), "scope created");
        Self {
            inner: Arc::new(ScopeInner {
                id,
                level,
                parent,
                shared,
                seeds,
                cache: RwLock::new(HashMap::new()),
                locks: Mutex::new(HashMap::new()),
                teardown: Mutex::new(DisposeBag::default()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// A new scope one level above this one.
    pub fn child(&self) -> DiResult<Scope> {
        self.child_with(Seeds::default())
    }

    /// A new child scope starting with `seeds`.
    pub fn child_with(&self, seeds: Seeds) -> DiResult<Scope> {
        self.ensure_open()?;
        Ok(Self::create(
            self.inner.shared.clone(),
            Some(self.clone()),
            self.inner.level.next(),
            seeds,
        ))
    }

    /// Resolves a single key in this scope.
    pub async fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of::<T>();
        let value = walker::resolve_root(self, key).await?;
        downcast::<T>(&value)
    }

    /// Resolves every injected parameter of `callable` in this scope.
    ///
    /// Nothing is torn down when this returns; values live until the scope
    /// that owns them closes.
    pub async fn resolve<C: Injectable + ?Sized>(&self, callable: &C) -> DiResult<Resolved> {
        walker::resolve_signature(self, callable.signature()).await
    }

    /// Releases every resource this scope owns, last completed first.
    ///
    /// Every release action runs even when earlier ones fail; failures are
    /// collected into one `Teardown` error. Closing twice is a no-op.
    pub async fn close(&self) -> DiResult<()> {
        let actions = {
            let mut bag = self.inner.teardown.lock();
            if self.inner.closed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }
            bag.drain_reverse()
        };

        let level = self.inner.level;
        let observers = &self.inner.shared.observers;
        tracing::debug!(scope = self.inner.id, %level, pending = actions.len(), "closing scope");

        let mut failures = Vec::new();
        for action in actions {
            let provider = action.key;
            match action.run().await {
                Ok(()) => observers.released(provider, level, true),
                Err(failure) => {
                    tracing::warn!(provider, %level, error = %failure.error, "release action failed");
                    observers.released(provider, level, false);
                    failures.push(failure);
                }
            }
        }

        self.inner.cache.write().clear();
        self.inner.locks.lock().clear();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::Teardown(TeardownFailures { failures }))
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of release actions waiting for this scope to close.
    pub fn pending_teardown(&self) -> usize {
        self.inner.teardown.lock().len()
    }

    pub fn level(&self) -> Level {
        self.inner.level
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    /// True when both handles refer to the same scope.
    pub fn same_scope(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn id(&self) -> ScopeId {
        self.inner.id
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.inner.shared
    }

    pub(crate) fn ensure_open(&self) -> DiResult<()> {
        if self.is_closed() {
            Err(DiError::ScopeClosed {
                level: self.inner.level,
            })
        } else {
            Ok(())
        }
    }

    /// This scope or the ancestor at `level`.
    pub(crate) fn ancestor_at(&self, level: Level) -> Option<&Scope> {
        std::iter::successors(Some(self), |s| s.parent()).find(|s| s.inner.level == level)
    }

    /// The nearest seed for `key`, looking from this scope up to the root.
    pub(crate) fn seeded(&self, key: &Key) -> Option<AnyArc> {
        std::iter::successors(Some(self), |s| s.parent()).find_map(|s| s.inner.seeds.get(key).cloned())
    }

    pub(crate) fn cached(&self, provider: ProviderId) -> Option<AnyArc> {
        self.inner.cache.read().get(&provider).cloned()
    }

    /// The instantiation lock for `provider`, created on first use.
    pub(crate) fn construction_lock(&self, provider: ProviderId) -> Arc<tokio::sync::Mutex<()>> {
        self.inner.locks.lock().entry(provider).or_default().clone()
    }

    /// Records a finished construction: caches `value` and pushes `action`,
    /// unless the scope has closed.
    ///
    /// Runs under the teardown lock, the same lock `close` flips `closed`
    /// under, so a closed scope never gains a cache entry or teardown entry.
    pub(crate) fn adopt(
        &self,
        provider: ProviderId,
        value: Option<AnyArc>,
        action: Option<ReleaseAction>,
    ) -> Adopted {
        let mut bag = self.inner.teardown.lock();
        if self.inner.closed.load(Ordering::Acquire) {
            return Adopted::Rejected(action);
        }
        if let Some(value) = value {
            self.inner.cache.write().entry(provider).or_insert(value);
        }
        if let Some(action) = action {
            bag.push(action);
        }
        Adopted::Pushed
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("level", &self.inner.level)
            .field("closed", &self.is_closed())
            .field("pending_teardown", &self.pending_teardown())
            .finish()
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let pending = self.teardown.get_mut().len();
        if pending > 0 && self.shared.options.warn_on_unreleased && !*self.closed.get_mut() {
            tracing::warn!(
                scope = self.id,
                level = %self.level,
                pending,
                "scope dropped without close; resources were not released"
            );
        }
    }
}
