//! The graph walker: recursive, single-flight construction.
//!
//! A request for `key` in a scope goes through these steps:
//!
//! 1. a seed on the requesting scope chain answers it;
//! 2. otherwise the registry yields the provider with the greatest level not
//!    above the requesting scope's level, and the ancestor at that level owns
//!    the value;
//! 3. the owner's cache answers it;
//! 4. otherwise the owner's lock for that provider is taken, the cache is
//!    checked again, the dependencies are resolved against the owner, and the
//!    factory runs. The value is cached and any release action is pushed on
//!    the owner's teardown stack.
//!
//! Before any of that, [`precheck`] walks the provider graph without running
//! anything, so cycles and missing providers are reported before a single
//! factory is invoked.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;

use super::resolved::Resolved;
use super::scope::{Adopted, Scope};
use crate::error::{DiError, DiResult};
use crate::internal::{ReleaseAction, ResolutionPath};
use crate::key::Key;
use crate::level::Level;
use crate::provider::{AnyArc, CachePolicy, Deps};
use crate::registry::Registry;
use crate::signature::Signature;

/// Resolves one key requested directly on `scope`.
pub(crate) async fn resolve_root(scope: &Scope, key: Key) -> DiResult<AnyArc> {
    scope.ensure_open()?;
    let registry = scope.shared().seal();
    precheck(scope, &registry, key)?;
    resolve_key(scope.clone(), registry, key, ResolutionPath::new()).await
}

/// Resolves every injected parameter of `signature` on `scope`.
pub(crate) async fn resolve_signature(scope: &Scope, signature: Signature) -> DiResult<Resolved> {
    scope.ensure_open()?;
    let registry = scope.shared().seal();

    let mut wanted = Vec::new();
    for param in signature.params() {
        let Some(key) = param.key() else {
            tracing::trace!(param = %param.name, "not injected: untyped");
            continue;
        };
        match precheck(scope, &registry, key) {
            Ok(()) => wanted.push((param.name.clone(), key, param.is_optional())),
            Err(DiError::MissingProvider { .. }) if param.is_optional() => {
                tracing::trace!(param = %param.name, key = %key, "optional parameter not provided");
            }
            Err(e) => return Err(e),
        }
    }

    let requests = wanted.into_iter().map(|(name, key, optional)| {
        let scope = scope.clone();
        let registry = registry.clone();
        async move {
            match resolve_key(scope, registry, key, ResolutionPath::new()).await {
                Ok(value) => Ok(Some((name, key, value))),
                Err(DiError::MissingProvider { .. }) if optional => Ok(None),
                Err(e) => Err(e),
            }
        }
    });

    let values = if scope.shared().options.concurrent_fanout {
        try_join_all(requests).await?
    } else {
        let mut values = Vec::new();
        for request in requests {
            values.push(request.await?);
        }
        values
    };

    Ok(Resolved::new(values.into_iter().flatten().collect()))
}

fn resolve_key(
    scope: Scope,
    registry: Arc<Registry>,
    key: Key,
    path: ResolutionPath,
) -> BoxFuture<'static, DiResult<AnyArc>> {
    async move { walk(scope, registry, key, path).await }.boxed()
}

async fn walk(scope: Scope, registry: Arc<Registry>, key: Key, path: ResolutionPath) -> DiResult<AnyArc> {
    scope.ensure_open()?;

    if let Some(value) = scope.seeded(&key) {
        tracing::trace!(key = %key, level = %scope.level(), "seeded");
        return Ok(value);
    }

    let provider = registry.lookup(&key, scope.level())?.clone();
    let owner = scope
        .ancestor_at(provider.level())
        .cloned()
        .ok_or(DiError::MissingProvider {
            key: key.display_name(),
            level: scope.level(),
        })?;
    owner.ensure_open()?;

    let shared = owner.shared().clone();
    let level = owner.level();
    let path = path.enter(provider.primary_key(), owner.id(), shared.options.max_depth)?;
    shared.observers.resolving(&key, level);

    let cached = provider.cache_policy() == CachePolicy::Cached;
    if cached {
        if let Some(value) = owner.cached(provider.id()) {
            tracing::trace!(key = %key, %level, "cache hit");
            return provider.project(&key, &value);
        }
    }

    // Single flight: one construction per provider per owning scope.
    let _guard = if cached {
        Some(owner.construction_lock(provider.id()).lock_owned().await)
    } else {
        None
    };
    owner.ensure_open()?;
    if cached {
        if let Some(value) = owner.cached(provider.id()) {
            tracing::trace!(key = %key, %level, "constructed while waiting");
            return provider.project(&key, &value);
        }
    }

    let deps = resolve_dependencies(&owner, &registry, provider.dependencies(), &path).await?;

    let started = Instant::now();
    let constructed = match provider.invoke(deps).await {
        Ok(constructed) => constructed,
        Err(source) => {
            let error = DiError::Construction {
                key: provider.name(),
                source,
            };
            shared.observers.construction_failed(&key, level, &error);
            return Err(error);
        }
    };
    let elapsed = started.elapsed();
    shared.observers.constructed(&key, level, elapsed);
    tracing::debug!(
        provider = provider.name(),
        %level,
        elapsed_us = elapsed.as_micros() as u64,
        "constructed"
    );

    let action = constructed.release.map(|release| ReleaseAction {
        key: provider.name(),
        release,
    });
    let value = cached.then(|| constructed.value.clone());
    if let Adopted::Rejected(action) = owner.adopt(provider.id(), value, action) {
        // The owner closed while the factory ran.
        if let Some(action) = action {
            if let Err(failure) = action.run().await {
                tracing::warn!(provider = failure.key, error = %failure.error, "release action failed");
            }
        }
        return Err(DiError::ScopeClosed { level });
    }
    provider.project(&key, &constructed.value)
}

async fn resolve_dependencies(
    owner: &Scope,
    registry: &Arc<Registry>,
    keys: &[Key],
    path: &ResolutionPath,
) -> DiResult<Deps> {
    let requests = keys
        .iter()
        .map(|key| resolve_key(owner.clone(), registry.clone(), *key, path.clone()));

    let values = if owner.shared().options.concurrent_fanout {
        try_join_all(requests).await?
    } else {
        let mut values = Vec::with_capacity(keys.len());
        for request in requests {
            values.push(request.await?);
        }
        values
    };

    Ok(Deps::new(keys.iter().copied().zip(values).collect()))
}

/// Walks the provider graph reachable from `key` without constructing
/// anything.
///
/// Fails with `Cycle`, `MissingProvider` or `DepthExceeded` exactly where the
/// walk itself would. Values already cached are not descended into.
pub(crate) fn precheck(scope: &Scope, registry: &Registry, key: Key) -> DiResult<()> {
    let mut check = Precheck {
        registry,
        max_depth: scope.shared().options.max_depth,
        stack: Vec::new(),
        done: HashSet::new(),
    };
    check.visit(scope, key)
}

struct Precheck<'a> {
    registry: &'a Registry,
    max_depth: usize,
    stack: Vec<(Key, Level)>,
    done: HashSet<(Key, Level)>,
}

impl Precheck<'_> {
    fn visit(&mut self, scope: &Scope, key: Key) -> DiResult<()> {
        if scope.seeded(&key).is_some() {
            return Ok(());
        }

        let provider = self.registry.lookup(&key, scope.level())?;
        let Some(owner) = scope.ancestor_at(provider.level()) else {
            return Err(DiError::MissingProvider {
                key: key.display_name(),
                level: scope.level(),
            });
        };
        let marker = (provider.primary_key(), owner.level());

        if self.done.contains(&marker) {
            return Ok(());
        }
        if let Some(start) = self.stack.iter().position(|m| *m == marker) {
            let mut path: Vec<&'static str> = self.stack[start..].iter().map(|(k, _)| k.display_name()).collect();
            path.push(marker.0.display_name());
            return Err(DiError::Cycle { path });
        }
        if self.stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.stack.len()));
        }
        if provider.cache_policy() == CachePolicy::Cached && owner.cached(provider.id()).is_some() {
            self.done.insert(marker);
            return Ok(());
        }

        self.stack.push(marker);
        for dependency in provider.dependencies() {
            self.visit(owner, *dependency)?;
        }
        self.stack.pop();
        self.done.insert(marker);
        Ok(())
    }
}
