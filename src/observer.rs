//! Diagnostic observers for resolution events.
//!
//! Observers are registered on [`ResolverBuilder::observer`](crate::ResolverBuilder::observer)
//! and are notified synchronously from the walker. Keep implementations
//! lightweight; queue expensive work elsewhere.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;
use crate::level::Level;

/// Observer trait for resolution events.
///
/// Every method has an empty default, so implementations override only what
/// they need.
///
/// # Examples
///
/// ```
/// use tiered_di::{Key, Level, ResolutionObserver, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counting {
///     constructed: AtomicUsize,
/// }
///
/// impl ResolutionObserver for Counting {
///     fn constructed(&self, _key: &Key, _level: Level, _elapsed: Duration) {
///         self.constructed.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let resolver = Resolver::builder()
///     .observer(Arc::new(Counting::default()))
///     .build()
///     .unwrap();
/// ```
pub trait ResolutionObserver: Send + Sync {
    /// A key is about to be resolved in a scope at `level`.
    fn resolving(&self, _key: &Key, _level: Level) {}

    /// A factory completed. `elapsed` covers the factory call only.
    fn constructed(&self, _key: &Key, _level: Level, _elapsed: Duration) {}

    /// A factory returned an error.
    fn construction_failed(&self, _key: &Key, _level: Level, _error: &DiError) {}

    /// A release action ran while closing a scope at `level`.
    fn released(&self, _provider: &'static str, _level: Level, _succeeded: bool) {}
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ResolutionObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key, level: Level) {
        for observer in &self.observers {
            observer.resolving(key, level);
        }
    }

    #[inline]
    pub(crate) fn constructed(&self, key: &Key, level: Level, elapsed: Duration) {
        for observer in &self.observers {
            observer.constructed(key, level, elapsed);
        }
    }

    #[inline]
    pub(crate) fn construction_failed(&self, key: &Key, level: Level, error: &DiError) {
        for observer in &self.observers {
            observer.construction_failed(key, level, error);
        }
    }

    #[inline]
    pub(crate) fn released(&self, provider: &'static str, level: Level, succeeded: bool) {
        for observer in &self.observers {
            observer.released(provider, level, succeeded);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Events are emitted under the `tiered_di::observer` target so they can be
/// filtered apart from the crate's own diagnostics.
///
/// ```
/// use tiered_di::{Resolver, TracingObserver};
/// use std::sync::Arc;
///
/// let resolver = Resolver::builder()
///     .observer(Arc::new(TracingObserver::new()))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver {
    _private: (),
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResolutionObserver for TracingObserver {
    fn resolving(&self, key: &Key, level: Level) {
        tracing::trace!(target: "tiered_di::observer", key = %key, %level, "resolving");
    }

    fn constructed(&self, key: &Key, level: Level, elapsed: Duration) {
        tracing::debug!(
            target: "tiered_di::observer",
            key = %key,
            %level,
            elapsed_us = elapsed.as_micros() as u64,
            "constructed"
        );
    }

    fn construction_failed(&self, key: &Key, level: Level, error: &DiError) {
        tracing::warn!(target: "tiered_di::observer", key = %key, %level, %error, "construction failed");
    }

    fn released(&self, provider: &'static str, level: Level, succeeded: bool) {
        tracing::debug!(target: "tiered_di::observer", provider, %level, succeeded, "released");
    }
}
