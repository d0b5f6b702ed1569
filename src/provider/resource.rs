//! Resources: values paired with a release action.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::BoxError;
use crate::internal::ReleaseFn;
use crate::traits::{AsyncDispose, Dispose};

enum Release<T> {
    Sync(Box<dyn FnOnce(Arc<T>) -> Result<(), BoxError> + Send>),
    Async(Box<dyn FnOnce(Arc<T>) -> BoxFuture<'static, Result<(), BoxError>> + Send>),
}

/// A value produced by a resource provider, together with the action that
/// releases it.
///
/// The release action runs when the scope that owns the value closes, after
/// every resource that completed later in the same scope has been released.
/// It receives the shared instance, so the value stays alive until then.
///
/// # Examples
///
/// ```
/// use tiered_di::{Provider, Resource};
/// use std::sync::Arc;
///
/// struct Connection { open: std::sync::atomic::AtomicBool }
///
/// let provider = Provider::resource(|()| {
///     let conn = Connection { open: true.into() };
///     Ok(Resource::new(conn, |conn: Arc<Connection>| {
///         conn.open.store(false, std::sync::atomic::Ordering::SeqCst);
///         Ok(())
///     }))
/// });
/// ```
pub struct Resource<T> {
    value: T,
    release: Release<T>,
}

impl<T: Send + Sync + 'static> Resource<T> {
    /// Pairs `value` with a synchronous release action.
    pub fn new<F>(value: T, release: F) -> Self
    where
        F: FnOnce(Arc<T>) -> Result<(), BoxError> + Send + 'static,
    {
        Self {
            value,
            release: Release::Sync(Box::new(release)),
        }
    }

    /// Pairs `value` with an asynchronous release action.
    pub fn new_async<F, Fut>(value: T, release: F) -> Self
    where
        F: FnOnce(Arc<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            value,
            release: Release::Async(Box::new(move |v| -> BoxFuture<'static, Result<(), BoxError>> { Box::pin(release(v)) })),
        }
    }

    /// Releases through [`Dispose::dispose`].
    pub fn disposable(value: T) -> Self
    where
        T: Dispose,
    {
        Self::new(value, |v: Arc<T>| v.dispose())
    }

    /// Releases through [`AsyncDispose::dispose`].
    pub fn async_disposable(value: T) -> Self
    where
        T: AsyncDispose,
    {
        Self {
            value,
            release: Release::Async(Box::new(|v: Arc<T>| -> BoxFuture<'static, Result<(), BoxError>> {
                Box::pin(async move { v.dispose().await })
            })),
        }
    }

    /// The wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Shares the value and binds the release action to it.
    pub(crate) fn into_parts(self) -> (Arc<T>, ReleaseFn) {
        let value = Arc::new(self.value);
        let bound = value.clone();
        let release = match self.release {
            Release::Sync(f) => ReleaseFn::Sync(Box::new(move || f(bound))),
            Release::Async(f) => ReleaseFn::Async(Box::new(move || f(bound))),
        };
        (value, release)
    }
}
