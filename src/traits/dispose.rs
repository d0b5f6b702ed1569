//! Disposal traits for resource cleanup.

use crate::error::BoxError;

/// Trait for synchronous resource disposal.
///
/// Implement this for values handed out by resource providers that need
/// structured teardown (flushing caches, closing connections). Wrap the value
/// with [`Resource::disposable`](crate::Resource::disposable) and the owning
/// scope calls `dispose` when it closes, in LIFO order with every other
/// release action of that scope.
///
/// # Examples
///
/// ```
/// use tiered_di::{BoxError, Dispose, Provider, Resource};
///
/// struct Cache {
///     name: String,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) -> Result<(), BoxError> {
///         println!("Flushing cache: {}", self.name);
///         Ok(())
///     }
/// }
///
/// let provider = Provider::resource(|()| {
///     Ok(Resource::disposable(Cache { name: "user_cache".to_string() }))
/// })
/// .at_level(2);
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self) -> Result<(), BoxError>;
}

/// Trait for asynchronous resource disposal.
///
/// Implement this for values that require async teardown (graceful
/// connection shutdown, async I/O cleanup). Wrap the value with
/// [`Resource::async_disposable`](crate::Resource::async_disposable).
///
/// # Examples
///
/// ```
/// use tiered_di::{AsyncDispose, BoxError, Provider, Resource};
/// use async_trait::async_trait;
///
/// struct DatabaseClient {
///     connection_id: String,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for DatabaseClient {
///     async fn dispose(&self) -> Result<(), BoxError> {
///         println!("Closing database connection: {}", self.connection_id);
///         Ok(())
///     }
/// }
///
/// let provider = Provider::resource_async(|()| async {
///     Ok::<_, BoxError>(Resource::async_disposable(DatabaseClient {
///         connection_id: "conn_123".to_string(),
///     }))
/// });
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self) -> Result<(), BoxError>;
}
