//! Internal teardown stack for scope-owned resources.

use futures::future::BoxFuture;

use crate::error::{BoxError, ReleaseFailure};

pub(crate) enum ReleaseFn {
    Sync(Box<dyn FnOnce() -> Result<(), BoxError> + Send>),
    Async(Box<dyn FnOnce() -> BoxFuture<'static, Result<(), BoxError>> + Send>),
}

/// A release action paired with the provider that produced the resource.
pub(crate) struct ReleaseAction {
    pub(crate) key: &'static str,
    pub(crate) release: ReleaseFn,
}

impl ReleaseAction {
    pub(crate) async fn run(self) -> Result<(), ReleaseFailure> {
        let key = self.key;
        let result = match self.release {
            ReleaseFn::Sync(f) => (f)(),
            ReleaseFn::Async(f) => (f)().await,
        };
        result.map_err(|error| ReleaseFailure { key, error })
    }
}

/// Release actions in completion order.
///
/// Unlike a split sync/async bag, sync and async releases share one stack so
/// the LIFO order holds across both kinds.
#[derive(Default)]
pub(crate) struct DisposeBag {
    stack: Vec<ReleaseAction>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, action: ReleaseAction) {
        self.stack.push(action);
    }

    /// Takes every pending action, last pushed first.
    pub(crate) fn drain_reverse(&mut self) -> Vec<ReleaseAction> {
        let mut actions = std::mem::take(&mut self.stack);
        actions.reverse();
        actions
    }

    pub(crate) fn len(&self) -> usize {
        self.stack.len()
    }
}
