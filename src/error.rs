//! Error types for the resolution engine.

use std::fmt;

use thiserror::Error;

use crate::level::Level;

/// Boxed error returned by factories and release actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency resolution errors
///
/// Structural errors (`LevelOrder`, `Conflict`, `InvalidProvider`) are raised
/// when providers are registered. Everything else is raised by the operation
/// that triggered it: a resolution or a scope exit. Nothing is retried
/// internally.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{DiError, Level};
///
/// let missing = DiError::MissingProvider { key: "app::User", level: Level::ROOT };
/// assert_eq!(missing.to_string(), "no provider for app::User at level 1");
///
/// let cycle = DiError::Cycle { path: vec!["A", "B", "A"] };
/// assert_eq!(cycle.to_string(), "circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// No provider satisfies the key at the requesting level.
    #[error("no provider for {key} at level {level}")]
    MissingProvider { key: &'static str, level: Level },

    /// A provider depends on a key that is only provided above its own level.
    #[error(
        "{provider} (level {provider_level}) depends on {dependency}, \
         which is only provided at level {available_level}"
    )]
    LevelOrder {
        provider: &'static str,
        provider_level: Level,
        dependency: &'static str,
        available_level: Level,
    },

    /// Mutual or self dependency found while resolving.
    #[error("circular dependency: {}", path.join(" -> "))]
    Cycle { path: Vec<&'static str> },

    /// Two providers bound to the same key at the same level.
    #[error("conflicting providers for {key} at level {level}")]
    Conflict { key: &'static str, level: Level },

    /// A factory failed.
    #[error("provider for {key} failed")]
    Construction {
        key: &'static str,
        #[source]
        source: BoxError,
    },

    /// One or more release actions failed during scope exit.
    #[error(transparent)]
    Teardown(#[from] TeardownFailures),

    /// The provider definition itself is malformed.
    #[error("invalid provider for {key}: {reason}")]
    InvalidProvider { key: &'static str, reason: String },

    /// Providers were added after the first resolution.
    #[error("registration is closed once resolution has started")]
    RegistrationClosed,

    /// The scope (or the ancestor owning the value) was already closed.
    #[error("scope at level {level} is closed")]
    ScopeClosed { level: Level },

    /// A stored value could not be downcast to the requested type.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },

    /// `Resolved::get` was asked for a parameter that was not injected.
    #[error("no resolved argument named `{name}`")]
    MissingArgument { name: String },

    /// Dependency chain deeper than the configured limit.
    #[error("max depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    /// True for errors that describe the shape of the provider graph rather
    /// than a runtime failure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DiError::LevelOrder { .. }
                | DiError::Cycle { .. }
                | DiError::Conflict { .. }
                | DiError::InvalidProvider { .. }
        )
    }
}

/// A single failed release action.
#[derive(Debug)]
pub struct ReleaseFailure {
    /// The provider whose resource failed to release.
    pub key: &'static str,
    /// What the release action returned.
    pub error: BoxError,
}

/// Every release failure collected during one scope exit.
#[derive(Debug, Error)]
pub struct TeardownFailures {
    pub failures: Vec<ReleaseFailure>,
}

impl fmt::Display for TeardownFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} release action(s) failed during teardown", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.key, failure.error)?;
        }
        Ok(())
    }
}

/// Result type for resolution operations.
pub type DiResult<T> = Result<T, DiError>;
