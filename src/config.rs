//! Resolver configuration.
//!
//! Options come from code, from `TIERED_DI_*` environment variables, or (with
//! the `config` feature) from JSON.

use std::env;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default limit on the length of a dependency chain.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

pub const ENV_MAX_DEPTH: &str = "TIERED_DI_MAX_DEPTH";
pub const ENV_CONCURRENT_FANOUT: &str = "TIERED_DI_CONCURRENT_FANOUT";
pub const ENV_WARN_ON_UNRELEASED: &str = "TIERED_DI_WARN_ON_UNRELEASED";

/// Tunables for a [`Resolver`](crate::Resolver).
///
/// # Examples
///
/// ```
/// use tiered_di::{Resolver, ResolverOptions};
///
/// let options = ResolverOptions::default()
///     .max_depth(64)
///     .concurrent_fanout(false);
/// let resolver = Resolver::builder().options(options).build().unwrap();
/// assert_eq!(resolver.options().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ResolverOptions {
    /// Longest dependency chain a single resolution may walk.
    pub max_depth: usize,
    /// Resolve a signature's parameters and a provider's dependencies
    /// concurrently. When off, they are resolved one after another in
    /// declaration order.
    pub concurrent_fanout: bool,
    /// Log a warning when a scope is dropped with resources still pending
    /// release.
    pub warn_on_unreleased: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            concurrent_fanout: true,
            warn_on_unreleased: true,
        }
    }
}

impl ResolverOptions {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn concurrent_fanout(mut self, enabled: bool) -> Self {
        self.concurrent_fanout = enabled;
        self
    }

    pub fn warn_on_unreleased(mut self, enabled: bool) -> Self {
        self.warn_on_unreleased = enabled;
        self
    }

    /// Defaults overridden by any `TIERED_DI_*` variable that is set.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_depth: env_or(ENV_MAX_DEPTH, defaults.max_depth),
            concurrent_fanout: env_or(ENV_CONCURRENT_FANOUT, defaults.concurrent_fanout),
            warn_on_unreleased: env_or(ENV_WARN_ON_UNRELEASED, defaults.warn_on_unreleased),
        }
    }

    /// Parses options from JSON. Missing fields keep their defaults.
    ///
    /// ```
    /// # #[cfg(feature = "config")]
    /// # {
    /// use tiered_di::ResolverOptions;
    ///
    /// let options = ResolverOptions::from_json(r#"{ "max_depth": 32 }"#).unwrap();
    /// assert_eq!(options.max_depth, 32);
    /// assert!(options.concurrent_fanout);
    /// # }
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn env_or<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(variable = name, value = %raw, "ignoring unparsable resolver option");
                default
            }
        },
        Err(_) => default,
    }
}
