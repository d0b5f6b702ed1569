//! # tiered-di
//!
//! Typed dependency resolution with levels, scopes and deterministic teardown.
//!
//! ## Features
//!
//! - **Levels**: every provider lives at an integer level; level 1 is the root
//!   and each child scope sits one level higher
//! - **Single instance per scope**: a provider runs at most once per owning
//!   scope, even under concurrent requests
//! - **Async throughout**: factories may suspend, and independent dependencies
//!   resolve concurrently
//! - **Structural checks**: conflicts and level-order violations fail at
//!   registration, cycles fail before any factory runs
//! - **LIFO teardown**: resources release in reverse completion order when
//!   their scope closes
//!
//! ## Quick Start
//!
//! ```rust
//! use tiered_di::{BoxError, Provider, Resolver, Resource, signature};
//! use std::sync::Arc;
//!
//! struct Config { dsn: String }
//! struct Database { dsn: String }
//! struct Session { user: u64 }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), BoxError> {
//! let resolver = Resolver::builder()
//!     .add_provider(Provider::instance(Config { dsn: "postgres://localhost".into() }))
//!     .add_provider(Provider::resource(|(config,): (Arc<Config>,)| {
//!         let db = Database { dsn: config.dsn.clone() };
//!         Ok(Resource::new(db, |_db| Ok(())))
//!     }))
//!     .add_provider(
//!         Provider::value_async(|(_db,): (Arc<Database>,)| async move {
//!             Ok::<_, BoxError>(Session { user: 42 })
//!         })
//!         .at_level(2),
//!     )
//!     .build()?;
//!
//! // One child scope per request.
//! let request = resolver.child_scope(resolver.root_scope())?;
//! let resolved = request.resolve(&signature!(session: Session, db: Database)).await?;
//! assert_eq!(resolved.get::<Session>("session")?.user, 42);
//! assert_eq!(resolved.get::<Database>("db")?.dsn, "postgres://localhost");
//! request.close().await?;
//!
//! // Level-1 resources are released on shutdown.
//! resolver.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Trait objects
//!
//! A provider can answer for trait objects its value implements:
//!
//! ```rust
//! use tiered_di::{Provider, Resolver};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct Fixed;
//! impl Clock for Fixed {
//!     fn now(&self) -> u64 { 1_700_000_000 }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let resolver = Resolver::builder()
//!     .add_provider(Provider::value(|()| Ok(Fixed)).covers::<dyn Clock>(|c| c as Arc<dyn Clock>))
//!     .build()
//!     .unwrap();
//!
//! let clock = resolver.root_scope().get::<dyn Clock>().await.unwrap();
//! assert_eq!(clock.now(), 1_700_000_000);
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate logs through `tracing`: construction and scope closes at
//! `debug`, cache hits at `trace`, failed releases and scopes dropped with
//! pending resources at `warn`. Install any subscriber to see them.

pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod level;
pub mod observer;
pub mod provider;
pub mod resolver;
pub mod signature;
pub mod traits;

mod coverage;
mod internal;
mod registry;

pub use config::ResolverOptions;
pub use descriptors::ProviderDescriptor;
pub use error::{BoxError, DiError, DiResult, ReleaseFailure, TeardownFailures};
pub use key::{key_of_type, Key};
pub use level::Level;
pub use observer::{ResolutionObserver, TracingObserver};
pub use provider::{CachePolicy, DepList, Deps, ExecutionMode, Provider, ProviderBuilder, ProviderKind, Resource};
pub use resolver::{Resolved, Resolver, ResolverBuilder, Scope, Seeds};
pub use signature::{Injectable, Param, ParamKind, Signature};
pub use traits::{AsyncDispose, Dispose};
