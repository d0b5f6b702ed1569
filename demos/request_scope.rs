//! A request-scoped service wired through a resolver.
//!
//! Run with `RUST_LOG=tiered_di=debug cargo run --example request_scope` to
//! watch construction and teardown.

use std::sync::Arc;

use tiered_di::{
    signature, AsyncDispose, BoxError, Injectable, Provider, Resolver, Resource, Seeds, Signature,
    TracingObserver,
};
use tracing_subscriber::EnvFilter;

struct Config {
    dsn: String,
}

struct Database {
    dsn: String,
}

#[async_trait::async_trait]
impl AsyncDispose for Database {
    async fn dispose(&self) -> Result<(), BoxError> {
        tracing::info!(dsn = %self.dsn, "closing database");
        Ok(())
    }
}

struct UserId(u64);

struct User {
    id: u64,
    name: String,
}

struct ShowUser;

impl Injectable for ShowUser {
    fn signature(&self) -> Signature {
        signature!(user: User, db: Database)
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let resolver = Resolver::builder()
        .observer(Arc::new(TracingObserver::new()))
        .add_provider(Provider::instance(Config {
            dsn: "postgres://localhost/demo".to_string(),
        }))
        .add_provider(Provider::resource_async(|(config,): (Arc<Config>,)| async move {
            tracing::info!(dsn = %config.dsn, "connecting");
            Ok::<_, BoxError>(Resource::async_disposable(Database {
                dsn: config.dsn.clone(),
            }))
        }))
        .add_provider(
            Provider::value(|(id, _db): (Arc<UserId>, Arc<Database>)| {
                Ok(User {
                    id: id.0,
                    name: format!("user-{}", id.0),
                })
            })
            .at_level(2),
        )
        .build()?;

    for id in 1..=3 {
        let line = resolver
            .resolve_in_child_with(
                resolver.root_scope(),
                Seeds::new().with(UserId(id)),
                &ShowUser,
                |resolved| async move {
                    let user = resolved.get::<User>("user")?;
                    let db = resolved.get::<Database>("db")?;
                    Ok::<_, BoxError>(format!("{} ({}) via {}", user.name, user.id, db.dsn))
                },
            )
            .await??;
        tracing::info!("{line}");
    }

    resolver.shutdown().await?;
    Ok(())
}
