/// Full application integration test
///
/// Models a small service: an application-wide configuration and database,
/// a per-request user, and request handlers resolved per request.

use tiered_di::{
    signature, BoxError, DiError, Injectable, Provider, ResolutionObserver, Resolver, Resource,
    Seeds, Signature, Key, Level,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct Config {
    dsn: String,
}

#[derive(Debug)]
struct Database {
    dsn: String,
    connected: Mutex<bool>,
}

#[derive(Debug)]
struct User {
    name: String,
    db: Arc<Database>,
}

struct UserId(u64);

trait Repository: Send + Sync {
    fn find(&self, id: u64) -> String;
}

impl Repository for Database {
    fn find(&self, id: u64) -> String {
        format!("user-{id}@{}", self.dsn)
    }
}

struct ShowProfile;

impl Injectable for ShowProfile {
    fn signature(&self) -> Signature {
        signature!(user: User, repo: dyn Repository, format)
    }
}

#[derive(Default)]
struct Counting {
    constructed: AtomicUsize,
    released: AtomicUsize,
}

impl ResolutionObserver for Counting {
    fn constructed(&self, _key: &Key, _level: Level, _elapsed: Duration) {
        self.constructed.fetch_add(1, Ordering::SeqCst);
    }

    fn released(&self, _provider: &'static str, _level: Level, _succeeded: bool) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn application(observer: Arc<Counting>, db_calls: Arc<AtomicUsize>) -> Resolver {
    Resolver::builder()
        .observer(observer)
        .add_provider(Provider::value(|()| {
            Ok(Config {
                dsn: "postgres://localhost/app".to_string(),
            })
        }))
        .add_provider(
            Provider::resource_async(move |(config,): (Arc<Config>,)| {
                let calls = db_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    let db = Database {
                        dsn: config.dsn.clone(),
                        connected: Mutex::new(true),
                    };
                    Ok::<_, BoxError>(Resource::new(db, |db: Arc<Database>| {
                        *db.connected.lock().unwrap() = false;
                        Ok(())
                    }))
                }
            })
            .covers::<dyn Repository>(|db| db as Arc<dyn Repository>),
        )
        .add_provider(
            Provider::value_async(|(db, id): (Arc<Database>, Arc<UserId>)| async move {
                Ok::<_, BoxError>(User {
                    name: format!("user-{}", id.0),
                    db,
                })
            })
            .at_level(2),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_config_database_user_scenario() {
    let observer = Arc::new(Counting::default());
    let db_calls = Arc::new(AtomicUsize::new(0));
    let resolver = application(observer.clone(), db_calls.clone());

    let mut databases = Vec::new();
    for id in [1u64, 2] {
        let request = resolver
            .child_scope_with(resolver.root_scope(), Seeds::new().with(UserId(id)))
            .unwrap();
        let resolved = resolver.resolve(&request, &ShowProfile).await.unwrap();

        let user = resolved.get::<User>("user").unwrap();
        let repo = resolved.get::<dyn Repository>("repo").unwrap();
        assert_eq!(user.name, format!("user-{id}"));
        assert_eq!(repo.find(id), format!("user-{id}@postgres://localhost/app"));
        assert!(!resolved.contains("format"));

        databases.push(user.db.clone());
        request.close().await.unwrap();
    }

    // Two requests, two users, one database.
    assert!(Arc::ptr_eq(&databases[0], &databases[1]));
    assert_eq!(db_calls.load(Ordering::SeqCst), 1);
    assert!(*databases[0].connected.lock().unwrap());

    resolver.shutdown().await.unwrap();
    assert!(!*databases[0].connected.lock().unwrap());

    // Config, Database, and one User per request.
    assert_eq!(observer.constructed.load(Ordering::SeqCst), 4);
    assert_eq!(observer.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_user_is_not_resolvable_at_root() {
    let resolver = application(Arc::new(Counting::default()), Arc::new(AtomicUsize::new(0)));
    let err = resolver
        .resolve(resolver.root_scope(), &ShowProfile)
        .await
        .unwrap_err();
    assert!(matches!(err, DiError::MissingProvider { .. }));
}

#[tokio::test]
async fn test_resolve_in_child_per_request() {
    let db_calls = Arc::new(AtomicUsize::new(0));
    let resolver = application(Arc::new(Counting::default()), db_calls.clone());

    for id in 0..5u64 {
        let name = resolver
            .resolve_in_child_with(
                resolver.root_scope(),
                Seeds::new().with(UserId(id)),
                &ShowProfile,
                |resolved| async move { resolved.get::<User>("user").map(|u| u.name.clone()) },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(name, format!("user-{id}"));
    }
    assert_eq!(db_calls.load(Ordering::SeqCst), 1);

    let descriptors = resolver.descriptors();
    assert_eq!(descriptors.len(), 3);
    let user = descriptors.iter().find(|d| d.name.ends_with("User")).unwrap();
    assert_eq!(user.unprovided(), vec![Key::of::<UserId>()]);
}
