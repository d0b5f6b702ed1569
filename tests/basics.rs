use tiered_di::{
    signature, BoxError, CachePolicy, DiError, Injectable, Provider, Resolver, Seeds, Signature,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Config {
    port: u16,
}

#[derive(Debug)]
struct Server {
    config: Arc<Config>,
    name: String,
}

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

#[tokio::test]
async fn test_instance_is_shared() {
    let resolver = Resolver::builder()
        .add_provider(Provider::instance(42usize))
        .add_provider(Provider::instance("hello".to_string()))
        .build()
        .unwrap();
    let root = resolver.root_scope();

    let num1 = root.get::<usize>().await.unwrap();
    let num2 = root.get::<usize>().await.unwrap();
    let str1 = root.get::<String>().await.unwrap();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
}

#[tokio::test]
async fn test_factory_with_dependencies() {
    let resolver = Resolver::builder()
        .add_provider(Provider::instance(Config { port: 8080 }))
        .add_provider(Provider::value(|(config,): (Arc<Config>,)| {
            Ok(Server {
                config,
                name: "MyServer".to_string(),
            })
        }))
        .build()
        .unwrap();

    let server = resolver.root_scope().get::<Server>().await.unwrap();
    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[tokio::test]
async fn test_factory_runs_once_per_scope() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let resolver = Resolver::builder()
        .add_provider(Provider::value(move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Config { port: 1 })
        }))
        .build()
        .unwrap();

    let root = resolver.root_scope();
    let a = root.get::<Config>().await.unwrap();
    let b = root.get::<Config>().await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_never_cache_runs_on_every_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let provider = Provider::value(move |()| Ok(counter.fetch_add(1, Ordering::SeqCst)))
        .never_cache()
        .build();
    assert_eq!(provider.cache_policy(), CachePolicy::NeverCache);

    let resolver = Resolver::builder().add_provider(provider).build().unwrap();
    let root = resolver.root_scope();

    assert_eq!(*root.get::<usize>().await.unwrap(), 0);
    assert_eq!(*root.get::<usize>().await.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_async_factory() {
    let resolver = Resolver::builder()
        .add_provider(Provider::instance(Config { port: 443 }))
        .add_provider(Provider::value_async(|(config,): (Arc<Config>,)| async move {
            tokio::task::yield_now().await;
            Ok::<_, BoxError>(Server {
                config,
                name: "tls".to_string(),
            })
        }))
        .build()
        .unwrap();

    let server = resolver.root_scope().get::<Server>().await.unwrap();
    assert_eq!(server.config.port, 443);
}

#[tokio::test]
async fn test_trait_object_coverage_shares_instance() {
    let resolver = Resolver::builder()
        .add_provider(Provider::value(|()| Ok(English)).covers::<dyn Greeter>(|e| e as Arc<dyn Greeter>))
        .build()
        .unwrap();
    let root = resolver.root_scope();

    let greeter = root.get::<dyn Greeter>().await.unwrap();
    let concrete = root.get::<English>().await.unwrap();
    assert_eq!(greeter.greet(), "hello");
    assert!(std::ptr::eq(
        Arc::as_ptr(&greeter) as *const u8,
        Arc::as_ptr(&concrete) as *const u8
    ));
}

#[tokio::test]
async fn test_only_covers_hides_concrete_type() {
    let resolver = Resolver::builder()
        .add_provider(Provider::value(|()| Ok(English)).only_covers::<dyn Greeter>(|e| e as Arc<dyn Greeter>))
        .build()
        .unwrap();
    let root = resolver.root_scope();

    assert!(root.get::<dyn Greeter>().await.is_ok());
    assert!(matches!(
        root.get::<English>().await,
        Err(DiError::MissingProvider { .. })
    ));
}

#[tokio::test]
async fn test_supertypes_can_be_excluded() {
    let resolver = Resolver::builder()
        .add_provider(
            Provider::value(|()| Ok(English))
                .covers::<dyn Greeter>(|e| e as Arc<dyn Greeter>)
                .include_supertypes(false),
        )
        .build()
        .unwrap();

    assert!(resolver.root_scope().get::<dyn Greeter>().await.is_err());
}

#[tokio::test]
async fn test_missing_provider() {
    let resolver = Resolver::new();
    match resolver.root_scope().get::<Config>().await {
        Err(DiError::MissingProvider { key, level }) => {
            assert!(key.ends_with("Config"));
            assert_eq!(level.get(), 1);
        }
        other => panic!("expected MissingProvider, got {other:?}"),
    }
}

#[tokio::test]
async fn test_construction_error_carries_source() {
    let resolver = Resolver::builder()
        .add_provider(Provider::value(|()| -> Result<Config, BoxError> {
            Err("port already in use".into())
        }))
        .build()
        .unwrap();

    let err = resolver.root_scope().get::<Config>().await.unwrap_err();
    match &err {
        DiError::Construction { key, source } => {
            assert!(key.ends_with("Config"));
            assert_eq!(source.to_string(), "port already in use");
        }
        other => panic!("expected Construction, got {other:?}"),
    }
    assert!(!err.is_structural());
}

#[tokio::test]
async fn test_resolve_signature_skips_untyped() {
    let resolver = Resolver::builder()
        .add_provider(Provider::instance(Config { port: 80 }))
        .build()
        .unwrap();

    let resolved = resolver
        .resolve(resolver.root_scope(), &signature!(request, config: Config))
        .await
        .unwrap();

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved.names().collect::<Vec<_>>(), vec!["config"]);
    assert_eq!(resolved.get::<Config>("config").unwrap().port, 80);
    assert!(matches!(
        resolved.get::<Config>("request"),
        Err(DiError::MissingArgument { .. })
    ));
    assert!(matches!(
        resolved.get::<Server>("config"),
        Err(DiError::TypeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_optional_parameter_is_omitted_when_unprovided() {
    let resolver = Resolver::builder()
        .add_provider(Provider::instance(Config { port: 80 }))
        .build()
        .unwrap();

    let sig = Signature::new()
        .param::<Config>("config")
        .optional::<Server>("server")
        .optional::<dyn Greeter>("greeter");
    let resolved = resolver.resolve(resolver.root_scope(), &sig).await.unwrap();

    assert!(resolved.contains("config"));
    assert!(!resolved.contains("server"));
    assert!(!resolved.contains("greeter"));
}

#[tokio::test]
async fn test_optional_parameter_does_not_hide_failures() {
    let resolver = Resolver::builder()
        .add_provider(Provider::value(|()| -> Result<Config, BoxError> { Err("boom".into()) }))
        .build()
        .unwrap();

    let sig = Signature::new().optional::<Config>("config");
    let err = resolver.resolve(resolver.root_scope(), &sig).await.unwrap_err();
    assert!(matches!(err, DiError::Construction { .. }));
}

#[tokio::test]
async fn test_injectable_handler() {
    struct Handler;

    impl Injectable for Handler {
        fn signature(&self) -> Signature {
            signature!(config: Config, server: Server)
        }
    }

    let resolver = Resolver::builder()
        .add_provider(Provider::instance(Config { port: 3000 }))
        .add_provider(Provider::value(|(config,): (Arc<Config>,)| {
            Ok(Server {
                config,
                name: "api".to_string(),
            })
        }))
        .build()
        .unwrap();

    let resolved = resolver.resolve(resolver.root_scope(), &Handler).await.unwrap();
    let config = resolved.get::<Config>("config").unwrap();
    let server = resolved.get::<Server>("server").unwrap();
    assert!(Arc::ptr_eq(&config, &server.config));
}

#[tokio::test]
async fn test_root_seeds_answer_ahead_of_providers() {
    let resolver = Resolver::builder()
        .seeds(Seeds::new().with(Config { port: 9 }))
        .add_provider(Provider::value(|(config,): (Arc<Config>,)| {
            Ok(Server {
                config,
                name: "seeded".to_string(),
            })
        }))
        .build()
        .unwrap();

    let server = resolver.root_scope().get::<Server>().await.unwrap();
    assert_eq!(server.config.port, 9);
}

#[tokio::test]
async fn test_registration_closes_after_first_resolution() {
    let resolver = Resolver::new();
    resolver.add_provider(Provider::instance(Config { port: 1 })).unwrap();
    assert!(!resolver.is_sealed());

    resolver.root_scope().get::<Config>().await.unwrap();
    assert!(resolver.is_sealed());

    let err = resolver.add_provider(Provider::instance(7u8)).unwrap_err();
    assert!(matches!(err, DiError::RegistrationClosed));
    assert_eq!(resolver.provider_count(), 1);
}

#[test]
fn test_conflicting_providers_fail_build() {
    let err = Resolver::builder()
        .add_provider(Provider::instance(Config { port: 1 }))
        .add_provider(Provider::instance(Config { port: 2 }))
        .build()
        .unwrap_err();
    assert!(matches!(err, DiError::Conflict { .. }));
    assert!(err.is_structural());
}

#[test]
fn test_add_providers_is_atomic() {
    let resolver = Resolver::new();
    let err = resolver
        .add_providers([
            Provider::instance(Config { port: 1 }).build(),
            Provider::instance(7u8).at_level(0).build(),
        ])
        .unwrap_err();
    assert!(matches!(err, DiError::InvalidProvider { .. }));
    assert_eq!(resolver.provider_count(), 0);
}
