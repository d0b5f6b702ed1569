/// Unit tests for ProviderDescriptor

use tiered_di::{BoxError, CachePolicy, ExecutionMode, Key, Level, Provider, ProviderKind, Resolver, Resource};
use std::sync::Arc;

struct Config;
struct Pool;
struct Session;
trait Store: Send + Sync {}
impl Store for Pool {}

#[test]
fn test_descriptors_follow_registration_order() {
    let resolver = Resolver::builder()
        .add_provider(Provider::instance(Config))
        .add_provider(
            Provider::resource_async(|(_c,): (Arc<Config>,)| async move {
                Ok::<_, BoxError>(Resource::new(Pool, |_| Ok(())))
            })
            .covers::<dyn Store>(|p| p as Arc<dyn Store>),
        )
        .add_provider(
            Provider::value(|(_s,): (Arc<dyn Store>,)| Ok(Session))
                .at_level(2)
                .never_cache(),
        )
        .build()
        .unwrap();

    let descriptors = resolver.descriptors();
    assert_eq!(descriptors.len(), 3);

    let config = &descriptors[0];
    assert!(config.name.ends_with("Config"));
    assert_eq!(config.kind, ProviderKind::Value);
    assert_eq!(config.mode, ExecutionMode::Direct);
    assert!(config.dependencies.is_empty());

    let pool = &descriptors[1];
    assert_eq!(pool.kind, ProviderKind::Resource);
    assert_eq!(pool.mode, ExecutionMode::Suspending);
    assert_eq!(pool.coverage, vec![Key::of::<Pool>(), Key::of::<dyn Store>()]);
    assert_eq!(pool.dependency_levels, vec![Some(Level::ROOT)]);
    assert!(!pool.depends_on_level_below());

    let session = &descriptors[2];
    assert_eq!(session.level, Level::from(2));
    assert_eq!(session.cache, CachePolicy::NeverCache);
    assert_eq!(session.dependencies, vec![Key::of::<dyn Store>()]);
    assert!(session.depends_on_level_below());
    assert!(session.unprovided().is_empty());
}
