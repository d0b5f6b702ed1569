/// Property-based tests for resolution
///
/// These tests verify that construction counts, instance sharing and
/// teardown order hold for arbitrary level assignments.

use tiered_di::{DiError, Provider, Resolver, Resource, Scope};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct N0;
struct N1(Arc<N0>);
struct N2(Arc<N1>);
struct N3(Arc<N2>);

type Log = Arc<Mutex<Vec<&'static str>>>;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn tracked<T: Send + Sync + 'static>(value: T, name: &'static str, calls: &Arc<AtomicUsize>, log: &Log) -> Resource<T> {
    calls.fetch_add(1, Ordering::SeqCst);
    let log = log.clone();
    Resource::new(value, move |_| {
        log.lock().unwrap().push(name);
        Ok(())
    })
}

fn chain(levels: &[u32], calls: &[Arc<AtomicUsize>], log: &Log) -> Resolver {
    let (c0, c1, c2, c3) = (calls[0].clone(), calls[1].clone(), calls[2].clone(), calls[3].clone());
    let (l0, l1, l2, l3) = (log.clone(), log.clone(), log.clone(), log.clone());
    Resolver::builder()
        .add_provider(Provider::resource(move |()| Ok(tracked(N0, "n0", &c0, &l0))).at_level(levels[0]))
        .add_provider(
            Provider::resource(move |(n,): (Arc<N0>,)| Ok(tracked(N1(n), "n1", &c1, &l1))).at_level(levels[1]),
        )
        .add_provider(
            Provider::resource(move |(n,): (Arc<N1>,)| Ok(tracked(N2(n), "n2", &c2, &l2))).at_level(levels[2]),
        )
        .add_provider(
            Provider::resource(move |(n,): (Arc<N2>,)| Ok(tracked(N3(n), "n3", &c3, &l3))).at_level(levels[3]),
        )
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn chain_constructs_once_and_releases_in_reverse(
        mut levels in prop::collection::vec(1u32..=4, 4),
        requests in 1usize..6,
    ) {
        levels.sort_unstable();
        let calls: Vec<Arc<AtomicUsize>> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let resolver = chain(&levels, &calls, &log);

        let order = runtime().block_on(async {
            let mut scopes: Vec<Scope> = vec![resolver.root_scope().clone()];
            while scopes.last().unwrap().level().get() < levels[3] {
                let next = scopes.last().unwrap().child().unwrap();
                scopes.push(next);
            }

            let deepest = scopes.last().unwrap().clone();
            let first = deepest.get::<N3>().await.unwrap();
            for _ in 1..requests {
                let again = deepest.get::<N3>().await.unwrap();
                assert!(Arc::ptr_eq(&first, &again));
            }
            // N0 is owned by the scope at its own level.
            let owner = &scopes[(levels[0] - 1) as usize];
            assert!(Arc::ptr_eq(&first.0.0.0, &owner.get::<N0>().await.unwrap()));

            for scope in scopes.iter().rev() {
                scope.close().await.unwrap();
            }
            log.lock().unwrap().clone()
        });

        for counter in &calls {
            prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
        prop_assert_eq!(order, vec!["n3", "n2", "n1", "n0"]);
    }

    #[test]
    fn registration_accepts_exactly_downward_dependencies(dep_level in 1u32..6, user_level in 1u32..6) {
        struct Dep;
        struct User;

        let result = Resolver::builder()
            .add_provider(Provider::instance(Dep).at_level(dep_level))
            .add_provider(Provider::value(|(_d,): (Arc<Dep>,)| Ok(User)).at_level(user_level))
            .build();

        if dep_level <= user_level {
            prop_assert!(result.is_ok());
        } else {
            let is_level_order = matches!(result, Err(DiError::LevelOrder { .. }));
            prop_assert!(is_level_order);
        }
    }

    #[test]
    fn concurrent_requests_share_one_instance(requests in 1usize..24) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resolver = Resolver::builder()
            .add_provider(Provider::value_async(move |()| {
                let counter = counter.clone();
                async move {
                    tokio::task::yield_now().await;
                    Ok::<_, tiered_di::BoxError>(counter.fetch_add(1, Ordering::SeqCst))
                }
            }))
            .build()
            .unwrap();

        let values = runtime().block_on(async {
            let root = resolver.root_scope();
            futures::future::join_all((0..requests).map(|_| root.get::<usize>())).await
        });

        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        for value in values {
            prop_assert_eq!(*value.unwrap(), 0);
        }
    }
}
