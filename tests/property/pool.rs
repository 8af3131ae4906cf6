//! Property tests for the resource pool.
//!
//! Invariants tested:
//! - Items checked out at once never exceed the active limit
//! - Every caller is served when the pool waits (no deadlocks)
//! - Every created item is closed exactly once by the time the pool is closed

use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tollgate_pool::{factory_fn, Pool, PoolConfig};

#[derive(Clone, Default)]
struct Counts {
    created: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Property: outstanding items stay within the active limit and all
    /// items are accounted for after close
    #[test]
    fn pool_respects_active_limit(
        active in 1usize..=8,
        idle in -1isize..=8,
        tasks in 1usize..=24,
        rounds in 1usize..=8,
        hold_us in 0u64..=300,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let counts = Counts::default();
            let (created, closed) = (Arc::clone(&counts.created), Arc::clone(&counts.closed));
            let pool = Pool::new(
                PoolConfig::builder()
                    .active(active)
                    .idle(idle.min(active as isize))
                    .wait(true)
                    .build()
                    .unwrap(),
                factory_fn(
                    move || {
                        let id = created.fetch_add(1, Ordering::SeqCst);
                        async move { Ok::<_, ()>(id) }
                    },
                    move |_id: usize| {
                        closed.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                ),
            )
            .unwrap();

            let outstanding = Arc::new(AtomicUsize::new(0));
            let peak = Arc::new(AtomicUsize::new(0));
            let mut handles = vec![];
            for _ in 0..tasks {
                let pool = pool.clone();
                let outstanding = Arc::clone(&outstanding);
                let peak = Arc::clone(&peak);
                handles.push(tokio::spawn(async move {
                    for _ in 0..rounds {
                        let item = pool.get().await.unwrap();
                        let now = outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_micros(hold_us)).await;
                        outstanding.fetch_sub(1, Ordering::SeqCst);
                        pool.put(item, false).unwrap();
                    }
                }));
            }

            for handle in handles {
                tokio::time::timeout(Duration::from_secs(10), handle)
                    .await
                    .expect("caller starved")
                    .unwrap();
            }

            let observed = peak.load(Ordering::SeqCst);
            prop_assert!(
                observed <= active,
                "Observed {} items out at once but limit was {}",
                observed,
                active
            );
            prop_assert!(pool.stats().idle <= pool.config().max_idle());

            pool.close().await.unwrap();
            prop_assert_eq!(pool.stats().active, 0);
            prop_assert_eq!(
                counts.created.load(Ordering::SeqCst),
                counts.closed.load(Ordering::SeqCst)
            );

            Ok(())
        })?;
    }
}
