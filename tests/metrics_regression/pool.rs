//! Pool metrics regression tests

use super::helpers::*;
use serial_test::serial;
use std::time::Duration;
use tollgate_pool::{factory_fn, Pool, PoolConfig};

fn pool(config: PoolConfig) -> Pool<impl tollgate_pool::Factory<Item = u32, Error = String>> {
    Pool::new(
        config,
        factory_fn(|| async { Ok::<_, String>(7u32) }, |_item: u32| Ok(())),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn pool_metrics_exist() {
    init_recorder();

    let pool = pool(
        PoolConfig::builder()
            .name("test_pool")
            .active(1)
            .wait_timeout(Some(Duration::from_millis(10)))
            .build()
            .unwrap(),
    );

    let item = pool.get().await.unwrap();
    let _ = pool.get().await; // times out at the active limit
    pool.put(item, false).unwrap();
    let item = pool.get().await.unwrap();
    pool.put(item, false).unwrap();

    // Verify checkout counter
    assert_counter_exists("pool_get_total");
    assert_metric_has_label("pool_get_total", "pool", "test_pool");
    assert_metric_has_label("pool_get_total", "outcome", "created");
    assert_metric_has_label("pool_get_total", "outcome", "timeout");
    assert_metric_has_label("pool_get_total", "outcome", "reused");

    // Verify gauges
    assert_gauge_exists("pool_items_active");
    assert_metric_has_label("pool_items_active", "pool", "test_pool");
    assert_gauge_exists("pool_items_idle");
    assert_metric_has_label("pool_items_idle", "pool", "test_pool");

    // Verify wait histogram
    assert_histogram_exists("pool_wait_duration_seconds");
    assert_metric_has_label("pool_wait_duration_seconds", "pool", "test_pool");
}

#[tokio::test]
#[serial]
async fn pool_outcome_counts() {
    init_recorder();

    let pool = pool(
        PoolConfig::builder()
            .name("counted_pool")
            .active(2)
            .build()
            .unwrap(),
    );

    let a = pool.get().await.unwrap();
    let b = pool.get().await.unwrap();
    assert!(pool.get().await.unwrap_err().is_exhausted());
    pool.put(a, false).unwrap();
    pool.put(b, false).unwrap();
    let _ = pool.get().await.unwrap();
    pool.close().await.unwrap();
    assert!(pool.get().await.unwrap_err().is_closed());

    let count = |outcome| {
        counter_value(
            "pool_get_total",
            &[("pool", "counted_pool"), ("outcome", outcome)],
        )
    };
    assert_eq!(count("created"), 2);
    assert_eq!(count("exhausted"), 1);
    assert_eq!(count("reused"), 1);
    assert_eq!(count("closed"), 1);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn pool_eviction_metrics() {
    init_recorder();

    let pool = pool(
        PoolConfig::builder()
            .name("evicting_pool")
            .idle_timeout(Some(Duration::from_millis(200)))
            .build()
            .unwrap(),
    );

    let item = pool.get().await.unwrap();
    pool.put(item, false).unwrap();
    tokio::time::sleep(Duration::from_millis(450)).await;

    assert_counter_exists("pool_items_evicted_total");
    assert_eq!(
        counter_value("pool_items_evicted_total", &[("pool", "evicting_pool")]),
        1
    );
}

#[tokio::test]
#[serial]
async fn pool_handoff_metrics() {
    init_recorder();

    let pool = pool(
        PoolConfig::builder()
            .name("handoff_pool")
            .active(1)
            .wait(true)
            .build()
            .unwrap(),
    );

    let item = pool.get().await.unwrap();
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.get().await })
    };
    while pool.stats().waiters == 0 {
        tokio::task::yield_now().await;
    }
    pool.put(item, false).unwrap();
    waiter.await.unwrap().unwrap();

    assert_metric_has_label("pool_get_total", "outcome", "handoff");
    assert_eq!(
        counter_value(
            "pool_get_total",
            &[("pool", "handoff_pool"), ("outcome", "handoff")]
        ),
        1
    );
}
