//! Breaker stress tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tower::{Service, ServiceExt};
use tollgate_breaker::{BreakerConfig, BreakerGroup, BreakerLayer};

/// Test: 1 million admission decisions with outcomes
#[tokio::test]
#[ignore]
async fn stress_one_million_calls() {
    let group = BreakerGroup::new(BreakerConfig::default()).unwrap();
    let call_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&call_count);

    let svc = tower::service_fn(move |_req: u32| {
        counter.fetch_add(1, Ordering::Relaxed);
        async { Ok::<_, ()>(()) }
    });
    let mut service = tower::Layer::layer(&BreakerLayer::from_group(&group, "hot"), svc);

    let start = Instant::now();
    for i in 0..1_000_000 {
        let _ = service.ready().await.unwrap().call(i).await;
    }
    let elapsed = start.elapsed();

    println!("1M calls completed in {:?}", elapsed);
    println!(
        "Throughput: {:.0} calls/sec",
        1_000_000.0 / elapsed.as_secs_f64()
    );

    // Healthy traffic is never shed.
    assert_eq!(call_count.load(Ordering::Relaxed), 1_000_000);
}

/// Test: Many threads marking and asking one breaker at once
#[test]
#[ignore]
fn stress_contended_breaker() {
    let group = Arc::new(
        BreakerGroup::new(
            BreakerConfig::builder()
                .window(Duration::from_secs(60))
                .build()
                .unwrap(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let group = Arc::clone(&group);
            thread::spawn(move || {
                let breaker = group.get("shared");
                for i in 0..100_000 {
                    let _ = breaker.allow();
                    if (i + t) % 3 == 0 {
                        breaker.mark_failed();
                    } else {
                        breaker.mark_success();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let metrics = group.get("shared").metrics();
    println!("{:?}", metrics);
    assert_eq!(metrics.total, 1_600_000);
    // Two thirds succeeded; with k = 1.5 the breaker never sheds.
    assert_eq!(metrics.drop_ratio, 0.0);
}

/// Test: Thousands of distinct breakers in one group
#[test]
#[ignore]
fn stress_many_keys() {
    let group = BreakerGroup::new(BreakerConfig::default()).unwrap();

    let start = Instant::now();
    for i in 0..50_000 {
        let breaker = group.get(&format!("10.0.{}.{}:80", i / 256, i % 256));
        breaker.mark_success();
        let _ = breaker.allow();
    }
    println!("50k breakers created in {:?}", start.elapsed());

    assert_eq!(group.len(), 50_000);
    group.reload(BreakerConfig::default()).unwrap();
    assert!(group.is_empty());
}
