use super::{pool, Dialer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tollgate_pool::{Pool, PoolConfig};

/// Many tasks cycling items through a small pool never exceed the active limit.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn checkouts_stay_within_active_limit() {
    let max_active = 4;
    let (pool, dialer) = pool(
        PoolConfig::builder()
            .active(max_active)
            .idle(max_active as isize)
            .wait(true)
            .build()
            .unwrap(),
    );

    let outstanding = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for _ in 0..32 {
        let pool = pool.clone();
        let outstanding = Arc::clone(&outstanding);
        let peak = Arc::clone(&peak);
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                let conn = pool.get().await.unwrap();
                let now = outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_micros(200)).await;
                outstanding.fetch_sub(1, Ordering::SeqCst);
                pool.put(conn, false).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= max_active);
    assert!(dialer.dialed() <= max_active);
    let stats = pool.stats();
    assert!(stats.active <= max_active);
    assert_eq!(stats.waiters, 0);
}

/// Checkouts that give up while others keep the pool busy do not leak slots.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timed_out_checkouts_do_not_leak_slots() {
    let (pool, _) = pool(PoolConfig::builder().active(2).wait(true).build().unwrap());

    let timeouts = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];
    for i in 0..20 {
        let pool = pool.clone();
        let timeouts = Arc::clone(&timeouts);
        handles.push(tokio::spawn(async move {
            match pool.get_timeout(Duration::from_millis(1 + i % 3)).await {
                Ok(conn) => {
                    sleep(Duration::from_millis(2)).await;
                    pool.put(conn, false).unwrap();
                }
                Err(err) => {
                    assert!(err.is_timeout());
                    timeouts.fetch_add(1, Ordering::SeqCst);
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.waiters, 0);
    assert!(stats.active <= 2);

    // Both slots are still usable.
    let a = pool.get_timeout(Duration::from_secs(1)).await.unwrap();
    let b = pool.get_timeout(Duration::from_secs(1)).await.unwrap();
    assert_ne!(a.id, b.id);
}

/// Closing under load settles every caller.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn close_under_load_settles_every_caller() {
    let dialer = Dialer::slow(Duration::from_millis(1));
    let pool = Pool::new(
        PoolConfig::builder().active(3).wait(true).build().unwrap(),
        dialer.clone(),
    )
    .unwrap();

    let mut handles = vec![];
    for _ in 0..16 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            loop {
                match pool.get().await {
                    Ok(conn) => {
                        sleep(Duration::from_millis(1)).await;
                        pool.put(conn, false).unwrap();
                    }
                    Err(err) => {
                        assert!(err.is_closed());
                        return;
                    }
                }
            }
        }));
    }

    sleep(Duration::from_millis(20)).await;
    pool.close().await.unwrap();

    for handle in handles {
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("caller hung after close")
            .unwrap();
    }
    assert_eq!(pool.stats().active, 0);
    assert_eq!(dialer.closed().len(), dialer.dialed());
}
