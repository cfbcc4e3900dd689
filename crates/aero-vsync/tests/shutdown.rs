use std::num::NonZeroU32;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use aero_vsync::{ShutdownPolicy, Vsync, VsyncConfig};

fn wait_for_blocked_waiters(vsync: &Vsync, count: usize) {
    let start = Instant::now();
    while vsync.blocked_waiters() < count {
        assert!(start.elapsed() < Duration::from_secs(5), "waiter never blocked");
        thread::yield_now();
    }
}

fn config(rate: u32, shutdown: ShutdownPolicy) -> VsyncConfig {
    VsyncConfig::default()
        .with_refresh_rate(NonZeroU32::new(rate).unwrap())
        .with_shutdown_policy(shutdown)
}

#[test]
fn join_without_waiters_completes_within_one_interval() {
    let vsync = Vsync::with_config(|| {}, config(10, ShutdownPolicy::LeaveWaitersBlocked)).unwrap();
    let interval = vsync.interval();
    assert_eq!(interval, Duration::from_millis(100));

    let start = Instant::now();
    vsync.join();
    let took = start.elapsed();
    // One interval of sleep at most, plus scheduling slack.
    assert!(took < interval + Duration::from_millis(50), "join took {took:?}");
    assert!(vsync.is_stopped());
}

#[test]
fn drop_joins_ticker_thread() {
    let (tx, rx) = mpsc::channel::<()>();
    let vsync = Vsync::with_config(
        move || {
            // Keeps the sender alive for as long as the ticker thread owns the callback.
            let _sender = &tx;
        },
        config(200, ShutdownPolicy::LeaveWaitersBlocked),
    )
    .unwrap();

    vsync.wait_until_next_vsync();
    drop(vsync);

    // The callback (and its sender) is gone once drop returns.
    assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
}

// Stopping does not signal the condvar, so a thread blocked in the wait stays blocked. The waiter
// thread is leaked on purpose; the test binary exits regardless.
#[test]
fn join_leaves_blocked_waiter_blocked_by_default() {
    let vsync = Arc::new(
        Vsync::with_config(|| {}, config(10, ShutdownPolicy::LeaveWaitersBlocked)).unwrap(),
    );

    let (tx, rx) = mpsc::channel();
    {
        let vsync = Arc::clone(&vsync);
        thread::spawn(move || loop {
            vsync.wait_until_next_vsync();
            let _ = tx.send(vsync.tick_count());
        });
    }

    wait_for_blocked_waiters(&vsync, 1);
    vsync.join();
    let final_tick = vsync.tick_count();

    // Let a waiter woken by the last tick before the stop get back into the wait.
    thread::sleep(vsync.interval());
    wait_for_blocked_waiters(&vsync, 1);
    let woken_by_ticks: Vec<u64> = rx.try_iter().collect();
    assert!(woken_by_ticks.iter().all(|&tick| tick <= final_tick));

    assert!(
        rx.recv_timeout(vsync.interval() * 3).is_err(),
        "blocked waiter was released by shutdown"
    );
    assert_eq!(vsync.tick_count(), final_tick);
    assert_eq!(vsync.blocked_waiters(), 1);
    assert_eq!(vsync.metrics().snapshot().waits_pending(), 1);
}

#[test]
fn release_policy_unblocks_waiter_on_join() {
    let vsync = Arc::new(
        Vsync::with_config(|| {}, config(10, ShutdownPolicy::ReleaseWaiters)).unwrap(),
    );

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let vsync = Arc::clone(&vsync);
        thread::spawn(move || loop {
            vsync.wait_until_next_vsync();
            if vsync.is_stopped() {
                tx.send(()).unwrap();
                return;
            }
        })
    };

    wait_for_blocked_waiters(&vsync, 1);
    vsync.join();

    rx.recv_timeout(Duration::from_secs(5))
        .expect("waiter not released by shutdown");
    waiter.join().unwrap();
    assert_eq!(vsync.blocked_waiters(), 0);

    // The gate stays closed: no tick will ever come, and waiting must not hang.
    let start = Instant::now();
    vsync.wait_until_next_vsync();
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn panicking_callback_does_not_poison_shutdown() {
    let vsync = Vsync::with_config(
        || panic!("tick callback failure"),
        config(200, ShutdownPolicy::ReleaseWaiters),
    )
    .unwrap();

    // Let the ticker die on its first tick.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(vsync.tick_count(), 1);

    vsync.join();
    assert!(vsync.is_stopped());
    vsync.wait_until_next_vsync();
}
