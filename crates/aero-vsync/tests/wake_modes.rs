use std::num::NonZeroU32;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use aero_vsync::{Vsync, VsyncConfig, WakeMode};
use pretty_assertions::assert_eq;

fn start(rate: u32, wake_mode: WakeMode) -> Arc<Vsync> {
    let config = VsyncConfig::default()
        .with_refresh_rate(NonZeroU32::new(rate).unwrap())
        .with_wake_mode(wake_mode);
    Arc::new(Vsync::with_config(|| {}, config).unwrap())
}

fn spawn_waiters(vsync: &Arc<Vsync>, count: usize) -> Vec<thread::JoinHandle<u64>> {
    let barrier = Arc::new(Barrier::new(count));
    (0..count)
        .map(|_| {
            let vsync = Arc::clone(vsync);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                vsync.wait_until_next_vsync();
                vsync.tick_count()
            })
        })
        .collect()
}

#[test]
fn broadcast_releases_all_waiters_on_the_same_tick() {
    // A long interval keeps the next tick well clear of the waiters reading the tick count.
    let vsync = start(10, WakeMode::Broadcast);
    // Align to a tick so every waiter parks well before the next one.
    vsync.wait_until_next_vsync();

    let waiters = spawn_waiters(&vsync, 4);
    let begin = Instant::now();
    while vsync.blocked_waiters() < 4 {
        assert!(begin.elapsed() < Duration::from_secs(5), "waiters never blocked");
        thread::yield_now();
    }

    let ticks: Vec<u64> = waiters.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(ticks, vec![ticks[0]; 4]);
    assert!(begin.elapsed() < Duration::from_millis(500));
    assert_eq!(vsync.blocked_waiters(), 0);
}

#[test]
fn single_waiter_mode_paces_one_consumer() {
    let vsync = start(100, WakeMode::SingleWaiter);

    let mut last = vsync.tick_count();
    for _ in 0..5 {
        vsync.wait_until_next_vsync();
        let now = vsync.tick_count();
        assert!(now > last, "wait returned without a new tick");
        last = now;
    }
}

#[test]
fn broadcast_mode_still_consumes_one_tick_per_wait() {
    let vsync = start(100, WakeMode::Broadcast);
    let interval = vsync.interval();

    vsync.wait_until_next_vsync();
    let begin = Instant::now();
    vsync.wait_until_next_vsync();
    vsync.wait_until_next_vsync();
    assert!(begin.elapsed() + Duration::from_millis(2) >= interval * 2);
}
