use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters updated by the ticker thread and by waiters.
///
/// All counters are relaxed; they are diagnostics and never gate pacing decisions.
#[derive(Debug, Default)]
pub struct VsyncMetrics {
    ticks_total: AtomicU64,
    waits_started_total: AtomicU64,
    waits_completed_total: AtomicU64,
    callback_last_us: AtomicU64,
    callback_max_us: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VsyncMetricsSnapshot {
    pub ticks_total: u64,
    pub waits_started_total: u64,
    pub waits_completed_total: u64,
    pub callback_last_us: u64,
    pub callback_max_us: u64,
}

impl VsyncMetricsSnapshot {
    /// Waits that have started but not returned (yet).
    pub fn waits_pending(&self) -> u64 {
        self.waits_started_total
            .saturating_sub(self.waits_completed_total)
    }
}

impl VsyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tick_fired(&self, callback_time: Duration) {
        let us = u64::try_from(callback_time.as_micros()).unwrap_or(u64::MAX);
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
        self.callback_last_us.store(us, Ordering::Relaxed);
        self.callback_max_us.fetch_max(us, Ordering::Relaxed);
    }

    pub(crate) fn wait_started(&self) {
        self.waits_started_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn wait_completed(&self) {
        self.waits_completed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> VsyncMetricsSnapshot {
        VsyncMetricsSnapshot {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            waits_started_total: self.waits_started_total.load(Ordering::Relaxed),
            waits_completed_total: self.waits_completed_total.load(Ordering::Relaxed),
            callback_last_us: self.callback_last_us.load(Ordering::Relaxed),
            callback_max_us: self.callback_max_us.load(Ordering::Relaxed),
        }
    }

    pub fn render_prometheus(&self) -> String {
        let snap = self.snapshot();
        let mut out = String::new();

        push_counter(&mut out, "vsync_ticks_total", snap.ticks_total);
        push_counter(&mut out, "vsync_waits_started_total", snap.waits_started_total);
        push_counter(
            &mut out,
            "vsync_waits_completed_total",
            snap.waits_completed_total,
        );
        push_gauge(&mut out, "vsync_waits_pending", snap.waits_pending());
        push_gauge(&mut out, "vsync_callback_last_us", snap.callback_last_us);
        push_gauge(&mut out, "vsync_callback_max_us", snap.callback_max_us);

        out
    }
}

fn push_gauge(out: &mut String, name: &str, val: u64) {
    let _ = writeln!(out, "# TYPE {name} gauge\n{name} {val}");
}

fn push_counter(out: &mut String, name: &str, val: u64) {
    let _ = writeln!(out, "# TYPE {name} counter\n{name} {val}");
}
