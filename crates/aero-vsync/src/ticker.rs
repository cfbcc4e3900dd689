//! The ticker thread body.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ShutdownPolicy;
use crate::gate::TickGate;
use crate::metrics::VsyncMetrics;

/// State shared between a [`crate::Vsync`] handle and its ticker thread.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) gate: TickGate,
    /// Only gates loop continuation, so relaxed loads/stores are enough.
    pub(crate) should_stop: AtomicBool,
    pub(crate) shutdown: ShutdownPolicy,
    pub(crate) metrics: VsyncMetrics,
}

pub(crate) struct Ticker<F> {
    pub(crate) shared: Arc<Shared>,
    pub(crate) interval: Duration,
    pub(crate) callback: F,
}

impl<F> Ticker<F>
where
    F: FnMut() + Send + 'static,
{
    /// Sleep one interval, fire, repeat until stop is requested.
    ///
    /// There is no drift compensation: the callback's run time and scheduler latency push every
    /// later tick back. The stop request is only checked before each sleep, so stopping takes up
    /// to one interval and never interrupts a callback.
    pub(crate) fn run(mut self) {
        let interval_us = u64::try_from(self.interval.as_micros()).unwrap_or(u64::MAX);
        tracing::debug!(interval_us, "vsync ticker running");

        loop {
            if self.shared.should_stop.load(Ordering::Relaxed) {
                break;
            }

            thread::sleep(self.interval);

            let metrics = &self.shared.metrics;
            let callback = &mut self.callback;
            self.shared.gate.fire(|tick| {
                let start = Instant::now();
                callback();
                metrics.tick_fired(start.elapsed());
                tracing::trace!(tick, "vsync tick");
            });
        }

        if self.shared.shutdown == ShutdownPolicy::ReleaseWaiters {
            self.shared.gate.close();
        }
        tracing::debug!(
            ticks = self.shared.gate.generation(),
            "vsync ticker observed stop request"
        );
    }
}
