use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crate::config::{ShutdownPolicy, VsyncConfig, WakeMode};
use crate::gate::TickGate;
use crate::interval::refresh_interval;
use crate::metrics::VsyncMetrics;
use crate::ticker::{Shared, Ticker};
use crate::{Result, VsyncError};

/// A periodic vsync signal driven by a dedicated ticker thread.
///
/// The ticker starts as soon as the generator is constructed. Every interval it marks a tick,
/// wakes waiters (see [`WakeMode`]) and runs the callback. The callback runs while the tick lock
/// is held, so a thread returning from [`Vsync::wait_until_next_vsync`] always observes the
/// effects of that tick's callback.
///
/// Dropping the generator stops and joins the ticker thread. This blocks for up to one interval.
///
/// `Vsync` is `Send + Sync`; share it between a render loop and other consumers with [`Arc`].
#[derive(Debug)]
pub struct Vsync {
    shared: Arc<Shared>,
    refresh_rate: NonZeroU32,
    interval: Duration,
    wake_mode: WakeMode,
    shutdown: ShutdownPolicy,
    ticker_id: ThreadId,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Vsync {
    /// Start a 60 Hz generator.
    pub fn new<F>(callback: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Self::with_config(callback, VsyncConfig::default())
    }

    pub fn with_refresh_rate<F>(callback: F, refresh_rate: NonZeroU32) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Self::with_config(callback, VsyncConfig::default().with_refresh_rate(refresh_rate))
    }

    pub fn with_config<F>(callback: F, config: VsyncConfig) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let interval = refresh_interval(config.refresh_hz);
        let shared = Arc::new(Shared {
            gate: TickGate::new(config.wake_mode),
            should_stop: AtomicBool::new(false),
            shutdown: config.shutdown,
            metrics: VsyncMetrics::new(),
        });

        let ticker = Ticker {
            shared: Arc::clone(&shared),
            interval,
            callback,
        };
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || ticker.run())
            .map_err(VsyncError::Spawn)?;

        tracing::debug!(
            refresh_hz = config.refresh_hz.get(),
            interval_us = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX),
            wake_mode = config.wake_mode.as_str(),
            shutdown = config.shutdown.as_str(),
            "vsync generator started"
        );

        Ok(Self {
            shared,
            refresh_rate: config.refresh_hz,
            interval,
            wake_mode: config.wake_mode,
            shutdown: config.shutdown,
            ticker_id: handle.thread().id(),
            thread: Mutex::new(Some(handle)),
        })
    }

    pub fn refresh_rate(&self) -> NonZeroU32 {
        self.refresh_rate
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn wake_mode(&self) -> WakeMode {
        self.wake_mode
    }

    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.shutdown
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.shared.gate.generation()
    }

    /// Threads currently blocked in [`Self::wait_until_next_vsync`].
    pub fn blocked_waiters(&self) -> usize {
        self.shared.gate.waiters()
    }

    /// Whether [`Self::join`] has been requested.
    pub fn is_stopped(&self) -> bool {
        self.shared.should_stop.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> &VsyncMetrics {
        &self.shared.metrics
    }

    /// Block until the next tick after this call, including its callback, has completed.
    ///
    /// Ticks that fired before the call are ignored, so back-to-back calls consume one tick each.
    /// A call that races with a tick in progress may get that tick or the following one.
    ///
    /// There is no timeout. Under [`ShutdownPolicy::LeaveWaitersBlocked`] a call that is blocked
    /// when the generator stops, or that starts afterwards, never returns. Under
    /// [`ShutdownPolicy::ReleaseWaiters`] it returns once the generator is stopped.
    pub fn wait_until_next_vsync(&self) {
        self.shared.metrics.wait_started();
        tracing::trace!("waiting for next vsync");
        self.shared.gate.wait();
        self.shared.metrics.wait_completed();
    }

    /// Stop the ticker and wait for its thread to exit.
    ///
    /// Takes up to one interval, since the ticker only checks for the stop request between
    /// sleeps. Calling this again (or concurrently) waits for the same exit and then returns.
    ///
    /// Calling it from the tick callback only requests the stop; the ticker exits after the
    /// callback returns and a later `join` from another thread reaps it.
    pub fn join(&self) {
        self.shared.should_stop.store(true, Ordering::Relaxed);

        // Checked before taking the slot: another thread may hold it while joining this ticker.
        if thread::current().id() == self.ticker_id {
            // The gate lock is held around the callback; the ticker closes the gate itself once
            // it leaves the loop.
            tracing::warn!("vsync join requested from the tick callback; not joining");
            return;
        }

        let mut slot = lock_unpoisoned(&self.thread);
        if self.shutdown == ShutdownPolicy::ReleaseWaiters {
            self.shared.gate.close();
        }

        let Some(handle) = slot.take() else {
            return;
        };
        if handle.join().is_err() {
            tracing::warn!("vsync ticker thread panicked");
        }
        tracing::debug!(ticks = self.tick_count(), "vsync generator stopped");
    }
}

impl Drop for Vsync {
    fn drop(&mut self) {
        self.join();
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
