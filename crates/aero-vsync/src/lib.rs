//! Host-side vsync pacing for Aero's emulated display path.
//!
//! [`Vsync`] owns a background ticker thread that fires at a fixed refresh rate (60 Hz by
//! default). On every tick it runs a caller-supplied callback (typically advancing a frame counter
//! or emitting a trace event) and wakes threads blocked in [`Vsync::wait_until_next_vsync`].
//!
//! ```no_run
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! let frames = Arc::new(AtomicU64::new(0));
//! let counter = Arc::clone(&frames);
//! let vsync = aero_vsync::Vsync::new(move || {
//!     counter.fetch_add(1, Ordering::Relaxed);
//! })?;
//!
//! loop {
//!     vsync.wait_until_next_vsync();
//!     // render one frame
//!     if frames.load(Ordering::Relaxed) >= 600 {
//!         break;
//!     }
//! }
//! # Ok::<(), aero_vsync::VsyncError>(())
//! ```
//!
//! Pacing is "sleep one interval, then fire": there is no drift compensation, so callback time and
//! scheduler latency accumulate across ticks.
#![forbid(unsafe_code)]

mod config;
mod error;
mod gate;
mod interval;
mod metrics;
mod ticker;
mod vsync;

pub use config::{
    ShutdownPolicy, VsyncConfig, WakeMode, DEFAULT_THREAD_NAME, ENV_REFRESH_HZ, ENV_SHUTDOWN,
    ENV_WAKE_MODE,
};
pub use error::{Result, VsyncError};
pub use interval::{
    refresh_interval, refresh_interval_us, refresh_rate_from_hz, DEFAULT_REFRESH_RATE_HZ,
    MICROS_PER_SECOND,
};
pub use metrics::{VsyncMetrics, VsyncMetricsSnapshot};
pub use vsync::Vsync;
