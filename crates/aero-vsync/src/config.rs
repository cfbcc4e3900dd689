use std::num::NonZeroU32;
use std::time::Duration;

use crate::interval::{refresh_interval, refresh_rate_from_hz, DEFAULT_REFRESH_RATE_HZ};
use crate::{Result, VsyncError};

pub const ENV_REFRESH_HZ: &str = "AERO_VSYNC_HZ";
pub const ENV_WAKE_MODE: &str = "AERO_VSYNC_WAKE_MODE";
pub const ENV_SHUTDOWN: &str = "AERO_VSYNC_SHUTDOWN";

pub const DEFAULT_THREAD_NAME: &str = "aero-vsync";

/// How a tick releases threads blocked in [`crate::Vsync::wait_until_next_vsync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WakeMode {
    /// Reset-and-wait on a boolean tick flag, waking a single waiter per tick.
    ///
    /// Concurrent waiters beyond the first may be left waiting for a later tick, and a waiter that
    /// enters while another is still reacquiring the lock can consume its tick.
    #[default]
    SingleWaiter,
    /// Every waiter snapshots the tick generation on entry and returns once it has advanced. All
    /// waiters are woken on each tick.
    Broadcast,
}

impl WakeMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "single" => Some(Self::SingleWaiter),
            "broadcast" => Some(Self::Broadcast),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleWaiter => "single",
            Self::Broadcast => "broadcast",
        }
    }
}

/// What stopping the generator does to threads blocked in the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Stop only halts the ticker. Blocked waiters are never released.
    #[default]
    LeaveWaitersBlocked,
    /// Stop closes the gate: blocked waiters return, and later waits return immediately.
    ReleaseWaiters,
}

impl ShutdownPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "block" => Some(Self::LeaveWaitersBlocked),
            "release" => Some(Self::ReleaseWaiters),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeaveWaitersBlocked => "block",
            Self::ReleaseWaiters => "release",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsyncConfig {
    pub refresh_hz: NonZeroU32,
    pub wake_mode: WakeMode,
    pub shutdown: ShutdownPolicy,
    /// OS-visible name of the ticker thread.
    pub thread_name: String,
}

impl Default for VsyncConfig {
    fn default() -> Self {
        Self {
            refresh_hz: DEFAULT_REFRESH_RATE_HZ,
            wake_mode: WakeMode::default(),
            shutdown: ShutdownPolicy::default(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl VsyncConfig {
    pub fn with_refresh_rate(mut self, refresh_hz: NonZeroU32) -> Self {
        self.refresh_hz = refresh_hz;
        self
    }

    /// Like [`Self::with_refresh_rate`], for rates that have not been validated yet.
    pub fn with_refresh_hz(self, refresh_hz: u32) -> Result<Self> {
        Ok(self.with_refresh_rate(refresh_rate_from_hz(refresh_hz)?))
    }

    pub fn with_wake_mode(mut self, wake_mode: WakeMode) -> Self {
        self.wake_mode = wake_mode;
        self
    }

    pub fn with_shutdown_policy(mut self, shutdown: ShutdownPolicy) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn interval(&self) -> Duration {
        refresh_interval(self.refresh_hz)
    }

    /// Build a config from `AERO_VSYNC_*` environment variables, falling back to defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_REFRESH_HZ) {
            let hz = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| VsyncError::InvalidEnv(ENV_REFRESH_HZ))?;
            config = config.with_refresh_hz(hz)?;
        }
        if let Some(raw) = lookup(ENV_WAKE_MODE) {
            config.wake_mode = WakeMode::parse(&raw).ok_or(VsyncError::InvalidEnv(ENV_WAKE_MODE))?;
        }
        if let Some(raw) = lookup(ENV_SHUTDOWN) {
            config.shutdown =
                ShutdownPolicy::parse(&raw).ok_or(VsyncError::InvalidEnv(ENV_SHUTDOWN))?;
        }

        Ok(config)
    }
}
