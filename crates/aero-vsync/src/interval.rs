//! Refresh rate to tick interval arithmetic.
//!
//! The generator works in whole microseconds and truncates, so 60 Hz paces at 16_666 us rather
//! than 16_667 us. Every wrapper (library constructor, env config, CLI) goes through these helpers
//! so the rounding stays consistent.

use std::num::NonZeroU32;
use std::time::Duration;

use crate::{Result, VsyncError};

pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Refresh rate used when the caller does not pick one.
pub const DEFAULT_REFRESH_RATE_HZ: NonZeroU32 = match NonZeroU32::new(60) {
    Some(hz) => hz,
    None => unreachable!(),
};

/// Convert a refresh rate (Hz) into a tick interval in microseconds.
///
/// Returns `None` for 0 Hz.
pub fn refresh_interval_us(refresh_hz: u32) -> Option<u64> {
    if refresh_hz == 0 {
        return None;
    }
    Some(MICROS_PER_SECOND / u64::from(refresh_hz))
}

/// Tick interval for a (non-zero) refresh rate.
pub fn refresh_interval(refresh_hz: NonZeroU32) -> Duration {
    Duration::from_micros(MICROS_PER_SECOND / u64::from(refresh_hz.get()))
}

/// Validate an untyped refresh rate coming from config, env or the command line.
pub fn refresh_rate_from_hz(refresh_hz: u32) -> Result<NonZeroU32> {
    NonZeroU32::new(refresh_hz).ok_or(VsyncError::InvalidRefreshRate { hz: refresh_hz })
}
