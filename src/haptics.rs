//! Haptic feedback side channel.
//!
//! An external capability the calculator may call but does not own. The core
//! triggers one pulse per successfully handled logical input; strength 0
//! suppresses the effect at the call site, so implementations never see it.

use tracing::debug;

pub trait Haptics {
    /// Emit one pulse of the given strength.
    fn pulse(&self, strength: u32);
}

/// Discards all pulses. Used where no haptic capability exists.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn pulse(&self, _strength: u32) {}
}

/// Logs pulses instead of vibrating; stands in for a real actuator.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn pulse(&self, strength: u32) {
        debug!(strength, "haptic pulse");
    }
}
