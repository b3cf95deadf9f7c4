//! Exogenous workload generator.
//!
//! Incoming load follows a daily sine wave peaking at 20:00 simulated time,
//! with uniform integer noise layered on top:
//!
//! ```text
//! hour     = (clock mod 1440) / 60
//! cycle    = sin((hour - 14) · π / 12)
//! incoming = max(0, round(base + amplitude · cycle + noise))
//! ```

use std::f64::consts::PI;
use std::ops::RangeInclusive;

use rand::Rng;

use greengrid_core::TICKS_PER_DAY;

/// Diurnal load curve parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DiurnalLoad {
    pub base: f64,
    pub amplitude: f64,
    /// Hour at which the sine crosses zero on its way up.
    pub phase_hour: f64,
    pub noise: RangeInclusive<i32>,
}

impl Default for DiurnalLoad {
    fn default() -> Self {
        Self {
            base: 40.0,
            amplitude: 100.0,
            phase_hour: 14.0,
            noise: -10..=20,
        }
    }
}

impl DiurnalLoad {
    /// Position on the daily curve for `clock`, in `[-1, 1]`.
    pub fn cycle(&self, clock: u64) -> f64 {
        let hour = (clock % TICKS_PER_DAY) as f64 / 60.0;
        ((hour - self.phase_hour) * PI / 12.0).sin()
    }

    /// Draw the load arriving on tick `clock`.
    pub fn incoming(&self, clock: u64, rng: &mut impl Rng) -> u32 {
        let noise = f64::from(rng.random_range(self.noise.clone()));
        let raw = (self.base + self.amplitude * self.cycle(clock) + noise).round();
        if raw <= 0.0 { 0 } else { raw as u32 }
    }
}
