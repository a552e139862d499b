//! Tick timing types shared by every updating subsystem.
//!
//! The core is frame-driven: one logical tick corresponds to one rendered
//! frame at the nominal rate of [`TICK_HZ`]. Real elapsed time between frame
//! callbacks is converted into fractional ticks by the orchestrator, and
//! slow motion is expressed as a multiplicative scalar on top of that —
//! never by changing the tick rate itself.

use serde::{Deserialize, Serialize};

/// Nominal tick rate, in ticks per second.
pub const TICK_HZ: f32 = 60.0;

/// Milliseconds per nominal tick.
pub const MS_PER_TICK: f64 = 1000.0 / 60.0;

/// A single update step: elapsed ticks plus the active dilation factor.
///
/// `dt` is real elapsed time in nominal ticks (1.0 = one frame at 60 Hz).
/// `dilation` is the slow-motion multiplier (≤ 1.0 normally, forced low
/// while the session is dying). Gameplay countdowns and part behaviors
/// advance by [`TimeStep::scaled`]; wall-clock sequences advance by `dt`
/// alone.
///
/// # Example
///
/// ```
/// use arclight_core::time::TimeStep;
///
/// let step = TimeStep::new(1.0, 0.2);
/// assert!((step.scaled() - 0.2).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    /// Real elapsed time in nominal ticks.
    pub dt: f32,
    /// Active time-dilation factor.
    pub dilation: f32,
}

impl TimeStep {
    /// One full tick at normal speed.
    pub const ONE: Self = Self {
        dt: 1.0,
        dilation: 1.0,
    };

    /// Creates a new time step.
    #[must_use]
    pub const fn new(dt: f32, dilation: f32) -> Self {
        Self { dt, dilation }
    }

    /// Returns the dilation-scaled step used for gameplay time advancement.
    #[must_use]
    pub fn scaled(self) -> f32 {
        self.dt * self.dilation
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        Self::ONE
    }
}
