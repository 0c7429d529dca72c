//! Cooldown/duration stopwatch driven by the fixed simulation clock.
//!
//! Unlike `bevy::time::Timer`, a [`FixedStopwatch`] is never ticked. It stores
//! the timestamp of its last split and answers every question against the
//! caller-supplied `now`, so it stays deterministic under the fixed-step
//! clock and costs nothing while idle.

use bevy::prelude::*;

/// A stateless-API stopwatch with a `duration` and a `cooldown` threshold.
///
/// `duration` gates how long the associated behavior lasts (`is_finished`),
/// `cooldown` gates how soon it may be started again (`is_ready`). By
/// convention `cooldown <= duration`, but the type does not require it.
///
/// # Example
///
/// ```rust
/// use impulse_character_controller::prelude::*;
///
/// let mut watch = FixedStopwatch::new(0.4, 0.1);
/// watch.split(10.0);
/// assert!(!watch.is_finished(10.2));
/// assert!(watch.is_ready(10.2));
/// assert!(watch.is_finished(10.5));
/// ```
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct FixedStopwatch {
    timestamp: f32,
    duration: f32,
    cooldown: f32,
}

impl FixedStopwatch {
    /// Create a stopwatch in the expired state: both `is_finished` and
    /// `is_ready` hold immediately, as after [`FixedStopwatch::reset`].
    pub fn new(duration: f32, cooldown: f32) -> Self {
        Self {
            timestamp: -(cooldown + duration + 1.0),
            duration,
            cooldown,
        }
    }

    /// Seconds since the last split.
    #[inline]
    pub fn elapsed(&self, now: f32) -> f32 {
        now - self.timestamp
    }

    /// Whether the active window (`duration`) has passed.
    #[inline]
    pub fn is_finished(&self, now: f32) -> bool {
        self.elapsed(now) > self.duration
    }

    /// Whether the re-entry window (`cooldown`) has passed.
    #[inline]
    pub fn is_ready(&self, now: f32) -> bool {
        self.elapsed(now) > self.cooldown
    }

    /// Fraction of the active window consumed, clamped to `[0, 1]`.
    #[inline]
    pub fn completion(&self, now: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed(now) / self.duration).clamp(0.0, 1.0)
    }

    /// Restart the stopwatch at `now`.
    pub fn split(&mut self, now: f32) {
        self.timestamp = now;
    }

    /// Rewind the stopwatch far enough into the past that both
    /// `is_finished` and `is_ready` hold immediately. Used to cancel a held
    /// jump arc mid-flight.
    pub fn reset(&mut self, now: f32) {
        self.timestamp = now - self.cooldown - self.duration - 1.0;
    }
}
