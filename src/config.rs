//! Controller configuration.
//!
//! All tunables of the character state machine live here. Configuration is
//! config-time data: it is validated once when the character spawns and never
//! mutated during the simulation.

use bevy::prelude::*;
use thiserror::Error;

/// Invalid controller configuration.
///
/// Raised by [`ControllerConfig::validate`]; the plugin's validation system
/// turns it into a startup panic so bad tuning fails fast instead of
/// producing NaNs mid-simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A tunable that must be a positive finite number is not.
    #[error("`{name}` must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    /// A duration or cooldown is negative or non-finite.
    #[error("`{name}` must be a non-negative finite number, got {value}")]
    Negative { name: &'static str, value: f32 },
    /// The walkable-slope cosine is outside the open unit interval.
    #[error("`max_walk_cos` must be in (0, 1), got {0}")]
    WalkCosOutOfRange(f32),
    /// The character must have at least one jump charge.
    #[error("`jump_count` must be at least 1")]
    ZeroJumpCount,
    /// The jump fall-off curve must decay monotonically from 1 to 0.
    #[error("jump fall-off curve must be non-increasing with values in [0, 1]")]
    MalformedFallOff,
}

/// Piecewise-linear time-fraction → speed-multiplier curve for the jump arc.
///
/// Evaluated with the jump stopwatch's completion: 1 at lift-off, decaying to
/// 0 as the jump window closes. Must be non-increasing.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct JumpFallOff {
    keys: Vec<(f32, f32)>,
}

impl Default for JumpFallOff {
    fn default() -> Self {
        Self::linear()
    }
}

impl JumpFallOff {
    /// The straight line from `(0, 1)` to `(1, 0)`.
    pub fn linear() -> Self {
        Self {
            keys: vec![(0.0, 1.0), (1.0, 0.0)],
        }
    }

    /// Build a curve from `(time_fraction, multiplier)` keys. Keys are sorted
    /// by time; validity is checked by [`ControllerConfig::validate`].
    pub fn from_keys(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Evaluate the curve at `t`, clamping outside the key range.
    pub fn evaluate(&self, t: f32) -> f32 {
        let Some(first) = self.keys.first() else {
            return 1.0;
        };
        if t <= first.0 {
            return first.1;
        }
        for window in self.keys.windows(2) {
            let (t0, v0) = window[0];
            let (t1, v1) = window[1];
            if t <= t1 {
                if t1 - t0 <= f32::EPSILON {
                    return v1;
                }
                let fraction = (t - t0) / (t1 - t0);
                return v0 + (v1 - v0) * fraction;
            }
        }
        self.keys.last().map(|k| k.1).unwrap_or(1.0)
    }

    fn is_well_formed(&self) -> bool {
        if self.keys.is_empty() {
            return false;
        }
        let mut previous = f32::INFINITY;
        for &(t, v) in &self.keys {
            if !t.is_finite() || !v.is_finite() {
                return false;
            }
            if !(0.0..=1.0).contains(&v) || v > previous {
                return false;
            }
            previous = v;
        }
        true
    }
}

/// All tunables of the character state machine.
///
/// Defaults reproduce a small, floaty platformer character: walk speed 7,
/// double jump, short dash attack, brief knockback stun.
///
/// # Example
///
/// ```rust
/// use impulse_character_controller::prelude::*;
///
/// let config = ControllerConfig::default()
///     .with_walk_speed(9.0)
///     .with_jump_count(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Walking ===
    /// Cosine of the steepest walkable slope; also the classification
    /// threshold for ground/wall/ceiling contacts.
    pub max_walk_cos: f32,
    /// Target horizontal speed at full input.
    pub walk_speed: f32,

    // === Jumping ===
    /// Vertical speed while the first jump charge is active.
    pub first_jump_speed: f32,
    /// Vertical speed for every subsequent (air) jump.
    pub jump_speed: f32,
    /// Terminal fall speed the vertical velocity decays toward while
    /// airborne.
    pub fall_speed: f32,
    /// Number of jump charges, refilled on ground contact.
    pub jump_count: u32,
    /// Active window of one jump arc, in seconds.
    pub jump_duration: f32,
    /// Cooldown before the jump stopwatch reads ready again. Jump re-entry is
    /// gated by charges rather than readiness, so this is usually 0.
    pub jump_cooldown: f32,
    /// Speed multiplier over the jump arc, from lift-off (1) to window end
    /// (0).
    pub jump_fall_off: JumpFallOff,

    // === Getting hit ===
    /// Per-axis knockback speed imposed on entering the hit state.
    pub bounce_back_strength: Vec2,
    /// How long the character stays unconscious before a ground or wall
    /// touch can end the hit state.
    pub unconscious_duration: f32,
    /// Minimum time between two hit-state entries.
    pub hit_cooldown: f32,
    /// Engine gravity, re-applied fourfold on top of the engine's own pull
    /// while unconscious.
    pub gravity: Vec2,

    // === Attacking ===
    /// Horizontal dash speed while attacking.
    pub attack_speed: f32,
    /// Active window of one attack, in seconds.
    pub attack_duration: f32,
    /// Minimum time between two attacks.
    pub attack_cooldown: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_walk_cos: 0.5,
            walk_speed: 7.0,

            first_jump_speed: 8.0,
            jump_speed: 3.0,
            fall_speed: 12.0,
            jump_count: 2,
            jump_duration: 0.4,
            jump_cooldown: 0.0,
            jump_fall_off: JumpFallOff::linear(),

            bounce_back_strength: Vec2::new(8.0, 12.0),
            unconscious_duration: 0.2,
            hit_cooldown: 0.2,
            gravity: Vec2::new(0.0, -9.81),

            attack_speed: 12.0,
            attack_duration: 0.2,
            attack_cooldown: 0.2,
        }
    }
}

impl ControllerConfig {
    /// Check every tunable; `Err` names the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NonPositive { name, value })
            }
        }
        fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Negative { name, value })
            }
        }

        if !(self.max_walk_cos.is_finite() && self.max_walk_cos > 0.0 && self.max_walk_cos < 1.0) {
            return Err(ConfigError::WalkCosOutOfRange(self.max_walk_cos));
        }
        positive("walk_speed", self.walk_speed)?;
        positive("first_jump_speed", self.first_jump_speed)?;
        positive("jump_speed", self.jump_speed)?;
        positive("fall_speed", self.fall_speed)?;
        if self.jump_count == 0 {
            return Err(ConfigError::ZeroJumpCount);
        }
        positive("jump_duration", self.jump_duration)?;
        non_negative("jump_cooldown", self.jump_cooldown)?;
        if !self.jump_fall_off.is_well_formed() {
            return Err(ConfigError::MalformedFallOff);
        }
        positive("bounce_back_strength.x", self.bounce_back_strength.x)?;
        positive("bounce_back_strength.y", self.bounce_back_strength.y)?;
        positive("unconscious_duration", self.unconscious_duration)?;
        non_negative("hit_cooldown", self.hit_cooldown)?;
        non_negative("gravity magnitude", self.gravity.length())?;
        positive("attack_speed", self.attack_speed)?;
        positive("attack_duration", self.attack_duration)?;
        non_negative("attack_cooldown", self.attack_cooldown)?;
        Ok(())
    }

    /// Builder: set the walk speed.
    pub fn with_walk_speed(mut self, speed: f32) -> Self {
        self.walk_speed = speed;
        self
    }

    /// Builder: set the walkable-slope cosine.
    pub fn with_max_walk_cos(mut self, cos: f32) -> Self {
        self.max_walk_cos = cos;
        self
    }

    /// Builder: set first and subsequent jump speeds.
    pub fn with_jump_speeds(mut self, first: f32, subsequent: f32) -> Self {
        self.first_jump_speed = first;
        self.jump_speed = subsequent;
        self
    }

    /// Builder: set the number of jump charges.
    pub fn with_jump_count(mut self, count: u32) -> Self {
        self.jump_count = count;
        self
    }

    /// Builder: set the jump window and its fall-off curve.
    pub fn with_jump_window(mut self, duration: f32, fall_off: JumpFallOff) -> Self {
        self.jump_duration = duration;
        self.jump_fall_off = fall_off;
        self
    }

    /// Builder: set the terminal fall speed.
    pub fn with_fall_speed(mut self, speed: f32) -> Self {
        self.fall_speed = speed;
        self
    }

    /// Builder: set the knockback strength per axis.
    pub fn with_bounce_back(mut self, strength: Vec2) -> Self {
        self.bounce_back_strength = strength;
        self
    }

    /// Builder: set the hit stun window and cooldown.
    pub fn with_hit_timing(mut self, unconscious: f32, cooldown: f32) -> Self {
        self.unconscious_duration = unconscious;
        self.hit_cooldown = cooldown;
        self
    }

    /// Builder: set the attack dash speed, window, and cooldown.
    pub fn with_attack(mut self, speed: f32, duration: f32, cooldown: f32) -> Self {
        self.attack_speed = speed;
        self.attack_duration = duration;
        self.attack_cooldown = cooldown;
        self
    }

    /// Builder: set the gravity used for the amplified hit-state pull.
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }
}
