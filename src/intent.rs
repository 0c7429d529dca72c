//! Input intent component.
//!
//! [`InputIntent`] is the input boundary of the controller: an input layer
//! (keyboard, gamepad, AI, network) writes the current move vector and button
//! states at its own cadence, and the controller latches them at the next
//! fixed step. Buttons are edge-detected against the previous step's state,
//! so a press or release is consumed exactly once.

use bevy::prelude::*;

/// Latched input state for one character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use impulse_character_controller::prelude::*;
///
/// let mut intent = InputIntent::default();
/// intent.set_move(Vec2::new(1.0, 0.0));
/// intent.set_jump_pressed(true);
/// assert!(intent.jump_edge());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct InputIntent {
    /// Desired movement direction; only the x component drives walking.
    pub direction: Vec2,
    /// Whether the jump button is currently held.
    pub jump_pressed: bool,
    /// Whether the attack button is currently held.
    pub attack_pressed: bool,
    /// Whether the (cosmetic) hat button is currently held.
    pub hat_pressed: bool,

    // Previous-step states for edge detection, advanced by the controller
    // at the end of each fixed step.
    pub(crate) jump_pressed_prev: bool,
    pub(crate) attack_pressed_prev: bool,
    pub(crate) hat_pressed_prev: bool,
}

impl InputIntent {
    /// Set the desired movement direction. Components are clamped to
    /// `[-1, 1]`.
    pub fn set_move(&mut self, direction: Vec2) {
        self.direction = direction.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    }

    /// Set the jump button state.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Set the attack button state.
    pub fn set_attack_pressed(&mut self, pressed: bool) {
        self.attack_pressed = pressed;
    }

    /// Set the hat button state.
    pub fn set_hat_pressed(&mut self, pressed: bool) {
        self.hat_pressed = pressed;
    }

    /// Rising edge of the jump button since the last fixed step.
    pub fn jump_edge(&self) -> bool {
        self.jump_pressed && !self.jump_pressed_prev
    }

    /// Falling edge of the jump button since the last fixed step.
    pub fn jump_released(&self) -> bool {
        !self.jump_pressed && self.jump_pressed_prev
    }

    /// Rising edge of the attack button since the last fixed step.
    pub fn attack_edge(&self) -> bool {
        self.attack_pressed && !self.attack_pressed_prev
    }

    /// Rising edge of the hat button since the last fixed step.
    pub fn hat_edge(&self) -> bool {
        self.hat_pressed && !self.hat_pressed_prev
    }

    /// Advance the edge baseline. Called once at the end of each fixed step.
    pub(crate) fn refresh_edges(&mut self) {
        self.jump_pressed_prev = self.jump_pressed;
        self.attack_pressed_prev = self.attack_pressed;
        self.hat_pressed_prev = self.hat_pressed;
    }
}
