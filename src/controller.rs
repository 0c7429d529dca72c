//! The character state machine.
//!
//! [`CharacterController`] converts latched input, classified contacts, and
//! stopwatch state into a velocity-change impulse once per fixed step. It is
//! the sole writer of the public observable state; renderer, audio, and
//! camera collaborators read the snapshot (or subscribe to the events in
//! [`crate::events`]) on their own cadence.
//!
//! The per-step computation is pure with respect to the ECS: everything the
//! machine needs arrives in a [`StepContext`] and everything it wants done
//! leaves in a [`StepOutput`], so the whole state machine is unit-testable
//! without a physics engine.

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::contact::{ContactSet, EnemyContact, SurfaceContact};
use crate::intent::InputIntent;
use crate::stopwatch::FixedStopwatch;

/// The three top-level behavior states. Exactly one is active at a time.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterState {
    /// Walking, falling, and jumping. The initial state.
    #[default]
    Movement,
    /// Horizontal dash toward the facing direction.
    Attack,
    /// Knockback stun after an enemy collision.
    Hit,
}

/// Input edges and held state sampled for one fixed step.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSample {
    /// Desired movement direction.
    pub direction: Vec2,
    /// Whether the jump button is held this step.
    pub jump_held: bool,
    /// Rising edge of the jump button.
    pub jump_pressed: bool,
    /// Falling edge of the jump button.
    pub jump_released: bool,
    /// Rising edge of the attack button.
    pub attack_pressed: bool,
}

impl InputSample {
    /// Sample the current edges from a latched [`InputIntent`].
    pub fn from_intent(intent: &InputIntent) -> Self {
        Self {
            direction: intent.direction,
            jump_held: intent.jump_pressed,
            jump_pressed: intent.jump_edge(),
            jump_released: intent.jump_released(),
            attack_pressed: intent.attack_edge(),
        }
    }
}

/// Everything the state machine consumes during one fixed step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// The fixed simulation clock, in seconds.
    pub now: f32,
    /// The fixed timestep delta, in seconds.
    pub dt: f32,
    /// Rigid-body velocity before this step's impulse.
    pub velocity: Vec2,
    /// World position of the character.
    pub position: Vec2,
    /// Local-frame center of mass of the rigid body.
    pub center_of_mass: Vec2,
    /// Input edges latched since the previous step.
    pub input: InputSample,
    /// Current ground-layer contacts, refilled by the backend this step.
    pub surfaces: &'a [SurfaceContact],
    /// Current enemy-layer contacts, refilled by the backend this step.
    pub enemies: &'a [EnemyContact],
}

/// Everything the state machine wants done after one fixed step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutput {
    /// Accumulated velocity change to apply through the backend.
    pub impulse: Vec2,
    /// Whether the hit state was entered this step (fires
    /// [`HitStateEntered`](crate::events::HitStateEntered)).
    pub entered_hit: bool,
}

/// Read-only snapshot of the controller's observable state, refreshed at the
/// end of each fixed step.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ControllerSnapshot {
    /// The active behavior state.
    pub state: CharacterState,
    /// Latched desired movement direction.
    pub desired_direction: Vec2,
    /// Whether the jump button was held this step.
    pub wants_to_jump: bool,
    /// Whether velocity and input agree on a horizontal direction.
    pub is_moving: bool,
    /// `-1` facing left, `+1` facing right.
    pub facing_direction: i32,
    /// Whether a ground contact was classified this step.
    pub is_grounded: bool,
    /// Effective rigid-body velocity after this step's impulse.
    pub velocity: Vec2,
    /// Fraction of the attack window consumed, in `[0, 1]`.
    pub attack_completion: f32,
    /// Fraction of the jump window consumed, in `[0, 1]`.
    pub jump_completion: f32,
    /// Whether a jump arc is active.
    pub is_jumping: bool,
    /// Whether the active jump consumed the first charge.
    pub is_first_jump: bool,
}

/// The character state machine component.
///
/// Owns the three stopwatches and the current step's classified contacts; it
/// does not own the rigid body and only requests velocity changes through
/// the backend port.
///
/// # Example
///
/// ```rust
/// use impulse_character_controller::prelude::*;
///
/// let config = ControllerConfig::default();
/// let controller = CharacterController::new(&config);
/// assert_eq!(controller.state(), CharacterState::Movement);
/// assert!(!controller.is_grounded());
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CharacterController {
    state: CharacterState,
    facing_direction: i32,
    is_moving: bool,
    desired_direction: Vec2,
    wants_to_jump: bool,

    jumps_left: u32,
    jump_count: u32,
    was_on_ground: bool,
    can_attack: bool,

    jump_stopwatch: FixedStopwatch,
    hit_stopwatch: FixedStopwatch,
    attack_stopwatch: FixedStopwatch,

    contacts: ContactSet,
    velocity: Vec2,
    now: f32,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new(&ControllerConfig::default())
    }
}

impl CharacterController {
    /// Create a controller for the given configuration.
    ///
    /// Stopwatches start expired, so the character can attack immediately
    /// and is not considered mid-jump. Jump charges start empty and are
    /// first refilled on ground contact.
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            state: CharacterState::Movement,
            facing_direction: 1,
            is_moving: false,
            desired_direction: Vec2::ZERO,
            wants_to_jump: false,

            jumps_left: 0,
            jump_count: config.jump_count,
            was_on_ground: false,
            can_attack: false,

            jump_stopwatch: FixedStopwatch::new(config.jump_duration, config.jump_cooldown),
            hit_stopwatch: FixedStopwatch::new(config.unconscious_duration, config.hit_cooldown),
            attack_stopwatch: FixedStopwatch::new(config.attack_duration, config.attack_cooldown),

            contacts: ContactSet::default(),
            velocity: Vec2::ZERO,
            now: 0.0,
        }
    }

    // === Observable state ===

    /// The active behavior state.
    pub fn state(&self) -> CharacterState {
        self.state
    }

    /// Latched desired movement direction.
    pub fn desired_direction(&self) -> Vec2 {
        self.desired_direction
    }

    /// Whether the jump button was held this step.
    pub fn wants_to_jump(&self) -> bool {
        self.wants_to_jump
    }

    /// Whether velocity and input agree on a horizontal direction.
    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// `-1` facing left, `+1` facing right.
    pub fn facing_direction(&self) -> i32 {
        self.facing_direction
    }

    /// Whether a ground contact was classified this step.
    pub fn is_grounded(&self) -> bool {
        self.contacts.ground.is_some()
    }

    /// Effective rigid-body velocity after the last step's impulse.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Remaining jump charges.
    pub fn jumps_left(&self) -> u32 {
        self.jumps_left
    }

    /// Fraction of the attack window consumed, in `[0, 1]`.
    pub fn attack_completion(&self) -> f32 {
        self.attack_stopwatch.completion(self.now)
    }

    /// Fraction of the jump window consumed, in `[0, 1]`.
    pub fn jump_completion(&self) -> f32 {
        self.jump_stopwatch.completion(self.now)
    }

    /// Whether a jump arc is active.
    pub fn is_jumping(&self) -> bool {
        !self.jump_stopwatch.is_finished(self.now)
    }

    /// Whether the active jump consumed the first charge.
    pub fn is_first_jump(&self) -> bool {
        self.jumps_left == self.jump_count - 1
    }

    /// The contacts classified this step.
    pub fn contacts(&self) -> &ContactSet {
        &self.contacts
    }

    /// The full observable state in one read.
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            desired_direction: self.desired_direction,
            wants_to_jump: self.wants_to_jump,
            is_moving: self.is_moving,
            facing_direction: self.facing_direction,
            is_grounded: self.is_grounded(),
            velocity: self.velocity,
            attack_completion: self.attack_completion(),
            jump_completion: self.jump_completion(),
            is_jumping: self.is_jumping(),
            is_first_jump: self.is_first_jump(),
        }
    }

    // === Per-step computation ===

    /// Run one fixed step.
    ///
    /// Consumes the step's input edges, reclassifies contacts, processes
    /// enemy collisions, runs the active state's behavior, and refreshes the
    /// observable state. The returned impulse is the total velocity change
    /// to apply to the rigid body.
    pub fn step(&mut self, config: &ControllerConfig, ctx: &StepContext) -> StepOutput {
        self.now = ctx.now;
        self.desired_direction = ctx.input.direction;
        self.wants_to_jump = ctx.input.jump_held;

        let mut velocity = ctx.velocity;
        let mut out = StepOutput::default();

        if ctx.input.jump_pressed {
            self.request_jump();
        }
        if ctx.input.jump_released {
            self.jump_stopwatch.reset(self.now);
        }
        if ctx.input.attack_pressed {
            self.try_enter_attack();
        }

        self.contacts = ContactSet::classify(ctx.surfaces, config.max_walk_cos);

        for enemy in ctx.enemies {
            if let Some(knockback) = self.try_enter_hit(config, ctx, enemy, velocity) {
                velocity += knockback;
                out.impulse += knockback;
                out.entered_hit = true;
            }
        }

        let delta_v = match self.state {
            CharacterState::Movement => self.update_movement(config, ctx, velocity),
            CharacterState::Attack => self.update_attack(config, velocity),
            CharacterState::Hit => self.update_hit(config, ctx, velocity),
        };
        out.impulse += delta_v;
        velocity += delta_v;

        self.velocity = velocity;
        out
    }

    /// Consume a jump charge and restart the jump arc. No-op outside
    /// Movement or with no charges left; air presses are deliberately
    /// allowed, which is what makes multi-jumps work.
    fn request_jump(&mut self) {
        if self.state != CharacterState::Movement || self.jumps_left == 0 {
            return;
        }
        self.jumps_left -= 1;
        self.jump_stopwatch.split(self.now);
    }

    /// Enter the attack state if permitted. The ground-touch permission
    /// (`can_attack`) and the attack cooldown both gate entry; a failed
    /// request is silently ignored.
    fn try_enter_attack(&mut self) {
        if self.state != CharacterState::Movement
            || !self.attack_stopwatch.is_ready(self.now)
            || !self.can_attack
        {
            return;
        }
        self.state = CharacterState::Attack;
        self.attack_stopwatch.split(self.now);
        self.can_attack = false;
    }

    /// Enter (or re-enter) the hit state for one enemy contact. Returns the
    /// velocity-replacing knockback on entry, `None` when the guard fails.
    ///
    /// While already in Hit only contacts that began this step may
    /// re-trigger; either way the hit cooldown must have elapsed.
    fn try_enter_hit(
        &mut self,
        config: &ControllerConfig,
        ctx: &StepContext,
        enemy: &EnemyContact,
        velocity: Vec2,
    ) -> Option<Vec2> {
        if self.state == CharacterState::Hit && !enemy.started {
            return None;
        }
        if !self.hit_stopwatch.is_ready(self.now) {
            return None;
        }

        self.state = CharacterState::Hit;
        self.hit_stopwatch.split(self.now);

        let relative_position = enemy.body_position - ctx.position;
        let direction = (ctx.center_of_mass - relative_position).normalize_or_zero();
        Some(direction * config.bounce_back_strength - velocity)
    }

    fn update_movement(
        &mut self,
        config: &ControllerConfig,
        ctx: &StepContext,
        previous_velocity: Vec2,
    ) -> Vec2 {
        let mut delta_v = Vec2::ZERO;

        // Facing flips only when velocity and input agree in sign, with a
        // small dead zone on both so the sprite doesn't flicker at rest.
        self.is_moving = false;
        if previous_velocity.x > 0.1 && self.desired_direction.x > 0.01 {
            self.is_moving = true;
            self.facing_direction = 1;
        } else if previous_velocity.x < -0.1 && self.desired_direction.x < -0.01 {
            self.is_moving = true;
            self.facing_direction = -1;
        }

        if self.wants_to_jump && self.is_jumping() {
            self.was_on_ground = false;

            let base_speed = if self.is_first_jump() {
                config.first_jump_speed
            } else {
                config.jump_speed
            };
            let jump_speed = base_speed * config.jump_fall_off.evaluate(self.jump_completion());
            delta_v.y = jump_speed - previous_velocity.y;

            if self.contacts.ceiling.is_some() {
                self.jump_stopwatch.reset(self.now);
            }
        } else if self.contacts.ground.is_some() {
            self.jumps_left = self.jump_count;
            self.was_on_ground = true;
            self.can_attack = true;
        } else {
            // Walking off a ledge costs a charge, same as a jump would.
            if self.was_on_ground {
                self.jumps_left = self.jumps_left.saturating_sub(1);
                self.was_on_ground = false;
            }

            delta_v.y = (-config.fall_speed - previous_velocity.y) / 8.0;
        }

        delta_v.x = (self.desired_direction.x * config.walk_speed - previous_velocity.x) / 4.0;

        // Pushing into a wall would otherwise let the blend climb it.
        if let Some(wall) = self.contacts.wall {
            let wall_direction = (wall.point.x - ctx.position.x).signum();
            let walk_direction = self.desired_direction.x.signum();

            if walk_direction == wall_direction {
                delta_v.x = 0.0;
            }
        }

        delta_v
    }

    fn update_attack(&mut self, config: &ControllerConfig, previous_velocity: Vec2) -> Vec2 {
        let target = Vec2::new(self.facing_direction as f32 * config.attack_speed, 0.0);
        let delta_v = target - previous_velocity;

        if self.attack_stopwatch.is_finished(self.now) || self.contacts.wall.is_some() {
            self.attack_stopwatch.split(self.now);
            self.state = CharacterState::Movement;
        }

        delta_v
    }

    fn update_hit(
        &mut self,
        config: &ControllerConfig,
        ctx: &StepContext,
        previous_velocity: Vec2,
    ) -> Vec2 {
        self.facing_direction = if previous_velocity.x < 0.0 { -1 } else { 1 };

        // Amplified gravity on top of the engine's own pull, as a per-step
        // velocity change.
        let delta_v = config.gravity * 4.0 * ctx.dt;

        // Recovery needs both the stun to have elapsed and a surface touch,
        // so the character never wakes up mid-air.
        if self.hit_stopwatch.is_finished(self.now)
            && (self.contacts.ground.is_some() || self.contacts.wall.is_some())
        {
            self.hit_stopwatch.split(self.now);
            self.state = CharacterState::Movement;
        }

        delta_v
    }
}
