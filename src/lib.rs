//! Impulse-driven 2D platformer character movement for Bevy.
//!
//! A character is an entity with a [`CharacterController`], a
//! [`ControllerConfig`], an [`InputIntent`], and a [`ContactBuffer`]. Input
//! systems write intents at render rate; once per fixed step the controller
//! classifies the contacts the physics backend gathered, runs its state
//! machine (movement, attack, hit), and applies a velocity-change impulse
//! through the backend.
//!
//! The physics engine sits behind the [`CharacterPhysicsBackend`] trait.
//! The built-in [`RapierBackend`](rapier::RapierBackend) integrates with
//! `bevy_rapier2d` (feature `rapier2d`, enabled by default); tests and other
//! engines can provide their own.
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_rapier2d::prelude::*;
//! use impulse_character_controller::prelude::*;
//! use impulse_character_controller::rapier::{RapierBackend, RapierCharacterBundle};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
//!         .add_plugins(CharacterControllerPlugin::<RapierBackend>::default())
//!         .add_systems(Startup, spawn_character)
//!         .add_systems(Update, read_keyboard)
//!         .run();
//! }
//!
//! fn spawn_character(mut commands: Commands) {
//!     commands.spawn((
//!         RapierCharacterBundle::rotation_locked(),
//!         Collider::capsule_y(0.4, 0.3),
//!     ));
//! }
//!
//! fn read_keyboard(
//!     keys: Res<ButtonInput<KeyCode>>,
//!     mut intents: Query<&mut InputIntent>,
//! ) {
//!     for mut intent in &mut intents {
//!         let mut direction = Vec2::ZERO;
//!         if keys.pressed(KeyCode::ArrowLeft) {
//!             direction.x -= 1.0;
//!         }
//!         if keys.pressed(KeyCode::ArrowRight) {
//!             direction.x += 1.0;
//!         }
//!         intent.set_move(direction);
//!         intent.set_jump_pressed(keys.pressed(KeyCode::Space));
//!         intent.set_attack_pressed(keys.pressed(KeyCode::KeyX));
//!     }
//! }
//! ```

pub mod backend;
pub mod config;
pub mod confine;
pub mod contact;
pub mod controller;
pub mod events;
pub mod intent;
#[cfg(feature = "rapier2d")]
pub mod rapier;
pub mod stopwatch;
mod systems;

use bevy::prelude::*;
use std::marker::PhantomData;

use crate::backend::CharacterPhysicsBackend;

/// Fixed-schedule phases of the controller, chained in declaration order.
///
/// Backends add their contact-gathering systems to
/// [`GatherContacts`](CharacterControllerSet::GatherContacts); game code
/// that must observe a step's outcome before the edges are consumed can
/// order itself between [`Step`](CharacterControllerSet::Step) and
/// [`Refresh`](CharacterControllerSet::Refresh).
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    /// Validate freshly added configurations.
    LatchInput,
    /// Backend refills each character's [`ContactBuffer`](contact::ContactBuffer).
    GatherContacts,
    /// Run the state machine and apply impulses.
    Step,
    /// Consume input edges for the next step.
    Refresh,
}

/// Adds the character controller systems for one physics backend.
///
/// Registers the component types for reflection, the controller events, the
/// backend's own plugin, and the fixed-schedule systems.
pub struct CharacterControllerPlugin<B: CharacterPhysicsBackend> {
    _backend: PhantomData<B>,
}

impl<B: CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B: CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<controller::CharacterController>()
            .register_type::<config::ControllerConfig>()
            .register_type::<intent::InputIntent>()
            .register_type::<contact::ContactBuffer>()
            .register_type::<contact::ContactLayers>()
            .add_event::<events::HitStateEntered>()
            .add_event::<events::HatTriggered>()
            .add_plugins(B::plugin())
            .configure_sets(
                FixedUpdate,
                (
                    CharacterControllerSet::LatchInput,
                    CharacterControllerSet::GatherContacts,
                    CharacterControllerSet::Step,
                    CharacterControllerSet::Refresh,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (systems::validate_configs, systems::emit_hat_events)
                    .in_set(CharacterControllerSet::LatchInput),
            )
            .add_systems(
                FixedUpdate,
                systems::step_controllers::<B>.in_set(CharacterControllerSet::Step),
            )
            .add_systems(
                FixedUpdate,
                systems::refresh_input_edges.in_set(CharacterControllerSet::Refresh),
            );
    }
}

pub mod prelude {
    //! Common imports for crates building on the controller.
    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::config::{ConfigError, ControllerConfig, JumpFallOff};
    pub use crate::confine::confine_point;
    pub use crate::contact::{
        ContactBuffer, ContactLayers, ContactSet, EnemyContact, SurfaceContact,
    };
    pub use crate::controller::{
        CharacterController, CharacterState, ControllerSnapshot, InputSample, StepContext,
        StepOutput,
    };
    pub use crate::events::{HatTriggered, HitStateEntered};
    pub use crate::intent::InputIntent;
    pub use crate::stopwatch::FixedStopwatch;
    pub use crate::{CharacterControllerPlugin, CharacterControllerSet};
}
