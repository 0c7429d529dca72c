//! Physics backend abstraction.
//!
//! The controller consumes the host physics engine through this port:
//! velocity readback, velocity-change impulse application, body transforms, and the fixed
//! simulation clock. Swapping the backend (Rapier2D included, a hand-rolled
//! fake in the tests) never touches the state machine.

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// The backend is also responsible for refilling each character's
/// [`ContactBuffer`](crate::contact::ContactBuffer) every fixed step, via a
/// system its [`plugin`](CharacterPhysicsBackend::plugin) registers in
/// [`CharacterControllerSet::GatherContacts`](crate::CharacterControllerSet::GatherContacts).
///
/// For an example implementation see the `rapier` module's `RapierBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Current linear velocity of an entity's rigid body.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Apply an instantaneous velocity change to an entity's rigid body.
    fn apply_impulse(world: &mut World, entity: Entity, delta_v: Vec2);

    /// Current world position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Local-frame center of mass of an entity's rigid body.
    fn get_center_of_mass(_world: &World, _entity: Entity) -> Vec2 {
        Vec2::ZERO
    }

    /// The monotonically increasing fixed simulation clock, in seconds.
    fn get_fixed_time(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.elapsed_secs())
            .unwrap_or(0.0)
    }

    /// The fixed timestep delta, in seconds.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&dt| dt > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
