//! `bevy_rapier2d` physics backend.
//!
//! Reads rigid-body state from Rapier components, applies impulses by
//! editing [`Velocity`] directly, and refills each character's
//! [`ContactBuffer`] from Rapier's narrow phase every fixed step.

use bevy::prelude::*;
use bevy::utils::HashSet;
use bevy_rapier2d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::ControllerConfig;
use crate::contact::{ContactBuffer, ContactLayers, EnemyContact, SurfaceContact};
use crate::controller::CharacterController;
use crate::intent::InputIntent;
use crate::CharacterControllerSet;

/// Backend over `bevy_rapier2d` dynamic rigid bodies.
pub struct RapierBackend;

impl CharacterPhysicsBackend for RapierBackend {
    fn plugin() -> impl Plugin {
        RapierBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|velocity| velocity.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn apply_impulse(world: &mut World, entity: Entity, delta_v: Vec2) {
        if let Some(mut velocity) = world.get_mut::<Velocity>(entity) {
            velocity.linvel += delta_v;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        if let Some(transform) = world.get::<GlobalTransform>(entity) {
            return transform.translation().truncate();
        }
        world
            .get::<Transform>(entity)
            .map(|transform| transform.translation.truncate())
            .unwrap_or(Vec2::ZERO)
    }

    fn get_center_of_mass(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<ReadMassProperties>(entity)
            .map(|properties| properties.local_center_of_mass)
            .unwrap_or(Vec2::ZERO)
    }
}

/// Adds the Rapier contact-gathering system. Assumes the
/// `RapierPhysicsPlugin` is installed separately by the application.
pub struct RapierBackendPlugin;

impl Plugin for RapierBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            gather_contacts.in_set(CharacterControllerSet::GatherContacts),
        );
    }
}

/// Refill every character's [`ContactBuffer`] from Rapier's narrow phase.
///
/// Surfaces come from the ground layer with world-space solver points and
/// normals oriented toward the character; enemy contacts carry the other
/// body's position and whether the collision began this step.
fn gather_contacts(
    rapier: ReadRapierContext,
    mut collision_events: EventReader<CollisionEvent>,
    mut characters: Query<(Entity, &ContactLayers, &mut ContactBuffer), With<CharacterController>>,
    groups: Query<&CollisionGroups>,
    transforms: Query<&GlobalTransform>,
) {
    let Ok((simulation, colliders, joints, query_pipeline, rigidbody_set)) =
        rapier.rapier_context.get_single()
    else {
        return;
    };
    let context = RapierContext {
        simulation,
        colliders,
        joints,
        query_pipeline,
        rigidbody_set,
    };

    let mut started_pairs: HashSet<(Entity, Entity)> = HashSet::default();
    for event in collision_events.read() {
        if let CollisionEvent::Started(first, second, _) = event {
            started_pairs.insert((*first, *second));
            started_pairs.insert((*second, *first));
        }
    }

    for (entity, layers, mut buffer) in &mut characters {
        buffer.begin_step();

        for pair in context.contact_pairs_with(entity) {
            if !pair.has_any_active_contact() {
                continue;
            }

            let character_is_first = pair.collider1() == entity;
            let other = if character_is_first {
                pair.collider2()
            } else {
                pair.collider1()
            };
            let memberships = groups
                .get(other)
                .map(|group| group.memberships.bits())
                .unwrap_or(u32::MAX);

            if memberships & layers.enemy != 0 {
                let body_position = transforms
                    .get(other)
                    .map(|transform| transform.translation().truncate())
                    .unwrap_or(Vec2::ZERO);
                let contact = if started_pairs.contains(&(entity, other)) {
                    EnemyContact::began(body_position)
                } else {
                    EnemyContact::persisting(body_position)
                };
                buffer.enemies.push(contact);
                continue;
            }

            if memberships & layers.ground == 0 {
                continue;
            }

            for manifold in pair.manifolds() {
                // Rapier orients manifold normals from the first collider
                // toward the second; surfaces are reported facing the
                // character.
                let normal = if character_is_first {
                    -manifold.normal()
                } else {
                    manifold.normal()
                };
                for index in 0..manifold.num_solver_contacts() {
                    if let Some(solver_contact) = manifold.solver_contact(index) {
                        buffer
                            .surfaces
                            .push(SurfaceContact::new(solver_contact.point(), normal));
                    }
                }
            }
        }
    }
}

/// Everything a Rapier-backed character entity needs besides a [`Collider`].
#[derive(Bundle)]
pub struct RapierCharacterBundle {
    pub controller: CharacterController,
    pub config: ControllerConfig,
    pub intent: InputIntent,
    pub contacts: ContactBuffer,
    pub layers: ContactLayers,
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    pub mass_properties: ReadMassProperties,
    pub active_events: ActiveEvents,
    pub locked_axes: LockedAxes,
    pub transform: Transform,
}

impl RapierCharacterBundle {
    /// Build a character from a configuration. Collision events are enabled
    /// so enemy contacts can tell began from persisting.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            controller: CharacterController::new(&config),
            config,
            intent: InputIntent::default(),
            contacts: ContactBuffer::default(),
            layers: ContactLayers::default(),
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::zero(),
            mass_properties: ReadMassProperties::default(),
            active_events: ActiveEvents::COLLISION_EVENTS,
            locked_axes: LockedAxes::empty(),
            transform: Transform::default(),
        }
    }

    /// A character that never tips over, the usual platformer setup.
    pub fn rotation_locked() -> Self {
        Self {
            locked_axes: LockedAxes::ROTATION_LOCKED,
            ..Self::new(ControllerConfig::default())
        }
    }

    /// Restrict which collision layers count as ground and which as enemies.
    pub fn with_layers(mut self, layers: ContactLayers) -> Self {
        self.layers = layers;
        self
    }
}
