//! Fixed-schedule systems wiring the state machine to a physics backend.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::ControllerConfig;
use crate::contact::ContactBuffer;
use crate::controller::{CharacterController, InputSample, StepContext};
use crate::events::{HatTriggered, HitStateEntered};
use crate::intent::InputIntent;

/// Reject invalid tunables as soon as they are spawned. A bad configuration
/// is a programming error, so this panics rather than limping along with
/// degenerate movement.
pub fn validate_configs(configs: Query<(Entity, &ControllerConfig), Added<ControllerConfig>>) {
    for (entity, config) in &configs {
        if let Err(error) = config.validate() {
            panic!("invalid ControllerConfig on {entity}: {error}");
        }
    }
}

/// Emit [`HatTriggered`] on the hat button's rising edge. The controller
/// itself has no hat behavior; gameplay systems downstream decide what the
/// button does.
pub fn emit_hat_events(
    intents: Query<(Entity, &InputIntent), With<CharacterController>>,
    mut events: EventWriter<HatTriggered>,
) {
    for (entity, intent) in &intents {
        if intent.hat_edge() {
            events.send(HatTriggered { entity });
        }
    }
}

/// Run one state-machine step for every character and apply the resulting
/// impulses through the backend.
///
/// Exclusive over the world so the backend can read rigid-body state with
/// whatever access pattern its physics engine needs.
pub fn step_controllers<B: CharacterPhysicsBackend>(world: &mut World) {
    let now = B::get_fixed_time(world);
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<Entity> = world
        .query_filtered::<Entity, (
            With<CharacterController>,
            With<ControllerConfig>,
            With<InputIntent>,
            With<ContactBuffer>,
        )>()
        .iter(world)
        .collect();

    for entity in entities {
        let velocity = B::get_velocity(world, entity);
        let position = B::get_position(world, entity);
        let center_of_mass = B::get_center_of_mass(world, entity);

        let Some(entity_ref) = world.get_entity(entity).ok() else {
            continue;
        };
        let config = entity_ref.get::<ControllerConfig>().cloned();
        let intent = entity_ref.get::<InputIntent>().cloned();
        let contacts = entity_ref.get::<ContactBuffer>().cloned();
        let (Some(config), Some(intent), Some(contacts)) = (config, intent, contacts) else {
            continue;
        };

        let ctx = StepContext {
            now,
            dt,
            velocity,
            position,
            center_of_mass,
            input: InputSample::from_intent(&intent),
            surfaces: &contacts.surfaces,
            enemies: &contacts.enemies,
        };

        let Some(mut controller) = world.get_mut::<CharacterController>(entity) else {
            continue;
        };
        let out = controller.step(&config, &ctx);

        if out.impulse != Vec2::ZERO {
            B::apply_impulse(world, entity, out.impulse);
        }
        if out.entered_hit {
            debug!("character {entity} entered hit state");
            world.send_event(HitStateEntered { entity });
        }
    }
}

/// Shift this step's button states into the previous-step slots so the edge
/// queries report fresh transitions next step. Runs last in the fixed
/// chain.
pub fn refresh_input_edges(mut intents: Query<&mut InputIntent, With<CharacterController>>) {
    for mut intent in &mut intents {
        intent.refresh_edges();
    }
}
