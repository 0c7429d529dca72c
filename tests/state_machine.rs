//! End-to-end tests running the plugin against a scripted physics backend.
//!
//! The backend stores body state in a plain component and reads time from a
//! manually advanced clock, so every fixed step is deterministic and
//! contacts can be staged exactly.

use bevy::prelude::*;
use impulse_character_controller::prelude::*;

const DT: f32 = 1.0 / 60.0;

#[derive(Component, Debug, Clone, Copy, Default)]
struct TestBody {
    velocity: Vec2,
    position: Vec2,
    center_of_mass: Vec2,
}

#[derive(Resource)]
struct TestClock {
    now: f32,
    dt: f32,
}

impl Default for TestClock {
    fn default() -> Self {
        Self { now: 0.0, dt: DT }
    }
}

struct TestBackendPlugin;

impl Plugin for TestBackendPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TestClock>();
    }
}

struct TestBackend;

impl CharacterPhysicsBackend for TestBackend {
    fn plugin() -> impl Plugin {
        TestBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<TestBody>(entity)
            .map(|body| body.velocity)
            .unwrap_or(Vec2::ZERO)
    }

    fn apply_impulse(world: &mut World, entity: Entity, delta_v: Vec2) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.velocity += delta_v;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<TestBody>(entity)
            .map(|body| body.position)
            .unwrap_or(Vec2::ZERO)
    }

    fn get_center_of_mass(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<TestBody>(entity)
            .map(|body| body.center_of_mass)
            .unwrap_or(Vec2::ZERO)
    }

    fn get_fixed_time(world: &World) -> f32 {
        world.resource::<TestClock>().now
    }

    fn get_fixed_timestep(world: &World) -> f32 {
        world.resource::<TestClock>().dt
    }
}

fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(CharacterControllerPlugin::<TestBackend>::default());
    app
}

fn spawn_character(app: &mut App) -> Entity {
    let config = ControllerConfig::default();
    let controller = CharacterController::new(&config);
    app.world_mut()
        .spawn((
            controller,
            config,
            InputIntent::default(),
            ContactBuffer::default(),
            TestBody::default(),
        ))
        .id()
}

fn tick(app: &mut App) {
    app.world_mut().resource_mut::<TestClock>().now += DT;
    app.world_mut().run_schedule(FixedUpdate);
}

fn set_ground(app: &mut App, entity: Entity) {
    let mut buffer = app.world_mut().get_mut::<ContactBuffer>(entity).unwrap();
    buffer.surfaces = vec![SurfaceContact::new(Vec2::new(0.0, -0.5), Vec2::Y)];
}

fn clear_contacts(app: &mut App, entity: Entity) {
    app.world_mut()
        .get_mut::<ContactBuffer>(entity)
        .unwrap()
        .begin_step();
}

fn set_enemy(app: &mut App, entity: Entity, body_position: Vec2, started: bool) {
    let mut buffer = app.world_mut().get_mut::<ContactBuffer>(entity).unwrap();
    buffer.enemies = vec![if started {
        EnemyContact::began(body_position)
    } else {
        EnemyContact::persisting(body_position)
    }];
}

fn intent(app: &mut App, entity: Entity) -> Mut<'_, InputIntent> {
    app.world_mut().get_mut::<InputIntent>(entity).unwrap()
}

fn controller(app: &App, entity: Entity) -> &CharacterController {
    app.world().get::<CharacterController>(entity).unwrap()
}

fn body(app: &App, entity: Entity) -> TestBody {
    *app.world().get::<TestBody>(entity).unwrap()
}

fn drain_hit_events(app: &mut App) -> usize {
    app.world_mut()
        .resource_mut::<Events<HitStateEntered>>()
        .drain()
        .count()
}

#[test]
fn grounded_character_walks_toward_input() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);
    set_ground(&mut app, entity);
    intent(&mut app, entity).set_move(Vec2::X);

    for _ in 0..120 {
        tick(&mut app);
    }

    let config = ControllerConfig::default();
    assert!((body(&app, entity).velocity.x - config.walk_speed).abs() < 0.05);
    let snapshot = controller(&app, entity).snapshot();
    assert!(snapshot.is_moving);
    assert_eq!(snapshot.facing_direction, 1);
    assert!(snapshot.is_grounded);
}

#[test]
fn held_jump_button_only_jumps_on_the_edge() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);
    set_ground(&mut app, entity);
    tick(&mut app);
    assert_eq!(controller(&app, entity).jumps_left(), 2);

    intent(&mut app, entity).set_jump_pressed(true);
    clear_contacts(&mut app, entity);
    tick(&mut app);
    assert_eq!(controller(&app, entity).jumps_left(), 1);

    // Still held: no new press, no second charge spent.
    tick(&mut app);
    tick(&mut app);
    assert_eq!(controller(&app, entity).jumps_left(), 1);
}

#[test]
fn double_jump_spends_both_charges() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);
    set_ground(&mut app, entity);
    tick(&mut app);

    let config = ControllerConfig::default();

    clear_contacts(&mut app, entity);
    intent(&mut app, entity).set_jump_pressed(true);
    tick(&mut app);
    assert_eq!(controller(&app, entity).jumps_left(), 1);
    assert!((body(&app, entity).velocity.y - config.first_jump_speed).abs() < 1e-3);

    // Release, then press again mid-air.
    intent(&mut app, entity).set_jump_pressed(false);
    tick(&mut app);
    intent(&mut app, entity).set_jump_pressed(true);
    tick(&mut app);
    assert_eq!(controller(&app, entity).jumps_left(), 0);
    assert!((body(&app, entity).velocity.y - config.jump_speed).abs() < 1e-3);

    // A third press finds no charges.
    intent(&mut app, entity).set_jump_pressed(false);
    tick(&mut app);
    intent(&mut app, entity).set_jump_pressed(true);
    tick(&mut app);
    assert_eq!(controller(&app, entity).jumps_left(), 0);
    assert!(body(&app, entity).velocity.y < config.jump_speed);
}

#[test]
fn hit_event_fires_once_per_knockback() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);

    set_enemy(&mut app, entity, Vec2::new(1.0, 0.0), true);
    tick(&mut app);
    assert_eq!(drain_hit_events(&mut app), 1);
    assert_eq!(controller(&app, entity).state(), CharacterState::Hit);

    // Another new collision one step later is inside the hit cooldown.
    set_enemy(&mut app, entity, Vec2::new(1.0, 0.0), true);
    tick(&mut app);
    assert_eq!(drain_hit_events(&mut app), 0);
}

#[test]
fn knockback_replaces_velocity_away_from_the_enemy() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);
    app.world_mut().get_mut::<TestBody>(entity).unwrap().velocity = Vec2::new(5.0, 0.0);

    set_enemy(&mut app, entity, Vec2::new(1.0, 0.0), true);
    tick(&mut app);

    let config = ControllerConfig::default();
    let velocity = body(&app, entity).velocity;
    // Enemy to the right, knockback to the left, plus one step of the
    // stunned gravity.
    assert!((velocity.x - (-config.bounce_back_strength.x)).abs() < 1e-3);
    assert!((velocity.y - config.gravity.y * 4.0 * DT).abs() < 1e-3);
}

#[test]
fn stunned_character_recovers_only_on_a_surface() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);

    set_enemy(&mut app, entity, Vec2::new(1.0, 0.0), true);
    tick(&mut app);
    clear_contacts(&mut app, entity);

    let config = ControllerConfig::default();
    let stun_ticks = (config.unconscious_duration / DT).ceil() as usize + 5;
    for _ in 0..stun_ticks {
        tick(&mut app);
        assert_eq!(controller(&app, entity).state(), CharacterState::Hit);
    }

    set_ground(&mut app, entity);
    tick(&mut app);
    assert_eq!(controller(&app, entity).state(), CharacterState::Movement);
}

#[test]
fn attack_needs_a_prior_ground_touch() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);

    // Never grounded.
    intent(&mut app, entity).set_attack_pressed(true);
    tick(&mut app);
    assert_eq!(controller(&app, entity).state(), CharacterState::Movement);

    // Ground first, then attack.
    intent(&mut app, entity).set_attack_pressed(false);
    set_ground(&mut app, entity);
    tick(&mut app);
    clear_contacts(&mut app, entity);
    intent(&mut app, entity).set_attack_pressed(true);
    tick(&mut app);
    assert_eq!(controller(&app, entity).state(), CharacterState::Attack);

    let config = ControllerConfig::default();
    assert!((body(&app, entity).velocity.x - config.attack_speed).abs() < 1e-3);
}

#[test]
fn hat_button_emits_one_event_per_press() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app);

    intent(&mut app, entity).set_hat_pressed(true);
    tick(&mut app);
    let drained = app
        .world_mut()
        .resource_mut::<Events<HatTriggered>>()
        .drain()
        .count();
    assert_eq!(drained, 1);

    // Held across the next step: no further event.
    tick(&mut app);
    let drained = app
        .world_mut()
        .resource_mut::<Events<HatTriggered>>()
        .drain()
        .count();
    assert_eq!(drained, 0);
}

#[test]
#[should_panic(expected = "invalid ControllerConfig")]
fn invalid_config_panics_on_spawn() {
    let mut app = create_test_app();
    let config = ControllerConfig::default().with_walk_speed(-1.0);
    let controller = CharacterController::new(&config);
    app.world_mut().spawn((
        controller,
        config,
        InputIntent::default(),
        ContactBuffer::default(),
        TestBody::default(),
    ));
    tick(&mut app);
}
