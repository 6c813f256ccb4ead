//! PlayerControllerPlugin integration tests
//!
//! Без Rapier: schedules гоняем вручную (Update, FixedUpdate),
//! ray cast без RapierContext → земли нет.
//! С Rapier: create_physics_app, один fixed step на app.update(),
//! tuning по умолчанию.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use dashrun_simulation::logger::{self, LogLevel, LogPrinter};
use dashrun_simulation::physics::layers::{self, LAYER_GROUND, LAYER_OBSTACLES};
use dashrun_simulation::physics::RapierGroundProbe;
use dashrun_simulation::*;

/// App с плагином контроллера, но без физики
fn create_controller_app(input: ScriptedInput) -> App {
    let mut app = create_headless_app(0);
    app.add_plugins(SimulationPlugin).insert_resource(input);
    app
}

/// Dynamic тело со всеми Rapier компонентами, которые трогает контроллер
fn spawn_body(app: &mut App, position: Vec3) -> Entity {
    spawn_body_with(app, position, PlayerController::default())
}

fn spawn_body_with(app: &mut App, position: Vec3, settings: PlayerController) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            settings,
            GroundContact::default(),
            RigidBody::Dynamic,
            Velocity::default(),
            ExternalForce::default(),
            ExternalImpulse::default(),
        ))
        .id()
}

fn frame(app: &mut App) {
    app.world_mut().run_schedule(Update);
}

fn fixed_step(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Physics app + широкая плоская земля (верх на y=0)
fn create_ground_app(seed: u64, input: ScriptedInput) -> App {
    let mut app = create_physics_app(seed);
    app.insert_resource(input);
    spawn_ground(
        &mut app.world_mut().commands(),
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(200.0, 0.5, 200.0),
    );
    app.world_mut().flush();
    app
}

fn spawn_default_player(app: &mut App, position: Vec3) -> Entity {
    let player = spawn_player(&mut app.world_mut().commands(), position, MovementTuning::default());
    app.world_mut().flush();
    player
}

fn is_grounded(app: &App, player: Entity) -> bool {
    app.world()
        .get::<GroundContact>(player)
        .is_some_and(|contact| contact.grounded)
}

fn translation(app: &App, player: Entity) -> Vec3 {
    app.world()
        .get::<Transform>(player)
        .expect("player has Transform")
        .translation
}

/// Гоняет fixed step'ы, пока игрок не встанет на землю
fn settle(app: &mut App, player: Entity) -> bool {
    for _ in 0..120 {
        app.update();
        if is_grounded(app, player) {
            return true;
        }
    }
    false
}

/// Ray cast вниз через RapierGroundProbe (без исключённого тела)
fn cast_down(app: &mut App, origin: Vec3, max_distance: f32, layers: u32) -> Option<RayHit> {
    app.world_mut()
        .run_system_once(
            move |read_context: ReadRapierContext, collision_groups: Query<&CollisionGroups>| {
                let context = read_context.single().ok();
                let ground = RapierGroundProbe::new(context.as_ref(), Entity::PLACEHOLDER, |hit: Entity| {
                    collision_groups.get(hit).ok().map(|groups| groups.memberships.bits())
                });
                ground.cast_ray(origin, Vec3::NEG_Y, max_distance, layers)
            },
        )
        .expect("ray cast system runs")
}

/// LogPrinter, который копит сообщения для assert'ов
struct CaptureLogger(Arc<Mutex<Vec<String>>>);

impl LogPrinter for CaptureLogger {
    fn log(&self, _level: LogLevel, message: &str) {
        if let Ok(mut lines) = self.0.lock() {
            lines.push(message.to_string());
        }
    }
}

fn count_trigger(app: &App, trigger: GameTrigger) -> (Rc<Cell<u32>>, Subscription) {
    let count = Rc::new(Cell::new(0));
    let bus = app.world().non_send_resource::<EventBus>();
    let subscription = {
        let count = Rc::clone(&count);
        bus.subscribe(trigger, move || count.set(count.get() + 1))
    };
    (count, subscription)
}

#[test]
fn test_forward_force_written_to_rapier_component() {
    let mut app = create_controller_app(ScriptedInput::fixed(0.0, 1.0, false));
    let player = spawn_body(&mut app, Vec3::new(0.0, 2.0, 0.0));

    frame(&mut app);
    fixed_step(&mut app);

    let dt = fixed_timestep().as_secs_f32();
    let force = app.world().get::<ExternalForce>(player).expect("player has ExternalForce");
    assert!((force.force.z - 1000.0 * dt).abs() < 1e-3, "force = {:?}", force.force);

    // Без RapierContext земли нет → lateral velocity не трогаем
    let velocity = app.world().get::<Velocity>(player).expect("player has Velocity");
    assert_eq!(velocity.linvel, Vec3::ZERO);
    let contact = app.world().get::<GroundContact>(player).expect("player has GroundContact");
    assert!(!contact.grounded);
}

#[test]
fn test_controller_without_rigid_body_is_disabled() {
    let mut app = create_controller_app(ScriptedInput::fixed(1.0, 1.0, true));
    let player = app
        .world_mut()
        .spawn((Transform::default(), PlayerController::default()))
        .id();

    frame(&mut app);
    fixed_step(&mut app);

    let registry = app.world().non_send_resource::<ControllerRegistry>();
    let controller = registry.get(player).expect("controller registered");
    assert!(!controller.is_enabled());
    assert!(!controller.is_active());

    let bus = app.world().non_send_resource::<EventBus>();
    assert_eq!(bus.subscriber_count(GameTrigger::PlayerJump), 0);
}

#[test]
fn test_inactive_controller_applies_no_force_and_no_death() {
    let mut app = create_controller_app(ScriptedInput::fixed(0.0, 1.0, false));
    let (deaths, _subscription) = count_trigger(&app, GameTrigger::PlayerDied);
    let player = spawn_body_with(
        &mut app,
        Vec3::new(0.0, -6.0, 0.0),
        PlayerController {
            active: false,
            ..default()
        },
    );

    frame(&mut app);
    fixed_step(&mut app);

    let force = app.world().get::<ExternalForce>(player).expect("player has ExternalForce");
    assert_eq!(force.force, Vec3::ZERO);
    assert_eq!(deaths.get(), 0);
    assert!(app.world().resource::<Events<PlayerDied>>().is_empty());
}

#[test]
fn test_deactivation_clears_persistent_force() {
    let mut app = create_controller_app(ScriptedInput::fixed(0.0, 1.0, false));
    let player = spawn_body(&mut app, Vec3::new(0.0, 2.0, 0.0));

    frame(&mut app);
    fixed_step(&mut app);
    let force = app.world().get::<ExternalForce>(player).expect("player has ExternalForce");
    assert!(force.force.z > 0.0);

    app.world_mut()
        .get_mut::<PlayerController>(player)
        .expect("player has PlayerController")
        .active = false;
    frame(&mut app);
    fixed_step(&mut app);

    let force = app.world().get::<ExternalForce>(player).expect("player has ExternalForce");
    assert_eq!(force.force, Vec3::ZERO);
}

#[test]
fn test_kinematic_body_is_rejected_with_reason() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    logger::set_logger(Box::new(CaptureLogger(Arc::clone(&lines))));

    let mut app = create_controller_app(ScriptedInput::fixed(0.0, 1.0, true));
    let player = app
        .world_mut()
        .spawn((
            Transform::default(),
            PlayerController::default(),
            RigidBody::KinematicPositionBased,
        ))
        .id();

    frame(&mut app);
    fixed_step(&mut app);

    let registry = app.world().non_send_resource::<ControllerRegistry>();
    let controller = registry.get(player).expect("controller registered");
    assert!(!controller.is_enabled());
    assert!(app.world().get::<ExternalForce>(player).is_none());

    let lines = lines.lock().expect("log lines");
    assert!(
        lines
            .iter()
            .any(|line| line.contains(&format!("{:?}", player)) && line.contains("KinematicPositionBased")),
        "rejected body type must be logged: {:?}",
        *lines
    );
}

#[test]
fn test_jump_key_held_raises_single_jump() {
    let mut app = create_controller_app(ScriptedInput::fixed(0.0, 0.0, true));
    let (jumps, _subscription) = count_trigger(&app, GameTrigger::PlayerJump);

    for _ in 0..5 {
        frame(&mut app);
    }
    assert_eq!(jumps.get(), 1);

    app.world_mut().resource_mut::<ScriptedInput>().jump = false;
    frame(&mut app);
    app.world_mut().resource_mut::<ScriptedInput>().jump = true;
    frame(&mut app);
    assert_eq!(jumps.get(), 2);
}

#[test]
fn test_deactivated_controller_ignores_jump() {
    let mut app = create_controller_app(ScriptedInput::idle());
    let player = spawn_body(&mut app, Vec3::ZERO);

    frame(&mut app);
    assert_eq!(
        app.world().non_send_resource::<EventBus>().subscriber_count(GameTrigger::PlayerJump),
        1
    );

    app.world_mut()
        .get_mut::<PlayerController>(player)
        .expect("player has PlayerController")
        .active = false;
    frame(&mut app);

    let bus = app.world().non_send_resource::<EventBus>().clone();
    assert_eq!(bus.subscriber_count(GameTrigger::PlayerJump), 0);
    bus.raise(GameTrigger::PlayerJump);
    fixed_step(&mut app);

    let impulse = app.world().get::<ExternalImpulse>(player).expect("player has ExternalImpulse");
    assert_eq!(impulse.impulse, Vec3::ZERO);
}

#[test]
fn test_despawn_releases_subscription() {
    let mut app = create_controller_app(ScriptedInput::idle());
    let player = spawn_body(&mut app, Vec3::ZERO);
    frame(&mut app);

    app.world_mut().despawn(player);
    frame(&mut app);

    assert!(app.world().non_send_resource::<ControllerRegistry>().is_empty());
    assert_eq!(
        app.world().non_send_resource::<EventBus>().subscriber_count(GameTrigger::PlayerJump),
        0
    );
}

#[test]
fn test_death_event_every_step_below_threshold() {
    let mut app = create_controller_app(ScriptedInput::idle());
    let player = spawn_body(&mut app, Vec3::new(0.0, -6.0, 0.0));
    let (deaths, _subscription) = count_trigger(&app, GameTrigger::PlayerDied);

    frame(&mut app);
    for _ in 0..3 {
        fixed_step(&mut app);
    }

    assert_eq!(deaths.get(), 3);
    let events = app.world().resource::<Events<PlayerDied>>();
    assert_eq!(events.len(), 3);
    assert!(events.iter_current_update_events().all(|event| event.entity == player));
}

#[test]
fn test_second_input_reader_keeps_first() {
    let mut app = create_controller_app(ScriptedInput::idle());
    let bus = app.world().non_send_resource::<EventBus>().clone();

    let result = app
        .world_mut()
        .non_send_resource_mut::<InputService>()
        .install(InputReader::new(bus, KeyCode::KeyJ));

    assert_eq!(result, Err(InputError::DuplicateReader));
    let service = app.world().non_send_resource::<InputService>();
    assert_eq!(service.reader().map(|reader| reader.jump_key()), Some(KeyCode::Space));
}

#[test]
fn test_player_lands_on_ground_with_rapier() {
    let mut app = create_ground_app(1, ScriptedInput::idle());
    let player = spawn_default_player(&mut app, Vec3::new(0.0, 1.5, 0.0));

    for _ in 0..120 {
        app.update();
    }

    assert!(is_grounded(&app, player), "player should rest on the ground");
    let y = translation(&app, player).y;
    assert!((y - 1.0).abs() < 0.05, "capsule center expected near 1.0, got {}", y);
}

#[test]
fn test_grounded_jump_lifts_player_with_rapier() {
    let mut app = create_ground_app(3, ScriptedInput::idle());
    let (jumps, _subscription) = count_trigger(&app, GameTrigger::PlayerJump);
    let player = spawn_default_player(&mut app, Vec3::new(0.0, 1.5, 0.0));

    assert!(settle(&mut app, player), "player never touched the ground");
    for _ in 0..20 {
        app.update();
    }
    assert!(is_grounded(&app, player));
    let rest_y = translation(&app, player).y;

    app.world_mut().resource_mut::<ScriptedInput>().jump = true;
    app.update();
    app.world_mut().resource_mut::<ScriptedInput>().jump = false;

    let mut max_y = rest_y;
    let mut jumped_events = 0;
    for _ in 0..30 {
        app.update();
        max_y = max_y.max(translation(&app, player).y);
        jumped_events += app
            .world()
            .resource::<Events<PlayerJumped>>()
            .iter_current_update_events()
            .filter(|event| event.entity == player)
            .count();
    }

    assert_eq!(jumps.get(), 1);
    assert_eq!(jumped_events, 1);
    assert!(max_y > rest_y + 1.0, "jump should lift the player: rest {}, max {}", rest_y, max_y);
}

#[test]
fn test_grounded_lateral_move_with_rapier() {
    let mut app = create_ground_app(4, ScriptedInput::fixed(1.0, 0.0, false));
    let player = spawn_default_player(&mut app, Vec3::new(0.0, 1.0, 0.0));

    for _ in 0..60 {
        app.update();
    }

    let position = translation(&app, player);
    assert!(position.x > 1.0, "player should slide right, x = {}", position.x);
    assert!(position.z.abs() < 0.1, "no forward input, z = {}", position.z);
}

#[test]
fn test_obstacle_is_not_ground_with_rapier() {
    let mut app = create_physics_app(5);
    app.insert_resource(ScriptedInput::idle());
    app.world_mut().spawn((
        Transform::from_xyz(0.0, -0.5, 0.0),
        GlobalTransform::from_xyz(0.0, -0.5, 0.0),
        RigidBody::Fixed,
        Collider::cuboid(5.0, 0.5, 5.0),
        layers::obstacle_groups(),
    ));
    let player = spawn_default_player(&mut app, Vec3::new(0.0, 1.5, 0.0));

    for _ in 0..120 {
        app.update();
    }

    // Игрок стоит на препятствии, но ground check его не засчитывает
    let y = translation(&app, player).y;
    assert!((y - 1.0).abs() < 0.05, "player should rest on the obstacle, y = {}", y);
    assert!(!is_grounded(&app, player));
}

#[test]
fn test_ground_ray_starting_inside_collider_misses() {
    let mut app = create_ground_app(6, ScriptedInput::idle());
    app.world_mut().spawn((
        Transform::from_xyz(50.0, 0.5, 0.0),
        GlobalTransform::from_xyz(50.0, 0.5, 0.0),
        RigidBody::Fixed,
        Collider::cuboid(1.0, 0.5, 1.0),
        layers::obstacle_groups(),
    ));
    for _ in 0..3 {
        app.update();
    }

    // Над землёй: обычный hit по ground layer
    let hit = cast_down(&mut app, Vec3::new(0.0, 0.05, 0.0), 0.1, LAYER_GROUND).expect("ground below");
    assert!((hit.distance - 0.05).abs() < 1e-3, "distance = {}", hit.distance);
    assert_eq!(hit.layers, LAYER_GROUND);

    // Старт внутри толстой земли: не hit на расстоянии 0
    assert!(cast_down(&mut app, Vec3::new(0.0, -0.05, 0.0), 0.1, LAYER_GROUND).is_none());

    // Препятствие отфильтровано ground mask'ой, но видно по своей
    let above_obstacle = Vec3::new(50.0, 1.05, 0.0);
    assert!(cast_down(&mut app, above_obstacle, 0.1, LAYER_GROUND).is_none());
    let hit = cast_down(&mut app, above_obstacle, 0.1, LAYER_OBSTACLES).expect("obstacle below");
    assert_eq!(hit.layers, LAYER_OBSTACLES);
}

#[test]
fn test_player_without_ground_falls_and_dies() {
    let mut app = create_physics_app(2);
    app.insert_resource(ScriptedInput::idle());
    let (deaths, _subscription) = count_trigger(&app, GameTrigger::PlayerDied);

    let player = spawn_player(
        &mut app.world_mut().commands(),
        Vec3::ZERO,
        MovementTuning::default(),
    );
    app.world_mut().flush();

    for _ in 0..120 {
        app.update();
    }

    let y = app.world().get::<Transform>(player).expect("player has Transform").translation.y;
    assert!(y < DEATH_HEIGHT, "player should have fallen, y = {}", y);
    // Первые ~60 step'ов игрок выше порога
    assert!(deaths.get() > 0);
    assert!(deaths.get() < 120);
}
