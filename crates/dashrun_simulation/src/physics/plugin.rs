//! PlayerControllerPlugin — Bevy driver для InputReader/MovementController
//!
//! # Архитектура
//!
//! ```text
//! Update:
//!   attach_controllers  (Added<PlayerController>   → MovementController::new)
//!   sync_activation     (Changed<PlayerController> → activate/deactivate)
//!   detach_controllers  (removed/despawned         → drop, subscription release)
//!   poll_input          (ScriptedInput | ButtonInput<KeyCode> → InputReader::update)
//!
//! FixedUpdate (до Rapier step в FixedPostUpdate):
//!   step_controllers    (ray cast → fixed_update(dt) → Rapier forces → PlayerJumped/PlayerDied)
//! ```
//!
//! EventBus, InputService, ControllerRegistry — non-send resources (Rc внутри),
//! системы с ними Bevy выполняет на main thread.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::body::BodyCommands;
use super::ground::RapierGroundProbe;
use super::layers;
use crate::events::EventBus;
use crate::input::{InputReader, InputService, KeyboardSource, ScriptedInput};
use crate::logger;
use crate::movement::{MovementController, MovementTuning};

/// Игрок, управляемый MovementController
///
/// `active` — аналог enable/disable: false снимает подписку на PlayerJump
/// и останавливает fixed step (ни сил, ни PlayerDied).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct PlayerController {
    pub tuning: MovementTuning,
    pub active: bool,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            tuning: MovementTuning::default(),
            active: true,
        }
    }
}

/// Результат последнего ground check (для остальных ECS систем: UI, audio)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct GroundContact {
    pub grounded: bool,
}

/// Event: jump impulse применён (по одному на принятый PlayerJump)
#[derive(Event, Debug, Clone)]
pub struct PlayerJumped {
    pub entity: Entity,
}

/// Event: игрок ниже death height (пишется каждый fixed step, пока ниже)
#[derive(Event, Debug, Clone)]
pub struct PlayerDied {
    pub entity: Entity,
    pub height: f32,
}

/// Контроллеры по entity
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<Entity, MovementController<BodyCommands>>,
}

impl ControllerRegistry {
    pub fn get(&self, entity: Entity) -> Option<&MovementController<BodyCommands>> {
        self.controllers.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

pub struct PlayerControllerPlugin;

impl Plugin for PlayerControllerPlugin {
    fn build(&self, app: &mut App) {
        let bus = EventBus::new();
        let mut input = InputService::new();
        // Пустой service — install не может провалиться
        let _ = input.install(InputReader::new(bus.clone(), KeyCode::Space));

        app.add_event::<PlayerJumped>()
            .add_event::<PlayerDied>()
            .register_type::<PlayerController>()
            .register_type::<GroundContact>()
            .insert_non_send_resource(bus)
            .insert_non_send_resource(input)
            .insert_non_send_resource(ControllerRegistry::default());

        app.add_systems(
            Update,
            (attach_controllers, sync_activation, detach_controllers, poll_input).chain(),
        );

        // Rapier (in_fixed_schedule) шагает в FixedPostUpdate — после нас
        app.add_systems(FixedUpdate, step_controllers);
    }
}

/// Construction: новый PlayerController → MovementController
///
/// Без RigidBody::Dynamic контроллер создаётся disabled; в лог идёт
/// отклонённый тип тела (Fixed, Kinematic*) или его отсутствие.
pub fn attach_controllers(
    mut commands: Commands,
    query: Query<(Entity, &PlayerController, &Transform, Option<&RigidBody>), Added<PlayerController>>,
    bus: NonSend<EventBus>,
    mut registry: NonSendMut<ControllerRegistry>,
) {
    for (entity, settings, transform, rigid_body) in query.iter() {
        let body = match rigid_body {
            Some(RigidBody::Dynamic) => {
                commands.entity(entity).insert_if_new((
                    ExternalForce::default(),
                    ExternalImpulse::default(),
                    Velocity::default(),
                    GroundContact::default(),
                ));
                Some(BodyCommands::at(transform.translation))
            }
            Some(other) => {
                logger::log_error(&format!(
                    "Player controller {:?}: RigidBody::{:?} is not driven by forces, RigidBody::Dynamic required",
                    entity, other
                ));
                None
            }
            None => {
                logger::log_error(&format!("Player controller {:?}: no RigidBody", entity));
                None
            }
        };

        let mut controller = MovementController::new(settings.tuning, body, bus.clone());
        if settings.active {
            controller.activate();
        }

        if controller.is_enabled() {
            logger::log_info(&format!("Player controller attached: {:?}", entity));
        }
        registry.controllers.insert(entity, controller);
    }
}

/// Enable/disable: подписка на PlayerJump следует за PlayerController::active
pub fn sync_activation(
    query: Query<(Entity, &PlayerController), Changed<PlayerController>>,
    mut registry: NonSendMut<ControllerRegistry>,
) {
    for (entity, settings) in query.iter() {
        let Some(controller) = registry.controllers.get_mut(&entity) else {
            continue;
        };

        if settings.active {
            controller.activate();
        } else {
            controller.deactivate();
        }
    }
}

/// Teardown: drop контроллера отпускает его Subscription
pub fn detach_controllers(
    mut removed: RemovedComponents<PlayerController>,
    mut registry: NonSendMut<ControllerRegistry>,
) {
    for entity in removed.read() {
        if registry.controllers.remove(&entity).is_some() {
            logger::log(&format!("Player controller detached: {:?}", entity));
        }
    }
}

/// Per-frame input: ScriptedInput (если есть) приоритетнее клавиатуры
pub fn poll_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    scripted: Option<ResMut<ScriptedInput>>,
    mut service: NonSendMut<InputService>,
) {
    let Some(reader) = service.reader_mut() else {
        return;
    };

    if let Some(mut scripted) = scripted {
        scripted.advance();
        reader.update(&*scripted);
    } else if let Some(keys) = keys {
        reader.update(&KeyboardSource::new(&keys));
    }
}

/// Fixed step всех контроллеров
pub fn step_controllers(
    time: Res<Time<Fixed>>,
    read_context: ReadRapierContext,
    collision_groups: Query<&CollisionGroups>,
    mut bodies: Query<(
        &Transform,
        &mut ExternalForce,
        &mut ExternalImpulse,
        &mut Velocity,
        Option<&mut GroundContact>,
    )>,
    service: NonSend<InputService>,
    mut registry: NonSendMut<ControllerRegistry>,
    mut jumped_events: EventWriter<PlayerJumped>,
    mut died_events: EventWriter<PlayerDied>,
) {
    let dt = time.timestep().as_secs_f32();
    let context = read_context.single().ok();
    let layers_of = |hit: Entity| {
        collision_groups
            .get(hit)
            .ok()
            .map(|groups| groups.memberships.bits())
    };

    for (&entity, controller) in registry.controllers.iter_mut() {
        if !controller.is_enabled() {
            continue;
        }
        let Ok((transform, mut force, mut impulse, mut velocity, contact)) = bodies.get_mut(entity) else {
            continue;
        };

        // Disabled: ExternalForce персистентен в Rapier, гасим последнюю силу
        if !controller.is_active() {
            if force.force != Vec3::ZERO {
                force.force = Vec3::ZERO;
            }
            continue;
        }

        if let Some(mut body) = controller.body_mut() {
            body.sync_position(transform.translation);
        }

        let probe = RapierGroundProbe::new(context.as_ref(), entity, layers_of);
        let outcome = controller.fixed_update(dt, service.reader(), &probe);

        let pending = controller
            .body_mut()
            .map(|mut body| body.take())
            .unwrap_or_default();
        let jumped = pending.impulse.y > 0.0;
        pending.apply_to(&mut force, &mut impulse, &mut velocity);

        if jumped {
            jumped_events.write(PlayerJumped { entity });
        }

        if let Some(mut contact) = contact {
            if contact.grounded != outcome.grounded {
                contact.grounded = outcome.grounded;
            }
        }

        if outcome.died {
            died_events.write(PlayerDied {
                entity,
                height: transform.translation.y,
            });
        }
    }
}

/// Spawn игрока: dynamic capsule (высота 2m) + PlayerController
///
/// GlobalTransform задаём сразу: Rapier инициализирует тело раньше
/// transform propagation.
pub fn spawn_player(commands: &mut Commands, position: Vec3, tuning: MovementTuning) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            GlobalTransform::from_translation(position),
            PlayerController {
                tuning,
                active: true,
            },
            GroundContact::default(),
            // Rapier physics
            RigidBody::Dynamic,
            Collider::capsule_y(0.5, 0.5),
            LockedAxes::ROTATION_LOCKED,
            Velocity::default(),
            ExternalForce::default(),
            ExternalImpulse::default(),
            layers::player_groups(),
        ))
        .id()
}

/// Spawn статичной земли (cuboid, ground layer)
pub fn spawn_ground(commands: &mut Commands, center: Vec3, half_extents: Vec3) -> Entity {
    commands
        .spawn((
            Transform::from_translation(center),
            GlobalTransform::from_translation(center),
            RigidBody::Fixed,
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
            layers::ground_groups(),
        ))
        .id()
}
