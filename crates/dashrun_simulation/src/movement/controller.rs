//! MovementController — ground check, силы, jump, death check
//!
//! Engine-agnostic: тело и ray cast приходят через capability traits
//! (RigidBodyHandle, GroundProbe). Bevy/Rapier реализации — в physics.
//!
//! Порядок fixed step:
//! 1. ground classification (ray вниз от position + offset)
//! 2. input (нет InputReader → дальше не идём)
//! 3. forward force (+Z) * vertical * dt
//! 4. lateral velocity change (+X) * horizontal * dt — только на земле
//! 5. death check (y < death_height → PlayerDied, каждый step)
//!
//! Jump — event-driven: подписка на PlayerJump живёт между activate/deactivate.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use bevy::prelude::*;

use super::tuning::MovementTuning;
use crate::error::ControllerError;
use crate::events::{EventBus, GameTrigger, Subscription};
use crate::input::InputReader;
use crate::logger;

/// Режим приложения силы
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Continuous force (интегрируется физикой за step)
    Force,
    /// Мгновенный импульс (делится на массу)
    Impulse,
    /// Мгновенное изменение скорости (масса игнорируется)
    VelocityChange,
}

/// Capability: rigid body игрока
pub trait RigidBodyHandle {
    fn position(&self) -> Vec3;
    fn add_force(&mut self, force: Vec3, mode: ForceMode);
}

/// Результат ray cast'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Расстояние от origin до точки попадания
    pub distance: f32,
    /// Collision layers задетого коллайдера (bit mask)
    pub layers: u32,
}

/// Capability: ray cast query движка
pub trait GroundProbe {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, layers: u32) -> Option<RayHit>;
}

/// Grounded ⇔ попали в ground layer в пределах raycast_distance
///
/// Проверяем и distance, и layers сами — не полагаемся на фильтр движка.
pub fn classify_ground(hit: Option<RayHit>, tuning: &MovementTuning) -> bool {
    hit.is_some_and(|hit| {
        hit.distance <= tuning.raycast_distance && hit.layers & tuning.ground_layers != 0
    })
}

/// Что сделал один fixed step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    pub grounded: bool,
    /// false когда InputReader отсутствовал (только ground check)
    pub input_consumed: bool,
    pub forward_force: Vec3,
    /// Vec3::ZERO в воздухе
    pub lateral_velocity_change: Vec3,
    pub died: bool,
}

/// Состояние, разделяемое с jump subscriber'ом
struct ControllerState<B> {
    body: RefCell<B>,
    grounded: Cell<bool>,
    jump_force: f32,
}

impl<B: RigidBodyHandle> ControllerState<B> {
    fn handle_jump(&self) -> bool {
        if !self.grounded.get() {
            return false;
        }

        match self.body.try_borrow_mut() {
            Ok(mut body) => {
                body.add_force(Vec3::Y * self.jump_force, ForceMode::Impulse);
                true
            }
            Err(_) => {
                logger::log_warning("MovementController: jump raised while body is borrowed, ignored");
                false
            }
        }
    }
}

/// Контроллер движения игрока
///
/// Без rigid body instance отключён: fixed_update и jump — no-op.
pub struct MovementController<B: RigidBodyHandle + 'static> {
    tuning: MovementTuning,
    state: Option<Rc<ControllerState<B>>>,
    bus: EventBus,
    jump_subscription: Option<Subscription>,
}

impl<B: RigidBodyHandle + 'static> MovementController<B> {
    pub fn try_new(tuning: MovementTuning, body: Option<B>, bus: EventBus) -> Result<Self, ControllerError> {
        let body = body.ok_or(ControllerError::MissingRigidBody)?;

        Ok(Self {
            tuning,
            state: Some(Rc::new(ControllerState {
                body: RefCell::new(body),
                grounded: Cell::new(false),
                jump_force: tuning.jump_force,
            })),
            bus,
            jump_subscription: None,
        })
    }

    /// Как try_new, но отсутствие тела логируется и даёт disabled instance
    pub fn new(tuning: MovementTuning, body: Option<B>, bus: EventBus) -> Self {
        match Self::try_new(tuning, body, bus.clone()) {
            Ok(controller) => controller,
            Err(err) => {
                logger::log_error(&format!("MovementController disabled: {}", err));
                Self {
                    tuning,
                    state: None,
                    bus,
                    jump_subscription: None,
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Активен (enabled component): подписан на PlayerJump и шагает в fixed_update
    pub fn is_active(&self) -> bool {
        self.jump_subscription.is_some()
    }

    /// Результат последнего ground check
    pub fn is_grounded(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.grounded.get())
    }

    pub fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    pub fn body(&self) -> Option<Ref<'_, B>> {
        self.state.as_ref().map(|state| state.body.borrow())
    }

    pub fn body_mut(&self) -> Option<RefMut<'_, B>> {
        self.state.as_ref().map(|state| state.body.borrow_mut())
    }

    /// Подписка на PlayerJump (повторный вызов — no-op)
    pub fn activate(&mut self) {
        if self.jump_subscription.is_some() {
            return;
        }
        let Some(state) = self.state.as_ref() else {
            return;
        };

        let state = Rc::downgrade(state);
        self.jump_subscription = Some(self.bus.subscribe(GameTrigger::PlayerJump, move || {
            if let Some(state) = state.upgrade() {
                state.handle_jump();
            }
        }));
    }

    /// Отписка: после неё ни PlayerJump, ни fixed_update этот контроллер не трогают
    pub fn deactivate(&mut self) {
        self.jump_subscription = None;
    }

    /// Jump напрямую (то же, что делает subscriber). true если импульс применён.
    pub fn handle_jump(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.handle_jump())
    }

    /// Один fixed physics step
    ///
    /// Неактивный контроллер (до activate или после deactivate) step пропускает:
    /// ни ray cast, ни сил, ни death check.
    pub fn fixed_update(&mut self, dt: f32, input: Option<&InputReader>, ground: &impl GroundProbe) -> StepOutcome {
        if !self.is_active() {
            return StepOutcome::default();
        }
        let Some(state) = self.state.as_ref() else {
            return StepOutcome::default();
        };
        let tuning = &self.tuning;
        let mut outcome = StepOutcome::default();

        // 1. Ground check
        let position = state.body.borrow().position();
        let origin = position + tuning.raycast_offset;
        let hit = ground.cast_ray(origin, Vec3::NEG_Y, tuning.raycast_distance, tuning.ground_layers);
        let grounded = classify_ground(hit, tuning);
        state.grounded.set(grounded);
        outcome.grounded = grounded;

        // 2. Нет InputReader — только ground detection
        let Some(input) = input else {
            return outcome;
        };
        outcome.input_consumed = true;

        {
            let mut body = state.body.borrow_mut();

            // 3. Forward force (dt — независимость от частоты step'а)
            outcome.forward_force = Vec3::Z * (input.vertical() * tuning.forward_force * dt);
            body.add_force(outcome.forward_force, ForceMode::Force);

            // 4. Lateral — velocity change, только на земле
            if grounded {
                outcome.lateral_velocity_change = Vec3::X * (input.horizontal() * tuning.sideways_force * dt);
                body.add_force(outcome.lateral_velocity_change, ForceMode::VelocityChange);
            }
        }

        // 5. Death check (без one-shot guard: каждый step ниже порога)
        if position.y < tuning.death_height {
            outcome.died = true;
            self.bus.raise(GameTrigger::PlayerDied);
        }

        outcome
    }
}

impl<B: RigidBodyHandle + 'static> std::fmt::Debug for MovementController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementController")
            .field("enabled", &self.is_enabled())
            .field("active", &self.is_active())
            .field("grounded", &self.is_grounded())
            .field("tuning", &self.tuning)
            .finish()
    }
}
