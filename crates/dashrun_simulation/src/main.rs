//! Headless симуляция DASHRUN
//!
//! Игрок на длинной полосе земли, input — seeded autopilot.
//! Usage: dashrun_simulation [tuning.toml]

use std::cell::Cell;
use std::rc::Rc;

use bevy::prelude::*;
use dashrun_simulation::{
    create_physics_app, log_error, log_info, spawn_ground, spawn_player, EventBus, GameTrigger, GroundContact,
    MovementTuning, PlayerController,
};

const SEED: u64 = 42;
const TICKS: usize = 1000;

fn main() {
    let mut app = create_physics_app(SEED);

    let tuning = match std::env::args().nth(1) {
        Some(path) => match MovementTuning::load(&path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log_error(&format!("{}", err));
                std::process::exit(1);
            }
        },
        None => MovementTuning::default(),
    };

    log_info(&format!("Starting DASHRUN headless simulation (seed: {})", SEED));

    // Полоса 20m x 400m, верх на y=0
    spawn_ground(
        &mut app.world_mut().commands(),
        Vec3::new(0.0, -0.5, 190.0),
        Vec3::new(10.0, 0.5, 200.0),
    );
    let player = spawn_player(&mut app.world_mut().commands(), Vec3::new(0.0, 1.0, 0.0), tuning);
    app.world_mut().flush();

    // Подписчики шины: счётчики вместо audio/UI
    let jumps = Rc::new(Cell::new(0u32));
    let deaths = Rc::new(Cell::new(0u32));
    let (_jump_sub, _death_sub) = {
        let bus = app.world().non_send_resource::<EventBus>();
        let jumps = Rc::clone(&jumps);
        let deaths = Rc::clone(&deaths);
        (
            bus.subscribe(GameTrigger::PlayerJump, move || jumps.set(jumps.get() + 1)),
            bus.subscribe(GameTrigger::PlayerDied, move || deaths.set(deaths.get() + 1)),
        )
    };

    for tick in 0..TICKS {
        app.update();

        if tick % 100 == 0 {
            let world = app.world();
            let position = world
                .get::<Transform>(player)
                .map(|transform| transform.translation)
                .unwrap_or_default();
            let grounded = world
                .get::<GroundContact>(player)
                .is_some_and(|contact| contact.grounded);
            log_info(&format!(
                "Tick {}: position {:.2?}, grounded {}, jumps {}, death steps {}",
                tick,
                position,
                grounded,
                jumps.get(),
                deaths.get()
            ));
        }
    }

    // Деактивация до выхода: подписка на jump снимается
    if let Some(mut controller) = app.world_mut().get_mut::<PlayerController>(player) {
        controller.active = false;
    }
    app.update();

    log_info(&format!(
        "Simulation complete! jumps: {}, death steps: {}",
        jumps.get(),
        deaths.get()
    ));
}
