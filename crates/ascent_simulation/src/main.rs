//! Headless симуляция ASCENT
//!
//! Scripted сцена без рендера: climb на уступ, прыжок, жёсткое приземление

use bevy::prelude::*;
use ascent_simulation::*;

/// Печатает смены abilities и приземления
fn report_events(
    mut changed: EventReader<AbilityChanged>,
    mut landed: EventReader<Landed>,
    mut damage: EventReader<FallDamageTaken>,
    mut voices: EventReader<VoicePlayed>,
) {
    for event in changed.read() {
        let from = event.from.map_or("Idle", |kind| kind.as_str());
        println!("  {:?}: {} → {}", event.entity, from, event.to.as_str());
    }
    for event in landed.read() {
        println!("  {:?}: landed {:?}", event.entity, event.impact);
    }
    for event in damage.read() {
        println!(
            "  {:?}: fall damage {} ({:.2}m), HP left {}",
            event.entity, event.damage, event.fall_distance, event.remaining
        );
    }
    for event in voices.read() {
        println!("  {:?}: voice '{}'", event.entity, event.cue);
    }
}

fn main() -> Result<(), SetupError> {
    println!("Starting ASCENT headless simulation");

    let mut app = create_headless_app();
    logger::set_log_level(logger::LogLevel::Warning);

    let scene = StaticScene::new()
        .with_box(SceneBox::ground(30.0))
        .with_box(SceneBox::ledge(Vec3::new(0.0, 0.0, -2.0), Vec2::new(2.0, 1.0), 1.2));

    app.add_plugins(SimulationPlugin)
        .insert_resource(GeometryProvider::new(scene))
        .add_systems(FixedUpdate, report_events.after(consume_jump_input));

    // Прыжок вплотную к уступу → climb
    let climber = spawn_character(app.world_mut(), CharacterSpawn::at(Vec3::new(0.0, 0.3, -0.4)))?;

    // Падение с 6m → hard landing + урон
    let faller = spawn_character(
        app.world_mut(),
        CharacterSpawn {
            fall_damage: Some(FallDamage::default()),
            max_health: 250,
            ..CharacterSpawn::at(Vec3::new(8.0, 6.0, 4.0))
        },
    )?;

    // Бегун с прыжком посреди дистанции
    let runner = spawn_character(app.world_mut(), CharacterSpawn::at(Vec3::new(-8.0, 0.0, 4.0)))?;

    for tick in 0..400 {
        if let Some(mut input) = app.world_mut().get_mut::<AbilityInput>(runner) {
            input.move_axis = if tick < 300 { Vec2::new(0.0, 1.0) } else { Vec2::ZERO };
            input.sprint = tick > 60;
            if tick == 120 {
                input.jump = true;
            }
        }

        app.update();

        if tick % 100 == 0 {
            for (name, entity) in [("climber", climber), ("faller", faller), ("runner", runner)] {
                let position = app.world().get::<Transform>(entity).map(|t| t.translation);
                let active = app
                    .world()
                    .get::<AbilityCoordinator>(entity)
                    .and_then(|c| c.active_kind())
                    .map_or("Idle", |kind| kind.as_str());
                println!("Tick {}: {} at {:?} [{}]", tick, name, position, active);
            }
        }
    }

    println!("Simulation complete!");
    Ok(())
}
