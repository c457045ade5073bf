//! ASCENT Simulation Core
//!
//! ECS-симуляция abilities персонажа на Bevy 0.16 (headless)
//!
//! Слои (снизу вверх):
//! - geometry: запросы к статической геометрии (overlap, sweeps)
//! - animation: аниматор с cross-fade, root motion и pose correction
//! - body: kinematic тело (gravity, collision, root motion)
//! - ability: ClimbUp, JumpAndFalling, Locomotion + coordinator
//!
//! Движок подменяет collaborators (GeometryProvider, аниматор, тело),
//! state machine abilities от этого не меняется.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::{CollisionGroups, RigidBody};

// Публичные модули
pub mod ability;
pub mod animation;
pub mod body;
pub mod components;
pub mod config;
pub mod geometry;
pub mod logger;
pub mod math;


// Re-export базовых типов для удобства
pub use ability::{
    Ability, AbilityChanged, AbilityCoordinator, AbilityFlow, AbilityKind, AbilityPlugin, AbilityTransition,
    ActiveSlot, FallDamageTaken, LandingImpact, Landed, VoicePlayed,
};
pub use animation::{AnimationDriver, ClipAnimator, ClipLibrary, ClipDef, PoseCorrection};
pub use body::{BodyController, KinematicBody};
pub use components::*;
pub use config::{AbilitySetConfig, ClimbUpConfig, JumpAndFallingConfig, LocomotionConfig, SetupError};
pub use geometry::{GeometryHit, GeometryProvider, GeometryQuery, SceneBox, StaticScene, LAYER_ACTORS, MASK_ACTORS};
pub use logger::{init_logger, log, log_error, log_info, log_warning};

/// Частота fixed tick'а симуляции
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            .add_plugins(AbilityPlugin);
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время продвигается ровно на один fixed step за `app.update()`
/// (первый update - нулевой delta, как у любого Bevy App).
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();

    let fixed = Time::<Fixed>::from_hz(SIMULATION_HZ);
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(fixed.timestep()))
        .insert_resource(fixed);

    app
}

/// Состояние одного персонажа после прогона (сравнение прогонов на детерминизм)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterSnapshot {
    pub entity_index: u32,
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub velocity: Vec3,
    pub grounded: bool,
    pub active: Option<AbilityKind>,
    pub health: u32,
}

/// Снимки всех персонажей, упорядоченные по entity index
pub fn character_snapshots(world: &mut World) -> Vec<CharacterSnapshot> {
    let mut query = world.query_filtered::<
        (Entity, &Transform, &KinematicBody, &AbilityCoordinator, &Health),
        With<Character>,
    >();

    let mut snapshots: Vec<_> = query
        .iter(world)
        .map(|(entity, transform, body, coordinator, health)| CharacterSnapshot {
            entity_index: entity.index(),
            position: transform.translation,
            yaw_degrees: math::yaw_of(transform.rotation),
            velocity: body.velocity,
            grounded: body.grounded,
            active: coordinator.active_kind(),
            health: health.current,
        })
        .collect();

    snapshots.sort_by_key(|snapshot| snapshot.entity_index);
    snapshots
}

/// Параметры spawn'а персонажа
#[derive(Debug, Clone)]
pub struct CharacterSpawn {
    /// Позиция ног
    pub position: Vec3,
    pub yaw_degrees: f32,
    /// Yaw камеры (базис input'а)
    pub view_yaw_degrees: f32,
    pub max_health: u32,
    pub abilities: AbilitySetConfig,
    pub body: KinematicBody,
    pub clips: ClipLibrary,
    /// None - персонаж не получает урон от падения
    pub fall_damage: Option<FallDamage>,
    /// false - персонаж без voice collaborator'а
    pub voice: bool,
}

impl Default for CharacterSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
            view_yaw_degrees: 0.0,
            max_health: 100,
            abilities: AbilitySetConfig::default(),
            body: KinematicBody::default(),
            clips: ClipLibrary::standard(),
            fall_damage: None,
            voice: true,
        }
    }
}

impl CharacterSpawn {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..default()
        }
    }
}

/// Spawn персонажа со всеми компонентами abilities
///
/// Ошибки setup'а (невалидный config, нет GeometryProvider) возвращаются здесь,
/// per-tick системы дальше не падают.
pub fn spawn_character(world: &mut World, spawn: CharacterSpawn) -> Result<Entity, SetupError> {
    if !world.contains_resource::<GeometryProvider>() {
        return Err(SetupError::MissingCollaborator("GeometryProvider"));
    }

    if !spawn.body.gravity.is_finite() || spawn.body.gravity >= 0.0 {
        return Err(SetupError::InvalidParameter {
            name: "body.gravity",
            reason: format!("must be < 0, got {}", spawn.body.gravity),
        });
    }

    let coordinator = AbilityCoordinator::configure(&spawn.abilities)?;

    for state in spawn.abilities.animation_states() {
        if !spawn.clips.contains(state) {
            log_warning(&format!(
                "spawn_character: clip library has no '{}' state, abilities requesting it will wait",
                state
            ));
        }
    }

    let collider = spawn.body.collider();
    let animator = ClipAnimator::new(spawn.clips, spawn.abilities.locomotion.locomotion_state.clone());
    let transform =
        Transform::from_translation(spawn.position).with_rotation(math::yaw_rotation(spawn.yaw_degrees));

    let mut entity = world.spawn((
        Character,
        transform,
        spawn.body,
        animator,
        coordinator,
        AbilityInput::default(),
        ViewOrientation::new(spawn.view_yaw_degrees),
        Health::new(spawn.max_health),
        RigidBody::KinematicPositionBased,
        collider,
        CollisionGroups::new(LAYER_ACTORS, MASK_ACTORS),
    ));

    if let Some(fall_damage) = spawn.fall_damage {
        entity.insert(fall_damage);
    }
    if spawn.voice {
        entity.insert(VoiceEmitter::default());
    }

    let id = entity.id();
    log_info(&format!("Character spawned: {:?} at {:?}", id, spawn.position));

    Ok(id)
}
