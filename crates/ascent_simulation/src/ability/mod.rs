//! Ability state machine
//!
//! Архитектура:
//! - Ability = одно поведение (locomotion, climb, jump/fall), эксклюзивно владеет телом
//! - Закрытый набор вариантов (`AbilityState`) за общим trait'ом `Ability`
//! - `AbilityCoordinator` держит единственный активный slot и протокол stop → start
//! - Collaborators (body, animator, geometry, voice) приходят через `AbilityContext`
//!
//! Transient поля ability сбрасываются в `on_start`, живут одну активацию.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::{advance_animators, AnimationDriver};
use crate::body::{ground_detection, integrate_bodies, sync_collider_state, BodyController};
use crate::components::{consume_jump_input, flush_voice_requests, AbilityInput, ViewOrientation, VoicePlayer};
use crate::geometry::GeometryQuery;
use crate::math::repeat;

pub mod climb_up;
pub mod coordinator;
pub mod events;
pub mod jump_and_falling;
pub mod locomotion;
pub mod systems;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod locomotion_tests;

pub use climb_up::ClimbUp;
pub use coordinator::{AbilityCoordinator, ActiveSlot};
pub use events::{AbilityChanged, FallDamageTaken, Landed, VoicePlayed};
pub use jump_and_falling::JumpAndFalling;
pub use locomotion::Locomotion;
pub use systems::{apply_fall_damage, suspend_abilities, tick_abilities};

/// Ability Plugin
///
/// Регистрирует events и весь pipeline персонажа в FixedUpdate.
///
/// Порядок выполнения:
/// 1. advance_animators - время clip'ов на fixed delta
/// 2. ground_detection - проба земли под телом
/// 3. suspend_abilities - teardown coordinator'ов с `AbilitiesSuspended`
/// 4. tick_abilities - один tick coordinator'а на персонажа
/// 5. integrate_bodies - gravity, velocity/root motion, pose correction, sweeps
/// 6. sync_collider_state - collision флаг → rapier `ColliderDisabled`
/// 7. flush_voice_requests - VoiceEmitter → VoicePlayed
/// 8. apply_fall_damage - урон от hard landing
/// 9. consume_jump_input - jump живёт один tick
pub struct AbilityPlugin;

impl Plugin for AbilityPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<Landed>()
            .add_event::<AbilityChanged>()
            .add_event::<VoicePlayed>()
            .add_event::<FallDamageTaken>();

        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: анимация и земля (входы для readiness)
                advance_animators,
                ground_detection,

                // Фаза 2: state machine
                suspend_abilities,
                tick_abilities,

                // Фаза 3: физика тела
                integrate_bodies,
                sync_collider_state,

                // Фаза 4: подписчики и cleanup
                flush_voice_requests,
                apply_fall_damage,
                consume_jump_input,
            )
                .chain(), // Последовательное выполнение для детерминизма
        );
    }
}

/// Тип ability (для конфигурации, events и логов)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum AbilityKind {
    Locomotion,
    ClimbUp,
    JumpAndFalling,
}

impl AbilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityKind::Locomotion => "Locomotion",
            AbilityKind::ClimbUp => "ClimbUp",
            AbilityKind::JumpAndFalling => "JumpAndFalling",
        }
    }
}

/// Результат update: продолжаем или ability просит остановку
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityFlow {
    Continue,
    Stop,
}

/// Приземление, о котором уведомляются подписчики
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum LandingImpact {
    /// Обычное приземление с заметной вертикальной скоростью
    Soft { impact_speed: f32 },
    /// Жёсткое приземление (fall distance ≥ порога hard land)
    Hard { fall_distance: f32, damage_ratio: f32 },
}

/// Смена активной ability за tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct AbilityTransition {
    /// None - coordinator стартовал из Idle
    pub from: Option<AbilityKind>,
    pub to: AbilityKind,
}

/// Collaborators одного tick'а
pub struct AbilityContext<'a> {
    pub body: &'a mut dyn BodyController,
    pub animator: &'a mut dyn AnimationDriver,
    pub geometry: &'a dyn GeometryQuery,
    pub input: &'a AbilityInput,
    pub view: &'a ViewOrientation,
    /// Опциональный collaborator: отсутствие → cue молча пропускается
    pub voice: Option<&'a mut dyn VoicePlayer>,
    /// Landing notifications этого tick'а
    pub landings: &'a mut Vec<LandingImpact>,
    pub delta: f32,
}

impl AbilityContext<'_> {
    pub fn play_voice(&mut self, cue: Option<&str>) {
        if let (Some(voice), Some(cue)) = (self.voice.as_deref_mut(), cue) {
            voice.play_voice(cue);
        }
    }

    pub fn notify_landed(&mut self, impact: LandingImpact) {
        self.landings.push(impact);
    }
}

/// Контракт ability
///
/// Coordinator гарантирует: `on_stop` старой ability завершается до `on_start` новой,
/// `update` вызывается только между `on_start` и `on_stop`.
pub trait Ability {
    fn kind(&self) -> AbilityKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Readiness predicate (может кешировать данные для `on_start`)
    fn ready_to_start(&mut self, ctx: &mut AbilityContext) -> bool;

    fn on_start(&mut self, ctx: &mut AbilityContext);

    fn update(&mut self, ctx: &mut AbilityContext) -> AbilityFlow;

    fn on_stop(&mut self, ctx: &mut AbilityContext);
}

/// Закрытый набор abilities
#[derive(Debug, Clone)]
pub enum AbilityState {
    Locomotion(Locomotion),
    ClimbUp(ClimbUp),
    JumpAndFalling(JumpAndFalling),
}

impl AbilityState {
    fn as_ability(&self) -> &dyn Ability {
        match self {
            AbilityState::Locomotion(state) => state,
            AbilityState::ClimbUp(state) => state,
            AbilityState::JumpAndFalling(state) => state,
        }
    }

    fn as_ability_mut(&mut self) -> &mut dyn Ability {
        match self {
            AbilityState::Locomotion(state) => state,
            AbilityState::ClimbUp(state) => state,
            AbilityState::JumpAndFalling(state) => state,
        }
    }
}

impl Ability for AbilityState {
    fn kind(&self) -> AbilityKind {
        self.as_ability().kind()
    }

    fn ready_to_start(&mut self, ctx: &mut AbilityContext) -> bool {
        self.as_ability_mut().ready_to_start(ctx)
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        self.as_ability_mut().on_start(ctx);
    }

    fn update(&mut self, ctx: &mut AbilityContext) -> AbilityFlow {
        self.as_ability_mut().update(ctx)
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext) {
        self.as_ability_mut().on_stop(ctx);
    }
}

/// Анимация закончилась: не в transition, в нужном состоянии, normalized time ≥ exit
///
/// One-shot clip после 1.0 тоже закончен: короткий clip может перешагнуть
/// окно `[exit_time, 1)` за один tick.
pub fn has_finished_animation(animator: &dyn AnimationDriver, state: &str, exit_time: f32) -> bool {
    let info = animator.current_state();
    if info.in_transition || !info.is_name(state) {
        return false;
    }

    if !info.looping && info.normalized_time >= 1.0 {
        return true;
    }

    repeat(info.normalized_time, 1.0) >= exit_time
}

/// Cross-fade, только если аниматор уже не идёт в это состояние
///
/// Незавершённый cross-fade в другое состояние перебивается.
pub fn set_animation_state(animator: &mut dyn AnimationDriver, state: &str, blend_seconds: f32) {
    if animator.current_state().destination() != state {
        animator.cross_fade(state, blend_seconds);
    }
}
