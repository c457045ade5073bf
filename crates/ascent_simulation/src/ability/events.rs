//! Ability events

use bevy::prelude::*;

use super::{AbilityKind, LandingImpact};

/// Event: персонаж приземлился (не чаще одного раза на приземление)
///
/// Генерируется:
/// - JumpAndFalling (hard landing в update, soft landing в on_stop)
///
/// Обрабатывается:
/// - apply_fall_damage (только Hard, если у entity есть FallDamage)
/// - audio/UI слой движка
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Landed {
    pub entity: Entity,
    pub impact: LandingImpact,
}

/// Event: активная ability сменилась
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AbilityChanged {
    pub entity: Entity,
    /// None - старт из Idle
    pub from: Option<AbilityKind>,
    pub to: AbilityKind,
}

/// Event: voice cue для audio слоя
#[derive(Event, Debug, Clone, PartialEq)]
pub struct VoicePlayed {
    pub entity: Entity,
    pub cue: String,
}

/// Event: урон от падения нанесён
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FallDamageTaken {
    pub entity: Entity,
    pub damage: u32,
    pub fall_distance: f32,
    /// Health после урона
    pub remaining: u32,
}
