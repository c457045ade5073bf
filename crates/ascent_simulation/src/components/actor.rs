//! Базовые компоненты персонажа: Character, Health, FallDamage

use bevy::prelude::*;

/// Персонаж под управлением ability state machine
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Character;

/// Маркер: abilities персонажа приостановлены
///
/// При добавлении активная ability останавливается (teardown),
/// пока маркер висит - coordinator не тикает.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct AbilitiesSuspended;

/// Здоровье персонажа
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }
}

/// Opt-in подписчик на hard landing
///
/// Урон = `max_damage * damage_ratio` (ratio из `LandingImpact::Hard`).
/// Ratio ≥ 1 означает падение с высоты kill-порога и выше.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct FallDamage {
    pub max_damage: f32,
}

impl Default for FallDamage {
    fn default() -> Self {
        Self { max_damage: 200.0 }
    }
}

impl FallDamage {
    pub fn damage_for(&self, damage_ratio: f32) -> u32 {
        (self.max_damage * damage_ratio.max(0.0)) as u32
    }
}
