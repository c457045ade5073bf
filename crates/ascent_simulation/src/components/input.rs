//! Input abilities и ориентация камеры
//!
//! Для headless тестов - mock input через эти компоненты.
//! Для игры - заполняются из input/camera слоя движка.

use bevy::prelude::*;

use crate::math::{yaw_forward, yaw_right};

/// Входные данные abilities
///
/// `jump` - one-tick импульс, сбрасывается `consume_jump_input` в конце tick.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AbilityInput {
    /// x = right, y = forward (относительно камеры), длина ≤ 1
    pub move_axis: Vec2,
    pub jump: bool,
    pub sprint: bool,
}

impl AbilityInput {
    pub fn moving(move_axis: Vec2) -> Self {
        Self {
            move_axis,
            ..default()
        }
    }
}

/// Ориентация камеры (только yaw, градусы)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ViewOrientation {
    pub yaw_degrees: f32,
}

impl ViewOrientation {
    pub fn new(yaw_degrees: f32) -> Self {
        Self { yaw_degrees }
    }

    /// Горизонтальный forward камеры
    pub fn forward(&self) -> Vec3 {
        yaw_forward(self.yaw_degrees)
    }

    pub fn right(&self) -> Vec3 {
        yaw_right(self.yaw_degrees)
    }
}

/// Система: jump - импульс на один tick
pub fn consume_jump_input(mut inputs: Query<&mut AbilityInput>) {
    for mut input in inputs.iter_mut() {
        if input.jump {
            input.jump = false;
        }
    }
}
