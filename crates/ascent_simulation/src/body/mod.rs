//! Body controller - физическое представление персонажа
//!
//! Abilities управляют телом только через `BodyController`:
//! - collision / gravity toggles (владеет активная ability)
//! - velocity get/set, gravity scalar
//! - root motion (вес + флаг rotation)
//! - movement по input'у относительно камеры
//!
//! ECS реализация: `KinematicBody` component + `BodyHandle` (borrow на один tick).

use bevy::prelude::*;

pub mod kinematic;

#[cfg(test)]
mod kinematic_tests;

pub use kinematic::{
    ground_detection, integrate_bodies, integrate_body, probe_ground, sync_collider_state, BodyHandle, KinematicBody, RootMotion,
};

/// Контроллер тела (реализуется движком)
pub trait BodyController {
    fn position(&self) -> Vec3;

    /// Горизонтальный forward (куда смотрит персонаж)
    fn forward(&self) -> Vec3;

    fn yaw_degrees(&self) -> f32;
    fn set_yaw_degrees(&mut self, yaw_degrees: f32);

    fn capsule_radius(&self) -> f32;

    fn enable_collision(&mut self);
    fn disable_collision(&mut self);
    fn collision_enabled(&self) -> bool;

    fn enable_gravity(&mut self);
    fn disable_gravity(&mut self);
    fn gravity_enabled(&self) -> bool;

    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);

    /// Гравитация (отрицательная, m/s²)
    fn gravity(&self) -> f32;

    /// Включает root motion: displacement берётся из анимации с покомпонентным весом
    fn apply_root_motion(&mut self, weight: Vec3, apply_rotation: bool);
    fn stop_root_motion(&mut self);

    /// Обнуляет velocity
    fn stop_movement(&mut self);

    /// Движение по input'у (x = right, y = forward) относительно yaw камеры
    ///
    /// `rotate` - поворачивать персонажа в сторону движения.
    fn move_with_input(&mut self, input: Vec2, speed: f32, rotate: bool);

    fn is_grounded(&self) -> bool;
}
