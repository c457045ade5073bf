//! Math helpers: critically damped smoothing, yaw conventions
//!
//! Yaw в градусах, по часовой стрелке если смотреть сверху:
//! - yaw 0 → forward = -Z (bevy forward)
//! - yaw 90 → forward = +X
//!
//! Input vector (x = right, y = forward) переводится в yaw через `atan2(x, y)`.

use bevy::prelude::*;

/// Критически задемпфированное сглаживание (без overshoot)
///
/// `velocity` - состояние между вызовами, хранится у вызывающего.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, delta: f32) -> f32 {
    if delta <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * delta;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * delta;
    *velocity = (*velocity - omega * temp) * exp;

    let mut output = target + (change + temp) * exp;

    // Не перелетаем target
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }

    output
}

/// `smooth_damp` для Vec2 (покомпонентно, общий overshoot check)
pub fn smooth_damp_vec2(current: Vec2, target: Vec2, velocity: &mut Vec2, smooth_time: f32, delta: f32) -> Vec2 {
    if delta <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * delta;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * delta;
    *velocity = (*velocity - omega * temp) * exp;

    let mut output = target + (change + temp) * exp;

    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *velocity = Vec2::ZERO;
    }

    output
}

/// Кратчайшая разница углов (градусы), результат в (-180, 180]
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// `smooth_damp` для углов в градусах (через кратчайшую дугу)
pub fn smooth_damp_angle(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, delta: f32) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, delta)
}

/// Заворачивает `t` в [0, length)
pub fn repeat(t: f32, length: f32) -> f32 {
    t.rem_euclid(length)
}

/// Rotation для yaw (градусы)
pub fn yaw_rotation(yaw_degrees: f32) -> Quat {
    Quat::from_rotation_y(-yaw_degrees.to_radians())
}

/// Yaw (градусы, [0, 360)) из произвольной rotation
pub fn yaw_of(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::NEG_Z;
    forward.x.atan2(-forward.z).to_degrees().rem_euclid(360.0)
}

/// Горизонтальный forward для yaw
pub fn yaw_forward(yaw_degrees: f32) -> Vec3 {
    let radians = yaw_degrees.to_radians();
    Vec3::new(radians.sin(), 0.0, -radians.cos())
}

/// Горизонтальный right для yaw
pub fn yaw_right(yaw_degrees: f32) -> Vec3 {
    let radians = yaw_degrees.to_radians();
    Vec3::new(radians.cos(), 0.0, radians.sin())
}

/// Проекция на горизонтальную плоскость (y = 0), без нормализации
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
