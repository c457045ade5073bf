//! Kinematic body персонажа
//!
//! Архитектура:
//! - Rapier components (RigidBody::KinematicPositionBased, Collider, CollisionGroups)
//!   описывают тело для движка; velocity интегрируем сами
//! - Swept коллизии через `GeometryQuery` (ground probe + horizontal slide)
//! - Root motion и pose correction берутся из `ClipAnimator`
//!
//! Детерминизм: fixed timestep (60Hz), все системы в одной chained цепочке

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::BodyController;
use crate::animation::ClipAnimator;
use crate::geometry::{GeometryHit, GeometryProvider, GeometryQuery, MASK_WALKABLE};
use crate::logger;
use crate::math::{flatten, smooth_damp_angle, yaw_forward, yaw_of, yaw_right, yaw_rotation};

/// Дальность ground probe под ногами (m)
const GROUND_PROBE_DISTANCE: f32 = 0.08;

/// Нижняя сфера horizontal sweep поднята на step offset (не цепляем пол)
const STEP_OFFSET: f32 = 0.1;

/// Зазор до стены после horizontal sweep
const SKIN_WIDTH: f32 = 0.01;

/// Root motion режим
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct RootMotion {
    /// Покомпонентный вес (right, up, forward)
    pub weight: Vec3,
    /// Поворот из анимации (clip'ы без angular root motion → no-op)
    pub apply_rotation: bool,
}

/// Kinematic тело персонажа
///
/// Флаги collision/gravity/root_motion принадлежат активной ability.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct KinematicBody {
    pub velocity: Vec3,
    /// Гравитация (m/s², отрицательная)
    pub gravity: f32,
    pub collision_enabled: bool,
    pub gravity_enabled: bool,
    pub grounded: bool,
    pub root_motion: Option<RootMotion>,
    pub capsule_radius: f32,
    pub capsule_height: f32,
    /// Smooth time поворота при `move_with_input(.., rotate = true)`
    pub turn_smooth_time: f32,
    pub turn_velocity: f32,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            gravity: -20.0,
            collision_enabled: true,
            gravity_enabled: true,
            grounded: false,
            root_motion: None,
            capsule_radius: 0.3,
            capsule_height: 1.8,
            turn_smooth_time: 0.12,
            turn_velocity: 0.0,
        }
    }
}

impl KinematicBody {
    /// Rapier collider для capsule (origin в ногах → half height без полусфер)
    pub fn collider(&self) -> Collider {
        let half_height = (self.capsule_height * 0.5 - self.capsule_radius).max(0.0);
        Collider::capsule_y(half_height, self.capsule_radius)
    }

    /// Центр нижней полусферы capsule
    fn feet_center(&self, position: Vec3) -> Vec3 {
        position + Vec3::Y * self.capsule_radius
    }
}

/// Borrow тела на один tick (реализация `BodyController`)
pub struct BodyHandle<'a> {
    body: &'a mut KinematicBody,
    transform: &'a mut Transform,
    /// Yaw камеры (градусы) - базис для `move_with_input`
    view_yaw: f32,
    delta: f32,
}

impl<'a> BodyHandle<'a> {
    pub fn new(body: &'a mut KinematicBody, transform: &'a mut Transform, view_yaw: f32, delta: f32) -> Self {
        Self {
            body,
            transform,
            view_yaw,
            delta,
        }
    }
}

impl BodyController for BodyHandle<'_> {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn forward(&self) -> Vec3 {
        yaw_forward(self.yaw_degrees())
    }

    fn yaw_degrees(&self) -> f32 {
        yaw_of(self.transform.rotation)
    }

    fn set_yaw_degrees(&mut self, yaw_degrees: f32) {
        self.transform.rotation = yaw_rotation(yaw_degrees);
    }

    fn capsule_radius(&self) -> f32 {
        self.body.capsule_radius
    }

    fn enable_collision(&mut self) {
        self.body.collision_enabled = true;
    }

    fn disable_collision(&mut self) {
        self.body.collision_enabled = false;
    }

    fn collision_enabled(&self) -> bool {
        self.body.collision_enabled
    }

    fn enable_gravity(&mut self) {
        self.body.gravity_enabled = true;
    }

    fn disable_gravity(&mut self) {
        self.body.gravity_enabled = false;
    }

    fn gravity_enabled(&self) -> bool {
        self.body.gravity_enabled
    }

    fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.body.velocity = velocity;
    }

    fn gravity(&self) -> f32 {
        self.body.gravity
    }

    fn apply_root_motion(&mut self, weight: Vec3, apply_rotation: bool) {
        self.body.root_motion = Some(RootMotion { weight, apply_rotation });
    }

    fn stop_root_motion(&mut self) {
        self.body.root_motion = None;
    }

    fn stop_movement(&mut self) {
        self.body.velocity = Vec3::ZERO;
    }

    fn move_with_input(&mut self, input: Vec2, speed: f32, rotate: bool) {
        let input = input.clamp_length_max(1.0);

        if input.length_squared() < 1e-6 {
            self.body.velocity.x = 0.0;
            self.body.velocity.z = 0.0;
            return;
        }

        // Направление относительно камеры: atan2(x, y) + yaw камеры
        let move_yaw = input.x.atan2(input.y).to_degrees() + self.view_yaw;
        let horizontal = yaw_forward(move_yaw) * speed * input.length();

        self.body.velocity.x = horizontal.x;
        self.body.velocity.z = horizontal.z;

        if rotate {
            let yaw = smooth_damp_angle(
                self.yaw_degrees(),
                move_yaw,
                &mut self.body.turn_velocity,
                self.body.turn_smooth_time,
                self.delta,
            );
            self.set_yaw_degrees(yaw);
        }
    }

    fn is_grounded(&self) -> bool {
        self.body.grounded
    }
}

/// Ground probe одного тела: grounded + snap на поверхность
///
/// Grounded только если тело не летит вверх (прыжок отрывает от земли сразу).
/// Snap только при включённом collision (climb двигает тело сквозь геометрию).
pub fn probe_ground(body: &mut KinematicBody, transform: &mut Transform, geometry: &dyn GeometryQuery) {
    let feet = body.feet_center(transform.translation);
    let hit = geometry.sphere_sweep(feet, body.capsule_radius, Vec3::NEG_Y, GROUND_PROBE_DISTANCE, MASK_WALKABLE);

    body.grounded = match hit {
        Some(hit) if body.velocity.y <= 0.01 => {
            if body.collision_enabled && hit.distance > 0.0 {
                transform.translation.y -= hit.distance;
            }
            true
        }
        _ => false,
    };
}

/// Система ground detection через sphere sweep под ногами
pub fn ground_detection(
    mut bodies: Query<(&mut Transform, &mut KinematicBody)>,
    geometry: Option<Res<GeometryProvider>>,
) {
    let Some(geometry) = geometry else {
        logger::log_error("ground_detection: GeometryProvider missing, tick skipped");
        return;
    };

    for (mut transform, mut body) in bodies.iter_mut() {
        probe_ground(&mut body, &mut transform, geometry.query());
    }
}

/// Один шаг интеграции тела (без ECS, для систем и тестов)
pub fn integrate_body(
    body: &mut KinematicBody,
    transform: &mut Transform,
    mut animator: Option<&mut ClipAnimator>,
    geometry: &dyn GeometryQuery,
    delta: f32,
) {
    let was_grounded = body.grounded;

    if body.gravity_enabled && !was_grounded {
        body.velocity.y += body.gravity * delta;
    }
    // На земле вниз не проваливаемся (impact velocity живёт ровно один tick)
    if was_grounded && body.velocity.y < 0.0 {
        body.velocity.y = 0.0;
    }

    let mut extra_vertical = 0.0;

    // Root motion заменяет горизонтальную velocity
    if let (Some(root_motion), Some(animator)) = (body.root_motion, animator.as_deref()) {
        let local = animator.root_motion_velocity() * root_motion.weight;
        let yaw = yaw_of(transform.rotation);
        let world = yaw_right(yaw) * local.x + Vec3::Y * local.y + yaw_forward(yaw) * local.z;

        body.velocity.x = world.x;
        body.velocity.z = world.z;
        extra_vertical = world.y * delta;
    }

    // Vertical
    let vertical = body.velocity.y * delta + extra_vertical;
    if vertical < 0.0 && body.collision_enabled {
        let feet = body.feet_center(transform.translation);
        match geometry.sphere_sweep(feet, body.capsule_radius, Vec3::NEG_Y, -vertical, MASK_WALKABLE) {
            Some(hit) => {
                // Приземление: snap на поверхность, velocity.y оставляем до следующего tick
                transform.translation.y -= hit.distance;
                body.grounded = true;
            }
            None => {
                transform.translation.y += vertical;
                body.grounded = false;
            }
        }
    } else if vertical != 0.0 {
        transform.translation.y += vertical;
        if vertical > 0.0 {
            body.grounded = false;
        }
    }

    // Horizontal
    let horizontal = flatten(body.velocity) * delta;
    if body.collision_enabled {
        move_horizontal(body, transform, horizontal, geometry);
    } else {
        transform.translation += horizontal;
    }

    // Pose correction (target matching) поверх движения
    if let Some(animator) = animator.as_deref_mut() {
        if let Some(step) = animator.pose_correction_step(transform.translation, transform.rotation) {
            transform.translation += step.translation;
            if let Some(rotation) = step.rotation {
                transform.rotation = rotation;
            }
        }
    }
}

/// Horizontal capsule sweep с одной итерацией slide
fn move_horizontal(body: &mut KinematicBody, transform: &mut Transform, motion: Vec3, geometry: &dyn GeometryQuery) {
    let distance = motion.length();
    if distance < 1e-6 {
        return;
    }

    let direction = motion / distance;
    let Some(hit) = sweep_capsule(body, transform.translation, direction, distance, geometry) else {
        transform.translation += motion;
        return;
    };

    let advance = (hit.distance - SKIN_WIDTH).max(0.0);
    transform.translation += direction * advance;

    // Slide вдоль стены (нормаль проецируем на горизонталь)
    let normal = flatten(hit.normal).normalize_or_zero();
    if normal == Vec3::ZERO {
        return;
    }

    let into_wall = body.velocity.dot(normal);
    if into_wall < 0.0 {
        body.velocity -= normal * into_wall;
    }

    let remaining = direction * (distance - advance);
    let slide = remaining - normal * remaining.dot(normal);
    let slide_distance = slide.length();
    if slide_distance < 1e-6 {
        return;
    }

    let slide_direction = slide / slide_distance;
    match sweep_capsule(body, transform.translation, slide_direction, slide_distance, geometry) {
        Some(slide_hit) => {
            transform.translation += slide_direction * (slide_hit.distance - SKIN_WIDTH).max(0.0);
        }
        None => transform.translation += slide,
    }
}

fn sweep_capsule(
    body: &KinematicBody,
    position: Vec3,
    direction: Vec3,
    distance: f32,
    geometry: &dyn GeometryQuery,
) -> Option<GeometryHit> {
    let radius = body.capsule_radius;
    let p1 = position + Vec3::Y * (radius + STEP_OFFSET);
    let p2 = position + Vec3::Y * (body.capsule_height - radius).max(radius + STEP_OFFSET);

    geometry.capsule_sweep(p1, p2, radius, direction, distance, MASK_WALKABLE)
}

/// Система интеграции velocity → Transform
///
/// Работает в FixedUpdate после tick_abilities.
pub fn integrate_bodies(
    mut bodies: Query<(&mut Transform, &mut KinematicBody, Option<&mut ClipAnimator>)>,
    geometry: Option<Res<GeometryProvider>>,
    time: Res<Time<Fixed>>,
) {
    let Some(geometry) = geometry else {
        logger::log_error("integrate_bodies: GeometryProvider missing, tick skipped");
        return;
    };
    let delta = time.delta_secs();

    for (mut transform, mut body, mut animator) in bodies.iter_mut() {
        integrate_body(
            &mut body,
            &mut transform,
            animator.as_deref_mut(),
            geometry.query(),
            delta,
        );
    }
}

/// Система: зеркалит collision флаг тела на rapier `ColliderDisabled`
pub fn sync_collider_state(
    mut commands: Commands,
    bodies: Query<(Entity, &KinematicBody, Has<ColliderDisabled>), Changed<KinematicBody>>,
) {
    for (entity, body, disabled) in bodies.iter() {
        if !body.collision_enabled && !disabled {
            commands.entity(entity).insert(ColliderDisabled);
        } else if body.collision_enabled && disabled {
            commands.entity(entity).remove::<ColliderDisabled>();
        }
    }
}
