//! StaticScene - headless geometry провайдер над AABB
//!
//! Аналитика без физического движка:
//! - overlap: расстояние от центра сферы до ближайшей точки box
//! - sphere sweep: ray против box, расширенного на радиус (углы Minkowski
//!   суммы считаются острыми - для уступов и стен этого достаточно)
//! - capsule sweep: самый ранний из sphere sweep'ов вдоль оси capsule
//!   (шаг сэмплирования ≤ радиуса)

use bevy::prelude::*;

use super::{CollisionMask, GeometryHit, GeometryQuery, LAYER_CLIMBABLE, LAYER_ENVIRONMENT};

/// Допуск для "касания" в начале sweep (сфера лежит на полу)
const CONTACT_EPSILON: f32 = 1e-4;

/// Axis-aligned box со слоями коллизий
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBox {
    pub min: Vec3,
    pub max: Vec3,
    pub layers: CollisionMask,
}

impl SceneBox {
    pub fn new(min: Vec3, max: Vec3, layers: CollisionMask) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            layers,
        }
    }

    /// Плоский пол (top на y = 0) размером `half_extent * 2`
    pub fn ground(half_extent: f32) -> Self {
        Self::new(
            Vec3::new(-half_extent, -1.0, -half_extent),
            Vec3::new(half_extent, 0.0, half_extent),
            LAYER_ENVIRONMENT,
        )
    }

    /// Уступ: box с top на `height`, по центру `center` (x, z), полу-размеры `half_xz`
    pub fn ledge(center: Vec3, half_xz: Vec2, height: f32) -> Self {
        Self::new(
            Vec3::new(center.x - half_xz.x, center.y, center.z - half_xz.y),
            Vec3::new(center.x + half_xz.x, center.y + height, center.z + half_xz.y),
            LAYER_ENVIRONMENT | LAYER_CLIMBABLE,
        )
    }

    pub fn matches(&self, mask: CollisionMask) -> bool {
        self.layers.intersects(mask)
    }

    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    fn expanded(&self, radius: f32) -> (Vec3, Vec3) {
        (self.min - Vec3::splat(radius), self.max + Vec3::splat(radius))
    }
}

/// Resource-friendly сцена (список box'ов)
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    pub boxes: Vec<SceneBox>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_box(mut self, scene_box: SceneBox) -> Self {
        self.boxes.push(scene_box);
        self
    }

    pub fn add_box(&mut self, scene_box: SceneBox) {
        self.boxes.push(scene_box);
    }

    /// Sweep сферы против одного box: (distance, normal)
    fn sweep_box(
        scene_box: &SceneBox,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<(f32, Vec3)> {
        let (min, max) = scene_box.expanded(radius);

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut near_normal = Vec3::ZERO;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];

            if d.abs() < 1e-8 {
                // Параллельно slab'у - либо внутри, либо промах
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }

            let mut t1 = (min[axis] - o) / d;
            let mut t2 = (max[axis] - o) / d;
            let mut normal = Vec3::ZERO;
            normal[axis] = -d.signum();

            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            if t1 > t_near {
                t_near = t1;
                near_normal = normal;
            }
            t_far = t_far.min(t2);

            if t_near > t_far {
                return None;
            }
        }

        // Origin уже внутри - initial overlap не считается hit'ом
        if t_near < -CONTACT_EPSILON || t_far < 0.0 {
            return None;
        }
        // Все оси параллельны и origin внутри
        if near_normal == Vec3::ZERO {
            return None;
        }

        let distance = t_near.max(0.0);
        if distance > max_distance {
            return None;
        }

        Some((distance, near_normal))
    }
}

impl GeometryQuery for StaticScene {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask) -> usize {
        self.boxes
            .iter()
            .filter(|b| b.matches(mask))
            .filter(|b| b.closest_point(center).distance_squared(center) <= radius * radius)
            .count()
    }

    fn capsule_sweep(
        &self,
        p1: Vec3,
        p2: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<GeometryHit> {
        let axis = p2 - p1;
        let length = axis.length();
        let spacing = radius.max(0.01);
        let segments = (length / spacing).ceil().max(1.0) as usize;

        let mut best: Option<GeometryHit> = None;
        for i in 0..=segments {
            let origin = p1 + axis * (i as f32 / segments as f32);
            if let Some(hit) = self.sphere_sweep(origin, radius, direction, max_distance, mask) {
                if best.map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }

        best
    }

    fn sphere_sweep(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<GeometryHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let mut best: Option<GeometryHit> = None;
        for scene_box in self.boxes.iter().filter(|b| b.matches(mask)) {
            let Some((distance, normal)) = Self::sweep_box(scene_box, origin, radius, direction, max_distance) else {
                continue;
            };

            if best.map_or(false, |b| b.distance <= distance) {
                continue;
            }

            // Точка контакта - ближайшая точка box к центру сферы в момент удара
            let center = origin + direction * distance;
            best = Some(GeometryHit {
                point: scene_box.closest_point(center),
                normal,
                distance,
            });
        }

        best
    }
}
