//! Geometry queries - граница с физическим миром
//!
//! Архитектура:
//! - Core (abilities, body) спрашивает мир только через `GeometryQuery`
//! - Движок реализует trait поверх своего broad/narrow phase
//! - Headless режим использует `StaticScene` (аналитика над AABB)
//!
//! Отсутствие hit - нормальный результат (`None`), не ошибка.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

pub mod scene;


pub use scene::{SceneBox, StaticScene};

/// Маска слоёв для запросов (rapier `Group` bitflags)
pub type CollisionMask = Group;

// ============================================================================
// Collision layers
// ============================================================================

/// Layer: акторы (capsule персонажей)
pub const LAYER_ACTORS: Group = Group::GROUP_2;

/// Layer: окружение (пол, стены, платформы)
pub const LAYER_ENVIRONMENT: Group = Group::GROUP_3;

/// Layer: короткие уступы, на которые можно залезть (ClimbUp)
pub const LAYER_CLIMBABLE: Group = Group::GROUP_7;

/// Mask: акторы коллайдят с окружением и уступами
pub const MASK_ACTORS: Group = LAYER_ENVIRONMENT.union(LAYER_CLIMBABLE).union(LAYER_ACTORS);

/// Mask: ground probe и swept движение тела
pub const MASK_WALKABLE: Group = LAYER_ENVIRONMENT.union(LAYER_CLIMBABLE);

/// Результат sweep запроса
///
/// `normal` - единичный вектор поверхности в точке контакта.
/// ClimbUp намеренно перезаписывает normal горизонтальной проекцией.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct GeometryHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Провайдер geometry запросов (реализуется движком)
///
/// Все запросы синхронные, в рамках одного tick.
/// Shape, уже пересекающий геометрию в начале sweep, не даёт hit.
pub trait GeometryQuery {
    /// Количество shape'ов из `mask`, пересекающих сферу
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask) -> usize;

    /// Sweep capsule (ось p1→p2) вдоль `direction` (normalized) на `max_distance`
    fn capsule_sweep(
        &self,
        p1: Vec3,
        p2: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<GeometryHit>;

    /// Sweep сферы из `origin` вдоль `direction` (normalized) на `max_distance`
    fn sphere_sweep(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<GeometryHit>;
}

/// Resource: активный провайдер geometry для ECS систем
///
/// Обязательный collaborator - `spawn_character` отказывается спавнить
/// персонажа без него.
#[derive(Resource)]
pub struct GeometryProvider(pub Box<dyn GeometryQuery + Send + Sync>);

impl GeometryProvider {
    pub fn new(query: impl GeometryQuery + Send + Sync + 'static) -> Self {
        Self(Box::new(query))
    }

    pub fn query(&self) -> &dyn GeometryQuery {
        self.0.as_ref()
    }
}
