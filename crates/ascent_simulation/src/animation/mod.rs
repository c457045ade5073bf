//! Animation driver - граница с системой анимации
//!
//! Core не знает про blend trees и IK. Ему нужно:
//! - cross-fade в именованное состояние
//! - текущее состояние (имя, normalized time, идёт ли transition)
//! - one-shot pose correction (target matching) в окне normalized time
//!
//! Headless реализация - `ClipAnimator` (clip-time модель без рига).

use bevy::prelude::*;

pub mod clip_animator;


pub use clip_animator::{advance_animators, ClipAnimator, ClipLibrary, ClipDef};

/// Снимок текущего состояния аниматора
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorStateInfo<'a> {
    pub name: &'a str,
    /// Normalized time (1.0 = один проигрыш clip'а, растёт дальше для looping)
    pub normalized_time: f32,
    pub in_transition: bool,
    /// Куда идёт незавершённый cross-fade
    pub transition_target: Option<&'a str>,
    /// false - one-shot clip, после 1.0 стоит на последнем кадре
    pub looping: bool,
}

impl AnimatorStateInfo<'_> {
    pub fn is_name(&self, name: &str) -> bool {
        self.name == name
    }

    /// Состояние, в котором аниматор окажется после текущего cross-fade
    pub fn destination(&self) -> &str {
        self.transition_target.unwrap_or(self.name)
    }
}

/// Запрос на pose correction (target matching root'а)
///
/// Драйвер сам гейтит применение окном `[start_time, end_time]` normalized time
/// состояния, активного в момент запроса.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PoseCorrection {
    pub target_position: Vec3,
    pub target_rotation: Quat,
    /// Покомпонентный вес позиции (1 = полностью матчим ось)
    pub position_weight: Vec3,
    /// Вес rotation (0 = rotation не трогаем)
    pub rotation_weight: f32,
    pub start_time: f32,
    pub end_time: f32,
}

/// Драйвер анимации (реализуется движком)
pub trait AnimationDriver {
    /// Cross-fade в состояние за `blend_seconds`
    fn cross_fade(&mut self, state: &str, blend_seconds: f32);

    fn current_state(&self) -> AnimatorStateInfo<'_>;

    /// Идёт ли сейчас target matching
    fn is_matching_target(&self) -> bool;

    /// One-shot запрос; повторный запрос заменяет незавершённый
    fn request_pose_correction(&mut self, request: PoseCorrection);
}
