//! ClipAnimator - headless animation driver
//!
//! Модель:
//! - Каждое состояние = clip (длина, looping, root motion velocity)
//! - Cross-fade: target clip играет параллельно, пока не истечёт blend
//! - Normalized time не clamp'ится (как у движковых аниматоров)
//! - Pose correction применяется body integration'ом через `pose_correction_step`
//!
//! Cross-fade в неизвестное состояние игнорируется с warning'ом -
//! ability, ждущая это состояние, будет ждать бесконечно (принятый tradeoff).

use std::collections::HashMap;

use bevy::prelude::*;

use super::{AnimationDriver, AnimatorStateInfo, PoseCorrection};
use crate::logger;

/// Описание clip'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipDef {
    /// Длина (секунды)
    pub length: f32,
    pub looping: bool,
    /// Root motion velocity в локальных осях: x = right, y = up, z = forward (m/s)
    pub root_motion: Vec3,
}

impl ClipDef {
    pub fn once(length: f32) -> Self {
        Self {
            length,
            looping: false,
            root_motion: Vec3::ZERO,
        }
    }

    pub fn looping(length: f32) -> Self {
        Self {
            length,
            looping: true,
            root_motion: Vec3::ZERO,
        }
    }

    pub fn with_root_motion(mut self, root_motion: Vec3) -> Self {
        self.root_motion = root_motion;
        self
    }
}

/// Библиотека clip'ов по имени состояния
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, ClipDef>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Набор состояний, которые используют стандартные abilities
    pub fn standard() -> Self {
        Self::new()
            .with_clip("Locomotion", ClipDef::looping(1.0))
            .with_clip("Climb Up", ClipDef::once(1.2).with_root_motion(Vec3::new(0.0, 0.0, 0.8)))
            .with_clip("Air.Jump", ClipDef::once(0.5))
            .with_clip("Air.Falling", ClipDef::looping(0.8))
            .with_clip("Air.HardLand", ClipDef::once(0.9).with_root_motion(Vec3::new(0.0, 0.0, 0.4)))
    }

    pub fn with_clip(mut self, name: impl Into<String>, clip: ClipDef) -> Self {
        self.clips.insert(name.into(), clip);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClipDef> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }
}

#[derive(Debug, Clone)]
struct Transition {
    target: String,
    target_time: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone)]
struct ActivePoseCorrection {
    request: PoseCorrection,
    /// Состояние, в котором был сделан запрос
    state: String,
    last_normalized: f32,
}

/// Результат одного шага pose correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseCorrectionStep {
    pub translation: Vec3,
    pub rotation: Option<Quat>,
}

/// Component: headless аниматор персонажа
#[derive(Component, Debug, Clone)]
pub struct ClipAnimator {
    library: ClipLibrary,
    current: String,
    current_time: f32,
    transition: Option<Transition>,
    pose_correction: Option<ActivePoseCorrection>,
}

impl ClipAnimator {
    pub fn new(library: ClipLibrary, initial_state: impl Into<String>) -> Self {
        Self {
            library,
            current: initial_state.into(),
            current_time: 0.0,
            transition: None,
            pose_correction: None,
        }
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    /// Имя состояния, в которое идёт transition (если идёт)
    pub fn transition_target(&self) -> Option<&str> {
        self.transition.as_ref().map(|t| t.target.as_str())
    }

    fn clip_length(&self, name: &str) -> f32 {
        self.library
            .get(name)
            .map(|c| c.length)
            .filter(|l| *l > 0.0)
            .unwrap_or(1.0)
    }

    fn normalized_time(&self) -> f32 {
        self.current_time / self.clip_length(&self.current)
    }

    fn clip_root_motion(&self, name: &str, time: f32) -> Vec3 {
        match self.library.get(name) {
            // Non-looping clip после конца стоит на месте
            Some(clip) if clip.looping || time < clip.length => clip.root_motion,
            _ => Vec3::ZERO,
        }
    }

    /// Продвигает время clip'ов на `delta` секунд
    pub fn advance(&mut self, delta: f32) {
        self.current_time += delta;

        let finished = match self.transition.as_mut() {
            Some(transition) => {
                transition.elapsed += delta;
                transition.target_time += delta;
                transition.elapsed >= transition.duration
            }
            None => false,
        };

        if finished {
            if let Some(transition) = self.transition.take() {
                self.current = transition.target;
                self.current_time = transition.target_time;
            }
        }

        // Pose correction живёт только в своём состоянии
        let stale = self
            .pose_correction
            .as_ref()
            .map_or(false, |pc| pc.state != self.current);
        if stale {
            self.pose_correction = None;
        }
    }

    /// Root motion velocity в локальных осях (right, up, forward), с учётом blend
    pub fn root_motion_velocity(&self) -> Vec3 {
        let current = self.clip_root_motion(&self.current, self.current_time);

        match &self.transition {
            Some(transition) => {
                let target = self.clip_root_motion(&transition.target, transition.target_time);
                let blend = if transition.duration > 0.0 {
                    (transition.elapsed / transition.duration).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                current.lerp(target, blend)
            }
            None => current,
        }
    }

    /// Шаг target matching для текущей позиции root'а
    ///
    /// Внутри окна смещение выбирается так, чтобы к `end_time` root оказался
    /// ровно в target (с учётом весов). На `end_time` запрос завершается.
    pub fn pose_correction_step(&mut self, position: Vec3, rotation: Quat) -> Option<PoseCorrectionStep> {
        if self.transition.is_some() {
            return None;
        }

        let normalized = self.normalized_time();
        let active = self.pose_correction.as_mut()?;
        if active.state != self.current {
            return None;
        }

        let request = active.request;
        if normalized < request.start_time {
            active.last_normalized = normalized;
            return None;
        }

        let from = active.last_normalized.max(request.start_time);
        let remaining = request.end_time - from;
        let alpha = if normalized >= request.end_time || remaining <= 1e-6 {
            1.0
        } else {
            ((normalized - from) / remaining).clamp(0.0, 1.0)
        };

        active.last_normalized = normalized;
        if normalized >= request.end_time {
            self.pose_correction = None;
        }

        let translation = (request.target_position - position) * request.position_weight * alpha;
        let rotation = (request.rotation_weight > 0.0)
            .then(|| rotation.slerp(request.target_rotation, (alpha * request.rotation_weight).clamp(0.0, 1.0)));

        Some(PoseCorrectionStep { translation, rotation })
    }
}

impl AnimationDriver for ClipAnimator {
    fn cross_fade(&mut self, state: &str, blend_seconds: f32) {
        if !self.library.contains(state) {
            logger::log_warning(&format!(
                "ClipAnimator: unknown state '{}', cross-fade ignored (staying in '{}')",
                state, self.current
            ));
            return;
        }

        if blend_seconds <= 0.0 {
            self.current = state.to_string();
            self.current_time = 0.0;
            self.transition = None;
        } else {
            self.transition = Some(Transition {
                target: state.to_string(),
                target_time: 0.0,
                elapsed: 0.0,
                duration: blend_seconds,
            });
        }
    }

    fn current_state(&self) -> AnimatorStateInfo<'_> {
        AnimatorStateInfo {
            name: &self.current,
            normalized_time: self.normalized_time(),
            in_transition: self.transition.is_some(),
            transition_target: self.transition_target(),
            looping: self.library.get(&self.current).map_or(false, |clip| clip.looping),
        }
    }

    fn is_matching_target(&self) -> bool {
        self.pose_correction.is_some()
    }

    fn request_pose_correction(&mut self, request: PoseCorrection) {
        self.pose_correction = Some(ActivePoseCorrection {
            request,
            state: self.current.clone(),
            last_normalized: self.normalized_time(),
        });
    }
}

/// Система: продвигает все аниматоры на fixed delta
pub fn advance_animators(mut animators: Query<&mut ClipAnimator>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut animator in animators.iter_mut() {
        animator.advance(delta);
    }
}
