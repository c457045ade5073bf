//! Mock collaborators для unit тестов abilities.

use std::cell::Cell;

use bevy::prelude::*;

use super::{AbilityContext, LandingImpact};
use crate::animation::{AnimationDriver, AnimatorStateInfo, PoseCorrection};
use crate::body::BodyController;
use crate::components::{AbilityInput, ViewOrientation, VoiceEmitter, VoicePlayer};
use crate::geometry::{CollisionMask, GeometryHit, GeometryQuery, SceneBox, StaticScene};
use crate::math::yaw_forward;

/// Тело без физики: флаги и вызовы просто запоминаются
#[derive(Debug, Clone)]
pub struct MockBody {
    pub position: Vec3,
    pub yaw: f32,
    pub radius: f32,
    pub collision: bool,
    pub gravity_on: bool,
    pub velocity: Vec3,
    pub gravity: f32,
    pub root_motion: Option<(Vec3, bool)>,
    pub grounded: bool,
    pub last_move: Option<(Vec2, f32, bool)>,
}

impl Default for MockBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            radius: 0.3,
            collision: true,
            gravity_on: true,
            velocity: Vec3::ZERO,
            gravity: -20.0,
            root_motion: None,
            grounded: true,
            last_move: None,
        }
    }
}

impl BodyController for MockBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        yaw_forward(self.yaw)
    }

    fn yaw_degrees(&self) -> f32 {
        self.yaw
    }

    fn set_yaw_degrees(&mut self, yaw_degrees: f32) {
        self.yaw = yaw_degrees;
    }

    fn capsule_radius(&self) -> f32 {
        self.radius
    }

    fn enable_collision(&mut self) {
        self.collision = true;
    }

    fn disable_collision(&mut self) {
        self.collision = false;
    }

    fn collision_enabled(&self) -> bool {
        self.collision
    }

    fn enable_gravity(&mut self) {
        self.gravity_on = true;
    }

    fn disable_gravity(&mut self) {
        self.gravity_on = false;
    }

    fn gravity_enabled(&self) -> bool {
        self.gravity_on
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn gravity(&self) -> f32 {
        self.gravity
    }

    fn apply_root_motion(&mut self, weight: Vec3, apply_rotation: bool) {
        self.root_motion = Some((weight, apply_rotation));
    }

    fn stop_root_motion(&mut self) {
        self.root_motion = None;
    }

    fn stop_movement(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    fn move_with_input(&mut self, input: Vec2, speed: f32, rotate: bool) {
        self.last_move = Some((input, speed, rotate));
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }
}

/// Аниматор, состояние которого тест выставляет руками
#[derive(Debug, Clone)]
pub struct MockAnimator {
    pub state: String,
    pub normalized_time: f32,
    pub in_transition: bool,
    /// Цель незавершённого cross-fade
    pub transition_target: Option<String>,
    pub looping: bool,
    pub matching: bool,
    pub cross_fades: Vec<(String, f32)>,
    pub pose_requests: Vec<PoseCorrection>,
}

impl Default for MockAnimator {
    fn default() -> Self {
        Self {
            state: "Locomotion".to_string(),
            normalized_time: 0.0,
            in_transition: false,
            transition_target: None,
            looping: false,
            matching: false,
            cross_fades: Vec::new(),
            pose_requests: Vec::new(),
        }
    }
}

impl MockAnimator {
    /// Transition завершён, состояние играет на `normalized_time`
    pub fn enter(&mut self, state: &str, normalized_time: f32) {
        self.state = state.to_string();
        self.normalized_time = normalized_time;
        self.in_transition = false;
        self.transition_target = None;
    }
}

impl AnimationDriver for MockAnimator {
    fn cross_fade(&mut self, state: &str, blend_seconds: f32) {
        self.cross_fades.push((state.to_string(), blend_seconds));
        self.in_transition = blend_seconds > 0.0;
        if self.in_transition {
            self.transition_target = Some(state.to_string());
        } else {
            self.enter(state, 0.0);
        }
    }

    fn current_state(&self) -> AnimatorStateInfo<'_> {
        AnimatorStateInfo {
            name: &self.state,
            normalized_time: self.normalized_time,
            in_transition: self.in_transition,
            transition_target: self.transition_target.as_deref().filter(|_| self.in_transition),
            looping: self.looping,
        }
    }

    fn is_matching_target(&self) -> bool {
        self.matching
    }

    fn request_pose_correction(&mut self, request: PoseCorrection) {
        self.pose_requests.push(request);
        self.matching = true;
    }
}

/// StaticScene со счётчиками запросов
#[derive(Debug, Default)]
pub struct RecordingGeometry {
    pub scene: StaticScene,
    pub overlaps: Cell<usize>,
    pub capsule_sweeps: Cell<usize>,
    pub sphere_sweeps: Cell<usize>,
}

impl RecordingGeometry {
    pub fn new(scene: StaticScene) -> Self {
        Self {
            scene,
            ..default()
        }
    }

    pub fn total_queries(&self) -> usize {
        self.overlaps.get() + self.capsule_sweeps.get() + self.sphere_sweeps.get()
    }
}

impl GeometryQuery for RecordingGeometry {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask) -> usize {
        self.overlaps.set(self.overlaps.get() + 1);
        self.scene.overlap_sphere(center, radius, mask)
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
        self.capsule_sweeps.set(self.capsule_sweeps.get() + 1);
        self.scene.capsule_sweep(p1, p2, radius, direction, max_distance, mask)
    }

    fn sphere_sweep(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<GeometryHit> {
        self.sphere_sweeps.set(self.sphere_sweeps.get() + 1);
        self.scene.sphere_sweep(origin, radius, direction, max_distance, mask)
    }
}

/// Пол + уступ высотой 1.2m, передняя грань на z = -1.0
pub fn ledge_scene() -> StaticScene {
    StaticScene::new()
        .with_box(SceneBox::ground(20.0))
        .with_box(SceneBox::ledge(Vec3::new(0.0, 0.0, -2.0), Vec2::new(2.0, 1.0), 1.2))
}

/// Набор mock collaborators + сборка `AbilityContext`
pub struct Harness {
    pub body: MockBody,
    pub animator: MockAnimator,
    pub geometry: RecordingGeometry,
    pub input: AbilityInput,
    pub view: ViewOrientation,
    pub voice: Option<VoiceEmitter>,
    pub landings: Vec<LandingImpact>,
    pub delta: f32,
}

impl Harness {
    pub fn new(scene: StaticScene) -> Self {
        Self {
            body: MockBody::default(),
            animator: MockAnimator::default(),
            geometry: RecordingGeometry::new(scene),
            input: AbilityInput::default(),
            view: ViewOrientation::default(),
            voice: Some(VoiceEmitter::default()),
            landings: Vec::new(),
            delta: 1.0 / 60.0,
        }
    }

    /// Тело в воздухе перед уступом, смотрит на него
    pub fn airborne_before_ledge() -> Self {
        let mut harness = Self::new(ledge_scene());
        harness.body.position = Vec3::new(0.0, 0.3, -0.4);
        harness.body.grounded = false;
        harness
    }

    pub fn run<R>(&mut self, f: impl FnOnce(&mut AbilityContext) -> R) -> R {
        let mut ctx = AbilityContext {
            body: &mut self.body,
            animator: &mut self.animator,
            geometry: &self.geometry,
            input: &self.input,
            view: &self.view,
            voice: self.voice.as_mut().map(|voice| voice as &mut dyn VoicePlayer),
            landings: &mut self.landings,
            delta: self.delta,
        };
        f(&mut ctx)
    }

    pub fn voice_cues(&self) -> Vec<String> {
        self.voice
            .as_ref()
            .map(|voice| voice.pending().to_vec())
            .unwrap_or_default()
    }
}
