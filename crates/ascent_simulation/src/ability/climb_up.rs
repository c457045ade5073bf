//! ClimbUp - короткий подъём на уступ
//!
//! Ledge detection (три запроса, short-circuit):
//! 1. overlap sphere у ног - есть ли climbable геометрия рядом
//! 2. capsule sweep вперёд на высоте [min_climb_height, capsule_cast_height]
//! 3. sphere sweep вниз от точки удара - верх уступа
//!
//! Target = верх уступа, normal = горизонтальная проекция нормали передней грани.

use bevy::prelude::*;

use super::{Ability, AbilityContext, AbilityFlow, AbilityKind};
use crate::animation::PoseCorrection;
use crate::config::ClimbUpConfig;
use crate::geometry::{GeometryHit, GeometryQuery};
use crate::math::{flatten, repeat};

#[derive(Debug, Clone)]
pub struct ClimbUp {
    config: ClimbUpConfig,
    /// Кеш из readiness, живёт до on_stop
    target_hit: Option<GeometryHit>,
    has_matched_target: bool,
}

impl ClimbUp {
    pub fn new(config: ClimbUpConfig) -> Self {
        Self {
            config,
            target_hit: None,
            has_matched_target: false,
        }
    }

    pub fn config(&self) -> &ClimbUpConfig {
        &self.config
    }

    pub fn target_hit(&self) -> Option<GeometryHit> {
        self.target_hit
    }

    pub fn has_matched_target(&self) -> bool {
        self.has_matched_target
    }

    /// Ищет уступ перед телом (position - ноги, forward - горизонтальный)
    pub fn find_short_climb(&self, geometry: &dyn GeometryQuery, position: Vec3, forward: Vec3) -> Option<GeometryHit> {
        let config = &self.config;
        let mask = config.mask();

        let overlap_center = position + Vec3::Y * config.overlap_radius;
        if geometry.overlap_sphere(overlap_center, config.overlap_radius, mask) == 0 {
            return None;
        }

        let p1 = position + Vec3::Y * (config.min_climb_height + config.capsule_cast_radius);
        let p2 = position + Vec3::Y * (config.capsule_cast_height - config.capsule_cast_radius);
        let forward_hit = geometry.capsule_sweep(
            p1,
            p2,
            config.capsule_cast_radius,
            forward,
            config.overlap_radius,
            mask,
        )?;

        let mut sphere_start = forward_hit.point;
        sphere_start.y = position.y + config.max_climb_height + config.capsule_cast_radius;

        let mut top_hit = geometry.sphere_sweep(
            sphere_start,
            config.capsule_cast_radius,
            Vec3::NEG_Y,
            config.max_climb_height - config.min_climb_height,
            mask,
        )?;

        top_hit.normal = flatten(forward_hit.normal).normalize_or_zero();
        Some(top_hit)
    }
}

impl Ability for ClimbUp {
    fn kind(&self) -> AbilityKind {
        AbilityKind::ClimbUp
    }

    fn ready_to_start(&mut self, ctx: &mut AbilityContext) -> bool {
        if ctx.body.is_grounded() {
            return false;
        }

        match self.find_short_climb(ctx.geometry, ctx.body.position(), ctx.body.forward()) {
            Some(hit) => {
                self.target_hit = Some(hit);
                true
            }
            None => false,
        }
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        ctx.body.disable_collision();
        ctx.body.disable_gravity();
        ctx.body.apply_root_motion(Vec3::ONE, true);
        ctx.body.stop_movement();

        ctx.animator.cross_fade(&self.config.climb_state, self.config.blend_time);
        self.has_matched_target = false;
    }

    fn update(&mut self, ctx: &mut AbilityContext) -> AbilityFlow {
        let state = ctx.animator.current_state();
        if state.in_transition || !state.is_name(&self.config.climb_state) {
            return AbilityFlow::Continue;
        }

        let normalized_time = repeat(state.normalized_time, 1.0);
        // One-shot clip мог перешагнуть exit window за один tick
        let played_through = !state.looping && state.normalized_time >= 1.0;

        if !ctx.animator.is_matching_target() && !self.has_matched_target {
            if let Some(hit) = self.target_hit {
                let target_position = hit.point - hit.normal * ctx.body.capsule_radius() * 0.5;
                ctx.animator.request_pose_correction(PoseCorrection {
                    target_position,
                    target_rotation: Quat::IDENTITY,
                    position_weight: Vec3::ONE,
                    rotation_weight: 0.0,
                    start_time: self.config.match_start,
                    end_time: self.config.match_end,
                });
            }

            self.has_matched_target = true;
        }

        if normalized_time > self.config.exit_time || played_through {
            return AbilityFlow::Stop;
        }

        AbilityFlow::Continue
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext) {
        ctx.body.enable_collision();
        ctx.body.enable_gravity();
        ctx.body.stop_root_motion();
        ctx.body.stop_movement();

        self.target_hit = None;
    }
}
