//! JumpAndFalling - прыжок, полёт, приземление
//!
//! Фазы одной активации:
//! - start: прыжок (с земли по input) или падение (сошли с края)
//! - airborne: air control через smooth damp input'а, трекинг высшей точки
//! - landing: hard landing (fall distance ≥ порога) → recovery анимация на root motion,
//!   иначе stop и soft landing notification в on_stop
//!
//! Landed notification - ровно одна на приземление (hard в update, soft в on_stop).

use bevy::prelude::*;

use super::{has_finished_animation, set_animation_state, Ability, AbilityContext, AbilityFlow, AbilityKind, LandingImpact};
use crate::config::JumpAndFallingConfig;
use crate::math::{flatten, smooth_damp_angle, smooth_damp_vec2};

#[derive(Debug, Clone)]
pub struct JumpAndFalling {
    config: JumpAndFallingConfig,
    start_speed: f32,
    /// Input в пространстве камеры, сглаженный air control'ом
    start_input: Vec2,
    input_velocity: Vec2,
    angle_velocity: f32,
    target_rotation: f32,
    highest_position: f32,
    hard_landing: bool,
}

impl JumpAndFalling {
    pub fn new(config: JumpAndFallingConfig) -> Self {
        Self {
            config,
            start_speed: 0.0,
            start_input: Vec2::ZERO,
            input_velocity: Vec2::ZERO,
            angle_velocity: 0.0,
            target_rotation: 0.0,
            highest_position: 0.0,
            hard_landing: false,
        }
    }

    pub fn config(&self) -> &JumpAndFallingConfig {
        &self.config
    }

    pub fn start_speed(&self) -> f32 {
        self.start_speed
    }

    pub fn start_input(&self) -> Vec2 {
        self.start_input
    }

    pub fn highest_position(&self) -> f32 {
        self.highest_position
    }

    pub fn is_hard_landing(&self) -> bool {
        self.hard_landing
    }

    /// Вертикальная скорость старта: v = sqrt(2 h |g|)
    pub fn launch_speed(jump_height: f32, gravity: f32) -> f32 {
        (jump_height * -2.0 * gravity).max(0.0).sqrt()
    }

    fn perform_jump(&mut self, ctx: &mut AbilityContext) {
        let mut velocity = ctx.body.velocity();
        velocity.y = Self::launch_speed(self.config.jump_height, ctx.body.gravity());
        ctx.body.set_velocity(velocity);

        ctx.animator.cross_fade(&self.config.jump_state, self.config.jump_blend);
        self.start_speed = self.config.speed_on_air;

        if self.start_input.length() > 0.1 {
            self.start_input = self.start_input.normalize();
        }

        ctx.play_voice(self.config.jump_voice.as_deref());
    }

    fn rotate_character(&mut self, ctx: &mut AbilityContext) {
        if ctx.input.move_axis == Vec2::ZERO {
            return;
        }

        self.target_rotation = self.start_input.x.atan2(self.start_input.y).to_degrees() + ctx.view.yaw_degrees;
        let yaw = smooth_damp_angle(
            ctx.body.yaw_degrees(),
            self.target_rotation,
            &mut self.angle_velocity,
            self.config.air_control,
            ctx.delta,
        );
        ctx.body.set_yaw_degrees(yaw);
    }
}

impl Ability for JumpAndFalling {
    fn kind(&self) -> AbilityKind {
        AbilityKind::JumpAndFalling
    }

    fn ready_to_start(&mut self, ctx: &mut AbilityContext) -> bool {
        !ctx.body.is_grounded() || ctx.input.jump
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        self.start_input = ctx.input.move_axis;
        self.target_rotation = ctx.view.yaw_degrees;
        self.input_velocity = Vec2::ZERO;
        self.angle_velocity = 0.0;

        if ctx.input.jump && ctx.body.is_grounded() {
            self.perform_jump(ctx);
        } else {
            set_animation_state(ctx.animator, &self.config.fall_state, self.config.fall_blend);

            let velocity = ctx.body.velocity();
            self.start_speed = Vec2::new(velocity.x, velocity.z).length();

            // Текущий facing в пространстве камеры
            let forward = ctx.body.forward();
            self.start_input = Vec2::new(ctx.view.right().dot(forward), flatten(ctx.view.forward()).dot(forward));

            if self.start_speed > self.config.carried_speed_threshold {
                self.start_speed = self.config.speed_on_air;
            }
        }

        self.highest_position = ctx.body.position().y;
        self.hard_landing = false;
    }

    fn update(&mut self, ctx: &mut AbilityContext) -> AbilityFlow {
        if self.hard_landing {
            ctx.body.apply_root_motion(Vec3::ONE, false);

            if has_finished_animation(ctx.animator, &self.config.hard_land_state, self.config.exit_time) {
                return AbilityFlow::Stop;
            }
            return AbilityFlow::Continue;
        }

        let height = ctx.body.position().y;

        if ctx.body.is_grounded() {
            let fall_distance = self.highest_position - height;

            if fall_distance >= self.config.height_for_hard_land {
                self.hard_landing = true;
                set_animation_state(ctx.animator, &self.config.hard_land_state, self.config.hard_land_blend);

                ctx.notify_landed(LandingImpact::Hard {
                    fall_distance,
                    damage_ratio: self.config.damage_ratio(fall_distance),
                });
                ctx.play_voice(self.config.hard_land_voice.as_deref());

                return AbilityFlow::Continue;
            }

            return AbilityFlow::Stop;
        }

        if height > self.highest_position {
            self.highest_position = height;
        }

        self.start_input = smooth_damp_vec2(
            self.start_input,
            ctx.input.move_axis,
            &mut self.input_velocity,
            self.config.air_control,
            ctx.delta,
        );
        ctx.body.move_with_input(self.start_input, self.start_speed, false);

        self.rotate_character(ctx);

        AbilityFlow::Continue
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext) {
        let velocity = ctx.body.velocity();
        if ctx.body.is_grounded() && !self.hard_landing && velocity.y < -self.config.landed_speed_threshold {
            ctx.notify_landed(LandingImpact::Soft {
                impact_speed: -velocity.y,
            });
        }

        self.hard_landing = false;
        self.highest_position = 0.0;
        ctx.body.stop_root_motion();
    }
}
