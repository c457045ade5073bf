//! Locomotion - default state (наземное движение)
//!
//! Стартует безусловно, когда ни один candidate не готов.
//! Вытесняется любым готовым candidate'ом (проверка каждый tick в coordinator).

use super::{set_animation_state, Ability, AbilityContext, AbilityFlow, AbilityKind};
use crate::config::LocomotionConfig;

#[derive(Debug, Clone)]
pub struct Locomotion {
    config: LocomotionConfig,
}

impl Locomotion {
    pub fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn speed(&self, sprint: bool) -> f32 {
        if sprint {
            self.config.sprint_speed
        } else {
            self.config.walk_speed
        }
    }
}

impl Ability for Locomotion {
    fn kind(&self) -> AbilityKind {
        AbilityKind::Locomotion
    }

    fn ready_to_start(&mut self, ctx: &mut AbilityContext) -> bool {
        ctx.body.is_grounded()
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        set_animation_state(ctx.animator, &self.config.locomotion_state, self.config.blend_time);
        ctx.body.stop_root_motion();
    }

    fn update(&mut self, ctx: &mut AbilityContext) -> AbilityFlow {
        let speed = self.speed(ctx.input.sprint);
        ctx.body.move_with_input(ctx.input.move_axis, speed, true);

        AbilityFlow::Continue
    }

    // Горизонтальная скорость сохраняется: сход с края уносит её в полёт
    fn on_stop(&mut self, _ctx: &mut AbilityContext) {}
}
