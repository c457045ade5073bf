//! Tests for Locomotion default state.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::ability::testing::Harness;
    use crate::ability::{Ability, AbilityFlow, Locomotion};
    use crate::animation::AnimationDriver;
    use crate::config::LocomotionConfig;
    use crate::geometry::StaticScene;

    fn locomotion() -> Locomotion {
        Locomotion::new(LocomotionConfig::default())
    }

    #[test]
    fn test_ready_only_when_grounded() {
        let mut harness = Harness::new(StaticScene::new());
        let mut locomotion = locomotion();

        assert!(harness.run(|ctx| locomotion.ready_to_start(ctx)));
        harness.body.grounded = false;
        assert!(!harness.run(|ctx| locomotion.ready_to_start(ctx)));
    }

    #[test]
    fn test_start_blends_into_locomotion() {
        let mut harness = Harness::new(StaticScene::new());
        harness.animator.enter("Air.Falling", 0.7);
        harness.body.root_motion = Some((Vec3::ONE, false));
        let mut locomotion = locomotion();

        harness.run(|ctx| locomotion.on_start(ctx));

        assert_eq!(harness.animator.cross_fades, vec![("Locomotion".to_string(), 0.25)]);
        assert_eq!(harness.body.root_motion, None);

        // Уже в Locomotion - без повторного cross-fade
        harness.animator.enter("Locomotion", 0.2);
        harness.run(|ctx| locomotion.on_start(ctx));
        assert_eq!(harness.animator.cross_fades.len(), 1);
    }

    #[test]
    fn test_start_overrides_pending_fall_fade() {
        // Приземлились раньше, чем закончился cross-fade в падение
        let mut harness = Harness::new(StaticScene::new());
        harness.animator.cross_fade("Air.Falling", 0.25);
        assert!(harness.animator.current_state().is_name("Locomotion"));
        let mut locomotion = locomotion();

        harness.run(|ctx| locomotion.on_start(ctx));

        assert_eq!(harness.animator.cross_fades.last(), Some(&("Locomotion".to_string(), 0.25)));
        assert_eq!(harness.animator.current_state().destination(), "Locomotion");

        // Cross-fade в Locomotion уже идёт - повторно не запрашиваем
        harness.run(|ctx| locomotion.on_start(ctx));
        assert_eq!(harness.animator.cross_fades.len(), 2);
    }

    #[test]
    fn test_walk_and_sprint_speed() {
        let mut harness = Harness::new(StaticScene::new());
        harness.input.move_axis = Vec2::new(0.0, 1.0);
        let mut locomotion = locomotion();

        assert_eq!(harness.run(|ctx| locomotion.update(ctx)), AbilityFlow::Continue);
        assert_eq!(harness.body.last_move, Some((Vec2::new(0.0, 1.0), 2.0, true)));

        harness.input.sprint = true;
        assert_eq!(harness.run(|ctx| locomotion.update(ctx)), AbilityFlow::Continue);
        assert_eq!(harness.body.last_move, Some((Vec2::new(0.0, 1.0), 5.5, true)));
    }

    #[test]
    fn test_never_stops_by_itself() {
        let mut harness = Harness::new(StaticScene::new());
        harness.body.grounded = false;
        let mut locomotion = locomotion();

        for _ in 0..10 {
            assert_eq!(harness.run(|ctx| locomotion.update(ctx)), AbilityFlow::Continue);
        }
    }

    #[test]
    fn test_stop_keeps_horizontal_velocity() {
        let mut harness = Harness::new(StaticScene::new());
        harness.body.velocity = Vec3::new(1.5, 0.0, -2.0);
        let mut locomotion = locomotion();

        harness.run(|ctx| locomotion.on_stop(ctx));
        assert_eq!(harness.body.velocity, Vec3::new(1.5, 0.0, -2.0));
    }
}
