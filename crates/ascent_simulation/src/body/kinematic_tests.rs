//! Tests for KinematicBody integration and BodyHandle.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use bevy::prelude::*;

    use crate::animation::{AnimationDriver, ClipAnimator, ClipLibrary, PoseCorrection};
    use crate::body::{integrate_body, probe_ground, BodyController, BodyHandle, KinematicBody};
    use crate::geometry::{SceneBox, StaticScene};

    const DT: f32 = 1.0 / 60.0;

    /// Пол + уступ высотой 1.2m с передней гранью на z = -1.0
    fn scene() -> StaticScene {
        StaticScene::new()
            .with_box(SceneBox::ground(20.0))
            .with_box(SceneBox::ledge(Vec3::new(0.0, 0.0, -2.0), Vec2::new(2.0, 1.0), 1.2))
    }

    fn grounded_body() -> KinematicBody {
        KinematicBody {
            grounded: true,
            ..default()
        }
    }

    #[test]
    fn test_falling_body_lands_and_keeps_impact_velocity_one_tick() {
        let scene = scene();
        let mut body = KinematicBody::default();
        let mut transform = Transform::from_xyz(0.0, 1.0, 5.0);

        let mut ticks = 0;
        while !body.grounded && ticks < 120 {
            integrate_body(&mut body, &mut transform, None, &scene, DT);
            ticks += 1;
        }

        assert!(body.grounded, "тело должно приземлиться");
        assert_abs_diff_eq!(transform.translation.y, 0.0, epsilon = 1e-4);
        // Impact velocity доступна abilities на следующем tick
        assert!(body.velocity.y < -3.0, "v.y = {}", body.velocity.y);

        integrate_body(&mut body, &mut transform, None, &scene, DT);
        assert_eq!(body.velocity.y, 0.0);
        assert_abs_diff_eq!(transform.translation.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_ground_probe_snaps_to_surface() {
        let scene = scene();
        let mut body = KinematicBody {
            velocity: Vec3::new(0.0, -6.0, 0.0),
            ..default()
        };
        let mut transform = Transform::from_xyz(0.0, 0.05, 5.0);

        probe_ground(&mut body, &mut transform, &scene);

        assert!(body.grounded);
        assert_abs_diff_eq!(transform.translation.y, 0.0, epsilon = 1e-4);
        // Velocity не трогаем: abilities читают impact speed
        assert_eq!(body.velocity.y, -6.0);
    }

    #[test]
    fn test_ground_probe_ignores_rising_and_distant_bodies() {
        let scene = scene();

        let mut rising = KinematicBody {
            velocity: Vec3::new(0.0, 5.0, 0.0),
            ..default()
        };
        let mut transform = Transform::from_xyz(0.0, 0.02, 5.0);
        probe_ground(&mut rising, &mut transform, &scene);
        assert!(!rising.grounded);
        assert_eq!(transform.translation.y, 0.02);

        let mut falling = KinematicBody::default();
        let mut transform = Transform::from_xyz(0.0, 0.5, 5.0);
        probe_ground(&mut falling, &mut transform, &scene);
        assert!(!falling.grounded);
    }

    #[test]
    fn test_ground_probe_without_collision_does_not_snap() {
        let scene = scene();
        let mut body = KinematicBody {
            collision_enabled: false,
            ..default()
        };
        let mut transform = Transform::from_xyz(0.0, 0.05, 5.0);

        probe_ground(&mut body, &mut transform, &scene);

        assert!(body.grounded);
        assert_eq!(transform.translation.y, 0.05);
    }

    #[test]
    fn test_gravity_disabled_body_hovers() {
        let scene = scene();
        let mut body = KinematicBody {
            gravity_enabled: false,
            ..default()
        };
        let mut transform = Transform::from_xyz(0.0, 2.0, 5.0);

        for _ in 0..30 {
            integrate_body(&mut body, &mut transform, None, &scene, DT);
        }

        assert_eq!(transform.translation.y, 2.0);
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_horizontal_motion_stops_at_wall() {
        let scene = scene();
        let mut body = grounded_body();
        body.velocity = Vec3::new(0.0, 0.0, -10.0);
        let mut transform = Transform::from_xyz(0.0, 0.0, 0.0);

        integrate_body(&mut body, &mut transform, None, &scene, 0.2);

        // Capsule radius 0.3, стена на z = -1.0, skin 0.01
        assert_abs_diff_eq!(transform.translation.z, -0.69, epsilon = 1e-3);
        assert_abs_diff_eq!(body.velocity.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_horizontal_motion_slides_along_wall() {
        let scene = scene();
        let mut body = grounded_body();
        body.velocity = Vec3::new(5.0, 0.0, -5.0);
        let mut transform = Transform::from_xyz(0.0, 0.0, -0.5);

        integrate_body(&mut body, &mut transform, None, &scene, 0.2);

        assert!(transform.translation.z > -0.71);
        assert!(transform.translation.x > 0.5, "x = {}", transform.translation.x);
    }

    #[test]
    fn test_collision_disabled_passes_through() {
        let scene = scene();
        let mut body = grounded_body();
        body.collision_enabled = false;
        body.velocity = Vec3::new(0.0, 0.0, -10.0);
        let mut transform = Transform::from_xyz(0.0, 0.0, 0.0);

        integrate_body(&mut body, &mut transform, None, &scene, 0.2);

        assert_abs_diff_eq!(transform.translation.z, -2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_root_motion_replaces_horizontal_velocity() {
        let scene = scene();
        let mut body = grounded_body();
        body.velocity = Vec3::new(3.0, 0.0, 0.0);
        let mut transform = Transform::from_xyz(0.0, 0.0, 10.0);
        let mut animator = ClipAnimator::new(ClipLibrary::standard(), "Climb Up");

        {
            let mut handle = BodyHandle::new(&mut body, &mut transform, 0.0, DT);
            handle.apply_root_motion(Vec3::ONE, false);
        }

        integrate_body(&mut body, &mut transform, Some(&mut animator), &scene, 1.0 / 8.0);

        // Climb Up: 0.8 m/s forward, персонаж смотрит в -Z
        assert_abs_diff_eq!(body.velocity.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(body.velocity.z, -0.8, epsilon = 1e-4);
        assert_abs_diff_eq!(transform.translation.z, 9.9, epsilon = 1e-4);
    }

    #[test]
    fn test_pose_correction_applied_by_integration() {
        let scene = scene();
        let mut body = KinematicBody {
            collision_enabled: false,
            gravity_enabled: false,
            ..default()
        };
        let mut transform = Transform::from_xyz(0.0, 0.3, -0.4);
        let mut animator = ClipAnimator::new(ClipLibrary::standard(), "Climb Up");
        let target = Vec3::new(0.0, 1.2, -1.15);

        animator.request_pose_correction(PoseCorrection {
            target_position: target,
            target_rotation: Quat::IDENTITY,
            position_weight: Vec3::ONE,
            rotation_weight: 0.0,
            start_time: 0.15,
            end_time: 0.42,
        });

        for _ in 0..40 {
            animator.advance(DT);
            integrate_body(&mut body, &mut transform, Some(&mut animator), &scene, DT);
        }

        assert_abs_diff_eq!(transform.translation.y, 1.2, epsilon = 1e-4);
        assert_abs_diff_eq!(transform.translation.z, -1.15, epsilon = 1e-4);
    }

    #[test]
    fn test_move_with_input_is_camera_relative() {
        let mut body = grounded_body();
        let mut transform = Transform::default();
        let mut handle = BodyHandle::new(&mut body, &mut transform, 90.0, DT);

        // Вперёд относительно камеры, которая смотрит в +X
        handle.move_with_input(Vec2::new(0.0, 1.0), 4.0, false);

        let velocity = handle.velocity();
        assert_abs_diff_eq!(velocity.x, 4.0, epsilon = 1e-4);
        assert_abs_diff_eq!(velocity.z, 0.0, epsilon = 1e-4);
        // Без rotate персонаж не поворачивается
        assert_abs_diff_eq!(handle.yaw_degrees(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_move_with_input_rotates_toward_direction() {
        let mut body = grounded_body();
        let mut transform = Transform::default();
        let mut handle = BodyHandle::new(&mut body, &mut transform, 0.0, DT);

        for _ in 0..120 {
            handle.move_with_input(Vec2::new(1.0, 0.0), 2.0, true);
        }

        assert_abs_diff_eq!(handle.yaw_degrees(), 90.0, epsilon = 0.5);
        assert_abs_diff_eq!(handle.forward().x, 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_zero_input_stops_horizontal_motion() {
        let mut body = grounded_body();
        body.velocity = Vec3::new(2.0, -1.0, 2.0);
        let mut transform = Transform::default();
        let mut handle = BodyHandle::new(&mut body, &mut transform, 0.0, DT);

        handle.move_with_input(Vec2::ZERO, 6.0, true);

        assert_eq!(handle.velocity(), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_handle_toggles_flags() {
        let mut body = KinematicBody::default();
        let mut transform = Transform::default();
        let mut handle = BodyHandle::new(&mut body, &mut transform, 0.0, DT);

        handle.disable_collision();
        handle.disable_gravity();
        handle.apply_root_motion(Vec3::ONE, true);
        assert!(!handle.collision_enabled());
        assert!(!handle.gravity_enabled());

        handle.enable_collision();
        handle.enable_gravity();
        handle.stop_root_motion();
        assert!(handle.collision_enabled());
        assert!(handle.gravity_enabled());
        assert!(body.root_motion.is_none());
    }
}
