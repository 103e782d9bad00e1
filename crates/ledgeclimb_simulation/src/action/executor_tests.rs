//! Tests for matched-action executor stepping.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use bevy::ecs::system::SystemState;

    use super::super::animator::{AnimationCommand, AnimatorState, ClipState};
    use super::super::executor::{ActionError, ActionPhase, ActionRunner, RunningAction};
    use crate::components::{CharacterMotion, LocomotionConfig};
    use super::super::params::{ActionRequest, BodyPart, MatchTargetParams};

    const DT: f32 = 1.0 / 60.0;
    const HANDOFF: f32 = 0.5;

    fn runner_with(request: ActionRequest) -> ActionRunner {
        let mut runner = ActionRunner::default();
        runner.running = Some(RunningAction {
            request,
            phase: ActionPhase::Starting,
        });
        runner
    }

    fn animator_playing(clip: &str, length: f32) -> AnimatorState {
        AnimatorState {
            current: Some(ClipState {
                clip: clip.to_string(),
                length,
                time: 0.0,
                looping: false,
            }),
            ..default()
        }
    }

    /// Шагать пока action не закончится, вернуть число тиков
    fn run_to_end(runner: &mut ActionRunner, animator: &AnimatorState) -> usize {
        let mut rotation = Quat::IDENTITY;
        for tick in 1..=1000 {
            if runner.step(DT, animator, &mut rotation, 10.0, HANDOFF).finished {
                return tick;
            }
        }
        panic!("action never finished");
    }

    #[test]
    fn test_action_lasts_full_clip_length() {
        let mut runner = runner_with(ActionRequest::new("ShimmyRight"));
        let animator = animator_playing("ShimmyRight", 0.5);

        let ticks = run_to_end(&mut runner, &animator);

        // Таймер должен перешагнуть длину клипа: 0.5s = 30 тиков + выход
        assert!(ticks as f32 * DT > 0.5);
        assert!(ticks <= 32, "finished after {} ticks", ticks);
    }

    #[test]
    fn test_post_delay_extends_action() {
        let animator = animator_playing("JumpFromHang", 0.5);

        let mut plain = runner_with(ActionRequest::new("JumpFromHang"));
        let plain_ticks = run_to_end(&mut plain, &animator);

        let mut delayed = runner_with(ActionRequest::new("JumpFromHang").with_post_delay(0.25));
        let delayed_ticks = run_to_end(&mut delayed, &animator);

        let extra = (delayed_ticks - plain_ticks) as f32 * DT;
        assert!(extra >= 0.25 - 1e-4, "extra delay {}", extra);
        assert!(extra < 0.25 + 2.0 * DT);
    }

    #[test]
    fn test_transition_breaks_loop_only_after_handoff_time() {
        let mut runner = runner_with(ActionRequest::new("HangHopUp"));
        let mut animator = animator_playing("HangHopUp", 2.0);
        animator.next = Some(ClipState {
            clip: "Locomotion".to_string(),
            length: 1.0,
            time: 0.0,
            looping: true,
        });

        let ticks = run_to_end(&mut runner, &animator);
        let elapsed = ticks as f32 * DT;
        assert!(elapsed >= HANDOFF);
        assert!(elapsed < HANDOFF + 3.0 * DT);
    }

    #[test]
    fn test_match_requested_until_animator_reports_matching() {
        let target = Vec3::new(0.0, 2.0, -2.0);
        let params = MatchTargetParams::new(target, BodyPart::RightHand, 0.4, 0.55);
        let mut runner = runner_with(ActionRequest::new("IdleToHang").with_match(params));
        let mut animator = animator_playing("IdleToHang", 1.0);
        let mut rotation = Quat::IDENTITY;

        let tick = runner.step(DT, &animator, &mut rotation, 10.0, HANDOFF);
        assert_eq!(tick.match_request, Some(params));

        animator.is_matching_target = true;
        let tick = runner.step(DT, &animator, &mut rotation, 10.0, HANDOFF);
        assert_eq!(tick.match_request, None);
    }

    #[test]
    fn test_rotation_waits_for_match_start_time() {
        let params = MatchTargetParams::new(Vec3::ZERO, BodyPart::RightHand, 0.5, 0.6);
        let goal = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let mut runner = runner_with(ActionRequest::new("IdleToHang").with_match(params).rotate_to(goal));
        let animator = animator_playing("IdleToHang", 1.0);
        let mut rotation = Quat::IDENTITY;

        // Первые ~0.5s поворота нет
        for _ in 0..29 {
            runner.step(DT, &animator, &mut rotation, 10.0, HANDOFF);
        }
        assert_eq!(rotation, Quat::IDENTITY);

        for _ in 0..30 {
            runner.step(DT, &animator, &mut rotation, 10.0, HANDOFF);
        }
        assert!(rotation.angle_between(goal) < 1e-3);
    }

    #[test]
    fn test_clip_mismatch_is_logged_not_fatal() {
        let mut runner = runner_with(ActionRequest::new("MountFromHang"));
        let animator = animator_playing("Locomotion", 0.3);

        let ticks = run_to_end(&mut runner, &animator);
        assert!(ticks > 1);
    }

    #[test]
    fn test_idle_runner_never_finishes() {
        let mut runner = ActionRunner::default();
        let mut rotation = Quat::IDENTITY;
        let tick = runner.step(DT, &AnimatorState::default(), &mut rotation, 10.0, HANDOFF);
        assert!(!tick.finished);
        assert!(!runner.is_running());
    }

    /// Мир только с очередью AnimationCommand (для `start`)
    fn command_world() -> World {
        let mut world = World::new();
        world.init_resource::<Events<AnimationCommand>>();
        world
    }

    #[test]
    fn test_second_start_is_rejected_while_running() {
        let mut world = command_world();
        let entity = world.spawn_empty().id();
        let config = LocomotionConfig::default();
        let mut motion = CharacterMotion::default();
        let mut runner = ActionRunner::default();

        let mut state: SystemState<EventWriter<AnimationCommand>> = SystemState::new(&mut world);
        {
            let mut animation = state.get_mut(&mut world);
            runner
                .start(entity, ActionRequest::new("IdleToHang"), &mut motion, &mut animation, &config)
                .expect("idle runner accepts an action");

            let second = runner.start(entity, ActionRequest::new("JumpFromHang"), &mut motion, &mut animation, &config);
            assert_eq!(
                second,
                Err(ActionError::Busy {
                    running: "IdleToHang".to_string(),
                    requested: "JumpFromHang".to_string(),
                })
            );
        }
        state.apply(&mut world);

        // Первый action не тронут, crossfade ушёл только один
        assert!(motion.in_action());
        assert_eq!(runner.current_clip(), Some("IdleToHang"));
        assert_eq!(world.resource::<Events<AnimationCommand>>().len(), 1);
    }

    #[test]
    fn test_start_rejected_while_motion_is_in_action() {
        let mut world = command_world();
        let entity = world.spawn_empty().id();
        let config = LocomotionConfig::default();
        let mut motion = CharacterMotion::default();
        motion.set_in_action(true);
        let mut runner = ActionRunner::default();

        let mut state: SystemState<EventWriter<AnimationCommand>> = SystemState::new(&mut world);
        {
            let mut animation = state.get_mut(&mut world);
            let result = runner.start(entity, ActionRequest::new("MountFromHang"), &mut motion, &mut animation, &config);
            assert!(matches!(result, Err(ActionError::Busy { .. })));
        }
        state.apply(&mut world);

        assert!(motion.in_action());
        assert!(!runner.is_running());
        assert!(world.resource::<Events<AnimationCommand>>().is_empty());
    }

    #[test]
    fn test_match_rotation_prefers_action_goal() {
        let current = Quat::from_rotation_y(std::f32::consts::PI);
        let goal = Quat::from_rotation_y(0.3);

        let turning = runner_with(ActionRequest::new("DropToHang").rotate_to(goal));
        assert_eq!(turning.match_rotation(current), goal);

        let still = runner_with(ActionRequest::new("ShimmyRight"));
        assert_eq!(still.match_rotation(current), current);
        assert_eq!(ActionRunner::default().match_rotation(current), current);
    }
}
