//! Matched-action executor
//!
//! Один resumable action на персонажа (компонент `ActionRunner`).
//! Фазы: Starting (ждём тик, чтобы crossfade стал активным) → Playing
//! (таймер по длине клипа, поворот, target matching) → PostDelay → конец.
//!
//! `in_action` = true с момента `start()` и до конца PostDelay.
//! Пока он выставлен, новый action не стартует (`ActionError::Busy`).

use std::fmt;

use bevy::prelude::*;

use super::animator::{AnimationCommand, AnimatorState};
use super::params::{ActionRequest, MatchTargetParams};
use crate::components::{CharacterMotion, LocomotionConfig};
use crate::physics::rotate_towards;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Уже идёт другой matched action
    Busy { running: String, requested: String },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Busy { running, requested } => {
                write!(f, "cannot start '{}': action '{}' is still running", requested, running)
            }
        }
    }
}

impl std::error::Error for ActionError {}

/// Action завершился (после post delay), `in_action` уже снят
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ActionCompleted {
    pub entity: Entity,
    pub clip: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionPhase {
    /// CrossFade отправлен, клип станет активным к следующему тику
    Starting,
    Playing { timer: f32, clip_length: f32 },
    PostDelay { remaining: f32 },
}

#[derive(Debug, Clone)]
pub struct RunningAction {
    pub request: ActionRequest,
    pub phase: ActionPhase,
}

/// Результат одного шага executor'а
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionTick {
    /// Запросить target matching у animator'а в этом тике
    pub match_request: Option<MatchTargetParams>,
    pub finished: bool,
}

#[derive(Component, Debug, Clone, Default)]
pub struct ActionRunner {
    pub(crate) running: Option<RunningAction>,
}

impl ActionRunner {
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn running(&self) -> Option<&RunningAction> {
        self.running.as_ref()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.running.as_ref().map(|action| action.request.clip.as_str())
    }

    /// Начать matched action: in_action = true + crossfade в клип
    pub fn start(
        &mut self,
        entity: Entity,
        request: ActionRequest,
        motion: &mut CharacterMotion,
        animation: &mut EventWriter<AnimationCommand>,
        config: &LocomotionConfig,
    ) -> Result<(), ActionError> {
        if let Some(running) = self.running.as_ref() {
            return Err(ActionError::Busy {
                running: running.request.clip.clone(),
                requested: request.clip,
            });
        }
        if motion.in_action() {
            return Err(ActionError::Busy {
                running: "<external>".to_string(),
                requested: request.clip,
            });
        }

        motion.set_in_action(true);
        animation.write(AnimationCommand::CrossFade {
            entity,
            clip: request.clip.clone(),
            blend_time: config.action_blend_time,
            mirror: request.mirror,
        });

        self.running = Some(RunningAction {
            request,
            phase: ActionPhase::Starting,
        });
        Ok(())
    }

    /// Один тик action'а (resume с того места, где остановились)
    pub fn step(
        &mut self,
        delta: f32,
        animator: &AnimatorState,
        rotation: &mut Quat,
        rotation_speed_rad: f32,
        handoff_time: f32,
    ) -> ActionTick {
        let mut tick = ActionTick::default();
        let Some(action) = self.running.as_mut() else {
            return tick;
        };

        if action.phase == ActionPhase::Starting {
            let clip_length = match animator.next_or_current() {
                Some(state) => {
                    if state.clip != action.request.clip {
                        crate::log_error(&format!(
                            "Matched action: expected clip '{}', animator is playing '{}'",
                            action.request.clip, state.clip
                        ));
                    }
                    state.length
                }
                None => {
                    crate::log_error(&format!(
                        "Matched action: animator has no active clip for '{}'",
                        action.request.clip
                    ));
                    0.0
                }
            };
            action.phase = ActionPhase::Playing {
                timer: 0.0,
                clip_length,
            };
        }

        if let ActionPhase::Playing { timer, clip_length } = &mut action.phase {
            let mut done = *timer > *clip_length;

            if !done {
                *timer += delta;
                let normalized = if *clip_length > 0.0 { *timer / *clip_length } else { 1.0 };

                let request = &action.request;
                if request.rotate && normalized > request.rotate_start_time() {
                    *rotation = rotate_towards(*rotation, request.target_rotation, rotation_speed_rad * delta);
                }

                if let Some(params) = request.match_params {
                    if !animator.is_matching_target {
                        tick.match_request = Some(params);
                    }
                }

                // Animator уже уходит из клипа — считаем action отыгранным
                if animator.is_in_transition() && *timer > handoff_time {
                    done = true;
                }
            }

            if done {
                action.phase = ActionPhase::PostDelay {
                    remaining: action.request.post_delay,
                };
                // PostDelay начинается со следующего тика
                if action.request.post_delay <= 0.0 {
                    tick.finished = true;
                }
                return tick;
            }
        }

        if let ActionPhase::PostDelay { remaining } = &mut action.phase {
            *remaining -= delta;
            if *remaining <= 0.0 {
                tick.finished = true;
            }
        }

        tick
    }

    /// Поворот для target matching: куда action довернёт персонажа,
    /// без поворота — текущий
    pub fn match_rotation(&self, current: Quat) -> Quat {
        match self.running.as_ref() {
            Some(action) if action.request.rotate => action.request.target_rotation,
            _ => current,
        }
    }

    /// Снять завершённый action
    fn finish(&mut self) -> Option<ActionRequest> {
        self.running.take().map(|action| action.request)
    }
}

/// Система: продвинуть все matched actions (CharacterSet::Actions)
pub fn tick_matched_actions(
    mut characters: Query<(
        Entity,
        &mut ActionRunner,
        &mut CharacterMotion,
        &mut Transform,
        &AnimatorState,
        &LocomotionConfig,
    )>,
    mut animation: EventWriter<AnimationCommand>,
    mut completed: EventWriter<ActionCompleted>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut runner, mut motion, mut transform, animator, config) in characters.iter_mut() {
        if !runner.is_running() {
            continue;
        }

        let mut rotation = transform.rotation;
        let tick = runner.step(
            delta,
            animator,
            &mut rotation,
            config.rotation_speed_rad(),
            config.action_handoff_time,
        );
        if rotation != transform.rotation {
            transform.rotation = rotation;
        }

        if let Some(params) = tick.match_request {
            animation.write(AnimationCommand::MatchTarget {
                entity,
                target: params.position,
                rotation: runner.match_rotation(transform.rotation),
                body_part: params.body_part,
                position_weight: params.position_weight,
                start_time: params.start_time,
                target_time: params.target_time,
            });
        }

        if tick.finished {
            if let Some(request) = runner.finish() {
                motion.set_in_action(false);
                crate::log(&format!("Action '{}' completed for {:?}", request.clip, entity));
                completed.write(ActionCompleted {
                    entity,
                    clip: request.clip,
                });
            }
        }
    }
}
