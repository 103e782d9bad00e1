//! Climb State Machine
//!
//! Слой поверх locomotion: grab/drop на уступ, висение, shimmy/hop по графу
//! climb points, спрыгивание и mount.
//!
//! Каждый переход = matched action (ActionRunner). Пока `in_action`,
//! переходы не оцениваются: input этого тика просто отбрасывается.
//! После завершения action'а в том же тике применяется follow-up
//! (выставить hanging, вернуть control, settle после mount).

use bevy::prelude::*;

use super::hand::hand_target;
use super::moves::ClimbMove;
use crate::action::{ActionError, ActionRequest, ActionRunner, AnimationCommand, MatchTargetParams};
use crate::components::{CharacterMotion, LocomotionConfig, PlayerInput};
use crate::ledge::{ledge_climb_points, nearest_climb_point, ClimbPoint, ConnectionType, LedgeContact, ScanOrigin, Scanner};
use crate::physics::{facing_rotation, PhysicsWorld};

/// Пауза после mount перед возвратом control (секунды)
pub const MOUNT_SETTLE_DELAY: f32 = 0.5;

/// Что сделать, когда текущий climb action завершится
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ClimbFollowUp {
    /// Grab/drop на уступ → висим
    EnterHang,
    /// Shimmy/hop → продолжаем висеть на новой точке
    StayHanging,
    /// Спрыгнули → control обратно
    ExitHang,
    /// Залезли → collider, settle, control
    Mount,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum ClimbPhase {
    #[default]
    Idle,
    /// Climb action в полёте
    Transition(ClimbFollowUp),
    Hanging,
    /// После mount: collider уже включён, control ещё нет
    Settling { remaining: f32 },
}

#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ClimbController {
    current_point: Option<Entity>,
    phase: ClimbPhase,
}

impl ClimbController {
    pub fn current_point(&self) -> Option<Entity> {
        self.current_point
    }

    pub fn phase(&self) -> ClimbPhase {
        self.phase
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimbEventKind {
    GrabbedLedge { point: Entity },
    MovedToPoint { point: Entity },
    LeftLedge,
    Mounted,
}

/// Уведомления climb state machine (audio/UI glue)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimbEvent {
    pub entity: Entity,
    pub kind: ClimbEventKind,
}

/// Решение для висящего персонажа (без side effects)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangDecision {
    /// Спрыгнуть с уступа
    Drop,
    Mount,
    /// Перейти по ребру графа
    Traverse { target: Entity, climb_move: ClimbMove },
    Stay,
}

/// Переход из висения по input'у
///
/// `direction` — округлённые raw оси (см. `PlayerInput::climb_direction`).
pub fn decide_hang_transition(point: &ClimbPoint, direction: IVec2, jump_held: bool, drop_held: bool) -> HangDecision {
    if drop_held {
        return HangDecision::Drop;
    }

    if direction == IVec2::ZERO {
        return HangDecision::Stay;
    }

    if point.mount_point && direction.y == 1 {
        return HangDecision::Mount;
    }

    let Some(neighbour) = point.neighbour(direction) else {
        return HangDecision::Stay;
    };

    let climb_move = match neighbour.connection {
        ConnectionType::Jump if jump_held => ClimbMove::hop(neighbour.direction),
        ConnectionType::Jump => None,
        ConnectionType::Move => {
            let shimmy = ClimbMove::shimmy(neighbour.direction);
            if shimmy.is_none() {
                crate::log_warning(&format!(
                    "Climb graph: Move edge {:?} -> {:?} is not horizontal, shimmy ignored",
                    neighbour.direction, neighbour.point
                ));
            }
            shimmy
        }
    };

    match climb_move {
        Some(climb_move) => HangDecision::Traverse {
            target: neighbour.point,
            climb_move,
        },
        None => HangDecision::Stay,
    }
}

/// Поворот "лицом к стене" для climb point'а (forward точки смотрит наружу)
fn wall_facing(point: &GlobalTransform) -> Quat {
    facing_rotation(-point.forward().as_vec3()).unwrap_or_else(|| point.rotation())
}

/// Matched action на climb point (hand target + поворот к стене)
fn climb_request(climb_move: ClimbMove, point: &GlobalTransform) -> ActionRequest {
    let mut request = ActionRequest::new(climb_move.clip()).rotate_to(wall_facing(point));

    if let Some(window) = climb_move.match_window() {
        let hand = climb_move.hand();
        let target = hand_target(point, hand, climb_move.hand_offset());
        request = request.with_match(MatchTargetParams::new(target, hand, window.start, window.target));
    }

    request
}

fn report_start_error(entity: Entity, error: ActionError) {
    crate::log_error(&format!("Climb {:?}: {}", entity, error));
}

/// Система: follow-ups завершённых climb actions + таблица переходов
pub fn climb_transitions(
    mut characters: Query<(
        Entity,
        &mut ClimbController,
        &mut CharacterMotion,
        &mut ActionRunner,
        &Transform,
        &PlayerInput,
        &LocomotionConfig,
    )>,
    points: Query<(&ClimbPoint, &GlobalTransform)>,
    children: Query<&Children>,
    physics: Option<Res<PhysicsWorld>>,
    scanner: Option<Res<Scanner>>,
    mut animation: EventWriter<AnimationCommand>,
    mut climb_events: EventWriter<ClimbEvent>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut controller, mut motion, mut runner, transform, input, config) in characters.iter_mut() {
        // Action в полёте: переходов нет, input тика отбрасывается
        if motion.in_action() {
            continue;
        }

        match controller.phase {
            ClimbPhase::Transition(follow_up) => {
                apply_follow_up(entity, follow_up, &mut controller, &mut motion, transform, &mut climb_events);
                continue;
            }
            ClimbPhase::Settling { remaining } => {
                let remaining = remaining - delta;
                if remaining > 0.0 {
                    controller.phase = ClimbPhase::Settling { remaining };
                } else {
                    motion.reset_target_rotation(transform.rotation);
                    motion.set_hanging(false);
                    motion.set_control(true, transform.rotation);
                    controller.current_point = None;
                    controller.phase = ClimbPhase::Idle;
                    crate::log(&format!("Climb {:?}: mounted", entity));
                    climb_events.write(ClimbEvent {
                        entity,
                        kind: ClimbEventKind::Mounted,
                    });
                }
                continue;
            }
            ClimbPhase::Idle | ClimbPhase::Hanging => {}
        }

        if !motion.is_hanging() {
            let (Some(physics), Some(scanner)) = (physics.as_deref(), scanner.as_deref()) else {
                continue;
            };

            let origin = ScanOrigin::from_transform(transform);
            let grab = if input.jump.held {
                scanner
                    .scanner()
                    .probe_forward_ledge(physics.queries(), &origin, origin.forward)
                    .map(|contact| (contact, ClimbMove::IdleToHang))
            } else {
                None
            };
            let grab = grab.or_else(|| {
                input
                    .drop
                    .pressed
                    .then(|| scanner.scanner().probe_drop_ledge(physics.queries(), &origin))
                    .flatten()
                    .map(|contact| (contact, ClimbMove::DropToHang))
            });

            let Some((contact, climb_move)) = grab else {
                continue;
            };

            let Some((point_entity, point_transform)) = resolve_contact(&contact, &children, &points) else {
                crate::log_warning(&format!(
                    "Climb {:?}: ledge {:?} has no climb points",
                    entity, contact.ledge
                ));
                continue;
            };

            controller.current_point = Some(point_entity);
            motion.set_control(false, transform.rotation);

            match runner.start(
                entity,
                climb_request(climb_move, &point_transform),
                &mut motion,
                &mut animation,
                config,
            ) {
                Ok(()) => {
                    controller.phase = ClimbPhase::Transition(ClimbFollowUp::EnterHang);
                    crate::log(&format!(
                        "Climb {:?}: {} -> point {:?}",
                        entity,
                        climb_move.clip(),
                        point_entity
                    ));
                }
                Err(error) => report_start_error(entity, error),
            }
            continue;
        }

        // Висим
        let Some(point_entity) = controller.current_point else {
            crate::log_error(&format!("Climb {:?}: hanging without a climb point", entity));
            continue;
        };
        let Ok((point, _)) = points.get(point_entity) else {
            crate::log_error(&format!("Climb {:?}: climb point {:?} is gone", entity, point_entity));
            continue;
        };

        let decision = decide_hang_transition(point, input.climb_direction(), input.jump.held, input.drop.held);

        let (request, follow_up) = match decision {
            HangDecision::Stay => continue,
            HangDecision::Drop => (ActionRequest::new(ClimbMove::JumpFromHang.clip()), ClimbFollowUp::ExitHang),
            HangDecision::Mount => (ActionRequest::new(ClimbMove::MountFromHang.clip()), ClimbFollowUp::Mount),
            HangDecision::Traverse { target, climb_move } => {
                let Ok((_, target_transform)) = points.get(target) else {
                    crate::log_error(&format!("Climb {:?}: neighbour {:?} has no ClimbPoint", entity, target));
                    continue;
                };
                controller.current_point = Some(target);
                (climb_request(climb_move, target_transform), ClimbFollowUp::StayHanging)
            }
        };

        let clip = request.clip.clone();
        match runner.start(entity, request, &mut motion, &mut animation, config) {
            Ok(()) => {
                controller.phase = ClimbPhase::Transition(follow_up);
                crate::log(&format!("Climb {:?}: {}", entity, clip));
            }
            Err(error) => report_start_error(entity, error),
        }
    }
}

/// Ближайшая climb point уступа к точке контакта
fn resolve_contact(
    contact: &LedgeContact,
    children: &Query<&Children>,
    points: &Query<(&ClimbPoint, &GlobalTransform)>,
) -> Option<(Entity, GlobalTransform)> {
    let candidates = ledge_climb_points(contact.ledge, children, points);
    let nearest = nearest_climb_point(candidates, contact.point)?;
    points.get(nearest).ok().map(|(_, transform)| (nearest, *transform))
}

fn apply_follow_up(
    entity: Entity,
    follow_up: ClimbFollowUp,
    controller: &mut ClimbController,
    motion: &mut CharacterMotion,
    transform: &Transform,
    climb_events: &mut EventWriter<ClimbEvent>,
) {
    match follow_up {
        ClimbFollowUp::EnterHang | ClimbFollowUp::StayHanging => {
            motion.set_hanging(true);
            controller.phase = ClimbPhase::Hanging;

            if let Some(point) = controller.current_point {
                let kind = if follow_up == ClimbFollowUp::EnterHang {
                    ClimbEventKind::GrabbedLedge { point }
                } else {
                    ClimbEventKind::MovedToPoint { point }
                };
                climb_events.write(ClimbEvent { entity, kind });
            }
        }
        ClimbFollowUp::ExitHang => {
            motion.set_hanging(false);
            motion.reset_target_rotation(transform.rotation);
            motion.set_control(true, transform.rotation);
            controller.current_point = None;
            controller.phase = ClimbPhase::Idle;
            climb_events.write(ClimbEvent {
                entity,
                kind: ClimbEventKind::LeftLedge,
            });
        }
        ClimbFollowUp::Mount => {
            motion.enable_collider(true);
            controller.phase = ClimbPhase::Settling {
                remaining: MOUNT_SETTLE_DELAY,
            };
        }
    }
}
