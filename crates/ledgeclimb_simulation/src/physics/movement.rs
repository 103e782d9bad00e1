//! Locomotion controller для персонажа
//!
//! Архитектура:
//! - Host физика через `PhysicsQueries` (sphere overlap, ray cast, character sweep)
//! - Custom velocity integration (gravity, air control, ledge deflection)
//! - Rapier `ColliderDisabled` синхронизируется с `CharacterMotion::collider_enabled`
//!
//! Transform пишется только при `MotionAuthority::Locomotion`.
//! Детерминизм: FixedUpdate 60Hz, никакого RNG.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::layers;
use super::queries::{PhysicsQueries, PhysicsWorld};
use crate::action::{ActionRunner, AnimationCommand, AnimatorState, LOCOMOTION_CLIP};
use crate::climb::ClimbController;
use crate::components::{clear_input_edges, CharacterMotion, LocomotionConfig, MotionAuthority, PlayerInput};
use crate::ledge::{LedgeData, ScanOrigin, Scanner};
use crate::CharacterSet;

/// Прижимающая вертикальная скорость на земле
const GROUNDED_Y_SPEED: f32 = -0.5;
/// Сошли с края с input'ом — сразу падаем
const WALK_OFF_Y_SPEED: f32 = -2.0;
/// Приземление: небольшой прижим, чтобы не подпрыгивать
const LANDING_Y_SPEED: f32 = -1.0;
const WALK_OFF_INPUT_THRESHOLD: f32 = 0.05;
/// Поворот только при заметном input'е
const ROTATION_INPUT_THRESHOLD: f32 = 0.2;

const LEDGE_PROBE_AHEAD: f32 = 0.5;
const LEDGE_PROBE_DEPTH: f32 = 2.0;
const WALK_OFF_PROBE_AHEAD: f32 = 1.0;
const WALK_OFF_DOT: f32 = 0.7;
/// Градусы
const REVERSAL_ANGLE: f32 = 80.0;
const FACE_ON_ANGLE: f32 = 60.0;
const ALONG_WALL_ANGLE: f32 = 90.0;

// ============================================================================
// Math helpers
// ============================================================================

/// Поворот `from` к `to` не больше чем на `max_angle` (радианы)
pub fn rotate_towards(from: Quat, to: Quat, max_angle: f32) -> Quat {
    let angle = from.angle_between(to);
    if angle <= max_angle || angle <= f32::EPSILON {
        return to;
    }
    if max_angle <= 0.0 {
        return from;
    }
    from.slerp(to, max_angle / angle)
}

/// Угол от `from` к `to` вокруг world up (градусы, со знаком)
pub fn signed_angle_y(from: Vec3, to: Vec3) -> f32 {
    let angle = from.angle_between(to).to_degrees();
    if Vec3::Y.dot(from.cross(to)) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Поворот "смотреть вдоль direction" (горизонтальная проекция)
pub fn facing_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    (flat.length_squared() > f32::EPSILON).then(|| Transform::IDENTITY.looking_to(flat, Vec3::Y).rotation)
}

// ============================================================================
// Ground check
// ============================================================================

/// Ground check с гистерезисом
///
/// Пока вертикальная скорость > 0 (подъём) — всегда airborne, overlap не смотрим.
/// Фронт земля → воздух с input'ом даёт walk-off скорость, воздух → земля — прижим.
pub fn ground_check(motion: &mut CharacterMotion, overlap: bool) {
    let was_grounded = motion.grounded;
    motion.grounded = motion.y_speed <= 0.0 && overlap;

    if was_grounded && !motion.grounded && motion.desired_move_dir.length() > WALK_OFF_INPUT_THRESHOLD {
        motion.y_speed = WALK_OFF_Y_SPEED;
    }

    if !was_grounded && motion.grounded {
        motion.y_speed = LANDING_Y_SPEED;
    }
}

// ============================================================================
// Ledge-walk deflection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgeDeflection {
    /// Идём вперёд с края и впереди нет земли — падаем
    WalkOff,
    /// Разворот (>= 80° от facing): стоим, пока поворот догоняет
    Reversal,
    /// Лицом в край: стоп (velocity и move_dir)
    Blocked,
    /// Вдоль края: скорость по касательной, та же величина
    Slide { velocity: Vec3, move_dir: Vec3 },
    /// От края: без изменений
    Free,
}

/// Классифицировать движение у края платформы
///
/// `surface_normal` — нормаль боковой грани (наружу), `ground_ahead` —
/// есть ли земля в `WALK_OFF_PROBE_AHEAD` перед персонажем.
pub fn ledge_deflection(
    desired: Vec3,
    facing: Vec3,
    velocity: Vec3,
    surface_normal: Vec3,
    ground_ahead: bool,
) -> LedgeDeflection {
    let signed_angle = signed_angle_y(surface_normal, desired);
    let angle = signed_angle.abs();

    if desired.dot(facing) > WALK_OFF_DOT && !ground_ahead {
        return LedgeDeflection::WalkOff;
    }

    if desired.angle_between(facing).to_degrees() >= REVERSAL_ANGLE {
        return LedgeDeflection::Reversal;
    }

    if angle < FACE_ON_ANGLE {
        LedgeDeflection::Blocked
    } else if angle < ALONG_WALL_ANGLE {
        let sign = if signed_angle < 0.0 { -1.0 } else { 1.0 };
        let direction = Vec3::Y.cross(surface_normal) * sign;
        LedgeDeflection::Slide {
            velocity: direction * velocity.length(),
            move_dir: direction,
        }
    } else {
        LedgeDeflection::Free
    }
}

fn apply_deflection(motion: &mut CharacterMotion, deflection: LedgeDeflection) {
    match deflection {
        LedgeDeflection::WalkOff | LedgeDeflection::Free => {}
        LedgeDeflection::Reversal => {
            motion.velocity = Vec3::ZERO;
        }
        LedgeDeflection::Blocked => {
            motion.velocity = Vec3::ZERO;
            motion.move_dir = Vec3::ZERO;
        }
        LedgeDeflection::Slide { velocity, move_dir } => {
            motion.velocity = velocity;
            motion.move_dir = move_dir;
        }
    }
}

// ============================================================================
// Jump
// ============================================================================

/// Прыжок: только с земли, вне action, после cooldown
///
/// true — прыжок начат (grounded уже false, позиция приподнята).
pub fn try_jump(motion: &mut CharacterMotion, jump_pressed: bool, config: &LocomotionConfig, translation: &mut Vec3) -> bool {
    if !(motion.grounded && jump_pressed && motion.can_jump() && !motion.in_action) {
        return false;
    }

    motion.y_speed = config.jump_power;
    motion.grounded = false;
    translation.y += config.jump_lift;
    motion.jump_cooldown = config.jump_cooldown;
    true
}

// ============================================================================
// Systems
// ============================================================================

/// Input → желаемое направление (camera-relative) и move_amount
fn read_move_input(input: &PlayerInput) -> (Vec3, f32) {
    let (h, v) = (input.axis.x, input.axis.y);

    let move_amount = if input.run { 1.0 } else { (h.abs() + v.abs()).clamp(0.0, 1.0) };
    // Forward персонажа = -Z
    let local = if input.run {
        Vec3::NEG_Z
    } else {
        Vec3::new(h, 0.0, -v).normalize_or_zero()
    };

    (input.camera_rotation * local, move_amount)
}

/// Система: per-tick locomotion (CharacterSet::Locomotion)
///
/// Пропускает персонажей без Locomotion authority (висят, action, control снят).
pub fn locomotion_tick(
    mut characters: Query<(
        Entity,
        &mut Transform,
        &mut CharacterMotion,
        &mut AnimatorState,
        &PlayerInput,
        &LocomotionConfig,
    )>,
    physics: Option<Res<PhysicsWorld>>,
    scanner: Option<Res<Scanner>>,
    mut animation: EventWriter<AnimationCommand>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut motion, mut animator, input, config) in characters.iter_mut() {
        if motion.jump_cooldown > 0.0 {
            motion.jump_cooldown = (motion.jump_cooldown - delta).max(0.0);
        }

        let (desired, move_amount) = read_move_input(input);
        motion.desired_move_dir = desired;
        motion.move_dir = desired;

        if motion.authority() != MotionAuthority::Locomotion {
            if !motion.has_control() {
                animator.move_amount = 0.0;
            }
            continue;
        }
        let Some(physics) = physics.as_deref() else {
            continue;
        };
        let physics = physics.queries();

        motion.move_amount = move_amount;
        motion.velocity = Vec3::ZERO;
        let ground_mask = Group::from_bits_truncate(config.ground_layers);

        let overlap = motion.y_speed <= 0.0
            && physics.check_sphere(
                transform.transform_point(config.ground_check_offset),
                config.ground_check_radius,
                ground_mask,
            );
        ground_check(&mut motion, overlap);
        animator.is_grounded = motion.grounded;

        if try_jump(&mut motion, input.jump.pressed, config, &mut transform.translation) {
            animation.write(AnimationCommand::Trigger {
                entity,
                name: "jump".to_string(),
            });
        }

        let speed = config.speed(input.run);
        if motion.grounded {
            motion.y_speed = GROUNDED_Y_SPEED;
            motion.velocity = desired * speed;

            let probe_origin = transform.translation + desired * LEDGE_PROBE_AHEAD;
            if move_amount > 0.0 && physics.raycast_any(probe_origin, Vec3::NEG_Y, LEDGE_PROBE_DEPTH, ground_mask) {
                let ledge = scanner.as_deref().and_then(|scanner| {
                    scanner
                        .scanner()
                        .probe_obstacle_ledge(physics, &ScanOrigin::from_transform(&transform), desired)
                });
                motion.is_on_ledge = ledge.is_some();

                if let Some(ledge) = ledge {
                    motion.ledge = Some(ledge);
                    deflect_at_ledge(&mut motion, &ledge, &transform, physics, ground_mask);
                }
            } else {
                motion.is_on_ledge = false;
            }
        } else {
            motion.y_speed += config.gravity * delta;
            motion.velocity = desired * speed * config.air_factor;
        }

        let planar_speed = motion.velocity.length();
        animator.set_move_amount_damped(planar_speed / config.movement_speed, config.move_amount_damp, delta);

        motion.velocity.y = motion.y_speed;
        let displacement = motion.velocity * delta;
        transform.translation = if motion.collider_enabled {
            physics.move_character(transform.translation, displacement)
        } else {
            transform.translation + displacement
        };

        if move_amount > 0.0 && motion.move_dir.length() > ROTATION_INPUT_THRESHOLD {
            if let Some(rotation) = facing_rotation(motion.move_dir) {
                motion.target_rotation = rotation;
            }
        }
        transform.rotation = rotate_towards(
            transform.rotation,
            motion.target_rotation,
            config.rotation_speed_rad() * delta,
        );
    }
}

fn deflect_at_ledge(
    motion: &mut CharacterMotion,
    ledge: &LedgeData,
    transform: &Transform,
    physics: &dyn PhysicsQueries,
    ground_mask: Group,
) {
    let facing = transform.forward().as_vec3();
    let ground_ahead = physics.raycast_any(
        transform.translation + facing * WALK_OFF_PROBE_AHEAD,
        Vec3::NEG_Y,
        LEDGE_PROBE_DEPTH,
        ground_mask,
    );

    let deflection = ledge_deflection(
        motion.desired_move_dir,
        facing,
        motion.velocity,
        ledge.surface_normal,
        ground_ahead,
    );
    apply_deflection(motion, deflection);
}

/// Система: `collider_enabled` → rapier `ColliderDisabled`
pub fn sync_collider_state(
    mut commands: Commands,
    characters: Query<(Entity, &CharacterMotion, Has<ColliderDisabled>), Changed<CharacterMotion>>,
) {
    for (entity, motion, disabled) in characters.iter() {
        match (motion.collider_enabled(), disabled) {
            (true, true) => {
                commands.entity(entity).remove::<ColliderDisabled>();
            }
            (false, false) => {
                commands.entity(entity).insert(ColliderDisabled);
            }
            _ => {}
        }
    }
}

/// Startup: отсутствующие collaborators → лог, зависящие системы становятся no-op
pub fn report_missing_collaborators(physics: Option<Res<PhysicsWorld>>, scanner: Option<Res<Scanner>>) {
    if physics.is_none() {
        crate::log_error("PhysicsWorld resource is missing: locomotion and climb probes are disabled");
    }
    if scanner.is_none() {
        crate::log_error("Scanner resource is missing: ledge detection is disabled");
    }
}

/// Plugin для locomotion controller'а
///
/// Регистрирует системы в FixedUpdate (CharacterSet::Locomotion / Cleanup).
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, report_missing_collaborators)
            .add_systems(
                FixedUpdate,
                (locomotion_tick, sync_collider_state)
                    .chain()
                    .in_set(CharacterSet::Locomotion),
            )
            .add_systems(FixedUpdate, clear_input_edges.in_set(CharacterSet::Cleanup));
    }
}

/// Компоненты climbing персонажа (без host физики)
pub fn climbing_character_bundle(position: Vec3) -> impl Bundle {
    (
        Transform::from_translation(position),
        CharacterMotion::default(),
        LocomotionConfig::default(),
        PlayerInput::default(),
        AnimatorState::playing(LOCOMOTION_CLIP, 1.0),
        ActionRunner::default(),
        ClimbController::default(),
    )
}

/// Spawn helper для headless персонажа
pub fn spawn_climbing_character(commands: &mut Commands, position: Vec3) -> Entity {
    commands.spawn(climbing_character_bundle(position)).id()
}

/// Spawn helper для персонажа с rapier коллайдером
///
/// - RigidBody::KinematicPositionBased (движение считаем сами)
/// - Capsule 1.8m, радиус 0.3m, pivot в ступнях (compound со смещением)
/// - Коллайдит только с solid слоями (ground + obstacle)
pub fn spawn_physics_character(commands: &mut Commands, position: Vec3) -> Entity {
    let entity = spawn_climbing_character(commands, position);

    commands.entity(entity).insert((
        RigidBody::KinematicPositionBased,
        Collider::compound(vec![(
            Vec3::new(0.0, 0.9, 0.0),
            Quat::IDENTITY,
            Collider::capsule_y(0.6, 0.3),
        )]),
        CollisionGroups::new(layers::CHARACTER, layers::solid()),
    ));

    entity
}
