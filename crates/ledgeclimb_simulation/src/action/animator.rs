//! Animator contract (ECS ↔ host animation system)
//!
//! Архитектура (как MovementCommand → NavigationAgent):
//! - ECS пишет `AnimationCommand` events (crossfade, match target, trigger)
//!   и параметры в `AnimatorState` (move_amount, is_grounded)
//! - Host animator применяет команды и пишет обратно состояние клипов
//!   (current/next, длина, transition, matching)
//!
//! `HeadlessAnimatorPlugin` — упрощённый host для тестов и headless бинаря.

use std::collections::HashMap;

use bevy::prelude::*;

use super::params::BodyPart;
use crate::components::CharacterMotion;

/// Клип, который сейчас играет (или в который идёт blend)
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct ClipState {
    pub clip: String,
    /// Длина клипа (секунды)
    pub length: f32,
    /// Проиграно секунд
    pub time: f32,
    pub looping: bool,
}

impl ClipState {
    pub fn normalized_time(&self) -> f32 {
        if self.length > 0.0 {
            self.time / self.length
        } else {
            1.0
        }
    }
}

/// Состояние animator'а персонажа (пишет host, читает ядро)
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AnimatorState {
    pub current: Option<ClipState>,
    /// Не None пока идёт transition (crossfade)
    pub next: Option<ClipState>,
    pub blend_remaining: f32,
    pub is_matching_target: bool,
    pub mirror_action: bool,
    /// Параметр locomotion blend tree (0..1+, damped)
    pub move_amount: f32,
    pub is_grounded: bool,
    pub last_trigger: Option<String>,
}

impl AnimatorState {
    pub fn playing(clip: impl Into<String>, length: f32) -> Self {
        Self {
            current: Some(ClipState {
                clip: clip.into(),
                length,
                time: 0.0,
                looping: true,
            }),
            ..default()
        }
    }

    pub fn is_in_transition(&self) -> bool {
        self.next.is_some()
    }

    /// Клип, в который идём (или текущий, если transition нет)
    pub fn next_or_current(&self) -> Option<&ClipState> {
        self.next.as_ref().or(self.current.as_ref())
    }

    /// Damped запись параметра (как SetFloat с dampTime)
    pub fn set_move_amount_damped(&mut self, value: f32, damp_time: f32, delta: f32) {
        let t = if damp_time > 0.0 { (delta / damp_time).min(1.0) } else { 1.0 };
        self.move_amount += (value - self.move_amount) * t;
    }
}

/// Команды host animator'у
#[derive(Event, Debug, Clone, PartialEq)]
pub enum AnimationCommand {
    CrossFade {
        entity: Entity,
        clip: String,
        /// Секунды (fixed time)
        blend_time: f32,
        mirror: bool,
    },
    /// Подогнать `body_part` к `target` в окне [start_time, target_time] активного клипа
    MatchTarget {
        entity: Entity,
        target: Vec3,
        /// Поворот персонажа, в котором body_part должна оказаться в target
        rotation: Quat,
        body_part: BodyPart,
        position_weight: Vec3,
        start_time: f32,
        target_time: f32,
    },
    Trigger {
        entity: Entity,
        name: String,
    },
}

// ============================================================================
// Headless host
// ============================================================================

/// Описание клипа для headless animator'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipInfo {
    pub length: f32,
    pub looping: bool,
    /// Root motion за весь клип (local space персонажа)
    pub root_motion: Vec3,
}

impl ClipInfo {
    pub fn action(length: f32) -> Self {
        Self {
            length,
            looping: false,
            root_motion: Vec3::ZERO,
        }
    }

    pub fn looping(length: f32) -> Self {
        Self {
            length,
            looping: true,
            root_motion: Vec3::ZERO,
        }
    }

    pub fn with_root_motion(mut self, root_motion: Vec3) -> Self {
        self.root_motion = root_motion;
        self
    }
}

/// Клип, в который animator возвращается после action (exit transition)
pub const LOCOMOTION_CLIP: &str = "Locomotion";
/// Exit transition начинается за столько секунд до конца клипа
const EXIT_BLEND_TIME: f32 = 0.2;

/// Resource: клипы, которые знает headless animator
#[derive(Resource, Debug, Clone)]
pub struct ClipLibrary {
    clips: HashMap<String, ClipInfo>,
}

impl ClipLibrary {
    pub fn empty() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }

    pub fn with_clip(mut self, name: impl Into<String>, info: ClipInfo) -> Self {
        self.clips.insert(name.into(), info);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClipInfo> {
        self.clips.get(name)
    }
}

impl Default for ClipLibrary {
    fn default() -> Self {
        // Forward персонажа = -Z: mount поднимает на уступ и чуть вперёд
        Self::empty()
            .with_clip(LOCOMOTION_CLIP, ClipInfo::looping(1.0))
            .with_clip("Jump", ClipInfo::action(0.8))
            .with_clip("IdleToHang", ClipInfo::action(1.2))
            .with_clip("DropToHang", ClipInfo::action(1.3))
            .with_clip("HangHopUp", ClipInfo::action(1.0))
            .with_clip("HangHopDown", ClipInfo::action(1.0))
            .with_clip("HangHopRight", ClipInfo::action(0.9))
            .with_clip("HangHopLeft", ClipInfo::action(0.9))
            .with_clip("ShimmyRight", ClipInfo::action(0.8))
            .with_clip("ShimmyLeft", ClipInfo::action(0.8))
            .with_clip("JumpFromHang", ClipInfo::action(1.0).with_root_motion(Vec3::new(0.0, 0.0, 0.4)))
            .with_clip("MountFromHang", ClipInfo::action(1.6).with_root_motion(Vec3::new(0.0, 1.85, -0.7)))
    }
}

/// Смещение body part от root в простом headless rig (висящая поза, local space)
fn rig_offset(body_part: BodyPart) -> Vec3 {
    match body_part {
        BodyPart::Root => Vec3::ZERO,
        BodyPart::RightHand => Vec3::new(0.25, 1.85, -0.35),
        BodyPart::LeftHand => Vec3::new(-0.25, 1.85, -0.35),
        BodyPart::RightFoot => Vec3::new(0.12, 0.0, 0.0),
        BodyPart::LeftFoot => Vec3::new(-0.12, 0.0, 0.0),
    }
}

/// Активный target match в headless animator'е
#[derive(Component, Debug, Clone)]
pub struct HeadlessMatch {
    clip: String,
    target: Vec3,
    /// Финальный поворот: rig offset считается в нём, а не в текущем (mid-turn)
    rotation: Quat,
    body_part: BodyPart,
    position_weight: Vec3,
    start_time: f32,
    target_time: f32,
    /// Root и normalized time в момент входа в окно
    anchor: Option<(Vec3, f32)>,
}

impl HeadlessMatch {
    /// Продвинуть matching. true — окно пройдено, match завершён.
    fn apply(&mut self, normalized: f32, transform: &mut Transform) -> bool {
        if normalized < self.start_time {
            return false;
        }

        let (anchor_root, anchor_time) = *self
            .anchor
            .get_or_insert((transform.translation, normalized.min(self.target_time)));

        let span = self.target_time - anchor_time;
        let progress = if span > f32::EPSILON {
            ((normalized - anchor_time) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let desired_root = self.target - self.rotation * rig_offset(self.body_part);
        let delta = (desired_root - anchor_root) * self.position_weight * progress;
        transform.translation = anchor_root + delta;

        normalized >= self.target_time
    }
}

fn clip_from_library(library: &ClipLibrary, name: &str) -> Option<ClipState> {
    library.get(name).map(|info| ClipState {
        clip: name.to_string(),
        length: info.length,
        time: 0.0,
        looping: info.looping,
    })
}

/// Система: headless animator
///
/// 1. Применяет AnimationCommand events
/// 2. Продвигает клипы, blend и exit transitions
/// 3. Root motion + target matching (только пока идёт matched action)
pub fn advance_headless_animators(
    mut commands: Commands,
    mut events: EventReader<AnimationCommand>,
    mut animators: Query<(
        Entity,
        &mut AnimatorState,
        &mut Transform,
        &CharacterMotion,
        Option<&mut HeadlessMatch>,
    )>,
    library: Res<ClipLibrary>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for event in events.read() {
        match event {
            AnimationCommand::CrossFade {
                entity,
                clip,
                blend_time,
                mirror,
            } => {
                let Ok((_, mut animator, ..)) = animators.get_mut(*entity) else {
                    continue;
                };
                match clip_from_library(&library, clip) {
                    Some(state) => {
                        animator.next = Some(state);
                        animator.blend_remaining = *blend_time;
                        animator.mirror_action = *mirror;
                    }
                    None => {
                        crate::log_error(&format!(
                            "Animator {:?}: unknown clip '{}' requested, crossfade ignored",
                            entity, clip
                        ));
                    }
                }
            }
            AnimationCommand::MatchTarget {
                entity,
                target,
                rotation,
                body_part,
                position_weight,
                start_time,
                target_time,
            } => {
                let Ok((_, mut animator, ..)) = animators.get_mut(*entity) else {
                    continue;
                };
                let Some(active) = animator.next_or_current().cloned() else {
                    continue;
                };
                // Окно уже пройдено — запрос игнорируется
                if active.normalized_time() >= *target_time {
                    continue;
                }
                animator.is_matching_target = true;
                commands.entity(*entity).insert(HeadlessMatch {
                    clip: active.clip,
                    target: *target,
                    rotation: *rotation,
                    body_part: *body_part,
                    position_weight: *position_weight,
                    start_time: *start_time,
                    target_time: *target_time,
                    anchor: None,
                });
            }
            AnimationCommand::Trigger { entity, name } => {
                if let Ok((_, mut animator, ..)) = animators.get_mut(*entity) {
                    animator.last_trigger = Some(name.clone());
                }
            }
        }
    }

    for (entity, mut animator, mut transform, motion, active_match) in animators.iter_mut() {
        advance_clips(&mut animator, &library, delta);

        if !motion.in_action() {
            // Вне action animator Transform не трогает
            if active_match.is_some() {
                commands.entity(entity).remove::<HeadlessMatch>();
                animator.is_matching_target = false;
            }
            continue;
        }

        apply_root_motion(&animator, &library, &mut transform, delta);

        if let Some(mut active_match) = active_match {
            let normalized = [animator.next.as_ref(), animator.current.as_ref()]
                .into_iter()
                .flatten()
                .find(|state| state.clip == active_match.clip)
                .map(ClipState::normalized_time);

            let finished = match normalized {
                Some(normalized) => active_match.apply(normalized, &mut transform),
                // Клип уже ушёл — match теряется
                None => true,
            };

            if finished {
                commands.entity(entity).remove::<HeadlessMatch>();
                animator.is_matching_target = false;
            }
        }
    }
}

fn advance_clips(animator: &mut AnimatorState, library: &ClipLibrary, delta: f32) {
    if let Some(current) = animator.current.as_mut() {
        current.time += delta;
        if current.looping && current.length > 0.0 {
            current.time %= current.length;
        }
    }

    if animator.next.is_some() {
        if let Some(next) = animator.next.as_mut() {
            next.time += delta;
        }
        animator.blend_remaining -= delta;
        if animator.blend_remaining <= 0.0 {
            animator.current = animator.next.take();
            animator.blend_remaining = 0.0;
        }
        return;
    }

    // Exit transition: non-looping клип в конце уходит обратно в locomotion
    let exiting = animator
        .current
        .as_ref()
        .is_some_and(|current| !current.looping && current.time >= current.length - EXIT_BLEND_TIME);
    if exiting {
        animator.next = clip_from_library(library, LOCOMOTION_CLIP);
        animator.blend_remaining = EXIT_BLEND_TIME;
    }
}

fn apply_root_motion(animator: &AnimatorState, library: &ClipLibrary, transform: &mut Transform, delta: f32) {
    let Some(state) = animator.next_or_current() else {
        return;
    };
    let Some(info) = library.get(&state.clip) else {
        return;
    };
    // Root motion раскладывается на часть клипа до exit transition.
    // Время клипа уже продвинуто на delta в этом тике.
    let active_span = info.length - EXIT_BLEND_TIME;
    if info.looping || active_span <= 0.0 || info.root_motion == Vec3::ZERO {
        return;
    }

    let played = state.time.min(active_span) - (state.time - delta).max(0.0);
    if played <= 0.0 {
        return;
    }

    let step = info.root_motion * (played / active_span);
    transform.translation += transform.rotation * step;
}

/// Headless host animator (тесты, headless бинарь)
pub struct HeadlessAnimatorPlugin;

impl Plugin for HeadlessAnimatorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ClipLibrary>().add_systems(
            FixedUpdate,
            advance_headless_animators.in_set(crate::CharacterSet::Animation),
        );
    }
}
