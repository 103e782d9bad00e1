//! Ledgeclimb Simulation Core
//!
//! Third-person locomotion + climb state machine на Bevy 0.16 (ECS layer)
//!
//! Архитектура:
//! - ECS = движение персонажа, climb логика, граф climb points
//! - Host = физика (PhysicsQueries), animator (AnimationCommand → AnimatorState), рендер
//! - Headless host (StaticLevel + HeadlessAnimatorPlugin) для тестов и демо

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

// Публичные модули
pub mod action;
pub mod climb;
pub mod components;
pub mod ledge;
pub mod logger;
pub mod physics;

// Re-export базовых типов для удобства
pub use action::{
    ActionCompleted, ActionError, ActionPlugin, ActionRequest, ActionRunner, AnimationCommand, AnimatorState,
    BodyPart, ClipInfo, ClipLibrary, HeadlessAnimatorPlugin, MatchTargetParams,
};
pub use climb::{ClimbController, ClimbEvent, ClimbEventKind, ClimbMove, ClimbPhase, ClimbPlugin, HandOffset};
pub use components::*;
pub use ledge::{
    connect_two_way, ClimbPoint, ConnectionType, EnvironmentScanner, Ledge, LedgeData, LedgeGraphError, RayScanner,
    Scanner, ScannerConfig,
};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};
pub use physics::{
    climbing_character_bundle, facing_rotation, layers, spawn_climbing_character, spawn_physics_character,
    LevelBlock, LocomotionPlugin, PhysicsQueries, PhysicsWorld, StaticLevel,
};

/// Порядок систем персонажа внутри одного fixed тика
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterSet {
    /// Resume matched actions (ActionRunner)
    Actions,
    /// Follow-ups + таблица climb переходов
    Climb,
    /// Ground/air locomotion
    Locomotion,
    /// Host animator читает AnimationCommand
    Animation,
    /// Сброс one-shot input фронтов
    Cleanup,
}

/// Частота simulation tick
pub const FIXED_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// PhysicsWorld вставляет host (или тест). Scanner по умолчанию — RayScanner.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            .init_resource::<Scanner>()
            .configure_sets(
                FixedUpdate,
                (
                    CharacterSet::Actions,
                    CharacterSet::Climb,
                    CharacterSet::Locomotion,
                    CharacterSet::Animation,
                    CharacterSet::Cleanup,
                )
                    .chain(),
            )
            .register_type::<CharacterMotion>()
            .register_type::<LocomotionConfig>()
            .register_type::<ScannerConfig>()
            .register_type::<PlayerInput>()
            .register_type::<ClimbPoint>()
            .register_type::<Ledge>()
            .register_type::<ClimbController>()
            .register_type::<AnimatorState>()
            // Подсистемы
            .add_plugins((ActionPlugin, ClimbPlugin, LocomotionPlugin));
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время шагает ровно на 1/60s за `app.update()`.
/// PhysicsWorld вставляется до первого update (уровень ссылается на ledge entities
/// этого же мира): `app.insert_resource(PhysicsWorld::new(level))`.
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, bevy::transform::TransformPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / FIXED_HZ)))
        .add_plugins((SimulationPlugin, HeadlessAnimatorPlugin));

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Компоненты сериализуются через Debug в порядке Entity index.
pub fn world_snapshot<T>(world: &mut World) -> Vec<u8>
where
    T: Component + std::fmt::Debug,
{
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    let mut snapshot = Vec::new();
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
