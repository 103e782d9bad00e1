//! Physics query contract (host физика: rapier, Godot, headless level)
//!
//! Ядро не реализует collision resolution и ray/sphere cast —
//! только потребляет их через `PhysicsQueries`.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

/// Collision layers (rapier Group битовые маски)
pub mod layers {
    use bevy_rapier3d::prelude::Group;

    /// Поверхности, на которых можно стоять
    pub const GROUND: Group = Group::GROUP_1;
    /// Препятствия/платформы (ledge walk, obstacle probe)
    pub const OBSTACLE: Group = Group::GROUP_2;
    /// Уступы с climb points
    pub const CLIMB_LEDGE: Group = Group::GROUP_3;
    pub const CHARACTER: Group = Group::GROUP_4;

    /// Во что упирается тело персонажа при движении
    pub fn solid() -> Group {
        GROUND | OBSTACLE
    }
}

/// Результат ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// Владелец коллайдера (для climb ledge — entity с `Ledge`)
    pub entity: Option<Entity>,
}

pub trait PhysicsQueries: Send + Sync {
    /// Пересекает ли сфера хоть один коллайдер из `mask`
    fn check_sphere(&self, center: Vec3, radius: f32, mask: Group) -> bool;

    /// Ближайшее попадание луча (`direction` нормализуется внутри)
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Group) -> Option<RayHit>;

    /// Сдвинуть тело персонажа с учётом коллизий, вернуть новую позицию pivot'а
    fn move_character(&self, position: Vec3, displacement: Vec3) -> Vec3;

    fn raycast_any(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Group) -> bool {
        self.cast_ray(origin, direction, max_distance, mask).is_some()
    }
}

/// Resource: активная реализация physics queries
#[derive(Resource)]
pub struct PhysicsWorld {
    queries: Box<dyn PhysicsQueries>,
}

impl PhysicsWorld {
    pub fn new(queries: impl PhysicsQueries + 'static) -> Self {
        Self {
            queries: Box::new(queries),
        }
    }

    pub fn queries(&self) -> &dyn PhysicsQueries {
        self.queries.as_ref()
    }
}
