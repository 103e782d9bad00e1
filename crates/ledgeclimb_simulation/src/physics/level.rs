//! Headless уровень из axis-aligned блоков
//!
//! Используется когда host физика не подключена (тесты, headless бинарь).
//! Реализует `PhysicsQueries`: sphere overlap, slab ray cast, per-axis sweep тела.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

use super::layers;
use super::queries::{PhysicsQueries, RayHit};

/// Половина ширины тела персонажа (m)
const BODY_HALF_WIDTH: f32 = 0.3;
/// Высота тела от pivot'а (ступни) вверх
const BODY_HEIGHT: f32 = 1.8;

#[derive(Debug, Clone)]
pub struct LevelBlock {
    pub min: Vec3,
    pub max: Vec3,
    pub layers: Group,
    /// Entity-владелец (ledge для climb блоков)
    pub entity: Option<Entity>,
}

impl LevelBlock {
    pub fn new(min: Vec3, max: Vec3, layers: Group) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            layers,
            entity: None,
        }
    }

    /// Блок по центру и размерам
    pub fn cuboid(center: Vec3, size: Vec3, layers: Group) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half, layers)
    }

    pub fn owned_by(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    fn contains_point(&self, point: Vec3) -> bool {
        point.cmpgt(self.min).all() && point.cmplt(self.max).all()
    }

    /// Строгое пересечение AABB (касание не считается)
    fn overlaps(&self, min: Vec3, max: Vec3) -> bool {
        min.cmplt(self.max).all() && max.cmpgt(self.min).all()
    }

    /// Slab test. None если луч не попал или origin внутри блока.
    fn ray_intersection(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        if self.contains_point(origin) {
            return None;
        }

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];

            if d.abs() < 1e-6 {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t1 = (self.min[axis] - o) * inv;
            let mut t2 = (self.max[axis] - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            if t1 > t_near {
                t_near = t1;
                normal = Vec3::ZERO;
                normal[axis] = -d.signum();
            }
            t_far = t_far.min(t2);

            if t_near > t_far {
                return None;
            }
        }

        if t_near < 0.0 || t_near > max_distance {
            return None;
        }

        Some((t_near, normal))
    }
}

/// Статический headless уровень
#[derive(Debug, Clone, Default)]
pub struct StaticLevel {
    blocks: Vec<LevelBlock>,
}

impl StaticLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block: LevelBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn add_block(&mut self, block: LevelBlock) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[LevelBlock] {
        &self.blocks
    }

    fn body_bounds(position: Vec3) -> (Vec3, Vec3) {
        (
            Vec3::new(position.x - BODY_HALF_WIDTH, position.y, position.z - BODY_HALF_WIDTH),
            Vec3::new(position.x + BODY_HALF_WIDTH, position.y + BODY_HEIGHT, position.z + BODY_HALF_WIDTH),
        )
    }

    fn blocking_block(&self, position: Vec3) -> Option<&LevelBlock> {
        let (min, max) = Self::body_bounds(position);
        self.blocks
            .iter()
            .filter(|block| block.layers.intersects(layers::solid()))
            .find(|block| block.overlaps(min, max))
    }
}

impl PhysicsQueries for StaticLevel {
    fn check_sphere(&self, center: Vec3, radius: f32, mask: Group) -> bool {
        self.blocks
            .iter()
            .filter(|block| block.layers.intersects(mask))
            .any(|block| {
                let closest = center.clamp(block.min, block.max);
                closest.distance_squared(center) <= radius * radius
            })
    }

    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Group) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        self.blocks
            .iter()
            .filter(|block| block.layers.intersects(mask))
            .filter_map(|block| {
                block
                    .ray_intersection(origin, direction, max_distance)
                    .map(|(distance, normal)| RayHit {
                        point: origin + direction * distance,
                        normal,
                        distance,
                        entity: block.entity,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn move_character(&self, position: Vec3, displacement: Vec3) -> Vec3 {
        let mut current = position;

        // Горизонталь первой: упор в стену не должен мешать посадке на пол
        for axis in [0, 2, 1] {
            if displacement[axis] == 0.0 {
                continue;
            }

            let mut candidate = current;
            candidate[axis] += displacement[axis];

            match self.blocking_block(candidate) {
                None => current = candidate,
                Some(block) if axis == 1 && displacement.y < 0.0 => {
                    // Floor snap: встаём на верх блока, если там свободно
                    let mut snapped = candidate;
                    snapped.y = block.max.y;
                    if snapped.y <= current.y && self.blocking_block(snapped).is_none() {
                        current = snapped;
                    }
                }
                Some(_) => {}
            }
        }

        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_level() -> StaticLevel {
        StaticLevel::new().with_block(LevelBlock::new(
            Vec3::new(-10.0, -1.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
            layers::GROUND | layers::OBSTACLE,
        ))
    }

    #[test]
    fn test_sphere_overlap_respects_mask() {
        let level = floor_level();

        assert!(level.check_sphere(Vec3::new(0.0, -0.1, 0.0), 0.2, layers::GROUND));
        assert!(!level.check_sphere(Vec3::new(0.0, 0.5, 0.0), 0.2, layers::GROUND));
        assert!(!level.check_sphere(Vec3::new(0.0, -0.1, 0.0), 0.2, layers::CLIMB_LEDGE));
    }

    #[test]
    fn test_ray_hits_top_face_with_up_normal() {
        let level = floor_level();

        let hit = level
            .cast_ray(Vec3::new(1.0, 1.5, 2.0), Vec3::NEG_Y, 2.0, layers::GROUND)
            .expect("ray must hit the floor");

        assert!((hit.distance - 1.5).abs() < 1e-4);
        assert!((hit.point.y).abs() < 1e-4);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn test_ray_from_surface_hits_at_zero_distance() {
        let level = floor_level();
        let hit = level.cast_ray(Vec3::new(0.0, 0.0, 0.0), Vec3::NEG_Y, 2.0, layers::GROUND);
        assert_eq!(hit.map(|h| h.distance), Some(0.0));
    }

    #[test]
    fn test_ray_ignores_block_containing_origin() {
        let level = floor_level();
        let hit = level.cast_ray(Vec3::new(0.0, -0.5, 0.0), Vec3::NEG_Y, 2.0, layers::GROUND);
        assert!(hit.is_none());
    }

    #[test]
    fn test_ray_returns_nearest_block_and_owner() {
        let ledge = Entity::from_raw(7);
        let level = floor_level().with_block(
            LevelBlock::cuboid(Vec3::new(0.0, 1.0, -3.5), Vec3::new(4.0, 2.0, 1.0), layers::CLIMB_LEDGE)
                .owned_by(ledge),
        );

        let hit = level
            .cast_ray(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z, 5.0, layers::CLIMB_LEDGE)
            .expect("ray must hit the wall");

        assert!((hit.distance - 3.0).abs() < 1e-4);
        assert_eq!(hit.normal, Vec3::Z);
        assert_eq!(hit.entity, Some(ledge));
    }

    #[test]
    fn test_move_character_snaps_to_floor() {
        let level = floor_level();
        let moved = level.move_character(Vec3::new(0.0, 0.05, 0.0), Vec3::new(0.1, -0.2, 0.0));

        assert!((moved.x - 0.1).abs() < 1e-5);
        assert_eq!(moved.y, 0.0);
    }

    #[test]
    fn test_move_character_blocked_by_wall() {
        let level = floor_level().with_block(LevelBlock::new(
            Vec3::new(-5.0, 0.0, -3.0),
            Vec3::new(5.0, 3.0, -2.0),
            layers::OBSTACLE,
        ));

        // Тело уже касается стены (z - 0.3 == -2.0), шаг вперёд блокируется
        let moved = level.move_character(Vec3::new(0.0, 0.0, -1.7), Vec3::new(0.0, 0.0, -0.1));
        assert!((moved.z + 1.7).abs() < 1e-5);

        // Вдоль стены — свободно
        let moved = level.move_character(Vec3::new(0.0, 0.0, -1.7), Vec3::new(0.2, 0.0, 0.0));
        assert!((moved.x - 0.2).abs() < 1e-5);
    }
}
