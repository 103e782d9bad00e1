//! Environment Scanner — геометрические probes вокруг персонажа
//!
//! Каждый probe либо возвращает данные контакта, либо None ("уступа нет").
//! Промах — не ошибка, climb/locomotion просто не делают переход.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;
use serde::{Deserialize, Serialize};

use crate::physics::{layers, PhysicsQueries};

/// Контакт с climb уступом (transient, не хранится)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgeContact {
    pub point: Vec3,
    pub normal: Vec3,
    /// Entity уступа (владелец climb points)
    pub ledge: Entity,
}

/// Край платформы, в который упирается движение (ledge walk)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct LedgeData {
    /// Перепад высоты от ступней до нижней поверхности
    pub height: f32,
    /// Нормаль боковой грани (смотрит наружу, в пропасть)
    pub surface_normal: Vec3,
}

/// Поза персонажа, от которой строятся probes
#[derive(Debug, Clone, Copy)]
pub struct ScanOrigin {
    pub position: Vec3,
    pub forward: Vec3,
}

impl ScanOrigin {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            forward: transform.forward().as_vec3(),
        }
    }
}

pub trait EnvironmentScanner: Send + Sync {
    /// Уступ перед персонажем (grab from stand)
    fn probe_forward_ledge(
        &self,
        physics: &dyn PhysicsQueries,
        origin: &ScanOrigin,
        direction: Vec3,
    ) -> Option<LedgeContact>;

    /// Уступ под краем, на котором стоит персонаж (drop to hang)
    fn probe_drop_ledge(&self, physics: &dyn PhysicsQueries, origin: &ScanOrigin) -> Option<LedgeContact>;

    /// Край платформы по направлению движения (ledge walk)
    fn probe_obstacle_ledge(
        &self,
        physics: &dyn PhysicsQueries,
        origin: &ScanOrigin,
        move_dir: Vec3,
    ) -> Option<LedgeData>;
}

/// Resource: активный scanner
#[derive(Resource)]
pub struct Scanner {
    scanner: Box<dyn EnvironmentScanner>,
}

impl Scanner {
    pub fn new(scanner: impl EnvironmentScanner + 'static) -> Self {
        Self {
            scanner: Box::new(scanner),
        }
    }

    pub fn scanner(&self) -> &dyn EnvironmentScanner {
        self.scanner.as_ref()
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(RayScanner::default())
    }
}

/// Раскладка лучей для `RayScanner`
#[derive(Debug, Clone, Reflect, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Высота нижнего climb луча над ступнями
    pub climb_ray_height: f32,
    /// Шаг между climb лучами по вертикали
    pub climb_ray_step: f32,
    pub climb_ray_count: usize,
    pub climb_ray_length: f32,
    /// Drop probe: насколько впереди и ниже ступней стартует луч назад
    pub drop_probe_ahead: f32,
    pub drop_probe_depth: f32,
    pub drop_ray_length: f32,
    /// Obstacle probe: смещение вперёд по move_dir и высота старта
    pub obstacle_probe_ahead: f32,
    pub obstacle_probe_height: f32,
    /// Разнос трёх вертикальных лучей поперёк движения
    pub obstacle_ray_spread: f32,
    pub obstacle_ray_length: f32,
    /// Минимальный перепад, который считается краем
    pub ledge_height_threshold: f32,
    pub surface_ray_length: f32,
    /// Биты rapier Group уступов с climb points
    pub climb_layers: u32,
    pub obstacle_layers: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            climb_ray_height: 1.5,
            climb_ray_step: 0.18,
            climb_ray_count: 10,
            climb_ray_length: 1.5,
            drop_probe_ahead: 2.0,
            drop_probe_depth: 0.1,
            drop_ray_length: 3.0,
            obstacle_probe_ahead: 0.5,
            obstacle_probe_height: 1.0,
            obstacle_ray_spread: 0.25,
            obstacle_ray_length: 10.0,
            ledge_height_threshold: 0.75,
            surface_ray_length: 2.0,
            climb_layers: layers::CLIMB_LEDGE.bits(),
            obstacle_layers: layers::OBSTACLE.bits(),
        }
    }
}

impl ScannerConfig {
    pub fn climb_mask(&self) -> Group {
        Group::from_bits_truncate(self.climb_layers)
    }

    pub fn obstacle_mask(&self) -> Group {
        Group::from_bits_truncate(self.obstacle_layers)
    }
}

/// Scanner по умолчанию: набор ray casts через `PhysicsQueries`
#[derive(Debug, Clone, Default)]
pub struct RayScanner {
    pub config: ScannerConfig,
}

impl RayScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }
}

impl EnvironmentScanner for RayScanner {
    fn probe_forward_ledge(
        &self,
        physics: &dyn PhysicsQueries,
        origin: &ScanOrigin,
        direction: Vec3,
    ) -> Option<LedgeContact> {
        if direction == Vec3::ZERO {
            return None;
        }

        let cfg = &self.config;
        let base = origin.position + Vec3::Y * cfg.climb_ray_height;

        (0..cfg.climb_ray_count).find_map(|i| {
            let ray_origin = base + Vec3::Y * (cfg.climb_ray_step * i as f32);
            let hit = physics.cast_ray(ray_origin, direction, cfg.climb_ray_length, cfg.climb_mask())?;
            Some(LedgeContact {
                point: hit.point,
                normal: hit.normal,
                ledge: hit.entity?,
            })
        })
    }

    fn probe_drop_ledge(&self, physics: &dyn PhysicsQueries, origin: &ScanOrigin) -> Option<LedgeContact> {
        let cfg = &self.config;
        let ray_origin =
            origin.position + Vec3::NEG_Y * cfg.drop_probe_depth + origin.forward * cfg.drop_probe_ahead;

        let hit = physics.cast_ray(ray_origin, -origin.forward, cfg.drop_ray_length, cfg.climb_mask())?;
        Some(LedgeContact {
            point: hit.point,
            normal: hit.normal,
            ledge: hit.entity?,
        })
    }

    fn probe_obstacle_ledge(
        &self,
        physics: &dyn PhysicsQueries,
        origin: &ScanOrigin,
        move_dir: Vec3,
    ) -> Option<LedgeData> {
        let move_dir = move_dir.normalize_or_zero();
        if move_dir == Vec3::ZERO {
            return None;
        }

        let cfg = &self.config;
        let center = origin.position + move_dir * cfg.obstacle_probe_ahead + Vec3::Y * cfg.obstacle_probe_height;
        let side = Vec3::Y.cross(move_dir) * cfg.obstacle_ray_spread;

        // Первый луч, под которым перепад больше порога
        let low_hit = [center, center + side, center - side]
            .into_iter()
            .filter_map(|ray_origin| {
                physics.cast_ray(ray_origin, Vec3::NEG_Y, cfg.obstacle_ray_length, cfg.obstacle_mask())
            })
            .find(|hit| origin.position.y - hit.point.y > cfg.ledge_height_threshold)?;

        // Луч из-за края обратно к персонажу — попадает в боковую грань платформы
        let surface_origin = Vec3::new(low_hit.point.x, origin.position.y - 0.1, low_hit.point.z);
        let surface_hit = physics.cast_ray(
            surface_origin,
            origin.position - surface_origin,
            cfg.surface_ray_length,
            cfg.obstacle_mask(),
        )?;

        Some(LedgeData {
            height: origin.position.y - low_hit.point.y,
            surface_normal: surface_hit.normal,
        })
    }
}
