//! Ledge Point Graph — climb points и направленные связи между ними
//!
//! Граф авторится статически (level geometry), в runtime только читается.
//! Ledge — parent entity с маркером `Ledge`, climb points — его потомки.

use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Тип связи между соседними climb points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Прыжок (hop), требует удержания jump
    Jump,
    /// Shimmy вдоль уступа
    Move,
}

/// Исходящее ребро climb point'а
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Neighbour {
    pub point: Entity,
    pub connection: ConnectionType,
    /// Cardinal направление в плоскости уступа: (0,1) up, (0,-1) down, (±1,0) right/left
    pub direction: IVec2,
}

/// Маркер entity-уступа (владелец climb points)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Ledge;

/// Узел графа
///
/// Инвариант: не более одного исходящего ребра на cardinal направление.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ClimbPoint {
    /// С этой точки можно залезть наверх (mount)
    pub mount_point: bool,
    neighbours: Vec<Neighbour>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgeGraphError {
    /// Направление не из {up, down, left, right}
    NotCardinal(IVec2),
    /// В этом направлении уже есть ребро
    DirectionTaken { direction: IVec2, existing: Entity },
    /// Entity не содержит ClimbPoint
    MissingPoint(Entity),
}

impl fmt::Display for LedgeGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgeGraphError::NotCardinal(direction) => {
                write!(f, "climb direction {:?} is not cardinal", direction)
            }
            LedgeGraphError::DirectionTaken { direction, existing } => {
                write!(f, "climb point already has an edge {:?} -> {:?}", direction, existing)
            }
            LedgeGraphError::MissingPoint(entity) => {
                write!(f, "entity {:?} has no ClimbPoint", entity)
            }
        }
    }
}

impl std::error::Error for LedgeGraphError {}

fn is_cardinal(direction: IVec2) -> bool {
    direction.x.abs() + direction.y.abs() == 1
}

impl ClimbPoint {
    pub fn new(mount_point: bool) -> Self {
        Self {
            mount_point,
            neighbours: Vec::new(),
        }
    }

    pub fn neighbours(&self) -> &[Neighbour] {
        &self.neighbours
    }

    /// Добавить исходящее ребро
    pub fn connect(
        &mut self,
        point: Entity,
        direction: IVec2,
        connection: ConnectionType,
    ) -> Result<(), LedgeGraphError> {
        if !is_cardinal(direction) {
            return Err(LedgeGraphError::NotCardinal(direction));
        }

        if let Some(existing) = self.neighbours.iter().find(|n| n.direction == direction) {
            return Err(LedgeGraphError::DirectionTaken {
                direction,
                existing: existing.point,
            });
        }

        self.neighbours.push(Neighbour {
            point,
            connection,
            direction,
        });
        Ok(())
    }

    /// Builder-вариант `connect` для авторинга
    pub fn with_neighbour(
        mut self,
        point: Entity,
        direction: IVec2,
        connection: ConnectionType,
    ) -> Result<Self, LedgeGraphError> {
        self.connect(point, direction, connection)?;
        Ok(self)
    }

    /// Ребро для climb input'а
    ///
    /// Вертикальная компонента input'а проверяется первой, затем горизонтальная:
    /// диагональ (1, 1) пойдёт по ребру up, если оно есть, иначе по right.
    pub fn neighbour(&self, input: IVec2) -> Option<&Neighbour> {
        let vertical = (input.y != 0)
            .then(|| self.neighbours.iter().find(|n| n.direction.y == input.y))
            .flatten();

        vertical.or_else(|| {
            (input.x != 0)
                .then(|| self.neighbours.iter().find(|n| n.direction.x == input.x))
                .flatten()
        })
    }
}

/// Связать две точки в обе стороны (обратное ребро — с противоположным направлением)
pub fn connect_two_way(
    world: &mut World,
    a: Entity,
    b: Entity,
    direction: IVec2,
    connection: ConnectionType,
) -> Result<(), LedgeGraphError> {
    if world.get::<ClimbPoint>(b).is_none() {
        return Err(LedgeGraphError::MissingPoint(b));
    }
    if let Some(reverse) = world.get::<ClimbPoint>(b) {
        if let Some(existing) = reverse.neighbours.iter().find(|n| n.direction == -direction) {
            return Err(LedgeGraphError::DirectionTaken {
                direction: -direction,
                existing: existing.point,
            });
        }
    }

    world
        .get_mut::<ClimbPoint>(a)
        .ok_or(LedgeGraphError::MissingPoint(a))?
        .connect(b, direction, connection)?;

    world
        .get_mut::<ClimbPoint>(b)
        .ok_or(LedgeGraphError::MissingPoint(b))?
        .connect(a, -direction, connection)
}

/// Ближайшая к `hit_point` точка (первая при равенстве — порядок авторинга)
pub fn nearest_climb_point(
    points: impl IntoIterator<Item = (Entity, Vec3)>,
    hit_point: Vec3,
) -> Option<Entity> {
    let mut nearest: Option<(Entity, f32)> = None;

    for (entity, position) in points {
        let distance = position.distance(hit_point);
        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((entity, distance)),
        }
    }

    nearest.map(|(entity, _)| entity)
}

/// Все climb points под уступом (обход потомков в порядке children)
pub fn ledge_climb_points(
    ledge: Entity,
    children: &Query<&Children>,
    points: &Query<(&ClimbPoint, &GlobalTransform)>,
) -> Vec<(Entity, Vec3)> {
    let mut found = Vec::new();
    let mut stack = vec![ledge];

    while let Some(entity) = stack.pop() {
        if let Ok((_, transform)) = points.get(entity) {
            found.push((entity, transform.translation()));
        }

        if let Ok(kids) = children.get(entity) {
            let kids: &[Entity] = kids;
            // Обратный push → pop в прямом порядке children
            for &child in kids.iter().rev() {
                stack.push(child);
            }
        }
    }

    found
}
