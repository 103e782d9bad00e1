//! Общие helpers для headless интеграционных тестов

#![allow(dead_code)]

use bevy::prelude::*;
use ledgeclimb_simulation::{
    climbing_character_bundle, create_headless_app, layers, CharacterMotion, CharacterSet, ClimbController, ClimbEvent,
    ClimbPoint, Ledge, LevelBlock, PhysicsWorld, PlayerInput, StaticLevel,
};

/// Высота стены-уступа (лицевая грань на z = -2)
pub const WALL_TOP: f32 = 2.2;
pub const WALL_FACE_Z: f32 = -2.0;
/// Правая рука относительно root в висящей позе headless rig'а
pub const RIGHT_HAND_RIG_OFFSET: Vec3 = Vec3::new(0.25, 1.85, -0.35);

/// Уступ с climb points на верхнем ребре лицевой грани
pub struct TestLedge {
    pub ledge: Entity,
    pub points: Vec<Entity>,
}

/// Пол (верх y=0) + стена z ∈ [-3, -2], верх WALL_TOP, принадлежит `ledge`
pub fn wall_level(ledge: Entity) -> StaticLevel {
    StaticLevel::new()
        .with_block(LevelBlock::new(
            Vec3::new(-20.0, -1.0, -20.0),
            Vec3::new(20.0, 0.0, 20.0),
            layers::GROUND | layers::OBSTACLE,
        ))
        .with_block(
            LevelBlock::new(
                Vec3::new(-5.0, 0.0, -3.0),
                Vec3::new(5.0, WALL_TOP, WALL_FACE_Z),
                layers::GROUND | layers::OBSTACLE | layers::CLIMB_LEDGE,
            )
            .owned_by(ledge),
        )
}

/// Ledge entity + climb points (forward наружу, +Z) в заданных x
pub fn spawn_wall_ledge(world: &mut World, xs: &[f32], mount_point: bool) -> TestLedge {
    let ledge = world.spawn((Transform::IDENTITY, Ledge)).id();
    let points = xs
        .iter()
        .map(|&x| {
            let point = world
                .spawn((
                    Transform::from_xyz(x, WALL_TOP, WALL_FACE_Z).looking_to(Vec3::Z, Vec3::Y),
                    ClimbPoint::new(mount_point),
                ))
                .id();
            world.entity_mut(ledge).add_child(point);
            point
        })
        .collect();

    TestLedge { ledge, points }
}

/// Собранные ClimbEvent'ы (порядок появления)
#[derive(Resource, Default)]
pub struct RecordedClimbEvents(pub Vec<ClimbEvent>);

fn record_climb_events(mut events: EventReader<ClimbEvent>, mut recorded: ResMut<RecordedClimbEvents>) {
    recorded.0.extend(events.read().copied());
}

/// Headless app с уровнем, построенным в его же мире
pub fn app_with_level(build: impl FnOnce(&mut World) -> StaticLevel) -> App {
    let mut app = create_headless_app();
    let level = build(app.world_mut());
    app.insert_resource(PhysicsWorld::new(level))
        .init_resource::<RecordedClimbEvents>()
        .add_systems(FixedUpdate, record_climb_events.after(CharacterSet::Cleanup));
    app
}

pub fn spawn_character(app: &mut App, position: Vec3) -> Entity {
    app.world_mut().spawn(climbing_character_bundle(position)).id()
}

pub fn spawn_character_facing(app: &mut App, position: Vec3, rotation: Quat) -> Entity {
    let entity = spawn_character(app, position);
    let mut world = app.world_mut().entity_mut(entity);
    if let Some(mut transform) = world.get_mut::<Transform>() {
        transform.rotation = rotation;
    }
    world.insert(CharacterMotion::with_rotation(rotation));
    entity
}

/// Тикать, пока условие не выполнится. Some(число тиков) или None по лимиту.
pub fn run_until(app: &mut App, max_ticks: usize, mut done: impl FnMut(&World) -> bool) -> Option<usize> {
    for tick in 1..=max_ticks {
        app.update();
        if done(app.world()) {
            return Some(tick);
        }
    }
    None
}

pub fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

pub fn input(app: &mut App, entity: Entity) -> Mut<'_, PlayerInput> {
    app.world_mut()
        .get_mut::<PlayerInput>(entity)
        .expect("character has PlayerInput")
}

pub fn motion(app: &App, entity: Entity) -> &CharacterMotion {
    app.world().get::<CharacterMotion>(entity).expect("character has CharacterMotion")
}

pub fn transform(app: &App, entity: Entity) -> Transform {
    *app.world().get::<Transform>(entity).expect("character has Transform")
}

pub fn climb(app: &App, entity: Entity) -> &ClimbController {
    app.world().get::<ClimbController>(entity).expect("character has ClimbController")
}

/// Дождаться, пока персонаж встанет на землю (после spawn)
pub fn settle_on_ground(app: &mut App, entity: Entity) {
    run_until(app, 120, |world| {
        world
            .get::<CharacterMotion>(entity)
            .is_some_and(CharacterMotion::is_grounded)
    })
    .expect("character should land");
}
