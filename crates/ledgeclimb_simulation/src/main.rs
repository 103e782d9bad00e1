//! Headless демо ledgeclimb
//!
//! Строит уровень (пол, стена с уступом из трёх точек, верхний уступ)
//! и проигрывает сценарий: подойти → grab → shimmy → hop вверх → mount.

use bevy::prelude::*;

use ledgeclimb_simulation::{
    climbing_character_bundle, connect_two_way, create_headless_app, layers, log_error, log_info, CharacterMotion,
    ClimbController, ClimbPoint, ConnectionType, Ledge, LedgeGraphError, LevelBlock, PhysicsWorld, PlayerInput, StaticLevel,
};

/// Верх нижней стены / верхнего блока
const LOWER_TOP: f32 = 2.2;
const UPPER_TOP: f32 = 4.0;
/// Лимит тиков на каждый шаг сценария
const STEP_TIMEOUT: usize = 600;

struct DemoLevel {
    character: Entity,
    lower_points: Vec<Entity>,
    upper_point: Entity,
}

fn build_level(world: &mut World) -> Result<(StaticLevel, DemoLevel), LedgeGraphError> {
    let lower_ledge = world.spawn((Transform::IDENTITY, Ledge)).id();
    let upper_ledge = world.spawn((Transform::IDENTITY, Ledge)).id();

    let lower_points: Vec<Entity> = [-1.0, 0.0, 1.0]
        .into_iter()
        .map(|x| {
            let point = world
                .spawn((
                    Transform::from_xyz(x, LOWER_TOP, -2.0).looking_to(Vec3::Z, Vec3::Y),
                    ClimbPoint::new(false),
                ))
                .id();
            world.entity_mut(lower_ledge).add_child(point);
            point
        })
        .collect();

    let upper_point = world
        .spawn((
            Transform::from_xyz(1.0, UPPER_TOP, -3.0).looking_to(Vec3::Z, Vec3::Y),
            ClimbPoint::new(true),
        ))
        .id();
    world.entity_mut(upper_ledge).add_child(upper_point);

    // Shimmy вдоль нижнего уступа, hop вверх с правой точки
    connect_two_way(world, lower_points[0], lower_points[1], IVec2::X, ConnectionType::Move)?;
    connect_two_way(world, lower_points[1], lower_points[2], IVec2::X, ConnectionType::Move)?;
    connect_two_way(world, lower_points[2], upper_point, IVec2::Y, ConnectionType::Jump)?;

    let level = StaticLevel::new()
        .with_block(LevelBlock::new(
            Vec3::new(-20.0, -1.0, -20.0),
            Vec3::new(20.0, 0.0, 20.0),
            layers::GROUND | layers::OBSTACLE,
        ))
        .with_block(
            LevelBlock::new(
                Vec3::new(-3.0, 0.0, -3.0),
                Vec3::new(3.0, LOWER_TOP, -2.0),
                layers::GROUND | layers::OBSTACLE | layers::CLIMB_LEDGE,
            )
            .owned_by(lower_ledge),
        )
        .with_block(
            LevelBlock::new(
                Vec3::new(-3.0, 0.0, -4.0),
                Vec3::new(3.0, UPPER_TOP, -3.0),
                layers::GROUND | layers::OBSTACLE | layers::CLIMB_LEDGE,
            )
            .owned_by(upper_ledge),
        );

    let character = world.spawn(climbing_character_bundle(Vec3::new(0.0, 0.0, 3.0))).id();

    Ok((
        level,
        DemoLevel {
            character,
            lower_points,
            upper_point,
        },
    ))
}

fn set_input(app: &mut App, character: Entity, apply: impl FnOnce(&mut PlayerInput)) {
    if let Some(mut input) = app.world_mut().get_mut::<PlayerInput>(character) {
        apply(&mut input);
    }
}

/// Тикать, пока `done` не вернёт true (или не выйдет лимит)
fn run_until(app: &mut App, label: &str, mut done: impl FnMut(&World) -> bool) -> bool {
    for tick in 0..STEP_TIMEOUT {
        app.update();
        if done(app.world()) {
            log_info(&format!("{} (after {} ticks)", label, tick + 1));
            return true;
        }
    }
    log_error(&format!("{}: timed out after {} ticks", label, STEP_TIMEOUT));
    false
}

fn motion(world: &World, character: Entity) -> Option<&CharacterMotion> {
    world.get::<CharacterMotion>(character)
}

fn current_point(world: &World, character: Entity) -> Option<Entity> {
    world.get::<ClimbController>(character).and_then(ClimbController::current_point)
}

fn report(app: &App, character: Entity) {
    let world = app.world();
    if let (Some(transform), Some(motion)) = (world.get::<Transform>(character), motion(world, character)) {
        log_info(&format!(
            "  position {:.2?} grounded={} hanging={} control={} authority={:?}",
            transform.translation,
            motion.is_grounded(),
            motion.is_hanging(),
            motion.has_control(),
            motion.authority()
        ));
    }
}

fn main() {
    println!("Starting ledgeclimb headless simulation");

    let mut app = create_headless_app();
    let (level, demo) = match build_level(app.world_mut()) {
        Ok(built) => built,
        Err(error) => {
            log_error(&format!("Invalid demo level: {}", error));
            return;
        }
    };
    log_info(&format!("Demo level: {} blocks", level.blocks().len()));
    app.insert_resource(PhysicsWorld::new(level));

    let character = demo.character;
    app.update();

    // 1. Подойти к стене
    set_input(&mut app, character, |input| input.set_axis(Vec2::new(0.0, 1.0)));
    let reached = run_until(&mut app, "Walked up to the wall", |world| {
        world
            .get::<Transform>(character)
            .is_some_and(|transform| transform.translation.z < -1.2)
    });
    report(&app, character);
    if !reached {
        return;
    }

    // 2. Grab
    set_input(&mut app, character, |input| {
        input.set_axis(Vec2::ZERO);
        input.jump.press();
    });
    let grabbed = run_until(&mut app, "Grabbed the ledge", |world| {
        motion(world, character).is_some_and(|m| m.is_hanging() && !m.in_action())
    });
    set_input(&mut app, character, |input| input.jump.release());
    report(&app, character);
    if !grabbed {
        return;
    }

    // 3. Shimmy вправо до крайней точки
    set_input(&mut app, character, |input| input.set_axis(Vec2::new(1.0, 0.0)));
    let rightmost = demo.lower_points[2];
    let shimmied = run_until(&mut app, "Shimmied to the right end", |world| {
        current_point(world, character) == Some(rightmost)
            && motion(world, character).is_some_and(|m| !m.in_action())
    });
    set_input(&mut app, character, |input| input.set_axis(Vec2::ZERO));
    report(&app, character);
    if !shimmied {
        return;
    }

    // 4. Hop вверх (Jump ребро, нужен удерживаемый jump)
    set_input(&mut app, character, |input| {
        input.set_axis(Vec2::new(0.0, 1.0));
        input.jump.press();
    });
    let upper = demo.upper_point;
    let hopped = run_until(&mut app, "Hopped up to the upper ledge", |world| {
        current_point(world, character) == Some(upper) && motion(world, character).is_some_and(|m| !m.in_action())
    });
    set_input(&mut app, character, |input| {
        input.set_axis(Vec2::ZERO);
        input.jump.release();
    });
    report(&app, character);
    if !hopped {
        return;
    }

    // 5. Mount
    set_input(&mut app, character, |input| input.set_axis(Vec2::new(0.0, 1.0)));
    let mounted = run_until(&mut app, "Mounted the upper ledge", |world| {
        motion(world, character).is_some_and(|m| m.has_control() && !m.is_hanging())
    });
    set_input(&mut app, character, |input| input.set_axis(Vec2::ZERO));
    report(&app, character);

    // Дать приземлиться
    for _ in 0..60 {
        app.update();
    }
    report(&app, character);

    println!("Simulation complete! mounted={}", mounted);
}
