use std::collections::HashMap;

use glam::Vec2;
use kinebonk::*;

const WALL: u32 = 1;
const PLATFORM: u32 = 2;
const RIDER: u32 = 4;

const PLATFORM_KEY: ColKey = 1;
const RIDER_KEY: ColKey = 10;
const CRATE_KEY: ColKey = 11;

const PLATFORM_TOML: &str = r#"
max_attached = 4

[mobile_mask]
layer = 2
collides_with = 4
"#;

/// Obstacles move every tick, so the world is rebuilt per frame.
fn build_world(world: &mut CollisionWorld, platform: &KinematicPlatform, riders: &HashMap<ColKey, KinematicMobile>) {
    world.begin_frame();
    world.push_aabb(Vec2::new(0.0, -0.5), Vec2::new(30.0, 0.5), LayerMask::simple(WALL, 0), None);
    world.push_aabb(
        platform.position(),
        platform.body().shape().half_extents(),
        LayerMask::simple(PLATFORM, 0),
        Some(PLATFORM_KEY),
    );
    for (&key, rider) in riders {
        world.push_aabb(rider.position(), rider.body().shape().half_extents(), LayerMask::simple(RIDER, 0), Some(key));
    }
    world.end_frame();
}

fn main() -> Result<(), ConfigError> {
    env_logger::init();

    let platform_cfg: PlatformConfig = from_toml_str(PLATFORM_TOML)?;
    let platform_body = KinematicBody::new(
        ColliderKind::Aabb { half_extents: Vec2::new(1.5, 0.25) },
        Vec2::new(0.0, 1.0),
        BodyConfig {
            key: Some(PLATFORM_KEY),
            hit_buffer_size: 4,
            collision_mask: LayerMask::simple(PLATFORM, WALL),
            gravity: Vec2::ZERO,
            ..Default::default()
        },
    )?;
    let mut platform = KinematicPlatform::new(platform_body, platform_cfg)?;

    let mobile_cfg = |key| BodyConfig {
        key: Some(key),
        collision_mask: LayerMask::simple(RIDER, WALL | PLATFORM),
        ..Default::default()
    };
    let rider_shape = ColliderKind::Aabb { half_extents: Vec2::splat(0.4) };

    let mut riders: HashMap<ColKey, KinematicMobile> = HashMap::new();
    let rider = KinematicBody::new(rider_shape, Vec2::new(0.0, 1.73), mobile_cfg(RIDER_KEY))?;
    riders.insert(RIDER_KEY, KinematicMobile::follow_platform(rider));

    // A loose crate standing in the platform's path gets shoved when hit
    let crate_body = KinematicBody::new(rider_shape, Vec2::new(4.0, 1.0), mobile_cfg(CRATE_KEY))?;
    let shoved = KinematicMobile::new(crate_body).with_collision_handler(|body, world, msg| {
        println!("crate hit: {msg}");
        let push = msg.movement * (1.0 - msg.hit.fraction);
        body.move_and_slide(world, push);
    });
    riders.insert(CRATE_KEY, shoved);

    if !platform.attach(RIDER_KEY) {
        println!("platform full, rider stays behind");
    }

    let mut world = CollisionWorld::new(WorldConfig { cell_size: 2.0 });
    let step = Vec2::new(0.05, 0.0);
    for tick in 0..120 {
        let d = if tick < 80 { step } else { -step };
        build_world(&mut world, &platform, &riders);
        let v = platform.move_by(&mut world, d, &mut riders);
        if tick % 10 == 0 {
            let r = riders[&RIDER_KEY].position();
            let c = riders[&CRATE_KEY].position();
            println!(
                "tick {tick:3}: platform=({:.2},{:.2}) v=({:.2},{:.2}) rider=({:.2},{:.2}) crate=({:.2},{:.2})",
                platform.position().x,
                platform.position().y,
                v.x,
                v.y,
                r.x,
                r.y,
                c.x,
                c.y
            );
        }
    }

    platform.detach(RIDER_KEY);
    println!("attached after detach: {:?}", platform.attached());
    Ok(())
}
