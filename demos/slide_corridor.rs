use glam::Vec2;
use kinebonk::*;

const WALL: u32 = 1;
const PLAYER: u32 = 2;

fn build_world() -> CollisionWorld {
    let mut world = CollisionWorld::new(WorldConfig { cell_size: 2.0 });
    let solid = LayerMask::simple(WALL, 0);
    world.begin_frame();
    // Floor, a low ceiling over the last stretch and the far wall
    world.push_aabb(Vec2::new(10.0, -0.5), Vec2::new(12.0, 0.5), solid, Some(1));
    world.push_aabb(Vec2::new(16.0, 2.5), Vec2::new(3.0, 0.5), solid, Some(2));
    world.push_aabb(Vec2::new(20.5, 5.0), Vec2::new(0.5, 5.0), solid, Some(3));
    world.push_circle(Vec2::new(8.0, 4.0), 0.5, solid, Some(4));
    world.end_frame();
    world
}

fn main() {
    env_logger::init();

    let world = build_world();
    let stats = world.debug_stats();
    println!("world: entries={} cells={} refs={}", stats.entries, stats.cells, stats.cell_refs);

    let cfg = BodyConfig {
        collision_mask: LayerMask::simple(PLAYER, WALL),
        key: Some(100),
        ..Default::default()
    };
    let shape = ColliderKind::Aabb { half_extents: Vec2::new(0.4, 0.8) };
    let mut body = match KinematicBody::new(shape, Vec2::new(0.0, 3.0), cfg) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("bad body config: {e}");
            return;
        }
    };

    let dt = body.config().dt;
    let run = Vec2::new(6.0, 0.0);
    let fall = Vec2::new(0.0, -9.0);
    for tick in 0..240 {
        let mut v = body.velocity();
        v.x = run.x;
        v.y = if body.is_on_floor() { -1.0 } else { v.y + fall.y * dt };
        body.move_and_slide(&world, v * dt);

        if tick % 20 == 0 || body.is_on_wall() {
            let c = body.contacts();
            let p = body.position();
            println!(
                "tick {tick:3}: pos=({:.2},{:.2}) vel=({:.2},{:.2}) floor={} wall={} ceiling={}",
                p.x,
                p.y,
                body.velocity().x,
                body.velocity().y,
                c.on_floor,
                c.on_wall,
                c.on_ceiling
            );
        }
        if body.is_on_wall() {
            println!("reached the far wall");
            break;
        }
    }

    // Tipping over against the far wall is refused
    let applied = body.rotate_by(&world, core::f32::consts::FRAC_PI_2);
    println!("rotation requested {:.3} applied {:.3}", core::f32::consts::FRAC_PI_2, applied);
}
