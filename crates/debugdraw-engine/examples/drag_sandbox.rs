//! Interactive drag sandbox -- grab bodies with the mouse or a finger.
//!
//! Run with:
//!   cargo run --example drag_sandbox --features renderer -p debugdraw-engine
//!
//! Pass a JSON config path as the first argument to override the defaults.
//!
//! Controls:
//!   Left mouse button / touch -- drag a body
//!   Escape -- quit

use debugdraw_engine::prelude::*;
use debugdraw_engine::render::run_windowed;

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

fn build_scene(world: &mut PhysicsWorld) -> Result<(), PhysicsError> {
    // Ground and walls: static, never grabbable.
    world.add_body(
        &BodyDesc::fixed(ColliderShape::Box {
            half_width: 450.0,
            half_height: 10.0,
        })
        .at(Vec2::new(0.0, -10.0)),
    )?;
    for x in [-460.0, 460.0] {
        world.add_body(
            &BodyDesc::fixed(ColliderShape::Box {
                half_width: 10.0,
                half_height: 300.0,
            })
            .at(Vec2::new(x, 290.0)),
        )?;
    }
    world.add_body(
        &BodyDesc::fixed(ColliderShape::Segment {
            a: Vec2::new(-440.0, 200.0),
            b: Vec2::new(-250.0, 120.0),
        }),
    )?;

    // A pyramid of boxes.
    let mut tag = 1;
    for row in 0..6 {
        for col in 0..(6 - row) {
            let x = -150.0 + f64::from(col) * 42.0 + f64::from(row) * 21.0;
            let y = 20.0 + f64::from(row) * 41.0;
            world.add_body(
                &BodyDesc::dynamic(ColliderShape::Box {
                    half_width: 20.0,
                    half_height: 20.0,
                })
                .at(Vec2::new(x, y))
                .with_user_data(tag),
            )?;
            tag += 1;
        }
    }

    // Loose shapes to play with.
    for i in 0..5 {
        let x = 150.0 + f64::from(i) * 50.0;
        world.add_body(
            &BodyDesc::dynamic(ColliderShape::Ball { radius: 18.0 })
                .at(Vec2::new(x, 300.0))
                .with_user_data(tag),
        )?;
        tag += 1;
    }
    world.add_body(
        &BodyDesc::dynamic(ColliderShape::Capsule {
            a: Vec2::new(-30.0, 0.0),
            b: Vec2::new(30.0, 0.0),
            radius: 12.0,
        })
        .at(Vec2::new(250.0, 400.0)),
    )?;
    world.add_body(
        &BodyDesc::dynamic(ColliderShape::RoundPolygon {
            vertices: vec![
                Vec2::new(-30.0, -20.0),
                Vec2::new(30.0, -20.0),
                Vec2::new(0.0, 30.0),
            ],
            border_radius: 6.0,
        })
        .at(Vec2::new(-300.0, 350.0)),
    )?;

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if config.view.camera_offset == Vec2::ZERO {
        config.view.camera_offset = Vec2::new(0.0, 250.0);
    }

    let mut world = PhysicsWorld::from_config(&config.physics);
    build_scene(&mut world)?;
    tracing::info!(bodies = world.body_count(), "scene built");

    let frame_loop = FrameLoop::new(world, config)?;
    run_windowed(frame_loop, "debugdraw -- drag bodies, ESC to quit", 1024, 768)
}
