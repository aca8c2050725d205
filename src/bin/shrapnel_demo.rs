//! Headless shrapnel demo
//!
//! Loads a mesh, runs a scripted sequence of frames (spin, explode,
//! subdivide, explode again) against the in-memory backend and logs what
//! the renderer uploaded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use shrapnel_engine::renderer::{self, FixedCamera, HeadlessBackend};
use shrapnel_engine::world;
use shrapnel_engine::{geometry, EngineConfig};

const VERTEX_SHADER: &str = include_str!("../../assets/shaders/shrapnel.vert");
const FRAGMENT_SHADER: &str = include_str!("../../assets/shaders/shrapnel.frag");

/// Run the shrapnel engine headlessly.
#[derive(Parser, Debug)]
#[command(name = "shrapnel_demo", about = "Headless mesh subdivision and explosion demo", version)]
struct Args {
    /// Mesh file in the OBJ face format
    #[arg(default_value = "assets/models/cube.obj")]
    mesh: PathBuf,

    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames to simulate
    #[arg(long, default_value = "240")]
    frames: u64,

    /// Seconds per frame
    #[arg(long, default_value = "0.016")]
    step: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mesh_text = std::fs::read_to_string(&args.mesh)
        .with_context(|| format!("reading mesh {}", args.mesh.display()))?;

    let mut backend = HeadlessBackend::new();
    let shader = renderer::compile_shader(&mut backend, VERTEX_SHADER, FRAGMENT_SHADER)?;
    let mut scene = world::create_world(config, &mut backend, shader, &mesh_text)?;
    let camera = FixedCamera::default();

    let frames = args.frames.max(1);
    for frame in 0..frames {
        if frame == frames / 4 {
            world::explode(&mut scene);
            log::info!("[main] Frame {}: explode", frame);
        } else if frame == frames / 2 {
            let subdivided = world::subdivide(&mut scene);
            log::info!(
                "[main] Frame {}: subdivide ({}), {} vertices per instance",
                frame,
                if subdivided { "applied" } else { "at maximum" },
                geometry::number_of_vertices(&scene.geometry)
            );
        } else if frame == frames * 3 / 4 {
            world::explode(&mut scene);
            log::info!("[main] Frame {}: explode", frame);
        }

        world::update_world(&mut scene, args.step);
        world::render_world(&mut scene, &mut backend, &camera)?;
    }

    let stats = scene.renderer.stats;
    log::info!(
        "[main] {} frames, {} uploads ({} bytes), {} indices drawn",
        stats.frames,
        stats.uploads,
        stats.bytes_uploaded,
        stats.indices_drawn
    );
    log::info!("[main] {}", geometry::geometry_stats(&scene.geometry));

    world::destroy_world(&mut scene, &mut backend);
    Ok(())
}
