//! Cornell box example.
//!
//! Builds the Cornell box, ships it through a byte stream the way a device
//! backend would receive it, renders the decoded copy and saves a PPM.
//!
//! Usage: `cargo run --release --example cornell [config.json]`

use anyhow::Context;
use lumen_core::Stream;
use lumen_tracer::{cornell_camera, render, RenderConfig, Scene};
use std::sync::atomic::AtomicBool;

const SCENE_CAPACITY: usize = 1 << 16;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            RenderConfig::from_json(&json)?
        }
        None => RenderConfig {
            samples_per_pixel: 64,
            ..RenderConfig::default()
        },
    };

    let scene = Scene::cornell_box()?;
    let bytes = scene.to_stream(SCENE_CAPACITY)?.into_bytes();
    log::info!("Cornell box encodes to {} bytes", bytes.len());

    let mut buffer = bytes;
    let mut stream = Stream::filled(&mut buffer);
    let scene = Scene::deserialize(&mut stream)?;

    let camera = cornell_camera(400, 400);
    let image = render(&scene, &camera, &config, &AtomicBool::new(false))?;

    let filename = "cornell.ppm";
    std::fs::write(filename, image.to_ppm()).with_context(|| format!("writing {filename}"))?;
    log::info!("Saved to {filename}");
    Ok(())
}
