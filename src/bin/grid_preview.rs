//! Grid preview - renders occupancy grid messages to PNG without a GPU.
//!
//! Usage: cargo run --release --bin grid_preview -- --map <FILE> [OPTIONS]
//!
//! Options:
//!   --map <FILE>      Grid message JSON used to build the node (required)
//!   --update <FILE>   Grid message JSON applied as an update (repeatable)
//!   --config <FILE>   GridConfig JSON (default: built-in defaults)
//!   --out <PREFIX>    Output prefix (default: "grid")
//!
//! Writes `<PREFIX>_color.png` and `<PREFIX>_displacement.png` from the
//! texture contents after the last update has been flushed.

use std::path::PathBuf;
use std::time::Instant;

use occugrid::core::error::Error;
use occugrid::core::Result;
use occugrid::grid::{GridConfig, GridMessage};
use occugrid::render::{CpuBackend, CpuHandle, OccupancyGridNode};

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(map) = parse_str_arg(&args, "--map").map(PathBuf::from) else {
        print_usage();
        std::process::exit(2);
    };
    let updates: Vec<PathBuf> = parse_all_str_args(&args, "--update")
        .into_iter()
        .map(PathBuf::from)
        .collect();
    let out = parse_str_arg(&args, "--out").unwrap_or_else(|| "grid".to_string());

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => GridConfig::from_json_file(path)?,
        None => GridConfig::default(),
    };

    println!("=== Occupancy Grid Preview ===");
    println!("Map:     {}", map.display());
    println!("Updates: {}", updates.len());
    println!("Output:  {}_*.png", out);
    println!();

    let message = GridMessage::from_json_file(&map)?;
    let backend = CpuBackend::new();
    let observer = backend.clone();

    let start = Instant::now();
    let mut node = OccupancyGridNode::new(backend, &message, config)?;
    log::info!("Built node in {:.2?}", start.elapsed());

    for path in &updates {
        let update = GridMessage::from_json_file(path)?;
        let start = Instant::now();
        node.update(&update)?;
        node.flush_uploads()?;
        log::info!("Applied {} in {:.2?}", path.display(), start.elapsed());
    }

    let counts = node.state().counts();
    let t = node.transform();
    println!("Grid:      {}x{}", node.width(), node.height());
    println!("Free:      {}", counts.free);
    println!("Occupied:  {}", counts.occupied);
    println!("Unknown:   {}", counts.unknown);
    println!(
        "Position:  ({:.3}, {:.3}, {:.3})  scale {:.3}",
        t.position.x, t.position.y, t.position.z, t.scale.x
    );

    let resources = node.resources()?;
    save_texture(
        &observer,
        &resources.color_texture,
        node.width(),
        node.height(),
        &format!("{}_color.png", out),
    )?;
    save_texture(
        &observer,
        &resources.displacement_texture,
        node.width(),
        node.height(),
        &format!("{}_displacement.png", out),
    )?;

    node.dispose()?;
    let stats = observer.stats();
    println!(
        "Resources: {} created, {} released, {} texture uploads",
        stats.created.total(),
        stats.released.total(),
        stats.texture_uploads
    );
    Ok(())
}

fn save_texture(
    backend: &CpuBackend,
    handle: &CpuHandle,
    width: u32,
    height: u32,
    path: &str,
) -> Result<()> {
    let rgba = backend
        .texture_rgba(handle)
        .ok_or_else(|| Error::Export(format!("texture for {} is not live", path)))?;
    let image = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        Error::Export(format!("texture size does not match {}x{}", width, height))
    })?;
    image.save(path).map_err(|e| Error::Export(e.to_string()))?;
    println!("Saved {}", path);
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: grid_preview --map <FILE> [OPTIONS]");
    eprintln!();
    eprintln!("  --map <FILE>      Grid message JSON used to build the node (required)");
    eprintln!("  --update <FILE>   Grid message JSON applied as an update (repeatable)");
    eprintln!("  --config <FILE>   GridConfig JSON (default: built-in defaults)");
    eprintln!("  --out <PREFIX>    Output prefix (default: \"grid\")");
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_all_str_args(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}
