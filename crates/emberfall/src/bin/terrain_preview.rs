//! # Terrain Preview
//!
//! Streams a simulated run through the terrain generator and prints every
//! chunk as ASCII the moment it becomes ready.
//!
//! ```text
//! terrain_preview --seed 42 --distance 400 --step 5
//! terrain_preview --config emberfall.toml
//! terrain_preview --dump-config > emberfall.toml
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use emberfall::AsciiRenderer;
use emberfall_terrain::{TerrainConfig, TerrainResult, TerrainStreamer};

#[derive(Parser, Debug)]
#[command(name = "terrain_preview", about = "Stream EMBERFALL terrain and print it as ASCII")]
struct Cli {
    /// TOML config file (defaults to the built-in nine-pass pipeline)
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// World seed; overrides the config. 0 picks a random seed
    #[arg(long, short)]
    seed: Option<u64>,
    /// How far the simulated player runs, in world units
    #[arg(long, short, default_value_t = 200.0)]
    distance: f32,
    /// Player movement per tick, in world units
    #[arg(long, default_value_t = 4.0)]
    step: f32,
    /// Print the effective config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn load_config(cli: &Cli) -> TerrainResult<TerrainConfig> {
    let mut config = match &cli.config {
        Some(path) => TerrainConfig::from_path(path)?,
        None => TerrainConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.world.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> TerrainResult<()> {
    let config = load_config(cli)?;
    if cli.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let mut streamer = TerrainStreamer::new(&config)?;
    let renderer = AsciiRenderer::new(io::stdout());
    let counters = renderer.counters();
    streamer.set_renderer(Box::new(renderer));

    println!("EMBERFALL terrain preview");
    println!("  seed:     {}", streamer.seed().value());
    println!("  chunk:    {}x{}", config.world.chunk_width, config.world.chunk_height);
    println!("  passes:   {}", streamer.pipeline().pass_names().join(", "));
    println!("  distance: {} (step {})", cli.distance, cli.step);
    println!();

    let start = Instant::now();
    let step = cli.step.max(f32::EPSILON);
    let mut x = 0.0f32;
    let mut ticks = 0u64;
    loop {
        streamer.tick(x);
        ticks += 1;
        if x >= cli.distance {
            break;
        }
        x = (x + step).min(cli.distance);
    }
    let elapsed = start.elapsed();

    let stats = streamer.stats();
    let spawns: usize = streamer
        .loaded_indices()
        .filter_map(|i| streamer.chunk(i))
        .map(|c| c.spawns.len())
        .sum();
    println!();
    println!("Ran {} world units in {ticks} ticks ({elapsed:?})", cli.distance);
    println!("Generated: {}", stats.generated_this_session);
    println!("Cleared:   {}", stats.cleared_this_session);
    println!("Cached:    {} (spawns in cache: {spawns})", stats.cached_chunks);
    if let Ok(drawn) = counters.lock() {
        println!("Drawn:     {}", drawn.drawn);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("terrain_preview: {err}");
            ExitCode::FAILURE
        }
    }
}
