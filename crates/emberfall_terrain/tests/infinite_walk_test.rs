//! # Infinite Walk Integration Test
//!
//! Proves the player can run right forever with ground always loaded
//! under them and a bounded chunk cache.

use std::time::Instant;

use emberfall_terrain::{ChunkState, TerrainConfig, TerrainStreamer};

fn config(seed: u64) -> TerrainConfig {
    let mut config = TerrainConfig::default();
    config.world.seed = seed;
    config
}

/// Test: Run 5,000 tiles without ever reaching an unloaded column.
#[test]
fn test_infinite_walk_5000_tiles() {
    let config = config(42);
    let window = (config.world.ahead_chunks + config.world.behind_chunks + 1) as usize;
    let mut streamer = TerrainStreamer::new(&config).unwrap();

    let start = Instant::now();
    let mut x = 0.0f32;
    for step in 0..5_000 {
        x += 1.0;
        streamer.tick(x);

        assert!(
            streamer.loaded_chunk_count() <= window,
            "cache grew to {} chunks at x={x}",
            streamer.loaded_chunk_count()
        );

        if step % 50 == 0 {
            let column = x as i32;
            let bedrock = streamer.tile_at(column, 0);
            assert!(
                bedrock.is_some_and(|t| t.is_solid()),
                "VOID DETECTED at x={x}"
            );
            assert!(streamer.surface_height_at_world_x(column).is_some(), "no surface at x={x}");
        }
    }

    let elapsed = start.elapsed();
    let stats = streamer.stats();
    println!("Walked 5,000 tiles in {elapsed:?}");
    println!("Loaded chunks: {}", streamer.loaded_chunk_count());
    println!("Generated total: {}", stats.generated_this_session);
    println!("Cleared total: {}", stats.cleared_this_session);

    let player_chunk = streamer.chunk_index_at(x);
    assert_eq!(streamer.chunk_state(player_chunk), ChunkState::Complete);
    assert_eq!(streamer.chunk_state(0), ChunkState::Cleared);
    assert_eq!(
        stats.generated_this_session - stats.cleared_this_session,
        streamer.loaded_chunk_count() as u64
    );
}

/// Test: Generation order never skips an index, even while teleporting.
#[test]
fn test_teleport_generates_every_index_in_between() {
    let mut streamer = TerrainStreamer::new(&config(7)).unwrap();
    streamer.tick(0.0);
    streamer.tick(2_000.0);

    let stats = streamer.stats();
    let last = streamer.loaded_indices().last().unwrap();
    assert_eq!(stats.generated_this_session, (last + 1) as u64);
    for index in 0..=last {
        assert_ne!(streamer.chunk_state(index), ChunkState::Ungenerated, "chunk {index} skipped");
    }
}

/// Test: A per-tick budget only delays generation.
#[test]
fn test_budgeted_streaming_catches_up() {
    let mut budgeted = config(99);
    budgeted.world.max_chunks_per_tick = 2;
    let mut slow = TerrainStreamer::new(&budgeted).unwrap();
    let mut fast = TerrainStreamer::new(&config(99)).unwrap();

    fast.tick(400.0);
    let mut ticks = 0;
    while slow.tick(400.0) > 0 {
        ticks += 1;
        assert!(slow.stats().generated_last_tick <= 2);
    }

    println!("Budgeted streamer caught up in {ticks} ticks");
    assert!(ticks > 1);
    let slow_loaded: Vec<i32> = slow.loaded_indices().collect();
    let fast_loaded: Vec<i32> = fast.loaded_indices().collect();
    assert_eq!(slow_loaded, fast_loaded);
    for index in fast_loaded {
        assert_eq!(slow.chunk(index), fast.chunk(index), "chunk {index} differs");
    }
}

/// Test: Walking left discards nothing ahead and regenerates nothing.
#[test]
fn test_backtracking_keeps_window() {
    let mut streamer = TerrainStreamer::new(&config(3)).unwrap();
    streamer.tick(300.0);
    let generated = streamer.stats().generated_this_session;

    streamer.tick(250.0);
    assert_eq!(streamer.stats().generated_this_session, generated);
    assert_eq!(streamer.stats().generated_last_tick, 0);
}
