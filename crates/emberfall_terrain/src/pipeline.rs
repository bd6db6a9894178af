//! # Pass Pipeline
//!
//! Owns the ordered pass list and turns a chunk index into a finished
//! chunk.
//!
//! ## Ordering Rules
//!
//! Order is a correctness dependency:
//! 1. `ground` runs first. It is the only pass that initializes surface
//!    heights.
//! 2. `gap` and `cave` remove ground, so they run before anything that
//!    reads heights (`ramp`, `platform`, spawn passes).
//! 3. `background` runs after `ground` and `platform`.
//! 4. Spawn passes (`enemy`, `emerald`, `trap`) run after every
//!    terrain-shaping pass.
//!
//! [`validate_order`] enforces these rules on pass names.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::chunk::Chunk;
use crate::context::GenerationContext;
use crate::error::{TerrainError, TerrainResult};
use crate::pass::Pass;
use crate::passes::{
    BackgroundPass, CavePass, EmeraldPass, EnemyPass, GapPass, GroundPass, PlatformPass, RampPass, TrapPass,
};

/// Passes that remove ground tiles.
const CARVERS: [&str; 2] = ["gap", "cave"];
/// Passes that read surface heights after carving.
const HEIGHT_READERS: [&str; 5] = ["ramp", "platform", "enemy", "emerald", "trap"];
/// Passes that place entities.
const SPAWNERS: [&str; 3] = ["enemy", "emerald", "trap"];
/// Passes that shape the tile matrices.
const SHAPERS: [&str; 6] = ["ground", "gap", "cave", "ramp", "platform", "background"];

fn order_error(pass: &str, reason: impl Into<String>) -> TerrainError {
    TerrainError::PassOrder {
        pass: pass.to_owned(),
        reason: reason.into(),
    }
}

/// Checks a pass name sequence against the ordering rules.
///
/// # Errors
///
/// Returns [`TerrainError::PassOrder`] for the first broken rule, including
/// a missing or misplaced ground pass and duplicate passes.
pub fn validate_order(names: &[&str]) -> TerrainResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(*name) {
            return Err(order_error(name, "appears more than once"));
        }
    }

    match names.first() {
        Some(&"ground") => {}
        Some(first) => return Err(order_error(first, "the ground pass must run first")),
        None => return Err(order_error("ground", "the pipeline has no ground pass")),
    }

    let position = |name: &str| names.iter().position(|n| *n == name);

    for carver in CARVERS {
        let Some(at) = position(carver) else { continue };
        if let Some(reader) = names[..at].iter().find(|n| HEIGHT_READERS.contains(n)) {
            return Err(order_error(carver, format!("must run before `{reader}`")));
        }
    }

    if let (Some(background), Some(platform)) = (position("background"), position("platform")) {
        if background < platform {
            return Err(order_error("background", "must run after `platform`"));
        }
    }

    for spawner in SPAWNERS {
        let Some(at) = position(spawner) else { continue };
        if let Some(shaper) = names[at..].iter().find(|n| SHAPERS.contains(n)) {
            return Err(order_error(spawner, format!("must run after `{shaper}`")));
        }
    }

    Ok(())
}

/// Ordered, individually switchable generation passes.
pub struct TerrainPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl TerrainPipeline {
    /// Builds a pipeline from passes in execution order.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::PassOrder`] if the order breaks a dependency.
    pub fn new(passes: Vec<Box<dyn Pass>>) -> TerrainResult<Self> {
        let names: Vec<&str> = passes.iter().map(|p| p.name()).collect();
        validate_order(&names)?;
        Ok(Self { passes })
    }

    /// The nine standard passes with default parameters.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            passes: vec![
                Box::new(GroundPass::default()),
                Box::new(GapPass::default()),
                Box::new(CavePass::default()),
                Box::new(RampPass::default()),
                Box::new(PlatformPass::default()),
                Box::new(BackgroundPass::default()),
                Box::new(TrapPass::default()),
                Box::new(EnemyPass::default()),
                Box::new(EmeraldPass::default()),
            ],
        }
    }

    /// Number of passes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Returns true if the pipeline has no passes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Pass names in execution order.
    #[must_use]
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Whether the named pass is enabled, or `None` if it is not present.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.passes.iter().find(|p| p.name() == name).map(|p| p.is_enabled())
    }

    /// Enables or disables the named pass. Returns false if it is not present.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.passes.iter_mut().find(|p| p.name() == name) {
            Some(pass) => {
                pass.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Drops every pass's cross-chunk running state.
    pub fn reset(&mut self) {
        for pass in &mut self.passes {
            pass.reset();
        }
    }

    /// Generates chunk `index` against the given neighbours.
    ///
    /// If the ground pass did not run (disabled), the remaining passes are
    /// skipped and the chunk is returned empty but complete.
    #[instrument(skip(self, ctx, left, right), fields(chunk = index))]
    pub fn generate(
        &mut self,
        ctx: &mut GenerationContext,
        index: i32,
        left: Option<Arc<Chunk>>,
        right: Option<Arc<Chunk>>,
    ) -> Chunk {
        ctx.begin_chunk(index, left, right);
        let mut chunk = Chunk::new(index, ctx.chunk_width(), ctx.chunk_height());

        for pass in &mut self.passes {
            if !pass.is_enabled() {
                trace!(pass = pass.name(), "pass disabled");
                continue;
            }
            if !chunk.metadata.ground_generated && pass.name() != "ground" {
                warn!(pass = pass.name(), "ground pass did not run, skipping remaining passes");
                break;
            }
            pass.execute(&mut chunk, ctx);
            trace!(pass = pass.name(), "pass executed");
        }

        chunk.metadata.is_complete = true;
        ctx.end_chunk();
        debug!(spawns = chunk.spawns.len(), "chunk generated");
        chunk
    }
}

impl Default for TerrainPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for TerrainPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainPipeline")
            .field("passes", &self.pass_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::WorldSeed;

    fn context() -> GenerationContext {
        GenerationContext::new(WorldSeed::new(42), 20, 25, 1.0)
    }

    #[test]
    fn test_standard_order_is_valid() {
        let pipeline = TerrainPipeline::standard();
        assert_eq!(pipeline.len(), 9);
        assert!(validate_order(&pipeline.pass_names()).is_ok());
    }

    #[test]
    fn test_order_violations() {
        let cases: [(&[&str], &str); 6] = [
            (&[], "ground"),
            (&["gap", "ground"], "gap"),
            (&["ground", "ramp", "cave"], "cave"),
            (&["ground", "background", "platform"], "background"),
            (&["ground", "enemy", "ramp"], "enemy"),
            (&["ground", "ramp", "ramp"], "ramp"),
        ];
        for (names, culprit) in cases {
            match validate_order(names) {
                Err(TerrainError::PassOrder { pass, .. }) => assert_eq!(pass, culprit, "{names:?}"),
                other => panic!("expected order error for {names:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_partial_pipelines_are_valid() {
        assert!(validate_order(&["ground"]).is_ok());
        assert!(validate_order(&["ground", "cave", "enemy"]).is_ok());
        assert!(validate_order(&["ground", "background"]).is_ok());
    }

    #[test]
    fn test_new_rejects_bad_order() {
        let passes: Vec<Box<dyn Pass>> = vec![Box::new(RampPass::default()), Box::new(GroundPass::default())];
        assert!(TerrainPipeline::new(passes).is_err());
    }

    #[test]
    fn test_generate_marks_complete_and_releases_neighbours() {
        let mut pipeline = TerrainPipeline::standard();
        let mut ctx = context();
        let left = Arc::new(pipeline.generate(&mut ctx, 0, None, None));
        let chunk = pipeline.generate(&mut ctx, 1, Some(Arc::clone(&left)), None);

        assert!(chunk.metadata.is_complete);
        assert!(chunk.metadata.ground_generated);
        assert_eq!(chunk.index(), 1);
        assert!(ctx.left_neighbor().is_none());
        assert_eq!(Arc::strong_count(&left), 1);
    }

    #[test]
    fn test_set_enabled_and_disabled_ground() {
        let mut pipeline = TerrainPipeline::standard();
        assert!(pipeline.set_enabled("ground", false));
        assert!(!pipeline.set_enabled("lava", false));
        assert_eq!(pipeline.is_enabled("ground"), Some(false));
        assert_eq!(pipeline.is_enabled("lava"), None);

        let chunk = pipeline.generate(&mut context(), 0, None, None);
        assert!(chunk.metadata.is_complete);
        assert!(chunk.tiles().all(|(_, _, t)| t.is_empty()));
        assert!(chunk.spawns.is_empty());
    }

    #[test]
    fn test_reset_restores_replay() {
        let mut pipeline = TerrainPipeline::standard();
        let mut ctx = context();
        let first: Vec<Chunk> = (0..3).map(|i| pipeline.generate(&mut ctx, i, None, None)).collect();

        pipeline.reset();
        ctx.reset();
        let second: Vec<Chunk> = (0..3).map(|i| pipeline.generate(&mut ctx, i, None, None)).collect();

        assert_eq!(first, second);
    }
}
