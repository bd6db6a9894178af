//! # Pass Interface
//!
//! A pass is one ordered transformation stage: it receives the chunk under
//! construction and the shared context, reads what earlier passes wrote,
//! and writes its own tiles and metadata in place.
//!
//! Passes are plain data plus an `execute` method. They may keep running
//! state across consecutive chunks (a plateau in progress, the world column
//! of the last spawn); that state is cleared only by [`Pass::reset`], which
//! the pipeline calls on full regeneration.

use crate::chunk::Chunk;
use crate::context::GenerationContext;

/// A named, individually switchable generation stage.
pub trait Pass: Send {
    /// Stable name used in logs, config and live tuning.
    fn name(&self) -> &'static str;

    /// Disabled passes are skipped by the pipeline.
    fn is_enabled(&self) -> bool;

    /// Turns the pass on or off.
    fn set_enabled(&mut self, enabled: bool);

    /// Transforms `chunk` in place.
    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext);

    /// Drops cross-chunk running state.
    fn reset(&mut self) {}
}

/// RNG stream salts, one per pass, so passes never share random draws.
pub(crate) mod salt {
    pub const GROUND: u64 = 0x47_52_4F_55_4E_44;
    pub const GAP: u64 = 0x47_41_50;
    pub const PLATFORM: u64 = 0x50_4C_41_54;
    pub const ENEMY: u64 = 0x45_4E_45_4D_59;
    pub const EMERALD: u64 = 0x45_4D_45_52;
    pub const TRAP: u64 = 0x54_52_41_50;
}
