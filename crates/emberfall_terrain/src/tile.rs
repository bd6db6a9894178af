//! # Tile Model
//!
//! The atomic cell of the level grid.
//!
//! Tiles are plain `Copy` values: a kind, the layer that owns them, an
//! optional cosmetic overlay id, a height level and a small flag set.
//! They carry no identity and are copied freely between passes.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// What occupies a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Nothing. Air.
    #[default]
    Empty,
    /// Solid ground.
    Solid,
    /// Slope rising toward +x.
    RampUp,
    /// Slope falling toward +x.
    RampDown,
    /// Ground deliberately removed to form a pit.
    ExplicitGap,
    /// Solid floating platform.
    PlatformSolid,
}

/// Which logical layer a tile belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileLayer {
    /// Unassigned (air).
    #[default]
    None,
    /// Terrain mass written by the ground pass.
    Ground,
    /// Floating platforms.
    Platform,
    /// Decorative front layer.
    Foreground,
    /// Decorative backdrop with no collision.
    Background,
}

/// Bit set of per-tile markers.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileFlags(u8);

impl TileFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Edited at runtime after generation.
    pub const MODIFIED: Self = Self(1);
    /// Cannot be carved, damaged or replaced by later passes.
    pub const PROTECTED: Self = Self(1 << 1);
    /// Left face is exposed.
    pub const EDGE_LEFT: Self = Self(1 << 2);
    /// Right face is exposed.
    pub const EDGE_RIGHT: Self = Self(1 << 3);
    /// Top face is exposed (walkable surface).
    pub const EDGE_TOP: Self = Self(1 << 4);

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the flags in `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the flags in `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Returns true if no flag is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TileFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TileFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for TileFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(TileFlags, &str); 5] = [
            (TileFlags::MODIFIED, "MODIFIED"),
            (TileFlags::PROTECTED, "PROTECTED"),
            (TileFlags::EDGE_LEFT, "EDGE_LEFT"),
            (TileFlags::EDGE_RIGHT, "EDGE_RIGHT"),
            (TileFlags::EDGE_TOP, "EDGE_TOP"),
        ];
        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "TileFlags({})", set.join(" | "))
    }
}

/// A single cell of the level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    /// What occupies the cell.
    pub kind: TileKind,
    /// Owning layer.
    pub layer: TileLayer,
    /// Cosmetic override id for the renderer. Never affects gameplay.
    pub overlay: Option<u16>,
    /// Height level recorded by the writing pass (surface row for ground).
    pub height_level: i16,
    /// Marker bits.
    pub flags: TileFlags,
}

impl Tile {
    /// Air. Returned for every out-of-range read.
    pub const EMPTY: Self = Self {
        kind: TileKind::Empty,
        layer: TileLayer::None,
        overlay: None,
        height_level: 0,
        flags: TileFlags::NONE,
    };

    /// Creates a tile of the given kind and layer.
    #[inline]
    #[must_use]
    pub const fn new(kind: TileKind, layer: TileLayer) -> Self {
        Self {
            kind,
            layer,
            overlay: None,
            height_level: 0,
            flags: TileFlags::NONE,
        }
    }

    /// Solid ground tile.
    #[inline]
    #[must_use]
    pub const fn ground() -> Self {
        Self::new(TileKind::Solid, TileLayer::Ground)
    }

    /// Solid platform tile.
    #[inline]
    #[must_use]
    pub const fn platform() -> Self {
        Self::new(TileKind::PlatformSolid, TileLayer::Platform)
    }

    /// Rising ramp on the ground layer.
    #[inline]
    #[must_use]
    pub const fn ramp_up() -> Self {
        Self::new(TileKind::RampUp, TileLayer::Ground)
    }

    /// Falling ramp on the ground layer.
    #[inline]
    #[must_use]
    pub const fn ramp_down() -> Self {
        Self::new(TileKind::RampDown, TileLayer::Ground)
    }

    /// Explicit pit cell on the ground layer.
    #[inline]
    #[must_use]
    pub const fn gap() -> Self {
        Self::new(TileKind::ExplicitGap, TileLayer::Ground)
    }

    /// Backdrop cell for the background matrix.
    #[inline]
    #[must_use]
    pub const fn backdrop() -> Self {
        Self::new(TileKind::Solid, TileLayer::Background)
    }

    /// Returns a copy with the given flags added.
    #[inline]
    #[must_use]
    pub fn with_flags(mut self, flags: TileFlags) -> Self {
        self.flags.insert(flags);
        self
    }

    /// Returns a copy with a cosmetic overlay id.
    #[inline]
    #[must_use]
    pub const fn with_overlay(mut self, overlay: u16) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Returns a copy with the given height level.
    #[inline]
    #[must_use]
    pub const fn with_height_level(mut self, level: i16) -> Self {
        self.height_level = level;
        self
    }

    /// Empty or explicit gap.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self.kind, TileKind::Empty | TileKind::ExplicitGap)
    }

    /// Ground or platform solid.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self.kind, TileKind::Solid | TileKind::PlatformSolid)
    }

    /// Either ramp orientation.
    #[inline]
    #[must_use]
    pub const fn is_ramp(self) -> bool {
        matches!(self.kind, TileKind::RampUp | TileKind::RampDown)
    }

    /// Solid or ramp.
    #[inline]
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        self.is_solid() || self.is_ramp()
    }

    /// Explicit pit cell.
    #[inline]
    #[must_use]
    pub const fn is_gap(self) -> bool {
        matches!(self.kind, TileKind::ExplicitGap)
    }

    /// Carries the protected flag.
    #[inline]
    #[must_use]
    pub const fn is_protected(self) -> bool {
        self.flags.contains(TileFlags::PROTECTED)
    }
}
