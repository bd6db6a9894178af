//! # EMBERFALL Headless Driver
//!
//! Terminal-only consumers of the terrain streamer.
//!
//! - `AsciiRenderer`: draws each chunk as text when it becomes ready

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ascii;

pub use ascii::{render_chunk, AsciiRenderer, RenderCounters};
