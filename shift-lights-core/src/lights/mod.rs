//! Patterns for a single row of lights.
//!
//! Ideas for more patterns:
//! - A bouncing ball that slows down each time it hits the edge
//! - Count up in binary

mod pattern;
mod sequencer;
mod show;

pub use pattern::{Pattern, PatternFrames};
pub use sequencer::PatternSequencer;
