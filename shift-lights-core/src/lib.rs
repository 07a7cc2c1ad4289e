//! Drive a 74HC595-family shift register one bit at a time and play light patterns on it.
//!
//! [`RegisterController`] turns register operations (set a bit, pulse a clock, latch, clear)
//! into line writes on a [`GpioBackend`]. [`lights::PatternSequencer`] builds frames and plays
//! them through a controller.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(any(feature = "log", feature = "defmt")))]
compile_error!("enable the 'log' or 'defmt' feature so the driver has somewhere to log");

pub mod backend;
pub mod config;
pub mod errors;
pub mod frame;
pub mod lights;
pub mod logging;
pub mod register;

pub use backend::{GpioBackend, LineId};
pub use config::{PinAssignment, RegisterConfig, ShowConfig};
pub use errors::{ConfigError, FrameError, ShiftError, ShiftResult};
pub use frame::{Direction, Frame, MAX_WIDTH};
pub use lights::{Pattern, PatternSequencer};
pub use register::RegisterController;
