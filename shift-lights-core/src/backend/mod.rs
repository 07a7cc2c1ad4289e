//! Whatever actually moves the pins. Real hardware, the simulator, or a test double.
//!
//! The register only needs three things from a backend: claim a line as an output, write a
//! level to it, and give every line back.

mod pin_bank;
#[cfg(feature = "std")]
mod simulated;

pub use embedded_hal::digital::PinState;
pub use pin_bank::{BankError, PinBank};
#[cfg(feature = "std")]
pub use simulated::{SimError, SimulatedRegister};

/// A GPIO line number. BCM numbering on a Raspberry Pi.
pub type LineId = u8;

pub trait GpioBackend {
    type Error: core::fmt::Debug;

    /// Called once before any line is configured.
    fn set_warnings(&mut self, _enabled: bool) {}

    fn configure_output(&mut self, line: LineId) -> Result<(), Self::Error>;

    fn write_line(&mut self, line: LineId, state: PinState) -> Result<(), Self::Error>;

    /// Give every configured line back. Lines are unclaimed afterwards.
    fn release_all(&mut self) -> Result<(), Self::Error>;
}
