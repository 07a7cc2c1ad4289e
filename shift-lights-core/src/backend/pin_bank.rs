//! Use any `embedded-hal` output pins as a backend.
//!
//! The pins all need to be the same type. Most HALs have a type-erased pin for that
//! (`AnyPin`, `Output<'static>`, `CdevPin`, ...).
use embedded_hal::digital::OutputPin;
use heapless::Vec;
use thiserror::Error;

use super::{GpioBackend, LineId, PinState};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BankError<E> {
    #[error("line {0} is not in this pin bank")]
    UnknownLine(LineId),
    #[error("line {0} has not been configured as an output")]
    Unclaimed(LineId),
    #[error("line {0} is already in this pin bank")]
    DuplicateLine(LineId),
    #[error("pin bank is full")]
    Full,
    #[error("pin error: {0:?}")]
    Pin(E),
}

#[derive(Debug)]
struct BankLine<P> {
    line: LineId,
    pin: P,
    claimed: bool,
}

/// Up to `N` pins, each registered under a line id.
#[derive(Debug)]
pub struct PinBank<P, const N: usize> {
    lines: Vec<BankLine<P>, N>,
}

impl<P: OutputPin, const N: usize> Default for PinBank<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin, const N: usize> PinBank<P, N> {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn insert(&mut self, line: LineId, pin: P) -> Result<(), BankError<P::Error>> {
        if self.lines.iter().any(|x| x.line == line) {
            return Err(BankError::DuplicateLine(line));
        }

        self.lines
            .push(BankLine {
                line,
                pin,
                claimed: false,
            })
            .map_err(|_| BankError::Full)
    }

    pub fn with_line(mut self, line: LineId, pin: P) -> Result<Self, BankError<P::Error>> {
        self.insert(line, pin)?;
        Ok(self)
    }

    pub fn is_claimed(&self, line: LineId) -> bool {
        self.lines.iter().any(|x| x.line == line && x.claimed)
    }

    fn find(&mut self, line: LineId) -> Result<&mut BankLine<P>, BankError<P::Error>> {
        self.lines
            .iter_mut()
            .find(|x| x.line == line)
            .ok_or(BankError::UnknownLine(line))
    }
}

impl<P: OutputPin, const N: usize> GpioBackend for PinBank<P, N>
where
    P::Error: core::fmt::Debug,
{
    type Error = BankError<P::Error>;

    fn configure_output(&mut self, line: LineId) -> Result<(), Self::Error> {
        self.find(line)?.claimed = true;
        Ok(())
    }

    fn write_line(&mut self, line: LineId, state: PinState) -> Result<(), Self::Error> {
        let x = self.find(line)?;

        if !x.claimed {
            return Err(BankError::Unclaimed(line));
        }

        x.pin.set_state(state).map_err(BankError::Pin)
    }

    /// Every claimed pin is driven low. Keeps going after a failure and returns the first one.
    fn release_all(&mut self) -> Result<(), Self::Error> {
        let mut result = Ok(());

        for x in self.lines.iter_mut().filter(|x| x.claimed) {
            x.claimed = false;

            if let Err(err) = x.pin.set_low() {
                if result.is_ok() {
                    result = Err(BankError::Pin(err));
                }
            }
        }

        result
    }
}
