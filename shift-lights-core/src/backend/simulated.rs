//! A 74HC595 in software.
//!
//! The handle is cheap to clone and every clone sees the same chip. Hand one clone to the
//! [`crate::RegisterController`] and keep another to look at the lines and outputs, even after
//! the controller is dropped.
//!
//! Output index 0 is the last stage of the chain, so after `width` shifts the first bit shifted
//! in sits on output 0.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use super::{GpioBackend, LineId, PinState};
use crate::config::PinAssignment;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("line {0} has not been configured as an output")]
    Unclaimed(LineId),
    #[error("injected fault on line {0}")]
    Injected(LineId),
}

#[derive(Debug)]
struct Chip {
    pins: PinAssignment,
    /// claimed lines and their current level
    levels: BTreeMap<LineId, PinState>,
    powered: bool,
    stages: Vec<u8>,
    outputs: Vec<u8>,
    commits: Vec<Vec<u8>>,
    events: Vec<(LineId, PinState)>,
    warnings: Option<bool>,
    releases: usize,
    fail_next: Option<LineId>,
}

impl Chip {
    fn level(&self, line: LineId) -> PinState {
        self.levels.get(&line).copied().unwrap_or(PinState::Low)
    }

    fn on_write(&mut self, line: LineId, previous: PinState, state: PinState) {
        let rising = previous == PinState::Low && state == PinState::High;

        if Some(line) == self.pins.power() {
            match state {
                PinState::Low => {
                    self.powered = false;
                    self.stages.fill(0);
                }
                PinState::High => self.powered = true,
            }
            return;
        }

        if !rising || !self.powered {
            return;
        }

        if line == self.pins.shift_clock() {
            let bit = match self.level(self.pins.data()) {
                PinState::High => 1,
                PinState::Low => 0,
            };
            if !self.stages.is_empty() {
                self.stages.remove(0);
                self.stages.push(bit);
            }
        } else if line == self.pins.store_clock() {
            self.outputs.clone_from(&self.stages);
            self.commits.push(self.outputs.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedRegister {
    chip: Rc<RefCell<Chip>>,
}

impl SimulatedRegister {
    pub fn new(pins: PinAssignment, width: usize) -> Self {
        let chip = Chip {
            pins,
            levels: BTreeMap::new(),
            // without a power line the chip is wired to a constant supply
            powered: pins.power().is_none(),
            stages: vec![0; width],
            outputs: vec![0; width],
            commits: Vec::new(),
            events: Vec::new(),
            warnings: None,
            releases: 0,
            fail_next: None,
        };

        Self {
            chip: Rc::new(RefCell::new(chip)),
        }
    }

    /// The parallel outputs. Only changes on a store clock pulse.
    pub fn outputs(&self) -> Vec<u8> {
        self.chip.borrow().outputs.clone()
    }

    /// The internal shift register. Not visible on the outputs until committed.
    pub fn stages(&self) -> Vec<u8> {
        self.chip.borrow().stages.clone()
    }

    /// The outputs after every store clock pulse, oldest first.
    pub fn commits(&self) -> Vec<Vec<u8>> {
        self.chip.borrow().commits.clone()
    }

    pub fn clear_commits(&self) {
        self.chip.borrow_mut().commits.clear();
    }

    /// Every successful line write, oldest first.
    pub fn events(&self) -> Vec<(LineId, PinState)> {
        self.chip.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.chip.borrow_mut().events.clear();
    }

    /// None if the line is not claimed.
    pub fn level(&self, line: LineId) -> Option<PinState> {
        self.chip.borrow().levels.get(&line).copied()
    }

    pub fn is_claimed(&self, line: LineId) -> bool {
        self.chip.borrow().levels.contains_key(&line)
    }

    pub fn claimed_lines(&self) -> Vec<LineId> {
        self.chip.borrow().levels.keys().copied().collect()
    }

    pub fn is_powered(&self) -> bool {
        self.chip.borrow().powered
    }

    /// How many times `release_all` has been called.
    pub fn release_count(&self) -> usize {
        self.chip.borrow().releases
    }

    /// The last toggle passed to `set_warnings`.
    pub fn warnings(&self) -> Option<bool> {
        self.chip.borrow().warnings
    }

    /// The next write to `line` fails without changing the line. Only fires once.
    pub fn fail_next_write(&self, line: LineId) {
        self.chip.borrow_mut().fail_next = Some(line);
    }
}

impl GpioBackend for SimulatedRegister {
    type Error = SimError;

    fn set_warnings(&mut self, enabled: bool) {
        self.chip.borrow_mut().warnings = Some(enabled);
    }

    fn configure_output(&mut self, line: LineId) -> Result<(), Self::Error> {
        self.chip
            .borrow_mut()
            .levels
            .entry(line)
            .or_insert(PinState::Low);
        Ok(())
    }

    fn write_line(&mut self, line: LineId, state: PinState) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();

        if chip.fail_next == Some(line) {
            chip.fail_next = None;
            return Err(SimError::Injected(line));
        }

        let previous = match chip.levels.get_mut(&line) {
            Some(level) => core::mem::replace(level, state),
            None => return Err(SimError::Unclaimed(line)),
        };

        chip.events.push((line, state));
        chip.on_write(line, previous, state);

        Ok(())
    }

    fn release_all(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        chip.levels.clear();
        chip.releases += 1;
        Ok(())
    }
}
