use core::time::Duration;

use crate::backend::LineId;
use crate::errors::ConfigError;
use crate::frame::MAX_WIDTH;

/// Which lines are wired to the chip. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinAssignment {
    /// serial input. DS on the chip
    data: LineId,
    /// SH_CP
    shift_clock: LineId,
    /// ST_CP
    store_clock: LineId,
    /// optional line that powers the chip. pulling it low is how we clear the chip
    power: Option<LineId>,
}

impl PinAssignment {
    pub const fn new(data: LineId, store_clock: LineId, shift_clock: LineId) -> Self {
        Self {
            data,
            shift_clock,
            store_clock,
            power: None,
        }
    }

    pub const fn with_power(self, power: LineId) -> Self {
        Self {
            power: Some(power),
            ..self
        }
    }

    pub const fn data(&self) -> LineId {
        self.data
    }

    pub const fn shift_clock(&self) -> LineId {
        self.shift_clock
    }

    pub const fn store_clock(&self) -> LineId {
        self.store_clock
    }

    pub const fn power(&self) -> Option<LineId> {
        self.power
    }

    /// data, shift clock, store clock, then power if there is one
    pub fn lines(&self) -> impl Iterator<Item = LineId> + '_ {
        [self.data, self.shift_clock, self.store_clock]
            .into_iter()
            .chain(self.power)
    }

    fn check_distinct(&self) -> Result<(), ConfigError> {
        for (i, a) in self.lines().enumerate() {
            if self.lines().skip(i + 1).any(|b| a == b) {
                return Err(ConfigError::DuplicateLine(a));
            }
        }
        Ok(())
    }
}

/// The wiring from the original breadboard demo.
impl Default for PinAssignment {
    fn default() -> Self {
        Self::new(4, 6, 5).with_power(17)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterConfig {
    pub pins: PinAssignment,
    /// number of outputs on the register
    pub width: usize,
    /// passed through to the backend. warn if a line is already in use
    pub warnings: bool,
}

impl RegisterConfig {
    pub const DEFAULT_WIDTH: usize = 8;

    pub const fn new(pins: PinAssignment) -> Self {
        Self {
            pins,
            width: Self::DEFAULT_WIDTH,
            warnings: false,
        }
    }

    pub const fn with_width(self, width: usize) -> Self {
        Self { width, ..self }
    }

    pub const fn with_warnings(self, warnings: bool) -> Self {
        Self { warnings, ..self }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.width > MAX_WIDTH {
            return Err(ConfigError::TooWide {
                width: self.width,
                max: MAX_WIDTH,
            });
        }
        self.pins.check_distinct()
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self::new(PinAssignment::default())
    }
}

/// Timings for the light shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowConfig {
    pub default_hold: Duration,
    /// skipping looks better fast
    pub skip_across_hold: Duration,
    /// the bit runs played while shutting down
    pub shutdown_hold: Duration,
    /// the looping skip across in the terminal demo
    pub demo_hold: Duration,
    /// the looping example show in the terminal demo
    pub show_hold: Duration,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            default_hold: Duration::from_millis(500),
            skip_across_hold: Duration::from_millis(50),
            shutdown_hold: Duration::from_millis(20),
            demo_hold: Duration::from_millis(130),
            show_hold: Duration::from_millis(40),
        }
    }
}
