//! Real pins on a Raspberry Pi header. BCM numbering.
use std::collections::BTreeMap;

use log::{debug, warn};
use rppal::gpio::{Error, Gpio, Level, OutputPin};
use shift_lights_core::backend::{GpioBackend, LineId, PinState};

pub struct RppalBackend {
    gpio: Gpio,
    pins: BTreeMap<LineId, OutputPin>,
    warnings: bool,
}

impl RppalBackend {
    pub fn try_new() -> Result<Self, Error> {
        let gpio = Gpio::new()?;

        Ok(Self {
            gpio,
            pins: BTreeMap::new(),
            warnings: false,
        })
    }
}

impl GpioBackend for RppalBackend {
    type Error = Error;

    fn set_warnings(&mut self, enabled: bool) {
        self.warnings = enabled;
    }

    fn configure_output(&mut self, line: LineId) -> Result<(), Self::Error> {
        if self.pins.contains_key(&line) {
            return Ok(());
        }

        let pin = match self.gpio.get(line) {
            Ok(x) => x,
            Err(err) => {
                if self.warnings && matches!(err, Error::PinUsed(_)) {
                    warn!("line {} is already in use", line);
                }
                return Err(err);
            }
        };

        let mut pin = pin.into_output_low();
        pin.set_reset_on_drop(true);

        debug!("claimed line {}", line);
        self.pins.insert(line, pin);

        Ok(())
    }

    fn write_line(&mut self, line: LineId, state: PinState) -> Result<(), Self::Error> {
        let pin = self
            .pins
            .get_mut(&line)
            .ok_or(Error::PinNotAvailable(line))?;

        pin.write(match state {
            PinState::High => Level::High,
            PinState::Low => Level::Low,
        });

        Ok(())
    }

    /// Dropping the pins puts them back the way we found them.
    fn release_all(&mut self) -> Result<(), Self::Error> {
        self.pins.clear();
        Ok(())
    }
}
