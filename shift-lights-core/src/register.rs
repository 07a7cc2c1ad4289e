//! Low level control of a 74HC595 shift register.
//!
//! Loading, clearing, and outputting data all happen here. Bits are shifted in on the rising
//! edge of the shift clock (SH_CP) and copied to the parallel outputs on the rising edge of the
//! store clock (ST_CP).
//!
//! The chip can be powered from a constant supply or from one of the GPIO lines. That only
//! changes how the register is cleared.
use crate::backend::{GpioBackend, LineId, PinState};
use crate::config::{PinAssignment, RegisterConfig};
use crate::errors::{ShiftError, ShiftResult};
use crate::frame::Frame;
use crate::logging::{debug, error, trace, warn};

/// Owns the register's lines from `new` until `release` (or drop).
pub struct RegisterController<B: GpioBackend> {
    backend: B,
    pins: PinAssignment,
    width: usize,
    released: bool,
}

impl<B: GpioBackend> RegisterController<B> {
    /// Claims the lines and gives them their default values. Clocks and data low, power high.
    ///
    /// If the backend fails part way through, whatever it already claimed is released again.
    pub fn new(mut backend: B, config: RegisterConfig) -> ShiftResult<Self, B::Error> {
        config.validate()?;

        backend.set_warnings(config.warnings);

        if let Err(err) = Self::init_lines(&mut backend, &config.pins) {
            if backend.release_all().is_err() {
                error!("failed to release lines after a failed init");
            }
            return Err(err);
        }

        debug!(
            "shift register ready. width={} data={} shift={} store={}",
            config.width,
            config.pins.data(),
            config.pins.shift_clock(),
            config.pins.store_clock()
        );

        Ok(Self {
            backend,
            pins: config.pins,
            width: config.width,
            released: false,
        })
    }

    fn init_lines(backend: &mut B, pins: &PinAssignment) -> ShiftResult<(), B::Error> {
        for line in pins.lines() {
            backend
                .configure_output(line)
                .map_err(|error| ShiftError::BackendIo { line, error })?;
        }

        if let Some(power) = pins.power() {
            Self::drive(backend, power, PinState::High)?;
        }
        Self::drive(backend, pins.shift_clock(), PinState::Low)?;
        Self::drive(backend, pins.store_clock(), PinState::Low)?;
        Self::drive(backend, pins.data(), PinState::Low)?;

        Ok(())
    }

    fn drive(backend: &mut B, line: LineId, state: PinState) -> ShiftResult<(), B::Error> {
        backend
            .write_line(line, state)
            .map_err(|error| ShiftError::BackendIo { line, error })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn pins(&self) -> &PinAssignment {
        &self.pins
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn write(&mut self, line: LineId, state: PinState) -> ShiftResult<(), B::Error> {
        Self::drive(&mut self.backend, line, state)
    }

    fn pulse(&mut self, line: LineId) -> ShiftResult<(), B::Error> {
        self.write(line, PinState::High)?;
        self.write(line, PinState::Low)
    }

    /// Put `value` on the data line. Anything besides 0 or 1 is rejected before the line is
    /// touched.
    pub fn set_bit(&mut self, value: u8) -> ShiftResult<(), B::Error> {
        let state = match value {
            0 => PinState::Low,
            1 => PinState::High,
            x => return Err(ShiftError::InvalidBit(x)),
        };

        self.write(self.pins.data(), state)
    }

    /// Shift whatever is on the data line into the register.
    ///
    /// Call this exactly once per bit, right after [`Self::set_bit`].
    pub fn pulse_shift_clock(&mut self) -> ShiftResult<(), B::Error> {
        self.pulse(self.pins.shift_clock())
    }

    /// Pull the data line back to 0. The chip doesn't need this, but it keeps every load
    /// starting from the same place.
    pub fn clear_data_line(&mut self) -> ShiftResult<(), B::Error> {
        self.write(self.pins.data(), PinState::Low)
    }

    /// Shift in every bit, `frame[0]` first. Nothing shows on the outputs until
    /// [`Self::commit_output`].
    pub fn load_frame(&mut self, frame: &Frame) -> ShiftResult<(), B::Error> {
        if frame.len() != self.width {
            return Err(ShiftError::FrameWidth {
                expected: self.width,
                actual: frame.len(),
            });
        }

        trace!("loading {:?}", frame.bits());

        for &bit in frame.bits() {
            self.set_bit(bit)?;
            self.pulse_shift_clock()?;
            self.clear_data_line()?;
        }

        Ok(())
    }

    /// Validate raw bits and then load them.
    pub fn load_bits(&mut self, bits: &[u8]) -> ShiftResult<(), B::Error> {
        let frame = Frame::try_from_bits(bits)?;
        self.load_frame(&frame)
    }

    /// Pulse the store clock. Copies the register to the parallel outputs all at once.
    pub fn commit_output(&mut self) -> ShiftResult<(), B::Error> {
        self.pulse(self.pins.store_clock())
    }

    /// Set every bit in the register to 0. The outputs keep showing the old value until the
    /// next [`Self::commit_output`].
    pub fn clear_register(&mut self) -> ShiftResult<(), B::Error> {
        match self.pins.power() {
            None => {
                let zeros = Frame::zeros(self.width)?;
                self.load_frame(&zeros)
            }
            Some(power) => {
                self.write(power, PinState::Low)?;
                self.write(power, PinState::High)?;
                self.pulse_shift_clock()
            }
        }
    }

    /// Clear the register and give the lines back to the backend.
    ///
    /// Safe to call more than once. Only the first call does anything. The lines are released
    /// even if clearing fails.
    pub fn release(&mut self) -> ShiftResult<(), B::Error> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let cleared = self.clear_register();
        if cleared.is_err() {
            warn!("failed to clear the register before releasing its lines");
        }

        self.backend
            .release_all()
            .map_err(ShiftError::BackendRelease)?;

        debug!("shift register released");

        cleared
    }
}

impl<B: GpioBackend> Drop for RegisterController<B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if self.release().is_err() {
            error!("failed to release shift register on drop");
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::backend::{SimError, SimulatedRegister};
    use crate::errors::{ConfigError, FrameError};

    const PINS: PinAssignment = PinAssignment::new(4, 6, 5);
    const POWERED: PinAssignment = PinAssignment::new(4, 6, 5).with_power(17);

    fn controller(
        pins: PinAssignment,
        width: usize,
    ) -> (SimulatedRegister, RegisterController<SimulatedRegister>) {
        let sim = SimulatedRegister::new(pins, width);
        let register =
            RegisterController::new(sim.clone(), RegisterConfig::new(pins).with_width(width))
                .unwrap();
        (sim, register)
    }

    fn frame(bits: &[u8]) -> Frame {
        Frame::try_from_bits(bits).unwrap()
    }

    #[test]
    fn test_init_defaults() {
        let (sim, _register) = controller(POWERED, 8);

        assert_eq!(sim.claimed_lines(), vec![4, 5, 6, 17]);
        assert_eq!(sim.level(17), Some(PinState::High));
        assert_eq!(sim.level(4), Some(PinState::Low));
        assert_eq!(sim.level(5), Some(PinState::Low));
        assert_eq!(sim.level(6), Some(PinState::Low));
        assert!(sim.is_powered());
        assert_eq!(sim.warnings(), Some(false));
    }

    #[test]
    fn test_warnings_pass_through() {
        let sim = SimulatedRegister::new(PINS, 8);
        let _register =
            RegisterController::new(sim.clone(), RegisterConfig::new(PINS).with_warnings(true))
                .unwrap();
        assert_eq!(sim.warnings(), Some(true));
    }

    #[test]
    fn test_bad_config_never_touches_the_backend() {
        let sim = SimulatedRegister::new(PINS, 8);

        let err = RegisterController::new(sim.clone(), RegisterConfig::new(PINS).with_width(0))
            .err()
            .unwrap();
        assert!(matches!(err, ShiftError::Config(ConfigError::ZeroWidth)));

        let shared = PinAssignment::new(4, 5, 5);
        let err = RegisterController::new(sim.clone(), RegisterConfig::new(shared))
            .err()
            .unwrap();
        assert!(matches!(err, ShiftError::Config(ConfigError::DuplicateLine(5))));

        assert!(sim.claimed_lines().is_empty());
        assert_eq!(sim.warnings(), None);
        assert_eq!(sim.release_count(), 0);
    }

    #[test]
    fn test_failed_init_releases_lines() {
        let sim = SimulatedRegister::new(PINS, 8);
        sim.fail_next_write(PINS.store_clock());

        let err = RegisterController::new(sim.clone(), RegisterConfig::new(PINS))
            .err()
            .unwrap();

        assert!(matches!(
            err,
            ShiftError::BackendIo {
                line: 6,
                error: SimError::Injected(6)
            }
        ));
        assert!(sim.claimed_lines().is_empty());
        assert_eq!(sim.release_count(), 1);
    }

    #[test]
    fn test_set_bit_rejects_non_bits() {
        let (sim, mut register) = controller(PINS, 8);
        register.set_bit(1).unwrap();
        sim.clear_events();

        for value in [2, 3, 128, 255] {
            let err = register.set_bit(value).err().unwrap();
            assert!(matches!(err, ShiftError::InvalidBit(x) if x == value));
        }

        // the data line is where we left it
        assert_eq!(sim.level(PINS.data()), Some(PinState::High));
        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_load_frame_pin_sequence() {
        let (sim, mut register) = controller(PINS, 2);
        sim.clear_events();

        register.load_frame(&frame(&[1, 0])).unwrap();

        use PinState::{High, Low};
        assert_eq!(
            sim.events(),
            vec![
                (4, High),
                (5, High),
                (5, Low),
                (4, Low),
                (4, Low),
                (5, High),
                (5, Low),
                (4, Low),
            ]
        );
    }

    #[test]
    fn test_load_then_commit_shows_the_frame() {
        for width in [1, 3, 8, 13] {
            let (sim, mut register) = controller(PINS, width);

            // a few different patterns per width
            for seed in 0..4u32 {
                let bits: Vec<u8> = (0..width)
                    .map(|i| u8::from((i as u32 * 7 + seed) % 3 == 0))
                    .collect();

                register.load_bits(&bits).unwrap();
                assert_eq!(sim.stages(), bits);

                register.commit_output().unwrap();
                assert_eq!(sim.outputs(), bits);
            }
        }
    }

    #[test]
    fn test_wrong_width_is_rejected_before_touching_lines() {
        let (sim, mut register) = controller(PINS, 4);
        sim.clear_events();

        for bits in [&[1u8, 0, 1][..], &[1, 0, 1, 0, 1][..], &[][..]] {
            let err = register.load_bits(bits).err().unwrap();
            assert!(matches!(
                err,
                ShiftError::FrameWidth { expected: 4, actual } if actual == bits.len()
            ));
        }

        let err = register.load_bits(&[1, 0, 7, 0]).err().unwrap();
        assert!(matches!(
            err,
            ShiftError::Frame(FrameError::InvalidBit { index: 2, value: 7 })
        ));

        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_clear_register_shifting_zeros() {
        let (sim, mut register) = controller(PINS, 8);

        register.load_bits(&[1, 1, 0, 1, 0, 1, 1, 1]).unwrap();
        register.commit_output().unwrap();
        let lit = sim.outputs();

        register.clear_register().unwrap();
        assert_eq!(sim.stages(), vec![0; 8]);
        // still showing the old frame until committed
        assert_eq!(sim.outputs(), lit);

        register.commit_output().unwrap();
        assert_eq!(sim.outputs(), vec![0; 8]);
    }

    #[test]
    fn test_clear_register_power_cycle() {
        let (sim, mut register) = controller(POWERED, 8);

        register.load_bits(&[1; 8]).unwrap();
        register.commit_output().unwrap();
        sim.clear_events();

        register.clear_register().unwrap();

        use PinState::{High, Low};
        assert_eq!(
            sim.events(),
            vec![(17, Low), (17, High), (5, High), (5, Low)]
        );
        assert_eq!(sim.stages(), vec![0; 8]);
        assert_eq!(sim.outputs(), vec![1; 8]);

        register.commit_output().unwrap();
        assert_eq!(sim.outputs(), vec![0; 8]);
    }

    #[test]
    fn test_release_twice() {
        let (sim, mut register) = controller(POWERED, 8);

        register.release().unwrap();
        assert!(register.is_released());
        assert!(sim.claimed_lines().is_empty());
        assert_eq!(sim.release_count(), 1);

        register.release().unwrap();
        assert_eq!(sim.release_count(), 1);
        assert!(sim.claimed_lines().is_empty());
    }

    #[test]
    fn test_backend_fault_mid_load_then_release() {
        let (sim, mut register) = controller(PINS, 8);

        sim.fail_next_write(PINS.shift_clock());
        let err = register.load_bits(&[1; 8]).err().unwrap();
        assert!(matches!(
            err,
            ShiftError::BackendIo {
                line: 5,
                error: SimError::Injected(5)
            }
        ));

        register.release().unwrap();
        assert!(sim.claimed_lines().is_empty());
        assert_eq!(sim.stages(), vec![0; 8]);
    }

    #[test]
    fn test_release_still_releases_when_clear_fails() {
        let (sim, mut register) = controller(POWERED, 8);

        sim.fail_next_write(17);
        let err = register.release().err().unwrap();
        assert!(matches!(err, ShiftError::BackendIo { line: 17, .. }));

        assert!(register.is_released());
        assert_eq!(sim.release_count(), 1);
        assert!(sim.claimed_lines().is_empty());
    }

    #[test]
    fn test_drop_releases() {
        let sim = {
            let (sim, mut register) = controller(PINS, 8);
            register.load_bits(&[1; 8]).unwrap();
            sim
        };

        assert_eq!(sim.release_count(), 1);
        assert!(sim.claimed_lines().is_empty());
        assert_eq!(sim.stages(), vec![0; 8]);
    }

    #[test]
    fn test_released_controller_is_inert() {
        let (_sim, mut register) = controller(PINS, 8);
        register.release().unwrap();

        let err = register.commit_output().err().unwrap();
        assert!(matches!(
            err,
            ShiftError::BackendIo {
                error: SimError::Unclaimed(6),
                ..
            }
        ));
    }
}
