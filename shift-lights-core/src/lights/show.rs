use core::time::Duration;

use embedded_hal::delay::DelayNs;

use super::PatternSequencer;
use crate::backend::GpioBackend;
use crate::errors::ShiftResult;
use crate::frame::Direction::{LeftToRight, RightToLeft};
use crate::logging::{debug, info};

impl<B: GpioBackend, D: DelayNs> PatternSequencer<B, D> {
    /// A fixed mix of every pattern.
    pub fn example_show(&mut self, hold: Duration) -> ShiftResult<(), B::Error> {
        debug!("example show. hold={}ms", hold.as_millis() as u64);

        self.fill_bar_walkthrough(LeftToRight, hold)?;
        self.bar_wave(RightToLeft, hold)?;
        self.fill_bar_walkthrough(RightToLeft, hold)?;
        self.bar_wave(LeftToRight, hold)?;

        self.bit_run(LeftToRight, hold)?;
        self.bit_run(RightToLeft, hold)?;
        self.bit_run(LeftToRight, hold)?;

        self.bar_wave(RightToLeft, hold)?;
        self.bit_run(RightToLeft, hold)?;
        self.bar_wave(LeftToRight, hold)
    }

    /// Sweep a bit across and back, then leave the outputs blank.
    ///
    /// The interrupt flag is ignored until this returns.
    pub fn shutdown(&mut self, hold: Duration) -> ShiftResult<(), B::Error> {
        info!("shutdown sequence");

        let interrupt = self.interrupt();
        self.set_interrupt(None);

        let result = self.shutdown_sweep(hold);

        self.set_interrupt(interrupt);

        result
    }

    fn shutdown_sweep(&mut self, hold: Duration) -> ShiftResult<(), B::Error> {
        self.bit_run(LeftToRight, hold)?;
        self.bit_run(RightToLeft, hold)?;

        let register = self.register_mut();
        register.clear_register()?;
        register.commit_output()
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::errors::ShiftError;
    use crate::lights::sequencer::tests::{sequencer, shown, PINS};

    const HOLD: Duration = Duration::from_millis(2);

    #[test_log::test]
    fn test_example_show_order() {
        let width = 3;
        let (sim, mut sequencer) = sequencer(PINS, width);

        sequencer.example_show(HOLD).unwrap();

        // the full bar persists without a blank after it
        let walkthrough = 2 * (width - 1) + 1 + 2 * width;
        let wave = 2 * 2 * width;
        let run = 2 * (width + 1);
        let commits = sim.commits();
        assert_eq!(
            commits.len(),
            2 * walkthrough + 4 * wave + 4 * run,
            "every pattern played once"
        );

        // walkthrough left to right starts on the highest output
        assert_eq!(commits[0], vec![0, 0, 1]);
        // then a wave right to left starts on output 0
        assert_eq!(commits[walkthrough], vec![1, 0, 0]);
        // and it all ends blank
        assert_eq!(sim.outputs(), vec![0; width]);
    }

    #[test_log::test]
    fn test_shutdown_ignores_the_interrupt() {
        static STOP: AtomicBool = AtomicBool::new(true);

        let (sim, sequencer) = sequencer(PINS.with_power(17), 4);
        let mut sequencer = sequencer.with_interrupt(&STOP);

        sequencer.shutdown(HOLD).unwrap();

        let mut expected: Vec<Vec<u8>> = (0..4)
            .map(|k| (0..4).map(|i| u8::from(i == 3 - k)).collect())
            .collect();
        expected.push(vec![0; 4]);
        expected.extend((0..4).map(|k| (0..4).map(|i| u8::from(i == k)).collect()));
        expected.push(vec![0; 4]);

        let commits = sim.commits();
        // two runs and the final clear
        assert_eq!(commits.len(), 2 * 2 * 5 + 1);

        let mut lit = shown(&sim);
        assert_eq!(lit.pop(), Some(vec![0; 4]));
        assert_eq!(lit, expected);

        // the flag is back in place
        assert!(sequencer.bit_run(LeftToRight, HOLD).is_err());
    }

    #[test_log::test]
    fn test_run_until_interrupted() {
        static STOP: AtomicBool = AtomicBool::new(false);
        static STEPS: AtomicUsize = AtomicUsize::new(0);

        let (sim, sequencer) = sequencer(PINS, 4);
        let mut sequencer = sequencer.with_interrupt(&STOP);

        sequencer
            .run_until_interrupted(HOLD, |x| {
                if STEPS.fetch_add(1, Ordering::SeqCst) == 2 {
                    STOP.store(true, Ordering::SeqCst);
                }
                x.skip_across(RightToLeft, HOLD)
            })
            .unwrap();

        assert_eq!(STEPS.load(Ordering::SeqCst), 3);
        assert_eq!(sim.outputs(), vec![0; 4]);
        assert!(!sequencer.register().is_released());
    }

    #[test_log::test]
    fn test_run_until_interrupted_passes_other_errors_through() {
        let (sim, mut sequencer) = sequencer(PINS, 4);
        let mut calls = 0;

        sim.fail_next_write(PINS.shift_clock());
        let err = sequencer
            .run_until_interrupted(HOLD, |x| {
                calls += 1;
                x.bit_run(LeftToRight, HOLD)
            })
            .err()
            .unwrap();

        assert!(matches!(err, ShiftError::BackendIo { line: 5, .. }));
        assert_eq!(calls, 1);
    }
}
