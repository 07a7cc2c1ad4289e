//! Play patterns on a line of LEDs wired to the register from its lowest output to its highest.
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embedded_hal::delay::DelayNs;

use super::pattern::Pattern;
use crate::backend::GpioBackend;
use crate::errors::{ShiftError, ShiftResult};
use crate::frame::{Direction, Frame};
use crate::logging::{debug, info, trace};
use crate::register::RegisterController;

pub struct PatternSequencer<B: GpioBackend, D: DelayNs> {
    register: RegisterController<B>,
    delay: D,
    width: usize,
    /// raised from outside (ctrl-c) to stop whatever is playing
    interrupt: Option<&'static AtomicBool>,
}

impl<B: GpioBackend, D: DelayNs> PatternSequencer<B, D> {
    pub fn new(register: RegisterController<B>, delay: D) -> Self {
        let width = register.width();

        Self {
            register,
            delay,
            width,
            interrupt: None,
        }
    }

    /// Checked after every hold. Once it is set, the pattern that is playing stops with
    /// [`ShiftError::Interrupted`].
    pub fn with_interrupt(mut self, flag: &'static AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn register(&self) -> &RegisterController<B> {
        &self.register
    }

    pub fn register_mut(&mut self) -> &mut RegisterController<B> {
        &mut self.register
    }

    pub fn release(&mut self) -> ShiftResult<(), B::Error> {
        self.register.release()
    }

    pub(super) fn interrupt(&self) -> Option<&'static AtomicBool> {
        self.interrupt
    }

    pub(super) fn set_interrupt(&mut self, flag: Option<&'static AtomicBool>) {
        self.interrupt = flag;
    }

    fn pause(&mut self, duration: Duration) {
        let mut remaining = duration.as_micros();

        while remaining > 0 {
            let chunk = u32::try_from(remaining).unwrap_or(u32::MAX);
            self.delay.delay_us(chunk);
            remaining -= u128::from(chunk);
        }
    }

    fn check_interrupt(&self) -> ShiftResult<(), B::Error> {
        match self.interrupt {
            Some(flag) if flag.load(Ordering::SeqCst) => {
                debug!("interrupt requested");
                Err(ShiftError::Interrupted)
            }
            _ => Ok(()),
        }
    }

    /// Block for `duration`. Then bail out if someone asked us to stop.
    fn hold(&mut self, duration: Duration) -> ShiftResult<(), B::Error> {
        self.pause(duration);
        self.check_interrupt()
    }

    /// Load `frame` in the given direction and commit it. Leaves the register lit.
    ///
    /// The caller's frame is never modified.
    pub fn show_frame(
        &mut self,
        frame: &Frame,
        direction: Direction,
    ) -> ShiftResult<(), B::Error> {
        trace!("showing {:?}", frame.bits());

        if direction.reverses() {
            self.register.load_frame(&frame.reversed())?;
        } else {
            self.register.load_frame(frame)?;
        }

        self.register.commit_output()
    }

    /// Show `frame`, then blank the register and commit the blank after `hold`.
    ///
    /// Chaining these is what makes every animation. An interrupt is only reported once the blank
    /// is on the outputs.
    pub fn render_frame(
        &mut self,
        frame: &Frame,
        direction: Direction,
        hold: Duration,
    ) -> ShiftResult<(), B::Error> {
        self.show_frame(frame, direction)?;

        self.register.clear_register()?;
        self.pause(hold);
        self.register.commit_output()?;

        self.check_interrupt()
    }

    fn render_pattern(
        &mut self,
        pattern: Pattern,
        direction: Direction,
        hold: Duration,
    ) -> ShiftResult<(), B::Error> {
        debug!("playing pattern. reversed={}", direction.reverses());

        for frame in pattern.frames(self.width)? {
            self.render_frame(&frame, direction, hold)?;
        }

        Ok(())
    }

    /// Light each output in sequence until they are all on.
    ///
    /// With `persist`, the full bar is left lit and nothing is cleared after it.
    pub fn fill_bar(
        &mut self,
        direction: Direction,
        hold: Duration,
        persist: bool,
    ) -> ShiftResult<(), B::Error> {
        let last = self.width - 1;

        for (k, frame) in Pattern::FillBar.frames(self.width)?.enumerate() {
            if persist && k == last {
                return self.show_frame(&frame, direction);
            }

            self.render_frame(&frame, direction, hold)?;
        }

        Ok(())
    }

    /// Light every output in sequence, then turn them off in the same order.
    pub fn fill_bar_walkthrough(
        &mut self,
        direction: Direction,
        hold: Duration,
    ) -> ShiftResult<(), B::Error> {
        self.fill_bar(direction, hold, true)?;

        self.hold(hold)?;

        self.render_pattern(Pattern::EmptyBar, direction, hold)
    }

    /// Fill from one side, then empty from the same side so the bar washes across.
    pub fn bar_wave(&mut self, direction: Direction, hold: Duration) -> ShiftResult<(), B::Error> {
        self.render_pattern(Pattern::BarWave, direction, hold)
    }

    /// Run one lit output from one side to the other, then blank.
    pub fn bit_run(&mut self, direction: Direction, hold: Duration) -> ShiftResult<(), B::Error> {
        self.render_pattern(Pattern::BitRun, direction, hold)
    }

    pub fn skip_across(
        &mut self,
        direction: Direction,
        hold: Duration,
    ) -> ShiftResult<(), B::Error> {
        self.render_pattern(Pattern::SkipAcross, direction, hold)
    }

    /// Call `step` until the interrupt flag stops it, then play the shutdown sequence.
    ///
    /// Any other error is returned as soon as it happens. Releasing the register is still up to
    /// the caller (or drop).
    pub fn run_until_interrupted<F>(
        &mut self,
        shutdown_hold: Duration,
        mut step: F,
    ) -> ShiftResult<(), B::Error>
    where
        F: FnMut(&mut Self) -> ShiftResult<(), B::Error>,
    {
        loop {
            match step(self) {
                Ok(()) => continue,
                Err(ShiftError::Interrupted) => {
                    info!("interrupted. shutting down the light show");
                    return self.shutdown(shutdown_hold);
                }
                Err(err) => return Err(err),
            }
        }
    }
}
