//! The frames behind each light pattern.
//!
//! Every pattern mutates one working frame a step at a time, the same way the lights look when
//! they play. Nothing is kept between runs, so `frames` can be called again to start over.
use crate::errors::FrameError;
use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    /// Light bits 0..=k, one more each frame.
    FillBar,
    /// Start fully lit and turn bits off from index 0 upward.
    EmptyBar,
    /// Fill the bar, then empty it starting from index 0 so the lit region moves across.
    BarWave,
    /// A single lit bit moves across, then one blank frame.
    BitRun,
    /// Even indexes light one at a time while the bit two back turns off. Odd indexes are
    /// explicitly cleared.
    SkipAcross,
}

impl Pattern {
    pub fn frames(self, width: usize) -> Result<PatternFrames, FrameError> {
        let working = match self {
            Pattern::EmptyBar => Frame::filled(width, true)?,
            _ => Frame::zeros(width)?,
        };

        Ok(PatternFrames {
            pattern: self,
            width,
            step: 0,
            working,
        })
    }

    /// How many frames `frames(width)` yields.
    pub fn len(self, width: usize) -> usize {
        match self {
            Pattern::FillBar | Pattern::EmptyBar | Pattern::SkipAcross => width,
            Pattern::BarWave => width * 2,
            Pattern::BitRun => width + 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternFrames {
    pattern: Pattern,
    width: usize,
    step: usize,
    working: Frame,
}

impl PatternFrames {
    fn advance(&mut self) {
        let x = self.step;
        let width = self.width;
        let working = &mut self.working;

        match self.pattern {
            Pattern::FillBar => working.set(x, true),
            Pattern::EmptyBar => working.set(x, false),
            Pattern::BarWave => {
                if x < width {
                    working.set(x, true);
                } else {
                    working.set(x - width, false);
                }
            }
            Pattern::BitRun => {
                if x < width {
                    working.set(x, true);
                    if x != 0 {
                        working.set(x - 1, false);
                    }
                } else {
                    // the trailing blank frame
                    working.fill(false);
                }
            }
            Pattern::SkipAcross => {
                if x % 2 == 0 {
                    working.set(x, true);
                    if x > 1 {
                        working.set(x - 2, false);
                    }
                } else {
                    working.set(x, false);
                }
            }
        }
    }
}

impl Iterator for PatternFrames {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.pattern.len(self.width) {
            return None;
        }

        self.advance();
        self.step += 1;

        Some(self.working.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pattern.len(self.width).saturating_sub(self.step);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PatternFrames {}

impl core::iter::FusedIterator for PatternFrames {}
