//! A frame is the state of every output at one instant. Index 0 is the lowest-order output.
use core::fmt;

use heapless::Vec;

use crate::errors::FrameError;

/// Widest register we can drive. One 74HC595 is 8 bits. This leaves room for long chips without
/// needing an allocator.
pub const MAX_WIDTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Index 0 shows up on the physically opposite end, so the frame is mirrored before loading.
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn reverses(self) -> bool {
        matches!(self, Direction::LeftToRight)
    }
}

/// Validated bits. Every element is 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame(Vec<u8, MAX_WIDTH>);

impl Frame {
    pub fn filled(width: usize, bit: bool) -> Result<Self, FrameError> {
        if width > MAX_WIDTH {
            return Err(FrameError::TooLong {
                len: width,
                max: MAX_WIDTH,
            });
        }

        let mut bits = Vec::new();
        // width was checked against the capacity above
        let _ = bits.resize(width, u8::from(bit));

        Ok(Self(bits))
    }

    pub fn zeros(width: usize) -> Result<Self, FrameError> {
        Self::filled(width, false)
    }

    pub fn try_from_bits(bits: &[u8]) -> Result<Self, FrameError> {
        if let Some((index, &value)) = bits.iter().enumerate().find(|(_, b)| **b > 1) {
            return Err(FrameError::InvalidBit { index, value });
        }

        Vec::from_slice(bits).map(Self).map_err(|_| FrameError::TooLong {
            len: bits.len(),
            max: MAX_WIDTH,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    /// Out of range indexes read as 0.
    pub fn get(&self, index: usize) -> u8 {
        self.0.get(index).copied().unwrap_or(0)
    }

    /// Out of range indexes are ignored.
    pub fn set(&mut self, index: usize, bit: bool) {
        if let Some(x) = self.0.get_mut(index) {
            *x = u8::from(bit);
        }
    }

    pub fn fill(&mut self, bit: bool) {
        self.0.iter_mut().for_each(|x| *x = u8::from(bit));
    }

    pub fn reverse(&mut self) {
        self.0.reverse();
    }

    pub fn reversed(&self) -> Self {
        let mut x = self.clone();
        x.reverse();
        x
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|x| **x == 1).count()
    }

    pub fn is_clear(&self) -> bool {
        self.count_ones() == 0
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = FrameError;

    fn try_from(bits: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_bits(bits)
    }
}

impl<const N: usize> TryFrom<[u8; N]> for Frame {
    type Error = FrameError;

    fn try_from(bits: [u8; N]) -> Result<Self, Self::Error> {
        Self::try_from_bits(&bits)
    }
}

/// `1` and `0` in index order
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0.iter() {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}
