use thiserror::Error;

use crate::backend::LineId;

/// Problems with a [`crate::RegisterConfig`]. Caught before any line is touched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("register width must be at least 1")]
    ZeroWidth,
    #[error("register width {width} is more than the supported {max} bits")]
    TooWide { width: usize, max: usize },
    #[error("line {0} is assigned to more than one role")]
    DuplicateLine(LineId),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("bit {index} is {value}. bits must be 0 or 1")]
    InvalidBit { index: usize, value: u8 },
    #[error("frame of {len} bits is longer than the supported {max} bits")]
    TooLong { len: usize, max: usize },
}

/// `E` is the backend's error type.
#[derive(Error, Debug)]
pub enum ShiftError<E> {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("bit value must be 0 or 1, you attempted to set it as {0}")]
    InvalidBit(u8),
    #[error("frame has {actual} bits but the register is {expected} bits wide")]
    FrameWidth { expected: usize, actual: usize },
    #[error("gpio backend failed to write line {line}: {error:?}")]
    BackendIo { line: LineId, error: E },
    #[error("gpio backend failed to release its lines: {0:?}")]
    BackendRelease(E),
    #[error("interrupted")]
    Interrupted,
}

impl<E> ShiftError<E> {
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

pub type ShiftResult<T, E> = Result<T, ShiftError<E>>;
