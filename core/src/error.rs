use crate::constants::MAX_ROM_SIZE;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Errors surfaced to whoever drives the interpreter
///
/// Nothing a running program does is an error; guest mistakes wrap or fall through to a no-op.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },
}

impl Chip8Error {
    pub(crate) fn rom_too_large(size: usize) -> Self {
        Chip8Error::RomTooLarge {
            size,
            max_size: MAX_ROM_SIZE,
        }
    }
}
