pub use chip8::Chip8;
pub use constants::{DEFAULT_CPU_FREQUENCY, TIMER_FREQUENCY};
pub use error::{Chip8Error, Result};
pub use state::FrameBuffer;

mod chip8;
pub mod constants;
mod error;
pub mod instruction;
pub mod opcode;
mod operations;
pub mod state;
