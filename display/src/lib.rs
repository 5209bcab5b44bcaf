pub use display::Display;
pub use sound::{Beeper, Mute, Sound};

mod display;
mod sound;
