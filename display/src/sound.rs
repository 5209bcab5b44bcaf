use log::debug;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

/// Something that can sound the Chip-8's single tone
pub trait Sound {
    fn beep(&mut self);
    fn stop(&mut self);
}

const BEEP_PITCH: f32 = 440.0;
const BEEP_VOLUME: f32 = 0.2;

struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = if self.phase <= 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// # Beeper
/// A square wave played through SDL2 audio while the sound timer is non-zero.
pub struct Beeper {
    device: AudioDevice<SquareWave>,
    beeping: bool,
}

impl Beeper {
    pub fn new(sdl: &sdl2::Sdl) -> Result<Self, String> {
        let audio = sdl.audio()?;
        let desired = AudioSpecDesired {
            freq: Some(44_100),
            channels: Some(1),
            samples: None,
        };
        let device = audio.open_playback(None, &desired, |spec| {
            debug!("opened audio device at {} Hz", spec.freq);
            SquareWave {
                phase_inc: BEEP_PITCH / spec.freq as f32,
                phase: 0.0,
                volume: BEEP_VOLUME,
            }
        })?;

        Ok(Beeper {
            device,
            beeping: false,
        })
    }
}

impl Sound for Beeper {
    fn beep(&mut self) {
        if !self.beeping {
            self.device.resume();
            self.beeping = true;
        }
    }

    fn stop(&mut self) {
        if self.beeping {
            self.device.pause();
            self.beeping = false;
        }
    }
}

/// Silence, for `--mute` or when no audio device is available
#[derive(Default)]
pub struct Mute;

impl Sound for Mute {
    fn beep(&mut self) {}

    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_wave_alternates() {
        let mut wave = SquareWave {
            phase_inc: 0.25,
            phase: 0.0,
            volume: 0.5,
        };
        let mut out = [0.0; 8];
        wave.callback(&mut out);
        assert_eq!(out, [0.5, 0.5, 0.5, -0.5, 0.5, 0.5, 0.5, -0.5]);
    }
}
