use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};
use sdl2::event::Event;

use g8_core::constants::PROGRAM_START;
use g8_core::Chip8;
use g8_display::{Beeper, Display, Mute, Sound};

use crate::config::Config;
use crate::keymap::{control, keymap, Control};
use crate::pacing::Pacer;

/// How long to yield between polls of the event loop
const IDLE: Duration = Duration::from_millis(1);

pub fn run(config: &Config) -> Result<()> {
    let rom = fs::read(&config.rom)
        .with_context(|| format!("unable to read ROM {}", config.rom.display()))?;

    let mut chip8 = match config.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8
        .load_rom(&rom)
        .with_context(|| format!("unable to load ROM {}", config.rom.display()))?;
    info!("loaded {} ({} bytes)", config.rom.display(), rom.len());

    if config.dump {
        for line in dump(&chip8, rom.len()) {
            println!("{}", line);
        }
        return Ok(());
    }

    // Get SDL2 context
    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl, config.scale)
        .map_err(anyhow::Error::msg)
        .context("unable to open window")?;
    let mut sound = open_sound(&sdl, config.mute);
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    let mut pacer = Pacer::new(config.frequency);
    let mut last_update = Instant::now();

    'event: loop {
        // Render only when the frame buffer changed
        if let Some(frame) = chip8.take_frame() {
            display.render(&frame).map_err(anyhow::Error::msg)?;
        }

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => match (keymap(key), control(key)) {
                    (Some(kc), _) => chip8.key_press(kc),
                    (_, Some(Control::Quit)) => break 'event,
                    (_, Some(Control::TogglePause)) => chip8.toggle_pause(),
                    (_, Some(Control::Reset)) => {
                        chip8.reset();
                        chip8.load_rom(&rom)?;
                        pacer.reset();
                        info!("reset");
                    }
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = keymap(key) {
                        chip8.key_release(kc);
                    }
                }
                _ => continue,
            };
        }

        // Update state; the CPU and the timers are paced independently
        let now = Instant::now();
        let due = pacer.advance(now - last_update);
        last_update = now;
        for _ in 0..due.cycles {
            chip8.cycle();
        }
        for _ in 0..due.timer_ticks {
            chip8.tick_timers();
        }

        if chip8.sound_active() {
            sound.beep();
        } else {
            sound.stop();
        }

        std::thread::sleep(IDLE);
    }

    Ok(())
}

/// Lists the loaded program as `addr : word` lines; an empty rom lists nothing
fn dump(chip8: &Chip8, rom_len: usize) -> Vec<String> {
    if rom_len == 0 {
        return Vec::new();
    }
    let end = PROGRAM_START + (rom_len - 1) as u16;
    chip8
        .dump_memory(PROGRAM_START, end)
        .into_iter()
        .map(|(addr, op)| format!("{:04X} : {:04X}", addr, op))
        .collect()
}

fn open_sound(sdl: &sdl2::Sdl, mute: bool) -> Box<dyn Sound> {
    if mute {
        return Box::new(Mute);
    }
    match Beeper::new(sdl) {
        Ok(beeper) => Box::new(beeper),
        Err(e) => {
            warn!("no audio, continuing muted: {}", e);
            Box::new(Mute)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_lists_program_words() {
        let mut chip8 = Chip8::with_seed(0);
        chip8.load_rom(&[0x60, 0x05, 0x70]).unwrap();
        assert_eq!(dump(&chip8, 3), vec!["0200 : 6005", "0202 : 7000"]);
    }

    #[test]
    fn test_dump_of_empty_rom_is_empty() {
        let chip8 = Chip8::with_seed(0);
        assert!(dump(&chip8, 0).is_empty());
    }
}
