use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, log_enabled, trace, Level};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{KEY_COUNT, MAX_ROM_SIZE, PROGRAM_START, REGISTER_COUNT};
use crate::error::{Chip8Error, Result};
use crate::instruction::from_op;
use crate::state::{FrameBuffer, State};

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the random source used by `CXKK`, seeded from the clock unless a seed is given
///  - whether execution is paused
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing the CPU one instruction at a time
/// - advancing its timers, which the host should do at 60Hz independently of the CPU
/// - inspecting its frame buffer for rendering by some display
pub struct Chip8 {
    state: State,
    rng: StdRng,
    seed: Option<u64>,
    paused: bool,
}

impl Chip8 {
    pub fn new() -> Self {
        Chip8 {
            state: State::new(),
            rng: StdRng::seed_from_u64(clock_seed()),
            seed: None,
            paused: false,
        }
    }

    /// A Chip-8 whose random numbers are reproducible, including across resets
    pub fn with_seed(seed: u64) -> Self {
        Chip8 {
            state: State::new(),
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
            paused: false,
        }
    }

    /// Copies a rom into memory starting at `PROGRAM_START`
    ///
    /// # Arguments
    /// * `rom` the raw program; it isn't validated beyond checking that it fits
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::rom_too_large(rom.len()));
        }
        let start = PROGRAM_START as usize;
        self.state.memory[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte ROM at {:04X}", rom.len(), PROGRAM_START);
        Ok(())
    }

    /// Advances the CPU by a single cycle
    /// - does nothing while paused
    /// - fetches the next opcode, stepping the pc past it
    /// - decodes and executes it
    pub fn cycle(&mut self) {
        if self.paused {
            return;
        }
        let at = self.state.pc;
        let op = self.state.fetch();
        if log_enabled!(Level::Trace) {
            trace!("{}", trace_line(at, op, &self.state));
        }
        let instruction = from_op(op);
        self.state = instruction(op, &self.state, &mut self.rng);
    }

    /// Decrements both timers towards 0; meant to be called at `TIMER_FREQUENCY`
    pub fn tick_timers(&mut self) {
        if self.paused {
            return;
        }
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }

    /// Restores the power-on state: the font is reloaded but the rom is not
    ///
    /// The blank screen counts as a new frame.
    pub fn reset(&mut self) {
        self.state = State {
            draw_flag: true,
            ..State::new()
        };
        self.rng = StdRng::seed_from_u64(self.seed.unwrap_or_else(clock_seed));
        self.paused = false;
        debug!("reset");
    }

    /// Returns the FrameBuffer if it changed since it was last taken
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    pub fn keypad(&self) -> &[bool; KEY_COUNT] {
        &self.state.keypad
    }

    pub fn keypad_mut(&mut self) -> &mut [bool; KEY_COUNT] {
        &mut self.state.keypad
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the hex digit of the key; anything past 0xF is ignored
    /// * `pressed` whether it is held down
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        match self.state.keypad.get_mut(key as usize) {
            Some(flag) => *flag = pressed,
            None => debug!("ignoring key {:02X}", key),
        }
    }

    pub fn key_press(&mut self, key: u8) {
        self.set_key(key, true);
    }

    pub fn key_release(&mut self, key: u8) {
        self.set_key(key, false);
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// Whether the host should be sounding its tone
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn index(&self) -> u16 {
        self.state.i
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.state.v
    }

    pub fn pause(&mut self) {
        self.paused = true;
        debug!("paused at {:04X}", self.state.pc);
    }

    pub fn resume(&mut self) {
        self.paused = false;
        debug!("resumed at {:04X}", self.state.pc);
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Lists `(address, word)` for every even step from `start` to `end` inclusive
    pub fn dump_memory(&self, start: u16, end: u16) -> Vec<(u16, u16)> {
        (start..=end)
            .step_by(2)
            .map(|addr| (addr, self.state.word(addr)))
            .collect()
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

/// `at` is where `op` was fetched from, not the already advanced pc
fn trace_line(at: u16, op: u16, state: &State) -> String {
    format!("{:04X}: {:04X} v{:02X?} i{:04X}", at, op, state.v, state.i)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MEMORY_SIZE;

    fn loaded(rom: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::with_seed(0);
        chip8.load_rom(rom).unwrap();
        chip8
    }

    #[test]
    fn test_loads_rom_at_program_start() {
        let chip8 = loaded(&[0xAA, 0xBB]);
        assert_eq!(chip8.state.memory[0x200..0x202], [0xAA, 0xBB]);
        assert_eq!(chip8.pc(), 0x200);
    }

    #[test]
    fn test_loads_largest_rom() {
        let mut chip8 = Chip8::new();
        let rom = vec![0x1; MEMORY_SIZE - 0x200];
        assert_eq!(chip8.load_rom(&rom), Ok(()));
        assert_eq!(chip8.state.memory[MEMORY_SIZE - 1], 0x1);
    }

    #[test]
    fn test_rejects_oversized_rom() {
        let mut chip8 = Chip8::new();
        let rom = vec![0x1; MEMORY_SIZE - 0x200 + 1];
        assert_eq!(
            chip8.load_rom(&rom),
            Err(Chip8Error::RomTooLarge {
                size: 3585,
                max_size: 3584
            })
        );
        assert_eq!(chip8.state.memory[0x200], 0x0);
    }

    #[test]
    fn test_runs_a_program() {
        let mut chip8 = loaded(&[0x60, 0x05, 0x70, 0x03]);
        chip8.cycle();
        chip8.cycle();
        assert_eq!(chip8.registers()[0x0], 8);
        assert_eq!(chip8.pc(), 0x204);
    }

    #[test]
    fn test_trace_line_names_fetch_address() {
        let mut chip8 = loaded(&[0x60, 0x05]);
        let at = chip8.pc();
        let op = chip8.state.fetch();
        let line = trace_line(at, op, &chip8.state);
        assert!(line.starts_with("0200: 6005 "), "{}", line);
    }

    #[test]
    fn test_cycle_skips_padding() {
        let mut chip8 = loaded(&[0x00, 0x00]);
        chip8.cycle();
        assert_eq!(chip8.pc(), 0x202);
    }

    #[test]
    fn test_call_then_return() {
        // 0x200 CALL 0x300; 0x300 RET
        let mut chip8 = loaded(&[0x23, 0x00]);
        chip8.state.memory[0x300..0x302].copy_from_slice(&[0x00, 0xEE]);
        chip8.cycle();
        assert_eq!(chip8.pc(), 0x300);
        chip8.cycle();
        assert_eq!(chip8.pc(), 0x202);
        assert_eq!(chip8.state.sp, 0);
    }

    #[test]
    fn test_waits_for_key() {
        let mut chip8 = loaded(&[0xF3, 0x0A]);
        chip8.cycle();
        chip8.cycle();
        assert_eq!(chip8.pc(), 0x200);

        chip8.key_press(0x9);
        chip8.cycle();
        assert_eq!(chip8.pc(), 0x202);
        assert_eq!(chip8.registers()[0x3], 0x9);
    }

    #[test]
    fn test_paused_cycle_does_nothing() {
        let mut chip8 = loaded(&[0x60, 0x05]);
        chip8.state.delay_timer = 3;
        chip8.pause();
        chip8.cycle();
        chip8.tick_timers();
        assert_eq!(chip8.pc(), 0x200);
        assert_eq!(chip8.delay_timer(), 3);

        chip8.toggle_pause();
        assert!(!chip8.is_paused());
        chip8.cycle();
        assert_eq!(chip8.registers()[0x0], 5);
    }

    #[test]
    fn test_timers_count_down_to_zero() {
        let mut chip8 = Chip8::new();
        chip8.state.delay_timer = 2;
        chip8.state.sound_timer = 1;
        assert!(chip8.sound_active());
        chip8.tick_timers();
        assert_eq!(chip8.delay_timer(), 1);
        assert_eq!(chip8.sound_timer(), 0);
        assert!(!chip8.sound_active());
        chip8.tick_timers();
        chip8.tick_timers();
        assert_eq!(chip8.delay_timer(), 0);
        assert_eq!(chip8.sound_timer(), 0);
    }

    #[test]
    fn test_timers_are_independent_of_cycles() {
        let mut chip8 = loaded(&[0x12, 0x00]);
        chip8.state.delay_timer = 5;
        for _ in 0..100 {
            chip8.cycle();
        }
        assert_eq!(chip8.delay_timer(), 5);
    }

    #[test]
    fn test_take_frame_only_after_draw() {
        let mut chip8 = loaded(&[0x00, 0xE0]);
        assert_eq!(chip8.take_frame(), None);
        chip8.cycle();
        assert!(chip8.take_frame().is_some());
        assert_eq!(chip8.take_frame(), None);
    }

    #[test]
    fn test_set_key_ignores_unknown_keys() {
        let mut chip8 = Chip8::new();
        chip8.set_key(0x10, true);
        chip8.key_press(0xF);
        assert_eq!(chip8.keypad().iter().filter(|&&k| k).count(), 1);
        chip8.key_release(0xF);
        assert!(!chip8.keypad()[0xF]);
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let mut chip8 = loaded(&[0x60, 0x05, 0xD0, 0x05]);
        chip8.cycle();
        chip8.cycle();
        chip8.key_press(0x1);
        chip8.pause();
        chip8.reset();
        assert_eq!(
            chip8.state,
            State {
                draw_flag: true,
                ..State::new()
            }
        );
        assert!(!chip8.is_paused());
    }

    #[test]
    fn test_reset_yields_a_blank_frame() {
        // V0 = 0; I = glyph(V0); DRW V0 V0 5
        let mut chip8 = loaded(&[0x60, 0x00, 0xF0, 0x29, 0xD0, 0x05]);
        for _ in 0..3 {
            chip8.cycle();
        }
        assert!(chip8.take_frame().is_some());
        chip8.reset();
        let frame = chip8.take_frame().unwrap();
        assert!(frame.iter().flatten().all(|&pixel| !pixel));
        assert_eq!(chip8.take_frame(), None);
    }

    #[test]
    fn test_seeded_reset_replays_random_numbers() {
        let mut chip8 = loaded(&[0xC0, 0xFF]);
        chip8.cycle();
        let first = chip8.registers()[0x0];
        chip8.reset();
        chip8.load_rom(&[0xC0, 0xFF]).unwrap();
        chip8.cycle();
        assert_eq!(chip8.registers()[0x0], first);
    }

    #[test]
    fn test_dump_memory() {
        let chip8 = loaded(&[0x60, 0x05, 0x70, 0x03]);
        assert_eq!(
            chip8.dump_memory(0x200, 0x203),
            vec![(0x200, 0x6005), (0x202, 0x7003)]
        );
    }
}
