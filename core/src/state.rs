use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_SET, FONT_START, KEY_COUNT, MEMORY_SIZE, PROGRAM_START,
    REGISTER_COUNT, STACK_SIZE,
};

/// The FrameBuffer is indexed as [y][x]; `true` is a lit pixel
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// A snapshot of the interpreter's internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter, always advanced by 2 on fetch
///
/// Pointer
/// - (sp) an 8-bit stack pointer into a 16 entry stack of return addresses
///
/// Timers
/// - 2 8-bit timers (delay & sound) counted down by the host at 60Hz
///
/// ## Memory
/// - 4096 bytes of addressable memory; every access wraps
///     - 0x050..0x0A0 holds the hex font
///     - 0x200.. holds the program
/// - 64x32 frame buffer
///
/// ## Input
/// - 16 key-down flags written by the host
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_SIZE],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub keypad: [bool; KEY_COUNT],
    /// The instruction word being executed; only meaningful during a cycle
    pub opcode: u16,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let font = FONT_START as usize;
        memory[font..font + FONT_SET.len()].copy_from_slice(&FONT_SET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            memory,
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            keypad: [false; KEY_COUNT],
            opcode: 0,
        }
    }

    /// Reads the byte at `addr` modulo the memory size
    pub fn read(&self, addr: u16) -> u8 {
        self.memory[wrap(addr)]
    }

    /// Writes the byte at `addr` modulo the memory size
    pub fn write(&mut self, addr: u16, byte: u8) {
        self.memory[wrap(addr)] = byte;
    }

    /// The word at `addr`; two subsequent bytes combined big-endian
    pub fn word(&self, addr: u16) -> u16 {
        u16::from(self.read(addr)) << 8 | u16::from(self.read(addr.wrapping_add(1)))
    }

    /// Latches the opcode pointed at by the pc and steps past it
    pub fn fetch(&mut self) -> u16 {
        self.opcode = self.word(self.pc);
        self.pc = advance(self.pc, 2);
        self.opcode
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves an address `by` bytes, wrapping modulo the memory size
pub fn advance(addr: u16, by: u16) -> u16 {
    addr.wrapping_add(by) % MEMORY_SIZE as u16
}

/// Moves an address back `by` bytes, wrapping modulo the memory size
pub fn retreat(addr: u16, by: u16) -> u16 {
    let size = MEMORY_SIZE as u16;
    (addr % size + size - by % size) % size
}

fn wrap(addr: u16) -> usize {
    addr as usize % MEMORY_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_loads_font() {
        let state = State::new();
        assert_eq!(state.memory[0x050..0x055], [0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(state.memory[0x09B..0x0A0], [0xF0, 0x80, 0xF0, 0x80, 0x80]);
        assert_eq!(state.memory[0x0A0], 0x0);
        assert_eq!(state.pc, 0x200);
    }

    #[test]
    fn test_reads_wrap() {
        let mut state = State::new();
        state.memory[0x001] = 0xAB;
        assert_eq!(state.read(0x1001), 0xAB);
    }

    #[test]
    fn test_writes_wrap() {
        let mut state = State::new();
        state.write(0x1FFF, 0xCD);
        assert_eq!(state.memory[0xFFF], 0xCD);
    }

    #[test]
    fn test_fetch_composes_big_endian() {
        let mut state = State::new();
        state.memory[0x200..0x202].copy_from_slice(&[0xAA, 0xBB]);
        assert_eq!(state.fetch(), 0xAABB);
        assert_eq!(state.opcode, 0xAABB);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_fetch_wraps_at_end_of_memory() {
        let mut state = State::new();
        state.pc = 0xFFF;
        state.memory[0xFFF] = 0x12;
        state.memory[0x000] = 0x34;
        assert_eq!(state.fetch(), 0x1234);
        assert_eq!(state.pc, 0x001);
    }

    #[test]
    fn test_retreat_wraps_below_zero() {
        assert_eq!(retreat(0x202, 2), 0x200);
        assert_eq!(retreat(0x000, 2), 0xFFE);
    }
}
