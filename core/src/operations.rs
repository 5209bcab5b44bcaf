use log::warn;
use rand::{Rng, RngCore};

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FLAG, FONT_START, GLYPH_SIZE, KEY_COUNT, STACK_SIZE,
};
use crate::opcode::Opcode;
use crate::state::{advance, retreat, State};

// The program counter has already been stepped past `op` when any of these run,
// so "skip the next instruction" is one more step of 2.

/// no-op; every unassigned opcode lands here
pub fn nop(_op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    *state
}

/// clear
pub fn clr(_op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        draw_flag: true,
        ..*state
    }
}

/// PC = STACK.pop()
pub fn rts(_op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    if state.sp == 0 {
        warn!("return with an empty stack at {:04X}", state.pc);
    }
    let sp = state.sp.wrapping_sub(1);
    State {
        pc: state.stack[sp as usize % STACK_SIZE],
        sp,
        ..*state
    }
}

/// PC = addr
pub fn jump(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        pc: op.addr(),
        ..*state
    }
}

/// STACK.push(PC); PC = addr
pub fn call(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    if state.sp as usize >= STACK_SIZE {
        warn!("call to {:03X} overflows the stack", op.addr());
    }
    let mut stack = state.stack;
    stack[state.sp as usize % STACK_SIZE] = state.pc;
    State {
        pc: op.addr(),
        sp: state.sp.wrapping_add(1),
        stack,
        ..*state
    }
}

/// if cond then pc += 2
fn skip_if(cond: bool, state: &State) -> State {
    if cond {
        State {
            pc: advance(state.pc, 2),
            ..*state
        }
    } else {
        *state
    }
}

/// if Vx == kk then pc += 2
pub fn ske(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    skip_if(state.v[op.x()] == op.kk(), state)
}

/// if Vx != kk then pc += 2
pub fn skne(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    skip_if(state.v[op.x()] != op.kk(), state)
}

/// if Vx == Vy then pc += 2
pub fn skre(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    skip_if(state.v[op.x()] == state.v[op.y()], state)
}

/// if Vx != Vy then pc += 2
pub fn skrne(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    skip_if(state.v[op.x()] != state.v[op.y()], state)
}

/// Vx = kk
pub fn load(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    v[op.x()] = op.kk();
    State { v, ..*state }
}

/// Vx += kk
/// Overflow is dropped and VF is left alone
pub fn add(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    v[op.x()] = v[op.x()].wrapping_add(op.kk());
    State { v, ..*state }
}

/// Vx = Vy
pub fn mv(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    v[op.x()] = v[op.y()];
    State { v, ..*state }
}

/// Vx |= Vy
pub fn or(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    v[op.x()] |= v[op.y()];
    State { v, ..*state }
}

/// Vx &= Vy
pub fn and(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    v[op.x()] &= v[op.y()];
    State { v, ..*state }
}

/// Vx ^= Vy
pub fn xor(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    v[op.x()] ^= v[op.y()];
    State { v, ..*state }
}

/// Vx += Vy; VF = overflow
pub fn addr(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let (res, over) = state.v[op.x()].overflowing_add(state.v[op.y()]);
    let mut v = state.v;
    // the result lands after the flag, so it wins when x is F
    v[FLAG] = u8::from(over);
    v[op.x()] = res;
    State { v, ..*state }
}

/// Vx -= Vy; VF = Vx > Vy
pub fn sub(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let mut v = state.v;
    v[FLAG] = u8::from(vx > vy);
    v[op.x()] = vx.wrapping_sub(vy);
    State { v, ..*state }
}

/// Vx = Vy - Vx; VF = Vy > Vx
pub fn subn(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let mut v = state.v;
    v[FLAG] = u8::from(vy > vx);
    v[op.x()] = vy.wrapping_sub(vx);
    State { v, ..*state }
}

/// Vx >>= 1; VF = lsb
pub fn shr(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let vx = state.v[op.x()];
    let mut v = state.v;
    v[FLAG] = vx & 0x1;
    v[op.x()] = vx >> 1;
    State { v, ..*state }
}

/// Vx <<= 1; VF = msb
pub fn shl(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let vx = state.v[op.x()];
    let mut v = state.v;
    v[FLAG] = vx >> 7;
    v[op.x()] = vx << 1;
    State { v, ..*state }
}

/// I = addr
pub fn loadi(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        i: op.addr(),
        ..*state
    }
}

/// PC = V0 + addr
pub fn jumpi(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        pc: advance(op.addr(), u16::from(state.v[0x0])),
        ..*state
    }
}

/// Vx = rand_byte & kk
pub fn rnd(op: u16, state: &State, rng: &mut dyn RngCore) -> State {
    let rand_byte: u8 = rng.gen();
    let mut v = state.v;
    v[op.x()] = rand_byte & op.kk();
    State { v, ..*state }
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the FrameBuffer.
/// Pixels past the right or bottom edge are clipped rather than wrapped.
/// Sets VF if any lit pixel is erased.
pub fn draw(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;
    let (left, top) = (state.v[op.x()] as usize, state.v[op.y()] as usize);

    // Reset the carry flag (used for collision detection)
    v[FLAG] = 0x0;

    for row in 0..op.n() {
        let y = top + row as usize;
        if y >= DISPLAY_HEIGHT {
            break;
        }
        let sprite = state.read(state.i.wrapping_add(u16::from(row)));
        for bit in 0..8 {
            let x = left + bit;
            if x >= DISPLAY_WIDTH {
                break;
            }
            if sprite & (0x80 >> bit) != 0 {
                if frame_buffer[y][x] {
                    v[FLAG] = 0x1;
                }
                frame_buffer[y][x] = !frame_buffer[y][x];
            }
        }
    }

    State {
        draw_flag: true,
        v,
        frame_buffer,
        ..*state
    }
}

/// The key named by Vx; only the low nibble selects a key
fn key(op: u16, state: &State) -> bool {
    state.keypad[state.v[op.x()] as usize % KEY_COUNT]
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    skip_if(key(op, state), state)
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    skip_if(!key(op, state), state)
}

/// Vx = DT
pub fn getd(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    v[op.x()] = state.delay_timer;
    State { v, ..*state }
}

/// Vx = first pressed key, or re-run this instruction next cycle
pub fn keyd(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    match state.keypad.iter().position(|&pressed| pressed) {
        Some(key) => {
            let mut v = state.v;
            v[op.x()] = key as u8;
            State { v, ..*state }
        }
        None => State {
            pc: retreat(state.pc, 2),
            ..*state
        },
    }
}

/// DT = Vx
pub fn setd(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        delay_timer: state.v[op.x()],
        ..*state
    }
}

/// ST = Vx
pub fn sets(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        sound_timer: state.v[op.x()],
        ..*state
    }
}

/// I += Vx
pub fn addi(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        i: state.i.wrapping_add(u16::from(state.v[op.x()])),
        ..*state
    }
}

/// I = FONT_START + Vx * 5
/// Points I at the glyph for the hex digit in Vx
pub fn ldspr(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    State {
        i: FONT_START + GLYPH_SIZE * u16::from(state.v[op.x()]),
        ..*state
    }
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let vx = state.v[op.x()];
    let mut next = *state;
    for (offset, digit) in [vx / 100, vx / 10 % 10, vx % 10].iter().enumerate() {
        next.write(state.i.wrapping_add(offset as u16), *digit);
    }
    next
}

/// mem[I..=I+x] = V0..=Vx
pub fn stor(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut next = *state;
    for register in 0..=op.x() {
        next.write(state.i.wrapping_add(register as u16), state.v[register]);
    }
    next
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(op: u16, state: &State, _rng: &mut dyn RngCore) -> State {
    let mut v = state.v;
    for (register, value) in v.iter_mut().enumerate().take(op.x() + 1) {
        *value = state.read(state.i.wrapping_add(register as u16));
    }
    State { v, ..*state }
}
